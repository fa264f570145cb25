//! XP, ranks, daily streaks and level progression.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::stimulus::{GameMode, GameSpeed, Locale};

/// Highest level the automatic progression moves to.
pub const MAX_LEVEL: usize = 9;

const PROMOTE_AT: u32 = 90;
const DEMOTE_BELOW: u32 = 60;
const BEST_N_ABOVE: u32 = 85;

pub fn mode_multiplier(mode: GameMode) -> f64 {
    match mode {
        GameMode::Position => 1.0,
        GameMode::Dual => 1.5,
        GameMode::Triple => 2.2,
    }
}

pub fn speed_multiplier(speed: GameSpeed) -> f64 {
    match speed {
        GameSpeed::Slow => 0.7,
        GameSpeed::Normal => 1.0,
        GameSpeed::Fast => 1.3,
    }
}

/// XP earned for a session scoring `percentage`.
pub fn xp_for(percentage: u32, mode: GameMode, speed: GameSpeed, level: usize) -> u64 {
    let base = f64::from(percentage) * 2.0;
    let level_mult = 1.0 + level as f64 * 0.2;
    (base * mode_multiplier(mode) * speed_multiplier(speed) * level_mult).round() as u64
}

struct RankTier {
    min_xp: u64,
    en: &'static str,
    tr: &'static str,
}

const RANKS: [RankTier; 5] = [
    RankTier {
        min_xp: 0,
        en: "Novice",
        tr: "Çömez",
    },
    RankTier {
        min_xp: 500,
        en: "Focus Intern",
        tr: "Odak Stajyeri",
    },
    RankTier {
        min_xp: 1500,
        en: "Mind Architect",
        tr: "Zihin Mimarı",
    },
    RankTier {
        min_xp: 4000,
        en: "Memory Master",
        tr: "Hafıza Ustası",
    },
    RankTier {
        min_xp: 10000,
        en: "Neuro Grandmaster",
        tr: "Nöro Grandmaster",
    },
];

/// Rank title for a cumulative XP total.
pub fn rank_for(xp: u64, locale: Locale) -> &'static str {
    let tier = RANKS
        .iter()
        .rev()
        .find(|r| xp >= r.min_xp)
        .unwrap_or(&RANKS[0]);
    match locale {
        Locale::En => tier.en,
        Locale::Tr => tier.tr,
    }
}

/// Level for the next session after scoring `percentage` at `level`.
/// Challenge sessions never move the level.
pub fn next_level(level: usize, percentage: u32, challenge: bool) -> usize {
    if challenge {
        level
    } else if percentage >= PROMOTE_AT && level < MAX_LEVEL {
        level + 1
    } else if percentage < DEMOTE_BELOW && level > 1 {
        level - 1
    } else {
        level
    }
}

/// Long-lived player progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub xp: u64,
    pub streak: u32,
    pub last_played: Option<NaiveDate>,
    pub best_n: usize,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            xp: 0,
            streak: 0,
            last_played: None,
            best_n: 1,
        }
    }
}

impl UserStats {
    /// Drops a streak that was not extended yesterday or today.
    pub fn decay(&mut self, today: NaiveDate) {
        if let Some(last) = self.last_played {
            if last < yesterday(today) {
                self.streak = 0;
            }
        }
    }

    pub fn record_session(
        &mut self,
        xp_earned: u64,
        percentage: u32,
        level: usize,
        today: NaiveDate,
    ) {
        self.streak = match self.last_played {
            Some(last) if last == yesterday(today) => self.streak + 1,
            Some(last) if last < yesterday(today) => 1,
            None => 1,
            Some(_) => self.streak,
        };
        self.xp += xp_earned;
        self.last_played = Some(today);
        if percentage > BEST_N_ABOVE {
            self.best_n = self.best_n.max(level);
        }
    }

    pub fn rank(&self, locale: Locale) -> &'static str {
        rank_for(self.xp, locale)
    }
}

fn yesterday(today: NaiveDate) -> NaiveDate {
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn xp_combines_all_multipliers() {
        // 100% * 2 * 1.0 * 1.0 * 1.2
        assert_eq!(xp_for(100, GameMode::Position, GameSpeed::Normal, 1), 240);
        // 100 * 2 * 1.5 * 1.0 * 1.4
        assert_eq!(xp_for(100, GameMode::Dual, GameSpeed::Normal, 2), 420);
        // 80 * 2 * 2.2 * 1.3 * 1.6 = 732.16
        assert_eq!(xp_for(80, GameMode::Triple, GameSpeed::Fast, 3), 732);
        assert_eq!(xp_for(0, GameMode::Triple, GameSpeed::Fast, 9), 0);
    }

    #[test]
    fn ranks_follow_thresholds() {
        assert_eq!(rank_for(0, Locale::En), "Novice");
        assert_eq!(rank_for(499, Locale::En), "Novice");
        assert_eq!(rank_for(500, Locale::En), "Focus Intern");
        assert_eq!(rank_for(4000, Locale::Tr), "Hafıza Ustası");
        assert_eq!(rank_for(1_000_000, Locale::En), "Neuro Grandmaster");
    }

    #[test]
    fn level_moves_on_strong_and_weak_scores() {
        assert_eq!(next_level(2, 90, false), 3);
        assert_eq!(next_level(9, 100, false), 9);
        assert_eq!(next_level(3, 59, false), 2);
        assert_eq!(next_level(1, 0, false), 1);
        assert_eq!(next_level(4, 75, false), 4);
        assert_eq!(next_level(4, 100, true), 4);
        assert_eq!(next_level(4, 10, true), 4);
    }

    #[test]
    fn streak_extends_resets_and_holds() {
        let mut stats = UserStats::default();
        stats.record_session(100, 50, 1, day(10));
        assert_eq!(stats.streak, 1);

        stats.record_session(100, 50, 1, day(11));
        assert_eq!(stats.streak, 2);

        // second session the same day
        stats.record_session(100, 50, 1, day(11));
        assert_eq!(stats.streak, 2);

        stats.record_session(100, 50, 1, day(14));
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.xp, 400);
        assert_eq!(stats.last_played, Some(day(14)));
    }

    #[test]
    fn decay_clears_stale_streaks_only() {
        let mut stats = UserStats {
            streak: 5,
            last_played: Some(day(9)),
            ..Default::default()
        };
        stats.decay(day(10));
        assert_eq!(stats.streak, 5);
        stats.decay(day(12));
        assert_eq!(stats.streak, 0);
    }

    #[test]
    fn best_n_needs_a_strong_score() {
        let mut stats = UserStats::default();
        stats.record_session(0, 85, 4, day(1));
        assert_eq!(stats.best_n, 1);
        stats.record_session(0, 86, 4, day(1));
        assert_eq!(stats.best_n, 4);
        stats.record_session(0, 100, 2, day(1));
        assert_eq!(stats.best_n, 4);
    }
}
