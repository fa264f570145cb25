use std::time::Instant;

use chrono::{DateTime, Local, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::generator::{GenerateError, GeneratorConfig, SequenceGenerator};
use crate::matches::{find_matches, MatchSets};
use crate::prng::{daily_seed, random_challenge_seed};
use crate::reward::xp_for;
use crate::scoring::{score, ScoreDetails, UserInputs};
use crate::stimulus::{GameMode, GameSpeed, Modality, Sequence, Stimulus, Swatch};

/// Steps generated for practice and marathon play.
pub const OPEN_ENDED_LENGTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Serialize, Deserialize, ValueEnum, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayMode {
    #[default]
    Standard,
    /// Open-ended; ends when the player stops.
    Practice,
    /// Open-ended; ends on the first miss or false alarm.
    Marathon,
}

pub fn sequence_length(level: usize, play_mode: PlayMode) -> usize {
    match (play_mode, level) {
        (PlayMode::Practice | PlayMode::Marathon, _) => OPEN_ENDED_LENGTH,
        (_, 0 | 1) => 21,
        (_, 2) => 25,
        _ => 30,
    }
}

/// Where the sequence seed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedChoice {
    Random,
    /// Reproducible run on an explicit seed; not shared as a challenge.
    Fixed(i64),
    Daily(NaiveDate),
    /// Replaying a challenge someone shared.
    Challenge(i64),
    /// Creating a new challenge that can be shared afterwards.
    CreateChallenge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub level: usize,
    pub mode: GameMode,
    pub speed: GameSpeed,
    pub play_mode: PlayMode,
    pub seed: SeedChoice,
}

struct ResolvedSeed {
    seed: Option<i64>,
    challenge_seed: Option<i64>,
    is_daily: bool,
}

impl SessionConfig {
    fn resolve_seed(&self) -> ResolvedSeed {
        match self.seed {
            SeedChoice::Fixed(seed) => ResolvedSeed {
                seed: Some(seed),
                challenge_seed: None,
                is_daily: false,
            },
            SeedChoice::Daily(date) => ResolvedSeed {
                seed: Some(daily_seed(date)),
                challenge_seed: None,
                is_daily: true,
            },
            SeedChoice::CreateChallenge => {
                let seed = random_challenge_seed();
                ResolvedSeed {
                    seed: Some(seed),
                    challenge_seed: Some(seed),
                    is_daily: false,
                }
            }
            // incoming challenges only replay in standard play
            SeedChoice::Challenge(seed) if self.play_mode == PlayMode::Standard => ResolvedSeed {
                seed: Some(seed),
                challenge_seed: Some(seed),
                is_daily: false,
            },
            _ => ResolvedSeed {
                seed: None,
                challenge_seed: None,
                is_daily: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Completed,
    /// Marathon ended by a missed or false signal.
    MarathonFailure,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Shown { index: usize, stimulus: Stimulus },
    Finished(FinishReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Too early, inactive modality, or session over.
    Ignored,
    Duplicate,
    Hit,
    FalseAlarm,
}

/// A finished session as stored in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub date: DateTime<Local>,
    pub level: usize,
    pub mode: GameMode,
    pub speed: GameSpeed,
    pub play_mode: PlayMode,
    pub score: u32,
    pub xp_earned: u64,
    pub details: ScoreDetails,
    pub reaction_times: Vec<u64>,
    pub missed_positions: Vec<u8>,
    pub is_daily: bool,
    pub challenge_seed: Option<i64>,
    pub steps_presented: usize,
    pub max_combo: u32,
}

/// State of one play-through: the sequence, how far it got, and what the
/// player signalled.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    sequence: Sequence,
    matches: MatchSets,
    current_index: usize,
    inputs: UserInputs,
    reaction_times: Vec<u64>,
    combo: u32,
    max_combo: u32,
    challenge_seed: Option<i64>,
    is_daily: bool,
    shown_at: Option<Instant>,
    finish_reason: Option<FinishReason>,
}

impl Session {
    pub fn start(
        config: SessionConfig,
        alphabet: Vec<char>,
        palette: Vec<Swatch>,
    ) -> Result<Self, GenerateError> {
        let resolved = config.resolve_seed();
        let length = sequence_length(config.level, config.play_mode);
        let generator = SequenceGenerator::new(GeneratorConfig {
            level: config.level,
            mode: config.mode,
            length,
            alphabet,
            palette,
            seed: resolved.seed,
        })?;
        let sequence = generator.generate();
        let matches = find_matches(sequence.as_slice(), config.level);

        info!(
            level = config.level,
            mode = %config.mode,
            play_mode = %config.play_mode,
            length,
            seed = ?resolved.seed,
            position_matches = matches.position.len(),
            "session started"
        );

        Ok(Self {
            config,
            sequence,
            matches,
            current_index: 0,
            inputs: UserInputs::new(),
            reaction_times: Vec::new(),
            combo: 0,
            max_combo: 0,
            challenge_seed: resolved.challenge_seed,
            is_daily: resolved.is_daily,
            shown_at: None,
            finish_reason: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn matches(&self) -> &MatchSets {
        &self.matches
    }

    pub fn inputs(&self) -> &UserInputs {
        &self.inputs
    }

    /// Number of stimuli presented so far.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The most recently presented stimulus.
    pub fn current_stimulus(&self) -> Option<&Stimulus> {
        self.current_index
            .checked_sub(1)
            .and_then(|i| self.sequence.get(i))
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn challenge_seed(&self) -> Option<i64> {
        self.challenge_seed
    }

    pub fn is_daily(&self) -> bool {
        self.is_daily
    }

    pub fn is_finished(&self) -> bool {
        self.finish_reason.is_some()
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    /// Presents the next stimulus, or ends the session.
    pub fn advance(&mut self) -> Step {
        if let Some(reason) = self.finish_reason {
            return Step::Finished(reason);
        }

        if self.config.play_mode == PlayMode::Marathon && self.current_index >= self.config.level {
            let prev = self.current_index - 1;
            let missed = self.config.mode.modalities().iter().any(|&m| {
                self.matches.contains(m, prev) && !self.inputs.contains(m, prev)
            });
            if missed {
                return self.end(FinishReason::MarathonFailure);
            }
        }

        let index = self.current_index;
        let Some(&stimulus) = self.sequence.get(index) else {
            return self.end(FinishReason::Completed);
        };
        self.shown_at = Some(Instant::now());
        self.current_index += 1;
        Step::Shown { index, stimulus }
    }

    /// Player signals that the current step matches in `modality`.
    pub fn respond(&mut self, modality: Modality) -> Response {
        if self.is_finished()
            || !self.config.mode.tracks(modality)
            || self.current_index < self.config.level
        {
            return Response::Ignored;
        }

        let target = self.current_index - 1;
        if !self.inputs.record(modality, target) {
            return Response::Duplicate;
        }

        if self.matches.contains(modality, target) {
            if let Some(shown) = self.shown_at {
                self.reaction_times.push(shown.elapsed().as_millis() as u64);
            }
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
            Response::Hit
        } else {
            self.combo = 0;
            if self.config.play_mode == PlayMode::Marathon {
                self.end(FinishReason::MarathonFailure);
            }
            Response::FalseAlarm
        }
    }

    /// Ends the session early; only presented steps are scored.
    pub fn stop(&mut self) {
        if !self.is_finished() {
            self.end(FinishReason::Stopped);
        }
    }

    fn end(&mut self, reason: FinishReason) -> Step {
        self.finish_reason = Some(reason);
        self.combo = 0;
        Step::Finished(reason)
    }

    pub fn score(&self) -> ScoreDetails {
        score(
            self.config.mode,
            &self.inputs,
            &self.matches,
            self.current_index,
        )
    }

    /// Grid cells of position matches the player let pass.
    pub fn missed_positions(&self) -> Vec<u8> {
        self.matches
            .position
            .iter()
            .filter(|&&idx| idx < self.current_index)
            .filter(|&&idx| !self.inputs.contains(Modality::Position, idx))
            .filter_map(|&idx| self.sequence.get(idx).map(|s| s.position))
            .collect()
    }

    pub fn record(&self) -> SessionRecord {
        self.record_at(Local::now())
    }

    pub fn record_at(&self, date: DateTime<Local>) -> SessionRecord {
        let details = self.score();
        let percentage = details.overall.percentage;
        let xp_earned = xp_for(percentage, self.config.mode, self.config.speed, self.config.level);

        info!(
            score = percentage,
            xp = xp_earned,
            steps = self.current_index,
            reason = ?self.finish_reason,
            "session finished"
        );

        SessionRecord {
            id: date.timestamp_millis().to_string(),
            date,
            level: self.config.level,
            mode: self.config.mode,
            speed: self.config.speed,
            play_mode: self.config.play_mode,
            score: percentage,
            xp_earned,
            details,
            reaction_times: self.reaction_times.clone(),
            missed_positions: self.missed_positions(),
            is_daily: self.is_daily,
            challenge_seed: self.challenge_seed,
            steps_presented: self.current_index,
            max_combo: self.max_combo,
        }
    }
}
