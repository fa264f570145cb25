use serde::{Deserialize, Serialize};

use crate::matches::MatchSets;
use crate::stimulus::{GameMode, Modality};

/// Per-modality outcome of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalityScore {
    pub correct: usize,
    pub missed: usize,
    pub false_alarms: usize,
    pub total_possible: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallScore {
    pub percentage: u32,
    pub total_correct: usize,
    pub total_missed: usize,
    pub total_false_alarms: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDetails {
    pub position: ModalityScore,
    pub sound: ModalityScore,
    pub color: ModalityScore,
    pub overall: OverallScore,
}

impl ScoreDetails {
    pub fn get(&self, modality: Modality) -> &ModalityScore {
        match modality {
            Modality::Position => &self.position,
            Modality::Sound => &self.sound,
            Modality::Color => &self.color,
        }
    }
}

/// Steps at which the player signalled a match, one list per modality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInputs {
    position: Vec<usize>,
    sound: Vec<usize>,
    color: Vec<usize>,
}

impl UserInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, modality: Modality) -> &[usize] {
        match modality {
            Modality::Position => &self.position,
            Modality::Sound => &self.sound,
            Modality::Color => &self.color,
        }
    }

    /// Appends `idx`; returns false when the step was already signalled.
    pub fn record(&mut self, modality: Modality, idx: usize) -> bool {
        let list = match modality {
            Modality::Position => &mut self.position,
            Modality::Sound => &mut self.sound,
            Modality::Color => &mut self.color,
        };
        if list.contains(&idx) {
            return false;
        }
        list.push(idx);
        true
    }

    pub fn contains(&self, modality: Modality, idx: usize) -> bool {
        self.get(modality).contains(&idx)
    }

    pub fn clear(&mut self) {
        self.position.clear();
        self.sound.clear();
        self.color.clear();
    }
}

/// Scores one modality over the first `limit` presented steps.
pub fn score_modality(inputs: &[usize], matches: &[usize], limit: usize) -> ModalityScore {
    let relevant_matches: Vec<usize> = matches.iter().copied().filter(|&m| m < limit).collect();

    let (correct, false_alarms) = inputs
        .iter()
        .filter(|&&i| i < limit)
        .fold((0, 0), |(hit, fa), i| {
            if relevant_matches.contains(i) {
                (hit + 1, fa)
            } else {
                (hit, fa + 1)
            }
        });

    ModalityScore {
        correct,
        missed: relevant_matches.len() - correct,
        false_alarms,
        total_possible: relevant_matches.len(),
    }
}

/// Full score breakdown. Modalities outside `mode` are still reported but
/// do not count toward the overall figures.
pub fn score(
    mode: GameMode,
    inputs: &UserInputs,
    matches: &MatchSets,
    limit: usize,
) -> ScoreDetails {
    let per = |m: Modality| score_modality(inputs.get(m), matches.get(m), limit);
    let (position, sound, color) = (
        per(Modality::Position),
        per(Modality::Sound),
        per(Modality::Color),
    );

    let included: Vec<&ModalityScore> = mode
        .modalities()
        .iter()
        .map(|m| match m {
            Modality::Position => &position,
            Modality::Sound => &sound,
            Modality::Color => &color,
        })
        .collect();

    let total_correct: usize = included.iter().map(|s| s.correct).sum();
    let total_possible: usize = included.iter().map(|s| s.total_possible).sum();
    let total_missed: usize = included.iter().map(|s| s.missed).sum();
    let total_false_alarms: usize = included.iter().map(|s| s.false_alarms).sum();

    let percentage = if total_possible > 0 {
        (total_correct as f64 / total_possible as f64 * 100.0)
            .round()
            .max(0.0) as u32
    } else {
        0
    };

    ScoreDetails {
        position,
        sound,
        color,
        overall: OverallScore {
            percentage,
            total_correct,
            total_missed,
            total_false_alarms,
        },
    }
}
