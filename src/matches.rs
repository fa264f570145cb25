use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::stimulus::{Modality, Stimulus};

/// Indices at which each modality repeats its value from `n` steps back.
///
/// Always computed for all three modalities regardless of game mode. The
/// lists are strictly increasing; any edit to the sequence invalidates them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSets {
    pub position: Vec<usize>,
    pub sound: Vec<usize>,
    pub color: Vec<usize>,
}

impl MatchSets {
    pub fn get(&self, modality: Modality) -> &[usize] {
        match modality {
            Modality::Position => &self.position,
            Modality::Sound => &self.sound,
            Modality::Color => &self.color,
        }
    }

    pub fn contains(&self, modality: Modality, idx: usize) -> bool {
        self.get(modality).binary_search(&idx).is_ok()
    }

    pub fn count(&self, modality: Modality) -> usize {
        self.get(modality).len()
    }

    /// Number of windows of three consecutive matching steps.
    pub fn triplets(&self, modality: Modality) -> usize {
        self.get(modality)
            .iter()
            .tuple_windows()
            .filter(|&(&a, &b, &c)| b == a + 1 && c == b + 1)
            .count()
    }
}

/// Whether `a` and `b` carry the same value in `modality`.
pub(crate) fn same_value(a: &Stimulus, b: &Stimulus, modality: Modality) -> bool {
    match modality {
        Modality::Position => a.position == b.position,
        Modality::Sound => a.sound == b.sound,
        Modality::Color => a.color == b.color,
    }
}

pub fn find_matches(seq: &[Stimulus], n: usize) -> MatchSets {
    let mut sets = MatchSets::default();
    if n == 0 {
        return sets;
    }

    for i in n..seq.len() {
        let (cur, back) = (&seq[i], &seq[i - n]);
        if same_value(cur, back, Modality::Position) {
            sets.position.push(i);
        }
        if same_value(cur, back, Modality::Sound) {
            sets.sound.push(i);
        }
        if same_value(cur, back, Modality::Color) {
            sets.color.push(i);
        }
    }

    sets
}
