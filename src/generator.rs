use thiserror::Error;
use tracing::debug;

use crate::matches::{find_matches, MatchSets};
use crate::prng::{Mulberry32, ThreadRandom, UnitRng};
use crate::stimulus::{GameMode, Modality, Sequence, Stimulus, Swatch};

/// Passes of triplet repair per modality before accepting what is left.
pub const MAX_REPAIR_PASSES: usize = 5;
/// Upper bound on single-step injections per modality.
pub const MAX_INJECTION_ATTEMPTS: usize = 100;

const POSITIONS: [u8; 9] = [0, 1, 2, 3, 4, 5, 6, 7, 8];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("n-back level must be at least 1")]
    ZeroLevel,
    #[error("sound alphabet is empty")]
    EmptyAlphabet,
    #[error("colour palette is empty")]
    EmptyPalette,
}

/// Everything that determines a generated sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub level: usize,
    pub mode: GameMode,
    pub length: usize,
    pub alphabet: Vec<char>,
    pub palette: Vec<Swatch>,
    pub seed: Option<i64>,
}

/// Builds stimulus sequences with a floor on true matches and no runs of three.
///
/// The result is best effort: bounded repair and injection loops may leave a
/// residual triplet or fall short of the match target on tiny sequences, but
/// generation always terminates. Identical configs with a seed produce
/// identical sequences, which challenge links and daily races rely on.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    config: GeneratorConfig,
}

impl SequenceGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerateError> {
        if config.level == 0 {
            return Err(GenerateError::ZeroLevel);
        }
        if config.alphabet.is_empty() {
            return Err(GenerateError::EmptyAlphabet);
        }
        if config.palette.is_empty() {
            return Err(GenerateError::EmptyPalette);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Seeded configs run on [`Mulberry32`], the rest on the thread RNG.
    pub fn generate(&self) -> Sequence {
        match self.config.seed {
            Some(seed) => self.generate_with(&mut Mulberry32::new(seed)),
            None => self.generate_with(&mut ThreadRandom::new()),
        }
    }

    pub fn generate_with<R: UnitRng>(&self, rng: &mut R) -> Sequence {
        let min_matches = rng.index(4) + 5;
        debug!(
            level = self.config.level,
            mode = %self.config.mode,
            length = self.config.length,
            min_matches,
            "generating sequence"
        );

        // Exclusively owned until frozen into a Sequence below.
        let mut buf = self.base_fill(rng);

        self.prevent_triplets(&mut buf, rng);
        for &modality in self.config.mode.modalities() {
            self.inject_matches(&mut buf, modality, min_matches, rng);
        }
        self.prevent_triplets(&mut buf, rng);

        Sequence::from_vec(buf)
    }

    fn base_fill<R: UnitRng>(&self, rng: &mut R) -> Vec<Stimulus> {
        let GeneratorConfig {
            length,
            alphabet,
            palette,
            ..
        } = &self.config;

        let mut buf = Vec::with_capacity(*length);
        let mut last_position = None;

        for _ in 0..*length {
            // immediate repeats survive a 30% coin flip
            let position = loop {
                let candidate = POSITIONS[rng.index(POSITIONS.len())];
                if Some(candidate) == last_position && rng.next_unit() > 0.3 {
                    continue;
                }
                break candidate;
            };
            last_position = Some(position);

            let sound = alphabet[rng.index(alphabet.len())];
            let color = palette[rng.index(palette.len())];
            buf.push(Stimulus {
                position,
                sound,
                color,
            });
        }

        buf
    }

    /// Breaks runs of three consecutive matches by redrawing the middle step.
    ///
    /// Each pass scans the match list computed at its start, so several
    /// overlapping runs may be redrawn in one pass.
    fn prevent_triplets<R: UnitRng>(&self, buf: &mut [Stimulus], rng: &mut R) {
        let level = self.config.level;

        for &modality in self.config.mode.modalities() {
            let mut passes = 0;
            let mut fixed = false;

            while !fixed && passes < MAX_REPAIR_PASSES {
                fixed = true;
                let matches = find_matches(buf, level);

                for w in matches.get(modality).windows(3) {
                    if w[1] == w[0] + 1 && w[2] == w[1] + 1 {
                        fixed = false;
                        self.redraw(buf, w[1], modality, rng);
                    }
                }
                passes += 1;
            }

            debug!(%modality, passes, fixed, "triplet repair");
        }
    }

    fn redraw<R: UnitRng>(
        &self,
        buf: &mut [Stimulus],
        idx: usize,
        modality: Modality,
        rng: &mut R,
    ) {
        let back = buf[idx - self.config.level];
        let cur = &mut buf[idx];

        match modality {
            Modality::Position => {
                if let Some(v) = pick_distinct(&POSITIONS, cur.position, back.position, rng) {
                    cur.position = v;
                }
            }
            Modality::Sound => {
                if let Some(v) = pick_distinct(&self.config.alphabet, cur.sound, back.sound, rng) {
                    cur.sound = v;
                }
            }
            Modality::Color => {
                if let Some(v) = pick_distinct(&self.config.palette, cur.color, back.color, rng) {
                    cur.color = v;
                }
            }
        }
    }

    /// Converts safe non-matching steps into matches until `min_matches` is reached.
    fn inject_matches<R: UnitRng>(
        &self,
        buf: &mut [Stimulus],
        modality: Modality,
        min_matches: usize,
        rng: &mut R,
    ) {
        let level = self.config.level;
        let mut current = find_matches(buf, level);
        let mut attempts = 0;

        while attempts < MAX_INJECTION_ATTEMPTS && current.count(modality) < min_matches {
            let available: Vec<usize> = (level..buf.len())
                .filter(|&i| !current.contains(modality, i))
                .filter(|&i| !forms_triplet(&current, modality, i))
                .collect();

            if available.is_empty() {
                debug!(%modality, matches = current.count(modality), "no safe injection left");
                break;
            }

            let idx = available[rng.index(available.len())];
            let source = buf[idx - level];
            let target = &mut buf[idx];
            match modality {
                Modality::Position => target.position = source.position,
                Modality::Sound => target.sound = source.sound,
                Modality::Color => target.color = source.color,
            }

            current = find_matches(buf, level);
            attempts += 1;
        }

        debug!(%modality, attempts, matches = current.count(modality), "match injection");
    }
}

/// Whether turning step `i` into a match would complete a run of three.
fn forms_triplet(current: &MatchSets, modality: Modality, i: usize) -> bool {
    let is_match = |idx: Option<usize>| idx.is_some_and(|j| current.contains(modality, j));

    let prev = is_match(i.checked_sub(1));
    let prev_prev = is_match(i.checked_sub(2));
    let next = is_match(Some(i + 1));
    let next_next = is_match(Some(i + 2));

    (prev && prev_prev) || (prev && next) || (next && next_next)
}

/// Draws from `values` until the value differs from both `a` and `b`.
/// Returns `None` without drawing when no such value exists.
fn pick_distinct<T, R>(values: &[T], a: T, b: T, rng: &mut R) -> Option<T>
where
    T: Copy + PartialEq,
    R: UnitRng,
{
    if !values.iter().any(|v| *v != a && *v != b) {
        return None;
    }
    loop {
        let v = values[rng.index(values.len())];
        if v != a && v != b {
            return Some(v);
        }
    }
}

/// One-shot convenience over [`SequenceGenerator`].
pub fn generate(config: GeneratorConfig) -> Result<Sequence, GenerateError> {
    Ok(SequenceGenerator::new(config)?.generate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::{Locale, Palette};

    fn config(level: usize, mode: GameMode, length: usize, seed: Option<i64>) -> GeneratorConfig {
        GeneratorConfig {
            level,
            mode,
            length,
            alphabet: Locale::En.alphabet(),
            palette: Palette::standard(),
            seed,
        }
    }

    fn positions(seq: &Sequence) -> Vec<u8> {
        seq.iter().map(|s| s.position).collect()
    }

    fn sounds(seq: &Sequence) -> String {
        seq.iter().map(|s| s.sound).collect()
    }

    fn colour_indices(seq: &Sequence) -> Vec<usize> {
        let palette = Palette::standard();
        seq.iter()
            .map(|s| palette.iter().position(|c| *c == s.color).unwrap())
            .collect()
    }

    // Expected values were produced by the web client for the same parameters.
    #[test]
    fn dual_level_two_matches_reference_sequence() {
        let seq = generate(config(2, GameMode::Dual, 25, Some(42))).unwrap();
        assert_eq!(
            positions(&seq),
            vec![4, 1, 5, 2, 2, 5, 2, 5, 7, 0, 4, 0, 4, 1, 7, 1, 5, 1, 3, 1, 4, 0, 2, 4, 8]
        );
        assert_eq!(sounds(&seq), "SUSSUAAISESAIIUIUAYACTCSC");
        assert_eq!(
            colour_indices(&seq),
            vec![6, 2, 4, 6, 6, 4, 5, 0, 4, 7, 2, 5, 5, 6, 1, 0, 6, 8, 1, 3, 8, 8, 1, 1, 8]
        );

        let m = find_matches(seq.as_slice(), 2);
        assert_eq!(m.position, vec![6, 7, 11, 12, 15, 17, 19]);
        assert_eq!(m.sound, vec![2, 10, 15, 16, 19, 22, 24]);
        assert!(m.color.is_empty());
    }

    #[test]
    fn triple_level_three_matches_reference_sequence() {
        let seq = generate(config(3, GameMode::Triple, 30, Some(1_234_567))).unwrap();
        assert_eq!(
            positions(&seq),
            vec![
                1, 1, 4, 5, 3, 1, 2, 5, 1, 6, 2, 1, 5, 2, 1, 0, 6, 1, 8, 6, 0, 8, 1, 6, 8, 5, 2,
                4, 3, 4
            ]
        );
        assert_eq!(sounds(&seq), "OIOAUAAYACOTCOEITIIOESUCUSCSYC");
        assert_eq!(
            colour_indices(&seq),
            vec![
                3, 4, 8, 3, 8, 2, 2, 5, 1, 3, 5, 0, 8, 5, 5, 8, 7, 1, 7, 5, 3, 7, 7, 8, 1, 6, 8,
                1, 3, 7
            ]
        );

        let m = find_matches(seq.as_slice(), 3);
        assert_eq!(m.position, vec![8, 11, 13, 14, 17, 19, 21, 24]);
        assert_eq!(m.sound, vec![6, 8, 12, 13, 18, 26, 29]);
        assert_eq!(m.color, vec![3, 10, 13, 15, 21, 26, 27]);
    }

    #[test]
    fn position_level_one_matches_reference_sequence() {
        let seq = generate(config(1, GameMode::Position, 21, Some(7))).unwrap();
        assert_eq!(
            positions(&seq),
            vec![0, 4, 2, 2, 1, 4, 2, 1, 4, 8, 6, 8, 8, 0, 0, 8, 2, 1, 3, 3, 3]
        );
        assert_eq!(sounds(&seq), "YOUTOISETUYSOAOTOYAUY");
        let m = find_matches(seq.as_slice(), 1);
        assert_eq!(m.position, vec![3, 12, 14, 19, 20]);
    }

    #[test]
    fn rejects_unsatisfiable_configs() {
        assert_eq!(
            SequenceGenerator::new(config(0, GameMode::Dual, 20, None)).unwrap_err(),
            GenerateError::ZeroLevel
        );

        let mut cfg = config(2, GameMode::Dual, 20, None);
        cfg.alphabet.clear();
        assert_eq!(
            SequenceGenerator::new(cfg).unwrap_err(),
            GenerateError::EmptyAlphabet
        );

        let mut cfg = config(2, GameMode::Dual, 20, None);
        cfg.palette.clear();
        assert_eq!(
            SequenceGenerator::new(cfg).unwrap_err(),
            GenerateError::EmptyPalette
        );
    }

    #[test]
    fn empty_and_tiny_lengths_are_handled() {
        let seq = generate(config(2, GameMode::Triple, 0, Some(1))).unwrap();
        assert!(seq.is_empty());

        let seq = generate(config(5, GameMode::Triple, 3, Some(1))).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(find_matches(seq.as_slice(), 5), MatchSets::default());
    }

    #[test]
    fn single_symbol_sets_terminate() {
        let cfg = GeneratorConfig {
            level: 1,
            mode: GameMode::Triple,
            length: 40,
            alphabet: vec!['A'],
            palette: vec![Swatch(0xffffff)],
            seed: Some(99),
        };
        let seq = generate(cfg).unwrap();
        assert_eq!(seq.len(), 40);
        assert!(seq.iter().all(|s| s.sound == 'A'));
    }

    #[test]
    fn unseeded_generation_respects_ranges() {
        let seq = generate(config(2, GameMode::Triple, 30, None)).unwrap();
        let alphabet = Locale::En.alphabet();
        let palette = Palette::standard();
        assert_eq!(seq.len(), 30);
        for s in &seq {
            assert!(s.position < 9);
            assert!(alphabet.contains(&s.sound));
            assert!(palette.contains(&s.color));
        }
    }

    #[test]
    fn injection_never_completes_a_run() {
        let m = MatchSets {
            position: vec![3, 4, 8, 11],
            ..Default::default()
        };
        assert!(forms_triplet(&m, Modality::Position, 5));
        assert!(forms_triplet(&m, Modality::Position, 2));
        assert!(!forms_triplet(&m, Modality::Position, 6));
        assert!(!forms_triplet(&m, Modality::Position, 10));
        let m = MatchSets {
            position: vec![8, 10],
            ..Default::default()
        };
        assert!(forms_triplet(&m, Modality::Position, 9));
        assert!(!forms_triplet(&m, Modality::Position, 1));
    }

    #[test]
    fn pick_distinct_avoids_both_values() {
        let mut rng = Mulberry32::new(3);
        for _ in 0..200 {
            let v = pick_distinct(&POSITIONS, 2, 5, &mut rng).unwrap();
            assert!(v != 2 && v != 5);
        }
        assert_eq!(pick_distinct(&['A', 'B'], 'A', 'B', &mut rng), None);
    }
}
