use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of cells on the 3×3 grid.
pub const GRID_CELLS: u8 = 9;

/// How long a stimulus stays lit, independent of speed.
pub const STIMULUS_DURATION_MS: u64 = 500;

/// An independently tracked channel of a stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Modality {
    Position,
    Sound,
    Color,
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::Position, Modality::Sound, Modality::Color];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Serialize, Deserialize, ValueEnum, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    #[default]
    Position,
    Dual,
    Triple,
}

impl GameMode {
    /// Active modalities in the order they are generated and scored.
    pub fn modalities(self) -> &'static [Modality] {
        match self {
            GameMode::Position => &Modality::ALL[..1],
            GameMode::Dual => &Modality::ALL[..2],
            GameMode::Triple => &Modality::ALL,
        }
    }

    pub fn tracks(self, modality: Modality) -> bool {
        self.modalities().contains(&modality)
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Serialize, Deserialize, ValueEnum, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl GameSpeed {
    /// Time between two consecutive stimuli.
    pub fn interval_ms(self) -> u64 {
        match self {
            GameSpeed::Slow => 3500,
            GameSpeed::Normal => 2500,
            GameSpeed::Fast => 1500,
        }
    }
}

impl FromStr for GameSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// An RGB colour swatch, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Swatch(pub u32);

impl Swatch {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Swatch(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn channels(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }
}

impl fmt::Display for Swatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0xFF_FFFF)
    }
}

impl FromStr for Swatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 {
            return Err(format!("expected #rrggbb, got {s:?}"));
        }
        u32::from_str_radix(hex, 16)
            .map(Swatch)
            .map_err(|e| format!("invalid colour {s:?}: {e}"))
    }
}

impl TryFrom<String> for Swatch {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Swatch> for String {
    fn from(value: Swatch) -> Self {
        value.to_string()
    }
}

/// Colour sets handed to the generator.
pub struct Palette;

impl Palette {
    /// The nine swatches every shared seed was generated against.
    pub fn standard() -> Vec<Swatch> {
        vec![
            Swatch(0xef4444), // red
            Swatch(0x3b82f6), // blue
            Swatch(0x22c55e), // green
            Swatch(0xeab308), // yellow
            Swatch(0xa855f7), // purple
            Swatch(0xf97316), // orange
            Swatch(0x06b6d4), // cyan
            Swatch(0xec4899), // pink
            Swatch(0xf8fafc), // near white
        ]
    }

    /// Twelve-swatch variant. Sequences differ from [`Palette::standard`] for the same seed.
    pub fn extended() -> Vec<Swatch> {
        vec![
            Swatch(0xef4444),
            Swatch(0x3b82f6),
            Swatch(0x22c55e),
            Swatch(0xeab308),
            Swatch(0x06b6d4),
            Swatch(0xd946ef),
            Swatch(0xf97316),
            Swatch(0xec4899),
            Swatch(0x6366f1),
            Swatch(0x14b8a6),
            Swatch(0x84cc16),
            Swatch(0xf43f5e),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Serialize, Deserialize, ValueEnum, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Tr,
}

impl Locale {
    /// Letters spoken in dual and triple mode.
    pub fn alphabet(self) -> Vec<char> {
        match self {
            Locale::En => vec!['A', 'E', 'I', 'O', 'U', 'C', 'T', 'S', 'Y'],
            Locale::Tr => vec!['A', 'E', 'İ', 'O', 'U', 'C', 'T', 'S', 'Y'],
        }
    }
}

/// One step of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
    pub position: u8,
    pub sound: char,
    pub color: Swatch,
}

/// A generated, read-only stimulus sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence {
    stimuli: Vec<Stimulus>,
}

impl Sequence {
    pub(crate) fn from_vec(stimuli: Vec<Stimulus>) -> Self {
        Self { stimuli }
    }

    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Stimulus> {
        self.stimuli.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stimulus> {
        self.stimuli.iter()
    }

    pub fn as_slice(&self) -> &[Stimulus] {
        &self.stimuli
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Stimulus;
    type IntoIter = std::slice::Iter<'a, Stimulus>;

    fn into_iter(self) -> Self::IntoIter {
        self.stimuli.iter()
    }
}
