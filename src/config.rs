use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::reward::MAX_LEVEL;
use crate::session::PlayMode;
use crate::stimulus::{GameMode, GameSpeed, Locale};

/// Settings remembered between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub level: usize,
    pub mode: GameMode,
    pub speed: GameSpeed,
    pub locale: Locale,
    pub play_mode: PlayMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: 1,
            mode: GameMode::Dual,
            speed: GameSpeed::Normal,
            locale: Locale::En,
            play_mode: PlayMode::Standard,
        }
    }
}

impl Config {
    /// Level clamped into the playable range.
    pub fn level(&self) -> usize {
        self.level.clamp(1, MAX_LEVEL)
    }

    /// Back to a first-session level and mode; speed, locale and play mode stay.
    pub fn progress_reset(&self) -> Self {
        Self {
            level: 1,
            mode: GameMode::Dual,
            ..self.clone()
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = match ProjectDirs::from("", "", "cognivault") {
            Some(pd) => pd.config_dir().join("config.json"),
            None => PathBuf::from("cognivault_config.json"),
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable files fall back to defaults.
    fn load(&self) -> Config {
        fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Config>(&bytes).ok())
            .unwrap_or_default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
