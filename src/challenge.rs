//! Shareable challenge links: a seed plus the settings needed to replay it.

use thiserror::Error;

use crate::reward::MAX_LEVEL;
use crate::stimulus::{GameMode, GameSpeed};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("invalid value {value:?} for `{key}`")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    pub seed: i64,
    pub level: usize,
    pub mode: GameMode,
    pub speed: GameSpeed,
    /// Score of the player who issued the challenge.
    pub target_score: Option<u32>,
}

impl Challenge {
    /// Parses `type=challenge&seed=..&level=..&mode=..&speed=..&score=..`.
    ///
    /// Accepts a bare query, a query with a leading `?`, or a full URL.
    /// Returns `Ok(None)` when the query is not a challenge or carries no
    /// usable seed (missing or zero).
    pub fn from_query(input: &str) -> Result<Option<Self>, ChallengeError> {
        let query = match input.split_once('?') {
            Some((_, q)) => q,
            None => input,
        };
        let query = query.split('#').next().unwrap_or_default();

        let params: Vec<(String, String)> = query
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|p| {
                let (k, v) = p.split_once('=').unwrap_or((p, ""));
                (decode_component(k), decode_component(v))
            })
            .collect();
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        if get("type") != Some("challenge") {
            return Ok(None);
        }

        let seed = match get("seed") {
            None | Some("") => return Ok(None),
            Some(v) => parse_number::<i64>("seed", v)?,
        };
        if seed == 0 {
            return Ok(None);
        }

        let level = match get("level") {
            Some(v) => parse_number::<usize>("level", v)?,
            None => 1,
        };
        if !(1..=MAX_LEVEL).contains(&level) {
            return Err(invalid("level", &level.to_string()));
        }

        let mode = match get("mode") {
            Some(v) => v.parse::<GameMode>().map_err(|_| invalid("mode", v))?,
            None => GameMode::Position,
        };
        let speed = match get("speed") {
            Some(v) => v.parse::<GameSpeed>().map_err(|_| invalid("speed", v))?,
            None => GameSpeed::Normal,
        };
        let target_score = get("score")
            .map(|v| parse_number::<u32>("score", v))
            .transpose()?;

        Ok(Some(Self {
            seed,
            level,
            mode,
            speed,
            target_score,
        }))
    }

    pub fn to_query(&self) -> String {
        let mut query = format!(
            "type=challenge&seed={}&level={}&mode={}&speed={}",
            self.seed, self.level, self.mode, self.speed
        );
        if let Some(score) = self.target_score {
            query.push_str(&format!("&score={score}"));
        }
        query
    }

    /// Link to share, built on `base` with any existing query dropped.
    pub fn share_url(&self, base: &str) -> String {
        let base = base.split('?').next().unwrap_or(base);
        format!("{base}?{}", self.to_query())
    }
}

fn invalid(key: &'static str, value: &str) -> ChallengeError {
    ChallengeError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

/// Form decoding: `+` is a space, then percent escapes. Undecodable input is kept as is.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    value: &str,
) -> Result<T, ChallengeError> {
    value.trim().parse::<T>().map_err(|_| invalid(key, value))
}
