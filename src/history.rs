use std::io::Write;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::reward::UserStats;
use crate::session::SessionRecord;
use crate::stimulus::GRID_CELLS;
use crate::util::mean;

/// Sessions kept in history; older ones are pruned on insert.
pub const MAX_SESSIONS: usize = 100;
/// Sessions the missed-position heatmap looks back over.
pub const HEATMAP_WINDOW: usize = 20;

const CELLS: usize = GRID_CELLS as usize;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt history entry: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

/// Session history and player progress backed by SQLite.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Opens (or creates) the database at `path`, creating parent dirs.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened history db");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                played_at TEXT NOT NULL,
                score INTEGER NOT NULL,
                record TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS user_stats (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                data TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Stores a finished session and prunes anything past [`MAX_SESSIONS`].
    pub fn record(&mut self, record: &SessionRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO sessions (id, played_at, score, record) VALUES (?1, ?2, ?3, ?4)",
            params![record.id, record.date.to_rfc3339(), record.score, json],
        )?;
        tx.execute(
            r#"
            DELETE FROM sessions WHERE seq NOT IN (
                SELECT seq FROM sessions ORDER BY seq DESC LIMIT ?1
            )
            "#,
            params![MAX_SESSIONS as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Newest sessions first.
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT record FROM sessions ORDER BY seq DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(serde_json::from_str(&row?)?);
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Stored progress, or a fresh default when nothing has been saved.
    pub fn load_stats(&self) -> Result<UserStats> {
        let data: Option<String> = self
            .conn
            .query_row("SELECT data FROM user_stats WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        match data {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(UserStats::default()),
        }
    }

    pub fn save_stats(&self, stats: &UserStats) -> Result<()> {
        let json = serde_json::to_string(stats)?;
        self.conn.execute(
            "INSERT INTO user_stats (id, data) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            params![json],
        )?;
        Ok(())
    }

    /// Drops all sessions and progress.
    pub fn clear_all(&self) -> Result<()> {
        self.conn
            .execute_batch("DELETE FROM sessions; DELETE FROM user_stats;")?;
        Ok(())
    }

    /// Count of missed position matches per grid cell over the last
    /// [`HEATMAP_WINDOW`] sessions.
    pub fn missed_heatmap(&self) -> Result<[u32; CELLS]> {
        let mut cells = [0u32; CELLS];
        for record in self.recent(HEATMAP_WINDOW)? {
            for &pos in &record.missed_positions {
                if let Some(cell) = cells.get_mut(pos as usize) {
                    *cell += 1;
                }
            }
        }
        Ok(cells)
    }

    /// Mean of per-session mean reaction times, skipping sessions without any.
    pub fn average_reaction_ms(&self) -> Result<Option<f64>> {
        let per_session: Vec<f64> = self
            .recent(MAX_SESSIONS)?
            .iter()
            .filter_map(|r| {
                let times: Vec<f64> = r.reaction_times.iter().map(|&t| t as f64).collect();
                mean(&times)
            })
            .collect();
        Ok(mean(&per_session))
    }

    /// Writes every stored session as CSV, oldest first.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut records = self.recent(MAX_SESSIONS)?;
        records.reverse();

        let mut wtr = csv::Writer::from_writer(writer);
        for record in &records {
            wtr.serialize(CsvRow::from(record))?;
        }
        wtr.flush()?;
        Ok(records.len())
    }
}

#[derive(Debug, Serialize)]
struct CsvRow {
    date: String,
    level: usize,
    mode: String,
    speed: String,
    play_mode: String,
    score: u32,
    xp: u64,
    position_correct: usize,
    position_missed: usize,
    position_false_alarms: usize,
    sound_correct: usize,
    sound_missed: usize,
    sound_false_alarms: usize,
    color_correct: usize,
    color_missed: usize,
    color_false_alarms: usize,
    avg_reaction_ms: Option<u64>,
    daily: bool,
    challenge_seed: Option<i64>,
}

impl From<&SessionRecord> for CsvRow {
    fn from(r: &SessionRecord) -> Self {
        let times: Vec<f64> = r.reaction_times.iter().map(|&t| t as f64).collect();
        let d = &r.details;
        Self {
            date: r.date.to_rfc3339(),
            level: r.level,
            mode: r.mode.to_string(),
            speed: r.speed.to_string(),
            play_mode: r.play_mode.to_string(),
            score: r.score,
            xp: r.xp_earned,
            position_correct: d.position.correct,
            position_missed: d.position.missed,
            position_false_alarms: d.position.false_alarms,
            sound_correct: d.sound.correct,
            sound_missed: d.sound.missed,
            sound_false_alarms: d.sound.false_alarms,
            color_correct: d.color.correct,
            color_missed: d.color.missed,
            color_false_alarms: d.color.false_alarms,
            avg_reaction_ms: mean(&times).map(|m| m.round() as u64),
            daily: r.is_daily,
            challenge_seed: r.challenge_seed,
        }
    }
}
