mod logging;
mod ui;

use std::{
    error::Error,
    fs::File,
    io::{self, stdin, BufWriter, Write},
    path::PathBuf,
    time::{Duration, Instant},
};

use chrono::{Local, NaiveDate};
use clap::{error::ErrorKind, CommandFactory, Parser};
use cognivault::{
    app_dirs::AppDirs,
    challenge::{Challenge, ChallengeError},
    config::{Config, ConfigStore, FileConfigStore},
    generator::GenerateError,
    history::HistoryDb,
    matches::MatchSets,
    reward::{next_level, UserStats},
    runtime::{key_modality, CrosstermEventSource, FixedTicker, GameEvent, Runner, StepClock},
    session::{
        FinishReason, PlayMode, Response, SeedChoice, Session, SessionConfig, SessionRecord, Step,
    },
    stimulus::{GameMode, GameSpeed, Locale, Modality, Palette, Sequence},
};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use serde::Serialize;
use tracing::{info, warn};
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 50;
const FEEDBACK_MS: u64 = 300;
const DEFAULT_SHARE_BASE: &str = "https://cognivault.app/";

/// dual and triple n-back training in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = concat!(
        "An n-back working-memory trainer for the terminal. Watch the grid, read the letter, ",
        "and press a key whenever the current stimulus matches the one N steps back."
    )
)]
pub struct Cli {
    /// n-back level (defaults to the saved level)
    #[clap(short = 'n', long, value_parser = clap::value_parser!(u8).range(1..=9))]
    level: Option<u8>,

    /// which channels to track
    #[clap(short, long, value_enum)]
    mode: Option<GameMode>,

    /// time between stimuli
    #[clap(short, long, value_enum)]
    speed: Option<GameSpeed>,

    /// standard, open-ended practice, or marathon until the first mistake
    #[clap(short, long, value_enum)]
    play_mode: Option<PlayMode>,

    /// play today's shared daily sequence
    #[clap(long, conflicts_with_all = ["challenge", "create_challenge", "seed"])]
    daily: bool,

    /// replay a challenge link (full URL or query string)
    #[clap(long, value_name = "LINK", conflicts_with_all = ["create_challenge", "seed"])]
    challenge: Option<String>,

    /// play a fresh seeded sequence that can be shared as a challenge
    #[clap(long, conflicts_with = "seed")]
    create_challenge: bool,

    /// fixed sequence seed
    #[clap(long, allow_hyphen_values = true)]
    seed: Option<i64>,

    /// sound alphabet and rank names
    #[clap(short, long, value_enum)]
    locale: Option<Locale>,

    /// print the generated sequence and its matches as JSON, then exit
    #[clap(long)]
    dump: bool,

    /// write session history as CSV to PATH, then exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// clear all history and progress, then exit
    #[clap(long)]
    reset: bool,

    /// tracing filter for the log file, e.g. `debug` (also read from COGNIVAULT_LOG)
    #[clap(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// base URL for challenge links
    #[clap(long, value_name = "URL", default_value = DEFAULT_SHARE_BASE)]
    share_base: String,
}

impl Cli {
    fn incoming_challenge(&self) -> Result<Option<Challenge>, ChallengeError> {
        match &self.challenge {
            Some(link) => Challenge::from_query(link),
            None => Ok(None),
        }
    }

    /// Stored config with any flags applied on top.
    fn merged_config(&self, stored: &Config) -> Config {
        Config {
            level: self.level.map(usize::from).unwrap_or(stored.level),
            mode: self.mode.unwrap_or(stored.mode),
            speed: self.speed.unwrap_or(stored.speed),
            locale: self.locale.unwrap_or(stored.locale),
            play_mode: self.play_mode.unwrap_or(stored.play_mode),
        }
    }

    fn seed_choice(&self, today: NaiveDate) -> SeedChoice {
        if self.daily {
            SeedChoice::Daily(today)
        } else if self.create_challenge {
            SeedChoice::CreateChallenge
        } else if let Some(seed) = self.seed {
            SeedChoice::Fixed(seed)
        } else {
            SeedChoice::Random
        }
    }

    /// Settings for the first session. A challenge link fixes level, mode
    /// and speed, and is always played as a standard session.
    fn settings(&self, config: &Config, incoming: Option<Challenge>, today: NaiveDate) -> Settings {
        match incoming {
            Some(c) => Settings {
                config: Config {
                    level: c.level,
                    mode: c.mode,
                    speed: c.speed,
                    play_mode: PlayMode::Standard,
                    ..config.clone()
                },
                seed: SeedChoice::Challenge(c.seed),
                incoming: Some(c),
                share_base: self.share_base.clone(),
            },
            None => Settings {
                config: config.clone(),
                seed: self.seed_choice(today),
                incoming: None,
                share_base: self.share_base.clone(),
            },
        }
    }
}

/// What the next session is built from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub seed: SeedChoice,
    pub incoming: Option<Challenge>,
    pub share_base: String,
}

impl Settings {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            level: self.config.level(),
            mode: self.config.mode,
            speed: self.config.speed,
            play_mode: self.config.play_mode,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Playing,
    Results,
    History,
}

/// Brief highlight of the last response on the key legend.
#[derive(Debug, Clone, Copy)]
pub struct Feedback {
    pub modality: Modality,
    pub response: Response,
    pub at: Instant,
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub record: SessionRecord,
    pub reason: FinishReason,
    pub next_level: usize,
    pub rank_before: &'static str,
    pub rank: &'static str,
    /// Challenge the player can pass on after a created-challenge session.
    pub share: Option<Challenge>,
    pub target_score: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct HistoryView {
    pub recent: Vec<SessionRecord>,
    pub heatmap: [u32; 9],
    pub avg_reaction_ms: Option<f64>,
}

pub struct App {
    pub settings: Settings,
    pub saved: Config,
    store: Box<dyn ConfigStore>,
    db: Option<HistoryDb>,
    pub stats: UserStats,
    pub session: Session,
    pub clock: StepClock,
    pub state: AppState,
    pub feedback: Option<Feedback>,
    pub outcome: Option<Outcome>,
    pub history: Option<HistoryView>,
    pub notice: Option<String>,
}

#[derive(Debug, PartialEq)]
enum ExitType {
    Restart,
    New,
    Quit,
}

impl App {
    pub fn new(
        settings: Settings,
        saved: Config,
        store: Box<dyn ConfigStore>,
        db: Option<HistoryDb>,
        today: NaiveDate,
    ) -> Result<Self, GenerateError> {
        let mut stats = match db.as_ref().map(HistoryDb::load_stats) {
            Some(Ok(stats)) => stats,
            Some(Err(err)) => {
                warn!(%err, "could not load progress; starting fresh");
                UserStats::default()
            }
            None => UserStats::default(),
        };
        stats.decay(today);

        let session = start_session(&settings)?;
        let clock = StepClock::new(settings.config.speed, Instant::now());

        Ok(Self {
            settings,
            saved,
            store,
            db,
            stats,
            session,
            clock,
            state: AppState::Playing,
            feedback: None,
            outcome: None,
            history: None,
            notice: None,
        })
    }

    pub fn locale(&self) -> Locale {
        self.settings.config.locale
    }

    pub fn feedback_at(&self, now: Instant) -> Option<Feedback> {
        self.feedback
            .filter(|f| now.saturating_duration_since(f.at) < Duration::from_millis(FEEDBACK_MS))
    }

    pub fn on_tick(&mut self, now: Instant) {
        if self.state != AppState::Playing || self.session.is_finished() {
            return;
        }
        if self.clock.due(now) {
            self.clock.mark(now);
            if let Step::Finished(_) = self.session.advance() {
                self.finish(Local::now().date_naive());
            }
        }
    }

    pub fn respond(&mut self, modality: Modality, now: Instant) {
        if self.state != AppState::Playing {
            return;
        }
        let response = self.session.respond(modality);
        if response != Response::Ignored {
            self.feedback = Some(Feedback {
                modality,
                response,
                at: now,
            });
        }
        if self.session.is_finished() {
            self.finish(Local::now().date_naive());
        }
    }

    /// Ends the running session early and shows results.
    pub fn stop(&mut self) {
        if self.state == AppState::Playing {
            self.session.stop();
            self.finish(Local::now().date_naive());
        }
    }

    fn is_challenge(&self) -> bool {
        self.settings.incoming.is_some() || self.session.challenge_seed().is_some()
    }

    fn finish(&mut self, today: NaiveDate) {
        let record = self.session.record();
        let reason = self
            .session
            .finish_reason()
            .unwrap_or(FinishReason::Completed);
        let locale = self.locale();
        let level = self.session.config().level;

        let rank_before = self.stats.rank(locale);
        self.stats
            .record_session(record.xp_earned, record.score, level, today);

        if let Some(db) = self.db.as_mut() {
            let saved = db.record(&record).and_then(|_| db.save_stats(&self.stats));
            if let Err(err) = saved {
                warn!(%err, "failed to save session");
                self.notice = Some(format!("history not saved: {err}"));
            }
        }

        let challenge = self.is_challenge();
        let next = next_level(level, record.score, challenge);
        if !challenge {
            self.settings.config.level = next;
            self.saved.level = next;
            if let Err(err) = self.store.save(&self.saved) {
                warn!(%err, "failed to save config");
            }
        }

        let share = match (self.settings.seed, self.session.challenge_seed()) {
            (SeedChoice::CreateChallenge, Some(seed)) => Some(Challenge {
                seed,
                level,
                mode: self.session.config().mode,
                speed: self.session.config().speed,
                target_score: Some(record.score),
            }),
            _ => None,
        };

        info!(score = record.score, next_level = next, challenge, "results ready");

        self.outcome = Some(Outcome {
            reason,
            next_level: next,
            rank_before,
            rank: self.stats.rank(locale),
            share,
            target_score: self.settings.incoming.and_then(|c| c.target_score),
            record,
        });
        self.feedback = None;
        self.state = AppState::Results;
    }

    pub fn share_link(&self) -> Option<String> {
        let share = self.outcome.as_ref()?.share?;
        Some(share.share_url(&self.settings.share_base))
    }

    fn open_share(&mut self) {
        let Some(url) = self.share_link() else {
            return;
        };
        if Browser::is_available() && webbrowser::open(&url).is_ok() {
            self.notice = Some("opened challenge link in browser".to_string());
        } else {
            self.notice = Some(format!("share this link: {url}"));
        }
    }

    fn show_history(&mut self) {
        let Some(db) = self.db.as_ref() else {
            self.notice = Some("history is unavailable".to_string());
            return;
        };
        let view = db.recent(20).and_then(|recent| {
            Ok(HistoryView {
                recent,
                heatmap: db.missed_heatmap()?,
                avg_reaction_ms: db.average_reaction_ms()?,
            })
        });
        match view {
            Ok(view) => {
                self.history = Some(view);
                self.state = AppState::History;
            }
            Err(err) => {
                warn!(%err, "failed to load history");
                self.notice = Some(format!("could not load history: {err}"));
            }
        }
    }

    /// Sets up the next session. `Restart` replays the same settings;
    /// `New` leaves any incoming challenge and uses the saved level.
    fn reset(&mut self, exit: ExitType) -> Result<(), GenerateError> {
        if exit == ExitType::New {
            if self.settings.incoming.take().is_some() {
                self.settings.config = self.saved.clone();
            }
            self.settings.seed = match self.settings.seed {
                SeedChoice::CreateChallenge => SeedChoice::CreateChallenge,
                _ => SeedChoice::Random,
            };
        }
        self.session = start_session(&self.settings)?;
        self.clock = StepClock::new(self.settings.config.speed, Instant::now());
        self.state = AppState::Playing;
        self.feedback = None;
        self.outcome = None;
        self.notice = None;
        Ok(())
    }

    /// Handles one key press; returns how to leave the current session, if at all.
    fn on_key(&mut self, key: KeyEvent, now: Instant) -> Option<ExitType> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(ExitType::Quit);
        }

        match self.state {
            AppState::Playing => match key.code {
                KeyCode::Esc => self.stop(),
                code => {
                    if let Some(modality) = key_modality(code) {
                        self.respond(modality, now);
                    }
                }
            },
            AppState::Results => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Some(ExitType::Quit),
                KeyCode::Char('r') => return Some(ExitType::Restart),
                KeyCode::Char('n') | KeyCode::Enter => return Some(ExitType::New),
                KeyCode::Char('h') => self.show_history(),
                KeyCode::Char('c') => self.open_share(),
                _ => {}
            },
            AppState::History => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Some(ExitType::Quit),
                KeyCode::Char('b') | KeyCode::Backspace => self.state = AppState::Results,
                KeyCode::Char('n') | KeyCode::Enter => return Some(ExitType::New),
                _ => {}
            },
        }
        None
    }
}

fn start_session(settings: &Settings) -> Result<Session, GenerateError> {
    Session::start(
        settings.session_config(),
        settings.config.locale.alphabet(),
        Palette::standard(),
    )
}

#[derive(Serialize)]
struct Dump<'a> {
    level: usize,
    mode: GameMode,
    play_mode: PlayMode,
    challenge_seed: Option<i64>,
    sequence: &'a Sequence,
    matches: &'a MatchSets,
}

fn dump(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let session = start_session(settings)?;
    let config = session.config();
    let out = Dump {
        level: config.level,
        mode: config.mode,
        play_mode: config.play_mode,
        challenge_seed: session.challenge_seed(),
        sequence: session.sequence(),
        matches: session.matches(),
    };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, &out)?;
    writeln!(handle)?;
    Ok(())
}

fn open_history() -> Result<HistoryDb, Box<dyn Error>> {
    let path = AppDirs::db_path().ok_or("could not resolve a state directory")?;
    Ok(HistoryDb::open(path)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let _log_guard = logging::requested_level(cli.log_level.as_deref()).and_then(|level| {
        let dir = AppDirs::log_dir()?;
        logging::init_tracing(&level, &dir)
    });

    let incoming = match cli.incoming_challenge() {
        Ok(c) => c,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
        }
    };

    let today = Local::now().date_naive();
    let store = FileConfigStore::new();
    let saved = cli.merged_config(&store.load());
    let settings = cli.settings(&saved, incoming, today);

    if cli.dump {
        return dump(&settings);
    }

    if let Some(path) = &cli.export {
        let db = open_history()?;
        let file = BufWriter::new(File::create(path)?);
        let rows = db.export_csv(file)?;
        println!("exported {rows} sessions to {}", path.display());
        return Ok(());
    }

    if cli.reset {
        open_history()?.clear_all()?;
        store.save(&store.load().progress_reset())?;
        println!("history and progress cleared");
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(err) = store.save(&saved) {
        warn!(%err, "failed to save config");
    }

    let db = match open_history() {
        Ok(db) => Some(db),
        Err(err) => {
            warn!(%err, "history disabled");
            None
        }
    };

    let mut app = App::new(settings, saved, Box::new(store), db, today)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let exit = match runner.step() {
            GameEvent::Tick => {
                app.on_tick(Instant::now());
                None
            }
            GameEvent::Resize => None,
            GameEvent::Key(key) => app.on_key(key, Instant::now()),
        };

        match exit {
            Some(ExitType::Quit) => break,
            Some(exit) => app.reset(exit)?,
            None => {}
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    pub struct MemoryStore {
        saved: Rc<RefCell<Option<Config>>>,
    }

    impl ConfigStore for MemoryStore {
        fn load(&self) -> Config {
            self.saved.borrow().clone().unwrap_or_default()
        }

        fn save(&self, cfg: &Config) -> std::io::Result<()> {
            *self.saved.borrow_mut() = Some(cfg.clone());
            Ok(())
        }
    }

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    pub fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    pub fn app_with(args: &[&str]) -> (App, MemoryStore) {
        let cli = Cli::parse_from(args);
        let incoming = cli.incoming_challenge().unwrap();
        let saved = cli.merged_config(&Config::default());
        let settings = cli.settings(&saved, incoming, today());
        let store = MemoryStore::default();
        let db = HistoryDb::open_in_memory().unwrap();
        let app = App::new(settings, saved, Box::new(store.clone()), Some(db), today()).unwrap();
        (app, store)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use cognivault::scoring::UserInputs;
    use crossterm::event::KeyEventKind;

    /// Answers every match until the session ends.
    fn play_perfectly(app: &mut App) {
        let mut now = Instant::now();
        while app.state == AppState::Playing {
            now += Duration::from_millis(3000);
            app.on_tick(now);
            if app.state != AppState::Playing {
                break;
            }
            let idx = app.session.current_index() - 1;
            for &m in app.session.config().mode.modalities() {
                if app.session.matches().contains(m, idx) {
                    app.respond(m, now);
                }
            }
        }
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["cognivault"]);
        assert_eq!(cli.level, None);
        assert_eq!(cli.mode, None);
        assert!(!cli.daily);
        assert!(!cli.dump);
        assert_eq!(cli.share_base, DEFAULT_SHARE_BASE);
        assert_eq!(cli.seed_choice(today()), SeedChoice::Random);
    }

    #[test]
    fn cli_level_is_range_checked() {
        assert_eq!(Cli::parse_from(["cognivault", "-n", "4"]).level, Some(4));
        assert!(Cli::try_parse_from(["cognivault", "--level", "0"]).is_err());
        assert!(Cli::try_parse_from(["cognivault", "--level", "10"]).is_err());
    }

    #[test]
    fn cli_flags_override_stored_config() {
        let cli = Cli::parse_from([
            "cognivault",
            "--mode",
            "triple",
            "--speed",
            "fast",
            "--locale",
            "tr",
        ]);
        let stored = Config {
            level: 5,
            ..Default::default()
        };
        let merged = cli.merged_config(&stored);
        assert_eq!(merged.level, 5);
        assert_eq!(merged.mode, GameMode::Triple);
        assert_eq!(merged.speed, GameSpeed::Fast);
        assert_eq!(merged.locale, Locale::Tr);
    }

    #[test]
    fn cli_seed_choices() {
        let daily = Cli::parse_from(["cognivault", "--daily"]);
        assert_eq!(daily.seed_choice(today()), SeedChoice::Daily(today()));

        let fixed = Cli::parse_from(["cognivault", "--seed", "-17"]);
        assert_eq!(fixed.seed_choice(today()), SeedChoice::Fixed(-17));

        let create = Cli::parse_from(["cognivault", "--create-challenge"]);
        assert_eq!(create.seed_choice(today()), SeedChoice::CreateChallenge);

        assert!(Cli::try_parse_from(["cognivault", "--daily", "--seed", "3"]).is_err());
    }

    #[test]
    fn challenge_link_overrides_settings() {
        let cli = Cli::parse_from([
            "cognivault",
            "--play-mode",
            "practice",
            "--challenge",
            "https://x.test/?type=challenge&seed=42&level=2&mode=dual&speed=slow&score=80",
        ]);
        let incoming = cli.incoming_challenge().unwrap();
        let settings = cli.settings(&cli.merged_config(&Config::default()), incoming, today());
        assert_eq!(settings.seed, SeedChoice::Challenge(42));
        assert_eq!(settings.config.level, 2);
        assert_eq!(settings.config.mode, GameMode::Dual);
        assert_eq!(settings.config.speed, GameSpeed::Slow);
        assert_eq!(settings.config.play_mode, PlayMode::Standard);
    }

    #[test]
    fn bad_challenge_link_is_an_error() {
        let cli = Cli::parse_from(["cognivault", "--challenge", "type=challenge&seed=x"]);
        assert!(cli.incoming_challenge().is_err());
    }

    #[test]
    fn keys_before_level_do_nothing() {
        let (mut app, _) = app_with(&["cognivault", "-n", "2", "-m", "dual"]);
        let now = Instant::now();
        assert_eq!(app.on_key(key('a'), now), None);
        assert!(app.feedback.is_none());
        assert_eq!(app.session.inputs(), &UserInputs::new());
    }

    #[test]
    fn perfect_standard_session_levels_up_and_saves() {
        let (mut app, store) = app_with(&["cognivault", "-n", "2", "-m", "dual", "--seed", "42"]);
        play_perfectly(&mut app);

        assert_eq!(app.state, AppState::Results);
        let outcome = app.outcome.as_ref().unwrap();
        assert_eq!(outcome.record.score, 100);
        assert_eq!(outcome.next_level, 3);
        assert_eq!(outcome.reason, FinishReason::Completed);
        assert!(outcome.share.is_none());
        assert_eq!(app.stats.streak, 1);
        assert_eq!(app.stats.best_n, 2);
        assert_eq!(store.load().level, 3);
        assert_eq!(app.db.as_ref().unwrap().count().unwrap(), 1);

        assert_eq!(app.on_key(key('n'), Instant::now()), Some(ExitType::New));
        app.reset(ExitType::New).unwrap();
        assert_eq!(app.session.config().level, 3);
        assert_eq!(app.state, AppState::Playing);
    }

    #[test]
    fn challenge_sessions_keep_the_level() {
        let (mut app, store) = app_with(&[
            "cognivault",
            "--challenge",
            "?type=challenge&seed=42&level=2&mode=dual&score=70",
        ]);
        play_perfectly(&mut app);

        let outcome = app.outcome.as_ref().unwrap();
        assert_eq!(outcome.record.challenge_seed, Some(42));
        assert_eq!(outcome.target_score, Some(70));
        assert_eq!(outcome.next_level, 2);
        assert_eq!(store.load(), Config::default());

        app.reset(ExitType::New).unwrap();
        assert!(app.settings.incoming.is_none());
        assert_eq!(app.session.config().level, 1);
        assert_eq!(app.session.challenge_seed(), None);
    }

    #[test]
    fn created_challenge_can_be_shared() {
        let (mut app, _) = app_with(&[
            "cognivault",
            "--create-challenge",
            "--share-base",
            "https://x.test/play",
        ]);
        play_perfectly(&mut app);

        let seed = app.session.challenge_seed().unwrap();
        let link = app.share_link().unwrap();
        assert!(link.starts_with("https://x.test/play?type=challenge&"));
        let parsed = Challenge::from_query(&link).unwrap().unwrap();
        assert_eq!(parsed.seed, seed);
        assert_eq!(parsed.target_score, Some(100));
    }

    #[test]
    fn escape_stops_then_quits() {
        let (mut app, _) = app_with(&["cognivault", "-p", "practice"]);
        let now = Instant::now() + Duration::from_secs(5);
        app.on_tick(now);
        assert_eq!(app.on_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), now), None);
        assert_eq!(app.state, AppState::Results);
        assert_eq!(
            app.outcome.as_ref().unwrap().reason,
            FinishReason::Stopped
        );
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), now),
            Some(ExitType::Quit)
        );
    }

    #[test]
    fn history_screen_round_trip() {
        let (mut app, _) = app_with(&["cognivault", "--seed", "7"]);
        app.stop();
        assert_eq!(app.on_key(key('h'), Instant::now()), None);
        assert_eq!(app.state, AppState::History);
        assert_eq!(app.history.as_ref().unwrap().recent.len(), 1);
        app.on_key(key('b'), Instant::now());
        assert_eq!(app.state, AppState::Results);
    }

    #[test]
    fn ctrl_c_quits_anywhere() {
        let (mut app, _) = app_with(&["cognivault"]);
        let mut ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        ev.kind = KeyEventKind::Press;
        assert_eq!(app.on_key(ev, Instant::now()), Some(ExitType::Quit));
    }
}
