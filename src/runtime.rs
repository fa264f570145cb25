use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent};

use crate::stimulus::{GameSpeed, Modality, STIMULUS_DURATION_MS};

/// What the play loop reacts to: a key press, a terminal resize, or an idle tick.
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Where key presses come from. Swapped for a channel in headless runs.
pub trait EventSource: Send + 'static {
    /// Waits at most `timeout`; the runner turns a timeout into a tick.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread.
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) => GameEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => GameEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Upper bound on how long the loop sleeps before re-checking the step clock.
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Event source fed from a channel, for headless runs.
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls one event per call so the session clock can be checked between key presses.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the tick interval; returns Tick on timeout.
    pub fn step(&self) -> GameEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => GameEvent::Tick,
        }
    }
}

/// Paces stimulus presentation: a step is due one interval after the
/// previous one (or after the start), and stays lit for a fixed time.
#[derive(Clone, Copy, Debug)]
pub struct StepClock {
    interval: Duration,
    lit_for: Duration,
    last: Instant,
    last_shown: Option<Instant>,
}

impl StepClock {
    pub fn new(speed: GameSpeed, now: Instant) -> Self {
        Self::with_timing(
            Duration::from_millis(speed.interval_ms()),
            Duration::from_millis(STIMULUS_DURATION_MS),
            now,
        )
    }

    pub fn with_timing(interval: Duration, lit_for: Duration, now: Instant) -> Self {
        Self {
            interval,
            lit_for,
            last: now,
            last_shown: None,
        }
    }

    pub fn due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.interval
    }

    /// Records that a step was presented at `now`.
    pub fn mark(&mut self, now: Instant) {
        self.last = now;
        self.last_shown = Some(now);
    }

    pub fn lit(&self, now: Instant) -> bool {
        self.last_shown
            .is_some_and(|t| now.saturating_duration_since(t) < self.lit_for)
    }
}

/// Response keys: `a` position, `l` sound, `s` colour.
pub fn key_modality(code: KeyCode) -> Option<Modality> {
    match code {
        KeyCode::Char('a') | KeyCode::Char('A') => Some(Modality::Position),
        KeyCode::Char('l') | KeyCode::Char('L') => Some(Modality::Sound),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Modality::Color),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    type Headless = Runner<TestEventSource, FixedTicker>;

    fn headless(interval_ms: u64) -> (mpsc::Sender<GameEvent>, Headless) {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(interval_ms)),
        );
        (tx, runner)
    }

    #[test]
    fn idle_loop_ticks() {
        let (_tx, runner) = headless(1);
        assert!(matches!(runner.step(), GameEvent::Tick));
    }

    #[test]
    fn response_keys_reach_the_loop() {
        let (tx, runner) = headless(10);
        tx.send(GameEvent::Key(KeyEvent::from(KeyCode::Char('l'))))
            .unwrap();
        match runner.step() {
            GameEvent::Key(k) => assert_eq!(key_modality(k.code), Some(Modality::Sound)),
            other => panic!("expected key, got {other:?}"),
        }
    }

    #[test]
    fn dropped_sender_degrades_to_ticks() {
        let (tx, runner) = headless(10);
        drop(tx);
        assert!(matches!(runner.step(), GameEvent::Tick));
    }

    #[test]
    fn clock_waits_a_full_interval() {
        let t0 = Instant::now();
        let mut clock = StepClock::with_timing(
            Duration::from_millis(100),
            Duration::from_millis(30),
            t0,
        );
        assert!(!clock.due(t0));
        assert!(!clock.lit(t0));
        assert!(clock.due(t0 + Duration::from_millis(100)));

        let shown = t0 + Duration::from_millis(100);
        clock.mark(shown);
        assert!(clock.lit(shown + Duration::from_millis(29)));
        assert!(!clock.lit(shown + Duration::from_millis(30)));
        assert!(!clock.due(shown + Duration::from_millis(99)));
        assert!(clock.due(shown + Duration::from_millis(150)));
    }

    #[test]
    fn speed_sets_interval() {
        let t0 = Instant::now();
        let clock = StepClock::new(GameSpeed::Fast, t0);
        assert!(!clock.due(t0 + Duration::from_millis(1499)));
        assert!(clock.due(t0 + Duration::from_millis(1500)));
    }

    #[test]
    fn keys_map_to_modalities() {
        assert_eq!(key_modality(KeyCode::Char('a')), Some(Modality::Position));
        assert_eq!(key_modality(KeyCode::Char('L')), Some(Modality::Sound));
        assert_eq!(key_modality(KeyCode::Char('s')), Some(Modality::Color));
        assert_eq!(key_modality(KeyCode::Char('x')), None);
        assert_eq!(key_modality(KeyCode::Esc), None);
    }
}
