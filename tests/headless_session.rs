use std::sync::mpsc;
use std::time::{Duration, Instant};

use cognivault::runtime::{key_modality, FixedTicker, GameEvent, Runner, StepClock, TestEventSource};
use cognivault::session::{
    FinishReason, PlayMode, Response, SeedChoice, Session, SessionConfig, Step,
};
use cognivault::stimulus::{GameMode, GameSpeed, Locale, Modality, Palette};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn session(level: usize, mode: GameMode, play_mode: PlayMode, seed: i64) -> Session {
    Session::start(
        SessionConfig {
            level,
            mode,
            speed: GameSpeed::Fast,
            play_mode,
            seed: SeedChoice::Challenge(seed),
        },
        Locale::En.alphabet(),
        Palette::standard(),
    )
    .unwrap()
}

fn press(c: char) -> GameEvent {
    GameEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Drives a whole session through Runner/TestEventSource without a TTY.
// A short step interval stands in for the real speed.
#[test]
fn headless_dual_session_completes() {
    let mut session = session(2, GameMode::Dual, PlayMode::Standard, 42);
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );
    let mut clock = StepClock::with_timing(
        Duration::from_millis(2),
        Duration::from_millis(1),
        Instant::now(),
    );

    let mut hits = 0;
    for _ in 0..10_000u32 {
        match runner.step() {
            GameEvent::Tick => {
                let now = Instant::now();
                if !clock.due(now) {
                    continue;
                }
                clock.mark(now);
                match session.advance() {
                    Step::Shown { index, .. } => {
                        // queue the right answers for the step just shown
                        if session.matches().contains(Modality::Position, index) {
                            tx.send(press('a')).unwrap();
                        }
                        if session.matches().contains(Modality::Sound, index) {
                            tx.send(press('l')).unwrap();
                        }
                    }
                    Step::Finished(reason) => {
                        assert_eq!(reason, FinishReason::Completed);
                        break;
                    }
                }
            }
            GameEvent::Key(key) => {
                let modality = key_modality(key.code).expect("only response keys are sent");
                if session.respond(modality) == Response::Hit {
                    hits += 1;
                }
            }
            GameEvent::Resize => {}
        }
    }

    assert!(session.is_finished(), "session should run to completion");
    let record = session.record();
    assert_eq!(record.score, 100);
    assert_eq!(hits, 14);
    assert_eq!(record.steps_presented, 25);
}

#[test]
fn headless_colour_key_ignored_outside_triple() {
    let mut session = session(1, GameMode::Dual, PlayMode::Standard, 7);
    session.advance();
    session.advance();
    let color = key_modality(KeyCode::Char('s')).unwrap();
    assert_eq!(session.respond(color), Response::Ignored);
    assert!(session.inputs().get(Modality::Color).is_empty());
}

#[test]
fn headless_marathon_stops_on_silence() {
    // never answer: the first match that passes ends the run
    let mut session = session(1, GameMode::Position, PlayMode::Marathon, 7);
    let first = session.matches().position[0];
    let mut steps = 0;
    while let Step::Shown { .. } = session.advance() {
        steps += 1;
    }
    assert_eq!(session.finish_reason(), Some(FinishReason::MarathonFailure));
    assert_eq!(steps, first + 1);
    assert_eq!(session.record().details.position.missed, 1);
}
