// Drives the compiled binary through a PTY to exercise the real event
// loop and crossterm input handling.
//
// Requires a TTY (expectrl allocates one), so it is Unix-only and ignored
// by default. Run with: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn session_stops_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("cognivault");
    let cmd = format!(
        "env HOME={} {} -n 1 -m position -s fast --seed 7",
        home.path().display(),
        bin.display()
    );

    let mut p = spawn(cmd)?;

    // first stimulus appears after one fast interval
    std::thread::sleep(Duration::from_millis(1800));
    p.send("a")?;
    std::thread::sleep(Duration::from_millis(200));

    // ESC stops the session, the second ESC leaves the results screen
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("\x1b")?;

    p.expect(Eof)?;
    Ok(())
}
