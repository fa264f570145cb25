// Library surface for the terminal app, headless tests and reuse.
// Terminal-only types (App, screens) stay in main.rs.
pub mod app_dirs;
pub mod challenge;
pub mod config;
pub mod generator;
pub mod history;
pub mod matches;
pub mod prng;
pub mod reward;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod stimulus;
pub mod util;
