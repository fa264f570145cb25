//! Random sources for sequence generation.
//!
//! Seeded sessions (daily races, challenge links) must produce the same
//! sequence on every machine, so they run on [`Mulberry32`], a 32-bit
//! generator whose output is reproduced bit for bit from the web client that
//! first issued those seeds. Unseeded sessions use the thread-local generator
//! from `rand`.

use chrono::{Local, NaiveDate, TimeZone};
use rand::{rngs::ThreadRng, Rng};

/// Upper bound (exclusive) for freshly minted challenge seeds.
pub const CHALLENGE_SEED_RANGE: i64 = 10_000_000;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// A source of uniformly distributed floats in `[0, 1)`.
pub trait UnitRng {
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        (self.next_unit() * len as f64).floor() as usize
    }
}

/// Mulberry32: single `u32` state word, one wrapping add per draw.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Seeds are reduced modulo 2^32, so day timestamps and negative values
    /// land on the same state the web client used.
    pub fn new(seed: i64) -> Self {
        Self { state: seed as u32 }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

impl UnitRng for Mulberry32 {
    fn next_unit(&mut self) -> f64 {
        self.next_u32() as f64 / TWO_POW_32
    }
}

/// Non-deterministic source backed by `rand::thread_rng`.
pub struct ThreadRandom {
    rng: ThreadRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRng for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Fresh seed for a challenge the player is about to create. Never zero,
/// since a zero seed in a link reads as "no challenge".
pub fn random_challenge_seed() -> i64 {
    rand::thread_rng().gen_range(1..CHALLENGE_SEED_RANGE)
}

/// Seed shared by everyone racing on `date`: epoch milliseconds of local midnight.
pub fn daily_seed(date: NaiveDate) -> i64 {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match Local.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.timestamp_millis(),
        // midnight skipped by a DST jump; fall back to the UTC reading
        None => midnight.and_utc().timestamp_millis(),
    }
}
