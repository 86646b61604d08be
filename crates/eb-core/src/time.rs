//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing real number of simulated seconds,
//! advanced once per tick by the host.  Handlers never block: every
//! "waiting" behavior is expressed as `elapsed = clock.now() - start` read
//! at the top of a tick, so the clock is the single time authority and tests
//! can drive it wherever they like.
//!
//! The integer tick counter rides along purely for logging and for "run N
//! ticks" style loops; all behavior-visible arithmetic happens on the f64
//! seconds value.

use std::fmt;

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The monotonic simulation clock.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Simulated seconds one tick represents.
    pub tick_dt: f64,
    /// Ticks advanced so far.
    pub tick: u64,
    /// Simulated seconds elapsed since the run started.
    now: f64,
}

impl SimClock {
    /// Create a clock at t = 0 with the given tick resolution.
    pub fn new(tick_dt: f64) -> Self {
        Self { tick_dt, tick: 0, now: 0.0 }
    }

    /// Current simulated time in seconds.
    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.tick += 1;
        self.now += self.tick_dt;
    }

    /// Jump the clock forward by `secs` without counting ticks.
    ///
    /// Test-oriented: lets a scenario "wait out" a duration in one call.
    /// Debug-asserts that time never runs backwards.
    pub fn skip(&mut self, secs: f64) {
        debug_assert!(secs >= 0.0, "SimClock::skip({secs}) would rewind time");
        self.now += secs;
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{} ({:.2}s)", self.tick, self.now)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically built in code by the application crate (or loaded from a
/// TOML/JSON file with the `serde` feature) and passed to the driver.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Simulated seconds per tick.  Default: 1/60 (one display frame).
    pub tick_dt: f64,

    /// Master RNG seed.  The same seed always produces identical runs.
    pub seed: u64,
}

impl SimConfig {
    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_dt)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { tick_dt: 1.0 / 60.0, seed: 0 }
    }
}
