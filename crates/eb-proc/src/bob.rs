//! Seeded sinusoid offsets ("bobbing").
//!
//! # Model
//!
//! A bob channel is `height * sin(freq * (t + seed))` where `seed` is a
//! fixed per-entity phase offset chosen at creation.  Two channels at
//! different frequencies per axis compose into organic wandering motion.
//!
//! # Applying bobs
//!
//! Consumers apply the *delta* between successive frames' offsets, not the
//! absolute offset:
//!
//! ```text
//! pos += bob_delta(h, f, seed, prev_t, now)
//! ```
//!
//! with `prev_t` updated every tick whether or not the bob was used.  Deltas
//! telescope — `(f(t2)-f(t1)) + (f(t3)-f(t2)) = f(t3)-f(t1)` — so the
//! accumulated drift is path-independent across any tick partitioning.

/// Offset of a bob channel at time `t`.
#[inline]
pub fn bob(height: f32, freq: f32, seed: f32, t: f32) -> f32 {
    height * (freq * (t + seed)).sin()
}

/// Position delta contributed by a bob channel between two frames.
#[inline]
pub fn bob_delta(height: f32, freq: f32, seed: f32, t_prev: f32, t_now: f32) -> f32 {
    bob(height, freq, seed, t_now) - bob(height, freq, seed, t_prev)
}
