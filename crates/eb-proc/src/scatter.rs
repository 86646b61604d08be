//! Uniform random directions and vectors.

use eb_core::{SimRng, Vec2};

/// A unit vector in a uniformly random direction.
///
/// Built by normalizing a vector with both components uniform in [-1, 1].
/// This slightly favors the diagonals versus a polar draw — the same bias
/// the behaviors were tuned against, so it is kept rather than corrected.
pub fn random_direction(rng: &mut SimRng) -> Vec2 {
    Vec2::new(rng.gen_range(-1.0f32..=1.0), rng.gen_range(-1.0f32..=1.0)).norm()
}

/// A random direction scaled by a magnitude uniform in [`min`, `max`].
///
/// `max <= min` collapses to a fixed magnitude of `min` (the "just give me
/// a random direction this long" case).
pub fn random_vector(rng: &mut SimRng, min: f32, max: f32) -> Vec2 {
    let magn = if max > min { rng.gen_range(min..=max) } else { min };
    random_direction(rng).scale(magn)
}
