//! `eb-proc` — procedural motion helpers for behavior content.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`select`]  | `closest` — stable nearest-entity selection               |
//! | [`bob`]     | seeded sinusoid offsets and their per-frame deltas        |
//! | [`ease`]    | `settle_blend`, `smoothstep`, `transit_factor`            |
//! | [`scatter`] | uniform random directions and vectors                     |
//!
//! Everything here is a pure function over positions, timestamps, and an
//! injected RNG — no ambient clock, no ambient randomness, no shared state.
//! That keeps behavior content deterministic under a fake clock in tests.

pub mod bob;
pub mod ease;
pub mod scatter;
pub mod select;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use bob::{bob, bob_delta};
pub use ease::{settle_blend, smoothstep, transit_factor};
pub use scatter::{random_direction, random_vector};
pub use select::closest;
