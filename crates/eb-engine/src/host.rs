//! The `Host` trait — the world services the engine consumes.
//!
//! The engine stays agnostic to how entities are stored, spawned, queried,
//! or timed; everything it needs from the surrounding simulation arrives
//! through this object-safe trait.  `eb-sim` provides the production
//! implementation; tests supply small fakes with scripted clocks and RNGs.
//!
//! # Contract notes
//!
//! - The clock is monotonic simulated seconds, advanced once per tick by
//!   the host — never inside a dispatch.
//! - `post` queues; delivery happens at the host's well-defined points
//!   (once per tick, before updates).  The engine's own message *dispatch*
//!   is synchronous once the host hands the event over.
//! - `kill` marks; the identity stays resolvable until the host reaps, so
//!   handlers running later in the same tick see consistent state.
//! - Field access has last-write-wins semantics within a tick; no
//!   transactional guarantees are offered or needed single-threaded.

use eb_core::{EntityId, SimRng};

use crate::error::EngineResult;
use crate::value::Value;

/// World services available to behavior handlers during a dispatch.
pub trait Host {
    // ── Clock & randomness ────────────────────────────────────────────────

    /// Current simulated time in seconds.
    fn now(&self) -> f64;

    /// The world's deterministic RNG, for use with `eb-proc` helpers and
    /// `rand` distributions.
    fn rng(&mut self) -> &mut SimRng;

    /// Uniform real in `[lo, hi)`.
    fn rand_range(&mut self, lo: f64, hi: f64) -> f64;

    /// Uniform index into a collection of length `len`; `None` when empty.
    fn pick(&mut self, len: usize) -> Option<usize>;

    // ── Field store ───────────────────────────────────────────────────────

    /// Read a base field of `entity`.
    fn field(&self, entity: EntityId, key: &'static str) -> EngineResult<Value>;

    /// Write a base field of `entity`.  Creates the field if absent.
    fn set_field(&mut self, entity: EntityId, key: &'static str, value: Value)
    -> EngineResult<()>;

    // ── Spawner / killer ──────────────────────────────────────────────────

    /// Create a new entity of the named archetype.
    ///
    /// The identity is immediately valid as a field-store key and message
    /// target; its behavior state initializes at the host's next intake
    /// point, not mid-dispatch.
    fn spawn(&mut self, archetype: &str) -> EngineResult<EntityId>;

    /// Mark `entity` for destruction at the host's next reap point.
    fn kill(&mut self, entity: EntityId);

    // ── Queries ───────────────────────────────────────────────────────────

    /// All live entities of the named archetype, in stable spawn order.
    fn instances_of(&self, archetype: &str) -> Vec<EntityId>;

    /// All live entities carrying `tag` with exactly `value`.
    fn tagged(&self, tag: &str, value: &str) -> Vec<EntityId>;

    /// The value of `tag` on `entity`, if the entity carries it with one.
    fn tag_value(&self, entity: EntityId, tag: &str) -> Option<&'static str>;

    // ── Messaging ─────────────────────────────────────────────────────────

    /// Queue a message for `to`; delivered at the host's next message phase.
    fn post(&mut self, to: EntityId, message: &'static str, args: Vec<Value>);
}
