//! `eb-engine` — the layered state/override engine at the heart of `rust_eb`.
//!
//! Each entity archetype carries a [`BehaviorDef`]: a base set of lifecycle
//! handlers plus a forest of named state layers — exclusive-group members
//! and standalone overlays — that can intercept, augment, or fully replace
//! those handlers while they are active.  Per-entity activation state lives
//! in a [`BehaviorState`]; the [`dispatch`][BehaviorDef::dispatch] machinery
//! resolves "who handles this event" across the active stack and hands each
//! wrap an explicit continuation into the next layer outward.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`value`]    | `Value` — the dynamic value type handlers trade in         |
//! | [`host`]     | `Host` — the world services the engine consumes            |
//! | [`def`]      | `BehaviorDef`, `Hook`, layer/group declarations, builder   |
//! | [`state`]    | `BehaviorState` — per-entity activation + field scopes     |
//! | [`dispatch`] | `Ctx`, chain resolution, enable/disable, self-transition   |
//! | [`error`]    | `EngineError`, `EngineResult<T>`                           |
//!
//! # Execution model
//!
//! Single-threaded and cooperative: one entity's full dispatch — including
//! any nested self-transition — completes before the driver touches the
//! next entity.  Handlers never block; durations are expressed as state
//! compared against the host clock each tick.  Cross-entity effects go
//! through the [`Host`] trait, which queues messages for delivery at the
//! driver's well-defined points.

pub mod def;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod state;
pub mod value;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use def::{BehaviorDef, BehaviorDefBuilder, GroupBuilder, Hook, LayerBuilder};
pub use dispatch::{Ctx, MAX_DISPATCH_DEPTH, Outcome};
pub use error::{EngineError, EngineResult};
pub use host::Host;
pub use state::BehaviorState;
pub use value::Value;
