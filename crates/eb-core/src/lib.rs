//! `eb-core` — foundational types for the `rust_eb` entity behavior framework.
//!
//! This crate is a dependency of every other `eb-*` crate.  It intentionally
//! has no `eb-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                          |
//! |-----------|---------------------------------------------------|
//! | [`ids`]   | `EntityId`, `LayerId`, `GroupId`                  |
//! | [`time`]  | `SimClock`, `SimConfig`                           |
//! | [`rng`]   | `SimRng`, per-entity seed derivation              |
//! | [`vec`]   | `Vec2` and its interpolation helpers              |
//! | [`error`] | `CoreError`, `CoreResult`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;
pub mod vec;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{EntityId, GroupId, LayerId};
pub use rng::{SimRng, entity_seed};
pub use time::{SimClock, SimConfig};
pub use vec::Vec2;
