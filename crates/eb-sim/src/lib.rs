//! `eb-sim` — the single-threaded driver for `rust_eb` behavior content.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`world`]    | `World` (field store, tag bank, spawner, queues) + `Archetype` |
//! | [`sim`]      | `Sim` — the phased tick loop and per-entity dispatch        |
//! | [`observer`] | `SimObserver` trait, `NoopObserver`                         |
//! | [`error`]    | `SimError`, `SimResult<T>`                                  |
//!
//! # Tick phases
//!
//! Each [`Sim::step`] runs, in order: archetype static updates → intake of
//! entities spawned since the last tick → queued message delivery → queued
//! collision delivery → per-entity updates in spawn order → reaping of
//! killed entities → clock advance.  Everything is single-threaded and
//! cooperative: one entity's dispatch (including nested self-transitions)
//! completes before the next entity is touched, so processing order *is*
//! the cross-entity ordering guarantee.

pub mod error;
pub mod observer;
pub mod sim;
pub mod world;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Sim;
pub use world::{Archetype, World};
