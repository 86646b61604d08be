//! `eb-fauna` — sample creature content for the `rust_eb` engine.
//!
//! Two small ecosystems, written exactly as host-game code would be:
//!
//! - [`worm`] — a Flee→Hunt exclusive group with a nested Hungry overlay.
//!   Worms scatter on spawn (when told to), hunt the closest morsel, and —
//!   once fed — starve into a brood of replacements if they can't find
//!   another meal in time.
//! - [`waygate`] — a stationary teleporter network.  A gate's Teleporting
//!   overlay eases a carried payload across to a random sibling gate and
//!   hands it off with a message.
//!
//! Nothing here reaches into the engine's internals; every behavior is
//! expressed through `BehaviorDef` builders, layer fields, and the host
//! trait — which is the point: these archetypes double as the engine's
//! acceptance suite.

pub mod waygate;
pub mod worm;


pub use waygate::waygate_archetype;
pub use worm::{FLEE_FOR, STARVE_AFTER, morsel_archetype, worm_archetype};
