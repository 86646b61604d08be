//! Simulation observer trait for progress reporting and error collection.

use eb_core::EntityId;
use eb_engine::EngineError;

/// Callbacks invoked by [`Sim::step`][crate::Sim::step] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, tick: u64, updated: usize) {
///         if tick % self.interval == 0 {
///             println!("tick {tick}: updated {updated} entities");
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: u64) {}

    /// Called at the end of each tick.
    ///
    /// `updated` is the number of live entities that received an `Update`
    /// dispatch this tick.
    fn on_tick_end(&mut self, _tick: u64, _updated: usize) {}

    /// Called when a content-level error (e.g. an unknown message) was
    /// reported against one entity.  The tick continues; this is the place
    /// to count or surface such errors.
    fn on_entity_error(&mut self, _entity: EntityId, _error: &EngineError) {}

    /// Called once after the final tick of a [`Sim::run_ticks`][crate::Sim::run_ticks].
    fn on_sim_end(&mut self, _final_tick: u64) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `step`
/// but don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
