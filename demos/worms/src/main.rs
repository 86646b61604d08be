//! worms — smallest runnable scene for the rust_eb behavior framework.
//!
//! A handful of worms and a scatter of morsels share a plane with two
//! waygates on the same ley network.  The demo provides the host concerns
//! the core deliberately leaves outside: a naive O(N²) collision
//! broad-phase and a periodic "teleport a morsel" stimulus.  Run with
//! `RUST_LOG=debug` to watch spawns, kills, and layer transitions.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use eb_core::{EntityId, SimConfig, Vec2};
use eb_engine::{Host, Value};
use eb_fauna::{morsel_archetype, waygate_archetype, worm_archetype};
use eb_sim::{Sim, SimObserver};

// ── Constants ─────────────────────────────────────────────────────────────────

const WORMS:         usize = 4;
const MORSELS:       usize = 12;
const TICKS:         u64   = 1_800; // one minute at 30 Hz
const TICK_DT:       f64   = 1.0 / 30.0;
const SEED:          u64   = 2024;
const EAT_RADIUS:    f32   = 2.5;
const TELEPORT_EVERY: u64  = 450;

// ── Progress observer ─────────────────────────────────────────────────────────

struct Progress {
    interval: u64,
}

impl SimObserver for Progress {
    fn on_tick_end(&mut self, tick: u64, updated: usize) {
        if tick % self.interval == 0 {
            tracing::info!(tick, updated, "tick");
        }
    }

    fn on_entity_error(&mut self, entity: EntityId, error: &eb_engine::EngineError) {
        tracing::warn!(%entity, %error, "entity error");
    }

    fn on_sim_end(&mut self, final_tick: u64) {
        tracing::info!(final_tick, "simulation finished");
    }
}

// ── Host-side collision broad-phase ───────────────────────────────────────────

/// Worms eat what they touch; the core only reacts to reported pairs.
fn report_overlaps(sim: &mut Sim) -> Result<()> {
    let worms = sim.world.instances_of("worm");
    let morsels = sim.world.instances_of("morsel");
    let mut pairs = Vec::new();
    for &w in &worms {
        let wp = sim.world.field(w, "pos")?.as_vec2()?;
        for &m in &morsels {
            let mp = sim.world.field(m, "pos")?.as_vec2()?;
            if (wp - mp).magn2() <= EAT_RADIUS * EAT_RADIUS {
                pairs.push((w, m));
            }
        }
    }
    for (w, m) in pairs {
        sim.report_collision(w, m);
    }
    Ok(())
}

// ── Scene setup ───────────────────────────────────────────────────────────────

fn build_scene(sim: &mut Sim) -> Result<()> {
    sim.register(worm_archetype());
    sim.register(morsel_archetype());
    sim.register(waygate_archetype("ley"));

    // Worms start in a ring and scatter outward.
    for i in 0..WORMS {
        let angle = std::f32::consts::TAU * i as f32 / WORMS as f32;
        let worm = sim.spawn("worm")?;
        sim.world
            .set_field(worm, "pos", Value::Vec2(Vec2::new(angle.cos(), angle.sin()).scale(10.0)))?;
        sim.send(worm, "flee", vec![]);
    }

    // Morsels in a wider ring.
    for i in 0..MORSELS {
        let angle = std::f32::consts::TAU * i as f32 / MORSELS as f32;
        let morsel = sim.spawn("morsel")?;
        sim.world
            .set_field(morsel, "pos", Value::Vec2(Vec2::new(angle.cos(), angle.sin()).scale(45.0)))?;
    }

    // Two gates on the same ley line.
    let west = sim.spawn("waygate")?;
    sim.world.set_field(west, "pos", Value::Vec2(Vec2::new(-60.0, 0.0)))?;
    let east = sim.spawn("waygate")?;
    sim.world.set_field(east, "pos", Value::Vec2(Vec2::new(60.0, 0.0)))?;

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut sim = Sim::new(SimConfig { tick_dt: TICK_DT, seed: SEED });
    build_scene(&mut sim)?;

    let gates = sim.world.instances_of("waygate");
    let mut observer = Progress { interval: 150 };

    for tick in 0..TICKS {
        report_overlaps(&mut sim)?;

        // Every so often, a gate ferries the nearest morsel across.
        if tick % TELEPORT_EVERY == 0 && tick > 0 {
            let gate = gates[(tick / TELEPORT_EVERY) as usize % gates.len()];
            if let Some(&morsel) = sim.world.instances_of("morsel").first() {
                sim.send(gate, "teleport", vec![Value::Ent(morsel)]);
            }
        }

        sim.step(&mut observer)?;
    }
    observer.on_sim_end(sim.world.clock.tick);

    tracing::info!(
        worms = sim.world.instances_of("worm").len(),
        morsels = sim.world.instances_of("morsel").len(),
        "final population"
    );
    Ok(())
}
