//! The `Sim` struct and its phased tick loop.

use rustc_hash::FxHashMap;

use eb_core::{EntityId, SimConfig};
use eb_engine::{BehaviorState, EngineError, Hook, Host, Outcome, Value};

use crate::observer::SimObserver;
use crate::world::{Archetype, World};
use crate::{SimError, SimResult};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation driver.
///
/// `Sim` owns the [`World`] and every entity's `BehaviorState`, kept apart
/// so a dispatch can check one entity's state out while handlers mutate the
/// world freely.  The tick loop phases are:
///
/// 1. **Static updates** — each archetype's `static_update` hook, in
///    registration order.
/// 2. **Intake** — entities spawned since the last tick get their behavior
///    state (base `Init` dispatch + group defaults).
/// 3. **Messages** — queued posts deliver in send order.  An
///    `UnknownMessage` is reported against its entity and the tick goes on.
/// 4. **Collisions** — host-reported pairs deliver to their first entity.
/// 5. **Updates** — every live entity, in spawn order.
/// 6. **Reap** — killed entities get a best-effort `Death` dispatch, then
///    their state, fields, and tags drop.
/// 7. **Clock** — advance by one tick.
pub struct Sim {
    pub world: World,
    pub config: SimConfig,
    states: FxHashMap<EntityId, BehaviorState>,
}

impl Sim {
    pub fn new(config: SimConfig) -> Self {
        let world = World::new(config.make_clock(), config.seed);
        Self { world, config, states: FxHashMap::default() }
    }

    /// Register an archetype with the world.
    pub fn register(&mut self, archetype: Archetype) {
        self.world.register(archetype);
    }

    // ── Spawning & external stimuli ───────────────────────────────────────

    /// Spawn an entity and initialize its behavior immediately.
    ///
    /// This is the out-of-dispatch entry point; handlers spawning from
    /// inside a dispatch go through the host and are initialized at the
    /// next intake phase instead.
    pub fn spawn(&mut self, archetype: &str) -> SimResult<EntityId> {
        let entity = self.world.spawn(archetype)?;
        self.intake()?;
        Ok(entity)
    }

    /// Queue a message for delivery at the next message phase.
    pub fn send(&mut self, to: EntityId, message: &'static str, args: Vec<Value>) {
        self.world.post(to, message, args);
    }

    /// Report a collision pair for the next collision phase.
    pub fn report_collision(&mut self, a: EntityId, b: EntityId) {
        self.world.report_collision(a, b);
    }

    /// Kill an entity; it is reaped at the end of the current/next tick.
    pub fn kill(&mut self, entity: EntityId) {
        self.world.kill(entity);
    }

    // ── State queries (tests, debugging, content assertions) ──────────────

    pub fn state(&self, entity: EntityId) -> Option<&BehaviorState> {
        self.states.get(&entity)
    }

    pub fn is_current(&self, entity: EntityId, group: &str, member: &str) -> SimResult<bool> {
        let def = self
            .world
            .def_of(entity)
            .ok_or_else(|| SimError::Config(format!("no behavior for {entity}")))?;
        let state = self
            .states
            .get(&entity)
            .ok_or_else(|| SimError::Config(format!("no state for {entity}")))?;
        Ok(state.is_current(&def, group, member)?)
    }

    pub fn overlay_on(&self, entity: EntityId, name: &str) -> SimResult<bool> {
        let def = self
            .world
            .def_of(entity)
            .ok_or_else(|| SimError::Config(format!("no behavior for {entity}")))?;
        let state = self
            .states
            .get(&entity)
            .ok_or_else(|| SimError::Config(format!("no state for {entity}")))?;
        Ok(state.overlay_on(&def, name)?)
    }

    // ── Direct engine access from outside a dispatch ──────────────────────

    /// Dispatch a hook on one entity right now, outside the tick phases.
    pub fn dispatch(
        &mut self,
        entity: EntityId,
        hook: Hook,
        args: &[Value],
    ) -> SimResult<Outcome> {
        Ok(self.dispatch_one(entity, hook, args)?)
    }

    /// Enable an exclusive-group member on one entity from outside a
    /// dispatch.
    pub fn enable(
        &mut self,
        entity: EntityId,
        group: &str,
        member: &str,
        args: &[Value],
    ) -> SimResult<()> {
        let Some(def) = self.world.def_of(entity) else {
            return Err(SimError::Config(format!("no behavior for {entity}")));
        };
        let Some(mut state) = self.states.remove(&entity) else {
            return Err(SimError::Config(format!("no state for {entity}")));
        };
        let result = def.enable(&mut state, &mut self.world, entity, group, member, args);
        self.states.insert(entity, state);
        Ok(result?)
    }

    // ── The tick loop ─────────────────────────────────────────────────────

    /// Run `n` ticks, then fire `on_sim_end`.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        observer.on_sim_end(self.world.clock.tick);
        Ok(())
    }

    /// Run one tick through all phases.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let tick = self.world.clock.tick;
        observer.on_tick_start(tick);

        // ── Phase 1: archetype static updates ─────────────────────────────
        for i in 0..self.world.archetype_names().len() {
            let name = self.world.archetype_names()[i];
            if let Some(def) = self.world.def_of_archetype(name) {
                def.run_static_update(&mut self.world)?;
            }
        }

        // ── Phase 2: intake freshly spawned entities ──────────────────────
        self.intake()?;

        // ── Phase 3: deliver queued messages ──────────────────────────────
        //
        // Messages posted *during* this phase (replies) stay queued for the
        // next tick; only the snapshot drained here delivers now.
        for (to, message, args) in self.world.drain_outbox() {
            if !self.world.is_live(to) {
                tracing::trace!(entity = %to, message, "message to dead entity dropped");
                continue;
            }
            let mut dispatch_args = Vec::with_capacity(args.len() + 1);
            dispatch_args.push(Value::Sym(message));
            dispatch_args.extend(args);
            if let Err(e) = self.dispatch_one(to, Hook::Message, &dispatch_args) {
                self.report_entity_error(observer, to, e)?;
            }
        }

        // ── Phase 4: deliver queued collisions ────────────────────────────
        for (a, b) in self.world.drain_collisions() {
            if !self.world.is_live(a) || !self.world.is_live(b) {
                continue;
            }
            if let Err(e) = self.dispatch_one(a, Hook::Collision, &[Value::Ent(b)]) {
                self.report_entity_error(observer, a, e)?;
            }
        }

        // ── Phase 5: per-entity updates, stable spawn order ───────────────
        let live = self.world.live_in_order();
        let mut updated = 0usize;
        for entity in live {
            // May have been killed earlier in this very phase.
            if !self.world.is_live(entity) {
                continue;
            }
            match self.dispatch_one(entity, Hook::Update, &[]) {
                Ok(_) => updated += 1,
                Err(e) => self.report_entity_error(observer, entity, e)?,
            }
        }

        // ── Phase 6: reap the dead ────────────────────────────────────────
        for entity in self.world.drain_dead() {
            if let Some(mut state) = self.states.remove(&entity) {
                if let Some(def) = self.world.def_of(entity)
                    && let Err(e) =
                        def.dispatch(&mut state, &mut self.world, entity, Hook::Death, &[])
                {
                    tracing::warn!(entity = %entity, error = %e, "death dispatch failed");
                }
            }
            self.world.remove_entity(entity);
        }

        // ── Phase 7: advance the clock ────────────────────────────────────
        self.world.clock.advance();
        observer.on_tick_end(tick, updated);
        Ok(())
    }

    // ── Hot reload ────────────────────────────────────────────────────────

    /// Swap an archetype's definition at runtime.
    ///
    /// Live instances first receive a `Reload` dispatch under their old
    /// definition — the place to persist anything that matters into the
    /// field store — then their behavior state is rebuilt from scratch
    /// against the new definition (`Init` + group defaults).
    pub fn reload(&mut self, archetype: Archetype) -> SimResult<()> {
        let name = archetype.name();
        let live = self.world.instances_of(name);

        for &entity in &live {
            if let Err(e) = self.dispatch_one(entity, Hook::Reload, &[]) {
                tracing::warn!(entity = %entity, error = %e, "reload dispatch failed");
            }
        }

        self.world.register(archetype);
        let def = self
            .world
            .def_of_archetype(name)
            .ok_or_else(|| SimError::Config(format!("archetype '{name}' vanished on reload")))?;

        for &entity in &live {
            let state = def.create_state(&mut self.world, entity)?;
            self.states.insert(entity, state);
        }
        tracing::info!(archetype = name, instances = live.len(), "definition reloaded");
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Initialize behavior state for every entity spawned since the last
    /// intake.
    fn intake(&mut self) -> SimResult<()> {
        // Spawns can cascade (an Init handler may spawn more entities), so
        // keep draining until quiet.
        loop {
            let pending = self.world.drain_pending_init();
            if pending.is_empty() {
                return Ok(());
            }
            for entity in pending {
                let Some(def) = self.world.def_of(entity) else { continue };
                let state = def.create_state(&mut self.world, entity)?;
                self.states.insert(entity, state);
            }
        }
    }

    /// Check an entity's state out, dispatch, check it back in.
    fn dispatch_one(
        &mut self,
        entity: EntityId,
        hook: Hook,
        args: &[Value],
    ) -> Result<Outcome, EngineError> {
        let Some(def) = self.world.def_of(entity) else {
            return Ok(Outcome::UNHANDLED);
        };
        let Some(mut state) = self.states.remove(&entity) else {
            return Ok(Outcome::UNHANDLED);
        };
        let result = def.dispatch(&mut state, &mut self.world, entity, hook, args);
        self.states.insert(entity, state);
        result
    }

    /// Content-level errors are reported and the tick continues; anything
    /// else is a defect and propagates.
    fn report_entity_error<O: SimObserver>(
        &self,
        observer: &mut O,
        entity: EntityId,
        error: EngineError,
    ) -> SimResult<()> {
        match error {
            EngineError::UnknownMessage { .. } => {
                tracing::warn!(entity = %entity, error = %error, "entity error");
                observer.on_entity_error(entity, &error);
                Ok(())
            }
            defect => Err(SimError::Engine(defect)),
        }
    }
}
