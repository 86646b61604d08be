//! The in-memory world: field store, tag bank, spawner, and event queues.
//!
//! `World` is everything the engine's [`Host`] trait needs, and nothing
//! else — per-entity behavior states live in [`Sim`][crate::Sim] so that a
//! dispatch can mutably borrow the world while its own state is checked
//! out.  Cross-entity effects requested mid-dispatch (spawns, messages,
//! kills, collisions) land in queues here and are consumed by the driver at
//! its phase boundaries.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use eb_core::{EntityId, SimClock, SimRng};
use eb_engine::{BehaviorDef, EngineError, EngineResult, Host, Value};

// ── Archetype ─────────────────────────────────────────────────────────────────

/// A registered entity archetype: its behavior definition plus the
/// prototype base fields and tags every spawned instance starts with.
pub struct Archetype {
    pub def: Arc<BehaviorDef>,
    fields: Vec<(&'static str, Value)>,
    tags: Vec<(&'static str, Option<&'static str>)>,
}

impl Archetype {
    pub fn new(def: BehaviorDef) -> Self {
        Self { def: Arc::new(def), fields: Vec::new(), tags: Vec::new() }
    }

    /// Add a prototype base field.
    pub fn field(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    /// Add a tag, optionally with a value (`tag("network", Some("ley"))`).
    pub fn tag(mut self, tag: &'static str, value: Option<&'static str>) -> Self {
        self.tags.push((tag, value));
        self
    }

    pub fn name(&self) -> &'static str {
        self.def.name()
    }
}

// ── Tag bank ──────────────────────────────────────────────────────────────────

/// Bidirectional tag index: tag → tagged entities, entity → its tags.
#[derive(Default)]
struct TagBank {
    by_tag: FxHashMap<&'static str, Vec<(EntityId, Option<&'static str>)>>,
    by_ent: FxHashMap<EntityId, Vec<(&'static str, Option<&'static str>)>>,
}

impl TagBank {
    fn deposit(&mut self, entity: EntityId, tags: &[(&'static str, Option<&'static str>)]) {
        for &(tag, value) in tags {
            self.by_tag.entry(tag).or_default().push((entity, value));
            self.by_ent.entry(entity).or_default().push((tag, value));
        }
    }

    fn remove_entity(&mut self, entity: EntityId) {
        let Some(tags) = self.by_ent.remove(&entity) else { return };
        for (tag, _) in tags {
            if let Some(vault) = self.by_tag.get_mut(tag) {
                vault.retain(|&(e, _)| e != entity);
            }
        }
    }

    fn tagged<'a>(&'a self, tag: &str, value: &'a str) -> impl Iterator<Item = EntityId> + 'a {
        self.by_tag
            .get(tag)
            .into_iter()
            .flatten()
            .filter(move |&&(_, v)| v == Some(value))
            .map(|&(e, _)| e)
    }

    fn tag_value(&self, entity: EntityId, tag: &str) -> Option<&'static str> {
        self.by_ent
            .get(&entity)?
            .iter()
            .find(|&&(t, _)| t == tag)
            .and_then(|&(_, v)| v)
    }
}

// ── Entity records ────────────────────────────────────────────────────────────

struct EntityRecord {
    archetype: &'static str,
    fields: FxHashMap<&'static str, Value>,
}

// ── World ─────────────────────────────────────────────────────────────────────

/// All world state the engine consumes through [`Host`].
pub struct World {
    pub clock: SimClock,
    rng: SimRng,
    registry: FxHashMap<&'static str, Archetype>,
    /// Registration order, for stable static-update iteration.
    registry_order: Vec<&'static str>,
    records: FxHashMap<EntityId, EntityRecord>,
    /// Spawn order; drives the stable update iteration.
    order: Vec<EntityId>,
    tags: TagBank,
    next_id: u32,

    // ── Deferred effects, drained by the driver at phase boundaries ───────
    pending_init: Vec<EntityId>,
    outbox: Vec<(EntityId, &'static str, Vec<Value>)>,
    collisions: Vec<(EntityId, EntityId)>,
    dead: FxHashSet<EntityId>,
}

impl World {
    pub fn new(clock: SimClock, seed: u64) -> Self {
        Self {
            clock,
            rng: SimRng::new(seed),
            registry: FxHashMap::default(),
            registry_order: Vec::new(),
            records: FxHashMap::default(),
            order: Vec::new(),
            tags: TagBank::default(),
            next_id: 0,
            pending_init: Vec::new(),
            outbox: Vec::new(),
            collisions: Vec::new(),
            dead: FxHashSet::default(),
        }
    }

    // ── Registry ──────────────────────────────────────────────────────────

    /// Register an archetype.  Re-registering a name replaces its entry
    /// (this is how hot reload swaps definitions).
    pub fn register(&mut self, archetype: Archetype) {
        let name = archetype.name();
        if self.registry.insert(name, archetype).is_none() {
            self.registry_order.push(name);
        }
    }

    pub fn archetype_names(&self) -> &[&'static str] {
        &self.registry_order
    }

    /// The behavior definition governing `entity`, if it is still known.
    pub fn def_of(&self, entity: EntityId) -> Option<Arc<BehaviorDef>> {
        let record = self.records.get(&entity)?;
        self.registry.get(record.archetype).map(|a| Arc::clone(&a.def))
    }

    pub fn def_of_archetype(&self, name: &str) -> Option<Arc<BehaviorDef>> {
        self.registry.get(name).map(|a| Arc::clone(&a.def))
    }

    // ── Entity bookkeeping ────────────────────────────────────────────────

    /// `true` while the entity exists and has not been killed.
    pub fn is_live(&self, entity: EntityId) -> bool {
        self.records.contains_key(&entity) && !self.dead.contains(&entity)
    }

    /// Live entities in spawn order.  Collected, because the caller will
    /// mutate the world while iterating.
    pub fn live_in_order(&self) -> Vec<EntityId> {
        self.order.iter().copied().filter(|&e| self.is_live(e)).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.records.len() - self.dead.len()
    }

    /// Report a collision pair for delivery at the next collision phase.
    /// Dispatched to `a`; report both directions for symmetric reactions.
    pub fn report_collision(&mut self, a: EntityId, b: EntityId) {
        self.collisions.push((a, b));
    }

    // ── Queue draining (driver-only) ──────────────────────────────────────

    pub(crate) fn drain_pending_init(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.pending_init)
    }

    pub(crate) fn drain_outbox(&mut self) -> Vec<(EntityId, &'static str, Vec<Value>)> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn drain_collisions(&mut self) -> Vec<(EntityId, EntityId)> {
        std::mem::take(&mut self.collisions)
    }

    pub(crate) fn drain_dead(&mut self) -> Vec<EntityId> {
        // Reap in spawn order so teardown order is stable.
        let dead = std::mem::take(&mut self.dead);
        self.order.iter().copied().filter(|e| dead.contains(e)).collect()
    }

    /// Drop an entity's record and tags.  The id is never reused.
    pub(crate) fn remove_entity(&mut self, entity: EntityId) {
        self.records.remove(&entity);
        self.tags.remove_entity(entity);
        self.order.retain(|&e| e != entity);
    }
}

// ── Host implementation ───────────────────────────────────────────────────────

impl Host for World {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn rng(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    fn rand_range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo { self.rng.gen_range(lo..hi) } else { lo }
    }

    fn pick(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.gen_range(0..len))
    }

    fn field(&self, entity: EntityId, key: &'static str) -> EngineResult<Value> {
        self.records
            .get(&entity)
            .and_then(|r| r.fields.get(key))
            .copied()
            .ok_or(EngineError::MissingField { entity, key })
    }

    fn set_field(&mut self, entity: EntityId, key: &'static str, value: Value) -> EngineResult<()> {
        match self.records.get_mut(&entity) {
            Some(record) => {
                record.fields.insert(key, value);
                Ok(())
            }
            None => Err(EngineError::MissingField { entity, key }),
        }
    }

    fn spawn(&mut self, archetype: &str) -> EngineResult<EntityId> {
        let Some(proto) = self.registry.get(archetype) else {
            return Err(EngineError::UnknownArchetype(archetype.to_string()));
        };

        let entity = EntityId(self.next_id);
        self.next_id += 1;

        let mut record = EntityRecord {
            archetype: proto.name(),
            fields: proto.fields.iter().copied().collect(),
        };
        // Every entity carries its archetype as a readable base field.
        record.fields.insert("archetype", Value::Sym(proto.name()));
        let tags = proto.tags.clone();

        self.records.insert(entity, record);
        self.tags.deposit(entity, &tags);
        self.order.push(entity);
        // Behavior state initializes at the driver's next intake point, not
        // mid-dispatch.
        self.pending_init.push(entity);

        tracing::debug!(entity = %entity, archetype, "spawned");
        Ok(entity)
    }

    fn kill(&mut self, entity: EntityId) {
        if self.records.contains_key(&entity) && self.dead.insert(entity) {
            tracing::debug!(entity = %entity, "killed");
        }
    }

    fn instances_of(&self, archetype: &str) -> Vec<EntityId> {
        self.order
            .iter()
            .copied()
            .filter(|&e| {
                self.is_live(e)
                    && self.records.get(&e).is_some_and(|r| r.archetype == archetype)
            })
            .collect()
    }

    fn tagged(&self, tag: &str, value: &str) -> Vec<EntityId> {
        let mut found: Vec<EntityId> =
            self.tags.tagged(tag, value).filter(|&e| self.is_live(e)).collect();
        // Tag-bank order is deposit order already, but make it explicit.
        found.sort_unstable();
        found
    }

    fn tag_value(&self, entity: EntityId, tag: &str) -> Option<&'static str> {
        self.tags.tag_value(entity, tag)
    }

    fn post(&mut self, to: EntityId, message: &'static str, args: Vec<Value>) {
        self.outbox.push((to, message, args));
    }
}
