//! Per-entity activation state and layer field scopes.
//!
//! A `BehaviorState` records, against one `BehaviorDef`, which layers are
//! currently active and the live field values of each active layer.  Field
//! scopes are `Option`al: a scope exists exactly while its layer is active,
//! so "reading a field of an inactive layer" is not a representable state —
//! it surfaces as [`EngineError::InactiveField`] at the access site instead
//! of silently yielding stale values.
//!
//! Base entity fields live in the external field store (see
//! [`Host`][crate::Host]), never here.  Layers that need to remember
//! another entity keep its `EntityId` and resolve it through the host each
//! use — holding anything else would dangle across that entity's death.

use rustc_hash::FxHashMap;

use eb_core::{GroupId, LayerId};

use crate::def::BehaviorDef;
use crate::error::{EngineError, EngineResult};
use crate::value::Value;

pub(crate) type Scope = FxHashMap<&'static str, Value>;

/// Mutable behavior state for one live entity.
///
/// Created by [`BehaviorDef::create_state`], mutated only through dispatch
/// and the enable/disable protocol, and dropped when the entity is reaped.
/// Dropping releases every remaining field scope; no teardown hooks run at
/// that point — callers needing them must disable layers before the kill.
pub struct BehaviorState {
    /// Current member per group; `None` = no member active.
    current: Vec<Option<LayerId>>,
    /// Active flag per layer (group members and overlays alike).
    active: Vec<bool>,
    /// Field scope per layer; `Some` exactly while the layer is active.
    scopes: Vec<Option<Scope>>,
}

impl BehaviorState {
    /// Fresh state with nothing active.  Use [`BehaviorDef::create_state`]
    /// to also run `Init` and activate group defaults.
    pub fn new(def: &BehaviorDef) -> Self {
        Self {
            current: vec![None; def.group_count()],
            active: vec![false; def.layer_count()],
            scopes: (0..def.layer_count()).map(|_| None).collect(),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub(crate) fn is_active(&self, layer: LayerId) -> bool {
        self.active[layer.index()]
    }

    #[inline]
    pub(crate) fn current_member(&self, group: GroupId) -> Option<LayerId> {
        self.current[group.index()]
    }

    /// Is `member` the active member of `group`?  Pure query, no side
    /// effects; unknown names are errors, not `false`.
    pub fn is_current(&self, def: &BehaviorDef, group: &str, member: &str) -> EngineResult<bool> {
        let gid = def.group_id(group)?;
        let mid = def.member_id(gid, member)?;
        Ok(self.current_member(gid) == Some(mid))
    }

    /// Is the named overlay active?
    pub fn overlay_on(&self, def: &BehaviorDef, name: &str) -> EngineResult<bool> {
        let lid = def.overlay_id(name)?;
        Ok(self.is_active(lid))
    }

    /// Peek at a layer field from outside a dispatch (tests, debugging).
    pub fn peek(&self, def: &BehaviorDef, layer: &str, key: &'static str) -> EngineResult<Value> {
        let lid = def.layer_id(layer)?;
        let name = def.layer(lid).name;
        let scope = self.scopes[lid.index()]
            .as_ref()
            .ok_or(EngineError::InactiveField { layer: name, key })?;
        scope.get(key).copied().ok_or(EngineError::UnknownField { layer: name, key })
    }

    // ── Mutation (engine-internal) ────────────────────────────────────────

    pub(crate) fn set_current(&mut self, group: GroupId, member: Option<LayerId>) {
        self.current[group.index()] = member;
    }

    pub(crate) fn set_active(&mut self, layer: LayerId, on: bool) {
        self.active[layer.index()] = on;
    }

    pub(crate) fn alloc_scope(&mut self, layer: LayerId) {
        self.scopes[layer.index()] = Some(Scope::default());
    }

    pub(crate) fn drop_scope(&mut self, layer: LayerId) {
        self.scopes[layer.index()] = None;
    }

    pub(crate) fn scope(&self, layer: LayerId) -> Option<&Scope> {
        self.scopes[layer.index()].as_ref()
    }

    pub(crate) fn scope_mut(&mut self, layer: LayerId) -> Option<&mut Scope> {
        self.scopes[layer.index()].as_mut()
    }
}
