//! Dispatch: chain resolution, continuations, and the activation protocol.
//!
//! # Chain resolution
//!
//! For a given hook, the active layers form a stack: later-declared layers
//! sit above earlier-declared ones, and a layer's active children sit above
//! the layer itself.  The resolved chain is the top-down list of links that
//! actually declare the hook, ending at the base handler if the definition
//! has one.  Dispatch enters at the first link; each wrap may invoke
//! [`Ctx::call_base`] at most once to continue into the next link outward.
//! The stacking order is purely structural (declaration order), so it is
//! reproducible regardless of when each layer was enabled.
//!
//! # Self-transition
//!
//! A wrap may enable a different group member (or overlay) and then call
//! [`Ctx::redispatch`] to hand the remainder of the current event to the
//! newly active stack instead of falling through to its own base.  Nesting
//! is bounded by [`MAX_DISPATCH_DEPTH`]; a transition cycle fails the whole
//! dispatch with [`EngineError::HandlerLoop`] rather than recursing forever.
//!
//! # Activation
//!
//! `enable` follows the four-step protocol: deactivate the previous member
//! (descendants first, declared `on_exit` hooks only, field storage
//! released), allocate the new member's scope and run its field
//! initializers in declaration order, run its `on_enter` hook, then mark it
//! active and auto-activate the defaults of its child groups.  Re-enabling
//! the already-active member is a no-op.

use std::sync::Arc;

use eb_core::{EntityId, LayerId};

use crate::def::{BehaviorDef, Hook, HookFn};
use crate::error::{EngineError, EngineResult};
use crate::host::Host;
use crate::state::BehaviorState;
use crate::value::Value;

/// Nested redispatches allowed within one dispatch before the engine calls
/// it a transition loop.
pub const MAX_DISPATCH_DEPTH: u32 = 8;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// What a dispatch produced.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Outcome {
    /// The entry-point handler's return value; `Nil` if unhandled.
    pub value: Value,
    /// Whether any layer or base handler declared the hook.
    pub handled: bool,
}

impl Outcome {
    pub const UNHANDLED: Outcome = Outcome { value: Value::Nil, handled: false };

    fn handled(value: Value) -> Outcome {
        Outcome { value, handled: true }
    }
}

// ── Chain links ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
enum ChainLink {
    Wrap(LayerId),
    Base,
}

fn resolve_chain(def: &BehaviorDef, state: &BehaviorState, hook: Hook) -> Vec<ChainLink> {
    fn push_active(
        def: &BehaviorDef,
        state: &BehaviorState,
        layer: LayerId,
        hook: Hook,
        chain: &mut Vec<ChainLink>,
    ) {
        if !state.is_active(layer) {
            return;
        }
        for &child in def.layer(layer).children.iter().rev() {
            push_active(def, state, child, hook, chain);
        }
        if def.layer(layer).wraps.declares(hook) {
            chain.push(ChainLink::Wrap(layer));
        }
    }

    let mut chain = Vec::new();
    for &root in def.roots.iter().rev() {
        push_active(def, state, root, hook, &mut chain);
    }
    if def.base.declares(hook) {
        chain.push(ChainLink::Base);
    }
    chain
}

// ── Ctx ───────────────────────────────────────────────────────────────────────

/// The dispatch context handed to every handler, wrap, field initializer,
/// and lifecycle hook.
///
/// `Ctx` carries the explicit continuation (the handler's position in the
/// resolved chain), the identity of the layer whose code is running, and
/// mutable access to both the entity's behavior state and the host.  All
/// engine capabilities a handler may use — continuation, self-transition,
/// enable/disable, field access — are methods here; nothing is ambient.
pub struct Ctx<'a> {
    /// The entity being dispatched.
    pub entity: EntityId,
    /// World services; also reachable through the convenience methods below.
    pub host: &'a mut dyn Host,
    def: &'a BehaviorDef,
    state: &'a mut BehaviorState,
    hook: Hook,
    chain: Vec<ChainLink>,
    pos: usize,
    /// Layer whose code is currently executing; `None` in base handlers.
    layer: Option<LayerId>,
    depth: u32,
}

impl<'a> Ctx<'a> {
    fn new(
        def: &'a BehaviorDef,
        state: &'a mut BehaviorState,
        host: &'a mut dyn Host,
        entity: EntityId,
        hook: Hook,
    ) -> Self {
        Self { entity, host, def, state, hook, chain: Vec::new(), pos: 0, layer: None, depth: 0 }
    }

    // ── Chain walking ─────────────────────────────────────────────────────

    fn run(&mut self, args: &[Value]) -> EngineResult<Outcome> {
        self.chain = resolve_chain(self.def, self.state, self.hook);
        self.invoke_from(0, args)
    }

    fn invoke_from(&mut self, idx: usize, args: &[Value]) -> EngineResult<Outcome> {
        let Some(&link) = self.chain.get(idx) else {
            return Ok(Outcome::UNHANDLED);
        };

        let def = self.def;
        let handler: Arc<HookFn> = match link {
            ChainLink::Wrap(layer) => match def.layer(layer).wraps.get(self.hook) {
                Some(f) => Arc::clone(f),
                None => unreachable!("chain link for undeclared wrap"),
            },
            ChainLink::Base => match def.base.get(self.hook) {
                Some(f) => Arc::clone(f),
                None => unreachable!("chain link for undeclared base handler"),
            },
        };

        let saved_pos = self.pos;
        let saved_layer = self.layer;
        self.pos = idx;
        self.layer = match link {
            ChainLink::Wrap(layer) => Some(layer),
            ChainLink::Base => None,
        };

        let result = handler(&mut *self, args).map(Outcome::handled);

        self.pos = saved_pos;
        self.layer = saved_layer;
        result
    }

    /// Continue into the next layer outward (eventually the base handler).
    ///
    /// May be called 0 or 1 times per wrap; the chain was resolved when the
    /// dispatch entered, so layers enabled mid-dispatch do not appear — use
    /// [`redispatch`][Self::redispatch] to re-resolve.  Returns `UNHANDLED`
    /// if nothing further declares the hook.
    pub fn call_base(&mut self, args: &[Value]) -> EngineResult<Outcome> {
        self.invoke_from(self.pos + 1, args)
    }

    /// Re-dispatch the current hook from the top of the *now-current* layer
    /// stack — the self-transition primitive.
    ///
    /// Call after enabling the state that should finish handling this
    /// event, then return without calling `call_base`.  Fails with
    /// [`EngineError::HandlerLoop`] once `MAX_DISPATCH_DEPTH` nested
    /// redispatches accumulate; a transition that re-triggers itself hits
    /// the bound immediately instead of overflowing the stack.
    pub fn redispatch(&mut self, args: &[Value]) -> EngineResult<Outcome> {
        if self.depth >= MAX_DISPATCH_DEPTH {
            return Err(EngineError::HandlerLoop {
                entity: self.entity,
                hook: self.hook,
                depth: self.depth,
            });
        }
        self.depth += 1;

        let fresh = resolve_chain(self.def, self.state, self.hook);
        let saved_chain = std::mem::replace(&mut self.chain, fresh);
        let result = self.invoke_from(0, args);
        self.chain = saved_chain;

        self.depth -= 1;
        result
    }

    // ── Layer fields ──────────────────────────────────────────────────────

    /// Read a field of the layer whose code is running.
    pub fn get(&self, key: &'static str) -> EngineResult<Value> {
        let layer = self.layer.ok_or(EngineError::NoLayerScope { key })?;
        let name = self.def.layer(layer).name;
        let scope = self
            .state
            .scope(layer)
            .ok_or(EngineError::InactiveField { layer: name, key })?;
        scope.get(key).copied().ok_or(EngineError::UnknownField { layer: name, key })
    }

    /// Write a field of the layer whose code is running.  The key must be
    /// part of the layer's declared schema.
    pub fn set(&mut self, key: &'static str, value: impl Into<Value>) -> EngineResult<()> {
        let layer = self.layer.ok_or(EngineError::NoLayerScope { key })?;
        let name = self.def.layer(layer).name;
        let scope = self
            .state
            .scope_mut(layer)
            .ok_or(EngineError::InactiveField { layer: name, key })?;
        match scope.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(EngineError::UnknownField { layer: name, key }),
        }
    }

    // ── Host conveniences ─────────────────────────────────────────────────

    /// Current simulated time in seconds.
    pub fn now(&self) -> f64 {
        self.host.now()
    }

    /// Read a base field of this entity from the field store.
    pub fn field(&self, key: &'static str) -> EngineResult<Value> {
        self.host.field(self.entity, key)
    }

    /// Write a base field of this entity.
    pub fn set_field(&mut self, key: &'static str, value: impl Into<Value>) -> EngineResult<()> {
        self.host.set_field(self.entity, key, value.into())
    }

    /// Queue a message to another entity.
    pub fn post(&mut self, to: EntityId, message: &'static str, args: Vec<Value>) {
        self.host.post(to, message, args);
    }

    // ── Exclusive groups ──────────────────────────────────────────────────

    /// Make `member` the active member of `group`.
    ///
    /// No-op if it already is.  Otherwise the previous member (if any)
    /// deactivates first — descendants, declared `on_exit`, field storage —
    /// then `member` activates with `args` bound to its `on_enter` hook.
    pub fn enable(&mut self, group: &str, member: &str, args: &[Value]) -> EngineResult<()> {
        let gid = self.def.group_id(group)?;
        let mid = self.def.member_id(gid, member)?;
        if self.state.current_member(gid) == Some(mid) {
            return Ok(());
        }
        self.require_lineage_active(mid)?;
        if let Some(prev) = self.state.current_member(gid) {
            self.deactivate(prev)?;
            self.state.set_current(gid, None);
        }
        self.activate(mid, args)?;
        self.state.set_current(gid, Some(mid));
        tracing::trace!(entity = %self.entity, group, member, "member enabled");
        Ok(())
    }

    /// Deactivate `group`'s current member, leaving the group empty.
    pub fn disable(&mut self, group: &str) -> EngineResult<()> {
        let gid = self.def.group_id(group)?;
        if let Some(member) = self.state.current_member(gid) {
            self.deactivate(member)?;
            self.state.set_current(gid, None);
            tracing::trace!(entity = %self.entity, group, "group disabled");
        }
        Ok(())
    }

    /// Is `member` the active member of `group`?
    pub fn is_current(&self, group: &str, member: &str) -> EngineResult<bool> {
        self.state.is_current(self.def, group, member)
    }

    // ── Overlays ──────────────────────────────────────────────────────────

    /// Activate a standalone overlay.  No-op if already active; stacks
    /// freely with whatever else is active.
    pub fn enable_overlay(&mut self, name: &str, args: &[Value]) -> EngineResult<()> {
        let lid = self.def.overlay_id(name)?;
        if self.state.is_active(lid) {
            return Ok(());
        }
        self.require_lineage_active(lid)?;
        self.activate(lid, args)?;
        tracing::trace!(entity = %self.entity, overlay = name, "overlay enabled");
        Ok(())
    }

    /// Deactivate a standalone overlay.  No-op if not active.
    pub fn disable_overlay(&mut self, name: &str) -> EngineResult<()> {
        let lid = self.def.overlay_id(name)?;
        if self.state.is_active(lid) {
            self.deactivate(lid)?;
            tracing::trace!(entity = %self.entity, overlay = name, "overlay disabled");
        }
        Ok(())
    }

    /// Is the named overlay active?
    pub fn overlay_on(&self, name: &str) -> EngineResult<bool> {
        self.state.overlay_on(self.def, name)
    }

    // ── Activation internals ──────────────────────────────────────────────

    /// Every ancestor layer of `layer` must be active for it to be
    /// reachable.
    fn require_lineage_active(&self, layer: LayerId) -> EngineResult<()> {
        let mut cursor = self.def.layer(layer).parent;
        while let Some(ancestor) = cursor {
            if !self.state.is_active(ancestor) {
                return Err(EngineError::ParentInactive { layer: self.def.layer(layer).name });
            }
            cursor = self.def.layer(ancestor).parent;
        }
        Ok(())
    }

    fn activate(&mut self, layer: LayerId, args: &[Value]) -> EngineResult<()> {
        debug_assert!(!self.state.is_active(layer), "double activation");
        let def = self.def;
        self.state.alloc_scope(layer);

        let saved_layer = self.layer;
        self.layer = Some(layer);

        // Field initializers in declaration order; each may read base fields
        // and fields initialized before it.
        let mut result = Ok(());
        for field in &def.layer(layer).fields {
            match (field.init)(&mut *self) {
                Ok(value) => {
                    if let Some(scope) = self.state.scope_mut(layer) {
                        scope.insert(field.key, value);
                    }
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        // Init-state hook with the activation arguments.
        if result.is_ok()
            && let Some(enter) = &def.layer(layer).on_enter
        {
            result = if enter.arity != args.len() {
                Err(EngineError::InitArity {
                    layer: def.layer(layer).name,
                    expected: enter.arity,
                    got: args.len(),
                })
            } else {
                (enter.run)(&mut *self, args)
            };
        }

        self.layer = saved_layer;
        if let Err(e) = result {
            // Failed activations leave nothing behind.
            self.state.drop_scope(layer);
            return Err(e);
        }

        self.state.set_active(layer, true);

        // A default member activates the first time its group is reachable.
        for &gid in &def.layer(layer).child_groups {
            if self.state.current_member(gid).is_none()
                && let Some(default) = def.group(gid).default
            {
                self.activate(default, &[])?;
                self.state.set_current(gid, Some(default));
            }
        }
        Ok(())
    }

    fn deactivate(&mut self, layer: LayerId) -> EngineResult<()> {
        let def = self.def;

        // Descendants go first, topmost down.
        for &child in def.layer(layer).children.iter().rev() {
            if self.state.is_active(child) {
                self.deactivate(child)?;
            }
        }
        for &gid in &def.layer(layer).child_groups {
            self.state.set_current(gid, None);
        }

        // Declared teardown runs while the fields still exist.
        if let Some(exit) = &def.layer(layer).on_exit {
            let exit = Arc::clone(exit);
            let saved_layer = self.layer;
            self.layer = Some(layer);
            let result = exit(&mut *self);
            self.layer = saved_layer;
            result?;
        }

        self.state.set_active(layer, false);
        self.state.drop_scope(layer);
        Ok(())
    }

    /// Activate the defaults of every root group (entity creation).
    fn enable_root_defaults(&mut self) -> EngineResult<()> {
        let def = self.def;
        for &gid in &def.root_groups {
            if self.state.current_member(gid).is_none()
                && let Some(default) = def.group(gid).default
            {
                self.activate(default, &[])?;
                self.state.set_current(gid, Some(default));
            }
        }
        Ok(())
    }
}

// ── Entry points ──────────────────────────────────────────────────────────────

impl BehaviorDef {
    /// Create the behavior state for a freshly spawned entity: dispatch
    /// `Init`, then activate every root group's default member.
    pub fn create_state(
        &self,
        host: &mut dyn Host,
        entity: EntityId,
    ) -> EngineResult<BehaviorState> {
        let mut state = BehaviorState::new(self);
        {
            let mut ctx = Ctx::new(self, &mut state, host, entity, Hook::Init);
            ctx.run(&[])?;
            ctx.enable_root_defaults()?;
        }
        Ok(state)
    }

    /// Dispatch `hook` on `entity`, resolving through the active layer
    /// stack down to the base definition.
    ///
    /// Returns `Outcome::UNHANDLED` when no layer and no base declares the
    /// hook — a no-op, not an error.
    pub fn dispatch(
        &self,
        state: &mut BehaviorState,
        host: &mut dyn Host,
        entity: EntityId,
        hook: Hook,
        args: &[Value],
    ) -> EngineResult<Outcome> {
        Ctx::new(self, state, host, entity, hook).run(args)
    }

    /// [`Ctx::enable`] from outside a dispatch.
    pub fn enable(
        &self,
        state: &mut BehaviorState,
        host: &mut dyn Host,
        entity: EntityId,
        group: &str,
        member: &str,
        args: &[Value],
    ) -> EngineResult<()> {
        Ctx::new(self, state, host, entity, Hook::Init).enable(group, member, args)
    }

    /// [`Ctx::disable`] from outside a dispatch.
    pub fn disable(
        &self,
        state: &mut BehaviorState,
        host: &mut dyn Host,
        entity: EntityId,
        group: &str,
    ) -> EngineResult<()> {
        Ctx::new(self, state, host, entity, Hook::Init).disable(group)
    }

    /// [`Ctx::enable_overlay`] from outside a dispatch.
    pub fn enable_overlay(
        &self,
        state: &mut BehaviorState,
        host: &mut dyn Host,
        entity: EntityId,
        name: &str,
        args: &[Value],
    ) -> EngineResult<()> {
        Ctx::new(self, state, host, entity, Hook::Init).enable_overlay(name, args)
    }

    /// [`Ctx::disable_overlay`] from outside a dispatch.
    pub fn disable_overlay(
        &self,
        state: &mut BehaviorState,
        host: &mut dyn Host,
        entity: EntityId,
        name: &str,
    ) -> EngineResult<()> {
        Ctx::new(self, state, host, entity, Hook::Init).disable_overlay(name)
    }
}
