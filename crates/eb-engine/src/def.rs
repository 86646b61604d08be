//! Behavior definitions: base handlers, state layers, exclusive groups.
//!
//! A `BehaviorDef` is built once at load time through [`BehaviorDefBuilder`]
//! and is immutable (and cheaply shareable behind `Arc`) thereafter.  Layers
//! live in a flat arena indexed by `LayerId`; nesting is expressed through
//! parent/children links so activation and chain resolution walk indices,
//! not owned trees.
//!
//! All structural validation happens in [`BehaviorDefBuilder::build`]:
//! duplicate layer/group names, duplicate field keys within a layer, and
//! more than one default member per group are definition errors, reported
//! together rather than one at a time.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use eb_core::{GroupId, LayerId};

use crate::dispatch::Ctx;
use crate::error::{EngineError, EngineResult};
use crate::host::Host;
use crate::value::Value;

// ── Hooks ─────────────────────────────────────────────────────────────────────

/// The lifecycle events an entity's behavior can handle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Hook {
    /// Once, when the entity's behavior state is created.
    Init,
    /// Every tick.
    Update,
    /// A named message arrived; `args[0]` is the selector symbol.
    Message,
    /// The host reported a collision; `args[0]` is the other entity.
    Collision,
    /// The archetype's definition is being hot-swapped.
    Reload,
    /// The entity is about to be reaped (driver courtesy, not guaranteed
    /// by the engine — see the lifecycle notes on `BehaviorState`).
    Death,
}

impl Hook {
    pub const COUNT: usize = 6;
    pub const ALL: [Hook; Hook::COUNT] =
        [Hook::Init, Hook::Update, Hook::Message, Hook::Collision, Hook::Reload, Hook::Death];

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Hook::Init => 0,
            Hook::Update => 1,
            Hook::Message => 2,
            Hook::Collision => 3,
            Hook::Reload => 4,
            Hook::Death => 5,
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hook::Init => "init",
            Hook::Update => "update",
            Hook::Message => "message",
            Hook::Collision => "collision",
            Hook::Reload => "reload",
            Hook::Death => "death",
        };
        write!(f, "{name}")
    }
}

// ── Handler closure types ─────────────────────────────────────────────────────

/// A base handler or layer wrap.  The wrap may call `ctx.call_base` at most
/// once to continue into the next layer outward.
pub type HookFn = dyn Fn(&mut Ctx<'_>, &[Value]) -> EngineResult<Value> + Send + Sync;

/// An init-state hook, run once at activation with the activation args.
pub type EnterFn = dyn Fn(&mut Ctx<'_>, &[Value]) -> EngineResult<()> + Send + Sync;

/// A declared teardown hook, run at deactivation while fields still exist.
pub type ExitFn = dyn Fn(&mut Ctx<'_>) -> EngineResult<()> + Send + Sync;

/// A field initializer, evaluated at activation time.  May read the entity's
/// base fields (and earlier fields of the same layer) through the ctx.
pub type FieldInitFn = dyn Fn(&mut Ctx<'_>) -> EngineResult<Value> + Send + Sync;

/// An archetype-level hook run once per archetype per tick, before any
/// per-entity dispatch.
pub type StaticFn = dyn Fn(&mut dyn Host) -> EngineResult<()> + Send + Sync;

// ── Hook table ────────────────────────────────────────────────────────────────

/// One optional handler per hook.
#[derive(Default)]
pub(crate) struct HookTable([Option<Arc<HookFn>>; Hook::COUNT]);

impl HookTable {
    pub(crate) fn set(&mut self, hook: Hook, f: Arc<HookFn>) -> bool {
        let slot = &mut self.0[hook.index()];
        let fresh = slot.is_none();
        *slot = Some(f);
        fresh
    }

    #[inline]
    pub(crate) fn get(&self, hook: Hook) -> Option<&Arc<HookFn>> {
        self.0[hook.index()].as_ref()
    }

    #[inline]
    pub(crate) fn declares(&self, hook: Hook) -> bool {
        self.0[hook.index()].is_some()
    }
}

// ── Layer / group declarations ────────────────────────────────────────────────

#[derive(Clone)]
pub(crate) struct FieldDef {
    pub(crate) key: &'static str,
    pub(crate) init: Arc<FieldInitFn>,
}

#[derive(Clone)]
pub(crate) struct EnterHook {
    pub(crate) arity: usize,
    pub(crate) run: Arc<EnterFn>,
}

/// One declared state layer.
pub(crate) struct LayerDef {
    pub(crate) name: &'static str,
    pub(crate) parent: Option<LayerId>,
    /// `Some` for exclusive-group members, `None` for overlays.
    pub(crate) group: Option<GroupId>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) wraps: HookTable,
    pub(crate) on_enter: Option<EnterHook>,
    pub(crate) on_exit: Option<Arc<ExitFn>>,
    /// Child layers in declaration order (group members and overlays alike).
    pub(crate) children: Vec<LayerId>,
    pub(crate) child_groups: Vec<GroupId>,
}

/// One declared exclusive group.
pub(crate) struct GroupDef {
    pub(crate) name: &'static str,
    pub(crate) members: Vec<LayerId>,
    pub(crate) default: Option<LayerId>,
}

// ── BehaviorDef ───────────────────────────────────────────────────────────────

/// The immutable behavior definition for one entity archetype.
pub struct BehaviorDef {
    name: &'static str,
    pub(crate) base: HookTable,
    static_update: Option<Arc<StaticFn>>,
    pub(crate) layers: Vec<LayerDef>,
    pub(crate) groups: Vec<GroupDef>,
    /// Top-level layers in declaration order.
    pub(crate) roots: Vec<LayerId>,
    /// Top-level groups in declaration order.
    pub(crate) root_groups: Vec<GroupId>,
    layer_names: FxHashMap<&'static str, LayerId>,
    group_names: FxHashMap<&'static str, GroupId>,
}

impl BehaviorDef {
    /// Start building a definition for the named archetype.
    pub fn builder(name: &'static str) -> BehaviorDefBuilder {
        BehaviorDefBuilder {
            def: BehaviorDef {
                name,
                base: HookTable::default(),
                static_update: None,
                layers: Vec::new(),
                groups: Vec::new(),
                roots: Vec::new(),
                root_groups: Vec::new(),
                layer_names: FxHashMap::default(),
                group_names: FxHashMap::default(),
            },
            problems: Vec::new(),
        }
    }

    /// Archetype name this definition was declared for.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Run the archetype-level static update, if declared.
    pub fn run_static_update(&self, host: &mut dyn Host) -> EngineResult<()> {
        match &self.static_update {
            Some(f) => f(host),
            None => Ok(()),
        }
    }

    // ── Name resolution ───────────────────────────────────────────────────

    pub(crate) fn layer(&self, id: LayerId) -> &LayerDef {
        &self.layers[id.index()]
    }

    pub(crate) fn group(&self, id: GroupId) -> &GroupDef {
        &self.groups[id.index()]
    }

    pub(crate) fn group_id(&self, name: &str) -> EngineResult<GroupId> {
        self.group_names.get(name).copied().ok_or_else(|| EngineError::NoSuchGroup {
            def: self.name,
            group: name.to_string(),
        })
    }

    pub(crate) fn layer_id(&self, name: &str) -> EngineResult<LayerId> {
        self.layer_names.get(name).copied().ok_or_else(|| EngineError::NoSuchLayer {
            def: self.name,
            layer: name.to_string(),
        })
    }

    pub(crate) fn member_id(&self, group: GroupId, member: &str) -> EngineResult<LayerId> {
        let id = self.layer_id(member)?;
        if self.layer(id).group != Some(group) {
            return Err(EngineError::NotAMember {
                group: self.group(group).name,
                member: member.to_string(),
            });
        }
        Ok(id)
    }

    pub(crate) fn overlay_id(&self, name: &str) -> EngineResult<LayerId> {
        let id = self.layer_id(name)?;
        if self.layer(id).group.is_some() {
            return Err(EngineError::NotAnOverlay { layer: self.layer(id).name });
        }
        Ok(id)
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Builds a [`BehaviorDef`].  Structural problems accumulate and surface
/// together from [`build`][Self::build] as `EngineError::Definition`.
pub struct BehaviorDefBuilder {
    def: BehaviorDef,
    problems: Vec<String>,
}

impl BehaviorDefBuilder {
    /// Install a base handler for `hook`.
    pub fn on<F>(mut self, hook: Hook, f: F) -> Self
    where
        F: Fn(&mut Ctx<'_>, &[Value]) -> EngineResult<Value> + Send + Sync + 'static,
    {
        if !self.def.base.set(hook, Arc::new(f)) {
            self.problems.push(format!("base handler for {hook} declared twice"));
        }
        self
    }

    /// Install the archetype-level per-tick hook.
    pub fn static_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut dyn Host) -> EngineResult<()> + Send + Sync + 'static,
    {
        if self.def.static_update.replace(Arc::new(f)).is_some() {
            self.problems.push("static_update declared twice".to_string());
        }
        self
    }

    /// Declare a top-level exclusive group.
    pub fn group(mut self, name: &'static str, f: impl FnOnce(&mut GroupBuilder<'_>)) -> Self {
        let gid = self.add_group(name, None);
        f(&mut GroupBuilder { b: &mut self, gid, parent: None });
        self
    }

    /// Declare a top-level overlay layer.
    pub fn overlay(mut self, name: &'static str, f: impl FnOnce(&mut LayerBuilder<'_>)) -> Self {
        let lid = self.add_layer(name, None, None);
        f(&mut LayerBuilder { b: &mut self, lid });
        self
    }

    /// Validate and freeze the definition.
    pub fn build(mut self) -> EngineResult<BehaviorDef> {
        for group in &self.def.groups {
            if group.members.is_empty() {
                self.problems.push(format!("group '{}' has no members", group.name));
            }
        }
        if self.problems.is_empty() {
            Ok(self.def)
        } else {
            Err(EngineError::Definition(self.problems.join("; ")))
        }
    }

    // ── Arena plumbing shared by the nested builders ──────────────────────

    fn add_group(&mut self, name: &'static str, parent: Option<LayerId>) -> GroupId {
        let gid = GroupId(self.def.groups.len() as u16);
        if self.def.group_names.insert(name, gid).is_some() {
            self.problems.push(format!("duplicate group name '{name}'"));
        }
        self.def.groups.push(GroupDef { name, members: Vec::new(), default: None });
        match parent {
            Some(p) => self.def.layers[p.index()].child_groups.push(gid),
            None => self.def.root_groups.push(gid),
        }
        gid
    }

    fn add_layer(
        &mut self,
        name: &'static str,
        parent: Option<LayerId>,
        group: Option<GroupId>,
    ) -> LayerId {
        let lid = LayerId(self.def.layers.len() as u16);
        if self.def.layer_names.insert(name, lid).is_some() {
            self.problems.push(format!("duplicate layer name '{name}'"));
        }
        self.def.layers.push(LayerDef {
            name,
            parent,
            group,
            fields: Vec::new(),
            wraps: HookTable::default(),
            on_enter: None,
            on_exit: None,
            children: Vec::new(),
            child_groups: Vec::new(),
        });
        if let Some(p) = parent {
            self.def.layers[p.index()].children.push(lid);
        } else {
            self.def.roots.push(lid);
        }
        if let Some(g) = group {
            self.def.groups[g.index()].members.push(lid);
        }
        lid
    }
}

/// Declares the members of one exclusive group.
pub struct GroupBuilder<'a> {
    b: &'a mut BehaviorDefBuilder,
    gid: GroupId,
    parent: Option<LayerId>,
}

impl GroupBuilder<'_> {
    /// Declare a member layer.
    pub fn member(&mut self, name: &'static str, f: impl FnOnce(&mut LayerBuilder<'_>)) -> &mut Self {
        let lid = self.b.add_layer(name, self.parent, Some(self.gid));
        f(&mut LayerBuilder { b: &mut *self.b, lid });
        self
    }

    /// Declare the group's default member, activated automatically when the
    /// group first becomes reachable.  At most one per group.
    pub fn member_default(
        &mut self,
        name: &'static str,
        f: impl FnOnce(&mut LayerBuilder<'_>),
    ) -> &mut Self {
        let lid = self.b.add_layer(name, self.parent, Some(self.gid));
        let group = &mut self.b.def.groups[self.gid.index()];
        let group_name = group.name;
        if group.default.replace(lid).is_some() {
            self.b.problems.push(format!("group '{group_name}' has two default members"));
        }
        f(&mut LayerBuilder { b: &mut *self.b, lid });
        self
    }
}

/// Declares one layer: its fields, wraps, lifecycle hooks, and children.
pub struct LayerBuilder<'a> {
    b: &'a mut BehaviorDefBuilder,
    lid: LayerId,
}

impl LayerBuilder<'_> {
    /// Declare a field with its activation-time initializer.
    pub fn field<F>(&mut self, key: &'static str, init: F) -> &mut Self
    where
        F: Fn(&mut Ctx<'_>) -> EngineResult<Value> + Send + Sync + 'static,
    {
        let layer = &mut self.b.def.layers[self.lid.index()];
        if layer.fields.iter().any(|fd| fd.key == key) {
            let name = layer.name;
            self.b.problems.push(format!("layer '{name}' declares field '{key}' twice"));
            return self;
        }
        layer.fields.push(FieldDef { key, init: Arc::new(init) });
        self
    }

    /// Wrap a hook while this layer is active.
    pub fn wrap<F>(&mut self, hook: Hook, f: F) -> &mut Self
    where
        F: Fn(&mut Ctx<'_>, &[Value]) -> EngineResult<Value> + Send + Sync + 'static,
    {
        let layer = &mut self.b.def.layers[self.lid.index()];
        if !layer.wraps.set(hook, Arc::new(f)) {
            let name = layer.name;
            self.b.problems.push(format!("layer '{name}' wraps {hook} twice"));
        }
        self
    }

    /// Init-state hook, run once at activation.  `arity` is the number of
    /// activation arguments the hook expects; a mismatched enable fails
    /// with `InitArity`.
    pub fn on_enter<F>(&mut self, arity: usize, f: F) -> &mut Self
    where
        F: Fn(&mut Ctx<'_>, &[Value]) -> EngineResult<()> + Send + Sync + 'static,
    {
        let layer = &mut self.b.def.layers[self.lid.index()];
        if layer.on_enter.replace(EnterHook { arity, run: Arc::new(f) }).is_some() {
            let name = layer.name;
            self.b.problems.push(format!("layer '{name}' declares on_enter twice"));
        }
        self
    }

    /// Teardown hook, run at deactivation while the layer's fields still
    /// exist.  Layers without one tear down silently.
    pub fn on_exit<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Ctx<'_>) -> EngineResult<()> + Send + Sync + 'static,
    {
        let layer = &mut self.b.def.layers[self.lid.index()];
        if layer.on_exit.replace(Arc::new(f)).is_some() {
            let name = layer.name;
            self.b.problems.push(format!("layer '{name}' declares on_exit twice"));
        }
        self
    }

    /// Declare a nested exclusive group, reachable only while this layer is
    /// active.
    pub fn group(&mut self, name: &'static str, f: impl FnOnce(&mut GroupBuilder<'_>)) -> &mut Self {
        let gid = self.b.add_group(name, Some(self.lid));
        f(&mut GroupBuilder { b: &mut *self.b, gid, parent: Some(self.lid) });
        self
    }

    /// Declare a nested overlay, reachable only while this layer is active.
    pub fn overlay(&mut self, name: &'static str, f: impl FnOnce(&mut LayerBuilder<'_>)) -> &mut Self {
        let lid = self.b.add_layer(name, Some(self.lid), None);
        f(&mut LayerBuilder { b: &mut *self.b, lid });
        self
    }
}
