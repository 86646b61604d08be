//! Engine error type.
//!
//! Two severity classes share this enum.  Content-level errors
//! (`UnknownMessage`) are reported per entity by the driver and do not halt
//! the tick.  Everything else is defect-class: a programming error in a
//! behavior definition or its use, surfaced loudly so layer state never
//! continues in a corrupted form.

use thiserror::Error;

use eb_core::EntityId;

use crate::def::Hook;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A message selector the entity's resolved message handler does not
    /// recognize.  Fatal to that dispatch only.
    #[error("entity {entity}: unknown message '{name}'")]
    UnknownMessage { entity: EntityId, name: &'static str },

    /// Self-transition recursion exceeded `MAX_DISPATCH_DEPTH`.
    #[error("entity {entity}: {hook} dispatch exceeded depth {depth} (transition loop?)")]
    HandlerLoop { entity: EntityId, hook: Hook, depth: u32 },

    /// A layer field was read or written while its layer is inactive.
    #[error("layer '{layer}' is inactive; field '{key}' does not exist")]
    InactiveField { layer: &'static str, key: &'static str },

    /// A field key that is not part of the layer's declared schema.
    #[error("layer '{layer}' declares no field '{key}'")]
    UnknownField { layer: &'static str, key: &'static str },

    /// Layer field access from a base handler, which has no layer scope.
    #[error("no layer scope here; '{key}' must be a base field")]
    NoLayerScope { key: &'static str },

    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },

    /// A base field absent from the entity's field store.
    #[error("entity {entity} has no field '{key}'")]
    MissingField { entity: EntityId, key: &'static str },

    #[error("def '{def}' has no group '{group}'")]
    NoSuchGroup { def: &'static str, group: String },

    #[error("def '{def}' has no layer '{layer}'")]
    NoSuchLayer { def: &'static str, layer: String },

    #[error("group '{group}' has no member '{member}'")]
    NotAMember { group: &'static str, member: String },

    #[error("layer '{layer}' belongs to an exclusive group; use enable, not enable_overlay")]
    NotAnOverlay { layer: &'static str },

    /// Enabling a nested layer whose parent layer is not active.
    #[error("layer '{layer}' is unreachable; its parent layer is inactive")]
    ParentInactive { layer: &'static str },

    /// Activation argument count does not match the declared init arity.
    #[error("layer '{layer}' init takes {expected} args, got {got}")]
    InitArity { layer: &'static str, expected: usize, got: usize },

    #[error("unknown archetype '{0}'")]
    UnknownArchetype(String),

    /// Structural problems found while building a `BehaviorDef`.
    #[error("invalid behavior definition: {0}")]
    Definition(String),
}

/// Shorthand result type for the engine.
pub type EngineResult<T> = Result<T, EngineError>;
