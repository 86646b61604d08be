//! The dynamic value type flowing through handlers and the field store.
//!
//! Handlers, message arguments, and field-store slots all trade in `Value`.
//! The set of variants is closed and every variant is `Copy`, so values move
//! freely between layers without ownership ceremony.  Symbol payloads are
//! `&'static str` because every name in a behavior definition is written in
//! code; there is no runtime string interner to feed.

use std::fmt;

use eb_core::{EntityId, Vec2};

use crate::error::{EngineError, EngineResult};

/// A dynamically typed behavior value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    /// The absence of a value; what handlers without a result return.
    Nil,
    Bool(bool),
    Num(f64),
    Vec2(Vec2),
    /// A symbolic name (message selector, tag value, archetype name).
    Sym(&'static str),
    /// A reference to a live entity, resolved through the host on use.
    Ent(EntityId),
}

impl Value {
    /// Variant name for error reporting.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Num(_) => "num",
            Value::Vec2(_) => "vec2",
            Value::Sym(_) => "sym",
            Value::Ent(_) => "ent",
        }
    }

    fn mismatch(&self, expected: &'static str) -> EngineError {
        EngineError::TypeMismatch { expected, found: self.type_name() }
    }

    // ── Checked accessors ─────────────────────────────────────────────────

    pub fn as_num(&self) -> EngineResult<f64> {
        match self {
            Value::Num(n) => Ok(*n),
            other => Err(other.mismatch("num")),
        }
    }

    /// `as_num` narrowed to f32 — positions and magnitudes are single
    /// precision throughout.
    pub fn as_f32(&self) -> EngineResult<f32> {
        self.as_num().map(|n| n as f32)
    }

    pub fn as_bool(&self) -> EngineResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_vec2(&self) -> EngineResult<Vec2> {
        match self {
            Value::Vec2(v) => Ok(*v),
            other => Err(other.mismatch("vec2")),
        }
    }

    pub fn as_sym(&self) -> EngineResult<&'static str> {
        match self {
            Value::Sym(s) => Ok(s),
            other => Err(other.mismatch("sym")),
        }
    }

    pub fn as_ent(&self) -> EngineResult<EntityId> {
        match self {
            Value::Ent(e) => Ok(*e),
            other => Err(other.mismatch("ent")),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Num(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Value::Vec2(v)
    }
}

impl From<EntityId> for Value {
    fn from(e: EntityId) -> Self {
        Value::Ent(e)
    }
}

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::Sym(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => write!(f, "{n}"),
            Value::Vec2(v) => write!(f, "{v}"),
            Value::Sym(s) => write!(f, "'{s}"),
            Value::Ent(e) => write!(f, "{e}"),
        }
    }
}
