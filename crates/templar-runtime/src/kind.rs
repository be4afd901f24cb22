//! Static value kinds.
//!
//! A `ValueKind` is what the expression compiler knows about a value before
//! it exists: literals, host fields and bindings all carry one. `Any` means
//! "decided at runtime" and dispatches through the dynamic paths.

use crate::host::{EnumInfo, TypeInfo};
use std::fmt;
use std::sync::Arc;
use templar_ast::{FloatKind, IntKind};

/// Compile-time kind of a value.
#[derive(Debug, Clone)]
pub enum ValueKind {
    Null,
    Bool,
    Int(IntKind),
    Float(FloatKind),
    String,
    Regex,
    Enum(Arc<EnumInfo>),
    List(Box<ValueKind>),
    Object(Arc<TypeInfo>),
    Function,
    Any,
}

impl PartialEq for ValueKind {
    fn eq(&self, other: &Self) -> bool {
        use ValueKind::*;
        match (self, other) {
            (Null, Null)
            | (Bool, Bool)
            | (String, String)
            | (Regex, Regex)
            | (Function, Function)
            | (Any, Any) => true,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Enum(a), Enum(b)) => Arc::ptr_eq(a, b) || a.full_name() == b.full_name(),
            (List(a), List(b)) => a == b,
            (Object(a), Object(b)) => Arc::ptr_eq(a, b) || a.full_name() == b.full_name(),
            _ => false,
        }
    }
}

impl ValueKind {
    pub fn list_of(element: ValueKind) -> Self {
        ValueKind::List(Box::new(element))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Int(_) | ValueKind::Float(_))
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, ValueKind::Int(_))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, ValueKind::Any)
    }

    /// Kinds whose values may be null.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            ValueKind::Null
                | ValueKind::String
                | ValueKind::Regex
                | ValueKind::List(_)
                | ValueKind::Object(_)
                | ValueKind::Function
                | ValueKind::Any
        )
    }

    /// Integer view used by numeric promotion: enums count as their
    /// underlying integer.
    pub fn integral(&self) -> Option<IntKind> {
        match self {
            ValueKind::Int(k) => Some(*k),
            ValueKind::Enum(info) => Some(info.underlying()),
            _ => None,
        }
    }

    /// Whether a value of this kind may be used where `target` is requested
    /// without any conversion.
    pub fn is_assignable_to(&self, target: &ValueKind) -> bool {
        match (self, target) {
            (_, ValueKind::Any) => true,
            (ValueKind::Null, t) => t.is_nullable(),
            (ValueKind::List(a), ValueKind::List(b)) => a.is_assignable_to(b),
            (a, b) => a == b,
        }
    }

    /// Element kind when values of this kind can be iterated.
    pub fn element(&self) -> Option<ValueKind> {
        match self {
            ValueKind::List(element) => Some((**element).clone()),
            ValueKind::String => Some(ValueKind::String),
            ValueKind::Object(info) => info.element_kind().cloned(),
            ValueKind::Any | ValueKind::Null => Some(ValueKind::Any),
            _ => None,
        }
    }

    /// Object type descriptor, if any.
    pub fn type_info(&self) -> Option<&Arc<TypeInfo>> {
        match self {
            ValueKind::Object(info) => Some(info),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Null => f.write_str("null"),
            ValueKind::Bool => f.write_str("bool"),
            ValueKind::Int(k) => write!(f, "{}", k),
            ValueKind::Float(k) => write!(f, "{}", k),
            ValueKind::String => f.write_str("string"),
            ValueKind::Regex => f.write_str("regex"),
            ValueKind::Enum(info) => f.write_str(info.name()),
            ValueKind::List(element) => write!(f, "list<{}>", element),
            ValueKind::Object(info) => f.write_str(info.name()),
            ValueKind::Function => f.write_str("function"),
            ValueKind::Any => f.write_str("object"),
        }
    }
}
