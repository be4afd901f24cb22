// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Runtime support for compiled templates.
//!
//! - [`value`] / [`kind`]: runtime values and their static kinds
//! - [`host`]: descriptors host types use to expose members
//! - [`record`]: the built-in dynamic context object
//! - [`coerce`] / [`ops`]: truthiness, promotion, equality and operators
//! - [`overload`]: method overload selection
//! - [`dynamic`]: late-bound member access on `Any` receivers
//! - [`env`]: the per-invocation evaluation environment
//! - [`format`]: the thread-local number format

pub mod builtins;
pub mod coerce;
pub mod dynamic;
pub mod env;
pub mod error;
pub mod format;
pub mod host;
pub mod kind;
pub mod ops;
pub mod overload;
pub mod record;
pub mod value;

pub use env::{Env, Eval, Flow, Halt, Output, Render};
pub use error::{RenderError, Result};
pub use format::{FormatGuard, NumberFormat};
pub use host::{
    DynamicVariables, EnumInfo, Field, HostObject, Method, StaticMember, StaticType, TypeBuilder,
    TypeInfo, TypeRegistry,
};
pub use kind::ValueKind;
pub use record::Record;
pub use value::{EnumValue, Function, Value};

pub use templar_ast::{FloatKind, IntKind};
