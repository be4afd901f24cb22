//! Runtime values.

use crate::coerce;
use crate::error::Result;
use crate::host::{EnumInfo, HostObject};
use crate::kind::ValueKind;
use regex::Regex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use templar_ast::{FloatKind, IntKind};

/// A dynamically typed runtime value.
///
/// Cloning is cheap: strings, lists and host objects are reference counted.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    /// Integer stored widened, always within the range of its kind.
    Int(i128, IntKind),
    /// Float stored widened, rounded to the precision of its kind.
    Float(f64, FloatKind),
    Str(Arc<str>),
    Regex(Arc<Regex>),
    Enum(EnumValue),
    List(Arc<[Value]>),
    Object(Arc<dyn HostObject>),
    Function(Function),
}

/// A value of a host enum type.
#[derive(Debug, Clone)]
pub struct EnumValue {
    pub info: Arc<EnumInfo>,
    pub value: i128,
}

/// Signature of host-provided functions.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A callable value.
#[derive(Clone)]
pub struct Function(Arc<NativeFn>);

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Function(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl EnumValue {
    /// Variant name, when the value matches a declared variant.
    pub fn name(&self) -> Option<&str> {
        self.info.name_of(self.value)
    }
}

impl Value {
    /// Integer of `kind`, wrapped into the kind's range.
    pub fn int(value: i128, kind: IntKind) -> Self {
        Value::Int(kind.wrap(value), kind)
    }

    /// Float of `kind`, rounded to the kind's precision.
    pub fn float(value: f64, kind: FloatKind) -> Self {
        Value::Float(kind.round(value), kind)
    }

    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn object<T: HostObject>(object: T) -> Self {
        Value::Object(Arc::new(object))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(Function::new(f))
    }

    /// Runtime kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_, k) => ValueKind::Int(*k),
            Value::Float(_, k) => ValueKind::Float(*k),
            Value::Str(_) => ValueKind::String,
            Value::Regex(_) => ValueKind::Regex,
            Value::Enum(e) => ValueKind::Enum(e.info.clone()),
            Value::List(_) => ValueKind::list_of(ValueKind::Any),
            Value::Object(o) => ValueKind::Object(o.type_info()),
            Value::Function(_) => ValueKind::Function,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral view: integers and enums.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(v, _) => Some(*v),
            Value::Enum(e) => Some(e.value),
            _ => None,
        }
    }

    /// Numeric view: integers, enums and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v, _) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn HostObject>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrow the host object as its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for Value {
    /// Null-safe dynamic equality, the same relation as the `==` operator
    /// on untyped operands.
    fn eq(&self, other: &Self) -> bool {
        coerce::equals(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v, k) => write!(f, "{}{}", v, k),
            Value::Float(v, k) => write!(f, "{:?}{}", v, k),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Regex(r) => write!(f, "r{:?}", r.as_str()),
            Value::Enum(e) => match e.name() {
                Some(name) => write!(f, "{}.{}", e.info.name(), name),
                None => write!(f, "{}({})", e.info.name(), e.value),
            },
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(o) => write!(f, "<{}>", o.type_info().name()),
            Value::Function(_) => f.write_str("<function>"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&coerce::stringify(self))
    }
}

macro_rules! from_int {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(v as i128, IntKind::$kind)
                }
            }
        )*
    };
}

from_int!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, i128 => I128, u8 => U8, u16 => U16, u32 => U32, u64 => U64);

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::int(v as i128, IntKind::I64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64, FloatKind::F32)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v, FloatKind::F64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::str(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<Regex> for Value {
    fn from(v: Regex) -> Self {
        Value::Regex(Arc::new(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v.into_iter().map(Into::into))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_constructor_wraps() {
        assert_eq!(Value::int(300, IntKind::U8).as_i128(), Some(44));
        assert_eq!(Value::int(-1, IntKind::U16).as_i128(), Some(65535));
    }

    #[test]
    fn test_kinds_of_values() {
        assert_eq!(Value::from(1u32).kind(), ValueKind::Int(IntKind::U32));
        assert_eq!(Value::from("x").kind(), ValueKind::String);
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(
            Value::from(vec![1, 2]).kind(),
            ValueKind::list_of(ValueKind::Any)
        );
    }

    #[test]
    fn test_option_conversion() {
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some("a")).as_str(), Some("a"));
    }

    #[test]
    fn test_function_call() {
        let double = Function::new(|args| {
            Ok(Value::from(args[0].as_i128().unwrap_or(0) as i32 * 2))
        });
        assert_eq!(double.call(&[Value::from(21)]).unwrap(), Value::from(42));
        assert!(double.ptr_eq(&double.clone()));
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Value::from(5u8)), "5u8");
        assert_eq!(format!("{:?}", Value::from(vec!["a"])), "[\"a\"]");
    }
}
