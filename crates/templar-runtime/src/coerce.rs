//! Coercion rules shared by the expression compiler and dynamic dispatch.
//!
//! The same functions decide both the static result kind of an operator
//! (over [`ValueKind`]s) and the runtime behaviour (over [`Value`]s), so a
//! typed and an untyped evaluation of one expression always agree.

use crate::error::{RenderError, Result};
use crate::format;
use crate::kind::ValueKind;
use crate::value::Value;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::sync::Arc;
use templar_ast::{FloatKind, IntKind};

/// Truthiness used by predicates.
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(v, _) => *v != 0,
        Value::Float(v, _) => *v != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::Enum(e) => e.value != 0,
        Value::Regex(_) | Value::List(_) | Value::Object(_) | Value::Function(_) => true,
    }
}

/// Text of a value as it is emitted into template output.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Int(v, _) => format::format_int(*v),
        Value::Float(v, k) => format::format_float(*v, *k),
        Value::Str(s) => s.to_string(),
        Value::Regex(r) => r.as_str().to_string(),
        Value::Enum(e) => match e.name() {
            Some(name) => name.to_string(),
            None => format::format_int(e.value),
        },
        Value::List(items) => items.iter().map(stringify).collect::<Vec<_>>().join(", "),
        Value::Object(o) => o.to_text(),
        Value::Function(_) => "function".to_string(),
    }
}

/// Common kind of two integral operands.
///
/// The wider kind wins; equal widths with different signedness move to the
/// signed kind of twice the width.
pub fn promote_int(a: IntKind, b: IntKind) -> IntKind {
    if a == b {
        return a;
    }
    match a.bits().cmp(&b.bits()) {
        Ordering::Greater => a,
        Ordering::Less => b,
        Ordering::Equal => IntKind::signed_of_bits(a.bits() * 2).unwrap_or(IntKind::I128),
    }
}

fn promote_float(a: FloatKind, b: FloatKind) -> FloatKind {
    a.max(b)
}

/// Numeric promotion of two operand kinds, `None` when either side is not
/// numeric. A `Null` side takes the other side's kind.
pub fn promote(left: &ValueKind, right: &ValueKind) -> Option<ValueKind> {
    match (left, right) {
        (ValueKind::Null, other) | (other, ValueKind::Null) if numeric(other) => {
            Some(as_number(other)?)
        }
        (ValueKind::Float(a), ValueKind::Float(b)) => Some(ValueKind::Float(promote_float(*a, *b))),
        (ValueKind::Float(k), other) | (other, ValueKind::Float(k)) => {
            other.integral().map(|_| ValueKind::Float(*k))
        }
        (a, b) => Some(ValueKind::Int(promote_int(a.integral()?, b.integral()?))),
    }
}

fn numeric(kind: &ValueKind) -> bool {
    kind.is_numeric() || matches!(kind, ValueKind::Enum(_))
}

fn as_number(kind: &ValueKind) -> Option<ValueKind> {
    match kind {
        ValueKind::Float(k) => Some(ValueKind::Float(*k)),
        other => other.integral().map(ValueKind::Int),
    }
}

/// Cost of an implicit conversion from `from` to `to`; `None` if there is
/// none. Zero means the kinds already match.
pub fn implicit_cost(from: &ValueKind, to: &ValueKind) -> Option<u32> {
    if from == to {
        return Some(0);
    }
    match (from, to) {
        (ValueKind::Any, _) => Some(3),
        (_, ValueKind::Any) => Some(2),
        (ValueKind::Null, t) if t.is_nullable() => Some(1),
        (ValueKind::Int(a), ValueKind::Int(b)) => {
            (b.min_value() <= a.min_value() && a.max_value() <= b.max_value()).then_some(1)
        }
        (ValueKind::Int(_), ValueKind::Float(_)) => Some(2),
        (ValueKind::Float(FloatKind::F32), ValueKind::Float(FloatKind::F64)) => Some(1),
        (ValueKind::List(_), ValueKind::List(_)) if from.is_assignable_to(to) => Some(1),
        _ => None,
    }
}

/// Convert a runtime value to `target`, allowing only lossless implicit
/// conversions.
pub fn convert(value: Value, target: &ValueKind) -> Result<Value> {
    let actual = value.kind();
    if actual.is_assignable_to(target) {
        return Ok(value);
    }
    match (&value, target) {
        (Value::Int(v, _), ValueKind::Int(k)) if k.contains(*v) => Ok(Value::Int(*v, *k)),
        (Value::Int(v, _), ValueKind::Float(k)) => Ok(Value::float(*v as f64, *k)),
        (Value::Enum(e), ValueKind::Int(k)) if k.contains(e.value) => Ok(Value::Int(e.value, *k)),
        (Value::Float(v, FloatKind::F32), ValueKind::Float(FloatKind::F64)) => {
            Ok(Value::Float(*v, FloatKind::F64))
        }
        (Value::List(items), ValueKind::List(element)) => {
            let converted = items
                .iter()
                .map(|item| convert(item.clone(), element))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::list(converted))
        }
        _ => Err(RenderError::mismatch(target, actual)),
    }
}

/// Null-safe equality used by `==` and `!=`.
pub fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Str(_), _) | (_, Value::Str(_)) => stringify(left) == stringify(right),
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Regex(a), Value::Regex(b)) => a.as_str() == b.as_str(),
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
        (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
        _ => numeric_cmp(left, right) == Some(Ordering::Equal),
    }
}

/// Ordering for relational operators; `None` when the values do not order.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => numeric_cmp(left, right),
    }
}

fn numeric_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left.as_i128(), right.as_i128()) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => {
            let kind = match promote(&left.kind(), &right.kind())? {
                ValueKind::Float(k) => k,
                _ => return None,
            };
            let a = kind.round(left.as_f64()?);
            let b = kind.round(right.as_f64()?);
            a.partial_cmp(&b)
        }
    }
}

/// Elements visited by iteration. Null iterates as empty.
pub fn elements(value: &Value) -> Result<Vec<Value>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::List(items) => Ok(items.to_vec()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
        Value::Object(o) => o
            .elements()
            .ok_or_else(|| RenderError::mismatch("enumerable", o.type_info().name())),
        other => Err(RenderError::mismatch("enumerable", other.kind())),
    }
}

/// Build a regex from a pattern and `imsxU` flags.
pub fn compile_regex(pattern: &str, flags: &str) -> Result<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'U' => builder.swap_greed(true),
            other => {
                return Err(RenderError::InvalidRegex {
                    pattern: pattern.to_string(),
                    message: format!("unknown flag '{}'", other),
                });
            }
        };
    }
    builder.build().map_err(|e| RenderError::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::EnumInfo;
    use crate::value::EnumValue;

    #[test]
    fn test_truthiness_table() {
        assert!(!to_bool(&Value::Null));
        assert!(!to_bool(&Value::from(0)));
        assert!(to_bool(&Value::from(-3)));
        assert!(!to_bool(&Value::from(0.0)));
        assert!(to_bool(&Value::from(0.5f32)));
        assert!(!to_bool(&Value::from("")));
        assert!(to_bool(&Value::from("false")));
        assert!(to_bool(&Value::list(Vec::new())));
        assert!(to_bool(&Value::from(true)));

        let info = EnumInfo::new("Level", IntKind::I32).with_variant("None", 0).build();
        let zero = Value::Enum(EnumValue { info: info.clone(), value: 0 });
        let one = Value::Enum(EnumValue { info, value: 1 });
        assert!(!to_bool(&zero));
        assert!(to_bool(&one));
    }

    #[test]
    fn test_integer_promotion() {
        assert_eq!(promote_int(IntKind::I16, IntKind::I32), IntKind::I32);
        assert_eq!(promote_int(IntKind::U32, IntKind::I32), IntKind::I64);
        assert_eq!(promote_int(IntKind::U8, IntKind::I8), IntKind::I16);
        assert_eq!(promote_int(IntKind::U64, IntKind::I64), IntKind::I128);
        assert_eq!(promote_int(IntKind::U16, IntKind::I64), IntKind::I64);
    }

    #[test]
    fn test_mixed_promotion() {
        let i32k = ValueKind::Int(IntKind::I32);
        assert_eq!(
            promote(&i32k, &ValueKind::Float(FloatKind::F32)),
            Some(ValueKind::Float(FloatKind::F32))
        );
        assert_eq!(
            promote(&ValueKind::Float(FloatKind::F32), &ValueKind::Float(FloatKind::F64)),
            Some(ValueKind::Float(FloatKind::F64))
        );
        assert_eq!(promote(&ValueKind::Null, &i32k), Some(i32k.clone()));
        assert_eq!(promote(&ValueKind::String, &i32k), None);

        let level = EnumInfo::new("Level", IntKind::U8).build();
        assert_eq!(
            promote(&ValueKind::Enum(level), &ValueKind::Int(IntKind::I8)),
            Some(ValueKind::Int(IntKind::I16))
        );
    }

    #[test]
    fn test_equality_rules() {
        assert!(equals(&Value::Null, &Value::Null));
        assert!(!equals(&Value::Null, &Value::from("")));
        assert!(equals(&Value::from("1"), &Value::from(1)));
        assert!(equals(&Value::from(1u8), &Value::from(1i64)));
        assert!(equals(&Value::from(2), &Value::from(2.0)));
        assert!(!equals(&Value::from(0.1f32), &Value::from(0.1f64)));
        assert!(equals(&Value::from(vec![1, 2]), &Value::from(vec![1, 2])));
        assert!(!equals(&Value::from(true), &Value::from(1)));
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(&Value::from(1), &Value::from(2.5)), Some(Ordering::Less));
        assert_eq!(compare(&Value::from("b"), &Value::from("a")), Some(Ordering::Greater));
        assert_eq!(compare(&Value::from(u64::MAX), &Value::from(-1i64)), Some(Ordering::Greater));
        assert_eq!(compare(&Value::Null, &Value::from(1)), None);
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&Value::Null), "");
        assert_eq!(stringify(&Value::from(false)), "false");
        assert_eq!(stringify(&Value::from(2.0)), "2");
        assert_eq!(stringify(&Value::from(vec!["a", "b"])), "a, b");
    }

    #[test]
    fn test_implicit_conversions() {
        let i32k = ValueKind::Int(IntKind::I32);
        assert_eq!(implicit_cost(&i32k, &i32k), Some(0));
        assert_eq!(implicit_cost(&ValueKind::Int(IntKind::U16), &i32k), Some(1));
        assert_eq!(implicit_cost(&ValueKind::Int(IntKind::U32), &i32k), None);
        assert_eq!(implicit_cost(&i32k, &ValueKind::Float(FloatKind::F64)), Some(2));
        assert_eq!(implicit_cost(&ValueKind::String, &i32k), None);

        let v = convert(Value::from(7u8), &ValueKind::Float(FloatKind::F64)).unwrap();
        assert_eq!(v.kind(), ValueKind::Float(FloatKind::F64));
        assert!(convert(Value::from(300), &ValueKind::Int(IntKind::U8)).is_err());
    }

    #[test]
    fn test_regex_flags() {
        let re = compile_regex("^ab", "im").unwrap();
        assert!(re.is_match("x\nAB"));
        assert!(matches!(compile_regex("a", "q"), Err(RenderError::InvalidRegex { .. })));
    }

    #[test]
    fn test_elements() {
        assert!(elements(&Value::Null).unwrap().is_empty());
        assert_eq!(elements(&Value::from("ab")).unwrap().len(), 2);
        assert!(elements(&Value::from(1)).is_err());
    }
}
