//! Operator typing and evaluation.
//!
//! `binary_kind`/`unary_kind` compute the static result kind the expression
//! compiler records; `binary`/`unary` evaluate on runtime values. Integer
//! arithmetic wraps at the width of the promoted kind.

use crate::coerce::{self, compare, equals, promote, promote_int, stringify, to_bool};
use crate::error::{RenderError, Result};
use crate::kind::ValueKind;
use crate::value::{EnumValue, Value};
use std::cmp::Ordering;
use templar_ast::{BinaryOp, IntKind, UnaryOp};

fn is_arithmetic(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
    )
}

fn is_relational(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
}

fn is_bitwise(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr)
}

fn not_applicable(op: BinaryOp, left: &ValueKind, right: &ValueKind) -> String {
    format!(
        "operator '{}' cannot be applied to '{}' and '{}'",
        op, left, right
    )
}

/// Static result kind of `left op right`.
pub fn binary_kind(op: BinaryOp, left: &ValueKind, right: &ValueKind) -> std::result::Result<ValueKind, String> {
    use ValueKind as K;
    match op {
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::And | BinaryOp::Or => Ok(K::Bool),
        BinaryOp::Matches | BinaryOp::NotMatches => match right {
            K::Regex | K::String | K::Any | K::Null => Ok(K::Bool),
            _ => Err(not_applicable(op, left, right)),
        },
        BinaryOp::Coalesce => Ok(match (left, right) {
            (K::Null, other) | (other, K::Null) => other.clone(),
            (a, b) if a == b => a.clone(),
            (a, b) => promote(a, b).unwrap_or(K::Any),
        }),
        BinaryOp::Add if matches!(left, K::String) || matches!(right, K::String) => Ok(K::String),
        _ if left.is_any() || right.is_any() => {
            Ok(if is_relational(op) { K::Bool } else { K::Any })
        }
        _ if is_relational(op) => {
            let comparable = matches!(left, K::Null)
                || matches!(right, K::Null)
                || promote(left, right).is_some()
                || (left == right && matches!(left, K::String | K::Bool));
            if comparable {
                Ok(K::Bool)
            } else {
                Err(not_applicable(op, left, right))
            }
        }
        _ if is_arithmetic(op) => {
            if matches!(left, K::Null) || matches!(right, K::Null) {
                return Ok(K::Any);
            }
            match (left, right) {
                (K::Enum(_) | K::Int(_) | K::Float(_), K::Enum(_) | K::Int(_) | K::Float(_)) => {
                    promote(left, right).ok_or_else(|| not_applicable(op, left, right))
                }
                _ => Err(not_applicable(op, left, right)),
            }
        }
        _ => {
            debug_assert!(is_bitwise(op));
            match (left, right) {
                (K::Bool, K::Bool) => Ok(K::Bool),
                (K::Enum(a), K::Enum(b)) if a.full_name() == b.full_name() => Ok(left.clone()),
                _ => match (left.integral(), right.integral()) {
                    (Some(a), Some(b)) => Ok(K::Int(promote_int(a, b))),
                    _ => Err(not_applicable(op, left, right)),
                },
            }
        }
    }
}

/// Evaluate `left op right`. `&&`, `||` and `??` evaluate both operands
/// here; the compiler emits short-circuiting code for them instead.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(equals(left, right))),
        BinaryOp::Ne => Ok(Value::Bool(!equals(left, right))),
        BinaryOp::And => Ok(Value::Bool(to_bool(left) && to_bool(right))),
        BinaryOp::Or => Ok(Value::Bool(to_bool(left) || to_bool(right))),
        BinaryOp::Coalesce => Ok(if left.is_null() { right.clone() } else { left.clone() }),
        BinaryOp::Matches => matches_regex(left, right).map(Value::Bool),
        BinaryOp::NotMatches => matches_regex(left, right).map(|m| Value::Bool(!m)),
        BinaryOp::Add if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
            let mut text = stringify(left);
            text.push_str(&stringify(right));
            Ok(Value::from(text))
        }
        _ if is_relational(op) => relational(op, left, right),
        _ if is_arithmetic(op) => arithmetic(op, left, right),
        _ => bitwise(op, left, right),
    }
}

fn matches_regex(left: &Value, right: &Value) -> Result<bool> {
    let text = stringify(left);
    match right {
        Value::Regex(re) => Ok(re.is_match(&text)),
        Value::Str(pattern) => Ok(coerce::compile_regex(pattern, "")?.is_match(&text)),
        Value::Null => Ok(false),
        other => Err(RenderError::mismatch("regex", other.kind())),
    }
}

fn relational(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let Some(ordering) = compare(left, right) else {
        if left.is_null() || right.is_null() {
            return Ok(Value::Bool(false));
        }
        return Err(RenderError::mismatch(left.kind(), right.kind()));
    };
    Ok(Value::Bool(match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    match promote(&left.kind(), &right.kind()) {
        Some(ValueKind::Int(kind)) => {
            let (Some(a), Some(b)) = (left.as_i128(), right.as_i128()) else {
                return Err(RenderError::mismatch(kind, right.kind()));
            };
            int_arithmetic(op, a, b, kind)
        }
        Some(ValueKind::Float(kind)) => {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                return Err(RenderError::mismatch(kind, right.kind()));
            };
            let (a, b) = (kind.round(a), kind.round(b));
            let v = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            };
            Ok(Value::float(v, kind))
        }
        _ => Err(RenderError::mismatch(left.kind(), right.kind())),
    }
}

fn int_arithmetic(op: BinaryOp, a: i128, b: i128, kind: IntKind) -> Result<Value> {
    let v = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div if b == 0 => return Err(RenderError::DivideByZero),
        BinaryOp::Div => a.wrapping_div(b),
        _ if b == 0 => return Err(RenderError::DivideByZero),
        _ => a.wrapping_rem(b),
    };
    Ok(Value::int(v, kind))
}

fn bitwise(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let apply = |a: i128, b: i128| match op {
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitXor => a ^ b,
        _ => a | b,
    };
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(apply(*a as i128, *b as i128) != 0)),
        (Value::Enum(a), Value::Enum(b)) if a.info.full_name() == b.info.full_name() => {
            Ok(Value::Enum(EnumValue {
                info: a.info.clone(),
                value: a.info.underlying().wrap(apply(a.value, b.value)),
            }))
        }
        _ => match (left.kind().integral(), right.kind().integral()) {
            (Some(ka), Some(kb)) => {
                let (Some(a), Some(b)) = (left.as_i128(), right.as_i128()) else {
                    return Err(RenderError::mismatch(left.kind(), right.kind()));
                };
                Ok(Value::int(apply(a, b), promote_int(ka, kb)))
            }
            _ => Err(RenderError::mismatch("integral", format!("{} and {}", left.kind(), right.kind()))),
        },
    }
}

/// Kind produced by negating an integer of `kind`.
fn negated(kind: IntKind) -> IntKind {
    if kind.is_signed() {
        kind
    } else {
        IntKind::signed_of_bits(kind.bits() * 2).unwrap_or(IntKind::I128)
    }
}

/// Static result kind of `op operand`.
pub fn unary_kind(op: UnaryOp, operand: &ValueKind) -> std::result::Result<ValueKind, String> {
    let fail = || format!("operator '{}' cannot be applied to '{}'", op, operand);
    match (op, operand) {
        (UnaryOp::Not, _) => Ok(ValueKind::Bool),
        (_, ValueKind::Any | ValueKind::Null) => Ok(ValueKind::Any),
        (UnaryOp::Neg, ValueKind::Float(k)) | (UnaryOp::Plus, ValueKind::Float(k)) => {
            Ok(ValueKind::Float(*k))
        }
        (UnaryOp::Neg, k) => k.integral().map(|i| ValueKind::Int(negated(i))).ok_or_else(fail),
        (UnaryOp::Plus, k) => k.integral().map(ValueKind::Int).ok_or_else(fail),
        (UnaryOp::BitNot, ValueKind::Enum(_)) => Ok(operand.clone()),
        (UnaryOp::BitNot, k) => k.integral().map(ValueKind::Int).ok_or_else(fail),
    }
}

pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value> {
    let mismatch = || RenderError::mismatch("numeric", operand.kind());
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!to_bool(v))),
        (_, Value::Null) => Ok(Value::Null),
        (UnaryOp::Neg, Value::Float(v, k)) => Ok(Value::Float(-v, *k)),
        (UnaryOp::Plus, Value::Float(..)) => Ok(operand.clone()),
        (UnaryOp::BitNot, Value::Enum(e)) => Ok(Value::Enum(EnumValue {
            info: e.info.clone(),
            value: e.info.underlying().wrap(!e.value),
        })),
        (op, v) => {
            let kind = v.kind().integral().ok_or_else(mismatch)?;
            let value = v.as_i128().ok_or_else(mismatch)?;
            Ok(match op {
                UnaryOp::Neg => {
                    let target = negated(kind);
                    Value::int(value.wrapping_neg(), target)
                }
                UnaryOp::BitNot => Value::int(!value, kind),
                _ => Value::Int(value, kind),
            })
        }
    }
}
