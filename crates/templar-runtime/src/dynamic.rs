//! Late-bound member access, used when the static kind of a receiver is
//! `Any` and resolution has to happen on the runtime value.

use crate::builtins;
use crate::coerce::convert;
use crate::error::{RenderError, Result};
use crate::host::TypeInfo;
use crate::kind::ValueKind;
use crate::overload::{self, Selection};
use crate::value::Value;
use std::sync::Arc;

fn descriptor(receiver: &Value) -> Option<Arc<TypeInfo>> {
    match receiver {
        Value::Object(o) => Some(o.type_info()),
        other => builtins::type_of(&other.kind()).cloned(),
    }
}

/// Read `receiver.name`. `Ok(None)` means the name does not exist on the
/// value; a null receiver yields null.
pub fn member(receiver: &Value, name: &str, case_sensitive: bool) -> Result<Option<Value>> {
    if receiver.is_null() {
        return Ok(Some(Value::Null));
    }
    let Some(info) = descriptor(receiver) else {
        return Ok(None);
    };
    if let Some(field) = info.field(name, case_sensitive) {
        return field.get(receiver).map(Some);
    }
    if let Some(member) = info.static_member(name, case_sensitive) {
        return Ok(Some(member.value.clone()));
    }
    if let Some(vars) = receiver.as_object().and_then(|o| o.variables()) {
        let found = if case_sensitive {
            vars.get(name)
        } else {
            vars.get_ignore_case(name)
        };
        // Dynamic objects answer every name; unknown ones read as null.
        return Ok(Some(found.unwrap_or_default()));
    }
    Ok(None)
}

/// Call `receiver.name(args)`, choosing an overload from the runtime kinds
/// of the arguments.
pub fn invoke(receiver: &Value, name: &str, args: &[Value], case_sensitive: bool) -> Result<Value> {
    if receiver.is_null() {
        return Ok(Value::Null);
    }
    if let Some(info) = descriptor(receiver) {
        let kinds: Vec<ValueKind> = args.iter().map(Value::kind).collect();
        match overload::select(info.methods_named(name, case_sensitive), &kinds) {
            Selection::Exact(method) | Selection::Converted(method) => {
                let converted = args
                    .iter()
                    .zip(&method.params)
                    .map(|(arg, param)| convert(arg.clone(), param))
                    .collect::<Result<Vec<_>>>()?;
                return method.invoke(receiver, &converted);
            }
            Selection::Ambiguous(methods) => {
                let signatures: Vec<_> = methods.iter().map(|m| m.signature()).collect();
                return Err(RenderError::NotInvocable {
                    name: name.to_string(),
                    reason: format!("ambiguous between {}", signatures.join(" and ")),
                });
            }
            Selection::None if info.has_method(name, case_sensitive) => {
                return Err(RenderError::NotInvocable {
                    name: name.to_string(),
                    reason: format!("no overload takes {} argument(s) of these kinds", args.len()),
                });
            }
            Selection::None => {}
        }
    }
    match member(receiver, name, case_sensitive)? {
        Some(callee) => call(&callee, name, args),
        None => Err(RenderError::UnresolvedName {
            name: name.to_string(),
        }),
    }
}

/// Invoke a function value.
pub fn call(callee: &Value, name: &str, args: &[Value]) -> Result<Value> {
    match callee {
        Value::Function(f) => f.call(args),
        other => Err(RenderError::NotInvocable {
            name: name.to_string(),
            reason: format!("a value of kind '{}' is not a function", other.kind()),
        }),
    }
}

fn position(index: &Value, len: usize) -> Result<usize> {
    let i = index
        .as_i128()
        .ok_or_else(|| RenderError::mismatch("integer index", index.kind()))?;
    if i < 0 || i >= len as i128 {
        return Err(RenderError::IndexOutOfRange { index: i, len });
    }
    Ok(i as usize)
}

/// Evaluate `target[index]`.
pub fn index(target: &Value, index: &Value) -> Result<Value> {
    match target {
        Value::Null => Ok(Value::Null),
        Value::List(items) => Ok(items[position(index, items.len())?].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::str(chars[position(index, chars.len())?].to_string()))
        }
        Value::Object(o) => {
            if let (Some(vars), Some(name)) = (o.variables(), index.as_str()) {
                return Ok(vars.get(name).unwrap_or_default());
            }
            match o.elements() {
                Some(items) => Ok(items[position(index, items.len())?].clone()),
                None => Err(RenderError::mismatch("indexable", o.type_info().name())),
            }
        }
        other => Err(RenderError::mismatch("indexable", other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn test_member_on_builtins_and_null() {
        assert_eq!(member(&Value::from("abc"), "length", true).unwrap(), Some(Value::from(3)));
        assert_eq!(member(&Value::Null, "anything", true).unwrap(), Some(Value::Null));
        assert_eq!(member(&Value::from(1), "length", true).unwrap(), None);
    }

    #[test]
    fn test_member_on_record() {
        let record = Record::new();
        record.insert("Name", "Ada");
        let value = Value::object(record);
        assert_eq!(member(&value, "Name", true).unwrap(), Some(Value::from("Ada")));
        assert_eq!(member(&value, "name", false).unwrap(), Some(Value::from("Ada")));
        assert_eq!(member(&value, "missing", true).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_invoke_selects_overload_at_runtime() {
        let s = Value::from("hello");
        let v = invoke(&s, "substring", &[Value::from(1u8), Value::from(3i64)], true);
        // i64 does not narrow to i32 implicitly
        assert!(matches!(v, Err(RenderError::NotInvocable { .. })));
        let v = invoke(&s, "substring", &[Value::from(1u8), Value::from(3i16)], true).unwrap();
        assert_eq!(v, Value::from("ell"));
    }

    #[test]
    fn test_invoke_function_variable() {
        let record = Record::new();
        record.insert(
            "twice",
            Value::function(|args| Ok(Value::from(args[0].as_i128().unwrap_or(0) as i32 * 2))),
        );
        let v = invoke(&Value::object(record), "twice", &[Value::from(4)], true).unwrap();
        assert_eq!(v, Value::from(8));
    }

    #[test]
    fn test_index() {
        let list = Value::from(vec!["a", "b"]);
        assert_eq!(index(&list, &Value::from(1)).unwrap(), Value::from("b"));
        assert_eq!(
            index(&list, &Value::from(2)),
            Err(RenderError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(index(&Value::from("xyz"), &Value::from(0)).unwrap(), Value::from("x"));
    }
}
