//! Members of built-in strings and lists.
//!
//! Host types describe themselves with a [`TypeInfo`]; strings and lists get
//! small fixed descriptors so `name.length` or `items.join(", ")` resolve the
//! same way host members do.

use crate::coerce::{equals, stringify};
use crate::error::{RenderError, Result};
use crate::host::TypeInfo;
use crate::kind::ValueKind;
use crate::value::Value;
use std::sync::{Arc, LazyLock};
use templar_ast::IntKind;

const I32: ValueKind = ValueKind::Int(IntKind::I32);

fn text(value: &Value) -> Result<&str> {
    value
        .as_str()
        .ok_or_else(|| RenderError::mismatch(ValueKind::String, value.kind()))
}

fn text_arg(args: &[Value], at: usize) -> Result<&str> {
    match args.get(at) {
        Some(Value::Null) => Ok(""),
        Some(v) => text(v),
        None => Err(RenderError::Host(format!("missing argument {}", at + 1))),
    }
}

fn int_arg(args: &[Value], at: usize) -> Result<i128> {
    match args.get(at) {
        Some(v) => v
            .as_i128()
            .ok_or_else(|| RenderError::mismatch(I32, v.kind())),
        None => Err(RenderError::Host(format!("missing argument {}", at + 1))),
    }
}

fn items(value: &Value) -> Result<&[Value]> {
    value
        .as_list()
        .ok_or_else(|| RenderError::mismatch("list", value.kind()))
}

fn substring(s: &str, start: i128, len: Option<i128>) -> Result<Value> {
    let chars: Vec<char> = s.chars().collect();
    let total = chars.len();
    let out_of_range = |index| RenderError::IndexOutOfRange { index, len: total };
    if start < 0 || start as usize > total {
        return Err(out_of_range(start));
    }
    let begin = start as usize;
    let end = match len {
        Some(n) if n < 0 || begin + n as usize > total => return Err(out_of_range(start + n)),
        Some(n) => begin + n as usize,
        None => total,
    };
    Ok(Value::from(chars[begin..end].iter().collect::<String>()))
}

pub static STRING: LazyLock<Arc<TypeInfo>> = LazyLock::new(|| {
    TypeInfo::primitive("String")
        .field_fn("length", I32, |v| Ok(Value::from(text(v)?.chars().count() as i32)))
        .method_fn("to_upper", &[], ValueKind::String, |v, _| Ok(Value::from(text(v)?.to_uppercase())))
        .method_fn("to_lower", &[], ValueKind::String, |v, _| Ok(Value::from(text(v)?.to_lowercase())))
        .method_fn("trim", &[], ValueKind::String, |v, _| Ok(Value::from(text(v)?.trim())))
        .method_fn("contains", &[ValueKind::String], ValueKind::Bool, |v, args| {
            Ok(Value::from(text(v)?.contains(text_arg(args, 0)?)))
        })
        .method_fn("starts_with", &[ValueKind::String], ValueKind::Bool, |v, args| {
            Ok(Value::from(text(v)?.starts_with(text_arg(args, 0)?)))
        })
        .method_fn("ends_with", &[ValueKind::String], ValueKind::Bool, |v, args| {
            Ok(Value::from(text(v)?.ends_with(text_arg(args, 0)?)))
        })
        .method_fn("index_of", &[ValueKind::String], I32, |v, args| {
            let haystack = text(v)?;
            let index = haystack
                .find(text_arg(args, 0)?)
                .map_or(-1, |at| haystack[..at].chars().count() as i32);
            Ok(Value::from(index))
        })
        .method_fn(
            "replace",
            &[ValueKind::String, ValueKind::String],
            ValueKind::String,
            |v, args| Ok(Value::from(text(v)?.replace(text_arg(args, 0)?, text_arg(args, 1)?))),
        )
        .method_fn("substring", &[I32], ValueKind::String, |v, args| {
            substring(text(v)?, int_arg(args, 0)?, None)
        })
        .method_fn("substring", &[I32, I32], ValueKind::String, |v, args| {
            substring(text(v)?, int_arg(args, 0)?, Some(int_arg(args, 1)?))
        })
        .method_fn(
            "split",
            &[ValueKind::String],
            ValueKind::list_of(ValueKind::String),
            |v, args| {
                let separator = text_arg(args, 0)?;
                let parts = text(v)?.split(separator).map(Value::from);
                Ok(Value::list(parts))
            },
        )
        .build()
});

pub static LIST: LazyLock<Arc<TypeInfo>> = LazyLock::new(|| {
    TypeInfo::primitive("List")
        .field_fn("length", I32, |v| Ok(Value::from(items(v)?.len() as i32)))
        .field_fn("count", I32, |v| Ok(Value::from(items(v)?.len() as i32)))
        .field_fn("first", ValueKind::Any, |v| Ok(items(v)?.first().cloned().unwrap_or_default()))
        .field_fn("last", ValueKind::Any, |v| Ok(items(v)?.last().cloned().unwrap_or_default()))
        .method_fn("contains", &[ValueKind::Any], ValueKind::Bool, |v, args| {
            let needle = args.first().cloned().unwrap_or_default();
            Ok(Value::from(items(v)?.iter().any(|item| equals(item, &needle))))
        })
        .method_fn("join", &[ValueKind::String], ValueKind::String, |v, args| {
            let separator = text_arg(args, 0)?;
            let parts: Vec<String> = items(v)?.iter().map(stringify).collect();
            Ok(Value::from(parts.join(separator)))
        })
        .build()
});

/// Built-in descriptor for values of `kind`, if it has members.
pub fn type_of(kind: &ValueKind) -> Option<&'static Arc<TypeInfo>> {
    match kind {
        ValueKind::String => Some(&*STRING),
        ValueKind::List(_) => Some(&*LIST),
        _ => None,
    }
}
