//! Number formatting mode.
//!
//! Stringifying numbers consults a thread-local [`NumberFormat`]. Template
//! invocation pins its configured format for the duration of the call with
//! [`pin`]; the returned guard restores the previous format when dropped, so
//! every exit path (success, failure, unwinding) leaves the thread as it was.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::marker::PhantomData;
use templar_ast::FloatKind;

/// Separators used when numbers are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormat {
    pub decimal_separator: char,
    /// Thousands separator for the integral digits, if any.
    pub group_separator: Option<char>,
}

impl NumberFormat {
    /// `.` decimal separator, no grouping.
    pub const INVARIANT: NumberFormat = NumberFormat {
        decimal_separator: '.',
        group_separator: None,
    };

    pub fn is_invariant(&self) -> bool {
        *self == Self::INVARIANT
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::INVARIANT
    }
}

thread_local! {
    static ACTIVE: Cell<NumberFormat> = const { Cell::new(NumberFormat::INVARIANT) };
}

/// Restores the previously active format on drop.
#[must_use = "the format is restored as soon as the guard is dropped"]
pub struct FormatGuard {
    previous: NumberFormat,
    // Tied to the thread whose format it replaced.
    _not_send: PhantomData<*const ()>,
}

impl Drop for FormatGuard {
    fn drop(&mut self) {
        ACTIVE.with(|cell| cell.set(self.previous));
    }
}

/// Make `format` the active format on this thread until the guard drops.
pub fn pin(format: NumberFormat) -> FormatGuard {
    let previous = ACTIVE.with(|cell| cell.replace(format));
    FormatGuard {
        previous,
        _not_send: PhantomData,
    }
}

pub fn active() -> NumberFormat {
    ACTIVE.with(Cell::get)
}

/// Insert the group separator into a run of ASCII digits.
fn group(digits: &str, separator: Option<char>) -> String {
    let Some(sep) = separator else {
        return digits.to_string();
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

fn apply(text: &str, format: NumberFormat) -> String {
    if format.is_invariant() {
        return text.to_string();
    }
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    // Exponent forms keep their digits untouched apart from the separator.
    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(at) => rest.split_at(at),
        None => (rest, ""),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (mantissa, None),
    };
    let mut out = String::from(sign);
    out.push_str(&group(int_part, format.group_separator));
    if let Some(frac) = frac_part {
        out.push(format.decimal_separator);
        out.push_str(frac);
    }
    out.push_str(exponent);
    out
}

pub fn format_int(value: i128) -> String {
    apply(&value.to_string(), active())
}

/// Shortest round-trip text of a float at the precision of `kind`.
pub fn format_float(value: f64, kind: FloatKind) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let text = match kind {
        FloatKind::F32 => (value as f32).to_string(),
        FloatKind::F64 => value.to_string(),
    };
    apply(&text, active())
}
