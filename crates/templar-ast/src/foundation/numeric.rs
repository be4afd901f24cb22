//! Numeric kinds shared by literals, the value model and coercion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integral kind of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
}

/// Floating-point kind of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FloatKind {
    F32,
    F64,
}

impl IntKind {
    /// Width in bits.
    pub fn bits(self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8 => 8,
            IntKind::I16 | IntKind::U16 => 16,
            IntKind::I32 | IntKind::U32 => 32,
            IntKind::I64 | IntKind::U64 => 64,
            IntKind::I128 => 128,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64 | IntKind::I128
        )
    }

    /// Signed kind of the given width, if one exists.
    pub fn signed_of_bits(bits: u32) -> Option<IntKind> {
        match bits {
            8 => Some(IntKind::I8),
            16 => Some(IntKind::I16),
            32 => Some(IntKind::I32),
            64 => Some(IntKind::I64),
            128 => Some(IntKind::I128),
            _ => None,
        }
    }

    pub fn min_value(self) -> i128 {
        match self {
            IntKind::I128 => i128::MIN,
            k if k.is_signed() => -(1i128 << (k.bits() - 1)),
            _ => 0,
        }
    }

    pub fn max_value(self) -> i128 {
        match self {
            IntKind::I128 => i128::MAX,
            k if k.is_signed() => (1i128 << (k.bits() - 1)) - 1,
            k => (1i128 << k.bits()) - 1,
        }
    }

    pub fn contains(self, value: i128) -> bool {
        value >= self.min_value() && value <= self.max_value()
    }

    /// Truncate `value` to this kind with two's complement wrap-around.
    pub fn wrap(self, value: i128) -> i128 {
        let bits = self.bits();
        if bits == 128 {
            return value;
        }
        let mask = (1i128 << bits) - 1;
        let low = value & mask;
        if self.is_signed() && low >> (bits - 1) & 1 == 1 {
            low - (1i128 << bits)
        } else {
            low
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntKind::I8 => "i8",
            IntKind::I16 => "i16",
            IntKind::I32 => "i32",
            IntKind::I64 => "i64",
            IntKind::I128 => "i128",
            IntKind::U8 => "u8",
            IntKind::U16 => "u16",
            IntKind::U32 => "u32",
            IntKind::U64 => "u64",
        }
    }
}

impl FloatKind {
    /// Round `value` to this kind's precision.
    pub fn round(self, value: f64) -> f64 {
        match self {
            FloatKind::F32 => value as f32 as f64,
            FloatKind::F64 => value,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FloatKind::F32 => "f32",
            FloatKind::F64 => "f64",
        }
    }
}

impl fmt::Display for IntKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for FloatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert_eq!(IntKind::I8.min_value(), -128);
        assert_eq!(IntKind::I8.max_value(), 127);
        assert_eq!(IntKind::U16.max_value(), 65535);
        assert_eq!(IntKind::U64.max_value(), u64::MAX as i128);
        assert!(IntKind::I32.contains(-5));
        assert!(!IntKind::U32.contains(-1));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(IntKind::I8.wrap(128), -128);
        assert_eq!(IntKind::U8.wrap(256), 0);
        assert_eq!(IntKind::U8.wrap(-1), 255);
        assert_eq!(IntKind::I32.wrap(i32::MAX as i128 + 1), i32::MIN as i128);
        assert_eq!(IntKind::I128.wrap(42), 42);
    }

    #[test]
    fn test_f32_rounding() {
        assert_eq!(FloatKind::F32.round(0.1), 0.1f32 as f64);
        assert_eq!(FloatKind::F64.round(0.1), 0.1);
    }
}
