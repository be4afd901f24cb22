//! Foundation types shared by every compiler stage.

pub mod numeric;
pub mod ops;
pub mod span;

pub use numeric::{FloatKind, IntKind};
pub use ops::{BinaryOp, UnaryOp};
pub use span::{SourceFile, Span};
