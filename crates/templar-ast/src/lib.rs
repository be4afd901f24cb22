// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Shared front-end types for templar.
//!
//! - [`foundation`]: spans, source files, numeric kinds, operators
//! - [`error`]: `CompileError` and the diagnostic formatter
//! - [`ast`]: the untyped expression tree

pub mod ast;
pub mod error;
pub mod foundation;

pub use ast::{Expr, ExprKind, Literal};
pub use error::{CompileError, CompileResult, ErrorKind, Excerpt, Label};
pub use foundation::{BinaryOp, FloatKind, IntKind, SourceFile, Span, UnaryOp};
