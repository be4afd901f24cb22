//! Expression syntax tree.

pub mod expr;

pub use expr::{Expr, ExprKind, Literal};
