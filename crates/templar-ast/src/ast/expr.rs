//! Untyped expression AST produced by the parser.
//!
//! The parser produces plain syntactic structure plus spans. Kinds,
//! overloads and name bindings are decided later by the expression compiler
//! in `templar-resolve`.

use crate::foundation::{BinaryOp, FloatKind, IntKind, Span, UnaryOp};

/// Untyped expression from the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    /// Source location (top-level source offsets)
    pub span: Span,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),

    /// Bare identifier, resolved against locals then the innermost context.
    Name(String),

    /// `$N`: the N-th enclosing context, `$0` being the innermost.
    Context(usize),

    /// `target.name`
    Member {
        target: Box<Expr>,
        name: String,
        name_span: Span,
    },

    /// `target[index]`
    Index { target: Box<Expr>, index: Box<Expr> },

    /// `callee(args)`; method calls have a `Member` callee.
    Call { callee: Box<Expr>, args: Vec<Expr> },

    Unary { op: UnaryOp, operand: Box<Expr> },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `c ? a : b` and `if c a else b`; a missing else yields null.
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
}

/// Literal value with its chosen kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int { value: i128, kind: IntKind },
    Float { value: f64, kind: FloatKind },
    Str(String),
    Regex { pattern: String, flags: String },
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn literal(literal: Literal, span: Span) -> Self {
        Self::new(ExprKind::Literal(literal), span)
    }

    pub fn name(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Name(name.into()), span)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn unary(op: UnaryOp, operand: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    pub fn member(target: Expr, name: impl Into<String>, name_span: Span, span: Span) -> Self {
        Self::new(
            ExprKind::Member {
                target: Box::new(target),
                name: name.into(),
                name_span,
            },
            span,
        )
    }

    /// Segments of a pure dotted identifier chain (`a.b.c`).
    ///
    /// Returns `None` as soon as any link is not a bare name or member
    /// access, e.g. for `a().b` or `$1.b`.
    pub fn as_path(&self) -> Option<Vec<(&str, Span)>> {
        match &self.kind {
            ExprKind::Name(name) => Some(vec![(name.as_str(), self.span)]),
            ExprKind::Member {
                target,
                name,
                name_span,
            } => {
                let mut path = target.as_path()?;
                path.push((name.as_str(), *name_span));
                Some(path)
            }
            _ => None,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(Literal::Null))
    }
}
