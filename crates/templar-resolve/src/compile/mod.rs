//! Expression compiler.
//!
//! Turns a parsed [`Expr`] into a [`CompiledExpr`]: a closure tree that is
//! built once and invoked many times. Names are resolved while compiling,
//! against the scope stack (locals), the resolver chain (members of the
//! receiver), the type registry (static members) and the implied
//! namespaces. Operators get their result kind from the same coercion
//! rules the runtime applies.
//!
//! # Unresolved names
//!
//! Strict compilation turns an unresolved name into
//! [`ErrorKind::UndefinedName`]; lenient compilation substitutes the
//! constant empty string. Receivers whose kind is only known at runtime
//! follow the same policy when the lookup happens.

mod calls;
mod literals;
mod members;
mod operators;

use crate::expr::CompiledExpr;
use crate::options::CompileOptions;
use crate::resolver::ResolverChain;
use crate::scope::ScopeStack;
use templar_ast::{CompileError, CompileResult, ErrorKind, Expr, ExprKind, Span};
use templar_parser::parse_expression;

/// What to do with a name nothing resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    Fail,
    Empty,
}

/// Compiles expressions against a scope stack.
pub struct ExprCompiler<'a> {
    scope: &'a ScopeStack,
    resolvers: &'a ResolverChain,
    options: &'a CompileOptions,
    namespaces: &'a [String],
    unresolved: Unresolved,
}

impl<'a> ExprCompiler<'a> {
    pub fn new(scope: &'a ScopeStack, resolvers: &'a ResolverChain, options: &'a CompileOptions) -> Self {
        Self {
            scope,
            resolvers,
            options,
            namespaces: &options.implied_namespaces,
            unresolved: if options.strict {
                Unresolved::Fail
            } else {
                Unresolved::Empty
            },
        }
    }

    /// Replace the implied namespaces (options plus `#using`).
    pub fn with_namespaces(mut self, namespaces: &'a [String]) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn with_unresolved(mut self, policy: Unresolved) -> Self {
        self.unresolved = policy;
        self
    }

    /// Parse and compile `text`, which starts at `base` in the top-level
    /// source.
    pub fn compile_source(&self, text: &str, base: u32) -> CompileResult<CompiledExpr> {
        let expr = parse_expression(text, base)?;
        self.compile(&expr)
    }

    pub fn compile(&self, expr: &Expr) -> CompileResult<CompiledExpr> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Literal(literal) => literals::compile_literal(literal, span),
            ExprKind::Name(name) => self.compile_name(name, span),
            ExprKind::Context(n) => self.compile_context(*n, span),
            ExprKind::Member { .. } => self.compile_member(expr),
            ExprKind::Index { target, index } => self.compile_index(target, index, span),
            ExprKind::Call { callee, args } => self.compile_call(callee, args, span),
            ExprKind::Unary { op, operand } => self.compile_unary(*op, operand, span),
            ExprKind::Binary { op, left, right } => self.compile_binary(*op, left, right, span),
            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => self.compile_conditional(condition, then_branch, else_branch.as_deref(), span),
        }
    }

    fn case_sensitive(&self) -> bool {
        self.options.case_sensitive
    }

    fn strict(&self) -> bool {
        self.unresolved == Unresolved::Fail
    }

    /// Apply the unresolved-name policy.
    fn unresolved(&self, error: CompileError) -> CompileResult<CompiledExpr> {
        match self.unresolved {
            Unresolved::Fail => Err(error),
            Unresolved::Empty => Ok(CompiledExpr::empty()),
        }
    }
}

// === Error Helpers ===

pub(crate) fn err_undefined(span: Span, message: impl Into<String>) -> CompileError {
    CompileError::new(ErrorKind::UndefinedName, span, message.into())
}

pub(crate) fn err_type_mismatch(span: Span, message: impl Into<String>) -> CompileError {
    CompileError::new(ErrorKind::TypeMismatch, span, message.into())
}
