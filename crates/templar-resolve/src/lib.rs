// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Name resolution and expression compilation for templar.
//!
//! Expressions are compiled against a [`ScopeStack`] that mirrors the
//! runtime context stack, and a [`ResolverChain`] that answers member
//! lookups. The result is a [`CompiledExpr`]: a reusable closure plus the
//! static kind it produces.

pub mod compile;
pub mod expr;
pub mod options;
pub mod resolver;
pub mod scope;

pub use compile::{ExprCompiler, Unresolved};
pub use expr::CompiledExpr;
pub use options::CompileOptions;
pub use resolver::{MemberResolver, NameRequest, NameResolver, ResolverChain};
pub use scope::{Binder, BinderKind, Binding, Fragment, Origin, ScopeFrame, ScopeStack};

use templar_ast::{CompileError, SourceFile};
use templar_runtime::ValueKind;

/// Compile a standalone expression.
///
/// `context` is the static kind of the value the expression will be
/// evaluated against; `None` defers every member lookup to runtime.
/// Errors come back located against `text`.
pub fn compile(
    text: &str,
    resolvers: &ResolverChain,
    options: &CompileOptions,
    context: Option<ValueKind>,
) -> Result<CompiledExpr, CompileError> {
    let scope = ScopeStack::new(context.unwrap_or(ValueKind::Any));
    ExprCompiler::new(&scope, resolvers, options)
        .compile_source(text, 0)
        .map_err(|e| e.locate(&SourceFile::new(text.to_string())))
}
