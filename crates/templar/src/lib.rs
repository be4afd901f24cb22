// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! templar: a compiling text-template engine.
//!
//! Templates mix literal text with `$$`-delimited regions:
//!
//! ```text
//! Dear $$name$$,
//! $$#each orders$$- $$id$$: $$total$$
//! $$#else$$(no orders)
//! $$/each$$
//! ```
//!
//! A template is compiled once into a [`Template`], a tree of closures that
//! renders against any number of contexts without re-parsing. Directives
//! (`#if`, `#each`, `#define`, ...) are pluggable through the
//! [`Registry`].
//!
//! - [`scan`]: marker scanning and directive boundary search
//! - [`registry`]: the [`Directive`] contract and its registry
//! - [`compiler`]: the template compiler directives call back into
//! - [`directives`]: the built-in directives
//! - [`engine`]: entry points, including fixpoint rendering

pub mod compiler;
pub mod directives;
pub mod engine;
pub mod error;
pub mod options;
pub mod registry;
pub mod scan;
pub mod template;

pub use compiler::Compiler;
pub use engine::{Engine, PragmaHandler, PragmaOutcome, render, render_until_stable};
pub use error::{Error, Result};
pub use options::{MAX_PASSES, Options};
pub use registry::{BodyRule, Directive, Invocation, Registry, RegistryBuilder};
pub use template::{Body, Step, Template};

pub use templar_ast::{CompileError, CompileResult, ErrorKind, FloatKind, IntKind, SourceFile, Span};
pub use templar_resolve::{
    CompileOptions, CompiledExpr, NameRequest, NameResolver, ResolverChain, compile as compile_expression,
};
pub use templar_runtime::{
    DynamicVariables, EnumInfo, HostObject, NumberFormat, Output, Record, RenderError, TypeInfo, TypeRegistry, Value,
    ValueKind,
};
