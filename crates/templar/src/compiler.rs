//! Template compiler.
//!
//! Walks the regions of a template, compiling expressions through the
//! expression compiler and handing every directive tag to its registered
//! [`Directive`](crate::registry::Directive). Directives recurse back into
//! [`Compiler::compile_section`] for their bodies, pushing scope frames
//! through [`Compiler::with_frame`] so the compile-time scope stack keeps
//! mirroring the runtime context stack.

use crate::engine::PragmaHandler;
use crate::options::Options;
use crate::registry::{Invocation, Registry};
use crate::scan::{self, Region, Scanner, Section};
use crate::template::{Body, Step, Template};
use std::ops::Range;
use std::sync::Arc;
use templar_ast::{CompileError, CompileResult, ErrorKind, Expr, Span};
use templar_parser::ParseError;
use templar_resolve::{BinderKind, CompileOptions, CompiledExpr, ExprCompiler, ResolverChain, ScopeStack, Unresolved};
use templar_runtime::ValueKind;
use tracing::debug;

/// State of one template compilation.
pub struct Compiler<'s> {
    source: &'s str,
    registry: &'s Registry,
    options: &'s Options,
    compile_options: CompileOptions,
    resolvers: &'s ResolverChain,
    pragma: Option<Arc<dyn PragmaHandler>>,
    scope: ScopeStack,
    /// Implied namespaces: the configured ones, then every `#using`.
    namespaces: Vec<String>,
}

impl<'s> Compiler<'s> {
    pub(crate) fn new(
        source: &'s str,
        registry: &'s Registry,
        options: &'s Options,
        compile_options: CompileOptions,
        resolvers: &'s ResolverChain,
        pragma: Option<Arc<dyn PragmaHandler>>,
        context: ValueKind,
    ) -> Self {
        let namespaces = compile_options.implied_namespaces.clone();
        Self {
            source,
            registry,
            options,
            compile_options,
            resolvers,
            pragma,
            scope: ScopeStack::new(context),
            namespaces,
        }
    }

    /// Compile the whole source into a template.
    pub(crate) fn finish(mut self) -> CompileResult<Template> {
        let body = self.compile_range(0..self.source.len())?;
        Ok(Template::new(body, self.scope.slot_count(), self.options.number_format))
    }

    // === Bodies ===

    pub fn compile_range(&mut self, range: Range<usize>) -> CompileResult<Body> {
        let mut scanner = Scanner::new(self.source, range.clone());
        let mut steps = Vec::new();
        while let Some(region) = scanner.next_region()? {
            let step = match region {
                Region::Text(text) => Step::Literal(self.source[text].to_string()),
                Region::Expr { text, span } => Step::Expr(self.expression(text, span)?.eval),
                Region::Open(tag) => {
                    let found = scan::find_body(self.source, self.registry, &tag, range.end)?;
                    if let Some(body) = &found {
                        scanner.seek(body.end);
                    }
                    self.directive(&Invocation {
                        tag,
                        body: found.map(|body| body.sections),
                    })?
                }
                Region::Close { name, span } => {
                    return Err(CompileError::new(
                        ErrorKind::Syntax,
                        span,
                        format!("unexpected terminator '$$/{}$$'", name),
                    ));
                }
            };
            steps.push(step);
        }
        Ok(Body::new(steps))
    }

    pub fn compile_section(&mut self, section: &Section<'_>) -> CompileResult<Body> {
        self.compile_range(section.range.clone())
    }

    fn directive(&mut self, invocation: &Invocation<'_>) -> CompileResult<Step> {
        let registry = self.registry;
        let Some(directive) = registry.get(invocation.name()) else {
            return Err(scan::unknown(registry, &invocation.tag));
        };
        debug!(
            directive = invocation.name(),
            offset = invocation.tag.span.start,
            sections = invocation.sections().len(),
            "compiling directive"
        );
        let depth = self.scope.depth();
        let step = directive.compile(self, invocation)?;
        if self.scope.depth() != depth {
            return Err(CompileError::new(
                ErrorKind::Internal,
                invocation.tag.span,
                format!(
                    "'#{}' left the scope stack at depth {} (expected {})",
                    invocation.name(),
                    self.scope.depth(),
                    depth
                ),
            ));
        }
        Ok(step)
    }

    /// Source text of `range`.
    pub fn text(&self, range: Range<usize>) -> &'s str {
        self.source.get(range).unwrap_or_default()
    }

    pub fn span_text(&self, span: Span) -> &'s str {
        self.text(span.start as usize..span.end as usize)
    }

    // === Expressions ===

    /// Compile expression text found at `span`.
    pub fn expression(&self, text: &str, span: Span) -> CompileResult<CompiledExpr> {
        self.expr_compiler().compile_source(text, span.start)
    }

    pub fn expression_with(&self, text: &str, span: Span, policy: Unresolved) -> CompileResult<CompiledExpr> {
        self.expr_compiler()
            .with_unresolved(policy)
            .compile_source(text, span.start)
    }

    /// Compile an already parsed expression.
    pub fn compile(&self, expr: &Expr) -> CompileResult<CompiledExpr> {
        self.expr_compiler().compile(expr)
    }

    pub fn compile_with(&self, expr: &Expr, policy: Unresolved) -> CompileResult<CompiledExpr> {
        self.expr_compiler().with_unresolved(policy).compile(expr)
    }

    /// A `Bool` condition for `#if`-style directives.
    pub fn predicate(&self, text: &str, span: Span) -> CompileResult<CompiledExpr> {
        let expr = if self.options.lenient_predicates {
            self.expression_with(text, span, Unresolved::Empty)?
        } else {
            self.expression(text, span)?
        };
        expr.coerce_to(&ValueKind::Bool, span)
    }

    /// Run one of the directive-argument parsers over `text` at `span`.
    pub fn parse_with<T>(
        &self,
        parse: impl FnOnce(&str, u32) -> Result<T, ParseError>,
        text: &str,
        span: Span,
    ) -> CompileResult<T> {
        Ok(parse(text, span.start)?)
    }

    fn expr_compiler(&self) -> ExprCompiler<'_> {
        ExprCompiler::new(&self.scope, self.resolvers, &self.compile_options).with_namespaces(&self.namespaces)
    }

    // === Scope ===

    /// Run `f` with a frame pushed; the frame is popped on every path.
    pub fn with_frame<T>(
        &mut self,
        context: ValueKind,
        kind: BinderKind,
        f: impl FnOnce(&mut Self, usize) -> CompileResult<T>,
    ) -> CompileResult<T> {
        let frame = self.scope.push(context, kind);
        let result = f(self, frame);
        self.scope.pop();
        result
    }

    pub fn scope(&self) -> &ScopeStack {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut ScopeStack {
        &mut self.scope
    }

    /// Static kind of the innermost context.
    pub fn context_kind(&self) -> ValueKind {
        self.scope.current().context.clone()
    }

    pub fn case_sensitive(&self) -> bool {
        self.options.case_sensitive
    }

    pub fn add_namespace(&mut self, namespace: String) {
        let exists = self.namespaces.iter().any(|ns| {
            if self.options.case_sensitive {
                *ns == namespace
            } else {
                ns.eq_ignore_ascii_case(&namespace)
            }
        });
        if !exists {
            self.namespaces.push(namespace);
        }
    }

    pub fn pragma_handler(&self) -> Option<Arc<dyn PragmaHandler>> {
        self.pragma.clone()
    }
}
