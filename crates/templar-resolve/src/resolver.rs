//! Pluggable name resolution.
//!
//! The expression compiler hands every "name on a receiver" question to a
//! [`ResolverChain`]. User resolvers run first and may intercept or extend
//! resolution; the default [`MemberResolver`] runs last and reads host
//! fields, static members, built-in members and dynamic variables.

use crate::expr::CompiledExpr;
use std::sync::Arc;
use templar_ast::{CompileError, Span};
use templar_runtime::{RenderError, Value, ValueKind, builtins, dynamic};
use tracing::trace;

/// A name to resolve against a receiver expression.
pub struct NameRequest<'a> {
    /// `$0` for bare names, the target for member access.
    pub receiver: &'a CompiledExpr,
    pub name: &'a str,
    /// Dotted prefix the receiver was written as, e.g. `a.b` for `a.b.c`.
    pub qualifier: Option<&'a str>,
    pub span: Span,
    pub case_sensitive: bool,
    pub strict: bool,
}

/// One link of the resolver chain.
pub trait NameResolver: Send + Sync {
    /// `Ok(None)` passes the request to the next resolver.
    fn resolve(&self, request: &NameRequest<'_>) -> Result<Option<CompiledExpr>, CompileError>;
}

impl<F> NameResolver for F
where
    F: Fn(&NameRequest<'_>) -> Result<Option<CompiledExpr>, CompileError> + Send + Sync,
{
    fn resolve(&self, request: &NameRequest<'_>) -> Result<Option<CompiledExpr>, CompileError> {
        self(request)
    }
}

/// User resolvers in registration order, then [`MemberResolver`].
#[derive(Clone)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn NameResolver>>,
}

impl Default for ResolverChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverChain {
    pub fn new() -> Self {
        Self {
            resolvers: vec![Arc::new(MemberResolver)],
        }
    }

    /// Add a resolver ahead of the default member lookup.
    pub fn push(&mut self, resolver: Arc<dyn NameResolver>) {
        let at = self.resolvers.len() - 1;
        self.resolvers.insert(at, resolver);
    }

    pub fn with(mut self, resolver: impl NameResolver + 'static) -> Self {
        self.push(Arc::new(resolver));
        self
    }

    pub fn resolve(&self, request: &NameRequest<'_>) -> Result<Option<CompiledExpr>, CompileError> {
        for resolver in &self.resolvers {
            if let Some(expr) = resolver.resolve(request)? {
                return Ok(Some(expr));
            }
        }
        Ok(None)
    }
}

/// Default resolution against the receiver's kind.
pub struct MemberResolver;

impl MemberResolver {
    fn late_bound(request: &NameRequest<'_>) -> CompiledExpr {
        let receiver = request.receiver.eval.clone();
        let name = request.name.to_string();
        let case_sensitive = request.case_sensitive;
        let strict = request.strict;
        CompiledExpr::new(ValueKind::Any, move |env| {
            let target = receiver(env)?;
            match dynamic::member(&target, &name, case_sensitive)? {
                Some(value) => Ok(value),
                None if strict => Err(RenderError::UnresolvedName { name: name.clone() }.into()),
                None => Ok(Value::from("")),
            }
        })
    }
}

impl NameResolver for MemberResolver {
    fn resolve(&self, request: &NameRequest<'_>) -> Result<Option<CompiledExpr>, CompileError> {
        let kind = &request.receiver.kind;
        if matches!(kind, ValueKind::Any | ValueKind::Null) {
            trace!(name = request.name, "late-bound member");
            return Ok(Some(Self::late_bound(request)));
        }
        let info = match kind {
            ValueKind::Object(info) => info.clone(),
            other => match builtins::type_of(other) {
                Some(info) => info.clone(),
                None => return Ok(None),
            },
        };
        let receiver = request.receiver.eval.clone();

        if let Some(field) = info.field(request.name, request.case_sensitive) {
            trace!(name = request.name, "field");
            let field = field.clone();
            return Ok(Some(CompiledExpr::new(field.kind.clone(), move |env| {
                let target = receiver(env)?;
                if target.is_null() {
                    return Ok(Value::Null);
                }
                Ok(field.get(&target)?)
            })));
        }

        if let Some(member) = info.static_member(request.name, request.case_sensitive) {
            trace!(name = request.name, "static member");
            return Ok(Some(CompiledExpr::constant(member.value.clone())));
        }

        if info.is_dynamic() {
            let declared = info.variable_kind(request.name, request.case_sensitive).cloned();
            // Undeclared names on a dynamic object only resolve when lenient.
            let Some(kind) = declared.or_else(|| (!request.strict).then_some(ValueKind::Any)) else {
                return Ok(None);
            };
            trace!(name = request.name, %kind, "dynamic variable");
            let name = request.name.to_string();
            let case_sensitive = request.case_sensitive;
            return Ok(Some(CompiledExpr::new(kind, move |env| {
                let target = receiver(env)?;
                Ok(dynamic::member(&target, &name, case_sensitive)?.unwrap_or_default())
            })));
        }

        Ok(None)
    }
}
