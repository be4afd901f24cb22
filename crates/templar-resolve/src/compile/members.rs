//! Names, dotted paths, member access and indexing.

use super::{ExprCompiler, Unresolved, err_type_mismatch, err_undefined};
use crate::expr::CompiledExpr;
use crate::resolver::NameRequest;
use crate::scope::Binding;
use templar_ast::{CompileError, CompileResult, ErrorKind, Expr, ExprKind, Span};
use templar_runtime::coerce::convert;
use templar_runtime::{EnumValue, StaticType, Value, ValueKind, dynamic};
use tracing::trace;

/// Leading part of a dotted chain.
pub(super) enum Head {
    Value(CompiledExpr),
    Type(StaticType),
}

fn join(path: &[(&str, Span)]) -> String {
    path.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(".")
}

impl ExprCompiler<'_> {
    /// `$0` as an expression.
    pub(super) fn receiver(&self) -> CompiledExpr {
        let kind = self.scope.current().context.clone();
        CompiledExpr::new(kind, |env| Ok(env.context(0)))
    }

    pub(super) fn compile_context(&self, n: usize, span: Span) -> CompileResult<CompiledExpr> {
        let kind = self.scope.context(n).cloned().ok_or_else(|| {
            CompileError::new(
                ErrorKind::Syntax,
                span,
                format!(
                    "context ${} does not exist here; {} context(s) are in scope",
                    n,
                    self.scope.depth()
                ),
            )
        })?;
        Ok(CompiledExpr::new(kind, move |env| Ok(env.context(n))))
    }

    /// Local binding, or member of the innermost context.
    pub(super) fn try_name(&self, name: &str, span: Span) -> CompileResult<Option<CompiledExpr>> {
        if let Some((frame, binding)) = self.scope.lookup(name, self.case_sensitive()) {
            trace!(name, frame, "local binding");
            match binding {
                Binding::Slot { slot, kind, .. } => {
                    return Ok(Some(CompiledExpr::new(kind, move |env| Ok(env.slot(slot)))));
                }
                Binding::Variable { frame, name, kind } => {
                    return Ok(Some(self.variable(frame, name, kind)));
                }
                Binding::Fragment(fragment) if fragment.params.is_empty() => {
                    return self.call_fragment(fragment, Vec::new(), span).map(Some);
                }
                Binding::Fragment(fragment) => {
                    return Err(err_type_mismatch(
                        span,
                        format!(
                            "'{}' takes {} parameter(s); call it as {}(...)",
                            fragment.name,
                            fragment.params.len(),
                            fragment.name
                        ),
                    ));
                }
                Binding::Hidden => {}
            }
        }
        let receiver = self.receiver();
        self.resolvers.resolve(&NameRequest {
            receiver: &receiver,
            name,
            qualifier: None,
            span,
            case_sensitive: self.case_sensitive(),
            strict: self.strict(),
        })
    }

    /// Variable of the dynamic context at `frame`, checked against the
    /// kind it was declared with.
    fn variable(&self, frame: usize, name: String, kind: ValueKind) -> CompiledExpr {
        let case_sensitive = self.case_sensitive();
        let declared = kind.clone();
        CompiledExpr::new(kind, move |env| {
            let context = env.frame(frame);
            let value = dynamic::member(&context, &name, case_sensitive)?.unwrap_or_default();
            if value.is_null() || declared.is_any() {
                return Ok(value);
            }
            Ok(convert(value, &declared)?)
        })
    }

    pub(super) fn compile_name(&self, name: &str, span: Span) -> CompileResult<CompiledExpr> {
        match self.try_name(name, span)? {
            Some(expr) => Ok(expr),
            None => self.unresolved(err_undefined(span, format!("unresolved name '{}'", name))),
        }
    }

    pub(super) fn compile_member(&self, expr: &Expr) -> CompileResult<CompiledExpr> {
        if let Some(path) = expr.as_path() {
            return self.compile_path(&path);
        }
        let ExprKind::Member {
            target,
            name,
            name_span,
        } = &expr.kind
        else {
            return Err(CompileError::new(
                ErrorKind::Internal,
                expr.span,
                "member access expected".to_string(),
            ));
        };
        let target = self.compile(target)?;
        self.member_of(target, name, *name_span, None)
    }

    /// Resolve `name` on an already compiled receiver.
    pub(super) fn member_of(
        &self,
        receiver: CompiledExpr,
        name: &str,
        span: Span,
        qualifier: Option<&str>,
    ) -> CompileResult<CompiledExpr> {
        let request = NameRequest {
            receiver: &receiver,
            name,
            qualifier,
            span,
            case_sensitive: self.case_sensitive(),
            strict: self.strict(),
        };
        match self.resolvers.resolve(&request)? {
            Some(expr) => Ok(expr),
            None => self.unresolved(err_undefined(
                span,
                format!("'{}' has no member '{}'", receiver.kind, name),
            )),
        }
    }

    /// Resolve the leading part of a dotted chain: the longest prefix that
    /// names a registered type, else the first segment as a name, else a
    /// type found through an implied namespace. Returns the head and the
    /// number of segments it consumed.
    pub(super) fn resolve_head(&self, path: &[(&str, Span)]) -> CompileResult<Option<(Head, usize)>> {
        let (first, first_span) = path[0];
        let is_local = self
            .scope
            .lookup(first, self.case_sensitive())
            .is_some_and(|(_, binding)| !matches!(binding, Binding::Hidden));

        if !is_local && let Some((ty, consumed)) = self.static_prefix(path, None) {
            trace!(path = %join(path), ty = %ty.full_name(), "static type prefix");
            return Ok(Some((Head::Type(ty), consumed)));
        }
        // Names that only resolve leniently must not shadow namespace types.
        let policy = self.with_policy(Unresolved::Fail);
        let Some(expr) = policy.try_name(first, first_span)? else {
            return self.namespace_prefix(path);
        };
        // A late-bound member yields to a type found through a namespace.
        if expr.kind.is_any()
            && !is_local
            && let Some(head) = self.namespace_prefix(path)?
        {
            return Ok(Some(head));
        }
        Ok(Some((Head::Value(expr), 1)))
    }

    fn with_policy(&self, unresolved: Unresolved) -> ExprCompiler<'_> {
        ExprCompiler {
            scope: self.scope,
            resolvers: self.resolvers,
            options: self.options,
            namespaces: self.namespaces,
            unresolved,
        }
    }

    fn static_prefix(&self, path: &[(&str, Span)], namespace: Option<&str>) -> Option<(StaticType, usize)> {
        (1..=path.len()).rev().find_map(|k| {
            let mut full = namespace.map(|ns| format!("{}.", ns)).unwrap_or_default();
            full.push_str(&join(&path[..k]));
            self.options
                .types
                .lookup(&full, self.case_sensitive())
                .map(|ty| (ty.clone(), k))
        })
    }

    fn namespace_prefix(&self, path: &[(&str, Span)]) -> CompileResult<Option<(Head, usize)>> {
        let mut hits: Vec<(StaticType, usize)> = Vec::new();
        for namespace in self.namespaces {
            if let Some((ty, consumed)) = self.static_prefix(path, Some(namespace))
                && !hits.iter().any(|(t, _)| t.full_name() == ty.full_name())
            {
                hits.push((ty, consumed));
            }
        }
        match hits.len() {
            0 => Ok(None),
            1 => Ok(hits.pop().map(|(ty, consumed)| (Head::Type(ty), consumed))),
            _ => {
                let names: Vec<String> = hits.iter().map(|(ty, _)| ty.full_name()).collect();
                let span = path[0].1.merge(&path[path.len() - 1].1);
                Err(CompileError::new(
                    ErrorKind::AmbiguousNamespace,
                    span,
                    format!(
                        "'{}' is ambiguous between implied namespaces: {}",
                        join(path),
                        names.join(", ")
                    ),
                ))
            }
        }
    }

    /// Static member or enum variant of a type.
    fn static_value(&self, ty: &StaticType, name: &str, span: Span) -> CompileResult<CompiledExpr> {
        let found = match ty {
            StaticType::Type(info) => info
                .static_member(name, self.case_sensitive())
                .map(|member| member.value.clone()),
            StaticType::Enum(info) => info.variant(name, self.case_sensitive()).map(|value| {
                Value::Enum(EnumValue {
                    info: info.clone(),
                    value,
                })
            }),
        };
        match found {
            Some(value) => Ok(CompiledExpr::constant(value)),
            None => self.unresolved(err_undefined(
                span,
                format!("type '{}' has no static member '{}'", ty.full_name(), name),
            )),
        }
    }

    fn compile_path(&self, path: &[(&str, Span)]) -> CompileResult<CompiledExpr> {
        let (first, first_span) = path[0];
        let Some((head, mut consumed)) = self.resolve_head(path)? else {
            if path.len() == 1 {
                return self.compile_name(first, first_span);
            }
            // The first segment may still resolve leniently.
            let start = self.compile_name(first, first_span)?;
            return self.members(start, path, 1);
        };
        let current = match head {
            Head::Value(expr) => expr,
            Head::Type(ty) => {
                let Some(&(name, span)) = path.get(consumed) else {
                    let span = first_span.merge(&path[consumed - 1].1);
                    return Err(err_type_mismatch(
                        span,
                        format!("'{}' is a type, not a value", ty.full_name()),
                    ));
                };
                consumed += 1;
                self.static_value(&ty, name, span)?
            }
        };
        self.members(current, path, consumed)
    }

    fn members(&self, mut current: CompiledExpr, path: &[(&str, Span)], from: usize) -> CompileResult<CompiledExpr> {
        for i in from..path.len() {
            let (name, span) = path[i];
            let qualifier = join(&path[..i]);
            current = self.member_of(current, name, span, Some(&qualifier))?;
        }
        Ok(current)
    }

    pub(super) fn compile_index(&self, target: &Expr, index: &Expr, span: Span) -> CompileResult<CompiledExpr> {
        let target = self.compile(target)?;
        let index = self.compile(index)?;
        let kind = match &target.kind {
            ValueKind::Object(info) if info.is_dynamic() => ValueKind::Any,
            other => other.element().ok_or_else(|| {
                err_type_mismatch(span, format!("a value of kind '{}' cannot be indexed", other))
            })?,
        };
        let (t, i) = (target.eval, index.eval);
        Ok(CompiledExpr::new(kind, move |env| {
            let target = t(env)?;
            let index = i(env)?;
            Ok(dynamic::index(&target, &index)?)
        }))
    }
}
