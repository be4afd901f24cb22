//! Calls: host methods (instance and static), function values and
//! `#define` fragments.

use super::members::Head;
use super::{ExprCompiler, err_type_mismatch, err_undefined};
use crate::expr::CompiledExpr;
use crate::resolver::NameRequest;
use crate::scope::{Binding, Fragment};
use std::sync::Arc;
use templar_ast::{CompileError, CompileResult, ErrorKind, Expr, ExprKind, Span};
use templar_runtime::overload::{self, Selection};
use templar_runtime::{Eval, Method, RenderError, StaticType, TypeInfo, Value, ValueKind, builtins, dynamic};
use tracing::trace;

fn eval_all(args: &[Eval], env: &mut templar_runtime::Env<'_>) -> templar_runtime::Flow<Vec<Value>> {
    args.iter().map(|arg| arg(env)).collect()
}

fn signatures<'m>(methods: impl IntoIterator<Item = &'m Method>) -> String {
    methods
        .into_iter()
        .map(Method::signature)
        .collect::<Vec<_>>()
        .join(", ")
}

fn no_overload(candidates: &[&Method], name: &str, args: &[CompiledExpr], span: Span) -> CompileError {
    let found: Vec<String> = args.iter().map(|a| a.kind.to_string()).collect();
    err_type_mismatch(
        span,
        format!(
            "no overload of '{}' accepts ({}); candidates: {}",
            name,
            found.join(", "),
            signatures(candidates.iter().copied())
        ),
    )
}

impl ExprCompiler<'_> {
    pub(super) fn compile_call(&self, callee: &Expr, args: &[Expr], span: Span) -> CompileResult<CompiledExpr> {
        if let Some(path) = callee.as_path()
            && path.len() > 1
            && let Some((Head::Type(ty), consumed)) = self.resolve_head(&path)?
            && consumed == path.len() - 1
        {
            let (name, name_span) = path[consumed];
            let args = self.compile_args(args)?;
            return self.call_static(&ty, name, name_span, args, span);
        }

        match &callee.kind {
            ExprKind::Name(name) => {
                let args = self.compile_args(args)?;
                self.call_name(name, callee.span, args, span)
            }
            ExprKind::Member {
                target,
                name,
                name_span,
            } => {
                let receiver = self.compile(target)?;
                let args = self.compile_args(args)?;
                self.call_method(receiver, name, *name_span, args, span)
            }
            _ => {
                let callee = self.compile(callee)?;
                let args = self.compile_args(args)?;
                self.call_value(callee, "expression", args, span)
            }
        }
    }

    fn compile_args(&self, args: &[Expr]) -> CompileResult<Vec<CompiledExpr>> {
        args.iter().map(|arg| self.compile(arg)).collect()
    }

    /// `name(args)`: a fragment, a method of `$0`, or a function value.
    fn call_name(&self, name: &str, name_span: Span, args: Vec<CompiledExpr>, span: Span) -> CompileResult<CompiledExpr> {
        if let Some((_, binding)) = self.scope.lookup(name, self.case_sensitive()) {
            match binding {
                Binding::Fragment(fragment) => return self.call_fragment(fragment, args, span),
                Binding::Hidden => {}
                _ => {
                    let callee = self.compile_name(name, name_span)?;
                    return self.call_value(callee, name, args, span);
                }
            }
        }
        self.call_method(self.receiver(), name, name_span, args, span)
    }

    /// `receiver.name(args)` with overloads chosen from the static argument
    /// kinds. When no overload of that name takes these arguments, the name
    /// is resolved as a member holding a function.
    fn call_method(
        &self,
        receiver: CompiledExpr,
        name: &str,
        name_span: Span,
        args: Vec<CompiledExpr>,
        span: Span,
    ) -> CompileResult<CompiledExpr> {
        if matches!(receiver.kind, ValueKind::Any | ValueKind::Null) {
            trace!(name, "late-bound call");
            return Ok(self.late_call(receiver, name, args));
        }

        let info: Option<Arc<TypeInfo>> = match &receiver.kind {
            ValueKind::Object(info) => Some(info.clone()),
            other => builtins::type_of(other).cloned(),
        };
        let mut mismatch = None;
        if let Some(info) = info
            && info.has_method(name, self.case_sensitive())
        {
            let candidates: Vec<&Method> = info.methods_named(name, self.case_sensitive()).collect();
            match self.select(&candidates, name, &args, span)? {
                Some(method) => return self.invoke_method(Some(receiver), method, args, span),
                None => {
                    trace!(name, "no applicable overload, trying members");
                    mismatch = Some(no_overload(&candidates, name, &args, span));
                }
            }
        }

        let request = NameRequest {
            receiver: &receiver,
            name,
            qualifier: None,
            span: name_span,
            case_sensitive: self.case_sensitive(),
            strict: self.strict(),
        };
        match (self.resolvers.resolve(&request)?, mismatch) {
            (Some(callee), _) => self.call_value(callee, name, args, span),
            (None, Some(mismatch)) => Err(mismatch),
            (None, None) => self.unresolved(err_undefined(
                name_span,
                format!("'{}' has no method '{}'", receiver.kind, name),
            )),
        }
    }

    fn late_call(&self, receiver: CompiledExpr, name: &str, args: Vec<CompiledExpr>) -> CompiledExpr {
        let target = receiver.eval;
        let args: Vec<Eval> = args.into_iter().map(|a| a.eval).collect();
        let name = name.to_string();
        let case_sensitive = self.case_sensitive();
        let strict = self.strict();
        CompiledExpr::new(ValueKind::Any, move |env| {
            let target = target(env)?;
            let values = eval_all(&args, env)?;
            match dynamic::invoke(&target, &name, &values, case_sensitive) {
                Err(RenderError::UnresolvedName { .. }) if !strict => Ok(Value::from("")),
                result => Ok(result?),
            }
        })
    }

    /// Best overload for the argument kinds; `None` when no candidate of
    /// matching arity accepts them.
    fn select(
        &self,
        candidates: &[&Method],
        name: &str,
        args: &[CompiledExpr],
        span: Span,
    ) -> CompileResult<Option<Method>> {
        let kinds: Vec<ValueKind> = args.iter().map(|a| a.kind.clone()).collect();
        match overload::select(candidates.iter().copied(), &kinds) {
            Selection::Exact(method) | Selection::Converted(method) => Ok(Some(method.clone())),
            Selection::Ambiguous(methods) => Err(CompileError::new(
                ErrorKind::AmbiguousOverload,
                span,
                format!(
                    "call to '{}' is ambiguous between {}",
                    name,
                    signatures(methods)
                ),
            )),
            Selection::None => Ok(None),
        }
    }

    /// Invoke a selected method. A null receiver short-circuits to null for
    /// instance methods.
    fn invoke_method(
        &self,
        receiver: Option<CompiledExpr>,
        method: Method,
        args: Vec<CompiledExpr>,
        span: Span,
    ) -> CompileResult<CompiledExpr> {
        let args: Vec<Eval> = args
            .into_iter()
            .zip(&method.params)
            .map(|(arg, param)| arg.coerce_to(param, span).map(|a| a.eval))
            .collect::<CompileResult<_>>()?;
        let target = receiver.map(|r| r.eval);
        let kind = method.returns.clone();
        Ok(CompiledExpr::new(kind, move |env| {
            let target = match &target {
                Some(target) => target(env)?,
                None => Value::Null,
            };
            if target.is_null() && !method.is_static {
                return Ok(Value::Null);
            }
            let values = eval_all(&args, env)?;
            Ok(method.invoke(&target, &values)?)
        }))
    }

    /// `Type.name(args)` against a registered type.
    fn call_static(
        &self,
        ty: &StaticType,
        name: &str,
        name_span: Span,
        args: Vec<CompiledExpr>,
        span: Span,
    ) -> CompileResult<CompiledExpr> {
        if let StaticType::Type(info) = ty {
            let case_sensitive = self.case_sensitive();
            let statics: Vec<&Method> = info
                .methods_named(name, case_sensitive)
                .filter(|m| m.is_static)
                .collect();
            if let Some(method) = self.select(&statics, name, &args, span)? {
                return self.invoke_method(None, method, args, span);
            }
            if let Some(member) = info.static_member(name, case_sensitive) {
                let callee = CompiledExpr::constant(member.value.clone());
                return self.call_value(callee, name, args, span);
            }
            if !statics.is_empty() {
                return Err(no_overload(&statics, name, &args, span));
            }
        }
        self.unresolved(err_undefined(
            name_span,
            format!("type '{}' has no static method '{}'", ty.full_name(), name),
        ))
    }

    /// Call a value of function kind, or of a kind only known at runtime.
    fn call_value(&self, callee: CompiledExpr, name: &str, args: Vec<CompiledExpr>, span: Span) -> CompileResult<CompiledExpr> {
        if !matches!(callee.kind, ValueKind::Function | ValueKind::Any | ValueKind::Null) {
            return Err(err_type_mismatch(
                span,
                format!("'{}' of kind '{}' cannot be called", name, callee.kind),
            ));
        }
        let function = callee.eval;
        let args: Vec<Eval> = args.into_iter().map(|a| a.eval).collect();
        let name = name.to_string();
        Ok(CompiledExpr::new(ValueKind::Any, move |env| {
            let callee = function(env)?;
            if callee.is_null() {
                return Ok(Value::Null);
            }
            let values = eval_all(&args, env)?;
            Ok(dynamic::call(&callee, &name, &values)?)
        }))
    }

    /// Invoke a fragment: evaluate the arguments in the caller's contexts,
    /// then render the body against the contexts captured when its
    /// `#define` ran. The result is the text of the `#out` part.
    pub(super) fn call_fragment(
        &self,
        fragment: Arc<Fragment>,
        args: Vec<CompiledExpr>,
        span: Span,
    ) -> CompileResult<CompiledExpr> {
        if args.len() != fragment.params.len() {
            return Err(err_type_mismatch(
                span,
                format!(
                    "'{}' takes {} argument(s), {} given",
                    fragment.name,
                    fragment.params.len(),
                    args.len()
                ),
            ));
        }
        let args: Vec<Eval> = args.into_iter().map(|a| a.eval).collect();
        Ok(CompiledExpr::new(ValueKind::String, move |env| {
            let Value::List(contexts) = env.slot(fragment.snapshot) else {
                return Err(RenderError::NotInvocable {
                    name: fragment.name.clone(),
                    reason: "called before its definition ran".to_string(),
                }
                .into());
            };
            let values = eval_all(&args, env)?;
            for (&slot, value) in fragment.params.iter().zip(values) {
                env.set_slot(slot, value);
            }
            let innermost = contexts.last().cloned().unwrap_or_default();
            let text = env.with_contexts(contexts.to_vec(), |env| {
                env.with_context(innermost, |env| {
                    if let Some(compute) = &fragment.compute {
                        env.capture(|env| compute(env))?;
                    }
                    env.capture(|env| (fragment.emit)(env))
                })
            })?;
            Ok(Value::from(text))
        }))
    }
}
