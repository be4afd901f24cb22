//! `#let`, `#define` and `#undef`
//!
//! `let` binds names for the extent of its body only. `define` binds a
//! name in the nearest declaration frame (a `block` or the root) so it
//! stays visible after the directive; on a dynamic root the value is also
//! written through to the context's variables. `undef` removes a define
//! again, or hides it until the end of the current block when the define
//! belongs to an enclosing one.

use super::{err_scope, err_syntax, split_on};
use crate::compiler::Compiler;
use crate::registry::{BodyRule, Directive, Invocation};
use crate::template::{Body, Step};
use std::sync::Arc;
use templar_ast::{CompileResult, Span};
use templar_parser::{DefineForm, parse_define_head, parse_let_bindings, parse_variable_name};
use templar_resolve::{BinderKind, Binding, CompiledExpr, Fragment, Origin, Unresolved};
use templar_runtime::{Env, Flow, Value, ValueKind};
use tracing::debug;

/// Most parameters a fragment may declare.
pub const MAX_PARAMS: usize = 5;

fn already_let_bound(cx: &Compiler<'_>, name: &str, span: Span) -> CompileResult<()> {
    if cx.scope().let_owner(name, cx.case_sensitive()).is_some() {
        return Err(err_scope(span, format!("'{}' is already bound in a let context", name)));
    }
    Ok(())
}

fn same_name(cx: &Compiler<'_>, a: &str, b: &str) -> bool {
    if cx.case_sensitive() {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}

// === let ===

pub struct Let;

impl Directive for Let {
    fn name(&self) -> &str {
        "let"
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::Nested
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        if invocation.args().is_empty() {
            return Err(invocation.error("'#let' requires at least one binding"));
        }
        let bindings = cx.parse_with(parse_let_bindings, invocation.args(), invocation.args_span())?;
        for (i, binding) in bindings.iter().enumerate() {
            already_let_bound(cx, &binding.name, binding.name_span)?;
            if bindings[..i].iter().any(|b| same_name(cx, &b.name, &binding.name)) {
                return Err(err_scope(
                    binding.name_span,
                    format!("'{}' is bound twice in the same let", binding.name),
                ));
            }
        }

        // Values see the scope as it was before any of the new names.
        let values = bindings
            .iter()
            .map(|binding| cx.compile(&binding.value))
            .collect::<CompileResult<Vec<CompiledExpr>>>()?;

        let Some(section) = invocation.sections().first() else {
            return Err(invocation.error("'#let' requires a body"));
        };
        let context = cx.context_kind();
        let (slots, body) = cx.with_frame(context, BinderKind::Let, |cx, frame| {
            let mut slots = Vec::with_capacity(bindings.len());
            for (binding, value) in bindings.iter().zip(&values) {
                let slot = cx.scope_mut().allocate_slot();
                cx.scope_mut().declare(
                    frame,
                    binding.name.clone(),
                    Binding::Slot {
                        slot,
                        kind: value.kind.clone(),
                        origin: Origin::Let,
                    },
                );
                slots.push(slot);
            }
            Ok((slots, cx.compile_section(section)?))
        })?;

        let values: Vec<_> = values.into_iter().map(|value| value.eval).collect();
        Ok(Step::render(move |env| {
            let mut evaluated = Vec::with_capacity(values.len());
            for value in &values {
                evaluated.push(value(env)?);
            }
            for (&slot, value) in slots.iter().zip(evaluated) {
                env.set_slot(slot, value);
            }
            let context = env.context(0);
            env.with_context(context, |env| body.run(env))
        }))
    }
}

// === define ===

pub struct Define;

impl Directive for Define {
    fn name(&self) -> &str {
        "define"
    }

    fn reserved_words(&self) -> &[&'static str] {
        &["out"]
    }

    /// `name = expr` stands alone; every other form has a body.
    fn body(&self, args: &str) -> BodyRule {
        if args.contains('=') {
            BodyRule::None
        } else {
            BodyRule::Nested
        }
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        if invocation.args().is_empty() {
            return Err(invocation.error("'#define' requires a name"));
        }
        let head = cx.parse_with(parse_define_head, invocation.args(), invocation.args_span())?;
        already_let_bound(cx, &head.name, head.name_span)?;
        debug!(name = %head.name, "define");

        match head.form {
            DefineForm::Value { lenient, value } => {
                let expr = if lenient {
                    cx.compile_with(&value, Unresolved::Empty)?
                } else {
                    cx.compile(&value)?
                };
                Ok(bind_value(cx, head.name, expr))
            }
            DefineForm::Body { params: None } => {
                let (compute, emit) = compile_parts(cx, invocation)?;
                let eager = CompiledExpr::new(ValueKind::String, move |env| {
                    Ok(Value::from(render_parts(env, compute.as_ref(), &emit)?))
                });
                Ok(bind_value(cx, head.name, eager))
            }
            DefineForm::Body { params: Some(params) } => define_fragment(cx, invocation, head.name, params),
        }
    }
}

/// Discard the compute part's output, return the emit part's.
fn render_parts(env: &mut Env<'_>, compute: Option<&Body>, emit: &Body) -> Flow<String> {
    if let Some(compute) = compute {
        env.capture(|env| compute.run(env))?;
    }
    env.capture(|env| emit.run(env))
}

fn compile_parts(cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<(Option<Body>, Body)> {
    match split_on(invocation, "out")? {
        (body, None) => Ok((None, cx.compile_section(body)?)),
        (compute, Some(emit)) => {
            let compute = cx.compile_section(compute)?;
            Ok((Some(compute), cx.compile_section(emit)?))
        }
    }
}

/// Bind `name` to the value of `expr` in the declaration frame.
fn bind_value(cx: &mut Compiler<'_>, name: String, expr: CompiledExpr) -> Step {
    let frame = cx.scope().declaration_frame();
    let kind = expr.kind.clone();
    let eval = expr.eval;

    if cx.scope().binder_kind(frame) == Some(BinderKind::Dynamic) {
        cx.scope_mut().declare(
            frame,
            name.clone(),
            Binding::Variable {
                frame,
                name: name.clone(),
                kind,
            },
        );
        return Step::render(move |env| {
            let value = eval(env)?;
            let target = env.frame(frame);
            if let Some(vars) = target.as_object().and_then(|o| o.variables()) {
                vars.set(&name, value);
            }
            Ok(())
        });
    }

    let slot = cx.scope_mut().allocate_slot();
    cx.scope_mut().declare(
        frame,
        name,
        Binding::Slot {
            slot,
            kind,
            origin: Origin::Define,
        },
    );
    Step::render(move |env| {
        let value = eval(env)?;
        env.set_slot(slot, value);
        Ok(())
    })
}

fn define_fragment(
    cx: &mut Compiler<'_>,
    invocation: &Invocation<'_>,
    name: String,
    params: Vec<(String, Span)>,
) -> CompileResult<Step> {
    if params.len() > MAX_PARAMS {
        return Err(err_syntax(
            params[MAX_PARAMS].1,
            format!("'{}' declares {} parameters; at most {} are allowed", name, params.len(), MAX_PARAMS),
        ));
    }
    for (i, (param, span)) in params.iter().enumerate() {
        if params[..i].iter().any(|(p, _)| same_name(cx, p, param)) {
            return Err(err_syntax(*span, format!("parameter '{}' is declared twice", param)));
        }
        already_let_bound(cx, param, *span)?;
    }

    let frame = cx.scope().declaration_frame();
    let snapshot = cx.scope_mut().allocate_slot();
    let context = cx.context_kind();
    let (slots, (compute, emit)) = cx.with_frame(context, BinderKind::Parameters, |cx, params_frame| {
        let mut slots = Vec::with_capacity(params.len());
        for (param, _) in &params {
            let slot = cx.scope_mut().allocate_slot();
            cx.scope_mut().declare(
                params_frame,
                param.clone(),
                Binding::Slot {
                    slot,
                    kind: ValueKind::Any,
                    origin: Origin::Parameter,
                },
            );
            slots.push(slot);
        }
        Ok((slots, compile_parts(cx, invocation)?))
    })?;

    let fragment = Fragment {
        name: name.clone(),
        params: slots,
        snapshot,
        compute: compute.map(Body::into_render),
        emit: emit.into_render(),
    };
    cx.scope_mut().declare(frame, name, Binding::Fragment(Arc::new(fragment)));

    Ok(Step::render(move |env| {
        let contexts = Value::list(env.snapshot());
        env.set_slot(snapshot, contexts);
        Ok(())
    }))
}

// === undef ===

pub struct Undef;

impl Directive for Undef {
    fn name(&self) -> &str {
        "undef"
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::None
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        if invocation.args().is_empty() {
            return Err(invocation.error("'#undef' requires a name"));
        }
        let (name, span) = cx.parse_with(parse_variable_name, invocation.args(), invocation.args_span())?;
        let case_sensitive = cx.case_sensitive();
        let never = || err_scope(span, format!("'{}' was never defined", name));

        let Some((owner, binding)) = cx.scope().lookup(&name, case_sensitive) else {
            return Err(never());
        };
        match binding {
            Binding::Hidden => return Err(never()),
            Binding::Slot {
                origin: Origin::Let, ..
            } => {
                return Err(err_scope(span, format!("'{}' is bound by let and cannot be undefined", name)));
            }
            Binding::Slot {
                origin: Origin::Parameter,
                ..
            } => {
                return Err(err_scope(
                    span,
                    format!("'{}' is a fragment parameter and cannot be undefined", name),
                ));
            }
            Binding::Slot { .. } | Binding::Variable { .. } | Binding::Fragment(_) => {}
        }

        let current = cx.scope().declaration_frame();
        if owner != current {
            debug!(%name, owner, current, "hiding define until the end of the block");
            cx.scope_mut().declare(current, name, Binding::Hidden);
            return Ok(Step::empty());
        }

        cx.scope_mut().remove(owner, &name, case_sensitive);
        if cx.scope().binder_kind(owner) != Some(BinderKind::Dynamic) {
            return Ok(Step::empty());
        }
        // Context variables stay visible through the descriptor, so the
        // name is hidden and the variable unset when rendering gets here.
        cx.scope_mut().declare(owner, name.clone(), Binding::Hidden);
        Ok(Step::render(move |env| {
            let target = env.frame(owner);
            if let Some(vars) = target.as_object().and_then(|o| o.variables()) {
                vars.unset(&name);
            }
            Ok(())
        }))
    }
}
