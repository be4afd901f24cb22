//! `#block` and `#using`

use crate::compiler::Compiler;
use crate::registry::{BodyRule, Directive, Invocation};
use crate::template::Step;
use templar_ast::CompileResult;
use templar_parser::parse_namespace;
use templar_resolve::BinderKind;
use tracing::debug;

/// A declaration scope. Names defined or undefined inside revert when the
/// block ends. With an argument, the block also switches the context to
/// the argument's value.
pub struct Block;

impl Directive for Block {
    fn name(&self) -> &str {
        "block"
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::Nested
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        let context = if invocation.args().is_empty() {
            None
        } else {
            Some(cx.expression(invocation.args(), invocation.args_span())?)
        };
        let kind = context.as_ref().map_or_else(|| cx.context_kind(), |expr| expr.kind.clone());
        let Some(section) = invocation.sections().first() else {
            return Err(invocation.error("'#block' requires a body"));
        };
        let body = cx.with_frame(kind, BinderKind::Declarations, |cx, _| cx.compile_section(section))?;

        let context = context.map(|expr| expr.eval);
        Ok(Step::render(move |env| {
            let value = match &context {
                Some(eval) => eval(env)?,
                None => env.context(0),
            };
            env.with_context(value, |env| body.run(env))
        }))
    }
}

/// Adds an implied namespace for the rest of the compilation.
pub struct Using;

impl Directive for Using {
    fn name(&self) -> &str {
        "using"
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::None
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        if invocation.args().is_empty() {
            return Err(invocation.error("'#using' requires a namespace"));
        }
        let (namespace, _) = cx.parse_with(parse_namespace, invocation.args(), invocation.args_span())?;
        debug!(%namespace, "using namespace");
        cx.add_namespace(namespace);
        Ok(Step::empty())
    }
}
