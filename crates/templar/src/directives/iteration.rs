//! `#each`

use super::{err_syntax, split_on};
use crate::compiler::Compiler;
use crate::registry::{BodyRule, Directive, Invocation};
use crate::template::Step;
use templar_ast::{CompileError, CompileResult, ErrorKind};
use templar_resolve::BinderKind;
use templar_runtime::coerce::elements;

/// Renders its body once per element, with the element as the innermost
/// context. An `#else` section renders when there are no elements.
pub struct Each;

impl Directive for Each {
    fn name(&self) -> &str {
        "each"
    }

    fn reserved_words(&self) -> &[&'static str] {
        &["else"]
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::Nested
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        if invocation.args().is_empty() {
            return Err(err_syntax(invocation.tag.span, "'#each' requires an expression"));
        }
        let source = cx.expression(invocation.args(), invocation.args_span())?;
        let Some(element) = source.kind.element() else {
            return Err(CompileError::new(
                ErrorKind::TypeMismatch,
                invocation.args_span(),
                format!("cannot iterate over a value of kind '{}'", source.kind),
            ));
        };

        let (first, otherwise) = split_on(invocation, "else")?;
        let body = cx.with_frame(element, BinderKind::ReadOnly, |cx, _| cx.compile_section(first))?;
        let fallback = otherwise.map(|section| cx.compile_section(section)).transpose()?;

        let eval = source.eval;
        Ok(Step::render(move |env| {
            let items = elements(&eval(env)?)?;
            if items.is_empty() {
                if let Some(fallback) = &fallback {
                    fallback.run(env)?;
                }
                return Ok(());
            }
            for item in items {
                env.with_context(item, |env| body.run(env))?;
            }
            Ok(())
        }))
    }
}
