//! `#assert`, `#error` and `#pragma`

use super::err_syntax;
use crate::compiler::Compiler;
use crate::engine::PragmaOutcome;
use crate::registry::{BodyRule, Directive, Invocation};
use crate::template::Step;
use templar_ast::CompileResult;
use templar_parser::parse_assert_args;
use templar_runtime::coerce::{stringify, to_bool};
use templar_runtime::{Halt, RenderError, ValueKind};
use tracing::debug;

/// Fails rendering with `AssertionFailed` when the predicate is false. The
/// message defaults to the predicate's source text.
pub struct Assert;

impl Directive for Assert {
    fn name(&self) -> &str {
        "assert"
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::None
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        if invocation.args().is_empty() {
            return Err(invocation.error("'#assert' requires a predicate"));
        }
        let (predicate, message) = cx.parse_with(parse_assert_args, invocation.args(), invocation.args_span())?;
        let default = cx.span_text(predicate.span).trim().to_string();
        let predicate = cx.compile(&predicate)?.coerce_to(&ValueKind::Bool, predicate.span)?.eval;
        let message = match message {
            Some(expr) => Some(cx.compile(&expr)?.eval),
            None => None,
        };

        Ok(Step::render(move |env| {
            if to_bool(&predicate(env)?) {
                return Ok(());
            }
            let message = match &message {
                Some(eval) => stringify(&eval(env)?),
                None => default.clone(),
            };
            Err(RenderError::AssertionFailed { message }.into())
        }))
    }
}

/// Fails rendering with `Raised`. The message is the raw argument text, or
/// the rendered body when there are no arguments.
pub struct Error;

impl Directive for Error {
    fn name(&self) -> &str {
        "error"
    }

    fn body(&self, args: &str) -> BodyRule {
        if args.trim().is_empty() {
            BodyRule::Nested
        } else {
            BodyRule::None
        }
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        if !invocation.args().is_empty() {
            let message = invocation.args().to_string();
            return Ok(Step::render(move |_| {
                Err(RenderError::Raised {
                    message: message.clone(),
                }
                .into())
            }));
        }
        let Some(section) = invocation.sections().first() else {
            return Err(invocation.error("'#error' requires a message"));
        };
        let body = cx.compile_section(section)?;
        Ok(Step::render(move |env| {
            let message = env.capture(|env| body.run(env))?;
            Err(RenderError::Raised { message }.into())
        }))
    }
}

/// `passes N` caps `render_until_stable`; any other text goes to the
/// engine's pragma handler when rendering reaches it.
pub struct Pragma;

const PASSES: &str = "passes";

impl Directive for Pragma {
    fn name(&self) -> &str {
        "pragma"
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::None
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        let text = invocation.args();
        if text.is_empty() {
            return Err(invocation.error("'#pragma' requires an argument"));
        }

        if let Some(rest) = text.strip_prefix(PASSES)
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            let passes: usize = rest
                .trim()
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| err_syntax(invocation.args_span(), "'passes' expects a positive integer"))?;
            return Ok(Step::render(move |env| {
                env.request_pass_cap(passes);
                Ok(())
            }));
        }

        let Some(handler) = cx.pragma_handler() else {
            debug!(pragma = text, "no pragma handler; ignoring");
            return Ok(Step::empty());
        };
        let text = text.to_string();
        Ok(Step::render(move |_| match handler.pragma(&text) {
            PragmaOutcome::Continue => Ok(()),
            PragmaOutcome::Stop => Err(Halt::Stop),
        }))
    }
}
