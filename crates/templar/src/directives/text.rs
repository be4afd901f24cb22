//! Verbatim directives.

use crate::compiler::Compiler;
use crate::registry::{BodyRule, Directive, Invocation};
use crate::template::Step;
use templar_ast::CompileResult;

/// Emits its body as-is; markers inside are not interpreted.
pub struct Literal;

impl Directive for Literal {
    fn name(&self) -> &str {
        "literal"
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::Verbatim
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        invocation.expect_no_args()?;
        let text: String = invocation
            .sections()
            .iter()
            .map(|section| cx.text(section.range.clone()))
            .collect();
        Ok(Step::Literal(text))
    }
}

pub struct Comment;

impl Directive for Comment {
    fn name(&self) -> &str {
        "comment"
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::Verbatim
    }

    fn compile(&self, _cx: &mut Compiler<'_>, _invocation: &Invocation<'_>) -> CompileResult<Step> {
        Ok(Step::empty())
    }
}
