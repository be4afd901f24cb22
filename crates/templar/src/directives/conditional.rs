//! `#if` / `#elif` / `#else`

use super::err_syntax;
use crate::compiler::Compiler;
use crate::registry::{BodyRule, Directive, Invocation};
use crate::template::{Body, Step};
use templar_ast::CompileResult;
use templar_runtime::Eval;
use templar_runtime::coerce::to_bool;

pub struct If;

impl Directive for If {
    fn name(&self) -> &str {
        "if"
    }

    fn reserved_words(&self) -> &[&'static str] {
        &["elif", "else"]
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::Nested
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        let sections = invocation.sections();
        if sections.first().is_none_or(|first| first.is_empty()) {
            return Err(invocation.error("'#if' body is empty"));
        }

        let mut branches: Vec<(Eval, Body)> = Vec::new();
        let mut fallback: Option<Body> = None;
        for section in sections {
            let (word, args, args_span, span) = match section.control {
                None => ("if", invocation.args(), invocation.args_span(), invocation.tag.span),
                Some(tag) => (tag.name, tag.args, tag.args_span, tag.span),
            };
            if fallback.is_some() {
                return Err(err_syntax(span, format!("'#{}' after '#else'", word)));
            }
            if word == "else" {
                if !args.is_empty() {
                    return Err(err_syntax(args_span, "'#else' takes no arguments"));
                }
                fallback = Some(cx.compile_section(section)?);
                continue;
            }
            if args.is_empty() {
                return Err(err_syntax(span, format!("'#{}' requires a predicate", word)));
            }
            let predicate = cx.predicate(args, args_span)?;
            branches.push((predicate.eval, cx.compile_section(section)?));
        }

        Ok(Step::render(move |env| {
            for (predicate, body) in &branches {
                if to_bool(&predicate(env)?) {
                    return body.run(env);
                }
            }
            match &fallback {
                Some(body) => body.run(env),
                None => Ok(()),
            }
        }))
    }
}
