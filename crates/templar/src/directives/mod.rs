//! Built-in directives.
//!
//! | directive  | body     | control words   |
//! |------------|----------|-----------------|
//! | `if`       | nested   | `elif`, `else`  |
//! | `each`     | nested   | `else`          |
//! | `block`    | nested   |                 |
//! | `let`      | nested   |                 |
//! | `define`   | nested or none, by form | `out` |
//! | `undef`    | none     |                 |
//! | `literal`  | verbatim |                 |
//! | `comment`  | verbatim |                 |
//! | `assert`   | none     |                 |
//! | `error`    | none, or nested without arguments | |
//! | `pragma`   | none     |                 |
//! | `using`    | none     |                 |

mod bindings;
mod conditional;
mod diagnostics;
mod iteration;
mod scoping;
mod text;

use crate::registry::{Directive, Invocation};
use crate::scan::Section;
use std::sync::Arc;
use templar_ast::{CompileError, CompileResult, ErrorKind, Span};

pub use bindings::{Define, Let, Undef};
pub use conditional::If;
pub use diagnostics::{Assert, Error, Pragma};
pub use iteration::Each;
pub use scoping::{Block, Using};
pub use text::{Comment, Literal};

pub(crate) fn builtin() -> Vec<Arc<dyn Directive>> {
    vec![
        Arc::new(If),
        Arc::new(Each),
        Arc::new(Block),
        Arc::new(Let),
        Arc::new(Define),
        Arc::new(Undef),
        Arc::new(Literal),
        Arc::new(Comment),
        Arc::new(Assert),
        Arc::new(Error),
        Arc::new(Pragma),
        Arc::new(Using),
    ]
}

// === Helpers ===

fn err_syntax(span: Span, message: impl Into<String>) -> CompileError {
    CompileError::new(ErrorKind::Syntax, span, message.into())
}

fn err_scope(span: Span, message: impl Into<String>) -> CompileError {
    CompileError::new(ErrorKind::ScopeViolation, span, message.into())
}

/// Split a body into its first section and an optional trailing section
/// opened by `word`, which may appear once and takes no arguments.
fn split_on<'a, 's>(
    invocation: &'a Invocation<'s>,
    word: &str,
) -> CompileResult<(&'a Section<'s>, Option<&'a Section<'s>>)> {
    match invocation.sections() {
        [] => Err(invocation.error(format!("'#{}' requires a body", invocation.name()))),
        [first] => Ok((first, None)),
        [first, second] => {
            let Some(tag) = second.control else {
                return Ok((first, None));
            };
            if tag.name != word {
                return Err(err_syntax(
                    tag.span,
                    format!("'#{}' is not valid in '#{}'", tag.name, invocation.name()),
                ));
            }
            if !tag.args.is_empty() {
                return Err(err_syntax(tag.args_span, format!("'#{}' takes no arguments", tag.name)));
            }
            Ok((first, Some(second)))
        }
        [_, _, third, ..] => {
            let span = third.control.map_or(invocation.tag.span, |t| t.span);
            Err(err_syntax(
                span,
                format!("'#{}' may appear only once in '#{}'", word, invocation.name()),
            ))
        }
    }
}
