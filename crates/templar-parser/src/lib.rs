// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Hand-written recursive descent parser for templar expressions and
//! directive arguments.

pub mod parser;

pub use parser::{
    DefineForm, DefineHead, LetBinding, ParseError, ParseErrorKind, parse_assert_args,
    parse_define_head, parse_expression, parse_let_bindings, parse_namespace,
    parse_variable_name, tokenize,
};

// Re-export lexer
pub use templar_lexer::Token;
