//! Hand-written recursive descent parser for templar expressions.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead
//! - `error`: ParseError and its conversion into `CompileError`
//! - `expr`: Expression parser using Pratt parsing
//! - `directives`: argument grammars for `let`, `define`, `assert`, ...
//!
//! Every entry point takes the text to parse plus `base`, the byte offset of
//! that text inside the top-level template, so spans come out absolute.

mod directives;
mod error;
mod expr;
mod stream;

pub use directives::{DefineForm, DefineHead, LetBinding};
pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

use logos::Logos;
use std::ops::Range;
use templar_ast::Expr;
use templar_ast::foundation::Span;
use templar_lexer::Token;

/// Lex `source`, failing on the first invalid token.
pub fn tokenize(source: &str, base: u32) -> Result<Vec<(Token, Range<usize>)>, ParseError> {
    let mut tokens = Vec::new();
    for (result, range) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, range)),
            Err(()) => {
                let span = Span::from_range(range.clone()).offset(base);
                return Err(ParseError::invalid_syntax(
                    format!("invalid token '{}'", &source[range]),
                    span,
                ));
            }
        }
    }
    Ok(tokens)
}

/// Run `parse` over the tokens of `source`, rejecting empty input.
fn with_stream<T>(
    source: &str,
    base: u32,
    what: &str,
    parse: impl FnOnce(&mut TokenStream) -> Result<T, ParseError>,
) -> Result<T, ParseError> {
    let tokens = tokenize(source, base)?;
    if tokens.is_empty() {
        let at = base + source.len() as u32;
        return Err(ParseError::invalid_syntax(
            format!("expected {}, found nothing", what),
            Span::new(base, at.max(base)),
        ));
    }
    let mut stream = TokenStream::new(&tokens, base);
    parse(&mut stream)
}

/// Parse a complete expression.
pub fn parse_expression(source: &str, base: u32) -> Result<Expr, ParseError> {
    with_stream(source, base, "an expression", |stream| {
        let expr = expr::parse_expr(stream)?;
        stream.expect_end("after expression")?;
        Ok(expr)
    })
}

/// Parse the bindings of a `let` tag.
pub fn parse_let_bindings(source: &str, base: u32) -> Result<Vec<LetBinding>, ParseError> {
    with_stream(source, base, "a binding", directives::parse_let_bindings)
}

/// Parse the head of a `define` tag.
pub fn parse_define_head(source: &str, base: u32) -> Result<DefineHead, ParseError> {
    with_stream(source, base, "a name", directives::parse_define_head)
}

/// Parse `predicate[, message]` of an `assert` tag.
pub fn parse_assert_args(source: &str, base: u32) -> Result<(Expr, Option<Expr>), ParseError> {
    with_stream(source, base, "a predicate", directives::parse_assert_args)
}

/// Parse a lone variable name (`undef`).
pub fn parse_variable_name(source: &str, base: u32) -> Result<(String, Span), ParseError> {
    with_stream(source, base, "a variable name", directives::parse_single_name)
}

/// Parse a dotted namespace (`using`).
pub fn parse_namespace(source: &str, base: u32) -> Result<(String, Span), ParseError> {
    with_stream(source, base, "a namespace", directives::parse_namespace)
}
