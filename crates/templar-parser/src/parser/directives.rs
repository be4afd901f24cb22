//! Argument grammars of the built-in directives.
//!
//! Directive tags carry free text after the directive name. The directives
//! that need structure (`let`, `define`, `undef`, `assert`, `using`) parse
//! it here, with the same token stream as expressions.

use super::{ParseError, TokenStream, expr::parse_expr};
use templar_ast::Expr;
use templar_ast::foundation::Span;
use templar_lexer::Token;

/// One `name = expr` pair of a `let` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct LetBinding {
    pub name: String,
    pub name_span: Span,
    pub value: Expr,
}

/// Parsed head of a `define` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct DefineHead {
    pub name: String,
    pub name_span: Span,
    pub form: DefineForm,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefineForm {
    /// `name = expr`, or `name =? expr` when `lenient`.
    Value { lenient: bool, value: Expr },
    /// `name` with a body, optionally `name(a, b)` with parameters.
    Body { params: Option<Vec<(String, Span)>> },
}

/// `a = e1, b = e2, ...`
pub(super) fn parse_let_bindings(stream: &mut TokenStream) -> Result<Vec<LetBinding>, ParseError> {
    let mut bindings = Vec::new();
    loop {
        let (name, name_span) = parse_binding_name(stream)?;
        stream.expect(Token::Eq)?;
        let value = parse_expr(stream)?;
        bindings.push(LetBinding {
            name,
            name_span,
            value,
        });

        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect_end("after let binding")?;
    Ok(bindings)
}

/// `name`, `name(a, b)`, `name = expr` or `name =? expr`.
///
/// `=?` may be written with whitespace between the two characters since a
/// `?` can never start an expression.
pub(super) fn parse_define_head(stream: &mut TokenStream) -> Result<DefineHead, ParseError> {
    let (name, name_span) = parse_binding_name(stream)?;

    let form = if stream.eat(&Token::Eq) {
        let lenient = stream.eat(&Token::Question);
        let value = parse_expr(stream)?;
        DefineForm::Value { lenient, value }
    } else if stream.eat(&Token::LParen) {
        let mut params = Vec::new();
        while !stream.check(&Token::RParen) {
            params.push(parse_binding_name(stream)?);
            if !stream.check(&Token::RParen) {
                stream.expect(Token::Comma)?;
            }
        }
        stream.expect(Token::RParen)?;
        DefineForm::Body {
            params: Some(params),
        }
    } else {
        DefineForm::Body { params: None }
    };

    stream.expect_end("after define head")?;
    Ok(DefineHead {
        name,
        name_span,
        form,
    })
}

/// `predicate[, message]`
pub(super) fn parse_assert_args(
    stream: &mut TokenStream,
) -> Result<(Expr, Option<Expr>), ParseError> {
    let predicate = parse_expr(stream)?;
    let message = if stream.eat(&Token::Comma) {
        Some(parse_expr(stream)?)
    } else {
        None
    };
    stream.expect_end("after assertion")?;
    Ok((predicate, message))
}

/// A single variable name, nothing else.
pub(super) fn parse_single_name(stream: &mut TokenStream) -> Result<(String, Span), ParseError> {
    let name = parse_binding_name(stream)?;
    stream.expect_end("after variable name")?;
    Ok(name)
}

/// Dotted namespace path such as `System.Text`.
pub(super) fn parse_namespace(stream: &mut TokenStream) -> Result<(String, Span), ParseError> {
    let start = stream.current_pos();
    let mut segments = Vec::new();
    loop {
        let span = stream.current_span();
        match stream.advance() {
            Some(Token::Ident(segment)) => segments.push(segment.to_string()),
            other => return Err(ParseError::unexpected_token(other, "in namespace", span)),
        }
        if !stream.eat(&Token::Dot) {
            break;
        }
    }
    stream.expect_end("after namespace")?;
    Ok((segments.join("."), stream.span_from(start)))
}

fn parse_binding_name(stream: &mut TokenStream) -> Result<(String, Span), ParseError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::Ident(name)) => Ok((name.to_string(), span)),
        other => Err(ParseError::invalid_name(other, span)),
    }
}
