//! Special forms - the two conditional syntaxes.

use super::super::{ParseError, TokenStream};
use super::pratt;
use templar_ast::{Expr, ExprKind};
use templar_lexer::Token;

/// `cond ? a : b`, right associative; without `?` this is just the operand.
pub(super) fn parse_conditional(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let condition = pratt::parse_pratt(stream, 0)?;

    if !stream.eat(&Token::Question) {
        return Ok(condition);
    }

    let then_branch = super::parse_expr(stream)?;
    stream.expect(Token::Colon)?;
    let else_branch = super::parse_expr(stream)?;

    Ok(conditional(
        condition,
        then_branch,
        Some(else_branch),
        stream.span_from(start),
    ))
}

/// `if cond a [else b]`; without `else` the expression is null when false.
pub(super) fn parse_if(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::If)?;

    let condition = pratt::parse_pratt(stream, 0)?;
    if stream.at_end() {
        return Err(ParseError::unexpected_token(
            None,
            "after 'if' condition, expected a value",
            stream.current_span(),
        ));
    }
    let then_branch = super::parse_expr(stream)?;
    let else_branch = if stream.eat(&Token::Else) {
        Some(super::parse_expr(stream)?)
    } else {
        None
    };

    Ok(conditional(
        condition,
        then_branch,
        else_branch,
        stream.span_from(start),
    ))
}

fn conditional(
    condition: Expr,
    then_branch: Expr,
    else_branch: Option<Expr>,
    span: templar_ast::Span,
) -> Expr {
    Expr::new(
        ExprKind::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        },
        span,
    )
}
