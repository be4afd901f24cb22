//! Pratt parser core - precedence climbing for binary and unary operators.

use super::super::{ParseError, TokenStream};
use super::{atoms, special};
use templar_ast::foundation::{BinaryOp, UnaryOp};
use templar_ast::{Expr, ExprKind};
use templar_lexer::Token;

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Binary operator metadata: (precedence, associativity, op).
///
/// Higher precedence binds tighter.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, BinaryOp)> {
    match token {
        Token::Coalesce => Some((10, Assoc::Right, BinaryOp::Coalesce)),
        Token::PipePipe | Token::Or => Some((20, Assoc::Left, BinaryOp::Or)),
        Token::AmpAmp | Token::And => Some((30, Assoc::Left, BinaryOp::And)),
        Token::Pipe => Some((40, Assoc::Left, BinaryOp::BitOr)),
        Token::Caret => Some((50, Assoc::Left, BinaryOp::BitXor)),
        Token::Amp => Some((60, Assoc::Left, BinaryOp::BitAnd)),
        Token::EqEq | Token::Eq => Some((70, Assoc::Left, BinaryOp::Eq)),
        Token::BangEq => Some((70, Assoc::Left, BinaryOp::Ne)),
        Token::Matches => Some((70, Assoc::Left, BinaryOp::Matches)),
        Token::NotMatches => Some((70, Assoc::Left, BinaryOp::NotMatches)),
        Token::Lt => Some((80, Assoc::Left, BinaryOp::Lt)),
        Token::LtEq => Some((80, Assoc::Left, BinaryOp::Le)),
        Token::Gt => Some((80, Assoc::Left, BinaryOp::Gt)),
        Token::GtEq => Some((80, Assoc::Left, BinaryOp::Ge)),
        Token::Plus => Some((90, Assoc::Left, BinaryOp::Add)),
        Token::Minus => Some((90, Assoc::Left, BinaryOp::Sub)),
        Token::Star => Some((100, Assoc::Left, BinaryOp::Mul)),
        Token::Slash => Some((100, Assoc::Left, BinaryOp::Div)),
        Token::Percent => Some((100, Assoc::Left, BinaryOp::Rem)),
        _ => None,
    }
}

/// Pratt parser - binary operators with precedence climbing.
pub(super) fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut left = parse_prefix(stream)?;

    while let Some(token) = stream.peek() {
        let Some((prec, assoc, op)) = binary_op_info(token) else {
            break;
        };
        if prec < min_prec {
            break;
        }
        stream.advance();

        let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
        let right = parse_pratt(stream, next_prec)?;
        left = Expr::binary(op, left, right, stream.span_from(start));
    }

    Ok(left)
}

/// Parse prefix expressions (unary operators, the `if` form, postfix chains).
fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    match stream.peek() {
        Some(Token::Minus | Token::Plus | Token::Bang | Token::Not | Token::Tilde) => {
            parse_unary(stream)
        }
        Some(Token::If) => special::parse_if(stream),
        _ => parse_postfix(stream),
    }
}

fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();
    let op = match stream.advance() {
        Some(Token::Minus) => UnaryOp::Neg,
        Some(Token::Plus) => UnaryOp::Plus,
        Some(Token::Bang | Token::Not) => UnaryOp::Not,
        Some(Token::Tilde) => UnaryOp::BitNot,
        other => {
            return Err(ParseError::unexpected_token(other, "as unary operator", span));
        }
    };

    let operand = parse_prefix(stream)?;
    Ok(Expr::unary(op, operand, stream.span_from(start)))
}

/// Parse postfix chains: member access, calls and indexers.
fn parse_postfix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut expr = atoms::parse_atom(stream)?;

    loop {
        match stream.peek() {
            Some(Token::Dot) => {
                stream.advance();
                let name_span = stream.current_span();
                let name = match stream.advance() {
                    Some(Token::Ident(s)) => s.to_string(),
                    Some(token) if atoms::is_keyword(token) => token.to_string(),
                    other => {
                        return Err(ParseError::unexpected_token(other, "after '.'", name_span));
                    }
                };
                expr = Expr::member(expr, name, name_span, stream.span_from(start));
            }
            Some(Token::LParen) => {
                let args = parse_call_args(stream)?;
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    stream.span_from(start),
                );
            }
            Some(Token::LBracket) => {
                stream.advance();
                let index = super::parse_expr(stream)?;
                stream.expect(Token::RBracket)?;
                expr = Expr::new(
                    ExprKind::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    },
                    stream.span_from(start),
                );
            }
            _ => break,
        }
    }

    Ok(expr)
}

/// Parse call arguments including the parentheses.
fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;

    let mut args = Vec::new();
    while !stream.check(&Token::RParen) {
        if stream.at_end() {
            return Err(ParseError::unexpected_token(
                None,
                "in argument list",
                stream.current_span(),
            ));
        }
        args.push(super::parse_expr(stream)?);

        if !stream.check(&Token::RParen) {
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RParen)?;
    Ok(args)
}
