//! Atomic expressions - literals, names, context references, parentheses.

use super::super::{ParseError, TokenStream};
use templar_ast::foundation::{FloatKind, IntKind, Span};
use templar_ast::{Expr, ExprKind, Literal};
use templar_lexer::{IntSuffix, NumberLit, RealSuffix, Token};

/// Parse an atomic expression.
pub(super) fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();

    let literal = match stream.advance() {
        Some(Token::True) => Literal::Bool(true),
        Some(Token::False) => Literal::Bool(false),
        Some(Token::Null) => Literal::Null,
        Some(Token::Pi) => Literal::Float {
            value: std::f64::consts::PI,
            kind: FloatKind::F64,
        },
        Some(Token::Infinity) => Literal::Float {
            value: f64::INFINITY,
            kind: FloatKind::F64,
        },
        Some(Token::Number(number)) => numeric_literal(*number, span)?,
        Some(Token::Str(s)) => Literal::Str(s.to_string()),
        Some(Token::Regex(r)) => Literal::Regex {
            pattern: r.pattern.to_string(),
            flags: r.flags.to_string(),
        },
        Some(Token::Context(n)) => {
            let n = *n;
            return Ok(Expr::new(ExprKind::Context(n), stream.span_from(start)));
        }
        Some(Token::Ident(name)) => {
            let name = name.to_string();
            return Ok(Expr::name(name, stream.span_from(start)));
        }
        Some(Token::LParen) => {
            let inner = super::parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            // Keep the inner node but widen its span over the parentheses
            return Ok(Expr::new(inner.kind, stream.span_from(start)));
        }
        other => {
            return Err(ParseError::unexpected_token(other, "in expression", span));
        }
    };

    Ok(Expr::literal(literal, stream.span_from(start)))
}

/// Choose the kind of a numeric literal from its suffix and magnitude.
///
/// Unsuffixed integers are `i32`, widening to `i64` then `u64`; `u` picks
/// `u32` then `u64`; `l` picks `i64` then `u64`; `ul` is `u64`; binary
/// magnitude suffixes produce `i64`/`f64`.
fn numeric_literal(number: NumberLit, span: Span) -> Result<Literal, ParseError> {
    match number {
        NumberLit::Integer { value, suffix } => {
            let candidates: &[IntKind] = match suffix {
                IntSuffix::None => &[IntKind::I32, IntKind::I64, IntKind::U64],
                IntSuffix::Unsigned => &[IntKind::U32, IntKind::U64],
                IntSuffix::Long => &[IntKind::I64, IntKind::U64],
                IntSuffix::UnsignedLong => &[IntKind::U64],
                IntSuffix::Magnitude => &[IntKind::I64],
            };
            let value = i128::try_from(value).map_err(|_| too_large(span))?;
            candidates
                .iter()
                .find(|kind| kind.contains(value))
                .map(|&kind| Literal::Int { value, kind })
                .ok_or_else(|| too_large(span))
        }
        NumberLit::Real { value, suffix } => {
            let kind = match suffix {
                RealSuffix::Single => FloatKind::F32,
                RealSuffix::None | RealSuffix::Double | RealSuffix::Magnitude => FloatKind::F64,
            };
            Ok(Literal::Float {
                value: kind.round(value),
                kind,
            })
        }
    }
}

fn too_large(span: Span) -> ParseError {
    ParseError::invalid_syntax("integer literal is too large for its kind", span)
}

/// Keywords that may still be used as member names after `.`.
pub(super) fn is_keyword(token: &Token) -> bool {
    matches!(
        token,
        Token::True
            | Token::False
            | Token::Null
            | Token::If
            | Token::Else
            | Token::And
            | Token::Or
            | Token::Not
            | Token::Pi
            | Token::Infinity
    )
}
