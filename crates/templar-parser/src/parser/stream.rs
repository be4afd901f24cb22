//! Cursor over the tokens of one expression region or directive argument.
//!
//! The lexer only ever sees a sub-string of the template (`$$...$$`
//! contents, or the arguments after a directive name). Token ranges are
//! relative to that sub-string; the stream adds `base`, the sub-string's
//! offset in the template, whenever it hands out a [`Span`].

use super::ParseError;
use std::ops::Range;
use templar_ast::foundation::Span;
use templar_lexer::Token;

pub struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
    base: u32,
}

impl<'src> TokenStream<'src> {
    pub fn new(tokens: &'src [(Token, Range<usize>)], base: u32) -> Self {
        Self { tokens, pos: 0, base }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Consume one token, returning it; `None` once the region is used up.
    pub fn advance(&mut self) -> Option<&Token> {
        let (token, _) = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Variant comparison only: `Ident("a")` checks as any `Ident`.
    pub fn check(&self, expected: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Optional token: consumed when present, otherwise the cursor stays.
    pub fn eat(&mut self, expected: &Token) -> bool {
        let found = self.check(expected);
        if found {
            self.pos += 1;
        }
        found
    }

    /// Required token. Returns its absolute span.
    pub fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        if !self.check(&expected) {
            return Err(ParseError::expected_token(expected, self.peek().cloned(), self.current_span()));
        }
        let start = self.pos;
        self.pos += 1;
        Ok(self.span_from(start))
    }

    /// A region holds exactly one expression or argument list; leftover
    /// tokens are reported at the first of them.
    pub fn expect_end(&self, context: &str) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(ParseError::unexpected_token(Some(token), context, self.current_span())),
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Index to pass to [`TokenStream::span_from`] later.
    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Absolute span from the token at index `start` through the last
    /// consumed one. Empty, at `start`, when nothing was consumed since.
    pub fn span_from(&self, start: usize) -> Span {
        let from = self.tokens.get(start).map_or_else(|| self.end_offset(), |(_, r)| r.start);
        let to = match self.pos.checked_sub(1).and_then(|last| self.tokens.get(last)) {
            Some((_, r)) if self.pos > start => r.end,
            _ => from,
        };
        self.absolute(from..to)
    }

    /// Absolute span of the next token; an empty span just past the last
    /// token when the region is used up.
    pub fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, range)) => self.absolute(range.clone()),
            None => {
                let end = self.end_offset();
                self.absolute(end..end)
            }
        }
    }

    fn absolute(&self, range: Range<usize>) -> Span {
        Span::from_range(range).offset(self.base)
    }

    fn end_offset(&self) -> usize {
        self.tokens.last().map_or(0, |(_, range)| range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenize;

    #[test]
    fn test_spans_are_shifted_by_base() {
        let tokens = tokenize("a + b", 10).unwrap();
        let mut stream = TokenStream::new(&tokens, 10);
        assert_eq!(stream.current_span(), Span::new(10, 11));
        let start = stream.current_pos();
        stream.advance();
        stream.advance();
        assert_eq!(stream.span_from(start), Span::new(10, 13));
    }

    #[test]
    fn test_eat_is_optional_and_expect_end_reports_leftovers() {
        let tokens = tokenize("x,", 4).unwrap();
        let mut stream = TokenStream::new(&tokens, 4);
        assert!(!stream.eat(&Token::Comma));
        stream.advance();
        let err = stream.expect_end("after name").unwrap_err();
        assert_eq!(err.span, Span::new(5, 6));
        assert!(stream.eat(&Token::Comma));
        assert!(stream.expect_end("after name").is_ok());
        assert_eq!(stream.current_span(), Span::new(6, 6));
    }
}
