//! Parse error types.

use templar_ast::error::{CompileError, ErrorKind};
use templar_ast::foundation::Span;
use templar_lexer::Token;
use std::fmt;

/// Parse error with source location and context.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

/// Category of parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// A specific token was expected but a different one was found.
    UnexpectedToken,

    /// Input ended while a construct was incomplete.
    UnexpectedEof,

    /// Tokens are present but violate the grammar, or do not lex at all.
    InvalidSyntax,

    /// A binding position (`let`, `define`, `undef`) holds something that is
    /// not an identifier.
    InvalidName,
}

impl ParseError {
    /// Create an "expected token" error.
    pub fn expected_token(expected: Token, found: Option<Token>, span: Span) -> Self {
        let message = match &found {
            Some(token) => format!("expected '{}', found '{}'", expected, token),
            None => format!("expected '{}', found end of input", expected),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(found: Option<&Token>, context: &str, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("unexpected '{}' {}", token, context),
            None => format!("unexpected end of input {}", context),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::InvalidSyntax,
            span,
            message: message.into(),
        }
    }

    pub fn invalid_name(found: Option<&Token>, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("'{}' is not a valid variable name", token),
            None => "expected a variable name, found end of input".to_string(),
        };
        Self {
            kind: ParseErrorKind::InvalidName,
            span,
            message,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        let kind = match err.kind {
            ParseErrorKind::InvalidName => ErrorKind::InvalidVariableName,
            _ => ErrorKind::Syntax,
        };
        CompileError::new(kind, err.span, err.message)
    }
}
