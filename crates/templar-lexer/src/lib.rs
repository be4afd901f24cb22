// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for the templar expression language.
//!
//! Tokenization is done with logos. Only the text *inside* a `$$ … $$`
//! expression region (or a directive's argument string) is ever lexed here;
//! marker scanning happens in the template compiler.
//!
//! # Design
//!
//! - `Token` covers keywords, operators, literals and identifiers
//! - whitespace is skipped, there are no comments inside expressions
//! - strings use the backtick as their escape introducer
//! - numeric literals keep their suffix so the parser can choose a kind
//! - token strings live once in `TOKEN_STRINGS` (used by `Display`)
//!
//! # Examples
//!
//! ```
//! # use templar_lexer::*;
//! # use logos::Logos;
//! let tokens: Vec<Result<Token, ()>> = Token::lexer("user.name ?? 'anonymous'").collect();
//! assert_eq!(tokens.len(), 5);
//! ```

use logos::{Lexer, Logos};
use std::rc::Rc;

/// Expression token.
///
/// # Layout
///
/// Uses `#[repr(u16)]` so the discriminant of every data-less variant can
/// index `TOKEN_STRINGS`. Data-carrying variants come last.
#[derive(Logos, Debug, Clone, PartialEq)]
#[repr(u16)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // === Keywords ===
    /// Keyword `true`
    #[token("true")]
    True,
    /// Keyword `false`
    #[token("false")]
    False,
    /// Keyword `null`
    #[token("null")]
    Null,
    /// Keyword `if` (prefix conditional)
    #[token("if")]
    If,
    /// Keyword `else`
    #[token("else")]
    Else,
    /// Keyword `and`, alias of `&&`
    #[token("and")]
    And,
    /// Keyword `or`, alias of `||`
    #[token("or")]
    Or,
    /// Keyword `not`, alias of `!`
    #[token("not")]
    Not,
    /// Named constant `pi`
    #[token("pi")]
    Pi,
    /// Named constant `infinity`
    #[token("infinity")]
    Infinity,

    // === Operators ===
    /// Operator `+`
    #[token("+")]
    Plus,
    /// Operator `-`
    #[token("-")]
    Minus,
    /// Operator `*`
    #[token("*")]
    Star,
    /// Operator `/`
    #[token("/")]
    Slash,
    /// Operator `%`
    #[token("%")]
    Percent,
    /// Operator `!`
    #[token("!")]
    Bang,
    /// Operator `~`
    #[token("~")]
    Tilde,
    /// Operator `&`
    #[token("&")]
    Amp,
    /// Operator `|`
    #[token("|")]
    Pipe,
    /// Operator `^`
    #[token("^")]
    Caret,
    /// Operator `&&`
    #[token("&&")]
    AmpAmp,
    /// Operator `||`
    #[token("||")]
    PipePipe,
    /// Operator `==`
    #[token("==")]
    EqEq,
    /// Operator `!=`
    #[token("!=")]
    BangEq,
    /// Operator `=` (equality inside expressions, binding in `let`/`define`)
    #[token("=")]
    Eq,
    /// Operator `=~`
    #[token("=~")]
    Matches,
    /// Operator `!~`
    #[token("!~")]
    NotMatches,
    /// Operator `<`
    #[token("<")]
    Lt,
    /// Operator `<=`
    #[token("<=")]
    LtEq,
    /// Operator `>`
    #[token(">")]
    Gt,
    /// Operator `>=`
    #[token(">=")]
    GtEq,
    /// Operator `??`
    #[token("??")]
    Coalesce,
    /// Operator `?`
    #[token("?")]
    Question,
    /// Operator `:`
    #[token(":")]
    Colon,
    /// Operator `.`
    #[token(".")]
    Dot,
    /// Operator `,`
    #[token(",")]
    Comma,

    // === Delimiters ===
    /// Delimiter `(`
    #[token("(")]
    LParen,
    /// Delimiter `)`
    #[token(")")]
    RParen,
    /// Delimiter `[`
    #[token("[")]
    LBracket,
    /// Delimiter `]`
    #[token("]")]
    RBracket,

    // === Literals ===
    /// Context reference `$N`; a bare `$` is `$0`.
    #[regex(r"\$[0-9]*", lex_context)]
    Context(usize),

    /// Numeric literal with its suffix.
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9]+)?[a-zA-Z]*", lex_decimal)]
    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*[uUlL]*", lex_hex, priority = 10)]
    Number(NumberLit),

    /// String literal in double or single quotes.
    ///
    /// Uses `Rc<str>` for cheap cloning throughout the parser pipeline.
    #[regex(r#""([^"`]|`[^\n])*""#, lex_string)]
    #[regex(r#"'([^'`]|`[^\n])*'"#, lex_string)]
    Str(Rc<str>),

    /// Regex literal `r"pattern"flags`.
    #[regex(r#"r"([^"]|"")*"[imsxU]*"#, lex_regex)]
    Regex(RegexLit),

    /// Identifier.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),
}

/// Integer literal suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntSuffix {
    /// No suffix: `i32`, widened to `i64` then `u64` when the value does not fit.
    None,
    /// `u`
    Unsigned,
    /// `l`
    Long,
    /// `ul` / `lu`
    UnsignedLong,
    /// One of `KB MB GB TB PB`; the value is already multiplied out.
    Magnitude,
}

/// Real literal suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealSuffix {
    /// No suffix: `f64`.
    None,
    /// `f`
    Single,
    /// `d`
    Double,
    /// One of `KB MB GB TB PB`; the value is already multiplied out.
    Magnitude,
}

/// A lexed numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLit {
    Integer { value: u128, suffix: IntSuffix },
    Real { value: f64, suffix: RealSuffix },
}

/// A lexed regex literal.
#[derive(Debug, Clone, PartialEq)]
pub struct RegexLit {
    pub pattern: Rc<str>,
    pub flags: Rc<str>,
}

fn lex_context(lex: &mut Lexer<'_, Token>) -> Option<usize> {
    let digits = &lex.slice()[1..];
    if digits.is_empty() {
        Some(0)
    } else {
        digits.parse().ok()
    }
}

/// Binary magnitude multiplier for a `KB`..`PB` suffix.
fn magnitude(suffix: &str) -> Option<u32> {
    let shift = match suffix.to_ascii_uppercase().as_str() {
        "KB" => 10,
        "MB" => 20,
        "GB" => 30,
        "TB" => 40,
        "PB" => 50,
        _ => return None,
    };
    Some(shift)
}

fn lex_decimal(lex: &mut Lexer<'_, Token>) -> Option<NumberLit> {
    let text = lex.slice();
    let split = text
        .rfind(|c: char| !c.is_ascii_alphabetic())
        .map_or(0, |i| i + 1);
    let (body, suffix) = text.split_at(split);
    let body: String = body.chars().filter(|c| *c != '_').collect();
    let is_real = body.contains(['.', 'e', 'E']);

    if let Some(shift) = magnitude(suffix) {
        let factor = 1u128 << shift;
        return if is_real {
            let value = body.parse::<f64>().ok()? * factor as f64;
            Some(NumberLit::Real {
                value,
                suffix: RealSuffix::Magnitude,
            })
        } else {
            let value = body.parse::<u128>().ok()?.checked_mul(factor)?;
            Some(NumberLit::Integer {
                value,
                suffix: IntSuffix::Magnitude,
            })
        };
    }

    let lower = suffix.to_ascii_lowercase();
    match lower.as_str() {
        "f" | "d" => {
            let value = body.parse::<f64>().ok()?;
            let suffix = if lower == "f" {
                RealSuffix::Single
            } else {
                RealSuffix::Double
            };
            Some(NumberLit::Real { value, suffix })
        }
        "" if is_real => Some(NumberLit::Real {
            value: body.parse().ok()?,
            suffix: RealSuffix::None,
        }),
        _ if is_real => None,
        _ => Some(NumberLit::Integer {
            value: body.parse().ok()?,
            suffix: int_suffix(&lower)?,
        }),
    }
}

fn lex_hex(lex: &mut Lexer<'_, Token>) -> Option<NumberLit> {
    let text = &lex.slice()[2..];
    let split = text
        .find(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'))
        .unwrap_or(text.len());
    let (digits, suffix) = text.split_at(split);
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    Some(NumberLit::Integer {
        value: u128::from_str_radix(&digits, 16).ok()?,
        suffix: int_suffix(&suffix.to_ascii_lowercase())?,
    })
}

fn int_suffix(lower: &str) -> Option<IntSuffix> {
    match lower {
        "" => Some(IntSuffix::None),
        "u" => Some(IntSuffix::Unsigned),
        "l" => Some(IntSuffix::Long),
        "ul" | "lu" => Some(IntSuffix::UnsignedLong),
        _ => None,
    }
}

fn lex_string(lex: &mut Lexer<'_, Token>) -> Option<Rc<str>> {
    let s = lex.slice();
    unescape_string(&s[1..s.len() - 1]).map(|s| Rc::from(s.as_str()))
}

fn lex_regex(lex: &mut Lexer<'_, Token>) -> Option<RegexLit> {
    let s = lex.slice();
    let close = s.rfind('"')?;
    let pattern = s[2..close].replace("\"\"", "\"");
    Some(RegexLit {
        pattern: Rc::from(pattern.as_str()),
        flags: Rc::from(&s[close + 1..]),
    })
}

/// Unescape string literal content; the backtick introduces escapes.
fn unescape_string(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '`' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('0') => result.push('\0'),
                Some('`') => result.push('`'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some('$') => result.push('$'),
                Some(_) | None => return None,
            }
        } else {
            result.push(c);
        }
    }
    Some(result)
}

/// Token string lookup table, indexed by discriminant.
///
/// NOTE: The `#[token("...")]` attributes above must match these strings.
const TOKEN_STRINGS: &[&str] = &[
    "true", "false", "null", "if", "else", "and", "or", "not", "pi", "infinity", // keywords
    "+", "-", "*", "/", "%", "!", "~", "&", "|", "^", "&&", "||", // arithmetic & bitwise
    "==", "!=", "=", "=~", "!~", "<", "<=", ">", ">=", // comparison
    "??", "?", ":", ".", ",", // other
    "(", ")", "[", "]", // delimiters
];

impl Token {
    /// Index into `TOKEN_STRINGS` for data-less tokens.
    fn token_string_index(&self) -> usize {
        // Safe: Token has #[repr(u16)] so the tag is the leading u16
        let discriminant = unsafe { *(self as *const Token as *const u16) };
        discriminant as usize
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Context(n) => write!(f, "${}", n),
            Token::Number(NumberLit::Integer { value, .. }) => write!(f, "{}", value),
            Token::Number(NumberLit::Real { value, .. }) => write!(f, "{}", value),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::Regex(r) => write!(f, "r\"{}\"{}", r.pattern, r.flags),
            Token::Ident(id) => write!(f, "{}", id),
            _ => match TOKEN_STRINGS.get(self.token_string_index()) {
                Some(s) => f.write_str(s),
                None => f.write_str("<token>"),
            },
        }
    }
}
