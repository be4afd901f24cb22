//! Compile-time error reporting and diagnostics.
//!
//! Every template and expression compile failure is a `CompileError`: a
//! category, a span into the top-level source, a message, and optional
//! secondary labels and notes. Once an error leaves the compiler it is
//! *located*: the line/column and one-line excerpt are attached so the
//! error can be displayed without the source at hand. A located error
//! displays as
//!
//! ```text
//! error: undefined name: unresolved name 'nmae'
//!   --> 1:9
//!    |
//!   1 | Hello $$nmae$$
//!     |         ^^^^
//! ```
//!
//! # Examples
//!
//! ```
//! # use templar_ast::error::*;
//! # use templar_ast::foundation::{SourceFile, Span};
//! let file = SourceFile::new("Hello $$nmae$$".to_string());
//! let error = CompileError::new(
//!     ErrorKind::UndefinedName,
//!     Span::new(8, 12),
//!     "unresolved name 'nmae'".to_string(),
//! )
//! .locate(&file);
//!
//! assert_eq!(error.location(), Some((1, 9)));
//! ```

use crate::foundation::{SourceFile, Span};
use std::fmt;

/// Compilation diagnostic with source location and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Category of this error
    pub kind: ErrorKind,
    /// Primary source location (top-level source offsets)
    pub span: Span,
    /// Primary error message
    pub message: String,
    /// Additional labeled spans
    pub labels: Vec<Label>,
    /// Additional notes or hints
    pub notes: Vec<String>,
    /// Line, column and source line, filled by [`CompileError::locate`]
    pub excerpt: Option<Excerpt>,
}

/// Category of compilation error.
///
/// # Invariant
///
/// The discriminant values must match the ERROR_KIND_NAMES array indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    /// Malformed expression or directive structure
    Syntax = 0,
    /// Name that resolves to nothing in strict mode
    UndefinedName = 1,
    /// More than one equally good method overload
    AmbiguousOverload = 2,
    /// Dotted name found in more than one implied namespace
    AmbiguousNamespace = 3,
    /// Operand or result kind cannot be converted
    TypeMismatch = 4,
    /// Name used in `let`/`define`/`undef` is not an identifier
    InvalidVariableName = 5,
    /// Binding rules violated (let re-binding, bad undef, ...)
    ScopeViolation = 6,
    /// `$$#name` with no registered directive
    UnknownDirective = 7,
    /// Missing closing marker or terminator
    UnterminatedRegion = 8,
    /// Directive registry rejected a directive
    Registration = 9,
    /// Internal compiler error
    Internal = 10,
}

/// Human-readable names for error kinds.
///
/// Index matches ErrorKind discriminant.
const ERROR_KIND_NAMES: &[&str] = &[
    "syntax error",            // 0: Syntax
    "undefined name",          // 1: UndefinedName
    "ambiguous overload",      // 2: AmbiguousOverload
    "ambiguous namespace",     // 3: AmbiguousNamespace
    "type mismatch",           // 4: TypeMismatch
    "invalid variable name",   // 5: InvalidVariableName
    "scope violation",         // 6: ScopeViolation
    "unknown directive",       // 7: UnknownDirective
    "unterminated region",     // 8: UnterminatedRegion
    "registration error",      // 9: Registration
    "internal compiler error", // 10: Internal
];

/// Secondary labeled span in a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub span: Span,
    pub message: String,
    /// `(line, column)` of the span start once located
    pub location: Option<(u32, u32)>,
}

/// Position and source line of a located error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
    /// The full source line containing the span start
    pub text: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            labels: Vec::new(),
            notes: Vec::new(),
            excerpt: None,
        }
    }

    /// Adds a secondary labeled span.
    pub fn with_label(mut self, span: Span, message: String) -> Self {
        self.labels.push(Label {
            span,
            message,
            location: None,
        });
        self
    }

    /// Adds a note or hint.
    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    /// Shift every span by `base`, for errors produced while compiling a
    /// sub-string of the top-level source.
    pub fn rebase(mut self, base: u32) -> Self {
        self.span = self.span.offset(base);
        for label in &mut self.labels {
            label.span = label.span.offset(base);
        }
        self
    }

    /// Attach line, column and excerpt from the top-level source.
    ///
    /// Already-located errors are returned unchanged.
    pub fn locate(mut self, source: &SourceFile) -> Self {
        if self.excerpt.is_some() {
            return self;
        }
        let (line, column) = source.line_col(self.span.start);
        self.excerpt = Some(Excerpt {
            line,
            column,
            text: source.line_text(line).unwrap_or("").to_string(),
        });
        for label in &mut self.labels {
            label.location = Some(source.line_col(label.span.start));
        }
        self
    }

    /// `(line, column)` once located.
    pub fn location(&self) -> Option<(u32, u32)> {
        self.excerpt.as_ref().map(|e| (e.line, e.column))
    }
}

impl ErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn name(self) -> &'static str {
        ERROR_KIND_NAMES[self as usize]
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}: {}", self.kind.name(), self.message)?;

        if let Some(excerpt) = &self.excerpt {
            write!(f, "\n  --> {}:{}", excerpt.line, excerpt.column)?;
            write!(f, "\n   |\n{:3} | {}", excerpt.line, excerpt.text)?;
            let (pad, width) = underline(excerpt, self.span);
            write!(f, "\n    | {}{}", " ".repeat(pad), "^".repeat(width))?;
        }

        for label in &self.labels {
            match label.location {
                Some((line, column)) => write!(f, "\n   = note: {} (at {}:{})", label.message, line, column)?,
                None => write!(f, "\n   = note: {}", label.message)?,
            }
        }
        for note in &self.notes {
            write!(f, "\n   = help: {}", note)?;
        }
        Ok(())
    }
}

/// Character offset and width of the caret run under `span`, clamped to
/// the excerpt line and at least one caret wide.
fn underline(excerpt: &Excerpt, span: Span) -> (usize, usize) {
    let text = excerpt.text.as_str();
    let start = (excerpt.column as usize).saturating_sub(1).min(text.len());
    let end = (start + span.len() as usize).min(text.len());
    let pad = text.get(..start).map_or(start, |head| head.chars().count());
    let width = text.get(start..end).map_or(0, |under| under.chars().count());
    (pad, width.max(1))
}

impl std::error::Error for CompileError {}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceFile {
        SourceFile::new("Hi $$user.nmae$$!\n$$#if$$x$$/if$$".to_string())
    }

    #[test]
    fn test_kind_names_cover_every_kind() {
        assert_eq!(ErrorKind::Syntax.name(), "syntax error");
        assert_eq!(ErrorKind::AmbiguousOverload.name(), "ambiguous overload");
        assert_eq!(ErrorKind::Internal.name(), "internal compiler error");
        assert_eq!(ERROR_KIND_NAMES.len(), ErrorKind::Internal as usize + 1);
    }

    #[test]
    fn test_locate_attaches_excerpt() {
        let err = CompileError::new(
            ErrorKind::UndefinedName,
            Span::new(10, 14),
            "no member 'nmae'".to_string(),
        )
        .locate(&source());

        let excerpt = err.excerpt.as_ref().unwrap();
        assert_eq!((excerpt.line, excerpt.column), (1, 11));
        assert_eq!(excerpt.text, "Hi $$user.nmae$$!");
        assert_eq!(
            err.to_string(),
            "error: undefined name: no member 'nmae'\n  --> 1:11\n   |\n  1 | Hi $$user.nmae$$!\n    |           ^^^^"
        );
    }

    #[test]
    fn test_rebase_shifts_labels() {
        let err = CompileError::new(ErrorKind::Syntax, Span::new(1, 2), "x".to_string())
            .with_label(Span::new(0, 1), "here".to_string())
            .rebase(5);
        assert_eq!(err.span, Span::new(6, 7));
        assert_eq!(err.labels[0].span, Span::new(5, 6));
    }

    #[test]
    fn test_display_underlines_span() {
        let err = CompileError::new(
            ErrorKind::Syntax,
            Span::new(23, 25),
            "empty predicate".to_string(),
        )
        .with_label(Span::new(3, 5), "inside this template".to_string())
        .with_note("write a condition after `#if`".to_string())
        .locate(&source());

        let out = err.to_string();
        assert!(out.starts_with("error: syntax error: empty predicate\n"));
        assert!(out.contains("  --> 2:6\n"));
        assert!(out.contains("  2 | $$#if$$x$$/if$$\n"));
        assert!(out.contains("    |      ^^\n"));
        assert!(out.contains("= note: inside this template (at 1:4)"));
        assert!(out.ends_with("= help: write a condition after `#if`"));
    }

    #[test]
    fn test_unlocated_error_is_one_line() {
        let err = CompileError::new(ErrorKind::Registration, Span::default(), "duplicate".to_string());
        assert_eq!(err.to_string(), "error: registration error: duplicate");
    }

    #[test]
    fn test_caret_is_clamped_to_the_line() {
        let file = SourceFile::new("ab\ncd".to_string());
        let err = CompileError::new(ErrorKind::UnterminatedRegion, Span::new(1, 5), "open".to_string()).locate(&file);
        assert!(err.to_string().ends_with("  1 | ab\n    |  ^"));
    }
}
