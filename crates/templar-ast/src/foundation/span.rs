//! Source location tracking for error reporting.
//!
//! Templates are compiled from a single source string, but directive
//! arguments and expression regions are re-parsed as sub-strings. Every
//! span is a byte range into the **top-level** source so that errors found
//! in a sub-compilation still point at the right place.
//!
//! # Examples
//!
//! ```
//! # use templar_ast::foundation::*;
//! let file = SourceFile::new("Hello\n$$name$$".to_string());
//! let span = Span::new(8, 12);
//!
//! assert_eq!(file.line_col(span.start), (2, 3));
//! assert_eq!(file.snippet(span), "name");
//! ```

use serde::{Deserialize, Serialize};

/// Compact source location: a half-open byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of start position
    pub start: u32,
    /// Byte offset of end position (exclusive)
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Span covering a `usize` range, as produced by `str::find` and logos.
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start as u32, range.end as u32)
    }

    /// Shift a span that is relative to a sub-string starting at `base`.
    pub fn offset(self, base: u32) -> Self {
        Self::new(self.start + base, self.end + base)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Merge two spans (returns span covering both).
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Template source with line indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Original source text
    pub source: String,
    /// Byte offsets of each line start
    ///
    /// line_starts[0] is always 0, the last entry is the EOF sentinel.
    pub line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            source,
            line_starts,
        }
    }

    /// Get (line, column) for a byte offset. Both are 1-based.
    ///
    /// Offsets past EOF are clamped to EOF.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.source.len() as u32);
        let line_idx = match self.line_starts.binary_search(&offset) {
            // The EOF sentinel of a source ending in '\n' belongs to the empty last line
            Ok(idx) => idx.min(self.line_count().max(1) - 1),
            Err(idx) => idx.max(1) - 1,
        };
        let line = (line_idx + 1) as u32;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Byte range of a line (1-based), excluding the trailing newline.
    pub fn line_range(&self, line: u32) -> Option<(u32, u32)> {
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }
        let line_idx = (line - 1) as usize;
        let start = self.line_starts[line_idx];
        let mut end = self.line_starts[line_idx + 1];
        let bytes = self.source.as_bytes();
        while end > start && matches!(bytes[end as usize - 1], b'\n' | b'\r') {
            end -= 1;
        }
        Some((start, end))
    }

    /// Text of a line (1-based) without its line terminator.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let (start, end) = self.line_range(line)?;
        Some(&self.source[start as usize..end as usize])
    }

    pub fn snippet(&self, span: Span) -> &str {
        let end = (span.end as usize).min(self.source.len());
        let start = (span.start as usize).min(end);
        self.source.get(start..end).unwrap_or("")
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len().saturating_sub(1)
    }
}

/// Compute byte offsets of line starts.
///
/// - line_starts[0] is byte 0 (start of line 1)
/// - line_starts[i] is the start of line i+1
/// - the last entry is EOF
fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];
    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }
    if line_starts.last() != Some(&(source.len() as u32)) || source.is_empty() {
        line_starts.push(source.len() as u32);
    }
    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge_and_offset() {
        let merged = Span::new(10, 20).merge(&Span::new(15, 30));
        assert_eq!(merged, Span::new(10, 30));
        assert_eq!(Span::new(1, 4).offset(10), Span::new(11, 14));
        assert_eq!(Span::new(3, 3).len(), 0);
        assert!(Span::new(3, 3).is_empty());
    }

    #[test]
    fn test_compute_line_starts() {
        assert_eq!(compute_line_starts("ab\ncd"), vec![0, 3, 5]);
        assert_eq!(compute_line_starts("ab\n"), vec![0, 3]);
        assert_eq!(compute_line_starts(""), vec![0, 0]);
    }

    #[test]
    fn test_line_col() {
        let file = SourceFile::new("line 1\nline 2\nline 3".to_string());
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(5), (1, 6));
        assert_eq!(file.line_col(7), (2, 1));
        assert_eq!(file.line_col(16), (3, 3));
        assert_eq!(file.line_col(999), (3, 7));
    }

    #[test]
    fn test_line_text_strips_terminators() {
        let file = SourceFile::new("first\r\nsecond\n".to_string());
        assert_eq!(file.line_text(1), Some("first"));
        assert_eq!(file.line_text(2), Some("second"));
        assert_eq!(file.line_text(3), None);
        assert_eq!(file.line_count(), 2);
    }
}
