//! Marker scanning and nested-boundary search.
//!
//! Template text is split into regions at `$$` markers:
//!
//! ```text
//! literal $$expr$$ literal $$#name args$$ body $$#else$$ body $$/name$$
//! ```
//!
//! All positions are byte offsets into the top-level source, so a region
//! found while scanning a directive body already carries the position
//! errors must report.

use crate::registry::{BodyRule, Registry};
use std::ops::Range;
use templar_ast::{CompileError, CompileResult, ErrorKind, Span};
use tracing::trace;

pub const MARKER: &str = "$$";
pub const DIRECTIVE_SIGIL: char = '#';
pub const TERMINATOR_SIGIL: char = '/';

/// An opening directive tag, `$$#name args$$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'s> {
    pub name: &'s str,
    pub name_span: Span,
    /// Argument text with surrounding whitespace removed.
    pub args: &'s str,
    pub args_span: Span,
    /// The whole tag, markers included.
    pub span: Span,
}

/// One body section of a directive: the text up to the next control word
/// (`else`, `elif`, `out`, ...) or terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'s> {
    /// The control tag that opened this section; `None` for the first.
    pub control: Option<Tag<'s>>,
    pub range: Range<usize>,
}

impl Section<'_> {
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn span(&self) -> Span {
        Span::from_range(self.range.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region<'s> {
    Text(Range<usize>),
    /// `$$expr$$`; the span covers the expression text only.
    Expr { text: &'s str, span: Span },
    Open(Tag<'s>),
    /// `$$/name$$`
    Close { name: &'s str, span: Span },
}

/// Splits `source[range]` into regions.
pub struct Scanner<'s> {
    source: &'s str,
    pos: usize,
    end: usize,
}

fn err(kind: ErrorKind, span: Span, message: impl Into<String>) -> CompileError {
    CompileError::new(kind, span, message.into())
}

impl<'s> Scanner<'s> {
    pub fn new(source: &'s str, range: Range<usize>) -> Self {
        Self {
            source,
            pos: range.start,
            end: range.end.min(source.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Continue scanning at `pos`, after a directive consumed its body.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn find_marker(&self, from: usize) -> Option<usize> {
        self.source[from..self.end].find(MARKER).map(|at| from + at)
    }

    pub fn next_region(&mut self) -> CompileResult<Option<Region<'s>>> {
        if self.pos >= self.end {
            return Ok(None);
        }
        let start = self.pos;
        let Some(open) = self.find_marker(start) else {
            self.pos = self.end;
            return Ok(Some(Region::Text(start..self.end)));
        };
        if open > start {
            self.pos = open;
            return Ok(Some(Region::Text(start..open)));
        }

        let inner = open + MARKER.len();
        let region = match self.source[inner..self.end].chars().next() {
            Some(DIRECTIVE_SIGIL) => Region::Open(self.read_tag(open)?),
            Some(TERMINATOR_SIGIL) => {
                let close = self.closing(open, "terminator")?;
                let name = self.source[inner + 1..close].trim();
                self.pos = close + MARKER.len();
                Region::Close {
                    name,
                    span: Span::from_range(open..self.pos),
                }
            }
            _ => {
                let close = self.closing(open, "expression")?;
                let text = &self.source[inner..close];
                if text.trim().is_empty() {
                    return Err(err(
                        ErrorKind::Syntax,
                        Span::from_range(open..close + MARKER.len()),
                        "empty expression",
                    ));
                }
                self.pos = close + MARKER.len();
                Region::Expr {
                    text,
                    span: Span::from_range(inner..close),
                }
            }
        };
        trace!(?region, "region");
        Ok(Some(region))
    }

    /// Offset of the `$$` closing the region opened at `open`.
    fn closing(&self, open: usize, what: &str) -> CompileResult<usize> {
        self.find_marker(open + MARKER.len()).ok_or_else(|| {
            err(
                ErrorKind::UnterminatedRegion,
                Span::from_range(open..self.end),
                format!("{} is missing its closing '{}'", what, MARKER),
            )
        })
    }

    fn read_tag(&mut self, open: usize) -> CompileResult<Tag<'s>> {
        let close = self.closing(open, "directive tag")?;
        let name_start = open + MARKER.len() + 1;
        let head = &self.source[name_start..close];
        let name_len = head.find(char::is_whitespace).unwrap_or(head.len());
        let name = &head[..name_len];
        if name.is_empty() {
            return Err(err(
                ErrorKind::Syntax,
                Span::from_range(open..close + MARKER.len()),
                "directive name expected after '#'",
            ));
        }
        let rest = &head[name_len..];
        let args = rest.trim();
        let args_start = if args.is_empty() {
            close
        } else {
            name_start + name_len + (rest.len() - rest.trim_start().len())
        };
        let args_span = Span::from_range(args_start..args_start + args.len());
        self.pos = close + MARKER.len();
        Ok(Tag {
            name,
            name_span: Span::from_range(name_start..name_start + name_len),
            args,
            args_span,
            span: Span::from_range(open..self.pos),
        })
    }
}

// === Boundary search ===

/// Where a scan of a directive body stopped.
enum Boundary<'s> {
    Control(Tag<'s>),
    End(Span),
}

/// Body of a directive as found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundBody<'s> {
    pub sections: Vec<Section<'s>>,
    /// Offset just past the terminator.
    pub end: usize,
}

/// Locate the body of the directive opened by `tag`, which ends at
/// `tag.span.end`. Returns `None` for directives without a body.
pub fn find_body<'s>(
    source: &'s str,
    registry: &Registry,
    tag: &Tag<'s>,
    limit: usize,
) -> CompileResult<Option<FoundBody<'s>>> {
    let Some(directive) = registry.get(tag.name) else {
        return Err(unknown(registry, tag));
    };
    match directive.body(tag.args) {
        BodyRule::None => Ok(None),
        BodyRule::Verbatim => verbatim(source, tag, limit).map(Some),
        BodyRule::Nested => nested(source, registry, tag, limit).map(Some),
    }
}

/// Error for a tag naming no registered directive.
pub fn unknown(registry: &Registry, tag: &Tag<'_>) -> CompileError {
    if registry.is_control_word(tag.name) {
        err(
            ErrorKind::Syntax,
            tag.span,
            format!("'#{}' is not inside a directive that accepts it", tag.name),
        )
    } else {
        err(
            ErrorKind::UnknownDirective,
            tag.name_span,
            format!("unknown directive '#{}'", tag.name),
        )
    }
}

fn terminator(name: &str) -> String {
    format!("{}{}{}{}", MARKER, TERMINATOR_SIGIL, name, MARKER)
}

fn unterminated(tag: &Tag<'_>) -> CompileError {
    err(
        ErrorKind::UnterminatedRegion,
        tag.span,
        format!("'#{}' is missing its '{}' terminator", tag.name, terminator(tag.name)),
    )
}

/// Plain search for the terminator; the body is not scanned.
fn verbatim<'s>(source: &'s str, tag: &Tag<'s>, limit: usize) -> CompileResult<FoundBody<'s>> {
    let start = tag.span.end as usize;
    let end_marker = terminator(tag.name);
    let at = source[start..limit]
        .find(&end_marker)
        .map(|at| start + at)
        .ok_or_else(|| unterminated(tag))?;

    let opener = format!("{}{}{}", MARKER, DIRECTIVE_SIGIL, tag.name);
    if let Some(inner) = source[start..at].find(&opener) {
        let inner = start + inner;
        return Err(err(
            ErrorKind::Syntax,
            Span::from_range(inner..inner + opener.len()),
            format!("'#{}' cannot be nested inside itself", tag.name),
        ));
    }
    Ok(FoundBody {
        sections: vec![Section {
            control: None,
            range: start..at,
        }],
        end: at + end_marker.len(),
    })
}

/// Scan the body for control words and the terminator, stepping over every
/// fully matched inner directive first.
fn nested<'s>(source: &'s str, registry: &Registry, tag: &Tag<'s>, limit: usize) -> CompileResult<FoundBody<'s>> {
    let words = registry
        .get(tag.name)
        .map(|d| d.reserved_words())
        .unwrap_or_default();
    let mut scanner = Scanner::new(source, tag.span.end as usize..limit);
    let mut sections = Vec::new();
    let mut control = None;
    let mut section_start = scanner.position();

    loop {
        let (at, boundary) = next_boundary(&mut scanner, source, registry, tag, words, limit)?;
        sections.push(Section {
            control,
            range: section_start..at,
        });
        match boundary {
            Boundary::Control(next) => {
                control = Some(next);
                section_start = next.span.end as usize;
            }
            Boundary::End(span) => {
                return Ok(FoundBody {
                    sections,
                    end: span.end as usize,
                });
            }
        }
    }
}

fn next_boundary<'s>(
    scanner: &mut Scanner<'s>,
    source: &'s str,
    registry: &Registry,
    owner: &Tag<'s>,
    words: &[&'static str],
    limit: usize,
) -> CompileResult<(usize, Boundary<'s>)> {
    while let Some(region) = scanner.next_region()? {
        match region {
            Region::Text(_) | Region::Expr { .. } => {}
            Region::Open(inner) if registry.get(inner.name).is_some() => {
                if let Some(body) = find_body(source, registry, &inner, limit)? {
                    scanner.seek(body.end);
                }
            }
            Region::Open(inner) if words.iter().any(|w| *w == inner.name) => {
                return Ok((inner.span.start as usize, Boundary::Control(inner)));
            }
            Region::Open(inner) => return Err(unknown(registry, &inner)),
            Region::Close { name, span } if name == owner.name => {
                return Ok((span.start as usize, Boundary::End(span)));
            }
            Region::Close { name, span } => {
                return Err(err(
                    ErrorKind::Syntax,
                    span,
                    format!("'{}' does not close '#{}'", terminator(name), owner.name),
                ));
            }
        }
    }
    Err(unterminated(owner))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions(source: &str) -> Vec<Region<'_>> {
        let mut scanner = Scanner::new(source, 0..source.len());
        let mut out = Vec::new();
        while let Some(region) = scanner.next_region().unwrap() {
            out.push(region);
        }
        out
    }

    #[test]
    fn test_regions() {
        let source = "Hi $$name$$! $$#if x > 1$$big$$/if$$";
        let found = regions(source);
        assert_eq!(found[0], Region::Text(0..3));
        assert_eq!(
            found[1],
            Region::Expr {
                text: "name",
                span: Span::new(5, 9)
            }
        );
        let Region::Open(tag) = found[3] else {
            panic!("expected tag, got {:?}", found[3]);
        };
        assert_eq!((tag.name, tag.args), ("if", "x > 1"));
        assert_eq!(&source[tag.args_span.start as usize..tag.args_span.end as usize], "x > 1");
        assert!(matches!(found[5], Region::Close { name: "if", .. }));
    }

    #[test]
    fn test_context_reference_after_marker() {
        let found = regions("$$$0$$");
        assert_eq!(
            found,
            vec![Region::Expr {
                text: "$0",
                span: Span::new(2, 4)
            }]
        );
    }

    #[test]
    fn test_unterminated_and_empty_regions() {
        let mut scanner = Scanner::new("a $$name", 0..8);
        scanner.next_region().unwrap();
        let err = scanner.next_region().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedRegion);

        let mut scanner = Scanner::new("$$  $$", 0..6);
        assert_eq!(scanner.next_region().unwrap_err().kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_nested_sections_step_over_inner_directives() {
        let registry = Registry::standard();
        let source = "$$#if a$$x$$#if b$$y$$#else$$z$$/if$$$$#elif c$$w$$#else$$v$$/if$$tail";
        let mut scanner = Scanner::new(source, 0..source.len());
        let Some(Region::Open(tag)) = scanner.next_region().unwrap() else {
            panic!("expected tag");
        };
        let body = find_body(source, &registry, &tag, source.len()).unwrap().unwrap();
        let controls: Vec<_> = body
            .sections
            .iter()
            .map(|s| s.control.map(|t| t.name))
            .collect();
        assert_eq!(controls, vec![None, Some("elif"), Some("else")]);
        assert_eq!(&source[body.sections[0].range.clone()], "x$$#if b$$y$$#else$$z$$/if$$");
        assert_eq!(&source[body.end..], "tail");
    }

    #[test]
    fn test_verbatim_body_is_not_scanned() {
        let registry = Registry::standard();
        let source = "$$#literal$$$$#if$$ $$oops$$/literal$$";
        let mut scanner = Scanner::new(source, 0..source.len());
        let Some(Region::Open(tag)) = scanner.next_region().unwrap() else {
            panic!("expected tag");
        };
        let body = find_body(source, &registry, &tag, source.len()).unwrap().unwrap();
        assert_eq!(&source[body.sections[0].range.clone()], "$$#if$$ $$oops");
    }

    #[test]
    fn test_mismatched_terminator() {
        let registry = Registry::standard();
        let source = "$$#each xs$$a$$/if$$";
        let mut scanner = Scanner::new(source, 0..source.len());
        let Some(Region::Open(tag)) = scanner.next_region().unwrap() else {
            panic!("expected tag");
        };
        let err = find_body(source, &registry, &tag, source.len()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.contains("does not close '#each'"));
    }
}
