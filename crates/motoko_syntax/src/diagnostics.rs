//! Diagnostics for the Motoko frontend.
//!
//! Two shapes live here:
//! - [`CompileError`]: what stages produce while working on one unit, positioned by byte [`Span`].
//! - [`Diagnostic`]: the wire shape handed to API callers, positioned by 0-based line / Unicode-scalar character
//!   and tagged with the unit path.
//!
//! [`LineIndex`] converts between the two. [`SourceReport`] renders a [`Diagnostic`] through `miette` for the CLI.
//!
//! ## Notes
//! - Severity serializes as the integers `1..=4` (error, warning, information, hint).
//! - Diagnostics are never mutated after creation; lists keep discovery order.

use std::fmt;

use miette::{LabeledSpan, NamedSource, SourceSpan};
use motoko_core::lang::codes;
use serde::{Serialize, Serializer};

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Information => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Syntax,
    Type,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Syntax => write!(f, "syntax error"),
            Category::Type => write!(f, "type error"),
            Category::Other => write!(f, "error"),
        }
    }
}

/// A compile-time error or warning with a byte-offset location inside one unit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub code: &'static str,
    pub category: Category,
    pub severity: Severity,
}

impl CompileError {
    pub fn syntax(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            code: codes::SYNTAX_ERROR,
            category: Category::Syntax,
            severity: Severity::Error,
        }
    }

    pub fn type_error(code: &'static str, message: String, span: Span) -> Self {
        Self {
            message,
            span,
            code,
            category: Category::Type,
            severity: Severity::Error,
        }
    }

    pub fn warning(code: &'static str, message: String, span: Span) -> Self {
        Self {
            message,
            span,
            code,
            category: Category::Type,
            severity: Severity::Warning,
        }
    }

    pub fn other(code: &'static str, message: String, span: Span) -> Self {
        Self {
            message,
            span,
            code,
            category: Category::Other,
            severity: Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Convert to the wire shape for the unit at `source`.
    pub fn to_diagnostic(&self, index: &LineIndex<'_>, source: &str) -> Diagnostic {
        Diagnostic {
            range: index.range(self.span),
            severity: self.severity,
            source: source.to_string(),
            code: Some(self.code.to_string()),
            category: self.category,
            message: self.message.clone(),
        }
    }
}

/// Zero-based line and Unicode-scalar character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LineCol {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    pub start: LineCol,
    pub end: LineCol,
}

/// A diagnostic as reported to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub source: String,
    pub code: Option<String>,
    pub category: Category,
    pub message: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render in the driver's one-line form: `file:l1.c1-l2.c2: type error [M0057], unbound variable x`.
    ///
    /// Lines and columns are 1-based in this form.
    pub fn render_line(&self) -> String {
        let kind = match self.severity {
            Severity::Error => self.category.to_string(),
            other => other.to_string(),
        };
        let code = self.code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default();
        format!(
            "{}:{}: {kind}{code}, {}",
            self.source,
            format_range(&self.range),
            self.message
        )
    }
}

/// Format a range as `l1.c1-l2.c2` with 1-based lines and columns.
pub fn format_range(range: &Range) -> String {
    format!(
        "{}.{}-{}.{}",
        range.start.line + 1,
        range.start.character + 1,
        range.end.line + 1,
        range.end.character + 1
    )
}

/// Maps byte offsets of one text to line/character positions.
///
/// ## Notes
/// - Lines that are pure ASCII convert in O(1); other lines count scalars from the line start, so the cost of a
///   lookup is bounded by the length of one line.
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
    ascii_lines: Vec<bool>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        let mut ascii_lines = Vec::new();
        let mut ascii = true;
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
                ascii_lines.push(ascii);
                ascii = true;
            } else if !b.is_ascii() {
                ascii = false;
            }
        }
        ascii_lines.push(ascii);
        Self {
            text,
            line_starts,
            ascii_lines,
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn line_col(&self, offset: usize) -> LineCol {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let character = if self.ascii_lines[line] {
            offset - start
        } else {
            self.text
                .get(start..offset)
                .map(|s| s.chars().count())
                .unwrap_or(offset - start)
        };
        LineCol {
            line: line as u32,
            character: character as u32,
        }
    }

    pub fn range(&self, span: Span) -> Range {
        Range {
            start: self.line_col(span.start),
            end: self.line_col(span.end),
        }
    }

    /// Byte offset of a line/character position, clamped to the text.
    pub fn offset(&self, pos: LineCol) -> usize {
        let Some(&start) = self.line_starts.get(pos.line as usize) else {
            return self.text.len();
        };
        let line_end = self
            .line_starts
            .get(pos.line as usize + 1)
            .copied()
            .unwrap_or(self.text.len());
        if self.ascii_lines[pos.line as usize] {
            return (start + pos.character as usize).min(line_end);
        }
        self.text[start..line_end]
            .char_indices()
            .nth(pos.character as usize)
            .map(|(i, _)| start + i)
            .unwrap_or(line_end)
    }
}

/// A [`Diagnostic`] paired with its source text, renderable by `miette`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SourceReport {
    message: String,
    code: Option<String>,
    severity: Severity,
    category: Category,
    source_code: NamedSource<String>,
    span: SourceSpan,
}

impl SourceReport {
    pub fn new(diagnostic: &Diagnostic, text: &str) -> Self {
        let index = LineIndex::new(text);
        let start = index.offset(diagnostic.range.start);
        let end = index.offset(diagnostic.range.end).max(start);
        Self {
            message: diagnostic.message.clone(),
            code: diagnostic.code.clone(),
            severity: diagnostic.severity,
            category: diagnostic.category,
            source_code: NamedSource::new(&diagnostic.source, text.to_string()),
            span: SourceSpan::from((start, end - start)),
        }
    }
}

impl miette::Diagnostic for SourceReport {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.code
            .as_ref()
            .map(|c| Box::new(format!("{} [{c}]", self.category)) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Information | Severity::Hint => miette::Severity::Advice,
        })
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source_code)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(None, self.span))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_scalars_on_non_ascii_lines() {
        let text = "let s = \"⛔×\";\nx";
        let index = LineIndex::new(text);
        let semi = text.find(';').unwrap_or_default();
        assert_eq!(index.line_col(semi), LineCol { line: 0, character: 12 });
        assert_eq!(index.line_col(text.len()), LineCol { line: 1, character: 1 });
        assert_eq!(index.offset(LineCol { line: 0, character: 12 }), semi);
    }

    #[test]
    fn severity_serializes_as_integer() {
        let json = serde_json::to_string(&Severity::Warning).unwrap_or_default();
        assert_eq!(json, "2");
    }

    #[test]
    fn render_line_uses_one_based_positions() {
        let index = LineIndex::new("x");
        let err = CompileError::type_error(codes::UNBOUND_VARIABLE, "unbound variable x".into(), Span::new(0, 1));
        let diag = err.to_diagnostic(&index, "a.mo");
        assert_eq!(diag.render_line(), "a.mo:1.1-1.2: type error [M0057], unbound variable x");
    }
}
