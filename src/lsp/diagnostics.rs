//! Convert Motoko compiler diagnostics to LSP diagnostics

use tower_lsp::lsp_types::{self, DiagnosticSeverity, NumberOrString, Position};

use motoko_syntax::diagnostics::{Diagnostic, LineCol, Range, Severity};

pub fn to_position(at: LineCol) -> Position {
    Position::new(at.line, at.character)
}

pub fn to_range(range: &Range) -> lsp_types::Range {
    lsp_types::Range::new(to_position(range.start), to_position(range.end))
}

fn to_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

/// Convert a compiler diagnostic to its LSP form.
pub fn to_lsp_diagnostic(diagnostic: &Diagnostic) -> lsp_types::Diagnostic {
    lsp_types::Diagnostic {
        range: to_range(&diagnostic.range),
        severity: Some(to_severity(diagnostic.severity)),
        code: diagnostic.code.clone().map(NumberOrString::String),
        source: Some("motoko".to_string()),
        message: format!("{}: {}", diagnostic.category, diagnostic.message),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motoko_syntax::diagnostics::Category;

    #[test]
    fn test_diagnostic_conversion() {
        let at = |character| LineCol { line: 0, character };
        let diagnostic = Diagnostic {
            range: Range { start: at(2), end: at(2) },
            severity: Severity::Error,
            source: "bad.mo".into(),
            code: Some("M0001".into()),
            category: Category::Syntax,
            message: "unexpected end of input".into(),
        };
        let lsp = to_lsp_diagnostic(&diagnostic);
        assert_eq!(lsp.range.start, Position::new(0, 2));
        assert_eq!(lsp.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(lsp.code, Some(NumberOrString::String("M0001".into())));
        assert_eq!(lsp.message, "syntax error: unexpected end of input");
    }
}
