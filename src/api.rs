//! Result shapes of the in-process API.
//!
//! Every operation of [`Session`] returns one of the types below. They serialize with camelCase field names, so
//! `serde_json::to_string` yields the wire shape tools consume:
//!
//! - [`CompileResult`]: `{"diagnostics": [..], "code": .. | null}`
//! - [`RunResult`]: `{"stdout": .., "stderr": .., "result": {"error": null | {}}}`
//!
//! ## Notes
//! - `code` is present only when no diagnostic is an error. [`ParseResult`] is the exception: a recovered tree is
//!   returned alongside the syntax errors it recovered from.
//! - [`parse`] needs no session: it neither reads the store nor consults flags.
//!
//! ## Examples
//! ```rust
//! use motoko::api;
//!
//! let strict = api::parse("1+", false);
//! assert!(strict.code.is_none());
//! assert_eq!(strict.diagnostics[0].code.as_deref(), Some("M0001"));
//!
//! let recovered = api::parse("1+", true);
//! assert!(recovered.code.is_some());
//! ```

use std::sync::Arc;

use serde::Serialize;

use motoko_syntax::diagnostics::{Diagnostic, LineIndex};
use motoko_syntax::parser;
use motoko_syntax::syntax_tree::{self, SyntaxNode};

use crate::frontend::scope::ModuleScope;

pub use crate::backend::{Target, WasmArtifact};
pub use crate::frontend::cache::ScopeCache;
pub use crate::frontend::dot::{ContextualSuggestion, DotCallBinding};
pub use crate::session::{Session, default_session};
pub use motoko_syntax::syntax_tree::ExpHandle;

/// Source name of texts parsed with [`parse`].
pub const INLINE_SOURCE: &str = "";

/// Diagnostics of an operation plus its artifact, present only when no diagnostic is an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileResult<T> {
    pub diagnostics: Vec<Diagnostic>,
    pub code: Option<T>,
}

impl<T> CompileResult<T> {
    /// Pair `diagnostics` with the artifact `make` builds, unless a diagnostic is an error.
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>, make: impl FnOnce() -> T) -> Self {
        let code = if diagnostics.iter().any(Diagnostic::is_error) {
            None
        } else {
            Some(make())
        };
        Self { diagnostics, code }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Outcome of [`parse`]: the (possibly recovered) tree and every syntax error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub diagnostics: Vec<Diagnostic>,
    pub code: Option<SyntaxNode>,
}

/// A typed tree with the scope of its unit.
#[derive(Debug, Clone, Serialize)]
pub struct TypedUnit {
    pub ast: SyntaxNode,
    pub scope: Arc<ModuleScope>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedUnitWithImports {
    pub ast: SyntaxNode,
    /// Unit paths (and `mo:prim`) the unit imports directly, in source order.
    pub immediate_imports: Vec<String>,
    pub scope: Arc<ModuleScope>,
}

/// Outcome of interpreting a program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
    pub result: RunStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStatus {
    pub error: Option<RunError>,
}

/// Marker of a failed run. Details are in `stderr`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunError {}

impl RunResult {
    pub fn failed(&self) -> bool {
        self.result.error.is_some()
    }
}

/// Parse `text` into an untyped tree.
///
/// Without `recover`, the first syntax error ends parsing and `code` is `None`. With it, `code` holds the recovered
/// tree whenever a program skeleton could be built.
#[tracing::instrument(skip_all, fields(len = text.len(), recover))]
pub fn parse(text: &str, recover: bool) -> ParseResult {
    let outcome = parser::parse_source(text, recover);
    let index = LineIndex::new(text);
    let diagnostics = outcome
        .errors
        .iter()
        .map(|e| e.to_diagnostic(&index, INLINE_SOURCE))
        .collect();
    let code = outcome
        .program
        .map(|program| syntax_tree::lower_program(&program, INLINE_SOURCE, &index, None));
    ParseResult { diagnostics, code }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_reports_the_first_error_only() {
        let result = parse("1+", false);
        assert!(result.code.is_none());
        assert_eq!(result.diagnostics.len(), 1);
        let error = &result.diagnostics[0];
        assert_eq!(error.range.start.character, 2);
        assert_eq!(error.range.end.character, 2);
        assert_eq!(
            error.message,
            "unexpected end of input, expected one of token or <phrase> sequence:\n  <exp_bin(ob)> (e.g. '42')"
        );
    }

    #[test]
    fn compile_results_serialize_in_wire_shape() {
        let result: CompileResult<()> = CompileResult::from_diagnostics(Vec::new(), || ());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"diagnostics": [], "code": null}));
    }

    #[test]
    fn failed_runs_serialize_an_empty_error_object() {
        let run = RunResult {
            stdout: String::new(),
            stderr: "boom\n".into(),
            result: RunStatus { error: Some(RunError {}) },
        };
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["result"], serde_json::json!({"error": {}}));
        assert!(run.failed());
        assert_eq!(
            serde_json::to_value(RunResult::default()).unwrap()["result"],
            serde_json::json!({"error": null})
        );
    }
}
