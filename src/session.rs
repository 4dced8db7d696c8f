//! Compiler sessions.
//!
//! A [`Session`] owns everything that persists between operations: the unit store, the flags set through
//! [`Session::set_extra_flags`] and the semantic arena behind the handles of typed trees. Operations run
//! synchronously to completion; a flag change is seen by every later operation of the same session.
//!
//! ## Notes
//! - `Session` is `Send` but not internally synchronized. [`default_session`] wraps one process-wide instance in a
//!   `Mutex` for callers that want a single shared session.
//! - Handles are only meaningful to the session that produced them. Queries with a foreign handle return nothing.
//!
//! ## Examples
//! ```rust
//! use motoko::api::{Session, Target};
//!
//! let mut session = Session::new();
//! session.save_unit("main.mo", "actor { public query func hi() : async Nat { 1 } }");
//! let result = session.compile(Target::Wasi, "main.mo").unwrap();
//! assert!(result.diagnostics.is_empty());
//! assert_eq!(&result.code.unwrap().bytes[..4], b"\0asm");
//! ```

use std::sync::{Mutex, OnceLock};

use motoko_syntax::diagnostics::{Category, Diagnostic, LineCol, LineIndex, Range, Severity};
use motoko_syntax::syntax_tree::{self, ExpHandle, SyntaxNode};

use crate::api::{
    CompileResult, RunError, RunResult, TypedUnit, TypedUnitWithImports,
};
use crate::backend::{self, CodegenError, Target, WasmArtifact};
use crate::config::{ConfigError, Flags};
use crate::frontend::cache::ScopeCache;
use crate::frontend::dot::{self, ContextualSuggestion, DotCallBinding};
use crate::frontend::resolver::{self, Resolution, ResolvedUnit};
use crate::frontend::scope::ModuleScope;
use crate::frontend::semantic::SemanticArena;
use crate::vfs::{ResourceError, VirtualFs};
use crate::{interface, interp};

#[derive(Debug, Default)]
pub struct Session {
    store: VirtualFs,
    flags: Flags,
    arena: SemanticArena,
}

/// The process-wide session.
pub fn default_session() -> &'static Mutex<Session> {
    static DEFAULT: OnceLock<Mutex<Session>> = OnceLock::new();
    DEFAULT.get_or_init(|| Mutex::new(Session::new()))
}

impl Session {
    /// A session whose units live only in memory.
    pub fn new() -> Self {
        Self::with_store(VirtualFs::in_memory())
    }

    /// A session that reads unsaved units from disk, for compiling files in place.
    pub fn with_disk() -> Self {
        Self::with_store(VirtualFs::new())
    }

    pub fn with_store(store: VirtualFs) -> Self {
        Self {
            store,
            flags: Flags::default(),
            arena: SemanticArena::new(),
        }
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    // ---- unit store ----

    pub fn save_unit(&mut self, path: &str, text: impl Into<String>) {
        self.store.save(path, text);
    }

    pub fn read_unit(&self, path: &str) -> Result<String, ResourceError> {
        self.store.read(path)
    }

    pub fn remove_unit(&mut self, path: &str) {
        self.store.remove(path);
    }

    // ---- configuration ----

    pub fn set_blob_import_placeholders(&mut self, enabled: bool) {
        self.flags.blob_import_placeholders = enabled;
    }

    /// Apply `moc`-style flags. On error nothing changes.
    pub fn set_extra_flags(&mut self, args: &[String]) -> Result<(), ConfigError> {
        self.flags.apply_extra_flags(args)
    }

    // ---- typed trees ----

    /// Typed trees of `entries`, in entry order.
    pub fn parse_typed(&mut self, entries: &[String]) -> Result<CompileResult<Vec<TypedUnit>>, ResourceError> {
        let resolution = self.resolve(entries, false, ScopeCache::new())?;
        let units = entry_units(&resolution, entries);
        let arena = &mut self.arena;
        Ok(CompileResult::from_diagnostics(resolution.diagnostics.clone(), || {
            units
                .into_iter()
                .map(|unit| TypedUnit {
                    ast: typed_tree(arena, unit),
                    scope: unit.scope.clone(),
                })
                .collect()
        }))
    }

    /// Typed trees of `entries` with their immediate imports, reusing and returning `cache`.
    ///
    /// The updated cache is only handed back with the trees; when `code` is absent the caller keeps using its own.
    pub fn parse_typed_with_cache(
        &mut self,
        recover: bool,
        entries: &[String],
        cache: ScopeCache,
    ) -> Result<CompileResult<(Vec<TypedUnitWithImports>, ScopeCache)>, ResourceError> {
        let resolution = self.resolve(entries, recover, cache)?;
        let arena = &mut self.arena;
        let trees: Vec<TypedUnitWithImports> = if resolution.has_errors() {
            Vec::new()
        } else {
            entry_units(&resolution, entries)
                .into_iter()
                .map(|unit| TypedUnitWithImports {
                    ast: typed_tree(arena, unit),
                    immediate_imports: unit.immediate_imports(),
                    scope: unit.scope.clone(),
                })
                .collect()
        };
        let Resolution { diagnostics, cache, .. } = resolution;
        Ok(CompileResult::from_diagnostics(diagnostics, || (trees, cache)))
    }

    // ---- batch operations ----

    /// Check `path` and its imports. `code` is always absent.
    pub fn check(&self, path: &str) -> Result<CompileResult<()>, ResourceError> {
        let resolution = self.resolve(&[path.to_string()], false, ScopeCache::new())?;
        Ok(CompileResult {
            diagnostics: resolution.diagnostics,
            code: None,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn compile(&self, target: Target, path: &str) -> Result<CompileResult<WasmArtifact>, ResourceError> {
        let resolution = self.resolve(&[path.to_string()], false, ScopeCache::new())?;
        let mut diagnostics = resolution.diagnostics.clone();
        if resolution.has_errors() {
            return Ok(CompileResult { diagnostics, code: None });
        }
        let compiled = resolution
            .unit(path)
            .ok_or_else(|| CodegenError::MissingUnit(path.to_string()))
            .and_then(|unit| backend::compile_unit(unit, target));
        match compiled {
            Ok(artifact) => Ok(CompileResult {
                diagnostics,
                code: Some(artifact),
            }),
            Err(err) => {
                tracing::warn!(error = %err, "code generation failed");
                diagnostics.push(codegen_diagnostic(&err, path));
                Ok(CompileResult { diagnostics, code: None })
            }
        }
    }

    /// Candid interface of the actor `path` defines.
    pub fn extract_interface(&self, path: &str) -> Result<CompileResult<String>, ResourceError> {
        let resolution = self.resolve(&[path.to_string()], false, ScopeCache::new())?;
        let unit = resolution.unit(path);
        Ok(CompileResult::from_diagnostics(resolution.diagnostics.clone(), || {
            unit.map(interface::extract).unwrap_or_default()
        }))
    }

    /// Interpret the units `args` and then `path`.
    ///
    /// Diagnostics and execution faults are written to `stderr` in their one-line forms. A resource fault, an error
    /// diagnostic or an execution fault sets `result.error`.
    #[tracing::instrument(skip(self))]
    pub fn run(&self, args: &[String], path: &str) -> RunResult {
        let mut entries = args.to_vec();
        entries.push(path.to_string());
        let mut out = RunResult::default();

        let resolution = match self.resolve(&entries, false, ScopeCache::new()) {
            Ok(resolution) => resolution,
            Err(err) => {
                out.stderr = format!("{err}\n");
                out.result.error = Some(RunError {});
                return out;
            }
        };
        for diagnostic in &resolution.diagnostics {
            out.stderr.push_str(&diagnostic.render_line());
            out.stderr.push('\n');
        }
        if resolution.has_errors() {
            out.result.error = Some(RunError {});
            return out;
        }

        for entry in &entries {
            let execution = interp::execute(&resolution, entry);
            out.stdout.push_str(&execution.stdout);
            if let Some(error) = execution.error {
                out.stderr.push_str(&format!("{error}\n"));
                out.result.error = Some(RunError {});
                break;
            }
        }
        out
    }

    // ---- editor queries ----

    pub fn resolve_dot_call_binding(&self, handle: ExpHandle) -> Option<DotCallBinding> {
        dot::resolve_dot_call_binding(&self.arena, handle)
    }

    pub fn suggest_dot_completions(&self, scope: &ModuleScope, receiver: ExpHandle) -> Vec<ContextualSuggestion> {
        dot::suggest_dot_completions(&self.arena, scope, receiver)
    }

    fn resolve(&self, entries: &[String], recover: bool, cache: ScopeCache) -> Result<Resolution, ResourceError> {
        resolver::resolve(&self.store, &self.flags, entries, recover, cache)
    }
}

/// Resolved units of `entries`, in entry order. Entries that failed to parse are skipped.
fn entry_units<'r>(resolution: &'r Resolution, entries: &[String]) -> Vec<&'r ResolvedUnit> {
    entries.iter().filter_map(|entry| resolution.unit(entry)).collect()
}

fn typed_tree(arena: &mut SemanticArena, unit: &ResolvedUnit) -> SyntaxNode {
    let base = arena.register(&unit.info);
    let annotator = arena.annotator(&unit.info, base);
    let index = LineIndex::new(&unit.text);
    syntax_tree::lower_program(&unit.program, &unit.path, &index, Some(&annotator))
}

fn codegen_diagnostic(err: &CodegenError, path: &str) -> Diagnostic {
    let origin = LineCol { line: 0, character: 0 };
    Diagnostic {
        range: Range {
            start: origin,
            end: origin,
        },
        severity: Severity::Error,
        source: path.to_string(),
        code: None,
        category: Category::Other,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(files: &[(&str, &str)]) -> Session {
        let mut session = Session::new();
        for (path, text) in files {
            session.save_unit(path, *text);
        }
        session
    }

    #[test]
    fn sessions_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Session>();
    }

    #[test]
    fn check_never_returns_code() {
        let session = session_with(&[("ok.mo", "1"), ("bad.mo", "1+")]);
        let ok = session.check("ok.mo").unwrap();
        assert!(ok.diagnostics.is_empty());
        assert!(ok.code.is_none());
        let bad = session.check("bad.mo").unwrap();
        assert_eq!(bad.diagnostics.len(), 1);
        assert!(bad.code.is_none());
    }

    #[test]
    fn removed_units_are_resource_faults() {
        let mut session = session_with(&[("empty.mo", "")]);
        assert!(session.compile(Target::Wasi, "empty.mo").unwrap().code.is_some());
        session.remove_unit("empty.mo");
        let err = session.compile(Target::InternetComputer, "empty.mo").unwrap_err();
        assert!(err.to_string().contains("No such file or directory"));
    }

    #[test]
    fn typed_trees_are_produced_per_entry() {
        let session_files = [("lib.mo", "module { public func f() : Nat { 1 } }"), ("main.mo", "import L \"lib\"; L.f()")];
        let mut session = session_with(&session_files);
        let result = session.parse_typed(&["main.mo".into()]).unwrap();
        let units = result.code.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].scope.uri, "main.mo");

        let (units, cache) = session
            .parse_typed_with_cache(true, &["main.mo".into()], ScopeCache::new())
            .unwrap()
            .code
            .unwrap();
        assert_eq!(units[0].immediate_imports, vec!["lib.mo".to_string()]);
        assert_eq!(cache.paths(), vec!["lib.mo", "main.mo"]);
    }

    #[test]
    fn extra_flags_fail_synchronously_and_leave_flags_untouched() {
        let mut session = Session::new();
        session.set_extra_flags(&["-W=M0223".into()]).unwrap();
        let before = session.flags().clone();
        let err = session.set_extra_flags(&["--invalid-flag".into()]).unwrap_err();
        assert!(err.to_string().contains("unknown option"));
        let err = session.set_extra_flags(&["-W=MMM".into()]).unwrap_err();
        assert_eq!(err.to_string(), "moc: invalid warning code: MMM");
        assert_eq!(session.flags(), &before);
    }

    #[test]
    fn runs_report_diagnostics_on_stderr() {
        let session = session_with(&[("bad.mo", "1+")]);
        let run = session.run(&[], "bad.mo");
        assert!(run.failed());
        assert!(run.stderr.starts_with("bad.mo:1.3-1.3: syntax error [M0001], unexpected end of input"));
    }

    #[test]
    fn runs_of_missing_units_fail() {
        let run = Session::new().run(&[], "nope.mo");
        assert!(run.failed());
        assert_eq!(run.stderr, "nope.mo: No such file or directory\n");
    }
}
