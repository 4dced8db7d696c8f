//! Module resolution for multi-unit programs.
//!
//! Starting from the entry units, follows imports through the virtual store, detects cycles, and checks every unit
//! in dependency order so importers see finished scopes. Parse and check results are reused from the
//! [`ScopeCache`] when fingerprints allow.
//!
//! ## Import forms
//!
//! - `"lib"`, `"./util/text.mo"`, `"/abs/x"`: unit paths relative to the importer; `.mo` is implied, and a
//!   directory `x` resolves to `x/lib.mo` when `x.mo` does not exist.
//! - `"mo:prim"`: the built-in primitive module.
//! - `"mo:<package>/<path>"`: a unit under a package registered with `--package <name> <dir>`.
//! - `"blob:<...>"`: a `Blob` placeholder, accepted only with `--blob-import-placeholders`.
//!
//! ## Notes
//! - A missing entry unit is a [`ResourceError`]. A missing import is a diagnostic on the import.
//! - Diagnostics are collected per unit in dependency order: syntax, import, then type diagnostics.

use std::collections::HashMap;
use std::sync::Arc;

use motoko_core::lang::codes;
use motoko_syntax::ast::{Program, Span};
use motoko_syntax::diagnostics::{CompileError, Diagnostic, LineIndex};
use motoko_syntax::parser;

use super::cache::{self, CheckedEntry, ParsedEntry, ScopeCache};
use super::scope::{ModuleScope, PRIM_URI, prim_scope};
use super::semantic::TypeCheckInfo;
use super::typechecker::{self, ImportTarget};
use crate::config::Flags;
use crate::vfs::{self, ResourceError, VirtualFs};

/// Where an import declaration leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKey {
    /// Another unit of the program, by normalized path.
    Unit(String),
    Prim,
    Blob,
    /// Resolution failed and a diagnostic was reported.
    Failed,
}

/// One import declaration of a unit.
#[derive(Debug, Clone)]
pub struct UnitImport {
    /// The import path as written.
    pub written: String,
    pub key: ImportKey,
}

/// A parsed and checked unit.
#[derive(Debug, Clone)]
pub struct ResolvedUnit {
    pub path: String,
    pub text: String,
    pub program: Arc<Program>,
    pub imports: Vec<UnitImport>,
    pub scope: Arc<ModuleScope>,
    pub info: Arc<TypeCheckInfo>,
}

impl ResolvedUnit {
    /// URIs of the unit's immediate imports (units and `mo:prim`), in source order.
    pub fn immediate_imports(&self) -> Vec<String> {
        self.imports
            .iter()
            .filter_map(|import| match &import.key {
                ImportKey::Unit(path) => Some(path.clone()),
                ImportKey::Prim => Some(PRIM_URI.to_string()),
                ImportKey::Blob | ImportKey::Failed => None,
            })
            .collect()
    }
}

/// Outcome of resolving a program.
#[derive(Debug)]
pub struct Resolution {
    /// Every unit that parsed, in dependency order (imports before importers).
    pub units: Vec<ResolvedUnit>,
    pub diagnostics: Vec<Diagnostic>,
    pub cache: ScopeCache,
}

impl Resolution {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn unit(&self, path: &str) -> Option<&ResolvedUnit> {
        let path = vfs::normalize(path);
        self.units.iter().find(|u| u.path == path)
    }
}

/// Resolve and check the program rooted at `entries`.
///
/// ## Errors
///
/// Returns [`ResourceError`] when an entry unit cannot be read; nothing is checked in that case.
#[tracing::instrument(skip_all, fields(entries = entries.len(), recover))]
pub fn resolve(
    store: &VirtualFs,
    flags: &Flags,
    entries: &[String],
    recover: bool,
    cache: ScopeCache,
) -> Result<Resolution, ResourceError> {
    let mut resolver = ModuleResolver::new(store, flags, recover, cache);
    for entry in entries {
        let path = vfs::normalize(entry);
        let text = store.read(&path)?;
        resolver.visit(path, text);
    }
    Ok(resolver.check_all())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// A unit loaded from the store and parsed.
struct LoadedUnit {
    text: String,
    own: blake3::Hash,
    program: Option<Arc<Program>>,
    imports: Vec<UnitImport>,
    /// Syntax errors, then import errors.
    errors: Vec<CompileError>,
}

struct ModuleResolver<'a> {
    store: &'a VirtualFs,
    flags: &'a Flags,
    flags_fingerprint: String,
    recover: bool,
    cache: ScopeCache,
    state: HashMap<String, Visit>,
    units: HashMap<String, LoadedUnit>,
    /// Post-order of the import graph.
    order: Vec<String>,
}

impl<'a> ModuleResolver<'a> {
    fn new(store: &'a VirtualFs, flags: &'a Flags, recover: bool, cache: ScopeCache) -> Self {
        Self {
            store,
            flags,
            flags_fingerprint: flags.fingerprint(),
            recover,
            cache,
            state: HashMap::new(),
            units: HashMap::new(),
            order: Vec::new(),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load `path`, then everything it imports, depth first.
    fn visit(&mut self, path: String, text: String) {
        if self.state.contains_key(&path) {
            return;
        }
        self.state.insert(path.clone(), Visit::InProgress);

        let own = cache::text_fingerprint(&text, &self.flags_fingerprint, self.recover);
        let parsed = match self.cache.parsed(&path, &own) {
            Some(parsed) => {
                tracing::debug!(unit = %path, "reusing parse result");
                parsed.clone()
            }
            None => {
                let outcome = parser::parse_source(&text, self.recover);
                let parsed = ParsedEntry {
                    program: outcome.program.map(Arc::new),
                    errors: outcome.errors,
                };
                self.cache.store_parsed(&path, own, parsed.clone());
                parsed
            }
        };

        let mut errors = parsed.errors;
        let mut imports = Vec::new();
        if let Some(program) = &parsed.program {
            for (import, _) in program.imports() {
                let written = import.path.node.clone();
                let key = self.import_key(&path, &written, import.path.span, &mut errors);
                imports.push(UnitImport { written, key });
            }
        }

        self.units.insert(
            path.clone(),
            LoadedUnit {
                text,
                own,
                program: parsed.program,
                imports,
                errors,
            },
        );
        self.state.insert(path.clone(), Visit::Done);
        self.order.push(path);
    }

    /// Resolve one import of `importer`, loading the imported unit if needed.
    fn import_key(&mut self, importer: &str, written: &str, span: Span, errors: &mut Vec<CompileError>) -> ImportKey {
        let target = match self.target_path(importer, written) {
            Ok(Some(target)) => target,
            Ok(None) if written.starts_with("blob:") => return ImportKey::Blob,
            Ok(None) => return ImportKey::Prim,
            Err(message) => {
                errors.push(CompileError::other(codes::IMPORT_UNSUPPORTED, message, span));
                return ImportKey::Failed;
            }
        };

        match self.state.get(&target) {
            Some(Visit::Done) => return ImportKey::Unit(target),
            Some(Visit::InProgress) => {
                errors.push(CompileError::other(
                    codes::CYCLIC_IMPORT,
                    format!("file {target} must not depend on itself"),
                    span,
                ));
                return ImportKey::Failed;
            }
            None => {}
        }

        match self.store.read(&target) {
            Ok(text) => {
                self.visit(target.clone(), text);
                ImportKey::Unit(target)
            }
            Err(err) => {
                tracing::debug!(importer, target = %target, error = %err, "import not found");
                errors.push(CompileError::other(
                    codes::IMPORT_NOT_FOUND,
                    format!("file \"{target}\" does not exist"),
                    span,
                ));
                ImportKey::Failed
            }
        }
    }

    /// Unit path an import refers to; `Ok(None)` for `mo:prim` and accepted blob placeholders.
    fn target_path(&self, importer: &str, written: &str) -> Result<Option<String>, String> {
        if let Some(rest) = written.strip_prefix("blob:") {
            if self.flags.blob_import_placeholders {
                return Ok(None);
            }
            return Err(format!(
                "blob import placeholder \"{rest}\" requires --blob-import-placeholders"
            ));
        }
        if let Some(rest) = written.strip_prefix("mo:") {
            if rest == "prim" {
                return Ok(None);
            }
            let (package, inner) = rest.split_once('/').unwrap_or((rest, "lib"));
            let Some(dir) = self.flags.packages.get(package) else {
                return Err(format!("package \"{package}\" not defined"));
            };
            return Ok(Some(self.unit_file(&vfs::join(dir, inner))));
        }
        if written.contains(':') {
            return Err(format!("unsupported import URI \"{written}\""));
        }
        Ok(Some(self.unit_file(&vfs::join(vfs::parent(importer), written))))
    }

    /// `path.mo`, or `path/lib.mo` for a directory module.
    fn unit_file(&self, path: &str) -> String {
        if path.ends_with(".mo") {
            return path.to_string();
        }
        let file = format!("{path}.mo");
        if self.store.exists(&file) {
            return file;
        }
        let lib = format!("{path}/lib.mo");
        if self.store.exists(&lib) {
            return lib;
        }
        file
    }

    // ========================================================================
    // Checking
    // ========================================================================

    /// Check every parsed unit in dependency order.
    fn check_all(mut self) -> Resolution {
        let mut resolved: Vec<ResolvedUnit> = Vec::new();
        let mut fingerprints: HashMap<String, blake3::Hash> = HashMap::new();
        let mut diagnostics = Vec::new();

        for path in std::mem::take(&mut self.order) {
            let Some(unit) = self.units.remove(&path) else {
                continue;
            };
            let index = LineIndex::new(&unit.text);
            diagnostics.extend(unit.errors.iter().map(|e| e.to_diagnostic(&index, &path)));

            let Some(program) = unit.program else {
                continue;
            };

            let mut targets = HashMap::new();
            let mut keys: Vec<Vec<u8>> = Vec::new();
            for import in &unit.imports {
                let (target, key) = match &import.key {
                    ImportKey::Unit(dep) => match resolved.iter().find(|u| &u.path == dep) {
                        Some(dep_unit) => (
                            ImportTarget::Module {
                                uri: dep.clone(),
                                scope: dep_unit.scope.clone(),
                            },
                            fingerprints
                                .get(dep)
                                .map(|h| h.as_bytes().to_vec())
                                .unwrap_or_default(),
                        ),
                        None => (ImportTarget::Unresolved, format!("unparsed:{dep}").into_bytes()),
                    },
                    ImportKey::Prim => (
                        ImportTarget::Module {
                            uri: PRIM_URI.to_string(),
                            scope: prim_scope(),
                        },
                        PRIM_URI.as_bytes().to_vec(),
                    ),
                    ImportKey::Blob => (ImportTarget::Blob, b"blob".to_vec()),
                    ImportKey::Failed => (ImportTarget::Unresolved, format!("failed:{}", import.written).into_bytes()),
                };
                targets.insert(import.written.clone(), target);
                keys.push(key);
            }
            let deps = cache::deps_fingerprint(keys.iter().map(Vec::as_slice));
            fingerprints.insert(path.clone(), cache::combined_fingerprint(&unit.own, &deps));

            let checked = match self.cache.checked(&path, &unit.own, &deps) {
                Some(hit) => {
                    tracing::debug!(unit = %path, "scope cache hit");
                    hit.clone()
                }
                None => {
                    let output = typechecker::check_unit(&program, &path, &targets, self.flags);
                    let checked = CheckedEntry {
                        deps,
                        scope: output.scope,
                        info: output.info,
                        errors: output.errors,
                    };
                    self.cache.store_checked(&path, checked.clone());
                    checked
                }
            };
            diagnostics.extend(checked.errors.iter().map(|e| e.to_diagnostic(&index, &path)));

            resolved.push(ResolvedUnit {
                path,
                text: unit.text,
                program,
                imports: unit.imports,
                scope: checked.scope,
                info: checked.info,
            });
        }

        Resolution {
            units: resolved,
            diagnostics,
            cache: self.cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(units: &[(&str, &str)]) -> VirtualFs {
        let mut store = VirtualFs::in_memory();
        for (path, text) in units {
            store.save(path, *text);
        }
        store
    }

    fn entry(path: &str) -> Vec<String> {
        vec![path.to_string()]
    }

    const LIB: &str = "module { public func foo(self : Text) { ignore self } }";

    #[test]
    fn test_resolve_orders_dependencies_first() {
        let store = store(&[("main.mo", "import Lib \"lib\"; Lib.foo(\"x\")"), ("lib.mo", LIB)]);
        let resolution = resolve(&store, &Flags::default(), &entry("main.mo"), false, ScopeCache::new()).unwrap();
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
        let paths: Vec<&str> = resolution.units.iter().map(|u| u.path.as_str()).collect();
        assert_eq!(paths, vec!["lib.mo", "main.mo"]);
        assert_eq!(resolution.unit("main.mo").unwrap().immediate_imports(), vec!["lib.mo"]);
    }

    #[test]
    fn test_missing_entry_is_a_resource_error() {
        let err = resolve(&VirtualFs::in_memory(), &Flags::default(), &entry("nope.mo"), false, ScopeCache::new())
            .unwrap_err();
        assert!(err.to_string().contains("No such file or directory"));
    }

    #[test]
    fn test_missing_import_is_a_diagnostic() {
        let store = store(&[("main.mo", "import X \"missing\"; 1")]);
        let resolution = resolve(&store, &Flags::default(), &entry("main.mo"), false, ScopeCache::new()).unwrap();
        assert_eq!(resolution.diagnostics.len(), 1);
        let diag = &resolution.diagnostics[0];
        assert_eq!(diag.code.as_deref(), Some(codes::IMPORT_NOT_FOUND));
        assert_eq!(diag.message, "file \"missing.mo\" does not exist");
        assert_eq!(diag.source, "main.mo");
    }

    #[test]
    fn test_import_cycle_is_reported_once() {
        let store = store(&[
            ("a.mo", "import B \"b\"; module {}"),
            ("b.mo", "import A \"a\"; module {}"),
        ]);
        let resolution = resolve(&store, &Flags::default(), &entry("a.mo"), false, ScopeCache::new()).unwrap();
        let codes: Vec<_> = resolution.diagnostics.iter().filter_map(|d| d.code.as_deref()).collect();
        assert_eq!(codes, vec![codes::CYCLIC_IMPORT]);
        assert_eq!(resolution.diagnostics[0].source, "b.mo");
    }

    #[test]
    fn test_prim_and_blob_imports() {
        let store = store(&[("main.mo", "import Prim \"mo:prim\"; import B \"blob:file:x\"; Prim.natToText(1)")]);
        let resolution = resolve(&store, &Flags::default(), &entry("main.mo"), false, ScopeCache::new()).unwrap();
        let codes: Vec<_> = resolution.diagnostics.iter().filter_map(|d| d.code.as_deref()).collect();
        assert_eq!(codes, vec![codes::IMPORT_UNSUPPORTED]);

        let flags = Flags {
            blob_import_placeholders: true,
            ..Flags::default()
        };
        let resolution = resolve(&store, &flags, &entry("main.mo"), false, ScopeCache::new()).unwrap();
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
        assert_eq!(resolution.units[0].scope.export.to_string(), "Text");
    }

    #[test]
    fn test_packages_resolve_under_their_directory() {
        let store = store(&[("main.mo", "import T \"mo:base/Text\"; T.foo(\"x\")"), ("vendor/base/Text.mo", LIB)]);
        let mut flags = Flags::default();
        flags.packages.insert("base".into(), "vendor/base".into());
        let resolution = resolve(&store, &flags, &entry("main.mo"), false, ScopeCache::new()).unwrap();
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
        assert!(resolution.unit("vendor/base/Text.mo").is_some());

        let resolution = resolve(&store, &Flags::default(), &entry("main.mo"), false, ScopeCache::new()).unwrap();
        assert_eq!(resolution.diagnostics[0].message, "package \"base\" not defined");
    }

    #[test]
    fn test_cache_reuses_unchanged_scopes() {
        let mut store = store(&[("main.mo", "import Lib \"lib\"; Lib.foo(\"x\")"), ("lib.mo", LIB)]);
        let flags = Flags::default();
        let first = resolve(&store, &flags, &entry("main.mo"), false, ScopeCache::new()).unwrap();
        let lib_scope = first.unit("lib.mo").unwrap().scope.clone();
        let main_scope = first.unit("main.mo").unwrap().scope.clone();

        let second = resolve(&store, &flags, &entry("main.mo"), false, first.cache).unwrap();
        assert!(Arc::ptr_eq(&second.unit("lib.mo").unwrap().scope, &lib_scope));
        assert!(Arc::ptr_eq(&second.unit("main.mo").unwrap().scope, &main_scope));

        store.save("lib.mo", "module { public func foo(self : Text) { ignore self }; public let n = 1 }");
        let third = resolve(&store, &flags, &entry("main.mo"), false, second.cache).unwrap();
        assert!(!Arc::ptr_eq(&third.unit("lib.mo").unwrap().scope, &lib_scope));
        assert!(!Arc::ptr_eq(&third.unit("main.mo").unwrap().scope, &main_scope));
    }

    #[test]
    fn test_syntax_errors_keep_other_units() {
        let store = store(&[("main.mo", "import Lib \"lib\"; 1 +"), ("lib.mo", LIB)]);
        let resolution = resolve(&store, &Flags::default(), &entry("main.mo"), false, ScopeCache::new()).unwrap();
        assert!(resolution.has_errors());
        assert!(resolution.unit("main.mo").is_none());

        let recovered = resolve(&store, &Flags::default(), &entry("main.mo"), true, ScopeCache::new()).unwrap();
        assert!(recovered.has_errors());
        assert!(recovered.unit("main.mo").is_some());
        assert!(recovered.unit("lib.mo").is_some());
    }

    #[test]
    fn test_cached_strict_parse_is_not_reused_when_recovering() {
        let store = store(&[("main.mo", "let a = 1 +; let b : = 2; let c = 3;")]);
        let flags = Flags::default();
        let fresh = resolve(&store, &flags, &entry("main.mo"), true, ScopeCache::new()).unwrap();
        assert!(fresh.diagnostics.len() > 1, "{:?}", fresh.diagnostics);

        let strict = resolve(&store, &flags, &entry("main.mo"), false, ScopeCache::new()).unwrap();
        assert_eq!(strict.diagnostics.len(), 1);
        assert!(strict.unit("main.mo").is_none());

        let recovered = resolve(&store, &flags, &entry("main.mo"), true, strict.cache).unwrap();
        assert_eq!(recovered.diagnostics, fresh.diagnostics);
        assert!(recovered.unit("main.mo").is_some());

        let strict_again = resolve(&store, &flags, &entry("main.mo"), false, recovered.cache).unwrap();
        assert_eq!(strict_again.diagnostics, strict.diagnostics);
        assert!(strict_again.unit("main.mo").is_none());
    }
}
