//! Scope cache.
//!
//! Maps a unit path to the result of its last check together with two BLAKE3 fingerprints: one of the unit's own
//! text (with the session flags that influence checking and the parse mode), one of everything it transitively
//! imports. An entry is
//! reused only when both match, so editing a leaf module re-checks exactly the units that depend on it.
//!
//! ## Notes
//! - Entries keep the parsed tree too: a hit on the text fingerprint skips parsing even when dependencies changed.
//! - The cache is a plain value. The resolver takes it by value and hands the updated cache back; callers decide
//!   whether to keep it.

use std::collections::HashMap;
use std::sync::Arc;

use motoko_syntax::ast::Program;
use motoko_syntax::diagnostics::CompileError;

use super::scope::ModuleScope;
use super::semantic::TypeCheckInfo;

/// Fingerprint of a unit's text under a given flags fingerprint and parse mode.
///
/// Strict and recovering parses of one text produce different trees, so `recover` is part of the key.
pub fn text_fingerprint(text: &str, flags_fingerprint: &str, recover: bool) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(flags_fingerprint.as_bytes());
    hasher.update(&[0, u8::from(recover)]);
    hasher.update(text.as_bytes());
    hasher.finalize()
}

/// Fingerprint of a unit's dependencies, from one key per import in source order.
///
/// Keys of imported units are their combined fingerprints ([`combined_fingerprint`]), so a change anywhere below
/// changes every fingerprint above it.
pub fn deps_fingerprint<'a>(keys: impl IntoIterator<Item = &'a [u8]>) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for key in keys {
        hasher.update(&(key.len() as u64).to_le_bytes());
        hasher.update(key);
    }
    hasher.finalize()
}

/// Fingerprint covering a unit and everything it imports.
pub fn combined_fingerprint(own: &blake3::Hash, deps: &blake3::Hash) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(own.as_bytes());
    hasher.update(deps.as_bytes());
    hasher.finalize()
}

/// Parse result of one unit text.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    /// `None` when parsing failed without recovery.
    pub program: Option<Arc<Program>>,
    pub errors: Vec<CompileError>,
}

/// Check result of one unit under one dependency fingerprint.
#[derive(Debug, Clone)]
pub struct CheckedEntry {
    pub deps: blake3::Hash,
    pub scope: Arc<ModuleScope>,
    pub info: Arc<TypeCheckInfo>,
    pub errors: Vec<CompileError>,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub own: blake3::Hash,
    pub parsed: ParsedEntry,
    pub checked: Option<CheckedEntry>,
}

#[derive(Debug, Default, Clone)]
pub struct ScopeCache {
    entries: HashMap<String, CacheEntry>,
}

impl ScopeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    /// Unit paths with an entry, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Parse result for `path` if its text fingerprint is unchanged.
    pub fn parsed(&self, path: &str, own: &blake3::Hash) -> Option<&ParsedEntry> {
        self.entries.get(path).filter(|e| e.own == *own).map(|e| &e.parsed)
    }

    /// Check result for `path` if both fingerprints are unchanged.
    pub fn checked(&self, path: &str, own: &blake3::Hash, deps: &blake3::Hash) -> Option<&CheckedEntry> {
        self.entries
            .get(path)
            .filter(|e| e.own == *own)
            .and_then(|e| e.checked.as_ref())
            .filter(|c| c.deps == *deps)
    }

    /// Store a fresh parse result, dropping any check result of older text.
    pub fn store_parsed(&mut self, path: &str, own: blake3::Hash, parsed: ParsedEntry) {
        self.entries.insert(
            path.to_string(),
            CacheEntry {
                own,
                parsed,
                checked: None,
            },
        );
    }

    pub fn store_checked(&mut self, path: &str, checked: CheckedEntry) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.checked = Some(checked);
        }
    }
}

/// Serialized as the sorted list of cached unit paths; fingerprints and scopes stay in process.
impl serde::Serialize for ScopeCache {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.paths())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprints_depend_on_flags_mode_and_text() {
        let a = text_fingerprint("let x = 1", "flags-a", false);
        assert_eq!(a, text_fingerprint("let x = 1", "flags-a", false));
        assert_ne!(a, text_fingerprint("let x = 2", "flags-a", false));
        assert_ne!(a, text_fingerprint("let x = 1", "flags-b", false));
        assert_ne!(a, text_fingerprint("let x = 1", "flags-a", true));
    }

    #[test]
    fn dependency_fingerprints_are_order_sensitive() {
        let one: &[u8] = b"one";
        let two: &[u8] = b"two";
        assert_ne!(deps_fingerprint([one, two]), deps_fingerprint([two, one]));
        assert_eq!(deps_fingerprint([one, two]), deps_fingerprint([one, two]));
    }

    #[test]
    fn stale_text_drops_check_results() {
        let mut cache = ScopeCache::new();
        let own = text_fingerprint("module {}", "", false);
        let deps = deps_fingerprint(std::iter::empty());
        let parsed = ParsedEntry {
            program: None,
            errors: Vec::new(),
        };
        cache.store_parsed("lib.mo", own, parsed.clone());
        let scope = Arc::new(ModuleScope::empty("lib.mo"));
        cache.store_checked(
            "lib.mo",
            CheckedEntry {
                deps,
                scope: scope.clone(),
                info: Arc::new(TypeCheckInfo {
                    uri: "lib.mo".into(),
                    scope,
                    exp_types: Vec::new(),
                    dot_bindings: HashMap::new(),
                }),
                errors: Vec::new(),
            },
        );
        assert!(cache.checked("lib.mo", &own, &deps).is_some());
        assert!(cache.checked("lib.mo", &own, &deps_fingerprint([b"x".as_slice()])).is_none());

        let edited = text_fingerprint("module { }", "", false);
        assert!(cache.parsed("lib.mo", &edited).is_none());
        cache.store_parsed("lib.mo", edited, parsed);
        assert!(cache.checked("lib.mo", &edited, &deps).is_none());
        assert_eq!(cache.paths(), vec!["lib.mo"]);
    }
}
