//! Semantic arena.
//!
//! Typed syntax trees never point at semantic data. Each expression carries an [`ExpHandle`] instead: the id of the
//! arena that typed it plus an index into that arena. The arena stores one batch per checked unit
//! ([`TypeCheckInfo`]), and a handle's index is the batch base plus the expression's [`ExpId`].
//!
//! ## Notes
//! - Arena ids are process-unique, so a handle from another session resolves to nothing.
//! - Registering the same `Arc<TypeCheckInfo>` twice (a scope cache hit) reuses its batch.
//! - Only the [`RETAINED_VERSIONS`] most recent batches of each unit stay alive. Handles into an evicted batch
//!   resolve to nothing, like foreign ones.
//! - When the index space runs out the arena starts over under a fresh id, dropping every batch.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use motoko_syntax::ast::ExpId;
use motoko_syntax::syntax_tree::{ExpAnnotator, ExpHandle};

use super::scope::ModuleScope;
use super::types::Type;

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(1);

/// Batches kept per unit path.
pub const RETAINED_VERSIONS: usize = 4;

/// A contextual dot resolution: `e.f(..)` read as `M.f(e, ..)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotBinding {
    /// Import alias the module is bound to, if any.
    pub module_alias: Option<String>,
    pub module_uri: String,
    pub func_name: String,
}

/// Reusable typechecking output of one unit.
///
/// This is what later stages (dot queries, syntax tree annotation, interface extraction, lowering) consume instead
/// of re-deriving types from the AST.
#[derive(Debug, Clone)]
pub struct TypeCheckInfo {
    pub uri: String,
    pub scope: Arc<ModuleScope>,
    /// Static type of every expression, indexed by [`ExpId`].
    pub exp_types: Vec<Option<Type>>,
    /// Dot expressions resolved contextually, keyed by the id of the `Dot` expression.
    pub dot_bindings: HashMap<ExpId, DotBinding>,
}

impl TypeCheckInfo {
    pub fn exp_type(&self, id: ExpId) -> Option<&Type> {
        self.exp_types.get(id.index()).and_then(Option::as_ref)
    }

    pub fn dot_binding(&self, id: ExpId) -> Option<&DotBinding> {
        self.dot_bindings.get(&id)
    }
}

#[derive(Debug)]
pub struct SemanticArena {
    id: u32,
    /// Live batches by base index.
    batches: BTreeMap<u32, Arc<TypeCheckInfo>>,
    /// Bases of the live batches of each unit, oldest first.
    versions: HashMap<String, VecDeque<u32>>,
    next_base: u32,
}

impl Default for SemanticArena {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticArena {
    pub fn new() -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            batches: BTreeMap::new(),
            versions: HashMap::new(),
            next_base: 0,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of live batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Register a unit's typing output and return its batch base.
    ///
    /// A new version of a unit evicts its oldest batch once more than [`RETAINED_VERSIONS`] are alive.
    pub fn register(&mut self, info: &Arc<TypeCheckInfo>) -> u32 {
        if let Some(bases) = self.versions.get(&info.uri) {
            let existing = bases
                .iter()
                .find(|base| self.batches.get(*base).is_some_and(|live| Arc::ptr_eq(live, info)));
            if let Some(base) = existing {
                return *base;
            }
        }

        // Reserve at least one slot so batches never share a base.
        let size = u32::try_from(info.exp_types.len()).unwrap_or(u32::MAX).max(1);
        let base = match self.next_base.checked_add(size) {
            Some(next) => {
                let base = self.next_base;
                self.next_base = next;
                base
            }
            None => {
                tracing::debug!(arena = self.id, "handle space exhausted, starting a fresh arena");
                *self = Self::new();
                self.next_base = size;
                0
            }
        };
        self.batches.insert(base, info.clone());

        let bases = self.versions.entry(info.uri.clone()).or_default();
        bases.push_back(base);
        while bases.len() > RETAINED_VERSIONS {
            if let Some(evicted) = bases.pop_front() {
                self.batches.remove(&evicted);
            }
        }
        base
    }

    pub fn handle(&self, base: u32, id: ExpId) -> ExpHandle {
        ExpHandle {
            arena: self.id,
            index: base + id.0,
        }
    }

    /// Look up the unit and expression a handle designates.
    pub fn resolve(&self, handle: ExpHandle) -> Option<(Arc<TypeCheckInfo>, ExpId)> {
        if handle.arena != self.id {
            return None;
        }
        let (base, info) = self.batches.range(..=handle.index).next_back()?;
        let id = ExpId(handle.index - base);
        (id.index() < info.exp_types.len()).then(|| (info.clone(), id))
    }

    /// Annotator for lowering the unit registered at `base`.
    pub fn annotator<'a>(&self, info: &'a TypeCheckInfo, base: u32) -> TypedAnnotator<'a> {
        TypedAnnotator {
            info,
            arena: self.id,
            base,
        }
    }
}

/// Supplies types and handles while lowering a typed tree.
pub struct TypedAnnotator<'a> {
    info: &'a TypeCheckInfo,
    arena: u32,
    base: u32,
}

impl ExpAnnotator for TypedAnnotator<'_> {
    fn exp_type(&self, id: ExpId) -> Option<String> {
        self.info.exp_type(id).map(ToString::to_string)
    }

    fn handle(&self, id: ExpId) -> Option<ExpHandle> {
        Some(ExpHandle {
            arena: self.arena,
            index: self.base + id.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(count: usize) -> Arc<TypeCheckInfo> {
        unit_info("a.mo", count)
    }

    fn unit_info(uri: &str, count: usize) -> Arc<TypeCheckInfo> {
        Arc::new(TypeCheckInfo {
            uri: uri.into(),
            scope: Arc::new(ModuleScope::empty(uri)),
            exp_types: vec![Some(Type::NAT); count],
            dot_bindings: HashMap::new(),
        })
    }

    #[test]
    fn handles_resolve_within_their_batch_only() {
        let mut arena = SemanticArena::new();
        let first = info(3);
        let second = info(2);
        let b1 = arena.register(&first);
        let b2 = arena.register(&second);
        assert_eq!(arena.register(&first), b1);

        let (found, id) = arena.resolve(arena.handle(b2, ExpId(1))).unwrap();
        assert!(Arc::ptr_eq(&found, &second));
        assert_eq!(id, ExpId(1));
        assert!(arena.resolve(ExpHandle { arena: arena.id(), index: 99 }).is_none());
    }

    #[test]
    fn foreign_handles_resolve_to_nothing() {
        let mut ours = SemanticArena::new();
        let theirs = SemanticArena::new();
        let base = ours.register(&info(1));
        let foreign = theirs.handle(base, ExpId(0));
        assert!(ours.resolve(foreign).is_none());
    }

    #[test]
    fn superseded_versions_of_a_unit_are_evicted() {
        let mut arena = SemanticArena::new();
        let other = unit_info("lib.mo", 2);
        let other_base = arena.register(&other);

        let first = unit_info("doc.mo", 5);
        let first_base = arena.register(&first);
        let first_handle = arena.handle(first_base, ExpId(4));
        assert!(arena.resolve(first_handle).is_some());

        let mut latest = first_base;
        for _ in 0..2000 {
            latest = arena.register(&unit_info("doc.mo", 5));
        }
        assert_eq!(arena.len(), RETAINED_VERSIONS + 1);
        assert!(arena.resolve(first_handle).is_none());
        assert!(arena.resolve(arena.handle(latest, ExpId(4))).is_some());

        let (found, _) = arena.resolve(arena.handle(other_base, ExpId(1))).unwrap();
        assert!(Arc::ptr_eq(&found, &other));
        assert_eq!(arena.register(&other), other_base);
    }

    #[test]
    fn exhausted_handle_space_starts_a_fresh_arena() {
        let mut arena = SemanticArena::new();
        let old_id = arena.id();
        let base = arena.register(&info(3));
        let stale = arena.handle(base, ExpId(0));
        arena.next_base = u32::MAX - 1;

        let fresh = info(3);
        assert_eq!(arena.register(&fresh), 0);
        assert_ne!(arena.id(), old_id);
        assert_eq!(arena.len(), 1);
        assert!(arena.resolve(stale).is_none());
        let (found, _) = arena.resolve(arena.handle(0, ExpId(2))).unwrap();
        assert!(Arc::ptr_eq(&found, &fresh));
    }
}
