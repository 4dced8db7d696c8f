//! Type checker for Motoko units.
//!
//! Checks one parsed [`Program`] against the scopes of its imports and produces the unit's [`ModuleScope`] plus a
//! [`TypeCheckInfo`] (per-expression types and contextual dot resolutions) for later stages.
//!
//! ## Notes
//!
//! - **Declaration order**: every declaration list (program, block, object body) is processed in three passes:
//!   1. collect type constructors (including parametric synonyms such as `type A<B> = B`) and resolve their bodies,
//!   2. bind function, class and import signatures so bodies may refer to them in any order,
//!   3. check declarations in source order.
//! - **Check vs infer**: expressions are checked against an expected type where one is known (annotations,
//!   parameters, return types) and inferred otherwise. Numeric literals rely on this to type as `Int`, `Nat8`, ...
//! - **Error accumulation**: errors never abort checking. Anything that failed types as [`Type::Error`], which is
//!   compatible with everything, so one mistake yields one diagnostic.
//! - **Warnings** go through the session [`Flags`]: allowed codes are dropped, `-E=` codes become errors.
//!
//! ## Examples
//!
//! ```rust
//! use std::collections::HashMap;
//! use motoko::config::Flags;
//! use motoko::frontend::typechecker;
//! use motoko_syntax::parser;
//!
//! let program = parser::parse_source("let x : Int = 1; x + 1", false).program.unwrap();
//! let output = typechecker::check_unit(&program, "main.mo", &HashMap::new(), &Flags::default());
//! assert!(output.errors.is_empty());
//! assert_eq!(output.scope.export.to_string(), "Int");
//! ```

mod check_dec;
mod check_exp;
mod check_typ;
mod collect;
mod prims;

#[cfg(test)]
mod tests;

pub use prims::parse_nat;
pub(crate) use check_exp::receiver_application;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use motoko_core::lang::codes;
use motoko_syntax::ast::*;
use motoko_syntax::diagnostics::CompileError;

use crate::config::{Flags, Level};
use crate::frontend::scope::{FunctionSig, ImportedModule, ModuleScope};
use crate::frontend::semantic::{DotBinding, TypeCheckInfo};
use crate::frontend::types::{ConDef, FuncType, Type};

/// What an import declaration resolved to.
#[derive(Debug, Clone)]
pub enum ImportTarget {
    /// A checked module unit (or `mo:prim`).
    Module { uri: String, scope: Arc<ModuleScope> },
    /// A `blob:` placeholder accepted by the session toggle.
    Blob,
    /// Resolution failed; the resolver already reported why.
    Unresolved,
}

/// Result of checking one unit.
#[derive(Debug, Clone)]
pub struct CheckOutput {
    pub scope: Arc<ModuleScope>,
    pub info: Arc<TypeCheckInfo>,
    pub errors: Vec<CompileError>,
}

/// Check `program` (the unit at `uri`) with its imports already resolved.
///
/// ## Parameters
/// - `imports`: resolution of every import path the program mentions, keyed by the path as written.
/// - `flags`: session flags; decide which warnings are reported and at which severity.
#[tracing::instrument(skip_all, fields(uri = %uri, decs = program.decs.len()))]
pub fn check_unit(
    program: &Program,
    uri: &str,
    imports: &HashMap<String, ImportTarget>,
    flags: &Flags,
) -> CheckOutput {
    let mut checker = TypeChecker::new(uri, program.exp_count, imports, flags);
    checker.check_program(program);
    checker.finish()
}

/// A value binding in a lexical frame.
#[derive(Debug, Clone)]
pub(crate) struct ValBinding {
    pub ty: Type,
    pub mutable: bool,
    pub span: Span,
    pub used: bool,
}

/// A type-namespace binding.
#[derive(Debug, Clone)]
pub(crate) enum TypeEntry {
    Con(Arc<ConDef>),
    /// A type parameter; resolves to [`Type::Var`].
    Param,
    /// A module's public type constructors, for `M.T` paths.
    Module(BTreeMap<String, Arc<ConDef>>),
}

#[derive(Debug, Default)]
pub(crate) struct Frame {
    values: HashMap<String, ValBinding>,
    types: HashMap<String, TypeEntry>,
    /// Report unused bindings of this frame when it is popped.
    warn_unused: bool,
}

/// Body context of the function (or async block) being checked.
#[derive(Debug, Clone)]
pub(crate) struct BodyContext {
    /// Expected type of `return` expressions.
    pub ret: Type,
    /// Whether `await` is allowed.
    pub is_async: bool,
}

/// Type checker state.
///
/// Holds the lexical frames, accumulated errors and the per-expression output for one unit.
pub struct TypeChecker<'a> {
    pub(crate) uri: String,
    pub(crate) flags: &'a Flags,
    pub(crate) imports: &'a HashMap<String, ImportTarget>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) bodies: Vec<BodyContext>,
    pub(crate) errors: Vec<CompileError>,
    pub(crate) exp_types: Vec<Option<Type>>,
    pub(crate) dot_bindings: HashMap<ExpId, DotBinding>,
    /// Type constructors created ahead of their declaration list, keyed by declaration span start.
    pub(crate) precollected: HashMap<usize, Arc<ConDef>>,
    /// Function and class signatures bound ahead of their bodies, keyed by declaration span start.
    pub(crate) signatures: HashMap<usize, FuncType>,
    /// Imported modules, in import order.
    pub(crate) imported: Vec<ImportedModule>,
    /// Public functions of the last module or actor checked at top level.
    pub(crate) surface_functions: Vec<FunctionSig>,
    /// Public type constructors of the last module checked at top level.
    pub(crate) surface_types: Option<BTreeMap<String, Arc<ConDef>>>,
    pub(crate) export: Type,
}

impl<'a> TypeChecker<'a> {
    pub fn new(uri: &str, exp_count: u32, imports: &'a HashMap<String, ImportTarget>, flags: &'a Flags) -> Self {
        Self {
            uri: uri.to_string(),
            flags,
            imports,
            frames: vec![Frame::default()],
            bodies: Vec::new(),
            errors: Vec::new(),
            exp_types: vec![None; exp_count as usize],
            dot_bindings: HashMap::new(),
            precollected: HashMap::new(),
            signatures: HashMap::new(),
            imported: Vec::new(),
            surface_functions: Vec::new(),
            surface_types: None,
            export: Type::unit(),
        }
    }

    /// Check a whole program: its declarations in order, then derive the unit's export.
    pub fn check_program(&mut self, program: &Program) {
        let last = self.check_decs(&program.decs, None, true);
        self.export = last;
    }

    /// Package the unit's scope and typing output.
    pub fn finish(self) -> CheckOutput {
        let root = self.frames.into_iter().next().unwrap_or_default();
        let values: BTreeMap<String, Type> = root.values.into_iter().map(|(name, b)| (name, b.ty)).collect();
        let types = match self.surface_types {
            Some(types) => types,
            None => root
                .types
                .into_iter()
                .filter_map(|(name, entry)| match entry {
                    TypeEntry::Con(con) => Some((name, con)),
                    _ => None,
                })
                .collect(),
        };
        let scope = Arc::new(ModuleScope {
            uri: self.uri.clone(),
            values,
            types,
            imports: self.imported,
            export: self.export,
            functions: self.surface_functions,
        });
        let info = Arc::new(TypeCheckInfo {
            uri: self.uri,
            scope: scope.clone(),
            exp_types: self.exp_types,
            dot_bindings: self.dot_bindings,
        });
        CheckOutput {
            scope,
            info,
            errors: self.errors,
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub(crate) fn error(&mut self, code: &'static str, message: String, span: Span) {
        self.errors.push(CompileError::type_error(code, message, span));
    }

    /// Report a configurable warning at the level the session flags assign to `code`.
    pub(crate) fn warn(&mut self, code: &'static str, message: String, span: Span) {
        match self.flags.level_for(code) {
            Level::Allow => {}
            Level::Warn if self.flags.hide_warnings => {}
            Level::Warn => self.errors.push(CompileError::warning(code, message, span)),
            Level::Error => self.errors.push(CompileError::type_error(code, message, span)),
        }
    }

    pub(crate) fn mismatch(&mut self, actual: &Type, expected: &Type, span: Span) {
        self.error(
            codes::TYPE_MISMATCH,
            format!("expression of type\n  {actual}\ncannot produce expected type\n  {expected}"),
            span,
        );
    }

    // ========================================================================
    // Frames
    // ========================================================================

    pub(crate) fn push_frame(&mut self, warn_unused: bool) {
        self.frames.push(Frame {
            warn_unused,
            ..Frame::default()
        });
    }

    pub(crate) fn pop_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if !frame.warn_unused {
            return;
        }
        let mut unused: Vec<(String, Span)> = frame
            .values
            .into_iter()
            .filter(|(name, b)| !b.used && !name.starts_with('_'))
            .map(|(name, b)| (name, b.span))
            .collect();
        unused.sort_by_key(|(_, span)| span.start);
        for (name, span) in unused {
            self.warn(
                codes::UNUSED_IDENTIFIER,
                format!("unused identifier {name} (delete or rename to wildcard `_` or `_{name}`)"),
                span,
            );
        }
    }

    pub(crate) fn bind_value(&mut self, name: &str, ty: Type, mutable: bool, span: Span) {
        if name == "_" {
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.values.insert(
                name.to_string(),
                ValBinding {
                    ty,
                    mutable,
                    span,
                    used: false,
                },
            );
        }
    }

    pub(crate) fn bind_type(&mut self, name: &str, entry: TypeEntry) {
        if let Some(frame) = self.frames.last_mut() {
            frame.types.insert(name.to_string(), entry);
        }
    }

    /// Look up a value, marking it used.
    pub(crate) fn lookup_value(&mut self, name: &str) -> Option<ValBinding> {
        for frame in self.frames.iter_mut().rev() {
            if let Some(binding) = frame.values.get_mut(name) {
                binding.used = true;
                return Some(binding.clone());
            }
        }
        None
    }

    pub(crate) fn lookup_type(&self, name: &str) -> Option<&TypeEntry> {
        self.frames.iter().rev().find_map(|frame| frame.types.get(name))
    }

    pub(crate) fn record(&mut self, id: ExpId, ty: &Type) {
        if let Some(slot) = self.exp_types.get_mut(id.index()) {
            *slot = Some(ty.clone());
        }
    }

    /// The function or async body being checked, if any.
    pub(crate) fn body(&self) -> Option<&BodyContext> {
        self.bodies.last()
    }
}
