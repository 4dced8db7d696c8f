//! First passes over a declaration list: type constructors, then signatures.

use std::collections::BTreeMap;
use std::sync::Arc;

use motoko_core::lang::codes;
use motoko_syntax::ast::*;
use motoko_syntax::diagnostics::CompileError;

use super::{ImportTarget, TypeChecker, TypeEntry};
use crate::frontend::scope::{ImportedModule, PRIM_URI};
use crate::frontend::types::{ConDef, FuncType, Type};

impl TypeChecker<'_> {
    // ========================================================================
    // Type constructors
    // ========================================================================

    /// Create and bind the type constructors declared in `fields`, then resolve the bodies of type synonyms.
    ///
    /// Every constructor is bound before any body is resolved, so synonyms may refer to each other (and to classes
    /// and named modules of the same list) in any order.
    pub(crate) fn collect_types(&mut self, fields: &[DecField]) {
        for field in fields {
            let span = field.dec.span;
            match &field.dec.node {
                Dec::Type(dec) => {
                    let con = self.con_for(span, &dec.name.node, &dec.params);
                    self.bind_type(&dec.name.node, TypeEntry::Con(con));
                }
                Dec::Class(dec) => {
                    let con = self.con_for(span, &dec.name.node, &dec.type_params);
                    self.bind_type(&dec.name.node, TypeEntry::Con(con));
                }
                Dec::Module(ModuleDec {
                    name: Some(name),
                    fields: members,
                }) => {
                    let members = self.precollect_public_types(members);
                    self.bind_type(&name.node, TypeEntry::Module(members));
                }
                Dec::Import(import) => {
                    if let Some(ImportTarget::Module { scope, .. }) = self.imports.get(&import.path.node) {
                        let members = scope.types.clone();
                        self.bind_type(&import.name.node, TypeEntry::Module(members));
                    }
                }
                _ => {}
            }
        }

        for field in fields {
            if let Dec::Type(dec) = &field.dec.node {
                let Some(TypeEntry::Con(con)) = self.lookup_type(&dec.name.node).cloned() else {
                    continue;
                };
                if con.body().is_some() {
                    continue;
                }
                self.push_frame(false);
                self.bind_type_params(&dec.params);
                let body = self.resolve_typ(&dec.ty);
                self.pop_frame();
                con.define(body);
            }
        }
    }

    /// The constructor for the declaration at `span`, created on first request.
    pub(crate) fn con_for(&mut self, span: Span, name: &str, params: &[TypeBind]) -> Arc<ConDef> {
        self.precollected
            .entry(span.start)
            .or_insert_with(|| ConDef::new(name, params.iter().map(|p| p.name.node.clone()).collect()))
            .clone()
    }

    /// Create constructors for the public types of a named module ahead of its body.
    fn precollect_public_types(&mut self, fields: &[DecField]) -> BTreeMap<String, Arc<ConDef>> {
        let mut members = BTreeMap::new();
        for field in fields.iter().filter(|f| f.is_public()) {
            match &field.dec.node {
                Dec::Type(dec) => {
                    let con = self.con_for(field.dec.span, &dec.name.node, &dec.params);
                    members.insert(dec.name.node.clone(), con);
                }
                Dec::Class(dec) => {
                    let con = self.con_for(field.dec.span, &dec.name.node, &dec.type_params);
                    members.insert(dec.name.node.clone(), con);
                }
                _ => {}
            }
        }
        members
    }

    // ========================================================================
    // Signatures
    // ========================================================================

    /// Bind function, class and import names of `fields` so any declaration of the list may use them.
    ///
    /// ## Parameters
    /// - `in_actor`: public async and one-way functions of an actor body are implicitly `shared`.
    pub(crate) fn collect_signatures(&mut self, fields: &[DecField], in_actor: bool) {
        for field in fields {
            let span = field.dec.span;
            match &field.dec.node {
                Dec::Func(dec) => {
                    let implicit_shared = in_actor && field.is_public();
                    let sig = self.func_signature(&dec.func, implicit_shared);
                    self.signatures.insert(span.start, sig.clone());
                    self.bind_value(&dec.name.node, Type::func(sig), false, dec.name.span);
                }
                Dec::Class(dec) => {
                    let con = self.con_for(span, &dec.name.node, &dec.type_params);
                    let sig = self.class_signature(dec, con);
                    self.signatures.insert(span.start, sig.clone());
                    self.bind_value(&dec.name.node, Type::func(sig), false, dec.name.span);
                }
                Dec::Import(import) => self.bind_import(import),
                _ => {}
            }
        }
    }

    /// Signature of a function literal from its annotations. A missing return annotation means `()`.
    pub(crate) fn func_signature(&mut self, func: &FuncLit, implicit_shared: bool) -> FuncType {
        self.push_frame(false);
        let type_params = self.bind_type_params(&func.type_params);
        let params = func.params.iter().map(|p| self.resolve_typ(&p.ty)).collect();
        let param_names = func
            .params
            .iter()
            .map(|p| (p.name.node != "_").then(|| p.name.node.clone()))
            .collect();
        let ret = func.ret.as_ref().map(|t| self.resolve_typ(t)).unwrap_or_else(Type::unit);
        self.pop_frame();
        // Only async and one-way functions become shared; anything else keeps its declared local sort.
        let sort = match func.sort {
            FuncSort::Local if implicit_shared && (matches!(ret, Type::Async(_)) || ret.is_unit()) => FuncSort::Shared,
            sort => sort,
        };
        FuncType {
            sort,
            type_params,
            params,
            param_names,
            ret,
        }
    }

    /// Constructor signature of a class: its parameters to an instance of the class type.
    fn class_signature(&mut self, dec: &ClassDec, con: Arc<ConDef>) -> FuncType {
        self.push_frame(false);
        let type_params = self.bind_type_params(&dec.type_params);
        let params = dec.params.iter().map(|p| self.resolve_typ(&p.ty)).collect();
        let param_names = dec.params.iter().map(|p| Some(p.name.node.clone())).collect();
        self.pop_frame();
        let instance = Type::Con(con, type_params.iter().map(|p| Type::Var(p.name.clone())).collect());
        let ret = if dec.sort == ObjSort::Actor {
            Type::Async(Box::new(instance))
        } else {
            instance
        };
        FuncType {
            sort: FuncSort::Local,
            type_params,
            params,
            param_names,
            ret,
        }
    }

    fn bind_import(&mut self, import: &ImportDec) {
        let ty = match self.imports.get(&import.path.node) {
            Some(ImportTarget::Module { uri, scope }) => {
                if scope.is_module() || uri == PRIM_URI {
                    self.imported.push(ImportedModule {
                        alias: Some(import.name.node.clone()),
                        uri: uri.clone(),
                        scope: scope.clone(),
                    });
                    scope.export.clone()
                } else {
                    self.errors.push(CompileError::other(
                        codes::IMPORT_NOT_MODULE,
                        format!("file {uri} must contain a module"),
                        import.path.span,
                    ));
                    Type::Error
                }
            }
            Some(ImportTarget::Blob) => Type::BLOB,
            Some(ImportTarget::Unresolved) | None => Type::Error,
        };
        self.bind_value(&import.name.node, ty, false, import.name.span);
    }
}
