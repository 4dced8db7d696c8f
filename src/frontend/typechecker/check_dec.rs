//! Declaration checking: declaration lists, functions, and object, module, actor and class bodies.

use std::collections::BTreeMap;
use std::sync::Arc;

use motoko_core::lang::codes;
use motoko_syntax::ast::*;

use super::{BodyContext, TypeChecker, TypeEntry};
use crate::frontend::scope::FunctionSig;
use crate::frontend::types::{ConDef, Field, FuncType, Type, is_subtype};

/// Public surface of a checked object, module or actor body.
struct ObjectSurface {
    ty: Type,
    types: BTreeMap<String, Arc<ConDef>>,
    functions: Vec<FunctionSig>,
}

impl TypeChecker<'_> {
    /// Check a declaration list in the current frame and return its value type.
    ///
    /// The value of a list is the value of its last declaration; `()` for an empty list.
    ///
    /// ## Parameters
    /// - `expected`: type the list's value must have, if known.
    /// - `top_level`: the list is the program itself; its modules and actors define the unit's surface.
    pub(crate) fn check_decs(&mut self, fields: &[DecField], expected: Option<&Type>, top_level: bool) -> Type {
        self.collect_types(fields);
        self.collect_signatures(fields, false);

        let mut value = Type::unit();
        for (i, field) in fields.iter().enumerate() {
            let is_last = i + 1 == fields.len();
            let expect_here = if is_last { expected } else { None };
            value = self.check_dec(field, expect_here, top_level);
            if let (Some(want), false) = (expect_here, matches!(field.dec.node, Dec::Exp(_))) {
                if !is_subtype(&value, want) {
                    self.mismatch(&value, want, field.dec.span);
                }
            }
        }
        if fields.is_empty() {
            if let Some(want) = expected {
                if !is_subtype(&value, want) {
                    self.mismatch(&value, want, Span::default());
                }
            }
        }
        value
    }

    /// Check one declaration and return its value type.
    pub(crate) fn check_dec(&mut self, field: &DecField, expected: Option<&Type>, top_level: bool) -> Type {
        let span = field.dec.span;
        match &field.dec.node {
            Dec::Exp(exp) => match expected {
                Some(want) => self.check_exp(exp, want),
                None => self.infer_exp(exp),
            },
            Dec::Let(dec) => match &dec.pat.kind {
                PatKind::Annot(inner, typ) => {
                    let ty = self.resolve_typ(typ);
                    self.check_exp(&dec.exp, &ty);
                    self.bind_pat(inner, &ty);
                    ty
                }
                _ => {
                    let ty = self.infer_exp(&dec.exp);
                    self.bind_pat(&dec.pat, &ty);
                    ty
                }
            },
            Dec::Var(dec) => {
                let ty = match &dec.ty {
                    Some(typ) => {
                        let ty = self.resolve_typ(typ);
                        self.check_exp(&dec.exp, &ty);
                        ty
                    }
                    None => self.infer_exp(&dec.exp),
                };
                self.bind_value(&dec.name.node, ty, true, dec.name.span);
                Type::unit()
            }
            Dec::Type(_) | Dec::Import(_) => Type::unit(),
            Dec::Func(dec) => {
                let sig = match self.signatures.get(&span.start) {
                    Some(sig) => sig.clone(),
                    None => self.func_signature(&dec.func, false),
                };
                self.check_func_body(&dec.func, &sig);
                Type::unit()
            }
            Dec::Module(dec) => {
                let surface = self.check_object_body(ObjSort::Module, &dec.fields);
                if let Some(name) = &dec.name {
                    self.bind_value(&name.node, surface.ty.clone(), false, name.span);
                    self.bind_type(&name.node, TypeEntry::Module(surface.types.clone()));
                }
                self.publish_surface(top_level, &surface);
                surface.ty
            }
            Dec::Object(dec) => {
                let surface = self.check_object_body(dec.sort, &dec.fields);
                if let Some(name) = &dec.name {
                    self.bind_value(&name.node, surface.ty.clone(), false, name.span);
                }
                self.publish_surface(top_level, &surface);
                surface.ty
            }
            Dec::Class(dec) => {
                self.check_class(dec, span, top_level);
                Type::unit()
            }
            Dec::Error => Type::Error,
        }
    }

    fn publish_surface(&mut self, top_level: bool, surface: &ObjectSurface) {
        if top_level {
            self.surface_functions = surface.functions.clone();
            self.surface_types = Some(surface.types.clone());
        }
    }

    /// Check a function body against its signature.
    ///
    /// Functions returning `async T` check their body against `T` with `await` allowed; shared one-way functions
    /// may `await` too.
    pub(crate) fn check_func_body(&mut self, func: &FuncLit, sig: &FuncType) {
        self.push_frame(true);
        for param in &sig.type_params {
            self.bind_type(&param.name, TypeEntry::Param);
        }
        for (param, ty) in func.params.iter().zip(&sig.params) {
            self.bind_value(&param.name.node, ty.clone(), false, param.name.span);
        }
        let (ret, is_async) = match &sig.ret {
            Type::Async(inner) => ((**inner).clone(), true),
            ret => (ret.clone(), sig.is_shared()),
        };
        self.bodies.push(BodyContext {
            ret: ret.clone(),
            is_async,
        });
        self.check_exp(&func.body, &ret);
        self.bodies.pop();
        self.pop_frame();
    }

    /// Check an object, module or actor body in a fresh frame and compute its public surface.
    fn check_object_body(&mut self, sort: ObjSort, fields: &[DecField]) -> ObjectSurface {
        self.push_frame(false);
        self.collect_types(fields);
        self.collect_signatures(fields, sort == ObjSort::Actor);
        for field in fields {
            self.check_dec(field, None, false);
        }

        let mut members = Vec::new();
        let mut types = BTreeMap::new();
        let mut functions = Vec::new();
        for field in fields.iter().filter(|f| f.is_public()) {
            let span = field.dec.span;
            let names: Vec<(String, Span)> = match &field.dec.node {
                Dec::Let(dec) => {
                    let spans = vec![dec.pat.span; dec.pat.bound_names().len()];
                    dec.pat.bound_names().into_iter().map(String::from).zip(spans).collect()
                }
                Dec::Var(dec) => vec![(dec.name.node.clone(), dec.name.span)],
                Dec::Func(dec) => {
                    if let Some(sig) = self.signatures.get(&span.start) {
                        functions.push(FunctionSig::new(&self.uri, &dec.name.node, sig.clone()));
                    }
                    vec![(dec.name.node.clone(), dec.name.span)]
                }
                Dec::Class(dec) => {
                    if let Some(TypeEntry::Con(con)) = self.lookup_type(&dec.name.node) {
                        types.insert(dec.name.node.clone(), con.clone());
                    }
                    vec![(dec.name.node.clone(), dec.name.span)]
                }
                Dec::Type(dec) => {
                    if let Some(TypeEntry::Con(con)) = self.lookup_type(&dec.name.node) {
                        types.insert(dec.name.node.clone(), con.clone());
                    }
                    Vec::new()
                }
                Dec::Module(ModuleDec { name: Some(name), .. }) => vec![(name.node.clone(), name.span)],
                Dec::Object(ObjectDec { name: Some(name), .. }) => vec![(name.node.clone(), name.span)],
                _ => Vec::new(),
            };
            for (name, name_span) in names {
                let Some(binding) = self.frames.last().and_then(|f| f.values.get(&name)).cloned() else {
                    continue;
                };
                if sort == ObjSort::Actor {
                    self.check_actor_field(&name, &binding.ty, name_span);
                }
                members.push(Field {
                    name,
                    ty: binding.ty,
                    mutable: binding.mutable,
                });
            }
        }
        self.pop_frame();
        ObjectSurface {
            ty: Type::obj(sort, members),
            types,
            functions,
        }
    }

    /// Public actor fields must be shared functions returning `async T` or `()`.
    fn check_actor_field(&mut self, name: &str, ty: &Type, span: Span) {
        let ok = match ty.as_func() {
            Some(func) => func.is_shared() && (matches!(func.ret, Type::Async(_)) || func.ret.is_unit()),
            None => ty.is_error(),
        };
        if !ok {
            self.error(
                codes::NON_SHARED_PUBLIC,
                format!("public actor field {name} has non-shared function type\n  {ty}"),
                span,
            );
        }
    }

    fn check_class(&mut self, dec: &ClassDec, span: Span, top_level: bool) {
        let con = self.con_for(span, &dec.name.node, &dec.type_params);
        let sig = self
            .signatures
            .get(&span.start)
            .cloned()
            .unwrap_or_else(|| FuncType::local(Vec::new(), Type::Error));

        self.push_frame(true);
        for param in &sig.type_params {
            self.bind_type(&param.name, TypeEntry::Param);
        }
        for (param, ty) in dec.params.iter().zip(&sig.params) {
            self.bind_value(&param.name.node, ty.clone(), false, param.name.span);
        }
        let surface = self.check_object_body(dec.sort, &dec.fields);
        self.pop_frame();

        if let Some(typ) = &dec.ret {
            let declared = self.resolve_typ(typ);
            if !is_subtype(&surface.ty, &declared) {
                self.mismatch(&surface.ty, &declared, typ.span);
            }
        }
        con.define(surface.ty.clone());
        self.publish_surface(top_level && dec.sort == ObjSort::Actor, &surface);
    }
}
