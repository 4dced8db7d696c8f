//! Resolve syntactic types ([`Typ`]) to semantic [`Type`]s.

use motoko_core::lang::codes;
use motoko_core::lang::prims;
use motoko_syntax::ast::*;

use super::{TypeChecker, TypeEntry};
use crate::frontend::types::{Field, FuncType, Type, TypeParam};

impl TypeChecker<'_> {
    pub(crate) fn resolve_typ(&mut self, typ: &Typ) -> Type {
        match &typ.kind {
            TypKind::Path { path, args } => self.resolve_path(path, args, typ.span),
            TypKind::Opt(inner) => Type::Opt(Box::new(self.resolve_typ(inner))),
            TypKind::Array { mutable, elem } => Type::Array(*mutable, Box::new(self.resolve_typ(elem))),
            TypKind::Tuple(items) => Type::Tuple(items.iter().map(|item| self.resolve_typ(&item.ty)).collect()),
            TypKind::Record(fields) => Type::obj(ObjSort::Object, self.resolve_fields(fields)),
            TypKind::Obj(sort, fields) => Type::obj(*sort, self.resolve_fields(fields)),
            TypKind::Func {
                sort,
                type_params,
                params,
                ret,
            } => {
                self.push_frame(false);
                let type_params = self.bind_type_params(type_params);
                let param_names = params.iter().map(|item| item.name.clone()).collect();
                let params = params.iter().map(|item| self.resolve_typ(&item.ty)).collect();
                let ret = self.resolve_typ(ret);
                self.pop_frame();
                Type::func(FuncType {
                    sort: *sort,
                    type_params,
                    params,
                    param_names,
                    ret,
                })
            }
            TypKind::Async(inner) => Type::Async(Box::new(self.resolve_typ(inner))),
            TypKind::Error => Type::Error,
        }
    }

    fn resolve_fields(&mut self, fields: &[TypField]) -> Vec<Field> {
        fields
            .iter()
            .map(|field| Field {
                name: field.name.node.clone(),
                ty: self.resolve_typ(&field.ty),
                mutable: field.mutable,
            })
            .collect()
    }

    /// Bind type parameters in the current frame and resolve their bounds.
    pub(crate) fn bind_type_params(&mut self, binds: &[TypeBind]) -> Vec<TypeParam> {
        for bind in binds {
            self.bind_type(&bind.name.node, TypeEntry::Param);
        }
        binds
            .iter()
            .map(|bind| TypeParam {
                name: bind.name.node.clone(),
                bound: bind.bound.as_ref().map(|b| self.resolve_typ(b)).unwrap_or(Type::Any),
            })
            .collect()
    }

    fn resolve_path(&mut self, path: &[Spanned<Ident>], args: &[Typ], span: Span) -> Type {
        let args: Vec<Type> = args.iter().map(|arg| self.resolve_typ(arg)).collect();
        let (head, rest) = match path.split_first() {
            Some(split) => split,
            None => return Type::Error,
        };

        let con = match (self.lookup_type(&head.node).cloned(), rest) {
            (Some(TypeEntry::Con(con)), []) => con,
            (Some(TypeEntry::Param), []) => return Type::Var(head.node.clone()),
            (Some(TypeEntry::Module(members)), [member]) => match members.get(&member.node) {
                Some(con) => con.clone(),
                None => return self.unbound_type(path, span),
            },
            (None, []) => {
                return match head.node.as_str() {
                    "Any" => Type::Any,
                    "None" => Type::Non,
                    name => match prims::from_str(name) {
                        Some(id) => Type::Prim(id),
                        None => self.unbound_type(path, span),
                    },
                };
            }
            _ => return self.unbound_type(path, span),
        };

        if con.params.len() != args.len() {
            self.error(
                codes::ARGUMENT_COUNT,
                format!(
                    "type {} expects {} type argument(s), but {} were given",
                    con.name,
                    con.params.len(),
                    args.len()
                ),
                span,
            );
            return Type::Error;
        }
        Type::Con(con, args)
    }

    fn unbound_type(&mut self, path: &[Spanned<Ident>], span: Span) -> Type {
        let name: Vec<&str> = path.iter().map(|seg| seg.node.as_str()).collect();
        self.error(codes::UNBOUND_TYPE, format!("unbound type {}", name.join(".")), span);
        Type::Error
    }
}
