//! Semantic types.
//!
//! [`Type`] is the checker's view of Motoko types. Type constructor applications ([`Type::Con`]) stay unexpanded so
//! they display the way the user wrote them (`A<Text>`); [`Type::normalize`] expands them on demand.
//!
//! ## Notes
//! - Object fields are kept sorted by name; structural comparisons rely on it.
//! - [`Type::Error`] is the type of recovered placeholders and of anything that already failed to check. It is
//!   compatible with every type so one error never cascades.
//! - Type parameters are referenced by name ([`Type::Var`]); instantiation substitutes by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use motoko_core::lang::prims::{self, PrimTypeId};
pub use motoko_syntax::ast::{FuncSort, ObjSort};
use serde::{Serialize, Serializer};

/// Maximum number of constructor expansions while normalizing one type.
const EXPANSION_LIMIT: usize = 64;

static NEXT_CON_ID: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Prim(PrimTypeId),
    Any,
    Non,
    Var(String),
    Con(Arc<ConDef>, Vec<Type>),
    Opt(Box<Type>),
    Array(bool, Box<Type>),
    Tuple(Vec<Type>),
    Obj(ObjSort, Vec<Field>),
    Func(Box<FuncType>),
    Async(Box<Type>),
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub sort: FuncSort,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Type>,
    /// Parameter names, parallel to `params`; present when the signature came from a declaration.
    pub param_names: Vec<Option<String>>,
    pub ret: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub bound: Type,
}

/// A named type constructor (`type A<B> = B`).
///
/// The body is set once, after every constructor of the declaring scope is known, so constructors may refer to each
/// other in any order.
pub struct ConDef {
    pub id: u32,
    pub name: String,
    pub params: Vec<String>,
    body: OnceLock<Type>,
}

impl ConDef {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_CON_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            params,
            body: OnceLock::new(),
        })
    }

    /// Set the constructor's definition. Later calls are ignored.
    pub fn define(&self, body: Type) {
        let _ = self.body.set(body);
    }

    pub fn body(&self) -> Option<&Type> {
        self.body.get()
    }

    /// Body with `args` substituted for the parameters.
    pub fn instantiate(&self, args: &[Type]) -> Type {
        let Some(body) = self.body() else {
            return Type::Error;
        };
        if self.params.is_empty() {
            return body.clone();
        }
        let map: HashMap<String, Type> = self
            .params
            .iter()
            .cloned()
            .zip(args.iter().cloned().chain(std::iter::repeat(Type::Error)))
            .collect();
        body.subst(&map)
    }
}

impl fmt::Debug for ConDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConDef({}#{})", self.name, self.id)
    }
}

impl PartialEq for ConDef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Type {
    pub const NAT: Type = Type::Prim(PrimTypeId::Nat);
    pub const INT: Type = Type::Prim(PrimTypeId::Int);
    pub const TEXT: Type = Type::Prim(PrimTypeId::Text);
    pub const BOOL: Type = Type::Prim(PrimTypeId::Bool);
    pub const NULL: Type = Type::Prim(PrimTypeId::Null);
    pub const CHAR: Type = Type::Prim(PrimTypeId::Char);
    pub const FLOAT: Type = Type::Prim(PrimTypeId::Float);
    pub const BLOB: Type = Type::Prim(PrimTypeId::Blob);

    pub fn unit() -> Type {
        Type::Tuple(Vec::new())
    }

    pub fn is_unit(&self) -> bool {
        matches!(self.normalize(), Type::Tuple(items) if items.is_empty())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn func(func: FuncType) -> Type {
        Type::Func(Box::new(func))
    }

    /// Build an object type, sorting its fields.
    pub fn obj(sort: ObjSort, mut fields: Vec<Field>) -> Type {
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Type::Obj(sort, fields)
    }

    /// Expand constructor applications at the head of the type.
    pub fn normalize(&self) -> Type {
        let mut ty = self.clone();
        for _ in 0..EXPANSION_LIMIT {
            match ty {
                Type::Con(con, args) => ty = con.instantiate(&args),
                other => return other,
            }
        }
        Type::Error
    }

    pub fn as_prim(&self) -> Option<PrimTypeId> {
        match self.normalize() {
            Type::Prim(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<FuncType> {
        match self.normalize() {
            Type::Func(func) => Some(*func),
            _ => None,
        }
    }

    /// Fields of an object type (after expansion).
    pub fn fields(&self) -> Option<(ObjSort, Vec<Field>)> {
        match self.normalize() {
            Type::Obj(sort, fields) => Some((sort, fields)),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<Field> {
        self.fields()?.1.into_iter().find(|f| f.name == name)
    }

    pub fn is_numeric(&self) -> bool {
        self.as_prim().is_some_and(prims::is_numeric)
    }

    /// Substitute type variables by name.
    pub fn subst(&self, map: &HashMap<String, Type>) -> Type {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            Type::Var(name) => map.get(name).cloned().unwrap_or_else(|| self.clone()),
            Type::Con(con, args) => Type::Con(con.clone(), args.iter().map(|t| t.subst(map)).collect()),
            Type::Opt(t) => Type::Opt(Box::new(t.subst(map))),
            Type::Array(m, t) => Type::Array(*m, Box::new(t.subst(map))),
            Type::Tuple(items) => Type::Tuple(items.iter().map(|t| t.subst(map)).collect()),
            Type::Obj(sort, fields) => Type::Obj(
                *sort,
                fields
                    .iter()
                    .map(|f| Field {
                        name: f.name.clone(),
                        ty: f.ty.subst(map),
                        mutable: f.mutable,
                    })
                    .collect(),
            ),
            Type::Func(func) => {
                let mut inner = map.clone();
                for param in &func.type_params {
                    inner.remove(&param.name);
                }
                Type::func(FuncType {
                    sort: func.sort,
                    type_params: func.type_params.clone(),
                    params: func.params.iter().map(|t| t.subst(&inner)).collect(),
                    param_names: func.param_names.clone(),
                    ret: func.ret.subst(&inner),
                })
            }
            Type::Async(t) => Type::Async(Box::new(t.subst(map))),
            Type::Prim(_) | Type::Any | Type::Non | Type::Error => self.clone(),
        }
    }

    /// Least upper bound used for branches without an expected type.
    pub fn lub(&self, other: &Type) -> Type {
        if self.is_error() {
            return other.clone();
        }
        if other.is_error() || is_subtype(other, self) {
            return self.clone();
        }
        if is_subtype(self, other) {
            return other.clone();
        }
        match (self.normalize(), other.normalize()) {
            (Type::Prim(PrimTypeId::Null), t) | (t, Type::Prim(PrimTypeId::Null)) => Type::Opt(Box::new(t)),
            _ => Type::Any,
        }
    }
}

impl FuncType {
    /// Local, monomorphic function type with unnamed parameters.
    pub fn local(params: Vec<Type>, ret: Type) -> Self {
        let param_names = vec![None; params.len()];
        Self {
            sort: FuncSort::Local,
            type_params: Vec::new(),
            params,
            param_names,
            ret,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.sort != FuncSort::Local
    }

    /// The function type with `args` substituted for its type parameters.
    pub fn instantiate(&self, args: &[Type]) -> FuncType {
        let map: HashMap<String, Type> = self
            .type_params
            .iter()
            .map(|p| p.name.clone())
            .zip(args.iter().cloned())
            .collect();
        FuncType {
            sort: self.sort,
            type_params: Vec::new(),
            params: self.params.iter().map(|t| t.subst(&map)).collect(),
            param_names: self.param_names.clone(),
            ret: self.ret.subst(&map),
        }
    }
}

// ============================================================================
// Subtyping
// ============================================================================

/// `sub <: sup`.
pub fn is_subtype(sub: &Type, sup: &Type) -> bool {
    subtype_at(sub, sup, 0)
}

/// Mutual subtyping.
pub fn equivalent(a: &Type, b: &Type) -> bool {
    is_subtype(a, b) && is_subtype(b, a)
}

fn subtype_at(sub: &Type, sup: &Type, depth: usize) -> bool {
    if depth > EXPANSION_LIMIT {
        return false;
    }
    if let (Type::Con(a, a_args), Type::Con(b, b_args)) = (sub, sup) {
        if a.id == b.id && a_args.len() == b_args.len() && a_args.iter().zip(b_args).all(|(x, y)| equivalent(x, y)) {
            return true;
        }
    }
    let (sub, sup) = (sub.normalize(), sup.normalize());
    let next = depth + 1;
    match (&sub, &sup) {
        (Type::Error, _) | (_, Type::Error) | (Type::Non, _) | (_, Type::Any) => true,
        (Type::Prim(a), Type::Prim(b)) => a == b || (*a == PrimTypeId::Nat && *b == PrimTypeId::Int),
        (Type::Prim(PrimTypeId::Null), Type::Opt(_)) => true,
        (Type::Var(a), Type::Var(b)) => a == b,
        (Type::Opt(a), Type::Opt(b)) | (Type::Async(a), Type::Async(b)) => subtype_at(a, b, next),
        (Type::Array(m1, a), Type::Array(m2, b)) => {
            m1 == m2
                && if *m1 {
                    subtype_at(a, b, next) && subtype_at(b, a, next)
                } else {
                    subtype_at(a, b, next)
                }
        }
        (Type::Tuple(a), Type::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| subtype_at(x, y, next))
        }
        (Type::Obj(s1, f1), Type::Obj(s2, f2)) => {
            s1 == s2
                && f2.iter().all(|want| {
                    f1.iter().find(|have| have.name == want.name).is_some_and(|have| {
                        if want.mutable || have.mutable {
                            have.mutable == want.mutable
                                && subtype_at(&have.ty, &want.ty, next)
                                && subtype_at(&want.ty, &have.ty, next)
                        } else {
                            subtype_at(&have.ty, &want.ty, next)
                        }
                    })
                })
        }
        (Type::Func(a), Type::Func(b)) => {
            a.sort == b.sort
                && a.type_params.len() == b.type_params.len()
                && a.params.len() == b.params.len()
                && b.params.iter().zip(&a.params).all(|(x, y)| subtype_at(x, y, next))
                && subtype_at(&a.ret, &b.ret, next)
        }
        _ => false,
    }
}

/// First-order inference of type arguments: match `param` against `arg`, binding variables in `vars`.
pub fn infer_type_args(param: &Type, arg: &Type, vars: &[String], out: &mut HashMap<String, Type>) {
    if let Type::Var(name) = param {
        if vars.contains(name) {
            let merged = match out.get(name) {
                Some(prev) => prev.lub(arg),
                None => arg.clone(),
            };
            out.insert(name.clone(), merged);
            return;
        }
    }
    let arg = arg.normalize();
    match (param, &arg) {
        (Type::Opt(p), Type::Opt(a)) | (Type::Async(p), Type::Async(a)) | (Type::Array(_, p), Type::Array(_, a)) => {
            infer_type_args(p, a, vars, out)
        }
        (Type::Tuple(ps), Type::Tuple(as_)) if ps.len() == as_.len() => {
            ps.iter().zip(as_).for_each(|(p, a)| infer_type_args(p, a, vars, out))
        }
        (Type::Obj(_, pf), Type::Obj(_, af)) => {
            for p in pf {
                if let Some(a) = af.iter().find(|a| a.name == p.name) {
                    infer_type_args(&p.ty, &a.ty, vars, out);
                }
            }
        }
        (Type::Func(pf), Type::Func(af)) if pf.params.len() == af.params.len() => {
            pf.params
                .iter()
                .zip(&af.params)
                .for_each(|(p, a)| infer_type_args(p, a, vars, out));
            infer_type_args(&pf.ret, &af.ret, vars, out);
        }
        (Type::Con(_, _), _) => infer_type_args(&param.normalize(), &arg, vars, out),
        _ => {}
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Prim(id) => write!(f, "{}", prims::as_str(*id)),
            Type::Any => write!(f, "Any"),
            Type::Non => write!(f, "None"),
            Type::Var(name) => write!(f, "{name}"),
            Type::Con(con, args) => {
                write!(f, "{}", con.name)?;
                if !args.is_empty() {
                    write!(f, "<{}>", join(args))?;
                }
                Ok(())
            }
            Type::Opt(t) => match **t {
                Type::Func(_) => write!(f, "?({t})"),
                _ => write!(f, "?{t}"),
            },
            Type::Array(true, t) => write!(f, "[var {t}]"),
            Type::Array(false, t) => write!(f, "[{t}]"),
            Type::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0]),
            Type::Tuple(items) => write!(f, "({})", join(items)),
            Type::Obj(sort, fields) => {
                match sort {
                    ObjSort::Object => {}
                    ObjSort::Module => write!(f, "module ")?,
                    ObjSort::Actor => write!(f, "actor ")?,
                }
                let fields: Vec<String> = fields
                    .iter()
                    .map(|field| {
                        let var = if field.mutable { "var " } else { "" };
                        format!("{var}{} : {}", field.name, field.ty)
                    })
                    .collect();
                write!(f, "{{{}}}", fields.join("; "))
            }
            Type::Func(func) => write!(f, "{func}"),
            Type::Async(t) => write!(f, "async {t}"),
            Type::Error => write!(f, "???"),
        }
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sort {
            FuncSort::Local => {}
            FuncSort::Shared => write!(f, "shared ")?,
            FuncSort::Query => write!(f, "shared query ")?,
        }
        if !self.type_params.is_empty() {
            let binds: Vec<String> = self
                .type_params
                .iter()
                .map(|p| match p.bound {
                    Type::Any => p.name.clone(),
                    ref bound => format!("{} <: {bound}", p.name),
                })
                .collect();
            write!(f, "<{}>", binds.join(", "))?;
        }
        let named = self.param_names.iter().any(Option::is_some);
        match self.params.as_slice() {
            [single] if !named && !matches!(single, Type::Tuple(_) | Type::Func(_)) => write!(f, "{single}")?,
            params => {
                let items: Vec<String> = params
                    .iter()
                    .enumerate()
                    .map(|(i, ty)| match self.param_names.get(i).cloned().flatten() {
                        Some(name) => format!("{name} : {ty}"),
                        None => ty.to_string(),
                    })
                    .collect();
                write!(f, "({})", items.join(", "))?;
            }
        }
        write!(f, " -> {}", self.ret)
    }
}

fn join(types: &[Type]) -> String {
    types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, ty: Type) -> Field {
        Field {
            name: name.into(),
            ty,
            mutable: false,
        }
    }

    #[test]
    fn constructor_applications_display_unexpanded() {
        let con = ConDef::new("A", vec!["B".into()]);
        con.define(Type::Var("B".into()));
        let applied = Type::Con(con, vec![Type::TEXT]);
        assert_eq!(applied.to_string(), "A<Text>");
        assert_eq!(applied.normalize(), Type::TEXT);
        assert!(is_subtype(&applied, &Type::TEXT));
    }

    #[test]
    fn function_display_forms() {
        let query = Type::func(FuncType {
            sort: FuncSort::Query,
            type_params: Vec::new(),
            params: Vec::new(),
            param_names: Vec::new(),
            ret: Type::Async(Box::new(Type::TEXT)),
        });
        let actor = Type::obj(ObjSort::Actor, vec![field("main", query)]);
        assert_eq!(actor.to_string(), "actor {main : shared query () -> async Text}");

        let named = FuncType {
            param_names: vec![Some("self".into()), Some("n".into())],
            ..FuncType::local(vec![Type::TEXT, Type::NAT], Type::NAT)
        };
        assert_eq!(named.to_string(), "(self : Text, n : Nat) -> Nat");
        assert_eq!(FuncType::local(vec![Type::NAT], Type::unit()).to_string(), "Nat -> ()");
    }

    #[test]
    fn structural_subtyping() {
        assert!(is_subtype(&Type::NAT, &Type::INT));
        assert!(!is_subtype(&Type::INT, &Type::NAT));
        assert!(is_subtype(&Type::NULL, &Type::Opt(Box::new(Type::NAT))));
        let wide = Type::obj(ObjSort::Object, vec![field("a", Type::NAT), field("b", Type::TEXT)]);
        let narrow = Type::obj(ObjSort::Object, vec![field("a", Type::INT)]);
        assert!(is_subtype(&wide, &narrow));
        assert!(!is_subtype(&narrow, &wide));
        let takes_int = Type::func(FuncType::local(vec![Type::INT], Type::NAT));
        let takes_nat = Type::func(FuncType::local(vec![Type::NAT], Type::INT));
        assert!(is_subtype(&takes_int, &takes_nat));
        assert!(!is_subtype(&takes_nat, &takes_int));
        let mutable_nat = Type::Array(true, Box::new(Type::NAT));
        let mutable_int = Type::Array(true, Box::new(Type::INT));
        assert!(!is_subtype(&mutable_nat, &mutable_int));
    }

    #[test]
    fn inference_binds_type_variables() {
        let vars = vec!["T".to_string()];
        let mut out = HashMap::new();
        let param = Type::Array(false, Box::new(Type::Var("T".into())));
        infer_type_args(&param, &Type::Array(false, Box::new(Type::TEXT)), &vars, &mut out);
        assert_eq!(out.get("T"), Some(&Type::TEXT));
    }
}
