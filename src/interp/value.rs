//! Runtime values and their printed form.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::rc::Rc;

use motoko_core::lang::prims::{self, PrimTypeId};
use num_bigint::{BigInt, Sign};
use motoko_syntax::ast::{ClassDec, FuncLit, ObjSort};

use super::principal;
use crate::frontend::types::Type;

/// A mutable storage location shared between an environment and the objects exposing it.
pub type Cell<'p> = Rc<RefCell<Value<'p>>>;

/// Lexical environment.
pub type Env<'p> = Rc<Scope<'p>>;

#[derive(Default)]
pub struct Scope<'p> {
    vars: RefCell<HashMap<String, Cell<'p>>>,
    parent: Option<Env<'p>>,
}

impl<'p> Scope<'p> {
    pub fn root() -> Env<'p> {
        Rc::new(Scope::default())
    }

    pub fn child(parent: &Env<'p>) -> Env<'p> {
        Rc::new(Scope {
            vars: RefCell::default(),
            parent: Some(parent.clone()),
        })
    }

    pub fn define(&self, name: &str, value: Value<'p>) -> Cell<'p> {
        let cell = Rc::new(RefCell::new(value));
        self.vars.borrow_mut().insert(name.to_string(), cell.clone());
        cell
    }

    pub fn lookup(&self, name: &str) -> Option<Cell<'p>> {
        if let Some(cell) = self.vars.borrow().get(name) {
            return Some(cell.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    /// Binding of `name` in this scope only.
    pub fn local(&self, name: &str) -> Option<Cell<'p>> {
        self.vars.borrow().get(name).cloned()
    }
}

#[derive(Clone)]
pub enum Value<'p> {
    Null,
    Bool(bool),
    /// Every integral type; the static type fixes the range.
    Int(BigInt),
    Float(f64),
    Char(char),
    Text(Rc<str>),
    Blob(Rc<[u8]>),
    Opt(Box<Value<'p>>),
    Tuple(Rc<[Value<'p>]>),
    Array(Rc<RefCell<Vec<Value<'p>>>>),
    Object(Rc<Object<'p>>),
    Actor { id: u64, object: Rc<Object<'p>> },
    Func(Rc<Callable<'p>>),
    /// Result of an eagerly evaluated `async`.
    Future(Box<Value<'p>>),
}

impl<'p> Value<'p> {
    pub fn unit() -> Self {
        Value::Tuple(Rc::from(Vec::new()))
    }

    pub fn text(text: &str) -> Self {
        Value::Text(Rc::from(text))
    }

    pub fn int(n: impl Into<BigInt>) -> Self {
        Value::Int(n.into())
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Tuple(items) if items.is_empty())
    }

    /// Fields of objects, modules and actors.
    pub fn object(&self) -> Option<&Rc<Object<'p>>> {
        match self {
            Value::Object(object) | Value::Actor { object, .. } => Some(object),
            _ => None,
        }
    }
}

/// Public fields of an object, module or actor.
pub struct Object<'p> {
    pub sort: ObjSort,
    pub fields: BTreeMap<String, Cell<'p>>,
}

impl<'p> Object<'p> {
    pub fn field(&self, name: &str) -> Option<Value<'p>> {
        self.fields.get(name).map(|cell| cell.borrow().clone())
    }
}

pub enum Callable<'p> {
    Closure {
        func: &'p FuncLit,
        env: Env<'p>,
        /// Unit whose type information covers the body.
        unit: usize,
    },
    Class {
        dec: &'p ClassDec,
        env: Env<'p>,
        unit: usize,
    },
    Prim(PrimFn),
    Builtin(Builtin, Value<'p>),
    /// `next` of an iterator over a snapshot of values.
    Next(RefCell<std::vec::IntoIter<Value<'p>>>),
}

/// Functions of `mo:prim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimFn {
    DebugPrint,
    IntToText,
    NatToText,
    TextSize,
    Trap,
}

impl PrimFn {
    pub const ALL: [PrimFn; 5] = [
        PrimFn::DebugPrint,
        PrimFn::IntToText,
        PrimFn::NatToText,
        PrimFn::TextSize,
        PrimFn::Trap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimFn::DebugPrint => "debugPrint",
            PrimFn::IntToText => "intToText",
            PrimFn::NatToText => "natToText",
            PrimFn::TextSize => "textSize",
            PrimFn::Trap => "trap",
        }
    }
}

/// Members of primitive values (`t.size()`, `a.vals()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Size,
    Chars,
    Vals,
    Keys,
}

impl Builtin {
    pub fn lookup(receiver: &Value<'_>, name: &str) -> Option<Builtin> {
        match (receiver, name) {
            (Value::Text(_) | Value::Blob(_) | Value::Array(_), "size") => Some(Builtin::Size),
            (Value::Text(_), "chars") => Some(Builtin::Chars),
            (Value::Array(_), "vals") => Some(Builtin::Vals),
            (Value::Array(_), "keys") => Some(Builtin::Keys),
            _ => None,
        }
    }
}

/// The `mo:prim` module value.
pub fn prim_module<'p>() -> Value<'p> {
    let fields = PrimFn::ALL
        .iter()
        .map(|f| {
            let value = Value::Func(Rc::new(Callable::Prim(*f)));
            (f.name().to_string(), Rc::new(RefCell::new(value)))
        })
        .collect();
    Value::Object(Rc::new(Object {
        sort: ObjSort::Module,
        fields,
    }))
}

/// Iterator object over `items`.
pub fn iterator<'p>(items: Vec<Value<'p>>) -> Value<'p> {
    let next = Value::Func(Rc::new(Callable::Next(RefCell::new(items.into_iter()))));
    let mut fields = BTreeMap::new();
    fields.insert("next".to_string(), Rc::new(RefCell::new(next)));
    Value::Object(Rc::new(Object {
        sort: ObjSort::Object,
        fields,
    }))
}

/// Structural equality.
pub fn equal(a: &Value<'_>, b: &Value<'_>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Blob(x), Value::Blob(y)) => x == y,
        (Value::Opt(x), Value::Opt(y)) => equal(x, y),
        (Value::Tuple(xs), Value::Tuple(ys)) => xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| equal(x, y)),
        (Value::Array(xs), Value::Array(ys)) => {
            let (xs, ys) = (xs.borrow(), ys.borrow());
            xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.fields.len() == y.fields.len()
                && x.fields.iter().zip(y.fields.iter()).all(|((nx, cx), (ny, cy))| {
                    nx == ny && equal(&cx.borrow(), &cy.borrow())
                })
        }
        (Value::Actor { id: x, .. }, Value::Actor { id: y, .. }) => x == y,
        _ => false,
    }
}

// ============================================================================
// Printing
// ============================================================================

/// Printed form of a value of static type `ty`, as `debug_show` renders it.
pub fn show(value: &Value<'_>, ty: &Type) -> String {
    let mut out = String::new();
    write_value(&mut out, value, ty);
    out
}

fn write_value(out: &mut String, value: &Value<'_>, ty: &Type) {
    let ty = ty.normalize();
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(n) => {
            let signed = ty
                .as_prim()
                .is_some_and(|p| prims::is_integral(p) && !prims::is_unsigned(p));
            let negative = n.sign() == Sign::Minus;
            if signed && !negative {
                out.push('+');
            }
            if negative {
                out.push('-');
            }
            out.push_str(&group_digits(&n.magnitude().to_string()));
        }
        Value::Float(f) => out.push_str(&show_float(*f)),
        Value::Char(c) => {
            let _ = write!(out, "'{}'", c.escape_debug());
        }
        Value::Text(t) => {
            let _ = write!(out, "\"{}\"", t.escape_debug());
        }
        Value::Blob(bytes) => {
            out.push('"');
            for b in bytes.iter() {
                let _ = write!(out, "\\{b:02X}");
            }
            out.push('"');
        }
        Value::Opt(inner) => {
            out.push('?');
            let inner_ty = match &ty {
                Type::Opt(t) => (**t).clone(),
                _ => Type::Any,
            };
            write_value(out, inner, &inner_ty);
        }
        Value::Tuple(items) => {
            let tys = match &ty {
                Type::Tuple(tys) => tys.clone(),
                _ => Vec::new(),
            };
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, tys.get(i).unwrap_or(&Type::Any));
            }
            out.push(')');
        }
        Value::Array(items) => {
            let (mutable, elem) = match &ty {
                Type::Array(mutable, elem) => (*mutable, (**elem).clone()),
                _ => (false, Type::Any),
            };
            out.push('[');
            if mutable {
                out.push_str("var ");
            }
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, &elem);
            }
            out.push(']');
        }
        Value::Object(object) => {
            out.push('{');
            for (i, (name, cell)) in object.fields.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                let field_ty = ty.field(name).map(|f| f.ty).unwrap_or(Type::Any);
                let _ = write!(out, "{name} = ");
                write_value(out, &cell.borrow(), &field_ty);
            }
            out.push('}');
        }
        Value::Actor { id, .. } => {
            let _ = write!(out, "`{}`", principal::actor_principal(*id));
        }
        Value::Func(_) => out.push_str("func"),
        Value::Future(_) => out.push_str("async"),
    }
}

/// Digits grouped in threes with `_` (`1_000_000`).
fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('_');
        }
        out.push(c);
    }
    out
}

fn show_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.0}.")
    } else {
        format!("{f}")
    }
}

/// Whether `value` lies in the range of the integral type `prim`.
pub fn in_range(value: &BigInt, prim: PrimTypeId) -> bool {
    match prims::bounds(prim) {
        Some((lo, hi)) => BigInt::from(lo) <= *value && *value <= BigInt::from(hi),
        None if prims::is_unsigned(prim) => value.sign() != Sign::Minus,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_print_with_sign_and_grouping() {
        assert_eq!(show(&Value::int(1_000_000), &Type::NAT), "1_000_000");
        assert_eq!(show(&Value::int(42), &Type::INT), "+42");
        assert_eq!(show(&Value::int(-1234), &Type::INT), "-1_234");
        assert_eq!(show(&Value::int(999), &Type::NAT), "999");
        let huge = BigInt::from(2).pow(70);
        assert_eq!(show(&Value::Int(-huge), &Type::INT), "-1_180_591_620_717_411_303_424");
    }

    #[test]
    fn structured_values() {
        let tuple = Value::Tuple(Rc::from(vec![Value::text("a\"b"), Value::Opt(Box::new(Value::int(1)))]));
        let ty = Type::Tuple(vec![Type::TEXT, Type::Opt(Box::new(Type::NAT))]);
        assert_eq!(show(&tuple, &ty), "(\"a\\\"b\", ?1)");
        assert_eq!(show(&Value::unit(), &Type::unit()), "()");
        let array = Value::Array(Rc::new(RefCell::new(vec![Value::Bool(true), Value::Null])));
        assert_eq!(show(&array, &Type::Array(true, Box::new(Type::Any))), "[var true, null]");
    }

    #[test]
    fn actors_print_their_principal() {
        let actor = Value::Actor {
            id: 1,
            object: Rc::new(Object {
                sort: ObjSort::Actor,
                fields: BTreeMap::new(),
            }),
        };
        assert_eq!(show(&actor, &Type::Any), "`ys6dh-5cjiq-5dc`");
    }

    #[test]
    fn ranges_follow_the_primitive_type() {
        assert!(in_range(&BigInt::from(255), PrimTypeId::Nat8));
        assert!(!in_range(&BigInt::from(256), PrimTypeId::Nat8));
        assert!(!in_range(&BigInt::from(-1), PrimTypeId::Nat));
        assert!(in_range(&BigInt::from(-1), PrimTypeId::Int));
        assert!(in_range(&BigInt::from(u128::MAX).pow(3), PrimTypeId::Nat));
    }

    #[test]
    fn floats_keep_a_decimal_point() {
        assert_eq!(show_float(3.0), "3.");
        assert_eq!(show_float(0.5), "0.5");
    }

    #[test]
    fn scopes_shadow_and_share_cells() {
        let root = Scope::root();
        let cell = root.define("x", Value::int(1));
        let inner = Scope::child(&root);
        assert!(inner.local("x").is_none());
        *cell.borrow_mut() = Value::int(2);
        assert!(equal(&inner.lookup("x").unwrap().borrow(), &Value::int(2)));
        inner.define("x", Value::Bool(true));
        assert!(matches!(*inner.lookup("x").unwrap().borrow(), Value::Bool(true)));
    }
}
