//! Builtin members of primitive and array types, and numeric literal rules.

use motoko_core::lang::prims::{self, PrimTypeId};
use motoko_syntax::ast::{Lit, ObjSort};

use crate::frontend::types::{Field, FuncType, Type};

/// Type of a literal in inference mode.
pub(crate) fn lit_type(lit: &Lit) -> Type {
    match lit {
        Lit::Nat(_) => Type::NAT,
        Lit::Float(_) => Type::FLOAT,
        Lit::Text(_) => Type::TEXT,
        Lit::Char(_) => Type::CHAR,
        Lit::Bool(_) => Type::BOOL,
        Lit::Null => Type::NULL,
    }
}

/// Value of a natural literal's decimal digits; `None` beyond 128-bit range.
pub fn parse_nat(digits: &str) -> Option<i128> {
    digits.parse().ok()
}

/// How a natural literal (optionally negated) fits a numeric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LiteralFit {
    Fits,
    OutOfRange,
    NotNumeric,
}

pub(crate) fn nat_literal_fit(digits: &str, negated: bool, target: PrimTypeId) -> LiteralFit {
    if !prims::is_numeric(target) {
        return LiteralFit::NotNumeric;
    }
    if target == PrimTypeId::Float {
        return LiteralFit::Fits;
    }
    let Some(value) = parse_nat(digits) else {
        // Beyond 128 bits only the unbounded types remain.
        return match prims::bounds(target) {
            None if !(negated && prims::is_unsigned(target)) => LiteralFit::Fits,
            _ => LiteralFit::OutOfRange,
        };
    };
    let value = if negated { -value } else { value };
    if prims::is_unsigned(target) && value < 0 {
        return LiteralFit::OutOfRange;
    }
    match prims::bounds(target) {
        Some((min, max)) if value < min || value > max => LiteralFit::OutOfRange,
        _ => LiteralFit::Fits,
    }
}

/// `{ next : () -> ?elem }`
pub(crate) fn iter_type(elem: Type) -> Type {
    let next = Type::func(FuncType::local(Vec::new(), Type::Opt(Box::new(elem))));
    Type::obj(
        ObjSort::Object,
        vec![Field {
            name: "next".into(),
            ty: next,
            mutable: false,
        }],
    )
}

/// Member `name` of a receiver that is not an object: `Text.size`, `Text.chars`, `Array.size`, `Array.vals`,
/// `Array.keys`, `Blob.size`.
pub(crate) fn builtin_member(receiver: &Type, name: &str) -> Option<Type> {
    let nullary = |ret: Type| Some(Type::func(FuncType::local(Vec::new(), ret)));
    match (receiver.normalize(), name) {
        (Type::Prim(PrimTypeId::Text), "size") => nullary(Type::NAT),
        (Type::Prim(PrimTypeId::Text), "chars") => nullary(iter_type(Type::CHAR)),
        (Type::Prim(PrimTypeId::Blob), "size") => nullary(Type::NAT),
        (Type::Array(_, _), "size") => nullary(Type::NAT),
        (Type::Array(_, elem), "vals") => nullary(iter_type(*elem)),
        (Type::Array(_, _), "keys") => nullary(iter_type(Type::NAT)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_ranges() {
        assert_eq!(nat_literal_fit("255", false, PrimTypeId::Nat8), LiteralFit::Fits);
        assert_eq!(nat_literal_fit("256", false, PrimTypeId::Nat8), LiteralFit::OutOfRange);
        assert_eq!(nat_literal_fit("128", true, PrimTypeId::Int8), LiteralFit::Fits);
        assert_eq!(nat_literal_fit("1", true, PrimTypeId::Nat), LiteralFit::OutOfRange);
        assert_eq!(nat_literal_fit("65535", false, PrimTypeId::Nat16), LiteralFit::Fits);
        assert_eq!(nat_literal_fit("1", false, PrimTypeId::Text), LiteralFit::NotNumeric);
        let huge = "1".repeat(60);
        assert_eq!(nat_literal_fit(&huge, false, PrimTypeId::Nat), LiteralFit::Fits);
        assert_eq!(nat_literal_fit(&huge, true, PrimTypeId::Int), LiteralFit::Fits);
        assert_eq!(nat_literal_fit(&huge, true, PrimTypeId::Nat), LiteralFit::OutOfRange);
        assert_eq!(nat_literal_fit(&huge, false, PrimTypeId::Nat64), LiteralFit::OutOfRange);
    }

    #[test]
    fn builtin_members_of_text_and_arrays() {
        assert_eq!(
            builtin_member(&Type::TEXT, "size").map(|t| t.to_string()),
            Some("() -> Nat".into())
        );
        let array = Type::Array(false, Box::new(Type::TEXT));
        assert_eq!(
            builtin_member(&array, "vals").map(|t| t.to_string()),
            Some("() -> {next : () -> ?Text}".into())
        );
        assert!(builtin_member(&Type::NAT, "size").is_none());
    }
}
