//! Primitive type vocabulary.
//!
//! Each primitive type has a Motoko spelling (`Nat`), a Candid spelling (`nat`) and a numeric class used by the
//! typechecker's operator rules and by the interpreter's overflow checks.
//!
//! ## Examples
//! ```rust
//! use motoko_core::lang::prims::{self, PrimTypeId};
//!
//! assert_eq!(prims::from_str("Nat8"), Some(PrimTypeId::Nat8));
//! assert_eq!(prims::candid_name(PrimTypeId::Float), "float64");
//! assert!(prims::is_unsigned(PrimTypeId::Nat));
//! ```

/// Stable identifier for every primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimTypeId {
    Nat,
    Nat8,
    Nat16,
    Nat32,
    Nat64,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Bool,
    Char,
    Text,
    Blob,
    Principal,
    Null,
    Error,
}

/// Numeric classification of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericClass {
    /// Unsigned integers (`Nat`, `Nat8`..`Nat64`).
    Unsigned,
    /// Signed integers (`Int`, `Int8`..`Int64`).
    Signed,
    Float,
    NotNumeric,
}

/// Metadata for a primitive type.
#[derive(Debug, Clone, Copy)]
pub struct PrimTypeInfo {
    pub id: PrimTypeId,
    pub name: &'static str,
    pub candid: &'static str,
    pub class: NumericClass,
    /// Bit width for bounded numbers; `None` for unbounded `Nat`/`Int` and non-numeric types.
    pub bits: Option<u32>,
}

/// Registry of all primitive types.
pub const PRIM_TYPES: &[PrimTypeInfo] = &[
    prim(PrimTypeId::Nat, "Nat", "nat", NumericClass::Unsigned, None),
    prim(PrimTypeId::Nat8, "Nat8", "nat8", NumericClass::Unsigned, Some(8)),
    prim(PrimTypeId::Nat16, "Nat16", "nat16", NumericClass::Unsigned, Some(16)),
    prim(PrimTypeId::Nat32, "Nat32", "nat32", NumericClass::Unsigned, Some(32)),
    prim(PrimTypeId::Nat64, "Nat64", "nat64", NumericClass::Unsigned, Some(64)),
    prim(PrimTypeId::Int, "Int", "int", NumericClass::Signed, None),
    prim(PrimTypeId::Int8, "Int8", "int8", NumericClass::Signed, Some(8)),
    prim(PrimTypeId::Int16, "Int16", "int16", NumericClass::Signed, Some(16)),
    prim(PrimTypeId::Int32, "Int32", "int32", NumericClass::Signed, Some(32)),
    prim(PrimTypeId::Int64, "Int64", "int64", NumericClass::Signed, Some(64)),
    prim(PrimTypeId::Float, "Float", "float64", NumericClass::Float, None),
    prim(PrimTypeId::Bool, "Bool", "bool", NumericClass::NotNumeric, None),
    prim(PrimTypeId::Char, "Char", "nat32", NumericClass::NotNumeric, None),
    prim(PrimTypeId::Text, "Text", "text", NumericClass::NotNumeric, None),
    prim(PrimTypeId::Blob, "Blob", "blob", NumericClass::NotNumeric, None),
    prim(PrimTypeId::Principal, "Principal", "principal", NumericClass::NotNumeric, None),
    prim(PrimTypeId::Null, "Null", "null", NumericClass::NotNumeric, None),
    prim(PrimTypeId::Error, "Error", "reserved", NumericClass::NotNumeric, None),
];

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: PrimTypeId) -> &'static PrimTypeInfo {
    PRIM_TYPES.iter().find(|p| p.id == id).expect("primitive type info missing")
}

/// Motoko spelling.
pub fn as_str(id: PrimTypeId) -> &'static str {
    info_for(id).name
}

/// Candid spelling.
pub fn candid_name(id: PrimTypeId) -> &'static str {
    info_for(id).candid
}

/// Lookup by Motoko spelling.
pub fn from_str(s: &str) -> Option<PrimTypeId> {
    PRIM_TYPES.iter().find(|p| p.name == s).map(|p| p.id)
}

pub fn is_numeric(id: PrimTypeId) -> bool {
    info_for(id).class != NumericClass::NotNumeric
}

pub fn is_unsigned(id: PrimTypeId) -> bool {
    info_for(id).class == NumericClass::Unsigned
}

pub fn is_integral(id: PrimTypeId) -> bool {
    matches!(info_for(id).class, NumericClass::Unsigned | NumericClass::Signed)
}

/// Inclusive value range of a bounded integer type, as `(min, max)`.
///
/// ## Returns
/// - `None` for unbounded and non-integral types.
pub fn bounds(id: PrimTypeId) -> Option<(i128, i128)> {
    let info = info_for(id);
    let bits = info.bits?;
    match info.class {
        NumericClass::Unsigned => Some((0, (1i128 << bits) - 1)),
        NumericClass::Signed => Some((-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)),
        _ => None,
    }
}

const fn prim(
    id: PrimTypeId,
    name: &'static str,
    candid: &'static str,
    class: NumericClass,
    bits: Option<u32>,
) -> PrimTypeInfo {
    PrimTypeInfo {
        id,
        name,
        candid,
        class,
        bits,
    }
}
