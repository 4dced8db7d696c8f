//! Diagnostic code vocabulary.
//!
//! Every diagnostic the compiler emits carries a stable `Mxxxx` code from this table. Warning codes additionally carry
//! a default level, which `-W=`, `-E=` and `-A=` override per session.
//!
//! ## Notes
//! - [`is_warning_code`] is what configuration uses to validate `-W=` arguments, so a code is accepted there iff the
//!   typechecker can actually emit it as a warning.
//!
//! ## Examples
//! ```rust
//! use motoko_core::lang::codes::{self, DefaultLevel};
//!
//! assert!(codes::is_warning_code("M0223"));
//! assert!(!codes::is_warning_code("M0057"));
//! assert_eq!(codes::info_for("M0194").map(|c| c.default_level), Some(DefaultLevel::Allow));
//! ```

/// Whether a code reports an error or a (configurable) warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    Error,
    Warning,
}

/// Default level of a warning code before session flags apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultLevel {
    Allow,
    Warn,
    Error,
}

/// Metadata for a diagnostic code.
#[derive(Debug, Clone, Copy)]
pub struct CodeInfo {
    pub code: &'static str,
    pub kind: CodeKind,
    pub default_level: DefaultLevel,
    pub summary: &'static str,
}

pub const SYNTAX_ERROR: &str = "M0001";
pub const CYCLIC_IMPORT: &str = "M0003";
pub const IMPORT_NOT_FOUND: &str = "M0009";
pub const IMPORT_UNSUPPORTED: &str = "M0010";
pub const IMPORT_NOT_MODULE: &str = "M0011";
pub const UNBOUND_TYPE: &str = "M0029";
pub const MISPLACED_AWAIT: &str = "M0037";
pub const UNBOUND_VARIABLE: &str = "M0057";
pub const OPERATOR_UNDEFINED: &str = "M0060";
pub const FIELD_MISSING: &str = "M0072";
pub const NOT_MUTABLE: &str = "M0073";
pub const NON_SHARED_PUBLIC: &str = "M0077";
pub const TYPE_MISMATCH: &str = "M0096";
pub const ARGUMENT_COUNT: &str = "M0097";
pub const NOT_A_FUNCTION: &str = "M0098";
pub const MISPLACED_RETURN: &str = "M0119";
pub const NAT_SUBTRACTION: &str = "M0155";
pub const UNUSED_IDENTIFIER: &str = "M0194";
pub const REDUNDANT_INSTANTIATION: &str = "M0223";

/// Registry of all diagnostic codes.
pub const CODES: &[CodeInfo] = &[
    error(SYNTAX_ERROR, "syntax error"),
    error(CYCLIC_IMPORT, "cyclic import"),
    error(IMPORT_NOT_FOUND, "imported file not found"),
    error(IMPORT_UNSUPPORTED, "unsupported import form"),
    error(IMPORT_NOT_MODULE, "imported file is not a module"),
    error(UNBOUND_TYPE, "unbound type"),
    error(MISPLACED_AWAIT, "misplaced await"),
    error(UNBOUND_VARIABLE, "unbound variable"),
    error(OPERATOR_UNDEFINED, "operator not defined for operand types"),
    error(FIELD_MISSING, "field does not exist"),
    error(NOT_MUTABLE, "expected mutable assignment target"),
    error(NON_SHARED_PUBLIC, "public actor field must have shared function type"),
    error(TYPE_MISMATCH, "type mismatch"),
    error(ARGUMENT_COUNT, "wrong number of arguments"),
    error(NOT_A_FUNCTION, "expected function type"),
    error(MISPLACED_RETURN, "misplaced return"),
    warning(NAT_SUBTRACTION, "operator may trap for inferred type Nat", DefaultLevel::Warn),
    warning(UNUSED_IDENTIFIER, "unused identifier", DefaultLevel::Allow),
    warning(REDUNDANT_INSTANTIATION, "redundant type instantiation", DefaultLevel::Allow),
];

/// Full metadata for a code, if it exists.
pub fn info_for(code: &str) -> Option<&'static CodeInfo> {
    CODES.iter().find(|c| c.code == code)
}

/// Return `true` when `code` names a configurable warning.
pub fn is_warning_code(code: &str) -> bool {
    info_for(code).is_some_and(|c| c.kind == CodeKind::Warning)
}

/// All warning codes, in registry order.
pub fn warning_codes() -> impl Iterator<Item = &'static CodeInfo> {
    CODES.iter().filter(|c| c.kind == CodeKind::Warning)
}

const fn error(code: &'static str, summary: &'static str) -> CodeInfo {
    CodeInfo {
        code,
        kind: CodeKind::Error,
        default_level: DefaultLevel::Error,
        summary,
    }
}

const fn warning(code: &'static str, summary: &'static str, default_level: DefaultLevel) -> CodeInfo {
    CodeInfo {
        code,
        kind: CodeKind::Warning,
        default_level,
        summary,
    }
}
