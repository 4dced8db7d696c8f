//! Provide the canonical Motoko language vocabulary and a few pure text helpers.
//!
//! This crate is intentionally small and dependency-free. Both the syntax frontend and the compiler pipeline use it:
//! - the lexer/parser resolve spellings to stable ids through [`lang`],
//! - the typechecker, interpreter and interface extractor share one definition of primitive types and diagnostic
//!   codes, so a warning code accepted by `-W=` is always one the typechecker can emit.
//!
//! ## Notes
//!
//! - This is a “vocabulary core” crate: **no IO**, no global state, and no compiler-specific types.

pub mod lang;
pub mod text;
