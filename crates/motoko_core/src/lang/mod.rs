//! Motoko language vocabulary registries.
//!
//! This module is the “front door” for language-level vocabulary: reserved keywords, operators, punctuation,
//! primitive types and diagnostic codes.
//!
//! Callers work with **stable IDs** (e.g. `KeywordId`, `OperatorId`) and look up spellings/metadata via registry
//! tables instead of matching strings across the compiler.
//!
//! ## Notes
//! - Registries are intentionally **pure**: no AST types, no IO, no side effects.
//! - The lexer/parser enforce syntax; registries provide spellings and metadata for shared use (diagnostics,
//!   highlighting, completion).
//!
//! ## Examples
//! ```rust
//! use motoko_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("actor"), Some(KeywordId::Actor));
//! assert_eq!(keywords::as_str(KeywordId::Actor), "actor");
//! ```

pub mod codes;
pub mod keywords;
pub mod operators;
pub mod prims;
pub mod punctuation;
pub mod registry;
