//! Motoko compiler frontend.
//!
//! This module contains the semantic half of the frontend:
//! - `types`: semantic types, subtyping and display
//! - `scope`: module scopes shared between importers
//! - `typechecker`: type checking of one unit
//! - `resolver`: import resolution and checking in dependency order
//! - `cache`: fingerprinted scope cache consulted by the resolver
//! - `semantic`: the arena behind typed syntax tree handles
//! - `dot`: contextual dot queries for tooling

// Syntax components are provided by the shared motoko_syntax crate.
pub use motoko_syntax::{ast, diagnostics, lexer, parser, syntax_tree};

pub mod cache;
pub mod dot;
pub mod resolver;
pub mod scope;
pub mod semantic;
pub mod typechecker;
pub mod types;
