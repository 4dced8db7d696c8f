//! Shared syntax frontend for Motoko: lexer, error-recovering parser, AST, diagnostics and the serializable syntax
//! tree handed to tooling.
//!
//! This crate is dependency-light and reused by the compiler pipeline, the CLI and the language server.
//!
//! ## Notes
//! - This crate is intentionally “syntax-only”: it does not resolve imports or check types.
//! - Vocabulary identity (keywords/operators/punctuation) comes from `motoko_core::lang` registries.
//! - Positions are byte offsets ([`ast::Span`]) until a [`diagnostics::LineIndex`] turns them into line/character
//!   pairs for the wire.
//!
//! ## Examples
//! ```rust
//! use motoko_syntax::parser;
//!
//! let outcome = parser::parse_source("let x = 1; x + 1", false);
//! assert!(outcome.errors.is_empty());
//! assert_eq!(outcome.program.map(|p| p.decs.len()), Some(2));
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod syntax_tree;
