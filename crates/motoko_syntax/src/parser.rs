//! Error-recovering parser for Motoko.
//!
//! Converts a token stream into an AST [`Program`]. Two modes:
//! - **strict** (`recover = false`): the first syntax error halts parsing and no tree is produced;
//! - **recovering** (`recover = true`): malformed fragments become placeholder nodes (`Dec::Error`,
//!   `ExpKind::Error`, `PatKind::Error`, `TypKind::Error`), the parser resynchronizes at `;`, `}` or a declaration
//!   keyword, and every recovered error is reported alongside the tree.
//!
//! ## Examples
//!
//! ```rust
//! use motoko_syntax::parser;
//!
//! let strict = parser::parse_source("1+", false);
//! assert!(strict.program.is_none());
//! assert_eq!(strict.errors.len(), 1);
//!
//! let recovered = parser::parse_source("1+", true);
//! assert!(recovered.program.is_some());
//! assert_eq!(recovered.errors.len(), 1);
//! ```

use std::sync::Arc;

use crate::ast::*;
use crate::diagnostics::CompileError;
use crate::lexer::{self, Token, TokenKind};
use motoko_core::lang::keywords::{self, KeywordId};
use motoko_core::lang::operators::{self, Associativity, OperatorId};
use motoko_core::lang::punctuation::PunctuationId;

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/decl.rs");
include!("parser/types.rs");
include!("parser/pat.rs");
include!("parser/expr.rs");
include!("parser/util.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
