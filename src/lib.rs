#![forbid(unsafe_code)]
//! Motoko Compiler Core
//!
//! This crate provides the compiler pipeline for Motoko, an actor-oriented language for the Internet Computer:
//! an error-recovering parser (in `motoko_syntax`), a cache-aware module resolver and typechecker, contextual dot
//! queries for editors, a Candid interface extractor, a wasm backend for the WASI and Internet Computer profiles,
//! and a reference interpreter. Tooling on top: the `moc` CLI and a language server.
//!
//! ## Entry points
//!
//! - [`session::Session`]: the in-process API (unit store, flags, typed trees, compile, run)
//! - [`api`]: result shapes and the session-independent [`api::parse`]
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `backend` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a compiler bug (logic error), use `.expect("INVARIANT: reason")` with a
//!   clear explanation.

pub mod api;
pub mod backend;
pub mod cli;
pub mod config;
pub mod frontend;
pub mod interface;
pub mod interp;
pub mod lsp;
pub mod session;
pub mod vfs;

pub use frontend::ast;
pub use frontend::diagnostics;
pub use frontend::parser;
pub use frontend::typechecker;

pub use api::{CompileResult, ParseResult, RunResult};
pub use session::{Session, default_session};
