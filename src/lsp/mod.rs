//! Motoko Language Server Protocol (LSP) implementation
//!
//! Provides IDE features:
//! - Real-time diagnostics (syntax, type, import errors and enabled warnings)
//! - Contextual dot completions (`text.` offers `Text.size`-style module functions)
//! - Hover with the static type of the expression under the cursor

pub mod backend;
pub mod completion;
pub mod diagnostics;

pub use backend::MotokoLanguageServer;
