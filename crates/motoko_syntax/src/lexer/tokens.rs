//! Token types for the Motoko lexer.
//!
//! The lexer uses **registry-backed IDs** for language vocabulary:
//! - `Keyword(KeywordId)` for reserved words
//! - `Operator(OperatorId)` for operators (including word-operators like `and`)
//! - `Punctuation(PunctuationId)` for punctuation tokens
//!
//! ## Notes
//! - Lexical errors become [`TokenKind::Error`] tokens so the parser reports them in source order with the same
//!   recovery machinery as syntax errors.
//! - Doc comments are not tokens: the lexer attaches them to the next token ([`Token::doc`]).

use std::fmt;
use std::sync::Arc;

use crate::ast::Span;
use motoko_core::lang::keywords::{self, KeywordId};
use motoko_core::lang::operators::{self, OperatorId};
use motoko_core::lang::punctuation::{self, PunctuationId};

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keyword / operator / punctuation (ID-based) ==========
    Keyword(KeywordId),
    Operator(OperatorId),
    Punctuation(PunctuationId),

    // ========== Identifiers and Literals ==========
    Ident(String),
    /// Decimal digits without `_` separators (hex literals are converted).
    Nat(String),
    Float(String),
    Text(Arc<str>),
    Char(char),

    // ========== Special ==========
    /// A lexical error; the payload is the diagnostic message.
    Error(String),
    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == id)
    }

    pub fn is_operator(&self, id: OperatorId) -> bool {
        matches!(self, TokenKind::Operator(o) if *o == id)
    }

    pub fn is_punctuation(&self, id: PunctuationId) -> bool {
        matches!(self, TokenKind::Punctuation(p) if *p == id)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(id) => f.write_str(keywords::as_str(*id)),
            TokenKind::Operator(id) => f.write_str(operators::as_str(*id)),
            TokenKind::Punctuation(id) => f.write_str(punctuation::as_str(*id)),
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::Nat(digits) | TokenKind::Float(digits) => f.write_str(digits),
            TokenKind::Text(text) => f.write_str(&motoko_core::text::quote(text)),
            TokenKind::Char(c) => f.write_str(&motoko_core::text::quote_char(*c)),
            TokenKind::Error(_) => f.write_str("<error>"),
            TokenKind::Eof => f.write_str("<eof>"),
        }
    }
}

/// A token with its kind, source span and the doc comment immediately preceding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub doc: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span, doc: None }
    }
}

/// Resolve an identifier spelling to a keyword id, if reserved.
pub fn keyword_id(name: &str) -> Option<KeywordId> {
    keywords::from_str(name)
}
