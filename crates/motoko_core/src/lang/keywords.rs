//! Define the reserved keyword vocabulary for Motoko.
//!
//! This module is the single source of truth for reserved words: a stable identifier ([`KeywordId`]) plus a const
//! metadata table ([`KEYWORDS`]) that records canonical spellings, categories and provenance.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Some reserved words are also “word operators” (`and`, `or`, `not`). If you need operator precedence, use
//!   [`crate::lang::operators`].
//! - Keywords marked [`Stability::Reserved`] lex as keywords (so they can never be identifiers) but the parser
//!   rejects them with a syntax error.
//!
//! ## Examples
//! ```rust
//! use motoko_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("persistent"), Some(KeywordId::Persistent));
//! assert_eq!(keywords::as_str(KeywordId::DebugShow), "debug_show");
//! ```

use super::registry::{Since, Stability};

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Control flow
    If,
    Else,
    Switch,
    Case,
    While,
    Loop,
    For,
    In,
    Return,
    Break,
    Continue,
    Label,
    Do,
    Throw,
    Try,
    Catch,
    Finally,

    // Declarations
    Let,
    Var,
    Type,
    Func,
    Class,
    Module,
    Object,
    Actor,
    Import,

    // Modifiers
    Public,
    Private,
    System,
    Shared,
    Query,
    Stable,
    Transient,
    Flexible,
    Persistent,

    // Expressions
    Async,
    Await,
    Ignore,
    Assert,
    DebugShow,
    ToCandid,
    FromCandid,
    With,
    Debug,

    // Literals
    True,
    False,
    Null,

    // Word operators
    And,
    Or,
    Not,
}

/// Broad syntactic grouping for keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    ControlFlow,
    Definition,
    Modifier,
    Expression,
    Literal,
    Operator,
}

/// Metadata for a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
    pub since: Since,
    pub stability: Stability,
}

/// Registry of all reserved keywords.
pub const KEYWORDS: &[KeywordInfo] = &[
    // Control flow
    stable(KeywordId::If, "if", KeywordCategory::ControlFlow),
    stable(KeywordId::Else, "else", KeywordCategory::ControlFlow),
    stable(KeywordId::Switch, "switch", KeywordCategory::ControlFlow),
    stable(KeywordId::Case, "case", KeywordCategory::ControlFlow),
    stable(KeywordId::While, "while", KeywordCategory::ControlFlow),
    stable(KeywordId::Loop, "loop", KeywordCategory::ControlFlow),
    stable(KeywordId::For, "for", KeywordCategory::ControlFlow),
    stable(KeywordId::In, "in", KeywordCategory::ControlFlow),
    stable(KeywordId::Return, "return", KeywordCategory::ControlFlow),
    reserved(KeywordId::Break, "break", KeywordCategory::ControlFlow),
    reserved(KeywordId::Continue, "continue", KeywordCategory::ControlFlow),
    reserved(KeywordId::Label, "label", KeywordCategory::ControlFlow),
    reserved(KeywordId::Do, "do", KeywordCategory::ControlFlow),
    reserved(KeywordId::Throw, "throw", KeywordCategory::ControlFlow),
    reserved(KeywordId::Try, "try", KeywordCategory::ControlFlow),
    reserved(KeywordId::Catch, "catch", KeywordCategory::ControlFlow),
    reserved(KeywordId::Finally, "finally", KeywordCategory::ControlFlow),
    // Declarations
    stable(KeywordId::Let, "let", KeywordCategory::Definition),
    stable(KeywordId::Var, "var", KeywordCategory::Definition),
    stable(KeywordId::Type, "type", KeywordCategory::Definition),
    stable(KeywordId::Func, "func", KeywordCategory::Definition),
    stable(KeywordId::Class, "class", KeywordCategory::Definition),
    stable(KeywordId::Module, "module", KeywordCategory::Definition),
    stable(KeywordId::Object, "object", KeywordCategory::Definition),
    stable(KeywordId::Actor, "actor", KeywordCategory::Definition),
    stable(KeywordId::Import, "import", KeywordCategory::Definition),
    // Modifiers
    stable(KeywordId::Public, "public", KeywordCategory::Modifier),
    stable(KeywordId::Private, "private", KeywordCategory::Modifier),
    stable(KeywordId::System, "system", KeywordCategory::Modifier),
    stable(KeywordId::Shared, "shared", KeywordCategory::Modifier),
    stable(KeywordId::Query, "query", KeywordCategory::Modifier),
    stable(KeywordId::Stable, "stable", KeywordCategory::Modifier),
    stable(KeywordId::Transient, "transient", KeywordCategory::Modifier),
    stable(KeywordId::Flexible, "flexible", KeywordCategory::Modifier),
    stable(KeywordId::Persistent, "persistent", KeywordCategory::Modifier),
    // Expressions
    stable(KeywordId::Async, "async", KeywordCategory::Expression),
    stable(KeywordId::Await, "await", KeywordCategory::Expression),
    stable(KeywordId::Ignore, "ignore", KeywordCategory::Expression),
    stable(KeywordId::Assert, "assert", KeywordCategory::Expression),
    stable(KeywordId::DebugShow, "debug_show", KeywordCategory::Expression),
    reserved(KeywordId::ToCandid, "to_candid", KeywordCategory::Expression),
    reserved(KeywordId::FromCandid, "from_candid", KeywordCategory::Expression),
    reserved(KeywordId::With, "with", KeywordCategory::Expression),
    reserved(KeywordId::Debug, "debug", KeywordCategory::Expression),
    // Literals
    stable(KeywordId::True, "true", KeywordCategory::Literal),
    stable(KeywordId::False, "false", KeywordCategory::Literal),
    stable(KeywordId::Null, "null", KeywordCategory::Literal),
    // Word operators
    stable(KeywordId::And, "and", KeywordCategory::Operator),
    stable(KeywordId::Or, "or", KeywordCategory::Operator),
    stable(KeywordId::Not, "not", KeywordCategory::Operator),
];

/// Canonical spelling.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Category.
pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// Return `true` when the parser accepts this keyword in some production.
pub fn is_supported(id: KeywordId) -> bool {
    info_for(id).stability != Stability::Reserved
}

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS.iter().find(|k| k.id == id).expect("keyword info missing")
}

/// Lookup by spelling.
///
/// ## Returns
/// - `Some(KeywordId)` if the spelling is a reserved word, `None` otherwise.
pub fn from_str(s: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == s).map(|k| k.id)
}

// --- helpers -----------------------------------------------------------------

const fn stable(id: KeywordId, canonical: &'static str, category: KeywordCategory) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category,
        since: Since(0, 1),
        stability: Stability::Stable,
    }
}

const fn reserved(id: KeywordId, canonical: &'static str, category: KeywordCategory) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category,
        since: Since(0, 1),
        stability: Stability::Reserved,
    }
}
