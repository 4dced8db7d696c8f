//! Operator vocabulary.
//!
//! This module defines the canonical operator set (symbol operators like `+` and word operators like `and`) along
//! with precedence, associativity and fixity.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - `#` (text concatenation) shares the additive precedence level with `+` and `-`.
//! - `-` and `+` are listed once as infix operators; their prefix forms bind at [`PREFIX_PRECEDENCE`].
//!
//! ## Examples
//! ```rust
//! use motoko_core::lang::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_str("#"), Some(OperatorId::Hash));
//! assert_eq!(operators::info_for(OperatorId::Hash).precedence, operators::info_for(OperatorId::Plus).precedence);
//! ```

use super::registry::{Since, Stability};

/// Define how operators associate when chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
    None,
}

/// Define whether an operator is infix (binary), prefix (unary) or an assignment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Infix,
    Prefix,
    Assignment,
}

/// Stable identifier for every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    // Text
    Hash,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Assignment
    ColonEq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    HashEq,

    // Word operators
    And,
    Or,
    Not,
}

/// Precedence shared by all prefix operators (`-`, `+`, `not`).
pub const PREFIX_PRECEDENCE: u8 = 70;

/// Metadata for an operator.
///
/// ## Notes
/// - `precedence` is a relative ordering where higher binds tighter.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spelling: &'static str,
    pub precedence: u8,
    pub associativity: Associativity,
    pub fixity: Fixity,
    pub is_keyword_spelling: bool,
    pub since: Since,
    pub stability: Stability,
}

/// Registry of all operators.
pub const OPERATORS: &[OperatorInfo] = &[
    // Arithmetic
    op(OperatorId::Plus, "+", 40, Associativity::Left, Fixity::Infix),
    op(OperatorId::Minus, "-", 40, Associativity::Left, Fixity::Infix),
    op(OperatorId::Star, "*", 50, Associativity::Left, Fixity::Infix),
    op(OperatorId::Slash, "/", 50, Associativity::Left, Fixity::Infix),
    op(OperatorId::Percent, "%", 50, Associativity::Left, Fixity::Infix),
    op(OperatorId::StarStar, "**", 60, Associativity::Right, Fixity::Infix),
    op(OperatorId::Hash, "#", 40, Associativity::Left, Fixity::Infix),
    // Comparison
    op(OperatorId::EqEq, "==", 30, Associativity::None, Fixity::Infix),
    op(OperatorId::NotEq, "!=", 30, Associativity::None, Fixity::Infix),
    op(OperatorId::Lt, "<", 30, Associativity::None, Fixity::Infix),
    op(OperatorId::LtEq, "<=", 30, Associativity::None, Fixity::Infix),
    op(OperatorId::Gt, ">", 30, Associativity::None, Fixity::Infix),
    op(OperatorId::GtEq, ">=", 30, Associativity::None, Fixity::Infix),
    // Assignment
    op(OperatorId::ColonEq, ":=", 1, Associativity::Right, Fixity::Assignment),
    op(OperatorId::PlusEq, "+=", 1, Associativity::Right, Fixity::Assignment),
    op(OperatorId::MinusEq, "-=", 1, Associativity::Right, Fixity::Assignment),
    op(OperatorId::StarEq, "*=", 1, Associativity::Right, Fixity::Assignment),
    op(OperatorId::SlashEq, "/=", 1, Associativity::Right, Fixity::Assignment),
    op(OperatorId::PercentEq, "%=", 1, Associativity::Right, Fixity::Assignment),
    op(OperatorId::HashEq, "#=", 1, Associativity::Right, Fixity::Assignment),
    // Word operators
    word(OperatorId::Or, "or", 10, Fixity::Infix),
    word(OperatorId::And, "and", 20, Fixity::Infix),
    word(OperatorId::Not, "not", PREFIX_PRECEDENCE, Fixity::Prefix),
];

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    OPERATORS.iter().find(|o| o.id == id).expect("operator info missing")
}

/// Canonical spelling.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spelling
}

/// Lookup by spelling.
pub fn from_str(spelling: &str) -> Option<OperatorId> {
    OPERATORS.iter().find(|o| o.spelling == spelling).map(|o| o.id)
}

/// Binding power of a binary operator, or `None` for prefix/assignment operators.
pub fn binary_precedence(id: OperatorId) -> Option<(u8, Associativity)> {
    let info = info_for(id);
    (info.fixity == Fixity::Infix).then_some((info.precedence, info.associativity))
}

/// The arithmetic operator a compound assignment applies (`+=` applies `+`).
///
/// ## Returns
/// - `None` for plain `:=` and for non-assignment operators.
pub fn compound_base(id: OperatorId) -> Option<OperatorId> {
    match id {
        OperatorId::PlusEq => Some(OperatorId::Plus),
        OperatorId::MinusEq => Some(OperatorId::Minus),
        OperatorId::StarEq => Some(OperatorId::Star),
        OperatorId::SlashEq => Some(OperatorId::Slash),
        OperatorId::PercentEq => Some(OperatorId::Percent),
        OperatorId::HashEq => Some(OperatorId::Hash),
        _ => None,
    }
}

/// Return `true` for `==`, `!=`, `<`, `<=`, `>`, `>=`.
pub fn is_comparison(id: OperatorId) -> bool {
    matches!(
        id,
        OperatorId::EqEq | OperatorId::NotEq | OperatorId::Lt | OperatorId::LtEq | OperatorId::Gt | OperatorId::GtEq
    )
}

// --- helpers -----------------------------------------------------------------

const fn op(
    id: OperatorId,
    spelling: &'static str,
    precedence: u8,
    associativity: Associativity,
    fixity: Fixity,
) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        precedence,
        associativity,
        fixity,
        is_keyword_spelling: false,
        since: Since(0, 1),
        stability: Stability::Stable,
    }
}

const fn word(id: OperatorId, spelling: &'static str, precedence: u8, fixity: Fixity) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        precedence,
        associativity: Associativity::Left,
        fixity,
        is_keyword_spelling: true,
        since: Since(0, 1),
        stability: Stability::Stable,
    }
}
