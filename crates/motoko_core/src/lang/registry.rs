//! Shareable metadata for `motoko_core::lang` registries.
//!
//! The `motoko_core::lang` module is a set of **registry-first** vocabularies. This submodule provides the small,
//! dependency-free metadata types reused across all of them.
//!
//! ## Notes
//! - These types are `Copy` so registries can live in `const` tables.
//! - Metadata is meant for tooling/docs/diagnostics; enforcement of syntax rules still lives in the lexer/parser.

/// Identify the compiler release a vocabulary item is available since, as `(major, minor)`.
///
/// ## Examples
/// ```rust
/// use motoko_core::lang::registry::Since;
///
/// let since = Since(0, 11);
/// assert_eq!(since.to_string(), "0.11");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Since(pub u16, pub u16);

impl std::fmt::Display for Since {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

/// Describe the lifecycle status of a language vocabulary item.
///
/// ## Notes
/// - This is intended for docs/tooling (e.g. to flag deprecated spellings), not for feature-gating by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    Stable,
    /// Reserved by the language but not (yet) accepted by this frontend's grammar.
    Reserved,
    Deprecated,
}
