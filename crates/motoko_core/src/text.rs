//! Define shared text semantics (pure helpers).
//!
//! These helpers are used by the typechecker (literal checks), the interpreter (`Text.size()`, value printing) and
//! diagnostics (column computation), so all of them agree on one model.
//!
//! ## Notes
//! - **Length model**: Unicode scalar values (Rust `char`), not bytes or grapheme clusters.
//! - **Number display**: integers print with `_` every three digits (`1_000_000`), matching `debug_show`.

/// Count Unicode scalar values in `s`.
///
/// ## Examples
/// ```rust
/// assert_eq!(motoko_core::text::scalar_len("⛔×"), 2);
/// ```
pub fn scalar_len(s: &str) -> usize {
    if s.is_ascii() { s.len() } else { s.chars().count() }
}

/// Render `s` as a quoted Motoko text literal.
///
/// ## Examples
/// ```rust
/// assert_eq!(motoko_core::text::quote("a\"b\n"), "\"a\\\"b\\n\"");
/// ```
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        push_escaped(&mut out, c, '"');
    }
    out.push('"');
    out
}

/// Render `c` as a quoted Motoko character literal.
pub fn quote_char(c: char) -> String {
    let mut out = String::with_capacity(4);
    out.push('\'');
    push_escaped(&mut out, c, '\'');
    out.push('\'');
    out
}

fn push_escaped(out: &mut String, c: char, quote: char) {
    match c {
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        '\\' => out.push_str("\\\\"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
        c => out.push(c),
    }
}

/// Format an integer with `_` separators every three digits.
///
/// ## Examples
/// ```rust
/// assert_eq!(motoko_core::text::group_digits(1234567), "1_234_567");
/// assert_eq!(motoko_core::text::group_digits(-1000), "-1_000");
/// assert_eq!(motoko_core::text::group_digits(999), "999");
/// ```
pub fn group_digits(n: i128) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    let first = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - first) % 3 == 0 {
            out.push('_');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_len_counts_multibyte_once() {
        let s = "<⛔| ×10000>";
        assert_eq!(scalar_len(s), 11);
        assert_eq!(scalar_len("abc"), 3);
    }

    #[test]
    fn group_digits_boundaries() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(100), "100");
        assert_eq!(group_digits(1000), "1_000");
        assert_eq!(group_digits(100_000), "100_000");
        assert_eq!(group_digits(-12_345), "-12_345");
    }

    #[test]
    fn quote_escapes_controls() {
        assert_eq!(quote("tab\there"), "\"tab\\there\"");
        assert_eq!(quote_char('\''), "'\\''");
    }
}
