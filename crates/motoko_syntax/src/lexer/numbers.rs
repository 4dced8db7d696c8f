//! Numeric literal scanning.
//!
//! Natural literals keep decimal digits only (`_` separators removed, hex converted). A `.` followed by a digit, or
//! an exponent, makes a float. `t.0` stays a projection because the lexer only enters the fraction when a digit
//! follows the dot.

use super::{Lexer, TokenKind};

impl<'a> Lexer<'a> {
    pub(super) fn scan_number(&mut self, start: usize, first: char) {
        if first == '0' && matches!(self.peek(), Some('x') | Some('X')) {
            self.advance();
            self.scan_hex(start);
            return;
        }

        let mut digits = String::new();
        digits.push(first);
        self.take_digits(&mut digits);

        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            digits.push('.');
            self.take_digits(&mut digits);
            is_float = true;
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let after = self.peek_next();
            if after.is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-') {
                self.advance();
                digits.push('e');
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    self.advance();
                    digits.push(sign);
                }
                self.take_digits(&mut digits);
                is_float = true;
            }
        }

        let kind = if is_float {
            TokenKind::Float(digits)
        } else {
            TokenKind::Nat(digits)
        };
        self.add_token(kind, start);
    }

    fn take_digits(&mut self, out: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                out.push(c);
                self.advance();
            } else if c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_hex(&mut self, start: usize) {
        let mut value: Option<u128> = Some(0);
        let mut any = false;
        while let Some(c) = self.peek() {
            if let Some(d) = c.to_digit(16) {
                self.advance();
                any = true;
                value = value.and_then(|v| v.checked_mul(16)).and_then(|v| v.checked_add(u128::from(d)));
            } else if c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        match value {
            Some(v) if any => self.add_token(TokenKind::Nat(v.to_string()), start),
            Some(_) => self.add_error("malformed hexadecimal literal".to_string(), start),
            None => self.add_error("hexadecimal literal out of range".to_string(), start),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::{TokenKind, lex};

    #[test]
    fn numbers() {
        assert_eq!(lex("1_000")[0].kind, TokenKind::Nat("1000".into()));
        assert_eq!(lex("0xff")[0].kind, TokenKind::Nat("255".into()));
        assert_eq!(lex("1.5")[0].kind, TokenKind::Float("1.5".into()));
        assert_eq!(lex("2e3")[0].kind, TokenKind::Float("2e3".into()));
    }

    #[test]
    fn projection_is_not_a_float() {
        let kinds: Vec<_> = lex("t.0").into_iter().map(|t| t.kind).collect();
        assert_eq!(kinds.len(), 4);
        assert_eq!(kinds[2], TokenKind::Nat("0".into()));
    }
}
