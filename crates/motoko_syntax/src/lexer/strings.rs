//! Text and character literal scanning.
//!
//! Literal content is decoded in a single pass into one buffer; the resulting `Arc<str>` is shared by the AST, the
//! syntax tree and the interpreter without further copies.

use std::sync::Arc;

use super::{Lexer, TokenKind};

impl<'a> Lexer<'a> {
    /// Scan a text literal whose opening `"` was consumed.
    pub(super) fn scan_text(&mut self, start: usize) {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    self.add_error("unclosed text literal".to_string(), start);
                    return;
                }
                Some('"') => break,
                Some('\\') => match self.scan_escape() {
                    Ok(c) => value.push(c),
                    Err(message) => {
                        self.skip_to_quote('"');
                        self.add_error(message, start);
                        return;
                    }
                },
                Some(c) => value.push(c),
            }
        }
        self.add_token(TokenKind::Text(Arc::from(value)), start);
    }

    /// Scan a character literal whose opening `'` was consumed.
    pub(super) fn scan_char(&mut self, start: usize) {
        let value = match self.advance() {
            None | Some('\n') => {
                self.add_error("unclosed character literal".to_string(), start);
                return;
            }
            Some('\\') => self.scan_escape(),
            Some('\'') => Err("empty character literal".to_string()),
            Some(c) => Ok(c),
        };
        match value {
            Ok(c) if self.match_char('\'') => self.add_token(TokenKind::Char(c), start),
            Ok(_) => {
                self.skip_to_quote('\'');
                self.add_error("character literal must contain exactly one character".to_string(), start);
            }
            Err(message) => {
                self.skip_to_quote('\'');
                self.add_error(message, start);
            }
        }
    }

    /// Decode the escape sequence after a consumed `\`.
    fn scan_escape(&mut self) -> Result<char, String> {
        match self.advance() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('\\') => Ok('\\'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some('u') => {
                if !self.match_char('{') {
                    return Err("malformed unicode escape, expected '{'".to_string());
                }
                let mut code = 0u32;
                let mut digits = 0;
                while let Some(c) = self.peek() {
                    if c == '}' {
                        break;
                    }
                    let Some(d) = c.to_digit(16) else {
                        return Err(format!("invalid hex digit '{c}' in unicode escape"));
                    };
                    self.advance();
                    digits += 1;
                    code = code.saturating_mul(16).saturating_add(d);
                }
                if !self.match_char('}') || digits == 0 {
                    return Err("malformed unicode escape".to_string());
                }
                char::from_u32(code).ok_or_else(|| format!("unicode escape {code:x} is not a scalar value"))
            }
            Some(c) => Err(format!("unknown escape sequence '\\{}'", c.escape_default())),
            None => Err("unclosed text literal".to_string()),
        }
    }

    /// After a malformed literal, skip to its closing quote on the same line (if any) to limit follow-up errors.
    fn skip_to_quote(&mut self, quote: char) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                return;
            }
            self.advance();
            if c == quote {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::{TokenKind, lex};

    #[test]
    fn escapes_decode() {
        let tokens = lex(r#""a\n\u{41}\"""#);
        assert_eq!(tokens[0].kind, TokenKind::Text("a\nA\"".into()));
    }

    #[test]
    fn long_multibyte_literal_is_one_token() {
        let body = "<⛔| ×10000>".repeat(10_000);
        let source = format!("let s = \"{body}\"; s.size()");
        let tokens = lex(&source);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Text(body.as_str().into())));
        assert!(!tokens.iter().any(|t| matches!(t.kind, TokenKind::Error(_))));
    }

    #[test]
    fn unclosed_text_reports_error() {
        let tokens = lex("\"abc");
        assert!(matches!(&tokens[0].kind, TokenKind::Error(m) if m == "unclosed text literal"));
    }

    #[test]
    fn char_literals() {
        assert_eq!(lex("'x'")[0].kind, TokenKind::Char('x'));
        assert_eq!(lex(r"'\''")[0].kind, TokenKind::Char('\''));
        assert!(matches!(lex("'ab'")[0].kind, TokenKind::Error(_)));
    }
}
