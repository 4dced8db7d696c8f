//! Lexer for Motoko.
//!
//! Handles tokenization including:
//! - Keywords, identifiers and the `_` wildcard
//! - Numeric (decimal, hex, float), text and character literals
//! - Operators and punctuation
//! - Line, nested block and doc comments
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token)
//! - `strings` - Text/character literal scanning
//! - `numbers` - Numeric literal scanning
//! - `comments` - Comment skipping and doc comment capture
//!
//! ## Notes
//! - The lexer never fails: malformed input produces [`TokenKind::Error`] tokens and scanning continues.
//! - Every character is visited once, so very long literals lex in linear time.

mod comments;
mod numbers;
mod strings;
pub mod tokens;

pub use tokens::{Token, TokenKind, keyword_id};

use crate::ast::Span;
use motoko_core::lang::operators::OperatorId;
use motoko_core::lang::punctuation::PunctuationId;

/// Lexer for Motoko source code.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    tokens: Vec<Token>,
    /// Doc comment text waiting to be attached to the next token.
    pending_doc: Option<String>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            tokens: Vec::new(),
            pending_doc: None,
        }
    }

    /// Tokenize the entire source code.
    ///
    /// The token stream always ends with an `Eof` token, which carries any trailing doc comment.
    pub fn tokenize(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.scan_token();
        }
        let end = self.source.len();
        self.add_token(TokenKind::Eof, end);
        self.tokens
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) {
        let start = self.current_pos;
        let Some(c) = self.advance() else {
            return;
        };

        match c {
            ' ' | '\t' | '\r' | '\n' => {}

            '/' => self.scan_slash(start),

            '+' => self.operator(start, OperatorId::Plus, &[('=', OperatorId::PlusEq)]),
            '-' => {
                if self.match_char('>') {
                    self.add_punct(PunctuationId::Arrow, start);
                } else if self.match_char('=') {
                    self.add_op(OperatorId::MinusEq, start);
                } else {
                    self.add_op(OperatorId::Minus, start);
                }
            }
            '*' => self.operator(
                start,
                OperatorId::Star,
                &[('*', OperatorId::StarStar), ('=', OperatorId::StarEq)],
            ),
            '%' => self.operator(start, OperatorId::Percent, &[('=', OperatorId::PercentEq)]),
            '#' => self.operator(start, OperatorId::Hash, &[('=', OperatorId::HashEq)]),
            '<' => self.operator(start, OperatorId::Lt, &[('=', OperatorId::LtEq)]),
            '>' => self.operator(start, OperatorId::Gt, &[('=', OperatorId::GtEq)]),
            '=' => {
                if self.match_char('=') {
                    self.add_op(OperatorId::EqEq, start);
                } else {
                    self.add_punct(PunctuationId::Eq, start);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_op(OperatorId::NotEq, start);
                } else {
                    self.add_error("unexpected character '!'".to_string(), start);
                }
            }
            ':' => {
                if self.match_char('=') {
                    self.add_op(OperatorId::ColonEq, start);
                } else {
                    self.add_punct(PunctuationId::Colon, start);
                }
            }
            ';' => self.add_punct(PunctuationId::Semicolon, start),
            ',' => self.add_punct(PunctuationId::Comma, start),
            '.' => self.add_punct(PunctuationId::Dot, start),
            '?' => self.add_punct(PunctuationId::Question, start),
            '(' => self.add_punct(PunctuationId::LParen, start),
            ')' => self.add_punct(PunctuationId::RParen, start),
            '[' => self.add_punct(PunctuationId::LBracket, start),
            ']' => self.add_punct(PunctuationId::RBracket, start),
            '{' => self.add_punct(PunctuationId::LBrace, start),
            '}' => self.add_punct(PunctuationId::RBrace, start),

            '"' => self.scan_text(start),
            '\'' => self.scan_char(start),

            '0'..='9' => self.scan_number(start, c),

            _ if is_ident_start(c) => self.scan_identifier(start),

            _ => self.add_error(format!("unexpected character '{}'", c.escape_default()), start),
        }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn add_token(&mut self, kind: TokenKind, start: usize) {
        let mut token = Token::new(kind, Span::new(start, self.current_pos));
        token.doc = self.pending_doc.take();
        self.tokens.push(token);
    }

    fn add_op(&mut self, id: OperatorId, start: usize) {
        self.add_token(TokenKind::Operator(id), start);
    }

    fn add_punct(&mut self, id: PunctuationId, start: usize) {
        self.add_token(TokenKind::Punctuation(id), start);
    }

    fn add_error(&mut self, message: String, start: usize) {
        self.add_token(TokenKind::Error(message), start);
    }

    /// Try to match a compound operator, falling back to the simple one.
    fn operator(&mut self, start: usize, simple: OperatorId, compounds: &[(char, OperatorId)]) {
        for (c, id) in compounds {
            if self.match_char(*c) {
                self.add_op(*id, start);
                return;
            }
        }
        self.add_op(simple, start);
    }

    fn scan_identifier(&mut self, start: usize) {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.current_pos];
        let kind = if text == "_" {
            TokenKind::Punctuation(PunctuationId::Underscore)
        } else if let Some(id) = keyword_id(text) {
            TokenKind::Keyword(id)
        } else {
            TokenKind::Ident(text.to_string())
        };
        self.add_token(kind, start);
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize `source`. Lexical errors are embedded as [`TokenKind::Error`] tokens.
#[tracing::instrument(skip_all, fields(len = source.len()))]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use motoko_core::lang::keywords::KeywordId;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_operators_and_punctuation() {
        assert_eq!(
            kinds("x := a # b -> c;"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Operator(OperatorId::ColonEq),
                TokenKind::Ident("a".into()),
                TokenKind::Operator(OperatorId::Hash),
                TokenKind::Ident("b".into()),
                TokenKind::Punctuation(PunctuationId::Arrow),
                TokenKind::Ident("c".into()),
                TokenKind::Punctuation(PunctuationId::Semicolon),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_wildcard_and_identifiers() {
        assert_eq!(
            kinds("persistent actor _ _x"),
            vec![
                TokenKind::Keyword(KeywordId::Persistent),
                TokenKind::Keyword(KeywordId::Actor),
                TokenKind::Punctuation(PunctuationId::Underscore),
                TokenKind::Ident("_x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unknown_character_becomes_error_token() {
        let tokens = lex("a $ b");
        assert!(matches!(tokens[1].kind, TokenKind::Error(_)));
        assert_eq!(tokens[1].span, Span::new(2, 3));
        assert_eq!(tokens.len(), 4);
    }
}
