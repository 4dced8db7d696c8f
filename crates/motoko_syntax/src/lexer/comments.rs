//! Comment scanning.
//!
//! `//` and `/* */` (nestable) comments are skipped. `///` lines and `/** */` blocks are doc comments: their text is
//! buffered and attached to the next token. Consecutive `///` lines join with `\n`.

use super::Lexer;
use motoko_core::lang::operators::OperatorId;

impl<'a> Lexer<'a> {
    /// Scan after a `/`: a comment, `/=` or `/`.
    pub(super) fn scan_slash(&mut self, start: usize) {
        if self.match_char('/') {
            let is_doc = self.peek() == Some('/') && self.peek_next() != Some('/');
            if is_doc {
                self.advance();
            }
            let body_start = self.current_pos;
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
            if is_doc {
                let line = &self.source[body_start..self.current_pos];
                let line = line.strip_prefix(' ').unwrap_or(line).trim_end();
                self.push_doc(line.to_string());
            }
        } else if self.match_char('*') {
            let is_doc = self.peek() == Some('*') && self.peek_next() != Some('/');
            let body_start = self.current_pos + usize::from(is_doc);
            match self.skip_block_comment() {
                Some(body_end) if is_doc => {
                    let text = self.source[body_start..body_end].trim().to_string();
                    self.push_doc(text);
                }
                Some(_) => {}
                None => self.add_error("unclosed comment".to_string(), start),
            }
        } else if self.match_char('=') {
            self.add_op(OperatorId::SlashEq, start);
        } else {
            self.add_op(OperatorId::Slash, start);
        }
    }

    /// Skip a (possibly nested) block comment whose opening `/*` was consumed.
    ///
    /// ## Returns
    /// - The byte offset of the closing `*/`, or `None` at end of input.
    fn skip_block_comment(&mut self) -> Option<usize> {
        let mut depth = 1usize;
        loop {
            let pos = self.current_pos;
            match self.advance()? {
                '*' if self.peek() == Some('/') => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Some(pos);
                    }
                }
                '/' if self.peek() == Some('*') => {
                    self.advance();
                    depth += 1;
                }
                _ => {}
            }
        }
    }

    fn push_doc(&mut self, text: String) {
        match &mut self.pending_doc {
            Some(doc) => {
                doc.push('\n');
                doc.push_str(&text);
            }
            None => self.pending_doc = Some(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::lex;

    #[test]
    fn line_doc_comments_join_and_strip_marker() {
        let tokens = lex("/// first\n/// second\n// plain\ntype T = Nat;");
        assert_eq!(tokens[0].doc.as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn block_doc_comment_keeps_inner_newlines() {
        let tokens = lex("/** Program comment\n      multi-line */\nimport P \"mo:prim\"");
        assert_eq!(tokens[0].doc.as_deref(), Some("Program comment\n      multi-line"));
    }

    #[test]
    fn nested_block_comments_are_skipped() {
        let tokens = lex("/* a /* b */ c */ x");
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].doc.is_none());
    }

    #[test]
    fn trailing_doc_attaches_to_eof() {
        let tokens = lex("/// only a comment");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].doc.as_deref(), Some("only a comment"));
    }
}
