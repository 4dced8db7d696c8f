/// Token-stream helpers and error recovery.
///
/// This chunk contains the low-level primitives used throughout parsing:
/// - Peeking/consuming tokens (`peek`, `advance`)
/// - Matching / expecting keywords, operators, and punctuation
/// - Error construction in the `expected one of token or <phrase> sequence` shape
/// - Error recovery (`recover_with`, `synchronize`) and speculation (`snapshot`, `restore`)
impl<'a> Parser<'a> {
    // ========================================================================
    // Helpers
    // ========================================================================

    /// Return `true` if the current token is [`TokenKind::Eof`].
    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Return the current token without consuming it.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Return the token `n` positions ahead without consuming anything.
    fn peek_at(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    /// Advance to the next token and return the token we just consumed.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn check_keyword(&self, id: KeywordId) -> bool {
        self.peek().kind.is_keyword(id)
    }

    fn check_punct(&self, id: PunctuationId) -> bool {
        self.peek().kind.is_punctuation(id)
    }

    fn check_op(&self, id: OperatorId) -> bool {
        self.peek().kind.is_operator(id)
    }

    fn match_keyword(&mut self, id: KeywordId) -> bool {
        if self.check_keyword(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_punct(&mut self, id: PunctuationId) -> bool {
        if self.check_punct(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_op(&mut self, id: OperatorId) -> bool {
        if self.check_op(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the given punctuation or fail with an `expected` error naming it.
    fn expect_punct(&mut self, id: PunctuationId) -> Result<Span, CompileError> {
        if self.check_punct(id) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&[motoko_core::lang::punctuation::as_str(id)]))
        }
    }

    fn expect_keyword(&mut self, id: KeywordId) -> Result<Span, CompileError> {
        if self.check_keyword(id) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&[keywords::as_str(id)]))
        }
    }

    fn expect_op(&mut self, id: OperatorId) -> Result<Span, CompileError> {
        if self.check_op(id) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(&[operators::as_str(id)]))
        }
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end().max(start))
    }

    fn prev_is_punct(&self, id: PunctuationId) -> bool {
        self.pos > 0 && self.tokens[self.pos - 1].kind.is_punctuation(id)
    }

    // ========================================================================
    // Errors
    // ========================================================================

    /// Describe the current token for an error message.
    fn describe_current(&self) -> String {
        match &self.peek().kind {
            TokenKind::Eof => "unexpected end of input".to_string(),
            TokenKind::Error(message) => message.clone(),
            kind => format!("unexpected token '{kind}'"),
        }
    }

    /// Build a syntax error at the current token listing what was expected.
    fn unexpected(&self, expected: &[&str]) -> CompileError {
        let mut message = self.describe_current();
        if !matches!(self.peek().kind, TokenKind::Error(_)) && !expected.is_empty() {
            message.push_str(", expected one of token or <phrase> sequence:");
            for item in expected {
                message.push_str("\n  ");
                message.push_str(item);
            }
        }
        CompileError::syntax(message, self.current_span())
    }

    /// In recovering mode record `err` and return the placeholder; in strict mode fail with `err`.
    fn recover_with<T>(&mut self, err: CompileError, placeholder: T) -> Result<T, CompileError> {
        if !self.recover {
            return Err(err);
        }
        // Lexical error tokens are reported once, here; skip them so nothing reports them again.
        if matches!(self.peek().kind, TokenKind::Error(_)) {
            self.advance();
        }
        self.errors.push(err);
        Ok(placeholder)
    }

    /// Skip tokens until a plausible declaration boundary.
    ///
    /// ## Notes
    /// - Stops after a top-level `;`, before a declaration keyword, or before a `}` closing the current list
    ///   (`inside_braces`). Nested `{ ... }` groups are skipped whole.
    /// - Always consumes at least one token unless it stops at that closing `}` or at end of input, so callers
    ///   make progress.
    fn synchronize(&mut self, inside_braces: bool) {
        let mut depth = 0usize;
        let mut first = true;
        while !self.is_at_end() {
            let token = &self.peek().kind;
            if token.is_punctuation(PunctuationId::RBrace) {
                if depth == 0 {
                    if inside_braces {
                        return;
                    }
                    self.advance();
                    return;
                }
                depth -= 1;
            } else if token.is_punctuation(PunctuationId::LBrace) {
                depth += 1;
            } else if depth == 0 && token.is_punctuation(PunctuationId::Semicolon) {
                self.advance();
                return;
            } else if depth == 0 && !first && self.at_dec_keyword() {
                return;
            }
            self.advance();
            first = false;
        }
    }

    fn at_dec_keyword(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Keyword(
                KeywordId::Let
                    | KeywordId::Var
                    | KeywordId::Type
                    | KeywordId::Func
                    | KeywordId::Module
                    | KeywordId::Class
                    | KeywordId::Actor
                    | KeywordId::Object
                    | KeywordId::Import
                    | KeywordId::Public
                    | KeywordId::Private
                    | KeywordId::Persistent
                    | KeywordId::Shared
                    | KeywordId::Query
                    | KeywordId::System
                    | KeywordId::Stable
                    | KeywordId::Transient
                    | KeywordId::Flexible
            )
        )
    }

    /// Run `parse` one nesting level deeper.
    ///
    /// Past [`MAX_NESTING`] levels this fails with a syntax error at the current token instead of descending, so
    /// deeply nested input cannot exhaust the stack. The error unwinds to the enclosing declaration list, which
    /// recovers from it like any other syntax error.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, CompileError>) -> Result<T, CompileError> {
        if self.depth >= MAX_NESTING {
            return Err(CompileError::syntax(
                format!("nesting too deep, more than {MAX_NESTING} levels"),
                self.current_span(),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // ========================================================================
    // Speculation
    // ========================================================================

    fn snapshot(&self) -> (usize, usize, u32) {
        (self.pos, self.errors.len(), self.next_exp)
    }

    fn restore(&mut self, snapshot: (usize, usize, u32)) {
        self.pos = snapshot.0;
        self.errors.truncate(snapshot.1);
        self.next_exp = snapshot.2;
    }

    // ========================================================================
    // Node construction
    // ========================================================================

    fn mk_exp(&mut self, kind: ExpKind, span: Span) -> Exp {
        let id = ExpId(self.next_exp);
        self.next_exp += 1;
        Exp { id, kind, span }
    }

    /// Zero-width error expression at the current token.
    fn error_exp(&mut self) -> Exp {
        let at = self.current_span().start;
        self.mk_exp(ExpKind::Error, Span::new(at, at))
    }
}
