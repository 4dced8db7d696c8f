/// Identifier and literal helpers.
impl<'a> Parser<'a> {
    fn identifier(&mut self) -> Result<Ident, CompileError> {
        Ok(self.identifier_spanned()?.node)
    }

    fn identifier_spanned(&mut self) -> Result<Spanned<Ident>, CompileError> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            let span = self.advance().span;
            Ok(Spanned::new(name, span))
        } else {
            Err(self.unexpected(&["<id>"]))
        }
    }

    /// Consume an identifier if one is next.
    fn optional_identifier(&mut self) -> Option<Spanned<Ident>> {
        if matches!(self.peek().kind, TokenKind::Ident(_)) {
            self.identifier_spanned().ok()
        } else {
            None
        }
    }

    fn text_literal_spanned(&mut self) -> Result<Spanned<String>, CompileError> {
        if let TokenKind::Text(text) = &self.peek().kind {
            let text = text.to_string();
            let span = self.advance().span;
            Ok(Spanned::new(text, span))
        } else {
            Err(self.unexpected(&["<text>"]))
        }
    }

    /// Consume a literal token, if the current token is one.
    fn literal(&mut self) -> Option<Lit> {
        let lit = match &self.peek().kind {
            TokenKind::Nat(digits) => Lit::Nat(digits.clone()),
            TokenKind::Float(digits) => Lit::Float(digits.clone()),
            TokenKind::Text(text) => Lit::Text(Arc::clone(text)),
            TokenKind::Char(c) => Lit::Char(*c),
            TokenKind::Keyword(KeywordId::True) => Lit::Bool(true),
            TokenKind::Keyword(KeywordId::False) => Lit::Bool(false),
            TokenKind::Keyword(KeywordId::Null) => Lit::Null,
            _ => return None,
        };
        self.advance();
        Some(lit)
    }
}
