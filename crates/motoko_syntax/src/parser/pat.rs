/// Pattern parsing.
impl<'a> Parser<'a> {
    /// Parse a pattern with an optional `: T` annotation.
    fn pattern(&mut self) -> Result<Pat, CompileError> {
        self.nested(Self::annotated_pattern)
    }

    fn annotated_pattern(&mut self) -> Result<Pat, CompileError> {
        let start = self.current_span().start;
        let pat = self.pat_un()?;
        if self.match_punct(PunctuationId::Colon) {
            let ty = self.typ()?;
            return Ok(Pat {
                kind: PatKind::Annot(Box::new(pat), ty),
                span: self.span_from(start),
            });
        }
        Ok(pat)
    }

    fn pat_un(&mut self) -> Result<Pat, CompileError> {
        let start = self.current_span().start;
        if self.match_punct(PunctuationId::Question) {
            let inner = self.nested(Self::pat_un)?;
            return Ok(Pat {
                kind: PatKind::Opt(Box::new(inner)),
                span: self.span_from(start),
            });
        }
        if self.check_op(OperatorId::Minus) && matches!(self.peek_at(1).kind, TokenKind::Nat(_) | TokenKind::Float(_)) {
            self.advance();
            let lit = match self.advance().kind.clone() {
                TokenKind::Nat(digits) => Lit::Nat(format!("-{digits}")),
                TokenKind::Float(digits) => Lit::Float(format!("-{digits}")),
                _ => Lit::Null,
            };
            return Ok(Pat {
                kind: PatKind::Lit(lit),
                span: self.span_from(start),
            });
        }
        self.pat_nullary()
    }

    fn pat_nullary(&mut self) -> Result<Pat, CompileError> {
        let start = self.current_span().start;
        let kind = match &self.peek().kind {
            TokenKind::Punctuation(PunctuationId::Underscore) => {
                self.advance();
                PatKind::Wild
            }
            TokenKind::Ident(_) => PatKind::Var(self.identifier()?),
            TokenKind::Punctuation(PunctuationId::LParen) => {
                self.advance();
                let mut pats = Vec::new();
                let mut trailing_comma = false;
                while !self.check_punct(PunctuationId::RParen) {
                    pats.push(self.pattern()?);
                    trailing_comma = self.match_punct(PunctuationId::Comma);
                    if !trailing_comma {
                        break;
                    }
                }
                self.expect_punct(PunctuationId::RParen)?;
                if pats.len() == 1 && !trailing_comma {
                    let mut inner = pats.remove(0);
                    inner.span = self.span_from(start);
                    return Ok(inner);
                }
                PatKind::Tuple(pats)
            }
            _ => match self.literal() {
                Some(lit) => PatKind::Lit(lit),
                None => {
                    let err = self.unexpected(&["<pat_nullary>"]);
                    let at = self.current_span().start;
                    return self.recover_with(
                        err,
                        Pat {
                            kind: PatKind::Error,
                            span: Span::new(at, at),
                        },
                    );
                }
            },
        };
        Ok(Pat {
            kind,
            span: self.span_from(start),
        })
    }
}
