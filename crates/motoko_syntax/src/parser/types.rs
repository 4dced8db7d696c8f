/// Type parsing.
///
/// ## Notes
/// - `A -> B` and `(A, B) -> C` are function types; a parenthesized list before `->` becomes the parameter list.
/// - A parenthesized single unnamed type is grouping, not a one-element tuple.
/// - `<` after a type path always opens type arguments.
impl<'a> Parser<'a> {
    fn typ(&mut self) -> Result<Typ, CompileError> {
        self.nested(Self::typ_func)
    }

    /// A type, possibly a function type `sort <binds> lhs -> ret`.
    fn typ_func(&mut self) -> Result<Typ, CompileError> {
        let start = self.current_span().start;
        let sort = if self.check_keyword(KeywordId::Shared) || self.check_keyword(KeywordId::Query) {
            Some(self.func_sort())
        } else {
            None
        };
        let type_params = self.type_binds()?;

        let lhs = self.typ_pre()?;
        if self.match_punct(PunctuationId::Arrow) {
            let ret = self.typ()?;
            return Ok(Typ {
                kind: TypKind::Func {
                    sort: sort.unwrap_or(FuncSort::Local),
                    type_params,
                    params: params_from(lhs),
                    ret: Box::new(ret),
                },
                span: self.span_from(start),
            });
        }
        if sort.is_some() || !type_params.is_empty() {
            return Err(self.unexpected(&["->"]));
        }
        Ok(lhs)
    }

    fn typ_pre(&mut self) -> Result<Typ, CompileError> {
        let start = self.current_span().start;
        if self.match_keyword(KeywordId::Async) {
            let inner = self.nested(Self::typ_pre)?;
            return Ok(Typ {
                kind: TypKind::Async(Box::new(inner)),
                span: self.span_from(start),
            });
        }
        if self.match_punct(PunctuationId::Question) {
            let inner = self.nested(Self::typ_pre)?;
            return Ok(Typ {
                kind: TypKind::Opt(Box::new(inner)),
                span: self.span_from(start),
            });
        }
        self.typ_nullary()
    }

    fn typ_nullary(&mut self) -> Result<Typ, CompileError> {
        let start = self.current_span().start;
        let kind = match &self.peek().kind {
            TokenKind::Ident(_) => {
                let mut path = vec![self.identifier_spanned()?];
                while self.check_punct(PunctuationId::Dot) && matches!(self.peek_at(1).kind, TokenKind::Ident(_)) {
                    self.advance();
                    path.push(self.identifier_spanned()?);
                }
                let args = self.typ_args()?;
                TypKind::Path { path, args }
            }
            TokenKind::Punctuation(PunctuationId::LParen) => {
                self.advance();
                let mut items = Vec::new();
                while !self.check_punct(PunctuationId::RParen) {
                    let name = if matches!(self.peek().kind, TokenKind::Ident(_))
                        && self.peek_at(1).kind.is_punctuation(PunctuationId::Colon)
                    {
                        let name = self.identifier()?;
                        self.advance();
                        Some(name)
                    } else {
                        None
                    };
                    let ty = self.typ()?;
                    items.push(TypItem { name, ty });
                    if !self.match_punct(PunctuationId::Comma) {
                        break;
                    }
                }
                self.expect_punct(PunctuationId::RParen)?;
                if items.len() == 1 && items[0].name.is_none() {
                    let mut inner = items.remove(0).ty;
                    inner.span = self.span_from(start);
                    return Ok(inner);
                }
                TypKind::Tuple(items)
            }
            TokenKind::Punctuation(PunctuationId::LBracket) => {
                self.advance();
                let mutable = self.match_keyword(KeywordId::Var);
                let elem = self.typ()?;
                self.expect_punct(PunctuationId::RBracket)?;
                TypKind::Array {
                    mutable,
                    elem: Box::new(elem),
                }
            }
            TokenKind::Punctuation(PunctuationId::LBrace) => TypKind::Record(self.typ_fields()?),
            TokenKind::Keyword(KeywordId::Object) => {
                self.advance();
                TypKind::Obj(ObjSort::Object, self.typ_fields()?)
            }
            TokenKind::Keyword(KeywordId::Module) => {
                self.advance();
                TypKind::Obj(ObjSort::Module, self.typ_fields()?)
            }
            TokenKind::Keyword(KeywordId::Actor) => {
                self.advance();
                TypKind::Obj(ObjSort::Actor, self.typ_fields()?)
            }
            _ => {
                let err = self.unexpected(&["<typ_nullary>"]);
                let at = self.current_span().start;
                return self.recover_with(
                    err,
                    Typ {
                        kind: TypKind::Error,
                        span: Span::new(at, at),
                    },
                );
            }
        };
        Ok(Typ {
            kind,
            span: self.span_from(start),
        })
    }

    /// Parse optional `<T, U>` type arguments.
    fn typ_args(&mut self) -> Result<Vec<Typ>, CompileError> {
        let mut args = Vec::new();
        if !self.match_op(OperatorId::Lt) {
            return Ok(args);
        }
        while !self.check_op(OperatorId::Gt) {
            args.push(self.typ()?);
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_op(OperatorId::Gt)?;
        Ok(args)
    }

    /// Parse `{ var? name : T; ... }`.
    fn typ_fields(&mut self) -> Result<Vec<TypField>, CompileError> {
        self.expect_punct(PunctuationId::LBrace)?;
        let mut fields = Vec::new();
        loop {
            while self.match_punct(PunctuationId::Semicolon) {}
            if self.check_punct(PunctuationId::RBrace) {
                break;
            }
            let mutable = self.match_keyword(KeywordId::Var);
            let name = self.identifier_spanned()?;
            self.expect_punct(PunctuationId::Colon)?;
            let ty = self.typ()?;
            fields.push(TypField { mutable, name, ty });
            if !self.check_punct(PunctuationId::RBrace) {
                self.expect_punct(PunctuationId::Semicolon)?;
            }
        }
        self.expect_punct(PunctuationId::RBrace)?;
        Ok(fields)
    }

    /// Parse optional `<T, U <: Bound>` type parameters.
    fn type_binds(&mut self) -> Result<Vec<TypeBind>, CompileError> {
        let mut binds = Vec::new();
        if !self.match_op(OperatorId::Lt) {
            return Ok(binds);
        }
        while !self.check_op(OperatorId::Gt) {
            let name = self.identifier_spanned()?;
            let bound = if self.check_op(OperatorId::Lt) && self.peek_at(1).kind.is_punctuation(PunctuationId::Colon) {
                self.advance();
                self.advance();
                Some(self.typ()?)
            } else {
                None
            };
            binds.push(TypeBind { name, bound });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_op(OperatorId::Gt)?;
        Ok(binds)
    }
}

/// Parameter list of a function type from the type left of `->`.
fn params_from(lhs: Typ) -> Vec<TypItem> {
    match lhs.kind {
        TypKind::Tuple(items) => items,
        _ => vec![TypItem { name: None, ty: lhs }],
    }
}
