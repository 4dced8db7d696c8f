/// Declaration parsing.
///
/// This chunk parses declaration lists (programs, blocks, object/module/actor/class bodies) and every declaration
/// form: `let`, `var`, `type`, `func`, `module`, `class`, `object`, `actor`, `persistent actor`, `actor class` and
/// `import`. Anything else in declaration position is an expression declaration.
///
/// ## Notes
/// - Declarations are separated by `;`. The separator may be omitted after a declaration ending in `}`.
/// - Recovery happens per declaration: a failed declaration becomes `Dec::Error` and the parser resynchronizes.
impl<'a> Parser<'a> {
    // ========================================================================
    // Declaration lists
    // ========================================================================

    /// Parse declarations until end of input or (when `inside_braces`) a closing `}`, which is not consumed.
    fn dec_list(&mut self, inside_braces: bool) -> Result<Vec<DecField>, CompileError> {
        let mut decs = Vec::new();
        loop {
            while self.match_punct(PunctuationId::Semicolon) {}
            if self.is_at_end() || (inside_braces && self.check_punct(PunctuationId::RBrace)) {
                break;
            }

            let start_pos = self.pos;
            let start = self.current_span().start;
            match self.dec_field() {
                Ok(field) => {
                    let progressed = self.pos > start_pos;
                    decs.push(field);
                    if !progressed {
                        // The declaration was a recovered placeholder that consumed nothing; its error is recorded.
                        self.synchronize(inside_braces);
                    } else if !self.dec_separator(inside_braces) {
                        let err = self.unexpected(&[";"]);
                        if !self.recover {
                            return Err(err);
                        }
                        self.errors.push(err);
                        self.synchronize(inside_braces);
                    }
                }
                Err(err) => {
                    if !self.recover {
                        return Err(err);
                    }
                    self.errors.push(err);
                    self.synchronize(inside_braces);
                    decs.push(DecField {
                        doc: None,
                        vis: Visibility::Private,
                        stability: None,
                        dec: Spanned::new(Dec::Error, self.span_from(start)),
                    });
                }
            }
        }
        Ok(decs)
    }

    /// Consume a declaration separator if one is required and present.
    fn dec_separator(&mut self, inside_braces: bool) -> bool {
        self.match_punct(PunctuationId::Semicolon)
            || self.is_at_end()
            || (inside_braces && self.check_punct(PunctuationId::RBrace))
            || self.prev_is_punct(PunctuationId::RBrace)
    }

    /// Parse `{ dec_field;* }` and return the fields.
    fn braced_fields(&mut self) -> Result<Vec<DecField>, CompileError> {
        self.expect_punct(PunctuationId::LBrace)?;
        let fields = self.nested(|p| p.dec_list(true))?;
        self.expect_punct(PunctuationId::RBrace)?;
        Ok(fields)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn dec_field(&mut self) -> Result<DecField, CompileError> {
        let doc = self.peek().doc.clone();
        let vis = if self.match_keyword(KeywordId::Public) {
            Visibility::Public
        } else if self.match_keyword(KeywordId::Private) {
            Visibility::Private
        } else if self.match_keyword(KeywordId::System) {
            Visibility::System
        } else {
            Visibility::Private
        };
        let stability = if self.match_keyword(KeywordId::Stable) {
            Some(StableMod::Stable)
        } else if self.match_keyword(KeywordId::Transient) {
            Some(StableMod::Transient)
        } else if self.match_keyword(KeywordId::Flexible) {
            Some(StableMod::Flexible)
        } else {
            None
        };
        let dec = self.dec()?;
        Ok(DecField {
            doc,
            vis,
            stability,
            dec,
        })
    }

    fn dec(&mut self) -> Result<Spanned<Dec>, CompileError> {
        let start = self.current_span().start;
        let dec = match self.peek().kind {
            TokenKind::Keyword(KeywordId::Let) => self.let_dec()?,
            TokenKind::Keyword(KeywordId::Var) => self.var_dec()?,
            TokenKind::Keyword(KeywordId::Type) => self.type_dec()?,
            TokenKind::Keyword(KeywordId::Func) if matches!(self.peek_at(1).kind, TokenKind::Ident(_)) => {
                self.advance();
                self.func_dec(FuncSort::Local)?
            }
            TokenKind::Keyword(KeywordId::Shared) | TokenKind::Keyword(KeywordId::Query) => {
                let sort = self.func_sort();
                self.expect_keyword(KeywordId::Func)?;
                self.func_dec(sort)?
            }
            TokenKind::Keyword(KeywordId::Module) => {
                self.advance();
                let name = self.optional_identifier();
                let fields = self.braced_fields()?;
                Dec::Module(ModuleDec { name, fields })
            }
            TokenKind::Keyword(KeywordId::Class) => {
                self.advance();
                self.class_dec(ObjSort::Object, false)?
            }
            TokenKind::Keyword(KeywordId::Object) => {
                self.advance();
                self.object_dec(ObjSort::Object, false)?
            }
            TokenKind::Keyword(KeywordId::Actor) => {
                self.advance();
                self.actor_dec(false)?
            }
            TokenKind::Keyword(KeywordId::Persistent) => {
                self.advance();
                self.expect_keyword(KeywordId::Actor)?;
                self.actor_dec(true)?
            }
            TokenKind::Keyword(KeywordId::Import) => self.import_dec()?,
            TokenKind::Keyword(id) if !keywords::is_supported(id) => {
                return Err(self.unexpected(&[]));
            }
            _ => Dec::Exp(self.expression()?),
        };
        Ok(Spanned::new(dec, self.span_from(start)))
    }

    /// Parse `shared`, `query` or `shared query` (the caller checked one is present).
    fn func_sort(&mut self) -> FuncSort {
        if self.match_keyword(KeywordId::Query) {
            return FuncSort::Query;
        }
        self.match_keyword(KeywordId::Shared);
        if self.match_keyword(KeywordId::Query) {
            FuncSort::Query
        } else {
            FuncSort::Shared
        }
    }

    fn let_dec(&mut self) -> Result<Dec, CompileError> {
        self.advance();
        let pat = self.pattern()?;
        self.expect_punct(PunctuationId::Eq)?;
        let exp = self.expression()?;
        Ok(Dec::Let(LetDec { pat, exp }))
    }

    fn var_dec(&mut self) -> Result<Dec, CompileError> {
        self.advance();
        let name = self.identifier_spanned()?;
        let ty = if self.match_punct(PunctuationId::Colon) {
            Some(self.typ()?)
        } else {
            None
        };
        self.expect_punct(PunctuationId::Eq)?;
        let exp = self.expression()?;
        Ok(Dec::Var(VarDec { name, ty, exp }))
    }

    fn type_dec(&mut self) -> Result<Dec, CompileError> {
        self.advance();
        let name = self.identifier_spanned()?;
        let params = self.type_binds()?;
        self.expect_punct(PunctuationId::Eq)?;
        let ty = self.typ()?;
        Ok(Dec::Type(TypeDec { name, params, ty }))
    }

    /// Parse the rest of `func name<T>(params) : ret body` after the `func` keyword.
    fn func_dec(&mut self, sort: FuncSort) -> Result<Dec, CompileError> {
        let name = self.identifier_spanned()?;
        let func = self.func_rest(sort)?;
        Ok(Dec::Func(FuncDec { name, func }))
    }

    /// Parse `<T>(params) : ret body`, shared by named and anonymous functions.
    fn func_rest(&mut self, sort: FuncSort) -> Result<FuncLit, CompileError> {
        let type_params = self.type_binds()?;
        let params = self.params()?;
        let ret = if self.match_punct(PunctuationId::Colon) {
            Some(self.typ()?)
        } else {
            None
        };
        let body = self.func_body()?;
        Ok(FuncLit {
            sort,
            type_params,
            params,
            ret,
            body: Box::new(body),
        })
    }

    fn func_body(&mut self) -> Result<Exp, CompileError> {
        if self.check_punct(PunctuationId::LBrace) {
            self.block_exp()
        } else if self.match_punct(PunctuationId::Eq) {
            self.expression()
        } else {
            Err(self.unexpected(&["{", "="]))
        }
    }

    fn params(&mut self) -> Result<Vec<Param>, CompileError> {
        self.expect_punct(PunctuationId::LParen)?;
        let mut params = Vec::new();
        if self.match_punct(PunctuationId::RParen) {
            return Ok(params);
        }
        loop {
            let name = if self.check_punct(PunctuationId::Underscore) {
                let span = self.advance().span;
                Spanned::new("_".to_string(), span)
            } else {
                self.identifier_spanned()?
            };
            self.expect_punct(PunctuationId::Colon)?;
            let ty = self.typ()?;
            params.push(Param { name, ty });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RParen)?;
        Ok(params)
    }

    fn class_dec(&mut self, sort: ObjSort, persistent: bool) -> Result<Dec, CompileError> {
        let name = self.identifier_spanned()?;
        let type_params = self.type_binds()?;
        let params = self.params()?;
        let ret = if self.match_punct(PunctuationId::Colon) {
            Some(self.typ()?)
        } else {
            None
        };
        let fields = self.braced_fields()?;
        Ok(Dec::Class(ClassDec {
            sort,
            persistent,
            name,
            type_params,
            params,
            ret,
            fields,
        }))
    }

    fn object_dec(&mut self, sort: ObjSort, persistent: bool) -> Result<Dec, CompileError> {
        let name = self.optional_identifier();
        let fields = self.braced_fields()?;
        Ok(Dec::Object(ObjectDec {
            sort,
            persistent,
            name,
            fields,
        }))
    }

    /// Parse after `actor` (or `persistent actor`): an actor class or an actor object.
    fn actor_dec(&mut self, persistent: bool) -> Result<Dec, CompileError> {
        if self.match_keyword(KeywordId::Class) {
            self.class_dec(ObjSort::Actor, persistent)
        } else {
            self.object_dec(ObjSort::Actor, persistent)
        }
    }

    fn import_dec(&mut self) -> Result<Dec, CompileError> {
        self.advance();
        let name = self.identifier_spanned()?;
        self.match_punct(PunctuationId::Eq);
        let path = self.text_literal_spanned()?;
        Ok(Dec::Import(ImportDec { name, path }))
    }
}
