/// Phrase used in error messages when an expression operand is missing.
const EXP_BIN: &str = "<exp_bin(ob)> (e.g. '42')";

/// Expression parsing.
///
/// Precedence, loosest first:
/// - assignment (`:=`, `+=`, ...) and annotation (`e : T`)
/// - `or`, `and`
/// - comparisons
/// - `+`, `-`, `#`
/// - `*`, `/`, `%`
/// - `**` (right-associative)
/// - prefix `-`, `+`, `not`, `?`, `debug_show`
/// - postfix: calls, instantiated calls `f<T>(x)`, `.field`, `.0`, `[index]`
///
/// ## Notes
/// - Keyword-led forms (`if`, `while`, `await`, `return`, ...) take a full expression as their body.
/// - A call argument may be juxtaposed (`f "text"`, `f x`) when the callee is call-shaped.
impl<'a> Parser<'a> {
    fn expression(&mut self) -> Result<Exp, CompileError> {
        let start = self.current_span().start;
        let mut exp = self.binary(0)?;

        if self.match_punct(PunctuationId::Colon) {
            let ty = self.typ()?;
            exp = self.mk_exp(ExpKind::Annot(Box::new(exp), ty), self.span_from(start));
        }

        if let TokenKind::Operator(id) = self.peek().kind {
            if id == OperatorId::ColonEq {
                self.advance();
                let rhs = self.nested(Self::expression)?;
                return Ok(self.mk_exp(ExpKind::Assign(Box::new(exp), Box::new(rhs)), self.span_from(start)));
            }
            if let Some(op) = operators::compound_base(id).and_then(bin_op) {
                self.advance();
                let rhs = self.nested(Self::expression)?;
                return Ok(self.mk_exp(
                    ExpKind::OpAssign(Box::new(exp), op, Box::new(rhs)),
                    self.span_from(start),
                ));
            }
        }
        Ok(exp)
    }

    /// Binary operators by precedence climbing.
    fn binary(&mut self, min_prec: u8) -> Result<Exp, CompileError> {
        let start = self.current_span().start;
        let mut lhs = self.unary()?;
        while let Some((id, prec, assoc)) = self.peek_binary() {
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_min = if assoc == Associativity::Right { prec } else { prec + 1 };
            let rhs = self.nested(|p| p.binary(next_min))?;
            let kind = match id {
                OperatorId::And => ExpKind::And(Box::new(lhs), Box::new(rhs)),
                OperatorId::Or => ExpKind::Or(Box::new(lhs), Box::new(rhs)),
                _ => match (bin_op(id), rel_op(id)) {
                    (Some(op), _) => ExpKind::Binary(Box::new(lhs), op, Box::new(rhs)),
                    (None, Some(op)) => ExpKind::Compare(Box::new(lhs), op, Box::new(rhs)),
                    (None, None) => ExpKind::Error,
                },
            };
            lhs = self.mk_exp(kind, self.span_from(start));
        }
        Ok(lhs)
    }

    fn peek_binary(&self) -> Option<(OperatorId, u8, Associativity)> {
        let id = match self.peek().kind {
            TokenKind::Operator(id) => id,
            TokenKind::Keyword(KeywordId::And) => OperatorId::And,
            TokenKind::Keyword(KeywordId::Or) => OperatorId::Or,
            _ => return None,
        };
        let (prec, assoc) = operators::binary_precedence(id)?;
        Some((id, prec, assoc))
    }

    fn unary(&mut self) -> Result<Exp, CompileError> {
        let start = self.current_span().start;
        let op = if self.check_op(OperatorId::Minus) {
            Some(UnOp::Neg)
        } else if self.check_op(OperatorId::Plus) {
            Some(UnOp::Pos)
        } else if self.check_keyword(KeywordId::Not) {
            Some(UnOp::Not)
        } else {
            None
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.nested(Self::unary)?;
            return Ok(self.mk_exp(ExpKind::Unary(op, Box::new(operand)), self.span_from(start)));
        }
        if self.match_punct(PunctuationId::Question) {
            let operand = self.nested(Self::unary)?;
            return Ok(self.mk_exp(ExpKind::Opt(Box::new(operand)), self.span_from(start)));
        }
        if self.match_keyword(KeywordId::DebugShow) {
            let operand = self.nested(Self::unary)?;
            return Ok(self.mk_exp(ExpKind::Show(Box::new(operand)), self.span_from(start)));
        }
        self.postfix(true)
    }

    fn postfix(&mut self, allow_juxtaposition: bool) -> Result<Exp, CompileError> {
        let start = self.current_span().start;
        let mut exp = self.nested(Self::primary)?;
        loop {
            if self.match_punct(PunctuationId::Dot) {
                let kind = match &self.peek().kind {
                    TokenKind::Ident(_) => ExpKind::Dot(Box::new(exp), self.identifier_spanned()?),
                    TokenKind::Nat(digits) => {
                        let index = digits.parse::<usize>().unwrap_or(usize::MAX);
                        self.advance();
                        ExpKind::Proj(Box::new(exp), index)
                    }
                    _ => {
                        let err = self.unexpected(&["<id>"]);
                        let at = self.current_span().start;
                        let name = self.recover_with(err, Spanned::new(String::new(), Span::new(at, at)))?;
                        ExpKind::Dot(Box::new(exp), name)
                    }
                };
                exp = self.mk_exp(kind, self.span_from(start));
            } else if self.match_punct(PunctuationId::LBracket) {
                let index = self.expression()?;
                self.expect_punct(PunctuationId::RBracket)?;
                exp = self.mk_exp(ExpKind::Index(Box::new(exp), Box::new(index)), self.span_from(start));
            } else if exp.is_callee_shaped() && self.check_punct(PunctuationId::LParen) {
                let arg = self.paren_exp()?;
                exp = self.mk_call(exp, None, arg, start);
            } else if exp.is_callee_shaped() && self.check_op(OperatorId::Lt) {
                match self.try_instantiation() {
                    Some(inst) => {
                        let arg = self.paren_exp()?;
                        exp = self.mk_call(exp, Some(inst), arg, start);
                    }
                    None => break,
                }
            } else if allow_juxtaposition && exp.is_callee_shaped() && self.at_juxtaposed_arg() {
                let arg = self.nested(Self::primary)?;
                exp = self.mk_call(exp, None, arg, start);
            } else {
                break;
            }
        }
        Ok(exp)
    }

    fn mk_call(&mut self, func: Exp, inst: Option<Vec<Typ>>, arg: Exp, start: usize) -> Exp {
        self.mk_exp(
            ExpKind::Call {
                func: Box::new(func),
                inst,
                arg: Box::new(arg),
            },
            self.span_from(start),
        )
    }

    /// Speculatively parse `<T, ...>` followed by `(`; on failure nothing is consumed.
    fn try_instantiation(&mut self) -> Option<Vec<Typ>> {
        let snapshot = self.snapshot();
        match self.typ_args() {
            Ok(args) if self.check_punct(PunctuationId::LParen) && self.errors.len() == snapshot.1 => Some(args),
            _ => {
                self.restore(snapshot);
                None
            }
        }
    }

    fn at_juxtaposed_arg(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Ident(_)
                | TokenKind::Nat(_)
                | TokenKind::Float(_)
                | TokenKind::Text(_)
                | TokenKind::Char(_)
                | TokenKind::Keyword(KeywordId::True | KeywordId::False | KeywordId::Null)
        )
    }

    fn primary(&mut self) -> Result<Exp, CompileError> {
        let start = self.current_span().start;
        if let Some(lit) = self.literal() {
            return Ok(self.mk_exp(ExpKind::Lit(lit), self.span_from(start)));
        }
        let kind = match self.peek().kind {
            TokenKind::Ident(_) => ExpKind::Var(self.identifier()?),
            TokenKind::Punctuation(PunctuationId::LParen) => return self.paren_exp(),
            TokenKind::Punctuation(PunctuationId::LBracket) => self.array_exp()?,
            TokenKind::Punctuation(PunctuationId::LBrace) => return self.block_or_record(),
            TokenKind::Keyword(KeywordId::If) => self.if_exp()?,
            TokenKind::Keyword(KeywordId::While) => {
                self.advance();
                let cond = self.condition()?;
                let body = self.expression()?;
                ExpKind::While(Box::new(cond), Box::new(body))
            }
            TokenKind::Keyword(KeywordId::Loop) => {
                self.advance();
                ExpKind::Loop(Box::new(self.expression()?))
            }
            TokenKind::Keyword(KeywordId::For) => self.for_exp()?,
            TokenKind::Keyword(KeywordId::Switch) => self.switch_exp()?,
            TokenKind::Keyword(KeywordId::Return) => {
                self.advance();
                if self.at_exp_end() {
                    ExpKind::Return(None)
                } else {
                    ExpKind::Return(Some(Box::new(self.expression()?)))
                }
            }
            TokenKind::Keyword(KeywordId::Ignore) => {
                self.advance();
                ExpKind::Ignore(Box::new(self.expression()?))
            }
            TokenKind::Keyword(KeywordId::Assert) => {
                self.advance();
                ExpKind::Assert(Box::new(self.expression()?))
            }
            TokenKind::Keyword(KeywordId::Async) => {
                self.advance();
                ExpKind::Async(Box::new(self.expression()?))
            }
            TokenKind::Keyword(KeywordId::Await) => {
                self.advance();
                ExpKind::Await(Box::new(self.expression()?))
            }
            TokenKind::Keyword(KeywordId::Func) => {
                self.advance();
                ExpKind::Func(self.func_rest(FuncSort::Local)?)
            }
            TokenKind::Keyword(KeywordId::Shared | KeywordId::Query) => {
                let sort = self.func_sort();
                self.expect_keyword(KeywordId::Func)?;
                ExpKind::Func(self.func_rest(sort)?)
            }
            TokenKind::Keyword(KeywordId::Object | KeywordId::Actor | KeywordId::Module | KeywordId::Persistent) => {
                // Object literals are single-declaration blocks evaluating to the object.
                let dec = self.dec()?;
                ExpKind::Block(vec![DecField {
                    doc: None,
                    vis: Visibility::Private,
                    stability: None,
                    dec,
                }])
            }
            _ => {
                let err = self.unexpected(&[EXP_BIN]);
                let placeholder = self.error_exp();
                return self.recover_with(err, placeholder);
            }
        };
        Ok(self.mk_exp(kind, self.span_from(start)))
    }

    /// `()`, `(e)`, `(e,)`, `(e1, e2, ...)`.
    fn paren_exp(&mut self) -> Result<Exp, CompileError> {
        let start = self.current_span().start;
        self.expect_punct(PunctuationId::LParen)?;
        let mut elems = Vec::new();
        let mut trailing_comma = false;
        while !self.check_punct(PunctuationId::RParen) {
            elems.push(self.expression()?);
            trailing_comma = self.match_punct(PunctuationId::Comma);
            if !trailing_comma {
                break;
            }
        }
        self.expect_punct(PunctuationId::RParen)?;
        if elems.len() == 1 && !trailing_comma {
            return Ok(elems.remove(0));
        }
        Ok(self.mk_exp(ExpKind::Tuple(elems), self.span_from(start)))
    }

    fn array_exp(&mut self) -> Result<ExpKind, CompileError> {
        self.expect_punct(PunctuationId::LBracket)?;
        let mutable = self.match_keyword(KeywordId::Var);
        let mut elems = Vec::new();
        while !self.check_punct(PunctuationId::RBracket) {
            elems.push(self.expression()?);
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RBracket)?;
        Ok(ExpKind::Array { mutable, elems })
    }

    /// `{}` and `{ name = e; ... }` are records; anything else in braces is a block.
    fn block_or_record(&mut self) -> Result<Exp, CompileError> {
        let is_record = self.peek_at(1).kind.is_punctuation(PunctuationId::RBrace)
            || (matches!(self.peek_at(1).kind, TokenKind::Ident(_))
                && self.peek_at(2).kind.is_punctuation(PunctuationId::Eq));
        if is_record {
            self.record_exp()
        } else {
            self.block_exp()
        }
    }

    fn record_exp(&mut self) -> Result<Exp, CompileError> {
        let start = self.current_span().start;
        self.expect_punct(PunctuationId::LBrace)?;
        let mut fields = Vec::new();
        loop {
            while self.match_punct(PunctuationId::Semicolon) {}
            if self.check_punct(PunctuationId::RBrace) {
                break;
            }
            let field_start = self.current_span().start;
            let mutable = self.match_keyword(KeywordId::Var);
            let name = self.identifier_spanned()?;
            let ty = if self.match_punct(PunctuationId::Colon) {
                Some(self.typ()?)
            } else {
                None
            };
            self.expect_punct(PunctuationId::Eq)?;
            let mut exp = self.expression()?;
            if let Some(ty) = ty {
                exp = self.mk_exp(ExpKind::Annot(Box::new(exp), ty), self.span_from(field_start));
            }
            fields.push(ExpField { mutable, name, exp });
            if !self.check_punct(PunctuationId::RBrace) {
                self.expect_punct(PunctuationId::Semicolon)?;
            }
        }
        self.expect_punct(PunctuationId::RBrace)?;
        Ok(self.mk_exp(ExpKind::Record(fields), self.span_from(start)))
    }

    /// `{ decs }`. In recovering mode a missing `}` is reported and the block is kept.
    fn block_exp(&mut self) -> Result<Exp, CompileError> {
        let start = self.current_span().start;
        self.expect_punct(PunctuationId::LBrace)?;
        let decs = self.nested(|p| p.dec_list(true))?;
        if !self.match_punct(PunctuationId::RBrace) {
            let err = self.unexpected(&["}"]);
            self.recover_with(err, ())?;
        }
        Ok(self.mk_exp(ExpKind::Block(decs), self.span_from(start)))
    }

    /// Condition of `if`, `while` and `switch`: a parenthesized expression or a postfix expression.
    fn condition(&mut self) -> Result<Exp, CompileError> {
        if self.check_punct(PunctuationId::LParen) {
            self.paren_exp()
        } else {
            self.postfix(false)
        }
    }

    fn if_exp(&mut self) -> Result<ExpKind, CompileError> {
        self.expect_keyword(KeywordId::If)?;
        let cond = self.condition()?;
        let then_branch = self.expression()?;
        let else_branch = if self.match_keyword(KeywordId::Else) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        Ok(ExpKind::If(Box::new(cond), Box::new(then_branch), else_branch))
    }

    fn for_exp(&mut self) -> Result<ExpKind, CompileError> {
        self.expect_keyword(KeywordId::For)?;
        self.expect_punct(PunctuationId::LParen)?;
        let pat = self.pattern()?;
        self.expect_keyword(KeywordId::In)?;
        let iter = self.expression()?;
        self.expect_punct(PunctuationId::RParen)?;
        let body = self.expression()?;
        Ok(ExpKind::For(pat, Box::new(iter), Box::new(body)))
    }

    fn switch_exp(&mut self) -> Result<ExpKind, CompileError> {
        self.expect_keyword(KeywordId::Switch)?;
        let scrutinee = self.condition()?;
        self.expect_punct(PunctuationId::LBrace)?;
        let mut cases = Vec::new();
        loop {
            while self.match_punct(PunctuationId::Semicolon) {}
            if self.check_punct(PunctuationId::RBrace) || self.is_at_end() {
                break;
            }
            self.expect_keyword(KeywordId::Case)?;
            let pat = self.pat_un()?;
            let exp = self.expression()?;
            cases.push(Case { pat, exp });
        }
        self.expect_punct(PunctuationId::RBrace)?;
        Ok(ExpKind::Switch(Box::new(scrutinee), cases))
    }

    /// Return `true` when no expression can start here (for `return` without a value).
    fn at_exp_end(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Eof => true,
            TokenKind::Punctuation(p) => matches!(
                p,
                PunctuationId::Semicolon | PunctuationId::RBrace | PunctuationId::RParen | PunctuationId::Comma
            ),
            TokenKind::Keyword(k) => matches!(k, KeywordId::Else | KeywordId::Case),
            _ => false,
        }
    }
}

fn bin_op(id: OperatorId) -> Option<BinOp> {
    Some(match id {
        OperatorId::Plus => BinOp::Add,
        OperatorId::Minus => BinOp::Sub,
        OperatorId::Star => BinOp::Mul,
        OperatorId::Slash => BinOp::Div,
        OperatorId::Percent => BinOp::Mod,
        OperatorId::StarStar => BinOp::Pow,
        OperatorId::Hash => BinOp::Cat,
        _ => return None,
    })
}

fn rel_op(id: OperatorId) -> Option<RelOp> {
    Some(match id {
        OperatorId::EqEq => RelOp::Eq,
        OperatorId::NotEq => RelOp::Neq,
        OperatorId::Lt => RelOp::Lt,
        OperatorId::LtEq => RelOp::Le,
        OperatorId::Gt => RelOp::Gt,
        OperatorId::GtEq => RelOp::Ge,
        _ => return None,
    })
}
