/// Parse a token stream into an AST [`Program`].
///
/// This is the main public entrypoint for parsing.
///
/// ## Parameters
/// - `tokens`: Token stream produced by [`crate::lexer::lex`].
/// - `recover`: Whether to synthesize placeholders and keep going after syntax errors.
#[tracing::instrument(skip_all, fields(token_count = tokens.len(), recover))]
pub fn parse(tokens: &[Token], recover: bool) -> ParseOutcome {
    if tokens.is_empty() {
        let eof = [Token::new(TokenKind::Eof, Span::default())];
        return Parser::new(&eof, recover).parse();
    }
    Parser::new(tokens, recover).parse()
}

/// Lex and parse `source` in one step.
pub fn parse_source(source: &str, recover: bool) -> ParseOutcome {
    let tokens = lexer::lex(source);
    parse(&tokens, recover)
}
