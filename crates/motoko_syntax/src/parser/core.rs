/// Outcome of one parse.
///
/// ## Notes
/// - Strict mode: `program` is `None` iff `errors` is non-empty (and then holds exactly one error).
/// - Recovering mode: `program` is always present; `errors` lists every recovered error in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub program: Option<Program>,
    pub errors: Vec<CompileError>,
}

/// Deepest syntactic nesting the parser descends into before reporting an error.
pub const MAX_NESTING: usize = 100;

/// Parser state.
///
/// ## Notes
/// - Most parsing helpers are implemented on `Parser` but split across multiple files.
/// - `next_exp` hands out dense [`ExpId`]s in completion order.
/// - `depth` counts the nested constructs currently being parsed; see [`MAX_NESTING`].
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<CompileError>,
    recover: bool,
    next_exp: u32,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a token stream.
    ///
    /// ## Parameters
    /// - `tokens`: Token stream produced by [`crate::lexer::lex`]; must end with `Eof`.
    /// - `recover`: Whether to recover from syntax errors.
    pub fn new(tokens: &'a [Token], recover: bool) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            recover,
            next_exp: 0,
            depth: 0,
        }
    }

    /// Parse the entire token stream into a [`Program`].
    pub fn parse(mut self) -> ParseOutcome {
        match self.program() {
            Ok(program) => ParseOutcome {
                program: Some(program),
                errors: self.errors,
            },
            Err(err) => {
                self.errors.push(err);
                ParseOutcome {
                    program: None,
                    errors: self.errors,
                }
            }
        }
    }

    fn program(&mut self) -> Result<Program, CompileError> {
        let start = self.current_span().start;
        let mut decs = self.dec_list(false)?;

        // A doc comment ahead of a leading import (or of an otherwise empty file) documents the program.
        let doc = match decs.first_mut() {
            Some(first) if matches!(first.dec.node, Dec::Import(_)) => first.doc.take(),
            Some(_) => None,
            None => self.peek().doc.clone(),
        };

        Ok(Program {
            doc,
            decs,
            span: Span::new(start, self.peek().span.end),
            exp_count: self.next_exp,
        })
    }
}
