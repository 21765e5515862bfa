use logos::Span;

use crate::parser::parse_error::{describe_token, positioned, unexpected};
use crate::parser::tokens::{tokenize, Token, TokenWithLocation};
use crate::ast::Expr;
use crate::parser::{ParseError, ParseResult};

/// Upper bound on nested sub-expressions (parentheses, call arguments, unary
/// operators, right operands) while parsing.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Upper bound on the height of a parsed expression tree.
pub const MAX_EXPR_DEPTH: usize = 512;

/// parser parses a PromQL expression.
///
/// preconditions for all parser.parse* funcs:
/// - the cursor should point to the first token to parse.
///
/// post-conditions for all parser.parse* funcs:
/// - the cursor should point to the next token after the parsed token.
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<TokenWithLocation<'a>>,
    cursor: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> ParseResult<Self> {
        let tokens = tokenize(input)?;
        Ok(Self {
            input,
            tokens,
            cursor: 0,
            depth: 0,
        })
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn is_eof(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    pub(crate) fn peek_kind(&self) -> Option<Token> {
        self.tokens.get(self.cursor).map(|t| t.kind)
    }

    /// The kind of the token `n` positions after the current one.
    pub(crate) fn peek_nth_kind(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.cursor + n).map(|t| t.kind)
    }

    pub(crate) fn current_token(&self) -> ParseResult<&TokenWithLocation<'a>> {
        match self.tokens.get(self.cursor) {
            Some(t) => Ok(t),
            None => Err(self.unexpected_eof("")),
        }
    }

    pub(crate) fn at(&self, kind: &Token) -> bool {
        self.peek_kind().as_ref() == Some(kind)
    }

    pub(crate) fn at_set(&self, set: &[Token]) -> bool {
        match self.peek_kind() {
            Some(kind) => set.contains(&kind),
            None => false,
        }
    }

    pub(crate) fn bump(&mut self) {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
    }

    /// Consume the next token if it matches the expected token, otherwise return false
    pub(crate) fn consume_token(&mut self, expected: &Token) -> bool {
        if self.at(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &Token) -> ParseResult<TokenWithLocation<'a>> {
        self.expect_one_of(std::slice::from_ref(kind), "")
    }

    pub(crate) fn expect_one_of(
        &mut self,
        kinds: &[Token],
        context: &str,
    ) -> ParseResult<TokenWithLocation<'a>> {
        if self.at_set(kinds) {
            let tok = self.tokens[self.cursor].clone();
            self.bump();
            Ok(tok)
        } else {
            Err(self.token_error(kinds, context))
        }
    }

    /// Accepts an identifier or a keyword used as a label name.
    pub(crate) fn expect_label_name(&mut self, context: &str) -> ParseResult<String> {
        let tok = match self.tokens.get(self.cursor) {
            Some(tok) if tok.kind.is_label_name() && !tok.text.contains(':') => tok.clone(),
            _ => return Err(self.unexpected(context, "label name")),
        };
        self.bump();
        Ok(tok.text.to_string())
    }

    pub(crate) fn token_error(&self, expected: &[Token], context: &str) -> ParseError {
        let expected = expected
            .iter()
            .map(|t| match t {
                Token::Identifier
                | Token::Number
                | Token::Duration
                | Token::StringLiteral => t.as_str().to_string(),
                _ => format!("{:?}", t.as_str()),
            })
            .collect::<Vec<_>>();
        let expected = match expected.len() {
            0 => String::new(),
            1 => expected[0].clone(),
            n => format!("{} or {}", expected[..n - 1].join(", "), expected[n - 1]),
        };
        self.unexpected(context, &expected)
    }

    /// Error complaining about the current token (or end of input).
    pub(crate) fn unexpected(&self, context: &str, expected: &str) -> ParseError {
        match self.tokens.get(self.cursor) {
            Some(tok) => {
                let actual = describe_token(Some((tok.kind, tok.text)));
                unexpected(self.input, context, &actual, expected, Some(&tok.span))
            }
            None => self.unexpected_eof_with(context, expected),
        }
    }

    fn unexpected_eof(&self, context: &str) -> ParseError {
        self.unexpected_eof_with(context, "")
    }

    fn unexpected_eof_with(&self, context: &str, expected: &str) -> ParseError {
        let end = self.input.len();
        unexpected(
            self.input,
            context,
            &describe_token(None),
            expected,
            Some(&(end..end)),
        )
    }

    pub(crate) fn error_at(&self, msg: &str, span: &Span) -> ParseError {
        positioned(self.input, msg, span)
    }

    /// Marks entry into a nested expression. Fails once nesting exceeds
    /// [`MAX_NESTING_DEPTH`].
    pub(crate) fn enter_nested(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.too_deep(MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Rejects trees taller than [`MAX_EXPR_DEPTH`].
    pub(crate) fn check_depth(&self, expr: &Expr) -> ParseResult<()> {
        self.check_height(expr.depth())
    }

    pub(crate) fn check_height(&self, height: usize) -> ParseResult<()> {
        if height > MAX_EXPR_DEPTH {
            return Err(self.too_deep(MAX_EXPR_DEPTH));
        }
        Ok(())
    }

    fn too_deep(&self, limit: usize) -> ParseError {
        let span = match self.tokens.get(self.cursor) {
            Some(tok) => tok.span.clone(),
            None => self.input.len()..self.input.len(),
        };
        let msg = format!("expression nesting too deep: exceeds maximum depth of {limit}");
        self.error_at(&msg, &span)
    }

    /// Span of the previously consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        if self.cursor == 0 {
            return 0..0;
        }
        self.tokens
            .get(self.cursor - 1)
            .map(|t| t.span.clone())
            .unwrap_or_default()
    }

    /// Parse a comma-separated list of 0+ items accepted by `F`, terminated by `stop`.
    /// A trailing comma before `stop` is accepted.
    pub(crate) fn parse_comma_separated<T, F>(
        &mut self,
        stop: &Token,
        context: &str,
        mut f: F,
    ) -> ParseResult<Vec<T>>
    where
        F: FnMut(&mut Parser<'a>) -> ParseResult<T>,
    {
        let mut values = Vec::with_capacity(4);
        loop {
            if self.consume_token(stop) {
                break;
            }
            let item = f(self)?;
            values.push(item);
            if self.consume_token(&Token::Comma) {
                continue;
            }
            if self.consume_token(stop) {
                break;
            }
            return Err(self.token_error(&[Token::Comma, *stop], context));
        }
        Ok(values)
    }

    /// Parses `( label, ... )`, as used by grouping and vector matching modifiers.
    pub(crate) fn parse_ident_list(&mut self, context: &str) -> ParseResult<Vec<String>> {
        self.expect_one_of(&[Token::LeftParen], context)?;
        self.parse_comma_separated(&Token::RightParen, context, |p| {
            p.expect_label_name(context)
        })
    }
}
