use std::fmt;
use std::fmt::{Display, Formatter};

use logos::Span;
use thiserror::Error;

use crate::parser::tokens::Token;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum ParseError {
    #[error("no expression found in input")]
    EmptyInput,
    #[error(transparent)]
    Unexpected(ParseErr),
    #[error("unknown function with name \"{0}\"")]
    InvalidFunction(String),
    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error(transparent)]
    InvalidArgCount(ArgCountError),
    #[error("{0}")]
    TypeError(String),
    #[error("{0}")]
    General(String),
}

/// ParseErr wraps a parsing error with line and position context.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub struct ParseErr {
    pub range: Span,
    pub err: String,
    /// 1-based line of `range.start` within the query.
    pub line: usize,
    /// 1-based column (in chars) of `range.start` within its line.
    pub column: usize,
}

impl ParseErr {
    pub fn new<S: Into<Span>>(msg: &str, range: S) -> Self {
        Self {
            range: range.into(),
            err: msg.to_string(),
            line: 1,
            column: 1,
        }
    }

    /// Resolves line and column of the error range against the query it was found in.
    pub fn with_input(mut self, input: &str) -> Self {
        let pos = self.range.start.min(input.len());
        let prefix = input.get(..pos).unwrap_or(input);
        self.line = prefix.matches('\n').count() + 1;
        let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
        self.column = prefix[line_start..].chars().count() + 1;
        self
    }
}

impl Display for ParseErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: parse error: {}", self.line, self.column, self.err)
    }
}

/// unexpected creates a parser error complaining about an unexpected lexer item.
pub(crate) fn unexpected(
    input: &str,
    context: &str,
    actual: &str,
    expected: &str,
    span: Option<&Span>,
) -> ParseError {
    let mut err_msg: String = String::with_capacity(25 + context.len() + expected.len());

    err_msg.push_str("unexpected ");

    err_msg.push_str(actual);

    if !context.is_empty() {
        err_msg.push_str(" in ");
        err_msg.push_str(context)
    }

    if !expected.is_empty() {
        err_msg.push_str(", expected ");
        err_msg.push_str(expected)
    }

    let span = span.cloned().unwrap_or_default();
    ParseError::Unexpected(ParseErr::new(&err_msg, span).with_input(input))
}

/// positioned creates a parser error with a free-form message at the given span.
pub(crate) fn positioned(input: &str, msg: &str, span: &Span) -> ParseError {
    ParseError::Unexpected(ParseErr::new(msg, span.clone()).with_input(input))
}

pub(crate) fn describe_token(token: Option<(Token, &str)>) -> String {
    match token {
        None => "end of input".to_string(),
        Some((kind, text)) => kind.describe(text),
    }
}

/// Occurs when a function is called with the wrong number of arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ArgCountError {
    min: usize,
    max: Option<usize>,
    actual: usize,
    name: String,
}

impl ArgCountError {
    /// Create a new instance of the error
    ///
    /// # Arguments
    /// * `name` - Function name
    /// * `min` - Smallest allowed number of arguments
    /// * `max` - Largest allowed number of arguments, if bounded
    /// * `actual` - Number of arguments passed
    pub fn new(name: &str, min: usize, max: Option<usize>, actual: usize) -> Self {
        Self {
            min,
            max,
            actual,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn actual(&self) -> usize {
        self.actual
    }
}

impl Display for ArgCountError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(
                f,
                "expected {} argument(s) in call to \"{}\", got {}",
                self.min, self.name, self.actual
            ),
            Some(max) if self.actual > max => write!(
                f,
                "expected at most {} argument(s) in call to \"{}\", got {}",
                max, self.name, self.actual
            ),
            _ => write!(
                f,
                "expected at least {} argument(s) in call to \"{}\", got {}",
                self.min, self.name, self.actual
            ),
        }
    }
}
