pub use duration::*;
pub use number::*;
pub use parse_error::*;
pub use parser::*;
pub use regexp_cache::*;
pub use utils::*;

use crate::ast::{check_ast, Expr};
use crate::parser::expr::parse_expression;

mod aggregation;
mod duration;
mod expr;
mod function;
mod number;
mod parse_error;
#[allow(clippy::module_inception)]
mod parser;
mod regexp_cache;
mod rollup;
mod selector;
pub mod tokens;
mod utils;

#[cfg(test)]
mod parser_test;

/// Parses a PromQL expression and type checks the result.
pub fn parse(input: &str) -> ParseResult<Expr> {
    let mut parser = Parser::new(input)?;
    if parser.is_eof() {
        return Err(ParseError::EmptyInput);
    }
    let expr = parse_expression(&mut parser)?;
    if !parser.is_eof() {
        return Err(parser.unexpected("", ""));
    }
    parser.check_depth(&expr)?;
    check_ast(expr)
}

