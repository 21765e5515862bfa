use crate::ast::{Expr, FunctionExpr};
use crate::functions::{lookup_function, FunctionSignature};
use crate::parser::expr::parse_expression;
use crate::parser::tokens::Token;
use crate::parser::{ArgCountError, ParseResult, Parser};

/// Parses a call of a builtin function: `<name>(<expr>, ...)`.
pub(super) fn parse_func_expr(p: &mut Parser) -> ParseResult<Expr> {
    let name = p.expect(&Token::Identifier)?;
    let signature =
        lookup_function(name.text).map_err(|e| p.error_at(&e.to_string(), &name.span))?;

    p.expect(&Token::LeftParen)?;
    let args = p.parse_comma_separated(&Token::RightParen, "function call", parse_expression)?;

    if let Err(err) = validate_arg_count(signature, args.len()) {
        let span = name.span.start..p.prev_span().end;
        return Err(p.error_at(&err.to_string(), &span));
    }

    Ok(Expr::Function(FunctionExpr::new(name.text, args)))
}

fn validate_arg_count(signature: &FunctionSignature, actual: usize) -> Result<(), ArgCountError> {
    let min = signature.min_args();
    let max = signature.max_args();
    if actual < min || max.is_some_and(|max| actual > max) {
        return Err(ArgCountError::new(signature.name, min, max, actual));
    }
    Ok(())
}
