use crate::ast::{AggregateModifier, AggregationExpr, Expr};
use crate::functions::AggregateFunction;
use crate::parser::expr::parse_expression;
use crate::parser::tokens::Token;
use crate::parser::{ParseResult, Parser};

/// parse_aggr_func_expr parses an aggregation Expr.
///
///    <aggr_op> (<Vector_expr>) [by|without <labels>]
///    <aggr_op> [by|without <labels>] (<Vector_expr>)
///
pub(super) fn parse_aggr_func_expr(p: &mut Parser, func: AggregateFunction) -> ParseResult<Expr> {
    let start = p.expect(&Token::Identifier)?.span.start;

    let prefix = if is_at_modifier(p) {
        Some(parse_aggregate_modifier(p)?)
    } else {
        None
    };

    p.expect_one_of(&[Token::LeftParen], "aggregation")?;
    let mut args = p.parse_comma_separated(&Token::RightParen, "aggregation", parse_expression)?;
    let span = start..p.prev_span().end;

    let modifier = match prefix {
        Some(modifier) => Some(modifier),
        None if is_at_modifier(p) => Some(parse_aggregate_modifier(p)?),
        None => None,
    };

    let expected = if func.has_param() { 2 } else { 1 };
    if args.is_empty() {
        return Err(p.error_at("no arguments for aggregate expression provided", &span));
    }
    if args.len() != expected {
        let msg = format!(
            "wrong number of arguments for aggregate expression provided, expected {expected}, got {}",
            args.len()
        );
        return Err(p.error_at(&msg, &span));
    }

    let expr = args.pop();
    let param = args.pop();
    match expr {
        Some(expr) => {
            let mut ae = AggregationExpr::new(func, expr);
            ae.param = param.map(Box::new);
            ae.modifier = modifier;
            Ok(Expr::Aggregation(ae))
        }
        None => Err(p.error_at("no arguments for aggregate expression provided", &span)),
    }
}

fn is_at_modifier(p: &Parser) -> bool {
    p.peek_kind().is_some_and(|k| k.is_aggregate_modifier())
}

fn parse_aggregate_modifier(p: &mut Parser) -> ParseResult<AggregateModifier> {
    let tok = p.expect_one_of(&[Token::By, Token::Without], "aggregation")?;
    let labels = p.parse_ident_list("grouping")?;

    let res = match tok.kind {
        Token::By => AggregateModifier::By(labels),
        _ => AggregateModifier::Without(labels),
    };

    Ok(res)
}
