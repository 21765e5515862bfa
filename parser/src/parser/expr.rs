use std::str::FromStr;

use crate::ast::{
    BinModifier, BinaryExpr, Expr, NumberLiteral, ParensExpr, StringLiteral, UnaryExpr,
    VectorMatchCardinality, VectorMatchModifier,
};
use crate::common::{Operator, Precedence};
use crate::functions::AggregateFunction;
use crate::parser::aggregation::parse_aggr_func_expr;
use crate::parser::function::parse_func_expr;
use crate::parser::rollup::parse_rollup_suffix;
use crate::parser::selector::parse_metric_expr;
use crate::parser::tokens::Token;
use crate::parser::{extract_string_value, parse_number, ParseResult, Parser};

/// Parses a full expression, including binary operators.
pub(super) fn parse_expression(p: &mut Parser) -> ParseResult<Expr> {
    parse_binary_expr(p, 0)
}

fn parse_binary_expr(p: &mut Parser, min_precedence: Precedence) -> ParseResult<Expr> {
    p.enter_nested()?;
    let expr = parse_binary_chain(p, min_precedence);
    p.leave_nested();
    expr
}

/// Precedence climbing over binary operators. Only operators binding at least as
/// tightly as `min_precedence` are consumed.
///
/// Left-associative chains grow the tree without recursing, so their height is
/// tracked here.
fn parse_binary_chain(p: &mut Parser, min_precedence: Precedence) -> ParseResult<Expr> {
    let mut left = parse_unary_expr(p)?;
    let mut height = left.depth();

    while let Some(operator) = p.peek_kind().and_then(binary_operator) {
        let precedence = operator.precedence();
        if precedence < min_precedence {
            break;
        }
        p.bump();

        let modifier = parse_bin_modifier(p)?;

        let next_min = if operator.is_right_associative() {
            precedence
        } else {
            precedence + 1
        };
        let right = parse_binary_expr(p, next_min)?;

        height = height.max(right.depth()) + 1;
        p.check_height(height)?;

        left = Expr::BinaryOperator(BinaryExpr {
            left: Box::new(left),
            right: Box::new(right),
            op: operator,
            modifier,
        });
    }

    Ok(left)
}

/// Unary operators bind tighter than `*` but looser than `^`, so `-a ^ b` is `-(a ^ b)`.
fn parse_unary_expr(p: &mut Parser) -> ParseResult<Expr> {
    let negate = match p.peek_kind() {
        Some(Token::OpMinus) => true,
        Some(Token::OpPlus) => false,
        _ => return parse_single_expr(p),
    };
    p.bump();

    let expr = parse_binary_expr(p, Operator::Mul.precedence() + 1)?;
    if !negate {
        return Ok(expr);
    }

    let negated = match expr {
        Expr::NumberLiteral(NumberLiteral { value }) => Expr::from(-value),
        expr => Expr::UnaryOperator(UnaryExpr {
            expr: Box::new(expr),
        }),
    };
    Ok(negated)
}

/// Parses a primary expression followed by any `[...]`, `offset` or `@` suffixes.
pub(super) fn parse_single_expr(p: &mut Parser) -> ParseResult<Expr> {
    let expr = parse_single_expr_without_rollup_suffix(p)?;
    parse_rollup_suffix(p, expr)
}

fn parse_single_expr_without_rollup_suffix(p: &mut Parser) -> ParseResult<Expr> {
    use Token::*;

    match p.peek_kind() {
        Some(Number) => parse_number_expr(p),
        Some(StringLiteral) => parse_string_expr(p),
        Some(LeftParen) => parse_parens_expr(p),
        Some(LeftBrace) => parse_metric_expr(p),
        Some(Identifier) => {
            let next = p.peek_nth_kind(1);
            let is_call = next == Some(LeftParen);
            if is_call || next.is_some_and(|k| k.is_aggregate_modifier()) {
                let name = p.current_token()?.text;
                if let Ok(func) = AggregateFunction::from_str(name) {
                    return parse_aggr_func_expr(p, func);
                }
            }
            if is_call {
                return parse_func_expr(p);
            }
            parse_metric_expr(p)
        }
        _ => Err(p.unexpected("", "")),
    }
}

fn parse_number_expr(p: &mut Parser) -> ParseResult<Expr> {
    let tok = p.expect(&Token::Number)?;
    let value = parse_number(tok.text).map_err(|e| p.error_at(&e.to_string(), &tok.span))?;
    Ok(Expr::from(value))
}

fn parse_string_expr(p: &mut Parser) -> ParseResult<Expr> {
    let tok = p.expect(&Token::StringLiteral)?;
    let value =
        extract_string_value(tok.text).map_err(|e| p.error_at(&e.to_string(), &tok.span))?;
    Ok(Expr::StringLiteral(StringLiteral::new(value)))
}

fn parse_parens_expr(p: &mut Parser) -> ParseResult<Expr> {
    p.expect(&Token::LeftParen)?;
    let expr = parse_expression(p)?;
    p.expect_one_of(&[Token::RightParen], "paren expression")?;
    Ok(Expr::Parens(ParensExpr::new(expr)))
}

fn binary_operator(kind: Token) -> Option<Operator> {
    use Token::*;

    let op = match kind {
        OpPlus => Operator::Add,
        OpMinus => Operator::Sub,
        OpMul => Operator::Mul,
        OpDiv => Operator::Div,
        OpMod => Operator::Mod,
        OpPow => Operator::Pow,
        OpAtan2 => Operator::Atan2,
        OpEqual => Operator::Eql,
        OpNotEqual => Operator::NotEq,
        OpLessThan => Operator::Lt,
        OpLessThanOrEqual => Operator::Lte,
        OpGreaterThan => Operator::Gt,
        OpGreaterThanOrEqual => Operator::Gte,
        OpAnd => Operator::And,
        OpOr => Operator::Or,
        OpUnless => Operator::Unless,
        _ => return None,
    };
    Some(op)
}

/// Parses the optional `bool`, `on`/`ignoring` and `group_left`/`group_right`
/// modifiers that may follow a binary operator, in that order.
fn parse_bin_modifier(p: &mut Parser) -> ParseResult<Option<BinModifier>> {
    let mut modifier = BinModifier {
        return_bool: p.consume_token(&Token::Bool),
        ..Default::default()
    };

    if p.peek_kind().is_some_and(|k| k.is_group_modifier()) {
        parse_vector_match_modifier(p, &mut modifier)?;
        if p.peek_kind().is_some_and(|k| k.is_join_modifier()) {
            parse_vector_match_cardinality(p, &mut modifier)?;
        }
    }

    if modifier.is_default() {
        Ok(None)
    } else {
        Ok(Some(modifier))
    }
}

fn parse_vector_match_modifier(p: &mut Parser, modifier: &mut BinModifier) -> ParseResult<()> {
    let tok = p.expect_one_of(&[Token::On, Token::Ignoring], "vector matching")?;
    let labels = p.parse_ident_list("grouping")?;

    modifier.matching = Some(match tok.kind {
        Token::On => VectorMatchModifier::On(labels),
        _ => VectorMatchModifier::Ignoring(labels),
    });

    Ok(())
}

fn parse_vector_match_cardinality(p: &mut Parser, modifier: &mut BinModifier) -> ParseResult<()> {
    let tok = p.expect_one_of(&[Token::GroupLeft, Token::GroupRight], "vector matching")?;

    // join modifier may omit the label list.
    let labels = if p.at(&Token::LeftParen) {
        p.parse_ident_list("grouping")?
    } else {
        vec![]
    };

    modifier.card = match tok.kind {
        Token::GroupLeft => VectorMatchCardinality::ManyToOne(labels),
        _ => VectorMatchCardinality::OneToMany(labels),
    };

    Ok(())
}
