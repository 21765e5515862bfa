use logos::Span;

use crate::ast::{AtModifier, DurationExpr, Expr, RollupExpr};
use crate::parser::tokens::Token;
use crate::parser::{parse_duration_value, parse_number, ParseResult, Parser};

const MODIFIER_TARGET_ERROR: &str =
    "must be preceded by an instant vector selector or range vector selector or a subquery";

/// Applies any number of `[range]`, `[range:step]`, `offset <duration>` and `@ <time>`
/// suffixes to `expr`.
pub(super) fn parse_rollup_suffix(p: &mut Parser, mut expr: Expr) -> ParseResult<Expr> {
    loop {
        expr = match p.peek_kind() {
            Some(Token::LeftBracket) => parse_range(p, expr)?,
            Some(Token::Offset) => parse_offset(p, expr)?,
            Some(Token::At) => parse_at(p, expr)?,
            _ => return Ok(expr),
        };
        p.check_depth(&expr)?;
    }
}

/// Parses a range selector `[5m]` or a subquery `[1h:5m]` / `[1h:]`.
fn parse_range(p: &mut Parser, expr: Expr) -> ParseResult<Expr> {
    let open = p.expect(&Token::LeftBracket)?;
    let window = parse_positive_duration(p, "range")?;

    let tok = p.expect_one_of(&[Token::Colon, Token::RightBracket], "range")?;
    if tok.kind == Token::Colon {
        let step = if p.at(&Token::Duration) {
            Some(parse_positive_duration(p, "subquery step")?)
        } else {
            None
        };
        p.expect_one_of(&[Token::RightBracket], "subquery selector")?;

        let mut re = RollupExpr::new(expr);
        re.window = Some(window);
        re.inherit_step = step.is_none();
        re.step = step;
        return Ok(Expr::Rollup(re));
    }

    match expr {
        Expr::MetricExpression(_) => {
            let mut re = RollupExpr::new(expr);
            re.window = Some(window);
            Ok(Expr::Rollup(re))
        }
        Expr::Rollup(re) if re.window.is_none() && re.expr.is_metric_expression() => {
            Err(p.error_at("no offset modifiers allowed before range", &open.span))
        }
        _ => Err(p.error_at("ranges only allowed for vector selectors", &open.span)),
    }
}

fn parse_positive_duration(p: &mut Parser, context: &str) -> ParseResult<DurationExpr> {
    let tok = p.expect_one_of(&[Token::Duration], context)?;
    let millis = parse_duration_value(tok.text).map_err(|e| p.error_at(&e.to_string(), &tok.span))?;
    if millis == 0 {
        let msg = format!("{context} duration must be greater than 0");
        return Err(p.error_at(&msg, &tok.span));
    }
    Ok(DurationExpr::new(millis))
}

/// Parses `offset [+-]<duration>`.
fn parse_offset(p: &mut Parser, expr: Expr) -> ParseResult<Expr> {
    let tok = p.expect(&Token::Offset)?;

    let negative = if p.consume_token(&Token::OpMinus) {
        true
    } else {
        p.consume_token(&Token::OpPlus);
        false
    };
    let duration = p.expect_one_of(&[Token::Duration], "offset")?;
    let millis = parse_duration_value(duration.text)
        .map_err(|e| p.error_at(&e.to_string(), &duration.span))?;
    let offset = DurationExpr::new(if negative { -millis } else { millis });

    let mut re = rollup_target(p, expr, "offset modifier", &tok.span)?;
    if re.offset.is_some() {
        return Err(p.error_at("offset may not be set multiple times", &tok.span));
    }
    re.offset = Some(offset);
    Ok(Expr::Rollup(re))
}

/// Parses `@ <timestamp>`, `@ start()` or `@ end()`.
fn parse_at(p: &mut Parser, expr: Expr) -> ParseResult<Expr> {
    let tok = p.expect(&Token::At)?;

    let at = match p.peek_kind() {
        Some(Token::Identifier) => {
            let ident = p.expect(&Token::Identifier)?;
            let at = match ident.text {
                "start" => AtModifier::Start,
                "end" => AtModifier::End,
                _ => {
                    return Err(p.error_at(
                        &format!("unexpected identifier {:?} in @ modifier", ident.text),
                        &ident.span,
                    ))
                }
            };
            p.expect_one_of(&[Token::LeftParen], "@ modifier")?;
            p.expect_one_of(&[Token::RightParen], "@ modifier")?;
            at
        }
        _ => parse_at_timestamp(p)?,
    };

    let mut re = rollup_target(p, expr, "@ modifier", &tok.span)?;
    if re.at.is_some() {
        return Err(p.error_at("@ <timestamp> may not be set multiple times", &tok.span));
    }
    re.at = Some(at);
    Ok(Expr::Rollup(re))
}

fn parse_at_timestamp(p: &mut Parser) -> ParseResult<AtModifier> {
    let negative = if p.consume_token(&Token::OpMinus) {
        true
    } else {
        p.consume_token(&Token::OpPlus);
        false
    };
    let tok = p.expect_one_of(&[Token::Number], "@ modifier")?;
    let secs = parse_number(tok.text).map_err(|e| p.error_at(&e.to_string(), &tok.span))?;
    let secs = if negative { -secs } else { secs };

    let millis = (secs * 1000.0).round();
    if !millis.is_finite() || millis >= i64::MAX as f64 || millis <= i64::MIN as f64 {
        let msg = format!("timestamp out of bounds for @ modifier: {secs}");
        return Err(p.error_at(&msg, &tok.span));
    }
    Ok(AtModifier::Timestamp(millis as i64))
}

/// Returns the rollup that an `offset` or `@` modifier attaches to.
fn rollup_target(p: &Parser, expr: Expr, what: &str, span: &Span) -> ParseResult<RollupExpr> {
    match expr {
        Expr::MetricExpression(_) => Ok(RollupExpr::new(expr)),
        Expr::Rollup(re) => Ok(re),
        _ => Err(p.error_at(&format!("{what} {MODIFIER_TARGET_ERROR}"), span)),
    }
}
