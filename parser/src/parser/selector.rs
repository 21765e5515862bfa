use crate::ast::{Expr, MetricExpr};
use crate::label::{LabelFilter, LabelFilterOp, NAME_LABEL};
use crate::parser::tokens::Token;
use crate::parser::{extract_string_value, ParseResult, Parser};

/// parse_metric_expr parses a vector selector.
///
///    <label_set>
///    <metric_identifier> [<label_set>]
///
pub(super) fn parse_metric_expr(p: &mut Parser) -> ParseResult<Expr> {
    let start = p.current_token()?.span.start;

    let name = if p.at(&Token::Identifier) {
        Some(p.expect(&Token::Identifier)?.text.to_string())
    } else {
        None
    };

    let filters = if p.at(&Token::LeftBrace) {
        parse_label_filters(p)?
    } else {
        vec![]
    };

    let span = start..p.prev_span().end;
    let me = MetricExpr::with_filters(name, filters);

    if let Some(name) = &me.name {
        // an explicit name is a non-empty matcher, so only the duplicate check applies
        if let Some(m) = me.matchers.find_matcher(NAME_LABEL) {
            let msg = format!("metric name must not be set twice: {name:?} or {:?}", m.value);
            return Err(p.error_at(&msg, &span));
        }
    } else if me.matchers.is_empty_matchers() {
        // prevent implicit selection of all metrics (e.g. by a typo).
        return Err(p.error_at(
            "vector selector must contain at least one non-empty matcher",
            &span,
        ));
    }

    Ok(Expr::MetricExpression(me))
}

/// parse_label_filters parses a set of label matchers.
///
/// '{' [ <label_name> <match_op> <match_string>, ... ] '}'
///
fn parse_label_filters(p: &mut Parser) -> ParseResult<Vec<LabelFilter>> {
    p.expect(&Token::LeftBrace)?;
    p.parse_comma_separated(&Token::RightBrace, "label matching", parse_label_filter)
}

/// parse_label_filter parses a single label matcher.
///
///   <label_name> <match_op> <match_string>
///
fn parse_label_filter(p: &mut Parser) -> ParseResult<LabelFilter> {
    use Token::*;

    let label = p.expect_label_name("label matching")?;

    let tok = p.expect_one_of(
        &[Equal, OpNotEqual, RegexEqual, RegexNotEqual],
        "label matching",
    )?;
    let op = match tok.kind {
        Equal => LabelFilterOp::Equal,
        OpNotEqual => LabelFilterOp::NotEqual,
        RegexEqual => LabelFilterOp::RegexEqual,
        _ => LabelFilterOp::RegexNotEqual,
    };

    let value = p.expect_one_of(&[StringLiteral], "label matching")?;
    let unquoted =
        extract_string_value(value.text).map_err(|e| p.error_at(&e.to_string(), &value.span))?;

    LabelFilter::new(op, label, unquoted).map_err(|e| p.error_at(&e.to_string(), &value.span))
}
