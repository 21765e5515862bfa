// integrate checks from
// https://github.com/prometheus/prometheus/blob/fa6e05903fd3ce52e374a6e1bf4eb98c9f1f45a7/promql/parser/parse.go#L436

use crate::ast::{
    AggregationExpr, BinModifier, BinaryExpr, Expr, FunctionExpr, ParensExpr, RollupExpr,
    UnaryExpr, VectorMatchCardinality, VectorMatchModifier,
};
use crate::common::ValueType;
use crate::functions::lookup_function;
use crate::parser::{ParseError, ParseResult};

/// check_ast checks the validity of the provided AST. This includes type checking.
/// Recursively check correct typing for child nodes and raise errors in case of bad typing.
pub fn check_ast(expr: Expr) -> ParseResult<Expr> {
    use Expr::*;
    match expr {
        UnaryOperator(ex) => check_ast_for_unary_expr(ex),
        BinaryOperator(ex) => check_ast_for_binary_expr(ex),
        Aggregation(ex) => check_ast_for_aggregate_expr(ex),
        Function(ex) => check_ast_for_call(ex),
        Rollup(ex) => check_ast_for_rollup(ex),
        Parens(ex) => check_ast_for_parens(ex),
        StringLiteral(_) | NumberLiteral(_) | MetricExpression(_) => Ok(expr),
    }
}

fn type_error(msg: String) -> ParseError {
    ParseError::TypeError(msg)
}

fn expect_type(expected: ValueType, actual: ValueType, context: &str) -> ParseResult<()> {
    if expected != actual {
        return Err(type_error(format!(
            "expected type {expected} in {context}, got {actual}"
        )));
    }
    Ok(())
}

fn check_ast_for_unary_expr(ex: UnaryExpr) -> ParseResult<Expr> {
    let expr = check_ast(*ex.expr)?;
    let value_type = expr.return_type();
    if value_type != ValueType::Scalar && value_type != ValueType::InstantVector {
        return Err(type_error(format!(
            "unary expression only allowed on expressions of type scalar or instant vector, got {value_type}"
        )));
    }
    Ok(Expr::UnaryOperator(UnaryExpr {
        expr: Box::new(expr),
    }))
}

fn check_ast_for_aggregate_expr(mut ex: AggregationExpr) -> ParseResult<Expr> {
    ex.expr = Box::new(check_ast(*ex.expr)?);
    expect_type(
        ValueType::InstantVector,
        ex.expr.return_type(),
        "aggregation expression",
    )?;

    if let Some(param) = ex.param.take() {
        let param = check_ast(*param)?;
        if let Some(expected) = ex.function.param_type() {
            expect_type(expected, param.return_type(), "aggregation parameter")?;
        }
        ex.param = Some(Box::new(param));
    }

    Ok(Expr::Aggregation(ex))
}

fn check_ast_for_call(mut ex: FunctionExpr) -> ParseResult<Expr> {
    let signature = lookup_function(&ex.name)?;

    let args = std::mem::take(&mut ex.args);
    let mut checked = Vec::with_capacity(args.len());
    for (i, arg) in args.into_iter().enumerate() {
        let arg = check_ast(arg)?;
        if let Some(expected) = signature.arg_type(i) {
            let context = format!("call to function {:?}", ex.name);
            expect_type(expected, arg.return_type(), &context)?;
        }
        checked.push(arg);
    }
    ex.args = checked;

    Ok(Expr::Function(ex))
}

fn check_ast_for_parens(ex: ParensExpr) -> ParseResult<Expr> {
    let expr = check_ast(*ex.expr)?;
    Ok(Expr::Parens(ParensExpr::new(expr)))
}

fn check_ast_for_rollup(mut ex: RollupExpr) -> ParseResult<Expr> {
    ex.expr = Box::new(check_ast(*ex.expr)?);
    if ex.is_subquery() {
        let value_type = ex.expr.return_type();
        if value_type != ValueType::InstantVector {
            return Err(type_error(format!(
                "subquery is only allowed on instant vector, got {value_type} instead"
            )));
        }
    }
    Ok(Expr::Rollup(ex))
}

/// the original logic is redundant in
/// prometheus, and the following coding blocks
/// have been optimized for readability, but all logic SHOULD be covered.
fn check_ast_for_binary_expr(mut ex: BinaryExpr) -> ParseResult<Expr> {
    use ValueType::*;

    ex.left = Box::new(check_ast(*ex.left)?);
    ex.right = Box::new(check_ast(*ex.right)?);

    let operator = ex.op;
    let is_comparison = operator.is_comparison();

    let left_type = ex.left.return_type();
    let right_type = ex.right.return_type();

    if ex.returns_bool() && !is_comparison {
        return Err(type_error(
            "bool modifier can only be used on comparisons".into(),
        ));
    }

    if is_comparison && !ex.returns_bool() && left_type == Scalar && right_type == Scalar {
        return Err(type_error(
            "comparisons between scalars must use BOOL modifier".into(),
        ));
    }

    if operator.is_set_operator() {
        let modifier = ex.modifier.get_or_insert_with(BinModifier::default);
        if modifier.card == VectorMatchCardinality::OneToOne {
            modifier.card = VectorMatchCardinality::ManyToMany;
        }
    }

    // For `on` matching, a label can only appear in one of the lists.
    // Every time series of the result vector must be uniquely identifiable.
    if let Some(label) = on_and_group_overlap(ex.modifier.as_ref()) {
        return Err(type_error(format!(
            "label {label:?} must not occur in ON and GROUP clause at once"
        )));
    }

    let valid_types = [Scalar, InstantVector];
    if !valid_types.contains(&left_type) || !valid_types.contains(&right_type) {
        return Err(type_error(
            "binary expression must contain only scalar and instant vector types".into(),
        ));
    }

    if left_type != InstantVector || right_type != InstantVector {
        if let Some(modifier) = &ex.modifier {
            if has_matching_labels(modifier) {
                return Err(type_error(
                    "vector matching only allowed between instant vectors".into(),
                ));
            }
        }
    } else if operator.is_set_operator() {
        if let Some(modifier) = &ex.modifier {
            if matches!(
                modifier.card,
                VectorMatchCardinality::OneToMany(_) | VectorMatchCardinality::ManyToOne(_)
            ) {
                return Err(type_error(format!(
                    "no grouping allowed for \"{operator}\" operation"
                )));
            }
        }
    }

    if (left_type == Scalar || right_type == Scalar) && operator.is_set_operator() {
        return Err(type_error(format!(
            "set operator \"{operator}\" not allowed in binary scalar expression"
        )));
    }

    Ok(Expr::BinaryOperator(ex))
}

fn has_matching_labels(modifier: &BinModifier) -> bool {
    match &modifier.matching {
        Some(VectorMatchModifier::On(labels)) | Some(VectorMatchModifier::Ignoring(labels)) => {
            !labels.is_empty()
        }
        None => false,
    }
}

fn on_and_group_overlap(modifier: Option<&BinModifier>) -> Option<&str> {
    let modifier = modifier?;
    let on = match &modifier.matching {
        Some(VectorMatchModifier::On(labels)) => labels,
        _ => return None,
    };
    let include = match &modifier.card {
        VectorMatchCardinality::ManyToOne(labels) | VectorMatchCardinality::OneToMany(labels) => {
            labels
        }
        _ => return None,
    };
    on.iter()
        .find(|label| include.contains(label))
        .map(|label| label.as_str())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use crate::ast::{BinaryExpr, Expr, VectorMatchCardinality};
    use crate::parser::parse;

    #[test_case("foo + 1")]
    #[test_case("1 + 2")]
    #[test_case("1 == bool 2")]
    #[test_case("foo > bool 1")]
    #[test_case("foo and on(job) bar")]
    #[test_case("foo * on(job) group_left(instance) bar")]
    #[test_case("rate(foo[5m])")]
    #[test_case("round(foo, 0.5)")]
    #[test_case("label_join(up, \"dst\", \",\", \"a\", \"b\", \"c\")")]
    #[test_case("count_values(\"value\", foo)")]
    #[test_case("topk(5, foo)")]
    #[test_case("max_over_time(rate(foo[5m])[1h:1m])")]
    #[test_case("-foo")]
    #[test_case("time()")]
    fn test_valid_expressions(input: &str) {
        if let Err(err) = parse(input) {
            panic!("unexpected error for {input}: {err}")
        }
    }

    #[test_case("foo + bool bar", "bool modifier can only be used on comparisons")]
    #[test_case("1 > 2", "comparisons between scalars must use BOOL modifier")]
    #[test_case("1 and foo", "set operator \"and\" not allowed in binary scalar expression")]
    #[test_case("foo[5m] + 1", "binary expression must contain only scalar and instant vector types")]
    #[test_case("\"a\" + 1", "binary expression must contain only scalar and instant vector types")]
    #[test_case("1 + on(job) foo", "vector matching only allowed between instant vectors")]
    #[test_case("foo and on(job) group_left bar", "no grouping allowed for \"and\" operation")]
    #[test_case("foo * on(job) group_left(job) bar", "label \"job\" must not occur in ON and GROUP clause at once")]
    #[test_case("rate(foo)", "expected type range vector in call to function \"rate\", got instant vector")]
    #[test_case("abs(foo[5m])", "expected type instant vector in call to function \"abs\", got range vector")]
    #[test_case("round(foo, bar)", "expected type scalar in call to function \"round\", got instant vector")]
    #[test_case("sum(foo[5m])", "expected type instant vector in aggregation expression, got range vector")]
    #[test_case("topk(foo, bar)", "expected type scalar in aggregation parameter, got instant vector")]
    #[test_case("count_values(1, foo)", "expected type string in aggregation parameter, got scalar")]
    #[test_case("foo[5m][10m:1m]", "subquery is only allowed on instant vector, got range vector instead")]
    #[test_case("-foo[5m]", "unary expression only allowed on expressions of type scalar or instant vector, got range vector")]
    fn test_type_errors(input: &str, expected: &str) {
        let err = parse(input).unwrap_err();
        assert_eq!(err.to_string(), expected, "input: {input}");
    }

    #[test]
    fn test_set_operators_are_many_to_many() {
        let expr = parse("foo or bar").unwrap();
        let Expr::BinaryOperator(BinaryExpr { modifier, .. }) = expr else {
            panic!("expected binary expression")
        };
        assert_eq!(
            modifier.map(|m| m.card),
            Some(VectorMatchCardinality::ManyToMany)
        );
    }
}
