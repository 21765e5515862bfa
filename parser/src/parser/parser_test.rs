#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use crate::ast::{AggregateModifier, AtModifier, Expr};
    use crate::common::Operator;
    use crate::label::LabelFilterOp;
    use crate::parser::{parse, ParseError, MAX_EXPR_DEPTH, MAX_NESTING_DEPTH};

    fn assert_parse(input: &str, expected: &str) {
        match parse(input) {
            Ok(expr) => assert_eq!(expr.to_string(), expected, "input: {input}"),
            Err(err) => panic!("error parsing {input}: {err}"),
        }
    }

    fn assert_error(input: &str, expected: &str) {
        match parse(input) {
            Ok(expr) => panic!("expected error for {input}, got {expr}"),
            Err(err) => assert_eq!(err.to_string(), expected, "input: {input}"),
        }
    }

    fn binary_op(expr: &Expr) -> Operator {
        match expr {
            Expr::BinaryOperator(be) => be.op,
            _ => panic!("expected binary expression, got {expr}"),
        }
    }

    #[test_case("foo", "foo")]
    #[test_case("job:http_requests:rate5m", "job:http_requests:rate5m")]
    #[test_case(r#"foo{bar="baz"}"#, r#"foo{bar="baz"}"#)]
    #[test_case(r#"foo{job=~"a|b",}"#, r#"foo{job=~"a|b"}"#)]
    #[test_case(r#"{__name__="foo", job!="x"}"#, r#"{__name__="foo", job!="x"}"#)]
    #[test_case(r#"foo{on="x", by!~'y'}"#, r#"foo{on="x", by!~"y"}"#)]
    #[test_case("foo{}", "foo")]
    fn test_selectors(input: &str, expected: &str) {
        assert_parse(input, expected);
    }

    #[test_case("rate(foo[5m])", "rate(foo[5m])")]
    #[test_case("foo[1h30m]", "foo[1h30m]")]
    #[test_case("foo[90m]", "foo[1h30m]")]
    #[test_case("foo offset 5m", "foo offset 5m")]
    #[test_case("foo offset -5m", "foo offset -5m")]
    #[test_case("foo[5m] offset 1h", "foo[5m] offset 1h")]
    #[test_case("foo @ 1609746000", "foo @ 1609746000")]
    #[test_case("foo @ start()", "foo @ start()")]
    #[test_case("foo offset 5m @ end()", "foo @ end() offset 5m")]
    #[test_case("foo[1h:]", "foo[1h:]")]
    #[test_case("max_over_time(rate(foo[5m])[1h:1m])", "max_over_time(rate(foo[5m])[1h:1m])")]
    #[test_case("min_over_time((foo + bar)[10m:] offset 1m)", "min_over_time((foo + bar)[10m:] offset 1m)")]
    fn test_rollups(input: &str, expected: &str) {
        assert_parse(input, expected);
    }

    #[test_case("sum by (job) (rate(foo[5m]))", "sum by (job) (rate(foo[5m]))")]
    #[test_case("sum(foo) without (job, instance)", "sum without (job, instance) (foo)")]
    #[test_case("SUM(foo)", "sum(foo)")]
    #[test_case("topk(5, foo)", "topk(5, foo)")]
    #[test_case(r#"count_values("value", foo)"#, r#"count_values("value", foo)"#)]
    #[test_case("sum by () (foo)", "sum by () (foo)")]
    #[test_case("count", "count")]
    fn test_aggregations(input: &str, expected: &str) {
        assert_parse(input, expected);
    }

    #[test_case("1", "1")]
    #[test_case("-1", "-1")]
    #[test_case("0x1F", "31")]
    #[test_case("1e3", "1000")]
    #[test_case(".5", "0.5")]
    #[test_case("Inf", "Inf")]
    #[test_case("-Inf", "-Inf")]
    #[test_case("NaN", "NaN")]
    #[test_case(r#""foo""#, r#""foo""#)]
    #[test_case(r#"'it\'s'"#, r#""it's""#)]
    #[test_case("`a\\b`", r#""a\\b""#)]
    fn test_literals(input: &str, expected: &str) {
        assert_parse(input, expected);
    }

    #[test_case("-foo", "-foo")]
    #[test_case("+foo", "foo")]
    #[test_case("(foo)", "(foo)")]
    #[test_case("foo == bool 1", "foo == bool 1")]
    #[test_case("foo * on(job) group_left(instance) bar", "foo * on (job) group_left (instance) bar")]
    #[test_case("foo / ignoring(a) group_right bar", "foo / ignoring (a) group_right () bar")]
    #[test_case("foo AND bar", "foo and bar")]
    #[test_case("foo atan2 bar", "foo atan2 bar")]
    #[test_case("up # the up metric\n  + 1", "up + 1")]
    fn test_operators(input: &str, expected: &str) {
        assert_parse(input, expected);
    }

    #[test]
    fn test_precedence() {
        let expr = parse("a + b * c").unwrap();
        let Expr::BinaryOperator(be) = &expr else {
            panic!("expected binary expression")
        };
        assert_eq!(be.op, Operator::Add);
        assert_eq!(binary_op(&be.right), Operator::Mul);

        let expr = parse("a * b + c").unwrap();
        let Expr::BinaryOperator(be) = &expr else {
            panic!("expected binary expression")
        };
        assert_eq!(be.op, Operator::Add);
        assert_eq!(binary_op(&be.left), Operator::Mul);

        let expr = parse("a or b and c").unwrap();
        let Expr::BinaryOperator(be) = &expr else {
            panic!("expected binary expression")
        };
        assert_eq!(be.op, Operator::Or);
        assert_eq!(binary_op(&be.right), Operator::And);

        let expr = parse("a > b + 1").unwrap();
        let Expr::BinaryOperator(be) = &expr else {
            panic!("expected binary expression")
        };
        assert_eq!(be.op, Operator::Gt);
        assert_eq!(binary_op(&be.right), Operator::Add);
    }

    #[test]
    fn test_associativity() {
        // left associative
        let expr = parse("a - b - c").unwrap();
        let Expr::BinaryOperator(be) = &expr else {
            panic!("expected binary expression")
        };
        assert_eq!(binary_op(&be.left), Operator::Sub);
        assert_eq!(be.right.to_string(), "c");

        // `^` is right associative
        let expr = parse("2 ^ 3 ^ 2").unwrap();
        let Expr::BinaryOperator(be) = &expr else {
            panic!("expected binary expression")
        };
        assert_eq!(be.left.to_string(), "2");
        assert_eq!(binary_op(&be.right), Operator::Pow);
    }

    #[test]
    fn test_unary_binds_looser_than_pow() {
        let expr = parse("-a ^ 2").unwrap();
        let Expr::UnaryOperator(ue) = &expr else {
            panic!("expected unary expression, got {expr:?}")
        };
        assert_eq!(binary_op(&ue.expr), Operator::Pow);

        let expr = parse("-a * 2").unwrap();
        let Expr::BinaryOperator(be) = &expr else {
            panic!("expected binary expression")
        };
        assert_eq!(be.op, Operator::Mul);
        assert!(matches!(*be.left, Expr::UnaryOperator(_)));
    }

    #[test]
    fn test_selector_fields() {
        let expr = parse(r#"node_cpu_seconds_total{mode="idle", __name__=~"x.*"}"#);
        // explicit name plus a __name__ matcher
        assert!(expr.is_err());

        let expr = parse(r#"{__name__="foo", job!~"a|b"}"#).unwrap();
        let Expr::MetricExpression(me) = expr else {
            panic!("expected selector")
        };
        assert_eq!(me.name, None);
        assert_eq!(me.matchers.len(), 2);
        assert_eq!(me.matchers[0].label, "__name__");
        assert_eq!(me.matchers[0].op, LabelFilterOp::Equal);
        assert_eq!(me.matchers[0].value, "foo");
        assert_eq!(me.matchers[1].op, LabelFilterOp::RegexNotEqual);

        let expr = parse(r#"up{job="api"}"#).unwrap();
        let Expr::MetricExpression(me) = expr else {
            panic!("expected selector")
        };
        assert_eq!(me.name.as_deref(), Some("up"));
        assert_eq!(me.matchers.len(), 1);
    }

    #[test]
    fn test_rollup_fields() {
        let expr = parse("foo[1h:5m] offset -30s @ 100.5").unwrap();
        let Expr::Rollup(re) = expr else {
            panic!("expected rollup")
        };
        assert_eq!(re.window.map(|d| d.millis), Some(3_600_000));
        assert_eq!(re.step.map(|d| d.millis), Some(300_000));
        assert!(!re.inherit_step);
        assert!(re.is_subquery());
        assert_eq!(re.offset.map(|d| d.millis), Some(-30_000));
        assert_eq!(re.at, Some(AtModifier::Timestamp(100_500)));
    }

    #[test]
    fn test_aggregation_fields() {
        let expr = parse("quantile without (instance) (0.9, foo)").unwrap();
        let Expr::Aggregation(ae) = expr else {
            panic!("expected aggregation")
        };
        assert_eq!(ae.name(), "quantile");
        assert_eq!(ae.param.map(|p| p.to_string()), Some("0.9".to_string()));
        assert_eq!(ae.expr.to_string(), "foo");
        assert_eq!(
            ae.modifier,
            Some(AggregateModifier::Without(vec!["instance".to_string()]))
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), Err(ParseError::EmptyInput));
        assert_eq!(parse("   # only a comment"), Err(ParseError::EmptyInput));
    }

    #[test_case("foo bar", "1:5: parse error: unexpected identifier \"bar\"")]
    #[test_case("foo +", "1:6: parse error: unexpected end of input")]
    #[test_case("5m", "1:1: parse error: unexpected duration \"5m\"")]
    #[test_case("not valid ((", "1:5: parse error: unexpected identifier \"valid\"")]
    #[test_case("sum(foo", "1:8: parse error: unexpected end of input in aggregation, expected \",\" or \")\"")]
    #[test_case("(foo", "1:5: parse error: unexpected end of input in paren expression, expected \")\"")]
    #[test_case("foo{job=}", "1:9: parse error: unexpected \"}\" in label matching, expected string")]
    #[test_case(r#"foo{job="api""#, "1:14: parse error: unexpected end of input in label matching, expected \",\" or \"}\"")]
    #[test_case("rate(foo[$__rate_interval])", "1:10: parse error: unexpected character: '$'")]
    fn test_syntax_errors(input: &str, expected: &str) {
        assert_error(input, expected);
    }

    #[test_case("{}", "1:1: parse error: vector selector must contain at least one non-empty matcher")]
    #[test_case(r#"{job=~".*"}"#, "1:1: parse error: vector selector must contain at least one non-empty matcher")]
    #[test_case(r#"foo{__name__="bar"}"#, "1:1: parse error: metric name must not be set twice: \"foo\" or \"bar\"")]
    #[test_case(r#"foo{__name__!="bar"}"#, "1:1: parse error: metric name must not be set twice: \"foo\" or \"bar\"" ; "negated name matcher")]
    #[test_case("foo(bar)", "1:1: parse error: unknown function with name \"foo\"")]
    #[test_case("rate(foo[5m], 1)", "1:1: parse error: expected 1 argument(s) in call to \"rate\", got 2")]
    #[test_case("(foo)[5m]", "1:6: parse error: ranges only allowed for vector selectors")]
    #[test_case("foo[5m][5m]", "1:8: parse error: ranges only allowed for vector selectors")]
    #[test_case("foo offset 5m [5m]", "1:15: parse error: no offset modifiers allowed before range")]
    #[test_case("sum(foo) offset 5m", "1:10: parse error: offset modifier must be preceded by an instant vector selector or range vector selector or a subquery")]
    #[test_case("foo offset 5m offset 1m", "1:15: parse error: offset may not be set multiple times")]
    #[test_case("foo @ 1 @ 2", "1:9: parse error: @ <timestamp> may not be set multiple times")]
    #[test_case("foo @ bar()", "1:7: parse error: unexpected identifier \"bar\" in @ modifier")]
    #[test_case("foo[0s]", "1:5: parse error: range duration must be greater than 0")]
    #[test_case("foo[5m:0s]", "1:8: parse error: subquery step duration must be greater than 0")]
    #[test_case("foo[5m1h]", "1:5: parse error: invalid duration: not a valid duration string: \"5m1h\"")]
    #[test_case("topk(foo)", "1:1: parse error: wrong number of arguments for aggregate expression provided, expected 2, got 1")]
    #[test_case("sum()", "1:1: parse error: no arguments for aggregate expression provided")]
    fn test_semantic_errors(input: &str, expected: &str) {
        assert_error(input, expected);
    }

    #[test]
    fn test_invalid_regex() {
        let err = parse(r#"foo{job=~"a("}"#).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("1:10: parse error: invalid regular expression"),
            "{err}"
        );
    }

    #[test]
    fn test_multiline_error_position() {
        assert_error("sum(\n  foo +\n)", "3:1: parse error: unexpected \")\"");
    }

    fn assert_too_deep(input: &str, limit: usize) {
        let err = parse(input).unwrap_err().to_string();
        let expected = format!("expression nesting too deep: exceeds maximum depth of {limit}");
        assert!(err.ends_with(&expected), "{err}");
    }

    #[test]
    fn test_nesting_limit() {
        let parens = MAX_NESTING_DEPTH - 1;
        let input = format!("{}foo{}", "(".repeat(parens), ")".repeat(parens));
        assert!(parse(&input).is_ok());

        let input = format!("{}foo{}", "(".repeat(1000), ")".repeat(1000));
        let err = parse(&input).unwrap_err().to_string();
        assert_eq!(
            err,
            format!(
                "1:{}: parse error: expression nesting too deep: exceeds maximum depth of {MAX_NESTING_DEPTH}",
                MAX_NESTING_DEPTH + 1
            )
        );
    }

    #[test_case(&"-".repeat(1000) ; "unary chain")]
    #[test_case(&"foo ^ ".repeat(1000) ; "right associative chain")]
    #[test_case(&"sum(".repeat(1000) ; "aggregation arguments")]
    #[test_case(&"abs(".repeat(1000) ; "function arguments")]
    fn test_nesting_limit_applies_to_all_recursion(prefix: &str) {
        assert_too_deep(&format!("{prefix}foo"), MAX_NESTING_DEPTH);
    }

    #[test]
    fn test_tree_height_limit() {
        let input = vec!["foo"; 400].join(" + ");
        let expr = parse(&input).unwrap();
        assert_eq!(expr.depth(), 400);

        assert_too_deep(&vec!["foo"; 2000].join(" + "), MAX_EXPR_DEPTH);
        assert_too_deep(&format!("foo{}", "[5m:]".repeat(2000)), MAX_EXPR_DEPTH);
    }

    #[test]
    fn test_expr_depth() {
        assert_eq!(parse("foo").unwrap().depth(), 1);
        assert_eq!(parse("sum(rate(foo[5m])) + 1").unwrap().depth(), 5);
        assert_eq!(parse("topk(3, (foo))").unwrap().depth(), 3);
    }
}
