use ahash::AHashSet;
use serde::Serialize;
use tracing::{debug, field, trace, trace_span};

use promdeps_parser::ast::{Expr, ExprVisitor, MetricExpr, Recursion};
use promdeps_parser::label::LabelFilterOp;
use promdeps_parser::ParseResult;

use crate::macros::normalize_macros;

/// The parse capability the extractor depends on.
pub trait QueryParser {
    fn parse(&self, text: &str) -> ParseResult<Expr>;
}

/// Parses PromQL with [`promdeps_parser::parse`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PromqlParser;

impl QueryParser for PromqlParser {
    fn parse(&self, text: &str) -> ParseResult<Expr> {
        promdeps_parser::parse(text)
    }
}

/// Unique metric names referenced by a batch of expressions, together with one
/// error string per input expression (empty when the expression parsed).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Metric names in first-seen order.
    pub metrics: Vec<String>,
    /// Index aligned with the input batch.
    pub errors: Vec<String>,
}

impl ExtractionResult {
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| !e.is_empty())
    }

    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| !e.is_empty()).count()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.metrics, self.errors)
    }
}

/// Returns the metric name a vector selector refers to.
///
/// An explicit name wins. Otherwise the first `=` or `=~` matcher on `__name__`
/// decides: equality yields its value, a regex yields nothing. Negated matchers
/// are passed over.
pub fn metric_name_of(me: &MetricExpr) -> Option<&str> {
    if me.has_explicit_name() {
        return me.name.as_deref();
    }
    let matcher = me.matchers.name_matcher()?;
    match matcher.op {
        LabelFilterOp::Equal if !matcher.value.is_empty() => Some(matcher.value.as_str()),
        _ => None,
    }
}

/// Ordered set of metric names, shared by all expressions of a batch.
#[derive(Default)]
struct MetricSet {
    seen: AHashSet<String>,
    metrics: Vec<String>,
}

impl MetricSet {
    fn insert(&mut self, name: &str) {
        if self.seen.contains(name) {
            return;
        }
        trace!(metric = name, "new metric reference");
        self.seen.insert(name.to_string());
        self.metrics.push(name.to_string());
    }
}

struct MetricCollector<'a> {
    set: &'a mut MetricSet,
}

impl ExprVisitor for MetricCollector<'_> {
    fn pre_visit(self, expr: &Expr) -> ParseResult<Recursion<Self>> {
        if let Expr::MetricExpression(me) = expr {
            if let Some(name) = metric_name_of(me) {
                self.set.insert(name);
            }
        }
        Ok(Recursion::Continue(self))
    }
}

/// Extracts metric references from batches of expressions using a [`QueryParser`].
#[derive(Debug, Default, Clone)]
pub struct MetricExtractor<P = PromqlParser> {
    parser: P,
}

impl<P: QueryParser> MetricExtractor<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Extracts the unique metric names referenced by `exprs`.
    ///
    /// Expressions are processed in order. An expression that fails to parse records
    /// its error at its own index and contributes no metrics; it never stops the batch.
    pub fn extract<S: AsRef<str>>(&self, exprs: &[S]) -> ExtractionResult {
        let span = trace_span!(
            "extract_metric_names",
            exprs = exprs.len(),
            metrics = field::Empty
        )
        .entered();

        let mut set = MetricSet::default();
        let mut errors = Vec::with_capacity(exprs.len());

        for (index, expr) in exprs.iter().enumerate() {
            let normalized = normalize_macros(expr.as_ref());
            let error = match self.collect(&normalized, &mut set) {
                Ok(()) => String::new(),
                Err(err) => {
                    debug!(index, error = %err, "failed to parse expression");
                    err.to_string()
                }
            };
            errors.push(error);
        }

        span.record("metrics", set.metrics.len());

        ExtractionResult {
            metrics: set.metrics,
            errors,
        }
    }

    fn collect(&self, text: &str, set: &mut MetricSet) -> ParseResult<()> {
        let ast = self.parser.parse(text)?;
        ast.accept(MetricCollector { set })?;
        Ok(())
    }
}

/// Extracts the unique metric names referenced by `exprs` with the PromQL parser.
pub fn extract_metric_names<S: AsRef<str>>(exprs: &[S]) -> ExtractionResult {
    MetricExtractor::new(PromqlParser).extract(exprs)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use promdeps_parser::ParseError;

    use super::*;

    fn metrics_of(exprs: &[&str]) -> Vec<String> {
        let result = extract_metric_names(exprs);
        assert!(!result.has_errors(), "unexpected errors: {:?}", result.errors);
        result.metrics
    }

    #[test]
    fn test_mixed_batch() {
        let exprs = [
            "up",
            r#"node_cpu_seconds_total{mode="idle"}"#,
            r#"{__name__="foo"}"#,
            r#"{__name__=~"foo.*"}"#,
            "not valid ((",
        ];
        let result = extract_metric_names(&exprs);
        assert_eq!(result.metrics, vec!["up", "node_cpu_seconds_total", "foo"]);
        assert_eq!(result.errors.len(), exprs.len());
        assert_eq!(&result.errors[..4], &["", "", "", ""]);
        assert!(!result.errors[4].is_empty());
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_empty_batch() {
        let exprs: [&str; 0] = [];
        let result = extract_metric_names(&exprs);
        assert_eq!(result, ExtractionResult::default());
    }

    #[test]
    fn test_first_seen_order_across_batch() {
        let metrics = metrics_of(&["sum(b) + a", "a + c", "rate(d[5m]) / b"]);
        assert_eq!(metrics, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_name_and_name_matcher_dedupe() {
        let metrics = metrics_of(&["foo", r#"{__name__="foo", job="api"}"#, "rate(foo[1m])"]);
        assert_eq!(metrics, vec!["foo"]);
    }

    #[test_case(r#"{__name__=~"foo.*"}"# ; "regex")]
    #[test_case(r#"{__name__!="foo"}"# ; "not equal")]
    #[test_case(r#"{__name__!~"foo.*", job="api"}"# ; "regex not equal")]
    #[test_case(r#"{__name__=~"x.*", __name__="foo"}"# ; "only the first name matcher counts")]
    #[test_case(r#"{__name__=~"x.*", __name__!="y", __name__="foo"}"# ; "regex before negated and equal")]
    #[test_case("1 + 2" ; "no selectors")]
    #[test_case(r#"label_join(vector(1), "a", ",", "b")"# ; "selector free function")]
    fn test_no_reference(expr: &str) {
        assert_eq!(metrics_of(&[expr]), Vec::<String>::new());
    }

    #[test_case("sum by (job) (rate(http_requests_total[5m]))", &["http_requests_total"])]
    #[test_case("max_over_time(deriv(rpc_latency[5m])[1h:1m])", &["rpc_latency"])]
    #[test_case("-errors_total offset 1h", &["errors_total"])]
    #[test_case("a * on(job) group_left(instance) b", &["a", "b"])]
    #[test_case("topk(scalar(limit_value), (requests))", &["limit_value", "requests"])]
    #[test_case("histogram_quantile(0.9, sum by (le) (rate(lat_bucket[5m] @ end())))", &["lat_bucket"])]
    #[test_case("job:requests:rate5m > bool 10", &["job:requests:rate5m"])]
    #[test_case(r#"{__name__!="x", __name__="foo"}"#, &["foo"] ; "negated then equal")]
    #[test_case(r#"{__name__!~"x.*", job="api", __name__="foo"}"#, &["foo"] ; "negated regex then equal")]
    fn test_nested_references(expr: &str, expected: &[&str]) {
        assert_eq!(metrics_of(&[expr]), expected);
    }

    #[test]
    fn test_macros_are_normalized_before_parsing() {
        let expr = "rate(x[$__rate_interval])";
        assert!(promdeps_parser::parse(expr).is_err());

        let result = extract_metric_names(&[expr]);
        assert_eq!(result.metrics, vec!["x"]);
        assert_eq!(result.errors, vec![""]);
    }

    #[test]
    fn test_parse_error_does_not_abort_batch() {
        let result = extract_metric_names(&["a", "sum(", "b", "", "c{"]);
        assert_eq!(result.metrics, vec!["a", "b"]);
        assert_eq!(result.errors.len(), 5);
        assert_eq!(result.errors[0], "");
        assert!(!result.errors[1].is_empty());
        assert_eq!(result.errors[2], "");
        assert_eq!(result.errors[3], "no expression found in input");
        assert!(!result.errors[4].is_empty());
    }

    #[test]
    fn test_deep_nesting_is_a_per_expression_error() {
        let nested = format!("{}a{}", "(".repeat(1000), ")".repeat(1000));
        let chained = vec!["b"; 5000].join(" + ");
        let exprs = [
            "up".to_string(),
            nested,
            chained,
            format!("{}c{}", "(".repeat(50), ")".repeat(50)),
        ];
        let result = extract_metric_names(&exprs);
        assert_eq!(result.metrics, vec!["up", "c"]);
        assert_eq!(result.errors.len(), 4);
        assert_eq!(result.errors[0], "");
        assert!(result.errors[1].contains("expression nesting too deep"), "{}", result.errors[1]);
        assert!(result.errors[2].contains("expression nesting too deep"), "{}", result.errors[2]);
        assert_eq!(result.errors[3], "");
    }

    #[test]
    fn test_metric_name_of() {
        let cases = [
            ("foo", Some("foo")),
            (r#"foo{job="api"}"#, Some("foo")),
            (r#"{__name__="bar"}"#, Some("bar")),
            (r#"{job="api", __name__="bar"}"#, Some("bar")),
            (r#"{__name__=~"bar"}"#, None),
            (r#"{__name__!="x", __name__="bar"}"#, Some("bar")),
            (r#"{__name__!="x", job="api"}"#, None),
            (r#"{job="api"}"#, None),
        ];
        for (input, expected) in cases {
            let Ok(Expr::MetricExpression(me)) = promdeps_parser::parse(input) else {
                panic!("expected selector for {input}")
            };
            assert_eq!(metric_name_of(&me), expected, "input: {input}");
        }
    }

    /// Fails on any text containing "boom"; otherwise delegates to the PromQL parser.
    struct FlakyParser;

    impl QueryParser for FlakyParser {
        fn parse(&self, text: &str) -> ParseResult<Expr> {
            if text.contains("boom") {
                return Err(ParseError::General("boom".to_string()));
            }
            PromqlParser.parse(text)
        }
    }

    #[test]
    fn test_custom_parser() {
        let extractor = MetricExtractor::new(FlakyParser);
        let result = extractor.extract(&["a + boom", "b"]);
        assert_eq!(result.metrics, vec!["b"]);
        assert_eq!(result.errors, vec!["boom", ""]);
        assert!(result.has_errors());

        let (metrics, errors) = result.into_parts();
        assert_eq!(metrics.len(), 1);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_extracts_from_owned_strings() {
        let exprs = vec!["up".to_string(), "up".to_string()];
        let result = MetricExtractor::<PromqlParser>::default().extract(&exprs);
        assert_eq!(result.metrics, vec!["up"]);
        assert_eq!(result.errors, vec!["", ""]);
    }

    #[test]
    fn test_result_serializes() {
        let result = extract_metric_names(&["up"]);
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"metrics":["up"],"errors":[""]}"#);
    }
}
