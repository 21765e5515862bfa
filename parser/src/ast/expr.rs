use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::common::{Operator, ValueType};
use crate::functions::{get_function, AggregateFunction, FunctionSignature};
use crate::label::{LabelFilter, Matchers};
use crate::parser::{escape_ident, format_duration, quote};

pub type BExpression = Box<Expr>;

/// NumberLiteral represents a scalar number, e.g. `1.5`, `0x1f` or `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub value: f64,
}

impl NumberLiteral {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Display for NumberLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.value.is_nan() {
            write!(f, "NaN")
        } else if self.value.is_infinite() {
            if self.value.is_sign_positive() {
                write!(f, "Inf")
            } else {
                write!(f, "-Inf")
            }
        } else {
            write!(f, "{}", self.value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
}

impl StringLiteral {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Display for StringLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.value))
    }
}

/// A duration in milliseconds, as written in range selectors, subqueries and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DurationExpr {
    pub millis: i64,
}

impl DurationExpr {
    pub fn new(millis: i64) -> Self {
        Self { millis }
    }
}

impl Display for DurationExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_duration(self.millis))
    }
}

/// The `@` modifier of a selector or subquery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtModifier {
    /// Unix timestamp in milliseconds.
    Timestamp(i64),
    Start,
    End,
}

impl Display for AtModifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AtModifier::Timestamp(ms) => {
                let secs = *ms as f64 / 1000.0;
                write!(f, "@ {secs}")
            }
            AtModifier::Start => write!(f, "@ start()"),
            AtModifier::End => write!(f, "@ end()"),
        }
    }
}

/// MetricExpr represents a vector selector, i.e. `foo{...}` or `{__name__="foo", ...}`.
///
/// `name` holds the bare metric name when one is written before the braces. It is not
/// copied into `matchers`, which hold exactly the label filters from the braces.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricExpr {
    pub name: Option<String>,
    pub matchers: Matchers,
}

impl MetricExpr {
    pub fn new<S: Into<String>>(name: S) -> MetricExpr {
        MetricExpr {
            name: Some(name.into()),
            matchers: Matchers::default(),
        }
    }

    pub fn with_filters(name: Option<String>, filters: Vec<LabelFilter>) -> Self {
        MetricExpr {
            name,
            matchers: Matchers::new(filters),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.matchers.is_empty()
    }

    pub fn has_explicit_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

impl Display for MetricExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{}", escape_ident(name))?;
            if self.matchers.is_empty() {
                return Ok(());
            }
        }
        write!(f, "{{{}}}", self.matchers)
    }
}

/// RollupExpr represents an expression which contains at least `offset`, `@` or `[...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupExpr {
    /// The expression for the rollup. A MetricExpr for range selectors, but may be arbitrary
    /// expr if subquery is used. https://prometheus.io/blog/2019/01/28/subquery-support/
    pub expr: BExpression,

    /// window contains optional window value from square brackets. Equivalent to `range` in
    /// prometheus terminology
    ///
    /// For example, `http_requests_total[5m]` will have window value `5m`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<DurationExpr>,

    /// step contains optional step value from square brackets. Equivalent to `resolution`
    /// in the prometheus docs
    ///
    /// For example, `foobar[1h:3m]` will have step value `3m`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<DurationExpr>,

    /// set for subqueries written without a step, i.e. `foo[1h:]`.
    #[serde(default)]
    pub inherit_step: bool,

    /// offset contains optional value from `offset` part.
    ///
    /// For example, `foobar{baz="aa"} offset 5m` will have offset value `5m`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<DurationExpr>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<AtModifier>,
}

impl RollupExpr {
    pub fn new(expr: Expr) -> Self {
        RollupExpr {
            expr: Box::new(expr),
            window: None,
            step: None,
            inherit_step: false,
            offset: None,
            at: None,
        }
    }

    pub fn is_subquery(&self) -> bool {
        self.step.is_some() || self.inherit_step
    }

    pub fn return_type(&self) -> ValueType {
        if self.window.is_some() {
            ValueType::RangeVector
        } else {
            self.expr.return_type()
        }
    }
}

impl Display for RollupExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let needs_parens = matches!(
            *self.expr,
            Expr::BinaryOperator(_) | Expr::UnaryOperator(_) | Expr::Rollup(_)
        );
        if needs_parens {
            write!(f, "({})", self.expr)?;
        } else {
            write!(f, "{}", self.expr)?;
        }

        if let Some(window) = &self.window {
            write!(f, "[{window}")?;
            if let Some(step) = &self.step {
                write!(f, ":{step}")?;
            } else if self.inherit_step {
                write!(f, ":")?;
            }
            write!(f, "]")?;
        }
        if let Some(at) = &self.at {
            write!(f, " {at}")?;
        }
        if let Some(offset) = &self.offset {
            write!(f, " offset {offset}")?;
        }
        Ok(())
    }
}

/// FunctionExpr represents a call of a builtin function, e.g. `rate(...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionExpr {
    pub name: String,

    /// Args contains function args.
    pub args: Vec<Expr>,
}

impl FunctionExpr {
    pub fn new<S: Into<String>>(name: S, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn signature(&self) -> Option<&'static FunctionSignature> {
        get_function(&self.name)
    }

    pub fn return_type(&self) -> ValueType {
        self.signature()
            .map(|sig| sig.return_type)
            .unwrap_or(ValueType::InstantVector)
    }
}

impl Display for FunctionExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_comma_separated(f, &self.args)?;
        write!(f, ")")
    }
}

/// `by (...)` or `without (...)` on an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateModifier {
    By(Vec<String>),
    Without(Vec<String>),
}

impl Display for AggregateModifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (keyword, labels) = match self {
            AggregateModifier::By(labels) => ("by", labels),
            AggregateModifier::Without(labels) => ("without", labels),
        };
        write!(f, "{keyword} ({})", labels.join(", "))
    }
}

/// AggregationExpr represents aggregation operators such as `sum(...) by (...)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationExpr {
    pub function: AggregateFunction,

    /// leading parameter of `topk`, `quantile`, `count_values` etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<BExpression>,

    /// the aggregated expression.
    pub expr: BExpression,

    /// optional modifier such as `by (...)` or `without (...)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<AggregateModifier>,
}

impl AggregationExpr {
    pub fn new(function: AggregateFunction, expr: Expr) -> Self {
        Self {
            function,
            param: None,
            expr: Box::new(expr),
            modifier: None,
        }
    }

    pub fn name(&self) -> String {
        self.function.name()
    }
}

impl Display for AggregationExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function)?;
        if let Some(modifier) = &self.modifier {
            write!(f, " {modifier} ")?;
        }
        write!(f, "(")?;
        if let Some(param) = &self.param {
            write!(f, "{param}, ")?;
        }
        write!(f, "{})", self.expr)
    }
}

/// UnaryExpr represents a negation, e.g. `-foo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub expr: BExpression,
}

impl Display for UnaryExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self.expr {
            Expr::BinaryOperator(_) => write!(f, "-({})", self.expr),
            _ => write!(f, "-{}", self.expr),
        }
    }
}

/// `on (...)` / `ignoring (...)` label lists of a vector matching binary operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorMatchModifier {
    On(Vec<String>),
    Ignoring(Vec<String>),
}

impl Display for VectorMatchModifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VectorMatchModifier::On(labels) => write!(f, "on ({})", labels.join(", ")),
            VectorMatchModifier::Ignoring(labels) => {
                write!(f, "ignoring ({})", labels.join(", "))
            }
        }
    }
}

/// The cardinality of a vector matching binary operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorMatchCardinality {
    #[default]
    OneToOne,
    /// `group_left(...)`
    ManyToOne(Vec<String>),
    /// `group_right(...)`
    OneToMany(Vec<String>),
    /// set operators
    ManyToMany,
}

/// Modifiers of a binary operation: `bool`, vector matching and grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinModifier {
    pub return_bool: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching: Option<VectorMatchModifier>,

    pub card: VectorMatchCardinality,
}

impl BinModifier {
    pub fn is_default(&self) -> bool {
        !self.return_bool
            && self.matching.is_none()
            && matches!(
                self.card,
                VectorMatchCardinality::OneToOne | VectorMatchCardinality::ManyToMany
            )
    }
}

impl Display for BinModifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.return_bool {
            write!(f, " bool")?;
        }
        if let Some(matching) = &self.matching {
            write!(f, " {matching}")?;
        }
        match &self.card {
            VectorMatchCardinality::ManyToOne(labels) => {
                write!(f, " group_left ({})", labels.join(", "))?
            }
            VectorMatchCardinality::OneToMany(labels) => {
                write!(f, " group_right ({})", labels.join(", "))?
            }
            _ => {}
        }
        Ok(())
    }
}

/// BinaryExpr represents a binary operation, e.g. `a + on(job) b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    /// left contains left arg for the `left op right` expression.
    pub left: BExpression,

    /// contains right arg for the `left op right` expression.
    pub right: BExpression,

    /// Op is the operation itself, i.e. `+`, `-`, `*`, etc.
    pub op: Operator,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<BinModifier>,
}

impl BinaryExpr {
    pub fn new(op: Operator, lhs: Expr, rhs: Expr) -> Self {
        BinaryExpr {
            op,
            left: Box::new(lhs),
            right: Box::new(rhs),
            modifier: None,
        }
    }

    pub fn returns_bool(&self) -> bool {
        self.modifier.as_ref().is_some_and(|m| m.return_bool)
    }

    pub fn return_type(&self) -> ValueType {
        if self.left.return_type() == ValueType::Scalar
            && self.right.return_type() == ValueType::Scalar
        {
            ValueType::Scalar
        } else {
            ValueType::InstantVector
        }
    }
}

impl Display for BinaryExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.left, self.op)?;
        if let Some(modifier) = &self.modifier {
            write!(f, "{modifier}")?;
        }
        write!(f, " {}", self.right)
    }
}

/// A grouped expression wrapped in parentheses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParensExpr {
    pub expr: BExpression,
}

impl ParensExpr {
    pub fn new(expr: Expr) -> Self {
        ParensExpr {
            expr: Box::new(expr),
        }
    }

    /// Strips any number of nested parentheses.
    pub fn innermost_expr(&self) -> &Expr {
        match self.expr.as_ref() {
            Expr::Parens(inner) => inner.innermost_expr(),
            expr => expr,
        }
    }
}

impl Display for ParensExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.expr)
    }
}

/// A PromQL expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A single scalar number.
    NumberLiteral(NumberLiteral),

    /// A single scalar string.
    ///
    /// Prometheus' docs claim strings aren't currently implemented, but they're
    /// valid as function arguments.
    StringLiteral(StringLiteral),

    /// MetricExpr represents a vector selector, i.e. `foo{...}`.
    MetricExpression(MetricExpr),

    /// RollupExpr represents an expression which contains at least `offset`, `@` or `[...]` part.
    Rollup(RollupExpr),

    /// A function call
    Function(FunctionExpr),

    /// Aggregation represents aggregate functions such as `sum(...) by (...)`
    Aggregation(AggregationExpr),

    /// A unary operator expression
    UnaryOperator(UnaryExpr),

    /// A binary operator expression
    BinaryOperator(BinaryExpr),

    /// A grouped expression wrapped in parentheses
    Parens(ParensExpr),
}

impl Expr {
    pub fn return_type(&self) -> ValueType {
        match self {
            Expr::NumberLiteral(_) => ValueType::Scalar,
            Expr::StringLiteral(_) => ValueType::String,
            Expr::MetricExpression(_) => ValueType::InstantVector,
            Expr::Rollup(re) => re.return_type(),
            Expr::Function(fe) => fe.return_type(),
            Expr::Aggregation(_) => ValueType::InstantVector,
            Expr::UnaryOperator(ue) => ue.expr.return_type(),
            Expr::BinaryOperator(be) => be.return_type(),
            Expr::Parens(pe) => pe.expr.return_type(),
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Expr::NumberLiteral(_) => "Scalar",
            Expr::StringLiteral(_) => "String",
            Expr::MetricExpression(_) => "Selector",
            Expr::Rollup(_) => "Rollup",
            Expr::Function(_) => "Function",
            Expr::Aggregation(_) => "Aggregation",
            Expr::UnaryOperator(_) => "UnaryOperator",
            Expr::BinaryOperator(_) => "BinaryOperator",
            Expr::Parens(_) => "Parens",
        }
    }

    pub fn is_metric_expression(&self) -> bool {
        matches!(self, Expr::MetricExpression(_))
    }

    /// Height of the tree rooted at this node. A leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1)];
        while let Some((expr, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(expr.children().into_iter().map(|child| (child, depth + 1)));
        }
        max
    }

    /// Direct children of this node, in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::NumberLiteral(_) | Expr::StringLiteral(_) | Expr::MetricExpression(_) => vec![],
            Expr::Rollup(re) => vec![re.expr.as_ref()],
            Expr::Function(fe) => fe.args.iter().collect(),
            Expr::Aggregation(ae) => {
                let mut children = Vec::with_capacity(2);
                if let Some(param) = &ae.param {
                    children.push(param.as_ref());
                }
                children.push(ae.expr.as_ref());
                children
            }
            Expr::UnaryOperator(ue) => vec![ue.expr.as_ref()],
            Expr::BinaryOperator(be) => vec![be.left.as_ref(), be.right.as_ref()],
            Expr::Parens(pe) => vec![pe.expr.as_ref()],
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::NumberLiteral(n) => write!(f, "{n}"),
            Expr::StringLiteral(s) => write!(f, "{s}"),
            Expr::MetricExpression(me) => write!(f, "{me}"),
            Expr::Rollup(re) => write!(f, "{re}"),
            Expr::Function(fe) => write!(f, "{fe}"),
            Expr::Aggregation(ae) => write!(f, "{ae}"),
            Expr::UnaryOperator(ue) => write!(f, "{ue}"),
            Expr::BinaryOperator(be) => write!(f, "{be}"),
            Expr::Parens(pe) => write!(f, "{pe}"),
        }
    }
}

impl From<MetricExpr> for Expr {
    fn from(me: MetricExpr) -> Self {
        Expr::MetricExpression(me)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::NumberLiteral(NumberLiteral::new(value))
    }
}

fn write_comma_separated<T: Display>(f: &mut Formatter<'_>, values: &[T]) -> fmt::Result {
    for (i, arg) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}
