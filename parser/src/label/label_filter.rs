use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::parser::{compile_regexp, escape_ident, is_empty_regex, quote, ParseError, ParseResult};

/// The reserved label holding a series' metric name.
pub const NAME_LABEL: &str = "__name__";

pub type LabelName = String;

pub type LabelValue = String;

#[derive(
    Default, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash, Serialize, Deserialize,
)]
pub enum LabelFilterOp {
    #[default]
    Equal,
    NotEqual,
    RegexEqual,
    RegexNotEqual,
}

impl LabelFilterOp {
    pub fn is_negative(&self) -> bool {
        matches!(self, LabelFilterOp::NotEqual | LabelFilterOp::RegexNotEqual)
    }

    pub fn is_regex(&self) -> bool {
        matches!(
            self,
            LabelFilterOp::RegexEqual | LabelFilterOp::RegexNotEqual
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelFilterOp::Equal => "=",
            LabelFilterOp::NotEqual => "!=",
            LabelFilterOp::RegexEqual => "=~",
            LabelFilterOp::RegexNotEqual => "!~",
        }
    }
}

impl TryFrom<&str> for LabelFilterOp {
    type Error = ParseError;

    fn try_from(op: &str) -> Result<Self, Self::Error> {
        match op {
            "=" => Ok(LabelFilterOp::Equal),
            "!=" => Ok(LabelFilterOp::NotEqual),
            "=~" => Ok(LabelFilterOp::RegexEqual),
            "!~" => Ok(LabelFilterOp::RegexNotEqual),
            _ => Err(ParseError::General(format!(
                "Unexpected match op literal: {}",
                op
            ))),
        }
    }
}

impl fmt::Display for LabelFilterOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// LabelFilter represents a label matcher like `foo="bar"`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelFilter {
    pub op: LabelFilterOp,

    /// Label contains label name for the filter.
    pub label: String,

    /// Value contains unquoted value for the filter.
    pub value: String,
}

impl LabelFilter {
    pub fn new<N, V>(match_op: LabelFilterOp, label: N, value: V) -> ParseResult<Self>
    where
        N: Into<LabelName>,
        V: Into<LabelValue>,
    {
        let label = label.into();
        let value = value.into();

        if match_op.is_regex() {
            let re_anchored = format!("^(?:{})$", value);
            compile_regexp(&re_anchored)?;
        }

        Ok(Self {
            label,
            op: match_op,
            value,
        })
    }

    pub fn equal<S: Into<String>>(key: S, value: S) -> ParseResult<LabelFilter> {
        LabelFilter::new(LabelFilterOp::Equal, key, value)
    }

    pub fn regex_equal<S: Into<String>>(key: S, value: S) -> ParseResult<LabelFilter> {
        LabelFilter::new(LabelFilterOp::RegexEqual, key, value)
    }

    /// is_regexp represents whether the filter is regexp, i.e. `=~` or `!~`.
    pub fn is_regexp(&self) -> bool {
        self.op.is_regex()
    }

    /// is_negative represents whether the filter is negative, i.e. '!=' or '!~'.
    pub fn is_negative(&self) -> bool {
        self.op.is_negative()
    }

    pub fn is_name_label(&self) -> bool {
        self.label == NAME_LABEL
    }

    /// Vector selectors must either specify a name or at least one label
    /// matcher that does not match the empty string.
    ///
    /// The following expression is illegal:
    /// {job=~".*"} # Bad!
    pub fn is_empty_matcher(&self) -> bool {
        use LabelFilterOp::*;
        match self.op {
            Equal => self.value.is_empty(),
            NotEqual => !self.value.is_empty(),
            RegexEqual => is_empty_regex(&self.value),
            RegexNotEqual => !is_empty_regex(&self.value),
        }
    }
}

impl fmt::Display for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            escape_ident(&self.label),
            self.op,
            quote(&self.value)
        )?;
        Ok(())
    }
}

/// The ordered label filters of a selector, as written in the query.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Matchers(Vec<LabelFilter>);

impl Matchers {
    pub fn new(filters: Vec<LabelFilter>) -> Self {
        Matchers(filters)
    }

    pub fn push(&mut self, m: LabelFilter) {
        self.0.push(m);
    }

    /// find the first matcher on the given label, in written order.
    pub fn find_matcher(&self, name: &str) -> Option<&LabelFilter> {
        self.0.iter().find(|m| m.label == name)
    }

    /// find matchers whose name equals the specified name
    pub fn find_matchers(&self, name: &str) -> Vec<&LabelFilter> {
        self.0.iter().filter(|m| m.label == name).collect()
    }

    /// The first positive (`=` or `=~`) `__name__` matcher, if any. Negated
    /// matchers are passed over.
    pub fn name_matcher(&self) -> Option<&LabelFilter> {
        self.0
            .iter()
            .find(|m| m.is_name_label() && !m.is_negative())
    }

    pub fn is_empty_matchers(&self) -> bool {
        self.0.iter().all(|m| m.is_empty_matcher())
    }
}

impl Deref for Matchers {
    type Target = Vec<LabelFilter>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<LabelFilter>> for Matchers {
    fn from(filters: Vec<LabelFilter>) -> Self {
        Matchers(filters)
    }
}

impl fmt::Display for Matchers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, filter) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{filter}")?;
        }
        Ok(())
    }
}
