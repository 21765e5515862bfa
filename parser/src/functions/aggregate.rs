//! AggregateFunction module contains enum for available aggregation operators.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::common::ValueType;

/// Aggregation operators
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AggregateFunction {
    /// calculate sum over dimensions
    Sum,
    /// calculate the average over dimensions
    Avg,
    /// count the number of elements in the vector
    Count,
    /// calculate minimum over dimensions
    Min,
    /// calculate maximum over dimensions
    Max,
    /// all values in the resulting vector are 1
    Group,
    /// calculate population standard deviation over dimensions
    Stddev,
    /// calculate population standard variance over dimensions
    Stdvar,
    /// largest k elements by sample value
    Topk,
    /// smallest k elements by sample value
    Bottomk,
    /// calculate φ-quantile (0 ≤ φ ≤ 1) over dimensions
    Quantile,
    /// count the number of elements with the same value
    CountValues,
    /// sample k elements
    Limitk,
    /// sample elements with approximately the given ratio
    LimitRatio,
}

impl AggregateFunction {
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// The type of the leading parameter, for operators which take one.
    pub fn param_type(&self) -> Option<ValueType> {
        use AggregateFunction::*;
        match self {
            Topk | Bottomk | Quantile | Limitk | LimitRatio => Some(ValueType::Scalar),
            CountValues => Some(ValueType::String),
            _ => None,
        }
    }

    pub fn has_param(&self) -> bool {
        self.param_type().is_some()
    }
}
