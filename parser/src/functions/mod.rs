use std::fmt;

use phf::phf_map;

pub use aggregate::*;

use crate::common::ValueType;
use crate::parser::{ParseError, ParseResult};

mod aggregate;

const S: ValueType = ValueType::Scalar;
const STR: ValueType = ValueType::String;
const V: ValueType = ValueType::InstantVector;
const M: ValueType = ValueType::RangeVector;

/// FunctionSignature describes a builtin function: its argument types and the type it returns.
///
/// `variadic` follows the Prometheus convention:
/// * `0` - exactly `arg_types.len()` args
/// * `n > 0` - the last arg may be omitted and up to `n` args may follow the fixed ones
/// * `-1` - the last arg type may repeat any number of times
#[derive(Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub arg_types: &'static [ValueType],
    pub variadic: i32,
    pub return_type: ValueType,
}

impl FunctionSignature {
    pub fn min_args(&self) -> usize {
        if self.variadic == 0 {
            self.arg_types.len()
        } else {
            self.arg_types.len().saturating_sub(1)
        }
    }

    /// Upper bound on argument count, `None` when unbounded.
    pub fn max_args(&self) -> Option<usize> {
        match self.variadic {
            0 => Some(self.arg_types.len()),
            n if n > 0 => Some(self.min_args() + n as usize),
            _ => None,
        }
    }

    /// The expected type of the argument at `index`.
    pub fn arg_type(&self, index: usize) -> Option<ValueType> {
        if index < self.arg_types.len() {
            return Some(self.arg_types[index]);
        }
        if self.variadic == 0 {
            return None;
        }
        self.arg_types.last().copied()
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.arg_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        if self.variadic != 0 {
            write!(f, "...")?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

macro_rules! func {
    ($name:literal, [$($arg:expr),*], $variadic:expr, $ret:expr) => {
        FunctionSignature {
            name: $name,
            arg_types: &[$($arg),*],
            variadic: $variadic,
            return_type: $ret,
        }
    };
}

static FUNCTIONS: phf::Map<&'static str, FunctionSignature> = phf_map! {
    "abs" => func!("abs", [V], 0, V),
    "absent" => func!("absent", [V], 0, V),
    "absent_over_time" => func!("absent_over_time", [M], 0, V),
    "acos" => func!("acos", [V], 0, V),
    "acosh" => func!("acosh", [V], 0, V),
    "asin" => func!("asin", [V], 0, V),
    "asinh" => func!("asinh", [V], 0, V),
    "atan" => func!("atan", [V], 0, V),
    "atanh" => func!("atanh", [V], 0, V),
    "avg_over_time" => func!("avg_over_time", [M], 0, V),
    "ceil" => func!("ceil", [V], 0, V),
    "changes" => func!("changes", [M], 0, V),
    "clamp" => func!("clamp", [V, S, S], 0, V),
    "clamp_max" => func!("clamp_max", [V, S], 0, V),
    "clamp_min" => func!("clamp_min", [V, S], 0, V),
    "cos" => func!("cos", [V], 0, V),
    "cosh" => func!("cosh", [V], 0, V),
    "count_over_time" => func!("count_over_time", [M], 0, V),
    "day_of_month" => func!("day_of_month", [V], 1, V),
    "day_of_week" => func!("day_of_week", [V], 1, V),
    "day_of_year" => func!("day_of_year", [V], 1, V),
    "days_in_month" => func!("days_in_month", [V], 1, V),
    "deg" => func!("deg", [V], 0, V),
    "delta" => func!("delta", [M], 0, V),
    "deriv" => func!("deriv", [M], 0, V),
    "double_exponential_smoothing" => func!("double_exponential_smoothing", [M, S, S], 0, V),
    "exp" => func!("exp", [V], 0, V),
    "floor" => func!("floor", [V], 0, V),
    "histogram_avg" => func!("histogram_avg", [V], 0, V),
    "histogram_count" => func!("histogram_count", [V], 0, V),
    "histogram_fraction" => func!("histogram_fraction", [S, S, V], 0, V),
    "histogram_quantile" => func!("histogram_quantile", [S, V], 0, V),
    "histogram_stddev" => func!("histogram_stddev", [V], 0, V),
    "histogram_stdvar" => func!("histogram_stdvar", [V], 0, V),
    "histogram_sum" => func!("histogram_sum", [V], 0, V),
    "holt_winters" => func!("holt_winters", [M, S, S], 0, V),
    "hour" => func!("hour", [V], 1, V),
    "idelta" => func!("idelta", [M], 0, V),
    "increase" => func!("increase", [M], 0, V),
    "irate" => func!("irate", [M], 0, V),
    "label_join" => func!("label_join", [V, STR, STR, STR], -1, V),
    "label_replace" => func!("label_replace", [V, STR, STR, STR, STR], 0, V),
    "last_over_time" => func!("last_over_time", [M], 0, V),
    "ln" => func!("ln", [V], 0, V),
    "log10" => func!("log10", [V], 0, V),
    "log2" => func!("log2", [V], 0, V),
    "mad_over_time" => func!("mad_over_time", [M], 0, V),
    "max_over_time" => func!("max_over_time", [M], 0, V),
    "min_over_time" => func!("min_over_time", [M], 0, V),
    "minute" => func!("minute", [V], 1, V),
    "month" => func!("month", [V], 1, V),
    "pi" => func!("pi", [], 0, S),
    "predict_linear" => func!("predict_linear", [M, S], 0, V),
    "present_over_time" => func!("present_over_time", [M], 0, V),
    "quantile_over_time" => func!("quantile_over_time", [S, M], 0, V),
    "rad" => func!("rad", [V], 0, V),
    "rate" => func!("rate", [M], 0, V),
    "resets" => func!("resets", [M], 0, V),
    "round" => func!("round", [V, S], 1, V),
    "scalar" => func!("scalar", [V], 0, S),
    "sgn" => func!("sgn", [V], 0, V),
    "sin" => func!("sin", [V], 0, V),
    "sinh" => func!("sinh", [V], 0, V),
    "sort" => func!("sort", [V], 0, V),
    "sort_by_label" => func!("sort_by_label", [V, STR], -1, V),
    "sort_by_label_desc" => func!("sort_by_label_desc", [V, STR], -1, V),
    "sort_desc" => func!("sort_desc", [V], 0, V),
    "sqrt" => func!("sqrt", [V], 0, V),
    "stddev_over_time" => func!("stddev_over_time", [M], 0, V),
    "stdvar_over_time" => func!("stdvar_over_time", [M], 0, V),
    "sum_over_time" => func!("sum_over_time", [M], 0, V),
    "tan" => func!("tan", [V], 0, V),
    "tanh" => func!("tanh", [V], 0, V),
    "time" => func!("time", [], 0, S),
    "timestamp" => func!("timestamp", [V], 0, V),
    "vector" => func!("vector", [S], 0, V),
    "year" => func!("year", [V], 1, V),
};

/// Looks up a builtin function by its (case-sensitive) name.
pub fn get_function(name: &str) -> Option<&'static FunctionSignature> {
    FUNCTIONS.get(name)
}

pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains_key(name)
}

pub(crate) fn lookup_function(name: &str) -> ParseResult<&'static FunctionSignature> {
    get_function(name).ok_or_else(|| ParseError::InvalidFunction(name.to_string()))
}
