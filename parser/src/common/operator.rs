use std::fmt;

use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::parser::ParseError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    And,
    Atan2,
    Div,
    Eql,
    Mod,
    Mul,
    Pow,
    Sub,
    Gt,
    Gte,
    Lt,
    Lte,
    NotEq,
    Or,
    Unless,
}

pub static BINARY_OPS_MAP: phf::Map<&'static str, Operator> = phf_map! {
    "+" => Operator::Add,
    "-" => Operator::Sub,
    "*" => Operator::Mul,
    "/" => Operator::Div,
    "%" => Operator::Mod,
    "^" => Operator::Pow,

    // See https://github.com/prometheus/prometheus/pull/9248
    "atan2" => Operator::Atan2,

    // cmp ops
    "==" => Operator::Eql,
    "!=" => Operator::NotEq,
    "<" => Operator::Lt,
    ">" => Operator::Gt,
    "<=" => Operator::Lte,
    ">=" => Operator::Gte,

    // logic set ops
    "and" => Operator::And,
    "or" => Operator::Or,
    "unless" => Operator::Unless,
};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum BinaryOpKind {
    Arithmetic,
    Comparison,
    Set,
}

pub type Precedence = usize;

impl Operator {
    /// See https://prometheus.io/docs/prometheus/latest/querying/operators/#binary-operator-precedence
    #[inline]
    pub fn precedence(self) -> Precedence {
        use Operator::*;

        match self {
            Or => 10,
            And | Unless => 20,
            Eql | Gte | Gt | Lt | Lte | NotEq => 30,
            Add | Sub => 40,
            Mul | Div | Mod | Atan2 => 50,
            Pow => 60,
        }
    }

    #[inline]
    pub fn kind(self) -> BinaryOpKind {
        use BinaryOpKind::*;
        use Operator::*;

        match self {
            Add | Sub | Mul | Div | Mod | Pow | Atan2 => Arithmetic,
            Eql | Gte | Gt | Lt | Lte | NotEq => Comparison,
            And | Unless | Or => Set,
        }
    }

    pub fn is_right_associative(self) -> bool {
        self == Operator::Pow
    }

    pub fn is_comparison(&self) -> bool {
        self.kind() == BinaryOpKind::Comparison
    }

    pub fn is_set_operator(&self) -> bool {
        self.kind() == BinaryOpKind::Set
    }

    pub fn as_str(&self) -> &'static str {
        use Operator::*;
        match self {
            Add => "+",
            And => "and",
            Atan2 => "atan2",
            Div => "/",
            Eql => "==",
            Mod => "%",
            Mul => "*",
            Pow => "^",
            Sub => "-",
            Gt => ">",
            Gte => ">=",
            Lt => "<",
            Lte => "<=",
            NotEq => "!=",
            Or => "or",
            Unless => "unless",
        }
    }
}

impl TryFrom<&str> for Operator {
    type Error = ParseError;

    fn try_from(op: &str) -> Result<Self, Self::Error> {
        match BINARY_OPS_MAP.get(op) {
            Some(operator) => Ok(*operator),
            None => match BINARY_OPS_MAP.get(op.to_ascii_lowercase().as_str()) {
                Some(operator) => Ok(*operator),
                None => Err(ParseError::General(format!(
                    "unknown binary operator {}",
                    op
                ))),
            },
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
