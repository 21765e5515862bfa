pub use operator::*;
pub use value_type::*;

mod operator;
mod value_type;
