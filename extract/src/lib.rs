#![forbid(unsafe_code)]
extern crate ahash;
extern crate regex;
extern crate tracing;

pub use extract::*;
pub use macros::*;
pub use promdeps_parser as parser;

mod extract;
mod macros;
