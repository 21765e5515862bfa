#![forbid(unsafe_code)]
extern crate enquote;
extern crate logos;
extern crate phf;
extern crate regex;
extern crate serde;
extern crate strum;
extern crate strum_macros;
extern crate thiserror;

pub mod ast;
pub mod common;
pub mod functions;
pub mod label;
pub mod parser;

pub use parser::{parse, ParseError, ParseResult};

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::common::*;
    pub use crate::functions::*;
    pub use crate::label::*;
    pub use crate::parser::*;
}
