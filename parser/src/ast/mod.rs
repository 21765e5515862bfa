pub use check_ast::*;
pub use expr::*;
pub use visitor::*;

mod check_ast;
mod expr;
mod visitor;
