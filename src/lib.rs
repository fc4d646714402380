pub mod lexer;
pub mod ast;
pub mod parser;
pub mod diagram;

pub use lexer::*;
pub use ast::*;
pub use parser::*;
pub use diagram::*;
