//! Parser for AQA pseudocode: turns the lexer's token stream into an AST.

pub mod errors;
pub mod parser;

mod precedence;

pub use errors::ParseError;
pub use parser::Parser;
