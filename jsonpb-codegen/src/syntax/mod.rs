//! Go syntax tree model, parser and printer

mod parser;
mod printer;
mod tree;

pub use parser::parse;
pub use printer::print;
pub use tree::*;
