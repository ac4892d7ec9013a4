//! Parser for the `{index:tag}` placeholder mini-language

pub mod ast;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::parse;
