//! Lexer, parser and source acquisition for Tarn

pub mod error;
pub mod lexer;
pub mod parser;
pub mod source;

pub use error::ParseError;
pub use parser::parse;
pub use source::{SourceFile, SourceSet};
