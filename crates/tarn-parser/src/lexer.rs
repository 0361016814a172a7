//! Tokenization of Tarn source using logos.
//!
//! Comments and whitespace are skipped. Expression bodies are captured by
//! the parser as source slices, so the lexer only needs to recognise every
//! character that can appear in them, not to classify operators precisely.

use std::ops::Range;

use logos::{FilterResult, Lexer, Logos};

use crate::error::ParseError;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    /// `/* ... */`, never emitted
    #[token("/*", skip_block_comment)]
    BlockComment,

    // Declarations
    #[token("import")]
    Import,
    #[token("module")]
    Module,
    #[token("class")]
    Class,
    #[token("val")]
    Val,
    #[token("function")]
    Function,
    #[token("private")]
    Private,

    // Primitive types
    #[token("unit")]
    UnitType,
    #[token("int")]
    IntType,
    #[token("float")]
    FloatType,
    #[token("bool")]
    BoolType,
    #[token("char")]
    CharType,
    #[token("string")]
    StringType,

    // Delimiters
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("=")]
    Eq,
    #[token("->")]
    Arrow,

    /// Any other operator character
    #[regex(r"[+\-*/%!&|^~?.@\\]")]
    Symbol,

    // Literals
    #[regex(r"[0-9]+")]
    IntLiteral,
    #[regex(r"[0-9]+\.[0-9]+")]
    FloatLiteral,
    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLiteral,
    #[regex(r"'([^'\\]|\\.)'")]
    CharLiteral,

    /// Names of types, modules and classes
    #[regex(r"[A-Z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    UpperIdent(String),

    /// Names of values, functions and parameters
    #[regex(r"[a-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    LowerIdent(String),
}

/// Consume up to and including the closing `*/`. Comments do not nest.
fn skip_block_comment(lex: &mut Lexer<Token>) -> FilterResult<(), ()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(())
        }
    }
}

impl Token {
    /// Human readable form for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Token::UpperIdent(name) | Token::LowerIdent(name) => format!("identifier '{}'", name),
            Token::IntLiteral | Token::FloatLiteral => "number".to_string(),
            Token::StringLiteral => "string literal".to_string(),
            Token::CharLiteral => "character literal".to_string(),
            other => format!("{:?}", other),
        }
    }
}

pub type Spanned = (Token, Range<usize>);

/// Tokenize `source`, failing on the first character no token accepts
pub fn lex(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) if lexer.slice().starts_with("/*") => {
                return Err(ParseError::new("unterminated block comment", lexer.span()))
            }
            Err(()) => {
                return Err(ParseError::new(
                    format!("unexpected character '{}'", lexer.slice()),
                    lexer.span(),
                ))
            }
        }
    }
    Ok(tokens)
}
