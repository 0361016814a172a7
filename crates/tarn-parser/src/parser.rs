//! Recursive-descent parser from tokens to a [`CompilationUnit`]
//!
//! ```text
//! unit      := import* construct EOF
//! import    := "import" UpperIdent ";"?
//! construct := ("module" | "class") UpperIdent typeParams? "{" member* "}"
//! member    := "private"? (constant | function) ";"? | construct
//! constant  := "val" ident (":" type)? "=" expr
//! function  := "function" ident typeParams? "(" params? ")" ":" type "=" expr
//! ```
//!
//! An expression runs until the next member keyword, `;` or closing `}` at
//! nesting depth zero and is kept as source text.

use std::collections::BTreeSet;
use std::ops::Range;

use tarn_core::ast::{
    CompilationUnit, ConstantDefinition, Construct, ConstructKind, FunctionDefinition, Parameter,
    PrimitiveType, TypeAnnotation, Visibility,
};

use crate::error::ParseError;
use crate::lexer::{lex, Spanned, Token};

/// Deepest nesting of constructs or type annotations accepted
pub const MAX_NESTING: usize = 256;

/// Parse the text of one source file
pub fn parse(source: &str) -> Result<CompilationUnit, ParseError> {
    let tokens = lex(source)?;
    Parser::new(source, tokens).parse_unit()
}

pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, tokens: Vec<Spanned>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    pub fn parse_unit(&mut self) -> Result<CompilationUnit, ParseError> {
        let mut imports = BTreeSet::new();
        while self.eat(&Token::Import) {
            let (name, span) = self.expect_upper("module or class name after 'import'")?;
            if !imports.insert(name.clone()) {
                tracing::debug!("Duplicate import of {} at {:?}", name, span);
            }
            self.eat(&Token::Semicolon);
        }

        let body = self.parse_construct()?;

        if let Some((token, span)) = self.peek_spanned() {
            return Err(ParseError::new(
                format!(
                    "unexpected {} after the top-level {}; a file declares exactly one construct",
                    token.describe(),
                    body.kind
                ),
                span,
            ));
        }

        Ok(CompilationUnit::new(imports, body))
    }

    fn parse_construct(&mut self) -> Result<Construct, ParseError> {
        self.descend()?;
        let construct = self.parse_construct_body();
        self.depth -= 1;
        construct
    }

    fn parse_construct_body(&mut self) -> Result<Construct, ParseError> {
        let kind = match self.peek() {
            Some(Token::Module) => ConstructKind::Module,
            Some(Token::Class) => ConstructKind::Class,
            _ => return Err(self.unexpected("'module' or 'class'")),
        };
        self.bump();

        let (name, _) = self.expect_upper("construct name")?;
        let mut construct = Construct::empty(name, kind);
        construct.type_parameters = self.parse_type_parameters()?;

        self.expect(&Token::LBrace, "'{'")?;
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.bump();
                    break;
                }
                Some(Token::Module) | Some(Token::Class) => {
                    construct.nested.push(self.parse_construct()?);
                }
                Some(_) => self.parse_member(&mut construct)?,
                None => return Err(self.unexpected("'}'")),
            }
        }
        Ok(construct)
    }

    fn parse_member(&mut self, construct: &mut Construct) -> Result<(), ParseError> {
        let visibility = if self.eat(&Token::Private) {
            Visibility::Private
        } else {
            Visibility::Public
        };

        match self.peek() {
            Some(Token::Val) => {
                self.bump();
                let constant = self.parse_constant(visibility)?;
                construct.constants.push(constant);
            }
            Some(Token::Function) => {
                self.bump();
                let function = self.parse_function(visibility)?;
                construct.functions.push(function);
            }
            _ => return Err(self.unexpected("'val' or 'function'")),
        }
        self.eat(&Token::Semicolon);
        Ok(())
    }

    fn parse_constant(&mut self, visibility: Visibility) -> Result<ConstantDefinition, ParseError> {
        let name = self.expect_lower("constant name")?;
        let annotation = if self.eat(&Token::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(&Token::Eq, "'='")?;
        let value = self.parse_expression()?;
        Ok(ConstantDefinition {
            name,
            visibility,
            annotation,
            value,
        })
    }

    fn parse_function(&mut self, visibility: Visibility) -> Result<FunctionDefinition, ParseError> {
        let name = self.expect_lower("function name")?;
        let type_parameters = self.parse_type_parameters()?;

        self.expect(&Token::LParen, "'('")?;
        let mut parameters = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                let name = self.expect_lower("parameter name")?;
                self.expect(&Token::Colon, "':'")?;
                let annotation = self.parse_type()?;
                parameters.push(Parameter { name, annotation });
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen, "',' or ')'")?;
                break;
            }
        }

        self.expect(&Token::Colon, "':' before the return type")?;
        let return_type = self.parse_type()?;
        self.expect(&Token::Eq, "'='")?;
        let body = self.parse_expression()?;

        Ok(FunctionDefinition {
            name,
            visibility,
            type_parameters,
            parameters,
            return_type,
            body,
        })
    }

    fn parse_type_parameters(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();
        if !self.eat(&Token::Lt) {
            return Ok(params);
        }
        loop {
            let (name, _) = self.expect_upper("type parameter")?;
            params.push(name);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::Gt, "',' or '>'")?;
            return Ok(params);
        }
    }

    fn parse_type(&mut self) -> Result<TypeAnnotation, ParseError> {
        self.descend()?;
        let ty = self.parse_type_body();
        self.depth -= 1;
        ty
    }

    fn parse_type_body(&mut self) -> Result<TypeAnnotation, ParseError> {
        let primitive = match self.peek() {
            Some(Token::UnitType) => Some(PrimitiveType::Unit),
            Some(Token::IntType) => Some(PrimitiveType::Int),
            Some(Token::FloatType) => Some(PrimitiveType::Float),
            Some(Token::BoolType) => Some(PrimitiveType::Bool),
            Some(Token::CharType) => Some(PrimitiveType::Char),
            Some(Token::StringType) => Some(PrimitiveType::String),
            _ => None,
        };
        if let Some(primitive) = primitive {
            self.bump();
            return Ok(TypeAnnotation::primitive(primitive));
        }

        match self.peek() {
            Some(Token::UpperIdent(_)) => {
                let (name, _) = self.expect_upper("type name")?;
                let mut arguments = Vec::new();
                if self.eat(&Token::Lt) {
                    arguments = self.parse_type_list(&Token::Gt, "',' or '>'")?;
                }
                Ok(TypeAnnotation::Named { name, arguments })
            }
            Some(Token::LParen) => {
                self.bump();
                let mut elements = if self.eat(&Token::RParen) {
                    Vec::new()
                } else {
                    self.parse_type_list(&Token::RParen, "',' or ')'")?
                };
                if self.eat(&Token::Arrow) {
                    let return_type = self.parse_type()?;
                    return Ok(TypeAnnotation::Function {
                        parameters: elements,
                        return_type: Box::new(return_type),
                    });
                }
                match elements.len() {
                    0 => Ok(TypeAnnotation::primitive(PrimitiveType::Unit)),
                    1 => Ok(elements.remove(0)),
                    _ => Ok(TypeAnnotation::Tuple { elements }),
                }
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    fn parse_type_list(
        &mut self,
        close: &Token,
        expected: &str,
    ) -> Result<Vec<TypeAnnotation>, ParseError> {
        let mut types = Vec::new();
        loop {
            types.push(self.parse_type()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(close, expected)?;
            return Ok(types);
        }
    }

    /// Capture an expression as source text
    fn parse_expression(&mut self) -> Result<String, ParseError> {
        let mut depth = 0usize;
        let mut range: Option<Range<usize>> = None;

        while let Some((token, span)) = self.peek_spanned() {
            match token {
                Token::LBrace | Token::LParen | Token::LBracket => depth += 1,
                Token::RBrace | Token::RParen | Token::RBracket if depth == 0 => break,
                Token::RBrace | Token::RParen | Token::RBracket => depth -= 1,
                Token::Semicolon
                | Token::Val
                | Token::Function
                | Token::Private
                | Token::Module
                | Token::Class
                    if depth == 0 =>
                {
                    break
                }
                _ => {}
            }
            range = Some(match range {
                Some(r) => r.start..span.end,
                None => span,
            });
            self.bump();
        }

        if depth > 0 {
            return Err(self.unexpected("a closing delimiter"));
        }
        match range {
            Some(r) => Ok(self.source[r].trim().to_string()),
            None => Err(self.unexpected("an expression")),
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            let span = match self.tokens.get(self.pos) {
                Some((_, span)) => span.clone(),
                None => self.source.len()..self.source.len(),
            };
            return Err(ParseError::new("nesting too deep", span));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_spanned(&self) -> Option<(Token, Range<usize>)> {
        self.tokens.get(self.pos).cloned()
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &str) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_upper(&mut self, expected: &str) -> Result<(String, Range<usize>), ParseError> {
        match self.peek_spanned() {
            Some((Token::UpperIdent(name), span)) => {
                self.bump();
                Ok((name, span))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_lower(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.peek_spanned() {
            Some((Token::LowerIdent(name), _)) => {
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some((token, span)) => ParseError::new(
                format!("expected {}, found {}", expected, token.describe()),
                span.clone(),
            ),
            None => {
                let end = self.source.len();
                ParseError::new(format!("expected {}, found end of file", expected), end..end)
            }
        }
    }
}
