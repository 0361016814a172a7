//! Syntax tree shared by the parser, the assembler and downstream phases
//!
//! Expression bodies are kept as source text. Their structure belongs to the
//! type checker and interpreter, which consume the assembled program.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The primitive types a Tarn program can talk about without declaring them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Unit,
    Int,
    Float,
    Bool,
    Char,
    String,
}

impl PrimitiveType {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Unit => "unit",
            PrimitiveType::Int => "int",
            PrimitiveType::Float => "float",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::String => "string",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A type as written in a signature or annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeAnnotation {
    Primitive { primitive: PrimitiveType },
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        arguments: Vec<TypeAnnotation>,
    },
    Tuple { elements: Vec<TypeAnnotation> },
    Function {
        parameters: Vec<TypeAnnotation>,
        return_type: Box<TypeAnnotation>,
    },
}

impl TypeAnnotation {
    pub fn primitive(primitive: PrimitiveType) -> Self {
        TypeAnnotation::Primitive { primitive }
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeAnnotation::Named {
            name: name.into(),
            arguments: Vec::new(),
        }
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAnnotation::Primitive { primitive } => write!(f, "{}", primitive),
            TypeAnnotation::Named { name, arguments } => {
                write!(f, "{}", name)?;
                if !arguments.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in arguments.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeAnnotation::Tuple { elements } => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, ")")
            }
            TypeAnnotation::Function {
                parameters,
                return_type,
            } => {
                write!(f, "(")?;
                for (i, param) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> {}", return_type)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// `val name: type = value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantDefinition {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<TypeAnnotation>,
    /// Source text of the value expression
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub annotation: TypeAnnotation,
}

/// `function name<T>(params): type = body`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeAnnotation,
    /// Source text of the body expression
    pub body: String,
}

/// Which surface syntax introduced a construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructKind {
    Module,
    Class,
}

impl ConstructKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ConstructKind::Module => "module",
            ConstructKind::Class => "class",
        }
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The surface model a build assembles into.
///
/// Namespace-style builds wrap files in a root `module`, object-style builds
/// in a root `class`. Files of either kind may appear in both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceModel {
    #[default]
    Module,
    Class,
}

impl SurfaceModel {
    pub fn root_kind(self) -> ConstructKind {
        match self {
            SurfaceModel::Module => ConstructKind::Module,
            SurfaceModel::Class => ConstructKind::Class,
        }
    }
}

/// A named container of members: the top-level declaration of a file, a
/// nested type, or the synthetic program root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Construct {
    pub name: String,
    pub kind: ConstructKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub constants: Vec<ConstantDefinition>,
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
    #[serde(default)]
    pub nested: Vec<Construct>,
}

impl Construct {
    /// A construct with no members
    pub fn empty(name: impl Into<String>, kind: ConstructKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_parameters: Vec::new(),
            constants: Vec::new(),
            functions: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// True when the construct declares no constants or functions of its own
    pub fn has_no_own_members(&self) -> bool {
        self.constants.is_empty() && self.functions.is_empty()
    }

    pub fn nested_names(&self) -> impl Iterator<Item = &str> {
        self.nested.iter().map(|c| c.name.as_str())
    }
}

/// The parsed form of one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub imports: BTreeSet<String>,
    pub body: Construct,
}

impl CompilationUnit {
    pub fn new(imports: BTreeSet<String>, body: Construct) -> Self {
        Self { imports, body }
    }

    /// The name the file's top-level construct claims
    pub fn declared_name(&self) -> &str {
        &self.body.name
    }
}
