//! Statically declared runtime library functions
//!
//! The embedding application declares the externally implemented functions
//! it provides, using host-language type names. Only public functions that
//! are marked external are exposed to the type checker, and each of them
//! must use host types that map onto a Tarn primitive:
//!
//! | host | Tarn |
//! |---|---|
//! | `void` | `unit` |
//! | `int`, `long` | `int` |
//! | `float`, `double` | `float` |
//! | `boolean` | `bool` |
//! | `char` | `char` |
//! | `String` | `string` |

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ast::PrimitiveType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Disallowed runtime function '{name}': host type '{host_type}' has no Tarn equivalent")]
    DisallowedFunction { name: String, host_type: HostType },

    #[error("Duplicate runtime function '{0}'")]
    DuplicateFunction(String),
}

/// A type of the host language a runtime function is implemented in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum HostType {
    Void,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Char,
    String,
    Other(String),
}

impl HostType {
    /// The Tarn primitive this host type stands for
    pub fn to_primitive(&self) -> Option<PrimitiveType> {
        match self {
            HostType::Void => Some(PrimitiveType::Unit),
            HostType::Int | HostType::Long => Some(PrimitiveType::Int),
            HostType::Float | HostType::Double => Some(PrimitiveType::Float),
            HostType::Boolean => Some(PrimitiveType::Bool),
            HostType::Char => Some(PrimitiveType::Char),
            HostType::String => Some(PrimitiveType::String),
            HostType::Other(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HostType::Void => "void",
            HostType::Int => "int",
            HostType::Long => "long",
            HostType::Float => "float",
            HostType::Double => "double",
            HostType::Boolean => "boolean",
            HostType::Char => "char",
            HostType::String => "String",
            HostType::Other(name) => name,
        }
    }
}

impl FromStr for HostType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "void" => HostType::Void,
            "int" => HostType::Int,
            "long" => HostType::Long,
            "float" => HostType::Float,
            "double" => HostType::Double,
            "boolean" => HostType::Boolean,
            "char" => HostType::Char,
            "String" => HostType::String,
            other => HostType::Other(other.to_string()),
        })
    }
}

impl From<String> for HostType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(ty) => ty,
            Err(never) => match never {},
        }
    }
}

impl From<HostType> for String {
    fn from(value: HostType) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One function offered by the embedding application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeFunction {
    pub name: String,
    #[serde(default = "default_true")]
    pub public: bool,
    /// Whether the function is opted in as part of the runtime library
    #[serde(default = "default_true")]
    pub external: bool,
    #[serde(default)]
    pub parameters: Vec<HostType>,
    pub returns: HostType,
}

fn default_true() -> bool {
    true
}

impl RuntimeFunction {
    pub fn new(name: impl Into<String>, parameters: Vec<HostType>, returns: HostType) -> Self {
        Self {
            name: name.into(),
            public: true,
            external: true,
            parameters,
            returns,
        }
    }

    fn is_exposed(&self) -> bool {
        self.public && self.external
    }

    fn signature(&self) -> Result<FunctionSignature, RuntimeError> {
        let disallowed = |host_type: &HostType| RuntimeError::DisallowedFunction {
            name: self.name.clone(),
            host_type: host_type.clone(),
        };

        let parameters = self
            .parameters
            .iter()
            .map(|ty| ty.to_primitive().ok_or_else(|| disallowed(ty)))
            .collect::<Result<Vec<_>, _>>()?;
        let return_type = self
            .returns
            .to_primitive()
            .ok_or_else(|| disallowed(&self.returns))?;

        Ok(FunctionSignature {
            parameters,
            return_type,
        })
    }
}

/// Signature of a runtime function in Tarn terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub parameters: Vec<PrimitiveType>,
    pub return_type: PrimitiveType,
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

/// Validated table of runtime functions, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeLibrary {
    functions: IndexMap<String, FunctionSignature>,
}

impl RuntimeLibrary {
    pub fn from_declarations<'a>(
        declarations: impl IntoIterator<Item = &'a RuntimeFunction>,
    ) -> Result<Self, RuntimeError> {
        let mut functions = IndexMap::new();
        for declaration in declarations {
            if !declaration.is_exposed() {
                warn!(
                    "Skipping runtime function '{}': not public and external",
                    declaration.name
                );
                continue;
            }
            let signature = declaration.signature()?;
            debug!("Runtime function {}: {}", declaration.name, signature);
            if functions
                .insert(declaration.name.clone(), signature)
                .is_some()
            {
                return Err(RuntimeError::DuplicateFunction(declaration.name.clone()));
            }
        }
        Ok(Self { functions })
    }

    /// `(name, signature)` pairs in declaration order
    pub fn signatures(&self) -> impl Iterator<Item = (&str, &FunctionSignature)> {
        self.functions.iter().map(|(name, sig)| (name.as_str(), sig))
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
