use std::path::PathBuf;

use thiserror::Error;

use crate::runtime::RuntimeError;

/// Everything that can stop a build. None of these are retried and none
/// produce a partial program.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Duplicate source file '{identifier}': {} and {}", first.display(), second.display())]
    DuplicateFile {
        identifier: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Unresolved import: '{file}' imports '{import}', which is not part of the build")]
    UnresolvedImport { file: String, import: String },

    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Name mismatch: file '{file}' declares '{declared}'")]
    NameMismatch { file: String, declared: String },

    #[error("Reserved name: file '{file}' declares '{name}', which is reserved for the program root")]
    ReservedName { file: String, name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime library error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Payload-free classification of [`BuildError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildErrorKind {
    Parse,
    Io,
    DuplicateFile,
    MalformedGraph,
    CyclicDependency,
    NameMismatch,
    ReservedName,
    Config,
    Runtime,
    Internal,
}

impl BuildError {
    pub fn kind(&self) -> BuildErrorKind {
        match self {
            BuildError::Parse { .. } => BuildErrorKind::Parse,
            BuildError::Io { .. } => BuildErrorKind::Io,
            BuildError::DuplicateFile { .. } => BuildErrorKind::DuplicateFile,
            BuildError::UnresolvedImport { .. } => BuildErrorKind::MalformedGraph,
            BuildError::CyclicDependency { .. } => BuildErrorKind::CyclicDependency,
            BuildError::NameMismatch { .. } => BuildErrorKind::NameMismatch,
            BuildError::ReservedName { .. } => BuildErrorKind::ReservedName,
            BuildError::Config(_) => BuildErrorKind::Config,
            BuildError::Runtime(_) => BuildErrorKind::Runtime,
            BuildError::Internal(_) => BuildErrorKind::Internal,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
