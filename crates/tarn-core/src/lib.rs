//! Dependency resolution and program assembly for the Tarn language

pub mod assembler;
pub mod ast;
pub mod config;
pub mod error;
pub mod graph;
pub mod imports;
pub mod naming;
pub mod runtime;

pub use assembler::{ProgramAssembler, DEFAULT_ROOT_NAME};
pub use ast::{CompilationUnit, Construct, ConstructKind, SurfaceModel};
pub use config::BuildConfig;
pub use error::{BuildError, BuildErrorKind};
pub use graph::{Adjacency, Analysis, GraphAnalyzer, MalformedGraph};
