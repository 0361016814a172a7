//! Library interface for the tarn command line
//!
//! [`assemble_program`] is the single entry point downstream phases use: it
//! acquires and parses the sources of a build and folds them into the
//! program root.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use tarn_core::ast::{CompilationUnit, Construct};
use tarn_core::config::BuildConfig;
use tarn_core::error::BuildError;
use tarn_core::imports::build_import_graph;
use tarn_parser::SourceSet;
use tracing::info;

/// Where the sources of a build come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    /// Every source file below a directory
    Directory(PathBuf),
    /// One source file on disk, keyed by its base name
    File(PathBuf),
    /// One in-memory source, keyed by the name it declares
    Source(String),
}

impl SourceInput {
    /// Classify a path given on the command line
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            SourceInput::Directory(path)
        } else {
            SourceInput::File(path)
        }
    }

    fn acquire(&self, config: &BuildConfig) -> Result<SourceSet, BuildError> {
        match self {
            SourceInput::Directory(root) => SourceSet::discover(root, &config.build.extension),
            SourceInput::File(path) => SourceSet::from_file(path),
            SourceInput::Source(text) => Ok(SourceSet::from_source(text.clone())),
        }
    }
}

/// Parse every source of the build into the `{identifier -> unit}` map
pub fn load_units(
    input: &SourceInput,
    config: &BuildConfig,
) -> Result<HashMap<String, CompilationUnit>, BuildError> {
    config.validate()?;
    let sources = input.acquire(config)?;
    sources.parse_all(config.build.parallel)
}

/// Acquire, parse and assemble a whole build into its program root
pub fn assemble_program(input: SourceInput, config: &BuildConfig) -> Result<Construct, BuildError> {
    let units = load_units(&input, config)?;
    info!("Parsed {} compilation units", units.len());
    config.assembler().assemble(units)
}

/// Render the import graph of a build in Graphviz DOT.
///
/// Vertices are laid out in name order. Imports that match no file are
/// drawn too, so an unresolved import shows up as a leaf of its own.
pub fn import_graph_dot(units: &HashMap<String, CompilationUnit>) -> String {
    let adjacency = build_import_graph(units);

    let names: BTreeSet<&str> = adjacency
        .iter()
        .flat_map(|(from, to)| std::iter::once(from.as_str()).chain(to.iter().map(String::as_str)))
        .collect();

    let mut graph: DiGraph<&str, &str> = DiGraph::new();
    let nodes: HashMap<&str, NodeIndex> = names
        .iter()
        .map(|name| (*name, graph.add_node(*name)))
        .collect();

    for from in &names {
        let Some(imports) = adjacency.get(*from) else {
            continue;
        };
        let mut imports: Vec<&str> = imports.iter().map(String::as_str).collect();
        imports.sort_unstable();
        for to in imports {
            graph.add_edge(nodes[from], nodes[to], "imports");
        }
    }

    format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
}

/// Names of the files in a program root, in compilation order
pub fn compilation_order(root: &Construct) -> Vec<&str> {
    root.nested_names().collect()
}

/// Load configuration from an explicit file, or from `tarn.toml` beside the
/// sources when none is given
pub fn resolve_config(explicit: Option<&Path>, input: &SourceInput) -> Result<BuildConfig, BuildError> {
    if let Some(path) = explicit {
        return BuildConfig::load(path);
    }
    match input {
        SourceInput::Directory(root) => BuildConfig::discover(root),
        SourceInput::File(path) => match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => BuildConfig::discover(dir),
            _ => Ok(BuildConfig::default()),
        },
        SourceInput::Source(_) => Ok(BuildConfig::default()),
    }
}
