//! Projection of parsed files onto the dependency graph

use std::collections::{HashMap, HashSet};

use crate::ast::CompilationUnit;

/// Build the dependency graph of a build: one vertex per file identifier,
/// with an edge to every name the file imports, exactly as written.
///
/// Imports are not checked here. A name that matches no file stays in the
/// graph as a dangling edge and is rejected by the analyzer.
pub fn build_import_graph(
    units: &HashMap<String, CompilationUnit>,
) -> HashMap<String, HashSet<String>> {
    units
        .iter()
        .map(|(identifier, unit)| {
            let imports = unit.imports.iter().cloned().collect::<HashSet<_>>();
            tracing::trace!("{} imports {:?}", identifier, imports);
            (identifier.clone(), imports)
        })
        .collect()
}
