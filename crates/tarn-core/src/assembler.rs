//! Folds the per-file constructs of a build into one program
//!
//! ```text
//! units -> validate names -> import graph -> analyze -> order bodies -> root
//! ```
//!
//! Every stage is terminal on error: a build yields exactly one root
//! construct or nothing.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::ast::{CompilationUnit, Construct, SurfaceModel};
use crate::error::BuildError;
use crate::graph::{Analysis, GraphAnalyzer};
use crate::imports::build_import_graph;
use crate::naming::{ensure_not_reserved, validate_names};

/// Name of the synthetic program root unless configured otherwise
pub const DEFAULT_ROOT_NAME: &str = "__Program__";

/// Assembles parsed files into a single root construct
#[derive(Debug, Clone)]
pub struct ProgramAssembler {
    root_name: String,
    surface: SurfaceModel,
    analyzer: GraphAnalyzer,
}

impl Default for ProgramAssembler {
    fn default() -> Self {
        Self::new(SurfaceModel::default())
    }
}

impl ProgramAssembler {
    pub fn new(surface: SurfaceModel) -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            surface,
            analyzer: GraphAnalyzer::new(),
        }
    }

    pub fn with_root_name(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = root_name.into();
        self
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn surface(&self) -> SurfaceModel {
        self.surface
    }

    /// Resolve the compilation order of `units` and wrap their constructs,
    /// dependencies first, in the program root.
    #[instrument(skip(self, units), fields(files = units.len()), level = "debug")]
    pub fn assemble(&self, units: HashMap<String, CompilationUnit>) -> Result<Construct, BuildError> {
        validate_names(&units)?;
        ensure_not_reserved(&units, &self.root_name)?;

        let order = self.compilation_order(&units)?;
        debug!("Compilation order: {:?}", order);

        let nested = self.order_bodies(units, &order)?;

        let mut root = Construct::empty(self.root_name.clone(), self.surface.root_kind());
        root.nested = nested;
        info!(
            "Assembled {} {} into {}",
            root.nested.len(),
            if root.nested.len() == 1 { "file" } else { "files" },
            root.name
        );
        Ok(root)
    }

    /// Dependency-first order of the file identifiers in `units`
    pub fn compilation_order(
        &self,
        units: &HashMap<String, CompilationUnit>,
    ) -> Result<Vec<String>, BuildError> {
        let graph = build_import_graph(units);

        let analysis = self
            .analyzer
            .analyze(&graph)
            .map_err(|malformed| BuildError::UnresolvedImport {
                file: malformed.vertex,
                import: malformed.missing,
            })?;

        match analysis {
            Analysis::Acyclic(order) => Ok(order),
            Analysis::Cyclic(cycle) => Err(BuildError::CyclicDependency { cycle }),
        }
    }

    fn order_bodies(
        &self,
        mut units: HashMap<String, CompilationUnit>,
        order: &[String],
    ) -> Result<Vec<Construct>, BuildError> {
        let mut bodies = Vec::with_capacity(order.len());
        for identifier in order {
            let unit = units.remove(identifier).ok_or_else(|| {
                BuildError::Internal(format!(
                    "'{}' is in the compilation order but has no compilation unit",
                    identifier
                ))
            })?;
            bodies.push(unit.body);
        }
        if !units.is_empty() {
            let mut leftover: Vec<String> = units.into_keys().collect();
            leftover.sort();
            return Err(BuildError::Internal(format!(
                "files missing from the compilation order: {}",
                leftover.join(", ")
            )));
        }
        Ok(bodies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ConstantDefinition, ConstructKind, Visibility};
    use crate::error::BuildErrorKind;
    use std::collections::BTreeSet;

    fn unit(name: &str, imports: &[&str]) -> CompilationUnit {
        let mut body = Construct::empty(name, ConstructKind::Module);
        body.constants.push(ConstantDefinition {
            name: "value".to_string(),
            visibility: Visibility::Public,
            annotation: None,
            value: "1".to_string(),
        });
        CompilationUnit::new(
            imports.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            body,
        )
    }

    fn build(entries: Vec<(&str, CompilationUnit)>) -> HashMap<String, CompilationUnit> {
        entries
            .into_iter()
            .map(|(file, unit)| (file.to_string(), unit))
            .collect()
    }

    fn names(root: &Construct) -> Vec<&str> {
        root.nested_names().collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let units = build(vec![
            ("A", unit("A", &[])),
            ("B", unit("B", &["A"])),
            ("C", unit("C", &["A", "B"])),
        ]);

        let root = ProgramAssembler::default().assemble(units).unwrap();
        assert_eq!(names(&root), vec!["A", "B", "C"]);
        assert_eq!(root.name, DEFAULT_ROOT_NAME);
        assert_eq!(root.kind, ConstructKind::Module);
        assert!(root.has_no_own_members());
    }

    #[test]
    fn test_class_surface_and_custom_root() {
        let units = build(vec![("A", unit("A", &[]))]);

        let root = ProgramAssembler::new(SurfaceModel::Class)
            .with_root_name("Program")
            .assemble(units)
            .unwrap();
        assert_eq!(root.kind, ConstructKind::Class);
        assert_eq!(root.name, "Program");
        assert_eq!(root.nested[0].constants[0].value, "1");
    }

    #[test]
    fn test_cycle_is_terminal() {
        let units = build(vec![("X", unit("X", &["Y"])), ("Y", unit("Y", &["X"]))]);

        let err = ProgramAssembler::default().assemble(units).unwrap_err();
        assert_eq!(err.kind(), BuildErrorKind::CyclicDependency);
    }

    #[test]
    fn test_unresolved_import_is_malformed_graph() {
        let units = build(vec![("Z", unit("Z", &["W"]))]);

        let err = ProgramAssembler::default().assemble(units).unwrap_err();
        match err {
            BuildError::UnresolvedImport { file, import } => {
                assert_eq!(file, "Z");
                assert_eq!(import, "W");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_name_mismatch_reported_before_cycles() {
        let units = build(vec![("foo", unit("Bar", &["foo"]))]);

        let err = ProgramAssembler::default().assemble(units).unwrap_err();
        assert_eq!(err.kind(), BuildErrorKind::NameMismatch);
    }

    #[test]
    fn test_empty_build_yields_empty_root() {
        let root = ProgramAssembler::default().assemble(HashMap::new()).unwrap();
        assert!(root.nested.is_empty());
    }

    #[test]
    fn test_order_bodies_detects_missing_unit() {
        let assembler = ProgramAssembler::default();
        let units = build(vec![("A", unit("A", &[]))]);

        let err = assembler
            .order_bodies(units, &["A".to_string(), "Ghost".to_string()])
            .unwrap_err();
        assert_eq!(err.kind(), BuildErrorKind::Internal);
    }
}
