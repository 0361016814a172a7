//! Naming rules between files and the constructs they declare
//!
//! A file named `Foo.tarn` must declare a top-level construct named `Foo`.
//! Validation stops at the first offending file; files are checked in
//! identifier order so the same source tree always reports the same file.

use std::collections::HashMap;

use crate::ast::CompilationUnit;
use crate::error::BuildError;

/// Check that every file identifier equals the name its unit declares
pub fn validate_names(units: &HashMap<String, CompilationUnit>) -> Result<(), BuildError> {
    for identifier in sorted_identifiers(units) {
        let declared = units[identifier].declared_name();
        if declared != identifier {
            return Err(BuildError::NameMismatch {
                file: identifier.clone(),
                declared: declared.to_string(),
            });
        }
    }
    Ok(())
}

/// Reject user constructs that claim the name of the synthetic program root
pub fn ensure_not_reserved(
    units: &HashMap<String, CompilationUnit>,
    root_name: &str,
) -> Result<(), BuildError> {
    for identifier in sorted_identifiers(units) {
        let declared = units[identifier].declared_name();
        if declared == root_name || identifier == root_name {
            return Err(BuildError::ReservedName {
                file: identifier.clone(),
                name: root_name.to_string(),
            });
        }
    }
    Ok(())
}

fn sorted_identifiers(units: &HashMap<String, CompilationUnit>) -> Vec<&String> {
    let mut identifiers: Vec<&String> = units.keys().collect();
    identifiers.sort();
    identifiers
}
