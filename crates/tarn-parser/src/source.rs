//! Source acquisition: finding source files and parsing them into units
//!
//! Files are parsed independently, in parallel when enabled. The resulting
//! map is only built once every file has parsed; one failure fails the set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tarn_core::ast::CompilationUnit;
use tarn_core::error::BuildError;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::parser::parse;

/// Display name used for in-memory sources in diagnostics
pub const INLINE_SOURCE_NAME: &str = "<source>";

#[derive(Debug, Clone, PartialEq, Eq)]
enum SourceText {
    File(PathBuf),
    Inline(String),
}

/// One source to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File identifier; `None` for inline sources, which are keyed by the
    /// name they declare
    identifier: Option<String>,
    text: SourceText,
}

impl SourceFile {
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    fn display_name(&self) -> String {
        match &self.text {
            SourceText::File(path) => path.display().to_string(),
            SourceText::Inline(_) => INLINE_SOURCE_NAME.to_string(),
        }
    }

    fn parse(&self) -> Result<(String, CompilationUnit), BuildError> {
        let unit = match &self.text {
            SourceText::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
                parse(&text).map_err(|e| BuildError::Parse {
                    file: self.display_name(),
                    message: e.render(&text),
                })?
            }
            SourceText::Inline(text) => parse(text).map_err(|e| BuildError::Parse {
                file: self.display_name(),
                message: e.render(text),
            })?,
        };

        let identifier = self
            .identifier
            .clone()
            .unwrap_or_else(|| unit.declared_name().to_string());
        debug!("Parsed {} as {}", self.display_name(), identifier);
        Ok((identifier, unit))
    }
}

/// The set of sources making up one build
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    files: Vec<SourceFile>,
}

impl SourceSet {
    /// Collect every `*.{extension}` file below `root`, sorted by path.
    ///
    /// A file's identifier is its base name without the extension, so two
    /// files with the same base name anywhere under `root` are rejected.
    #[instrument(level = "debug")]
    pub fn discover(root: &Path, extension: &str) -> Result<Self, BuildError> {
        if !root.is_dir() {
            return Err(BuildError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut files = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                let message = e.to_string();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other(message));
                BuildError::io(path, source)
            })?;

            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(extension)
            {
                continue;
            }
            let Some(identifier) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            if let Some(first) = seen.get(identifier) {
                return Err(BuildError::DuplicateFile {
                    identifier: identifier.to_string(),
                    first: first.clone(),
                    second: path.to_path_buf(),
                });
            }
            seen.insert(identifier.to_string(), path.to_path_buf());
            files.push(SourceFile {
                identifier: Some(identifier.to_string()),
                text: SourceText::File(path.to_path_buf()),
            });
        }

        info!("Discovered {} source files under {}", files.len(), root.display());
        Ok(Self { files })
    }

    /// A build made of a single in-memory source
    pub fn from_source(text: impl Into<String>) -> Self {
        Self {
            files: vec![SourceFile {
                identifier: None,
                text: SourceText::Inline(text.into()),
            }],
        }
    }

    /// A build made of one file on disk
    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        let identifier = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| {
                BuildError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
                )
            })?;
        Ok(Self {
            files: vec![SourceFile {
                identifier: Some(identifier.to_string()),
                text: SourceText::File(path.to_path_buf()),
            }],
        })
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Parse every source into the `{identifier -> unit}` map of the build
    #[instrument(skip(self), fields(files = self.files.len()), level = "debug")]
    pub fn parse_all(&self, parallel: bool) -> Result<HashMap<String, CompilationUnit>, BuildError> {
        let parsed: Vec<(String, CompilationUnit)> = if parallel {
            self.files.par_iter().map(SourceFile::parse).collect::<Result<_, _>>()?
        } else {
            self.files.iter().map(SourceFile::parse).collect::<Result<_, _>>()?
        };

        let mut units = HashMap::with_capacity(parsed.len());
        for (identifier, unit) in parsed {
            if units.insert(identifier.clone(), unit).is_some() {
                return Err(BuildError::Internal(format!(
                    "source identifier '{}' produced twice",
                    identifier
                )));
            }
        }
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_core::error::BuildErrorKind;

    #[test]
    fn test_inline_source_keyed_by_declared_name() {
        let units = SourceSet::from_source("module Solo { val x = 1 }")
            .parse_all(false)
            .unwrap();
        assert_eq!(units.len(), 1);
        assert!(units.contains_key("Solo"));
    }

    #[test]
    fn test_inline_parse_error_names_source() {
        let err = SourceSet::from_source("module {").parse_all(true).unwrap_err();
        match err {
            BuildError::Parse { file, message } => {
                assert_eq!(file, INLINE_SOURCE_NAME);
                assert!(message.starts_with("1:8: expected construct name"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let err = SourceSet::discover(Path::new("/definitely/not/here"), "tarn").unwrap_err();
        assert_eq!(err.kind(), BuildErrorKind::Io);
    }
}
