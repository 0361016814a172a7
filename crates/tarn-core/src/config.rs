//! Build configuration, read from `tarn.toml`

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::assembler::{ProgramAssembler, DEFAULT_ROOT_NAME};
use crate::ast::SurfaceModel;
use crate::error::BuildError;
use crate::runtime::{RuntimeFunction, RuntimeLibrary};

/// Conventional name of the configuration file at a source root
pub const CONFIG_FILE_NAME: &str = "tarn.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Extension of source files, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_root_name")]
    pub root_name: String,
    #[serde(default)]
    pub surface: SurfaceModel,
    /// Parse files concurrently
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_extension() -> String {
    "tarn".to_string()
}

fn default_root_name() -> String {
    DEFAULT_ROOT_NAME.to_string()
}

fn default_parallel() -> bool {
    true
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            root_name: default_root_name(),
            surface: SurfaceModel::default(),
            parallel: default_parallel(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub functions: Vec<RuntimeFunction>,
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let text = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::from_toml_str(&text)
            .map_err(|e| BuildError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load `tarn.toml` from `dir` if present, defaults otherwise
    pub fn discover(dir: &Path) -> Result<Self, BuildError> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!("Using configuration {}", candidate.display());
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, BuildError> {
        let config: Self =
            toml::from_str(text).map_err(|e| BuildError::Config(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        let extension = self.build.extension.trim();
        if extension.is_empty() || extension.starts_with('.') {
            return Err(BuildError::Config(format!(
                "extension must be a bare file extension, got '{}'",
                self.build.extension
            )));
        }
        if self.build.root_name.trim().is_empty() {
            return Err(BuildError::Config("root_name must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn assembler(&self) -> ProgramAssembler {
        ProgramAssembler::new(self.build.surface).with_root_name(self.build.root_name.clone())
    }

    pub fn runtime_library(&self) -> Result<RuntimeLibrary, BuildError> {
        Ok(RuntimeLibrary::from_declarations(&self.runtime.functions)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildErrorKind;
    use crate::runtime::HostType;

    #[test]
    fn test_defaults() {
        let config = BuildConfig::from_toml_str("").unwrap();
        assert_eq!(config, BuildConfig::default());
        assert_eq!(config.build.extension, "tarn");
        assert_eq!(config.build.root_name, DEFAULT_ROOT_NAME);
        assert_eq!(config.build.surface, SurfaceModel::Module);
        assert!(config.build.parallel);
        assert!(config.runtime_library().unwrap().is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = BuildConfig::from_toml_str(
            r#"
            [build]
            extension = "tn"
            root_name = "Program"
            surface = "class"
            parallel = false

            [[runtime.functions]]
            name = "println"
            parameters = ["String"]
            returns = "void"

            [[runtime.functions]]
            name = "secret"
            public = false
            returns = "Object"
            "#,
        )
        .unwrap();

        assert_eq!(config.build.extension, "tn");
        assert_eq!(config.build.surface, SurfaceModel::Class);
        assert!(!config.build.parallel);
        assert_eq!(config.runtime.functions[0].parameters, vec![HostType::String]);

        let library = config.runtime_library().unwrap();
        assert_eq!(library.len(), 1);

        let assembler = config.assembler();
        assert_eq!(assembler.root_name(), "Program");
        assert_eq!(assembler.surface(), SurfaceModel::Class);
    }

    #[test]
    fn test_invalid_extension() {
        let err = BuildConfig::from_toml_str("[build]\nextension = \".tarn\"\n").unwrap_err();
        assert_eq!(err.kind(), BuildErrorKind::Config);
    }

    #[test]
    fn test_unknown_surface_rejected() {
        let err = BuildConfig::from_toml_str("[build]\nsurface = \"trait\"\n").unwrap_err();
        assert_eq!(err.kind(), BuildErrorKind::Config);
    }

    #[test]
    fn test_disallowed_runtime_function_surfaces_as_build_error() {
        let config = BuildConfig::from_toml_str(
            "[[runtime.functions]]\nname = \"open\"\nreturns = \"File\"\n",
        )
        .unwrap();
        assert_eq!(config.runtime_library().unwrap_err().kind(), BuildErrorKind::Runtime);
    }

    #[test]
    fn test_discover_and_load() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(BuildConfig::discover(dir.path()).unwrap(), BuildConfig::default());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[build]\nroot_name = \"Root\"\n",
        )
        .unwrap();
        let config = BuildConfig::discover(dir.path()).unwrap();
        assert_eq!(config.build.root_name, "Root");
    }
}
