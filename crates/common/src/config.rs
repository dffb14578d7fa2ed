//! Generator configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! no_content = "void"
//! best_effort = true
//! enum_style = "const-object"
//! query_library = "@tanstack/react-query"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default hook library import path.
pub const DEFAULT_QUERY_LIBRARY: &str = "@tanstack/react-query";

/// Default file name of the type declarations module.
pub const DEFAULT_TYPES_MODULE: &str = "types.ts";

/// Default file name of the hooks module.
pub const DEFAULT_HOOKS_MODULE: &str = "hooks.ts";

/// Errors raised while loading a configuration file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown values.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How a response status without a body is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoContentPolicy {
    /// Emit an explicit `undefined` leaf for the status.
    #[default]
    Undefined,
    /// Emit `void` for the status.
    Void,
    /// Leave the status out of the response map.
    Omit,
}

/// How top-level component enums are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumStyle {
    /// `export type Status = "active" | "archived";`
    #[default]
    Union,
    /// `export const Status = { ... } as const;` plus a matching type.
    ConstObject,
}

/// Options controlling a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Output type for statuses with no declared content (e.g. 204).
    pub no_content: NoContentPolicy,
    /// Collect unsupported constructs as diagnostics instead of failing.
    pub best_effort: bool,
    /// Declaration style for component enums.
    pub enum_style: EnumStyle,
    /// Module the hook primitives are imported from.
    pub query_library: String,
    /// File name of the type declarations module.
    pub types_module: String,
    /// File name of the hooks module.
    pub hooks_module: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            no_content: NoContentPolicy::default(),
            best_effort: false,
            enum_style: EnumStyle::default(),
            query_library: DEFAULT_QUERY_LIBRARY.to_string(),
            types_module: DEFAULT_TYPES_MODULE.to_string(),
            hooks_module: DEFAULT_HOOKS_MODULE.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Import specifier for the types module, relative to the hooks module.
    ///
    /// `types.ts` becomes `./types`.
    pub fn types_import_path(&self) -> String {
        let stem = self
            .types_module
            .strip_suffix(".ts")
            .unwrap_or(&self.types_module);
        format!("./{stem}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = GeneratorConfig::from_toml_str("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.no_content, NoContentPolicy::Undefined);
        assert_eq!(config.query_library, "@tanstack/react-query");
    }

    #[test]
    fn test_kebab_case_values() {
        let config = GeneratorConfig::from_toml_str(
            r#"
no_content = "omit"
enum_style = "const-object"
best_effort = true
"#,
        )
        .unwrap();
        assert_eq!(config.no_content, NoContentPolicy::Omit);
        assert_eq!(config.enum_style, EnumStyle::ConstObject);
        assert!(config.best_effort);
        assert_eq!(config.hooks_module, "hooks.ts");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = GeneratorConfig::from_toml_str("no_such_option = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hookgen.toml");
        fs::write(&path, "no_content = \"void\"\ntypes_module = \"api-types.ts\"\n").unwrap();

        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(config.no_content, NoContentPolicy::Void);
        assert_eq!(config.types_import_path(), "./api-types");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GeneratorConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("missing.toml"));
    }
}
