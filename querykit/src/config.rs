//! Compiler configuration.
//!
//! Configuration is read from a `.querykit.json` file, from environment
//! variables, or left at its defaults. The JSON format nests the compiler
//! settings under a `compiler` key:
//!
//! ```json
//! {
//!   "compiler": {
//!     "parameter_prefix": "param",
//!     "vector_index_name": "{table}_{column}_idx",
//!     "vector_procedure": "QUERY_VECTOR_INDEX"
//!   }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = ".querykit.json";

const ENV_PARAM_PREFIX: &str = "QUERYKIT_PARAM_PREFIX";
const ENV_VECTOR_INDEX_NAME: &str = "QUERYKIT_VECTOR_INDEX_NAME";
const ENV_VECTOR_PROCEDURE: &str = "QUERYKIT_VECTOR_PROCEDURE";

/// Settings that shape the rendered statement text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Prefix of anonymous parameter names (`$param1`, `$param2`, ...).
    pub parameter_prefix: String,

    /// Template for default vector index names. `{table}` and `{column}`
    /// are replaced by the model's type name and the vector column.
    pub vector_index_name: String,

    /// Procedure invoked by vector similarity search.
    pub vector_procedure: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            parameter_prefix: "param".to_string(),
            vector_index_name: "{table}_{column}_idx".to_string(),
            vector_procedure: "QUERY_VECTOR_INDEX".to_string(),
        }
    }
}

impl CompilerConfig {
    /// Check every field for values the compiler cannot work with.
    ///
    /// The parameter prefix must be ASCII alphanumeric. Semantic parameter
    /// names always contain an underscore, so a prefix without one keeps
    /// anonymous and semantic names disjoint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.parameter_prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Invalid {
                key: "parameter_prefix",
                message: format!("'{}' must be non-empty and ASCII alphanumeric", prefix),
            });
        }
        if !prefix.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid {
                key: "parameter_prefix",
                message: format!("'{}' must start with a letter", prefix),
            });
        }
        if self.vector_index_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "vector_index_name",
                message: "template must not be empty".to_string(),
            });
        }
        if self.vector_procedure.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "vector_procedure",
                message: "procedure name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Default vector index name for a table and column.
    pub fn vector_index_for(&self, table: &str, column: &str) -> String {
        self.vector_index_name
            .replace("{table}", table)
            .replace("{column}", column)
    }

    /// Load overrides from environment variables.
    ///
    /// Returns `None` when none of the variables are set.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let prefix = std::env::var(ENV_PARAM_PREFIX).ok();
        let index_name = std::env::var(ENV_VECTOR_INDEX_NAME).ok();
        let procedure = std::env::var(ENV_VECTOR_PROCEDURE).ok();

        if prefix.is_none() && index_name.is_none() && procedure.is_none() {
            return Ok(None);
        }

        let mut config = Self::default();
        if let Some(prefix) = prefix {
            config.parameter_prefix = prefix;
        }
        if let Some(index_name) = index_name {
            config.vector_index_name = index_name;
        }
        if let Some(procedure) = procedure {
            config.vector_procedure = procedure;
        }
        config.validate()?;
        Ok(Some(config))
    }

    /// Resolve configuration.
    ///
    /// Priority: `.querykit.json` in the current directory > environment >
    /// defaults.
    pub fn resolve() -> Result<Self, ConfigError> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        if path.exists() {
            return Ok(ConfigFile::load(&path)?.compiler);
        }

        if let Some(config) = Self::from_env()? {
            return Ok(config);
        }

        Ok(Self::default())
    }
}

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub compiler: CompilerConfig,
}

impl ConfigFile {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let file: ConfigFile = serde_json::from_str(&contents).map_err(|source| {
            ConfigError::Parse {
                path: display,
                source,
            }
        })?;
        file.compiler.validate()?;
        Ok(file)
    }
}
