/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Component helper configuration.
//!
//! Every option is resolved to its default when the configuration is built
//! or deserialized, never per call. Configuration files use TOML:
//!
//! ```toml
//! root_directory = "/srv/site/components"
//! use_schema = true
//! schema_name = "pattern.json"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::path::absolute_path;

/// Default schema file name inside a component directory.
pub const DEFAULT_SCHEMA_NAME: &str = "pattern.json";
/// Default template file extension used for file-name inference.
pub const DEFAULT_TEMPLATE_EXTENSION: &str = "hbs";
/// Default directory holding data files, relative to the template.
pub const DEFAULT_DATA_DIRECTORY: &str = "_data";
/// Default argument name that references a data file.
pub const DEFAULT_DATA_FILE_KEY: &str = "data-file";
/// Default directory name searched for package-qualified references.
pub const DEFAULT_PACKAGE_DIRECTORY: &str = "node_modules";

/// How component schemas are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaPolicy {
    /// Schemas are neither loaded nor validated.
    #[default]
    Disabled,
    /// Schemas are validated when present; a missing or incomplete schema
    /// means "no constraints".
    Optional,
    /// Every component must ship a complete schema.
    Required,
}

impl SchemaPolicy {
    /// Whether schemas are loaded and validated at all.
    pub fn is_enabled(self) -> bool {
        self != SchemaPolicy::Disabled
    }

    /// Whether a missing or incomplete schema is an error.
    pub fn is_required(self) -> bool {
        self == SchemaPolicy::Required
    }
}

/// Errors that can occur when loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has unknown options.
    #[error("Invalid component configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Configuration of the component helper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentConfig {
    /// Directory that relative component references resolve against.
    pub root_directory: PathBuf,

    /// Schema file name inside each component directory.
    #[serde(default = "default_schema_name")]
    pub schema_name: String,

    /// Validate render data against component schemas when present.
    #[serde(default)]
    pub use_schema: bool,

    /// Require every component to ship a schema. Implies `use_schema`.
    #[serde(default)]
    pub schema_required: bool,

    /// Extension of inferred template files.
    #[serde(default = "default_template_extension")]
    pub template_extension: String,

    /// Directory holding data files, relative to the template directory.
    #[serde(default = "default_data_directory")]
    pub data_directory: String,

    /// Argument name that references a data file.
    #[serde(default = "default_data_file_key")]
    pub data_file_key: String,

    /// Directory name searched for `~package` references.
    #[serde(default = "default_package_directory")]
    pub package_directory: String,
}

fn default_schema_name() -> String {
    DEFAULT_SCHEMA_NAME.to_string()
}

fn default_template_extension() -> String {
    DEFAULT_TEMPLATE_EXTENSION.to_string()
}

fn default_data_directory() -> String {
    DEFAULT_DATA_DIRECTORY.to_string()
}

fn default_data_file_key() -> String {
    DEFAULT_DATA_FILE_KEY.to_string()
}

fn default_package_directory() -> String {
    DEFAULT_PACKAGE_DIRECTORY.to_string()
}

impl ComponentConfig {
    /// Create a configuration with defaults for everything but the root.
    ///
    /// A relative root is made absolute against the current directory.
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: absolute_path(&root_directory.into()),
            schema_name: default_schema_name(),
            use_schema: false,
            schema_required: false,
            template_extension: default_template_extension(),
            data_directory: default_data_directory(),
            data_file_key: default_data_file_key(),
            package_directory: default_package_directory(),
        }
    }

    /// Parse a configuration from TOML text.
    ///
    /// A relative `root_directory` is made absolute against the current
    /// directory.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(source)?;
        config.root_directory = absolute_path(&config.root_directory);
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    ///
    /// A relative `root_directory` is resolved against the directory that
    /// contains the configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&source)?;
        let base = path.parent().unwrap_or(Path::new("."));
        config.root_directory = absolute_path(&base.join(&config.root_directory));
        Ok(config)
    }

    /// Set the root directory, made absolute against the current directory.
    pub fn with_root_directory(mut self, root_directory: impl Into<PathBuf>) -> Self {
        self.root_directory = absolute_path(&root_directory.into());
        self
    }

    /// Set the schema file name.
    pub fn with_schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = schema_name.into();
        self
    }

    /// Enable or disable schema validation.
    pub fn with_use_schema(mut self, use_schema: bool) -> Self {
        self.use_schema = use_schema;
        self
    }

    /// Require (or stop requiring) a schema for every component.
    pub fn with_schema_required(mut self, schema_required: bool) -> Self {
        self.schema_required = schema_required;
        self
    }

    /// Set the extension of inferred template files.
    pub fn with_template_extension(mut self, extension: impl Into<String>) -> Self {
        self.template_extension = extension.into();
        self
    }

    /// The effective schema policy.
    pub fn schema_policy(&self) -> SchemaPolicy {
        if self.schema_required {
            SchemaPolicy::Required
        } else if self.use_schema {
            SchemaPolicy::Optional
        } else {
            SchemaPolicy::Disabled
        }
    }
}
