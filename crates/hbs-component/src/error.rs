/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for component resolution, data assembly and validation.
//!
//! Every variant is raised at the point of detection and already carries the
//! context (file path, component name, argument) a template author needs. The
//! `Display` text of each variant is matched on by downstream tooling, so its
//! wording is part of the public contract.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving and rendering a component.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The invocation itself is malformed (wrong arity, missing name).
    #[error("{message}")]
    Usage { message: String },

    /// The component reference cannot be mapped to a template path.
    #[error("Unable to resolve component \"{reference}\": {message}")]
    Resolution { reference: String, message: String },

    /// The resolved template file could not be read.
    #[error("{source}, open '{}'", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data file is missing or unreadable.
    #[error("{source}, open '{}'", path.display())]
    DataFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data file does not parse.
    #[error("Failed to parse \"{}\" {message}", path.display())]
    DataFile { path: PathBuf, message: String },

    /// An inline literal argument is malformed.
    #[error("Invalid jsonic attribute for \"{component}\": \"{key}\"=\"{value}\" - {message}")]
    AttributeParse {
        component: String,
        key: String,
        value: String,
        message: String,
    },

    /// Schemas are required but the schema file is missing.
    #[error("{source}, open '{}'", path.display())]
    SchemaMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("Failed to parse {} {message}", path.display())]
    SchemaParse { path: PathBuf, message: String },

    /// The schema file has no property definitions.
    #[error("Schema {} is missing a property definition", path.display())]
    SchemaIncomplete { path: PathBuf },

    /// The normalized schema violates the JSON Schema meta-schema.
    #[error("Error in {}: \"{message}\"", path.display())]
    SchemaInvalid { path: PathBuf, message: String },

    /// The render data does not satisfy the component schema.
    #[error("{message}")]
    Validation { component: String, message: String },

    /// The template engine failed to render the component.
    #[error("{message}")]
    Render { component: String, message: String },

    /// Attribution of an error to the template that invoked the component.
    #[error("[{}] - {error}", source_file.display())]
    InSource {
        source_file: PathBuf,
        error: Box<ComponentError>,
    },
}

impl ComponentError {
    /// Create a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        ComponentError::Usage {
            message: message.into(),
        }
    }

    /// Attribute this error to the template file that triggered it.
    pub fn in_source(self, source_file: impl Into<PathBuf>) -> Self {
        ComponentError::InSource {
            source_file: source_file.into(),
            error: Box::new(self),
        }
    }

    /// The error with any source attribution removed.
    pub fn root(&self) -> &ComponentError {
        match self {
            ComponentError::InSource { error, .. } => error.root(),
            other => other,
        }
    }
}

/// Result type for component operations.
pub type ComponentResult<T> = Result<T, ComponentError>;
