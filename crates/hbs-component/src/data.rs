/*
 * data.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Render data assembly.
//!
//! The data a component template renders with is built in three layers:
//!
//! 1. the contents of the data file named by the `data-file` argument,
//!    read from `<template directory>/_data/<name>[.json]`
//! 2. the remaining inline arguments, parsed as lenient literals where they
//!    look like one (inline values win)
//! 3. the already rendered block body, as `children`

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::attribute::parse_attribute;
use crate::config::ComponentConfig;
use crate::error::{ComponentError, ComponentResult};
use crate::literal;
use crate::loader::SourceLoader;

/// The typed data object passed to the template engine.
pub type RenderData = Map<String, Value>;

/// Field that receives the rendered block body.
pub const CHILDREN_FIELD: &str = "children";

/// Path of a data file: `<template directory>/<data directory>/<name>`,
/// with `.json` appended unless already present.
pub fn data_file_path(template_directory: &Path, data_directory: &str, name: &str) -> PathBuf {
    let file_name = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{}.json", name)
    };
    template_directory.join(data_directory).join(file_name)
}

/// Read and parse a data file into an object.
///
/// An empty file yields an empty object. Text that is not UTF-8 is a parse
/// failure, any other read failure is a [`ComponentError::DataFileRead`].
pub fn read_data_file(path: &Path, loader: &dyn SourceLoader) -> ComponentResult<RenderData> {
    let data_error = |message: String| ComponentError::DataFile {
        path: path.to_path_buf(),
        message,
    };
    let content = loader.read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::InvalidData {
            data_error(source.to_string())
        } else {
            ComponentError::DataFileRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    match literal::parse(&content).map_err(|e| data_error(e.message))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(RenderData::new()),
        other => Err(data_error(format!(
            "Expected an object but {} found.",
            value_kind(&other)
        ))),
    }
}

/// Merge `source` into `target`. Nested objects combine key-wise; arrays
/// and scalars from `source` replace what `target` holds.
pub fn deep_merge(target: &mut RenderData, source: RenderData) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Build the render data of one component invocation.
///
/// # Arguments
/// * `component_name` - The reference as written, used in error messages
/// * `template_directory` - Directory containing the resolved template
/// * `arguments` - The invocation's keyed arguments
/// * `children` - The rendered block body, if the invocation has one
pub fn assemble_render_data(
    component_name: &str,
    template_directory: &Path,
    arguments: &BTreeMap<String, Value>,
    children: Option<&str>,
    config: &ComponentConfig,
    loader: &dyn SourceLoader,
) -> ComponentResult<RenderData> {
    let mut render_data = RenderData::new();
    let mut arguments = arguments.clone();

    // The reserved key is removed whatever its type.
    if let Some(Value::String(name)) = arguments.remove(&config.data_file_key) {
        let path = data_file_path(template_directory, &config.data_directory, &name);
        tracing::debug!(component = component_name, file = %path.display(), "Loading data file");
        deep_merge(&mut render_data, read_data_file(&path, loader)?);
    }

    let mut parsed = RenderData::new();
    for (key, raw) in arguments {
        tracing::trace!(component = component_name, argument = %key, "Parsing argument");
        let value = parse_attribute(&raw).map_err(|e| ComponentError::AttributeParse {
            component: component_name.to_string(),
            key: key.clone(),
            value: display_raw(&raw),
            message: e.message,
        })?;
        parsed.insert(key, value);
    }
    deep_merge(&mut render_data, parsed);

    if let Some(children) = children {
        render_data.insert(
            CHILDREN_FIELD.to_string(),
            Value::String(children.to_string()),
        );
    }

    Ok(render_data)
}

fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
