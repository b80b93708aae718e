/*
 * schema.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Component schema normalization and validation.
//!
//! Component authors write a shorthand schema next to the template
//! (`pattern.json`):
//!
//! ```json
//! {
//!   "name": "Button",
//!   "properties": {
//!     "color": { "type": "string" },
//!     "fullWidth": { "type": "boolean", "default": false }
//!   }
//! }
//! ```
//!
//! Every property without a `default` is required unless it is one of the
//! alternatives of a top-level `oneOf`/`anyOf` requirement group. The
//! shorthand is normalized into a draft-04 JSON Schema, checked against the
//! meta-schema, and used to validate render data. Validation also writes
//! declared defaults into the render data.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};

use crate::config::SchemaPolicy;
use crate::data::RenderData;
use crate::error::{ComponentError, ComponentResult};
use crate::loader::SourceLoader;

/// JSON Schema dialect of normalized schemas.
pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-04/schema#";

/// Keywords of the shorthand that normalization rewrites instead of copying.
const REWRITTEN_KEYWORDS: [&str; 5] = ["$schema", "name", "properties", "required", "type"];

/// Keywords whose entries may declare alternative requirement groups.
const ALTERNATIVE_KEYWORDS: [&str; 2] = ["oneOf", "anyOf"];

/// Load and normalize the schema of a component.
///
/// Returns `Ok(None)` when no schema applies: the file is missing or has no
/// property definitions and the policy does not require a schema.
///
/// # Arguments
/// * `template_directory` - Directory containing the component template
/// * `schema_name` - Schema file name, e.g. `pattern.json`
/// * `policy` - Whether a missing schema is an error
pub fn load_schema(
    template_directory: &Path,
    schema_name: &str,
    policy: SchemaPolicy,
    loader: &dyn SourceLoader,
) -> ComponentResult<Option<Value>> {
    let schema_file = template_directory.join(schema_name);
    let content = match loader.read_to_string(&schema_file) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !policy.is_required() => {
            tracing::debug!(file = %schema_file.display(), "No schema for component");
            return Ok(None);
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            return Err(ComponentError::SchemaParse {
                path: schema_file,
                message: e.to_string(),
            });
        }
        Err(source) => {
            return Err(ComponentError::SchemaMissing {
                path: schema_file,
                source,
            });
        }
    };

    let raw: Value = serde_json::from_str(&content).map_err(|e| ComponentError::SchemaParse {
        path: schema_file.clone(),
        message: e.to_string(),
    })?;

    normalize_schema(raw, &schema_file, policy)
}

/// Normalize a parsed shorthand schema.
///
/// `schema_file` is only used for error messages.
pub fn normalize_schema(
    raw: Value,
    schema_file: &Path,
    policy: SchemaPolicy,
) -> ComponentResult<Option<Value>> {
    let has_properties = raw
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|properties| !properties.is_empty());
    let raw = match raw {
        Value::Object(raw) if has_properties => raw,
        _ if policy.is_required() => {
            return Err(ComponentError::SchemaIncomplete {
                path: schema_file.to_path_buf(),
            });
        }
        _ => return Ok(None),
    };

    let required = match raw.get("required") {
        Some(declared) if !is_string_list(declared) => declared.clone(),
        _ => Value::from(compute_required(&raw)),
    };

    let mut schema = Map::new();
    for (keyword, value) in &raw {
        if !REWRITTEN_KEYWORDS.contains(&keyword.as_str()) {
            schema.insert(keyword.clone(), value.clone());
        }
    }
    schema.insert("$schema".to_string(), Value::from(SCHEMA_DIALECT));
    if let Some(name) = raw.get("name") {
        schema.insert("title".to_string(), name.clone());
    }
    schema.insert("properties".to_string(), raw["properties"].clone());
    schema.insert("type".to_string(), Value::from("object"));
    if required.as_array().is_none_or(|names| !names.is_empty()) {
        schema.insert("required".to_string(), required);
    }

    let schema = Value::Object(schema);
    let violations = meta_violations(&schema);
    if !violations.is_empty() {
        return Err(ComponentError::SchemaInvalid {
            path: schema_file.to_path_buf(),
            message: violations.join(", "),
        });
    }

    tracing::debug!(file = %schema_file.display(), "Loaded component schema");
    Ok(Some(schema))
}

/// Every violation of the draft-04 meta-schema by `schema`.
fn meta_violations(schema: &Value) -> Vec<String> {
    let meta_schema = serde_json::json!({ "$ref": SCHEMA_DIALECT });
    match jsonschema::draft4::new(&meta_schema) {
        Ok(validator) => validator.iter_errors(schema).map(|e| e.to_string()).collect(),
        Err(e) => vec![format!("Invalid meta-schema: {}", e)],
    }
}

/// Compute the required property set of a shorthand schema.
///
/// The result is the explicit `required` list followed by every property
/// that declares no `default`, without duplicates. Properties that appear
/// in a top-level `oneOf`/`anyOf` requirement group are left to that group.
pub fn compute_required(raw: &Map<String, Value>) -> Vec<String> {
    let mut required = Vec::new();

    let declared = raw.get("required").and_then(Value::as_array);
    for name in declared.into_iter().flatten().filter_map(Value::as_str) {
        push_unique(&mut required, name);
    }

    let alternatives = alternative_properties(raw);
    if let Some(properties) = raw.get("properties").and_then(Value::as_object) {
        for (name, property) in properties {
            let has_default = property.get("default").is_some();
            if !has_default && !alternatives.contains(name.as_str()) {
                push_unique(&mut required, name);
            }
        }
    }

    required
}

/// Property names required by some alternative of `oneOf`/`anyOf`.
fn alternative_properties(raw: &Map<String, Value>) -> HashSet<&str> {
    ALTERNATIVE_KEYWORDS
        .iter()
        .filter_map(|keyword| raw.get(*keyword).and_then(Value::as_array))
        .flatten()
        .filter_map(|alternative| alternative.get("required").and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_str)
        .collect()
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|existing| existing == name) {
        names.push(name.to_string());
    }
}

fn is_string_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_string))
}

/// Write schema defaults into missing render data fields, descending into
/// nested object schemas where the data already has an object.
pub fn apply_defaults(render_data: &mut RenderData, schema: &Value) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    for (name, property) in properties {
        if let Some(Value::Object(nested)) = render_data.get_mut(name) {
            apply_defaults(nested, property);
            continue;
        }
        if !render_data.contains_key(name) {
            if let Some(default) = property.get("default") {
                render_data.insert(name.clone(), default.clone());
            }
        }
    }
}

/// Validate render data against a normalized schema.
///
/// Succeeds trivially without a schema. Otherwise defaults are applied
/// first and every violation is reported, joined with `", "`.
pub fn validate_render_data(
    component_name: &str,
    render_data: &mut RenderData,
    schema: Option<&Value>,
) -> ComponentResult<()> {
    let Some(schema) = schema else {
        return Ok(());
    };
    apply_defaults(render_data, schema);

    let validation_error = |message: String| ComponentError::Validation {
        component: component_name.to_string(),
        message,
    };
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| validation_error(format!("Invalid schema: {}", e)))?;

    let instance = Value::Object(render_data.clone());
    let messages: Vec<String> = validator
        .iter_errors(&instance)
        .map(|e| e.to_string())
        .collect();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(validation_error(messages.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::PathBuf;

    const SCHEMA_FILE: &str = "/c/button/pattern.json";

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("Expected an object"),
        }
    }

    fn load(content: Option<&str>, policy: SchemaPolicy) -> ComponentResult<Option<Value>> {
        let mut loader = MemoryLoader::new();
        if let Some(content) = content {
            loader.add(SCHEMA_FILE, content);
        }
        load_schema(Path::new("/c/button"), "pattern.json", policy, &loader)
    }

    #[test]
    fn test_required_by_absence_of_default() {
        let schema = raw(json!({
            "properties": {
                "color": {"type": "string"},
                "size": {"type": "string", "default": "m"},
                "label": {"type": "string"}
            }
        }));
        assert_eq!(compute_required(&schema), vec!["color", "label"]);
    }

    #[test]
    fn test_required_union_is_deduplicated() {
        let schema = raw(json!({
            "required": ["label", "size", "label"],
            "properties": {
                "label": {"type": "string"},
                "size": {"type": "string", "default": "m"}
            }
        }));
        assert_eq!(compute_required(&schema), vec!["label", "size"]);
    }

    #[test]
    fn test_alternatives_are_not_implicitly_required() {
        let schema = raw(json!({
            "properties": {
                "href": {"type": "string"},
                "onClick": {"type": "string"},
                "label": {"type": "string"}
            },
            "oneOf": [{"required": ["href"]}, {"required": ["onClick"]}]
        }));
        assert_eq!(compute_required(&schema), vec!["label"]);
    }

    #[test]
    fn test_normalized_shape() {
        let schema = load(
            Some(r#"{"name": "Button", "properties": {"color": {"type": "string"}}}"#),
            SchemaPolicy::Optional,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            schema,
            json!({
                "$schema": SCHEMA_DIALECT,
                "title": "Button",
                "properties": {"color": {"type": "string"}},
                "type": "object",
                "required": ["color"]
            })
        );
    }

    #[test]
    fn test_empty_required_is_omitted() {
        let schema = load(
            Some(r#"{"properties": {"size": {"type": "string", "default": "m"}}}"#),
            SchemaPolicy::Optional,
        )
        .unwrap()
        .unwrap();
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_missing_schema_optional() {
        assert_eq!(load(None, SchemaPolicy::Optional).unwrap(), None);
    }

    #[test]
    fn test_missing_schema_required() {
        let err = load(None, SchemaPolicy::Required).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No such file or directory, open '/c/button/pattern.json'"
        );
    }

    #[test]
    fn test_schema_parse_error() {
        let err = load(Some("{\"properties\": {}}}"), SchemaPolicy::Required).unwrap_err();
        match &err {
            ComponentError::SchemaParse { path, .. } => assert_eq!(path, &PathBuf::from(SCHEMA_FILE)),
            other => panic!("Expected SchemaParse, got {:?}", other),
        }
        assert!(err.to_string().starts_with("Failed to parse /c/button/pattern.json "));
    }

    #[test]
    fn test_incomplete_schema() {
        let err = load(Some(r#"{"name": "Button"}"#), SchemaPolicy::Required).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Schema /c/button/pattern.json is missing a property definition");

        assert_eq!(load(Some(r#"{"name": "Button"}"#), SchemaPolicy::Optional).unwrap(), None);
        assert_eq!(load(Some(r#"{"properties": {}}"#), SchemaPolicy::Optional).unwrap(), None);
    }

    #[test]
    fn test_meta_schema_violation() {
        let err = load(
            Some(r#"{"properties": {"x": {"type": "colour"}}}"#),
            SchemaPolicy::Required,
        )
        .unwrap_err();
        assert!(matches!(err, ComponentError::SchemaInvalid { .. }));
        assert!(err.to_string().starts_with("Error in /c/button/pattern.json: \""));
    }

    #[test]
    fn test_meta_schema_violations_are_joined() {
        let err = load(
            Some(r#"{"name": 5, "properties": {"x": {"type": "colour"}}}"#),
            SchemaPolicy::Required,
        )
        .unwrap_err();
        let ComponentError::SchemaInvalid { message, .. } = &err else {
            panic!("Expected SchemaInvalid, got {:?}", err);
        };
        assert!(message.contains("5 is not of type \"string\""));
        assert!(message.contains("\"colour\""));
        assert!(message.contains(", "));
    }

    #[test]
    fn test_invalid_utf8_schema_is_a_parse_error() {
        for policy in [SchemaPolicy::Optional, SchemaPolicy::Required] {
            let mut loader = MemoryLoader::new();
            loader.add(SCHEMA_FILE, vec![0xff, 0xfe]);
            let err = load_schema(Path::new("/c/button"), "pattern.json", policy, &loader)
                .unwrap_err();
            assert!(matches!(err, ComponentError::SchemaParse { .. }));
            assert!(err.to_string().starts_with("Failed to parse /c/button/pattern.json "));
        }
    }

    #[test]
    fn test_malformed_required_is_reported_by_meta_validation() {
        let err = load(
            Some(r#"{"required": "color", "properties": {"color": {"type": "string"}}}"#),
            SchemaPolicy::Required,
        )
        .unwrap_err();
        assert!(matches!(err, ComponentError::SchemaInvalid { .. }));
    }

    #[test]
    fn test_validate_without_schema() {
        let mut data = RenderData::new();
        assert!(validate_render_data("x", &mut data, None).is_ok());
    }

    #[test]
    fn test_validate_missing_required_property() {
        let schema = normalize_schema(
            json!({"properties": {"color": {"type": "string"}}}),
            Path::new(SCHEMA_FILE),
            SchemaPolicy::Optional,
        )
        .unwrap();

        let mut data = RenderData::new();
        let err = validate_render_data("fixtures/button", &mut data, schema.as_ref()).unwrap_err();
        assert!(matches!(err, ComponentError::Validation { .. }));
        assert!(err.to_string().contains("color"));

        data.insert("color".to_string(), json!("teal"));
        assert!(validate_render_data("fixtures/button", &mut data, schema.as_ref()).is_ok());
    }

    #[test]
    fn test_validate_type_mismatch() {
        let schema = normalize_schema(
            json!({"properties": {"count": {"type": "integer"}}}),
            Path::new(SCHEMA_FILE),
            SchemaPolicy::Optional,
        )
        .unwrap();
        let mut data = RenderData::new();
        data.insert("count".to_string(), json!("three"));
        let err = validate_render_data("counter", &mut data, schema.as_ref()).unwrap_err();
        assert!(err.to_string().contains("three"));
    }

    #[test]
    fn test_validate_alternative_groups() {
        let schema = normalize_schema(
            json!({
                "properties": {"href": {"type": "string"}, "onClick": {"type": "string"}},
                "oneOf": [{"required": ["href"]}, {"required": ["onClick"]}]
            }),
            Path::new(SCHEMA_FILE),
            SchemaPolicy::Optional,
        )
        .unwrap();

        let mut with_href = RenderData::new();
        with_href.insert("href".to_string(), json!("/home"));
        assert!(validate_render_data("link", &mut with_href, schema.as_ref()).is_ok());

        let mut neither = RenderData::new();
        assert!(validate_render_data("link", &mut neither, schema.as_ref()).is_err());
    }

    #[test]
    fn test_defaults_are_applied() {
        let schema = json!({
            "properties": {
                "size": {"default": "m"},
                "color": {"default": "red"},
                "layout": {"properties": {"gap": {"default": 4}}}
            }
        });
        let mut data = RenderData::new();
        data.insert("color".to_string(), json!("teal"));
        data.insert("layout".to_string(), json!({}));
        apply_defaults(&mut data, &schema);
        assert_eq!(
            Value::Object(data),
            json!({"size": "m", "color": "teal", "layout": {"gap": 4}})
        );
    }
}
