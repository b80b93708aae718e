/*
 * attribute.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsing of inline component arguments.
//!
//! `{{component "x" size="['col-md-6', 'col-lg-6']"}}` passes `size` as a
//! string. Strings wrapped in `'…'`, `[…]` or `{…}` are parsed as lenient
//! literals; everything else is handed to the template unchanged.

use serde_json::Value;

use crate::literal::{self, LiteralError};

/// First/last character pairs that mark a string as a literal.
const LITERAL_WRAPPERS: [(char, char); 3] = [('\'', '\''), ('[', ']'), ('{', '}')];

/// Whether a string argument should be parsed as a literal.
pub fn is_literal_candidate(value: &str) -> bool {
    let (Some(first), Some(last)) = (value.chars().next(), value.chars().next_back()) else {
        return false;
    };
    LITERAL_WRAPPERS.contains(&(first, last))
}

/// Parse a single argument value.
///
/// Non-strings and strings that are not literal candidates pass through
/// unchanged, so `"42"` stays a string. The error carries only the parser
/// message; callers attach component and argument context.
pub fn parse_attribute(value: &Value) -> Result<Value, LiteralError> {
    match value {
        Value::String(s) if is_literal_candidate(s) => literal::parse(s),
        other => Ok(other.clone()),
    }
}
