//! agtype decoding
//!
//! The text form of an agtype is JSON, except that vertices, edges, paths and
//! numerics carry a trailing `::vertex`, `::edge`, `::path` or `::numeric`
//! annotation. Annotations are stripped outside string literals before the
//! remainder is handed to serde_json.

use agstore_core::{GraphError, Result};
use serde_json::Value;

/// Parse the text output of one agtype value
pub fn parse(text: &str) -> Result<Value> {
    let stripped = strip_annotations(text);
    serde_json::from_str(&stripped)
        .map_err(|e| GraphError::InvalidResult(format!("malformed agtype {text:?}: {e}")))
}

/// Parse a nullable column; SQL NULL becomes `Value::Null`
pub fn parse_opt(text: Option<&str>) -> Result<Value> {
    match text {
        Some(text) => parse(text),
        None => Ok(Value::Null),
    }
}

fn strip_annotations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                while chars.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Read a column as text: strings as-is, numbers and booleans printed
pub(crate) fn as_text(value: &Value, column: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(GraphError::InvalidResult(format!(
            "expected a scalar in column {column}, got {other}"
        ))),
    }
}
