//! Front matter splitting and parsing.
//!
//! A content file is a YAML mapping, a blank line, then the body. Without a
//! blank line the whole file is body.

use std::path::Path;

use folio_core::{CoreError, Result};
use serde_yaml::{Mapping, Value};

/// Split content at the first blank line into `(front matter, body)`.
pub fn split_frontmatter(content: &str) -> (&str, &str) {
    match content.split_once("\n\n") {
        Some((head, body)) => (head, body),
        None => ("", content),
    }
}

/// Parse a front matter block into a mapping. An empty block is an empty mapping.
pub fn parse_frontmatter(head: &str, path: &Path) -> Result<Mapping> {
    if head.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value =
        serde_yaml::from_str(head).map_err(|e| CoreError::frontmatter(path, e.to_string()))?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(CoreError::frontmatter(
            path,
            format!("expected a key/value mapping, found {}", kind(&other)),
        )),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
