//! YAML loading helpers backed by `serde_yaml`.
//!
//! The composition core never parses text itself; these helpers sit at the
//! boundary, turning YAML text into the plain nested-mapping values the core
//! consumes. YAML permits integer mapping keys (`0:`), which are canonicalised
//! here to digit strings so indexed levels read naturally.

use serde_json::Value;

use crate::document::Document;
use crate::error::ComposeError;
use crate::preset::PresetTable;
use crate::schema::Shape;

/// Parse YAML text into a plain nested value with string keys.
///
/// # Errors
///
/// Returns [`ComposeError::Parse`] when the text is not valid YAML or uses a
/// mapping key that cannot be represented as a string.
pub fn value_from_str(text: &str) -> Result<Value, ComposeError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|err| ComposeError::parse(err.to_string()))?;
    to_json(value)
}

/// Parse YAML text into a [`Document`].
///
/// An empty or all-comment input yields an empty document, so an absent
/// layer stays a no-op.
///
/// # Errors
///
/// Returns [`ComposeError::Parse`] on invalid YAML and
/// [`ComposeError::MalformedInput`] when the top-level value is not a
/// mapping.
pub fn document_from_str(text: &str) -> Result<Document, ComposeError> {
    match value_from_str(text)? {
        Value::Null => Ok(Document::new()),
        value => Document::from_value(&value),
    }
}

/// Parse YAML text into an indexed-shape [`Shape`].
///
/// # Errors
///
/// Returns [`ComposeError::Parse`] on invalid YAML and
/// [`ComposeError::InvalidShape`] when a non-mapping, non-null value appears
/// at any key.
pub fn shape_from_str(text: &str) -> Result<Shape, ComposeError> {
    Shape::from_value(&value_from_str(text)?)
}

/// Parse YAML text into a [`PresetTable`].
///
/// # Errors
///
/// Returns [`ComposeError::Parse`] on invalid YAML and
/// [`ComposeError::MalformedInput`] when the table or a preset body is not a
/// mapping.
pub fn presets_from_str(text: &str) -> Result<PresetTable, ComposeError> {
    match value_from_str(text)? {
        Value::Null => Ok(PresetTable::new()),
        value => PresetTable::from_value(&value),
    }
}

fn to_json(value: serde_yaml::Value) -> Result<Value, ComposeError> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| ComposeError::parse("non-finite number"))?
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(to_json).collect::<Result<_, _>>()?)
        }
        serde_yaml::Value::Mapping(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map {
                out.insert(key_to_string(key)?, to_json(entry)?);
            }
            Value::Object(out)
        }
        serde_yaml::Value::Tagged(tagged) => to_json(tagged.value)?,
    })
}

fn key_to_string(key: serde_yaml::Value) -> Result<String, ComposeError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(ComposeError::parse(format!(
            "unsupported mapping key: {other:?}"
        ))),
    }
}
