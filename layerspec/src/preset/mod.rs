//! Named preset layers: storage, inheritance resolution, and selection.
//!
//! A preset is a named fragment of document fields. Presets support exactly
//! one `_inherits` reference (a preset in an outer configuration scope, used
//! to seed fields) and one `_extends` reference (a more general preset in the
//! same table, used as a base to layer on top of). Keys beginning with `_`
//! are metadata and are never projected into the composed document.

use indexmap::IndexMap;
use serde_json::Value;

use crate::document::{Document, KeyPath, Node};
use crate::error::ComposeError;

/// Reserved prefix marking preset metadata keys.
pub const METADATA_PREFIX: char = '_';

/// Metadata key naming a preset in an outer scope to inherit fields from.
pub const INHERITS_KEY: &str = "_inherits";

/// Metadata key naming a preset in the same scope to extend.
pub const EXTENDS_KEY: &str = "_extends";

/// Source-document key re-declaring the preset selection for a subtree.
pub const SELECTION_KEY: &str = "presets";

/// Field bundle of a single preset, metadata included.
pub type PresetFields = serde_json::Map<String, Value>;

/// Whether `key` is a reserved metadata key.
#[must_use]
pub fn is_metadata(key: &str) -> bool {
    key.starts_with(METADATA_PREFIX)
}

/// Table of named presets, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetTable {
    presets: IndexMap<String, PresetFields>,
}

impl PresetTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a mapping of preset names to field mappings.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MalformedInput`] when the value or any preset
    /// body is not a mapping.
    pub fn from_value(value: &Value) -> Result<Self, ComposeError> {
        let root = KeyPath::root();
        let Value::Object(map) = value else {
            return Err(ComposeError::malformed(&root, "preset table must be a mapping"));
        };
        let mut table = Self::new();
        for (name, body) in map {
            let Value::Object(fields) = body else {
                return Err(ComposeError::malformed(
                    &root.child(name),
                    "preset body must be a mapping",
                ));
            };
            table.insert(name.clone(), fields.clone());
        }
        Ok(table)
    }

    /// Insert or replace a preset.
    pub fn insert(&mut self, name: impl Into<String>, fields: PresetFields) {
        self.presets.insert(name.into(), fields);
    }

    /// Fields of the preset `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PresetFields> {
        self.presets.get(name)
    }

    /// Whether the table holds a preset called `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Preset names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Resolve all `_inherits` and `_extends` references.
    ///
    /// `parent` is the already-resolved table of the enclosing configuration
    /// scope, or `None` at the outermost scope. Resolution is two-phased:
    /// every `_inherits` is applied against `parent` first, then every
    /// `_extends` is applied against the post-inheritance state of this
    /// table. Extension is deliberately single-hop: a base's own `_extends`
    /// is not flattened transitively.
    ///
    /// Unresolvable references are skipped, leaving the preset with only its
    /// declared fields; this is never an error.
    #[must_use]
    pub fn resolve(&self, parent: Option<&Self>) -> Self {
        let mut inherited: IndexMap<String, PresetFields> = IndexMap::new();
        for (name, fields) in &self.presets {
            let resolved = match reference(fields, INHERITS_KEY) {
                Some(base_name) => match parent.and_then(|table| table.get(base_name)) {
                    Some(base) => deep_merge(&strip_metadata(base), fields),
                    None => {
                        tracing::debug!(
                            preset = name.as_str(),
                            base = base_name,
                            "inherited preset not found in parent scope; skipping inheritance"
                        );
                        fields.clone()
                    }
                },
                None => fields.clone(),
            };
            inherited.insert(name.clone(), resolved);
        }

        let mut resolved_table = Self::new();
        for (name, fields) in &inherited {
            let resolved = match reference(fields, EXTENDS_KEY) {
                Some(base_name) => match inherited.get(base_name) {
                    Some(base) => deep_merge(&strip_metadata(base), fields),
                    None => {
                        tracing::debug!(
                            preset = name.as_str(),
                            base = base_name,
                            "extended preset not found; skipping extension"
                        );
                        fields.clone()
                    }
                },
                None => fields.clone(),
            };
            resolved_table.insert(name.clone(), resolved);
        }
        resolved_table
    }

    /// Project the sub-fields applicable below the indexed or nested key
    /// `key`: every preset whose fields contain a mapping under `key`
    /// contributes that mapping under its own name.
    #[must_use]
    pub fn project(&self, key: &str) -> Self {
        let mut projected = Self::new();
        for (name, fields) in &self.presets {
            if let Some(Value::Object(sub)) = fields.get(key) {
                projected.insert(name.clone(), sub.clone());
            }
        }
        projected
    }
}

fn reference<'f>(fields: &'f PresetFields, key: &str) -> Option<&'f str> {
    fields.get(key).and_then(Value::as_str)
}

fn strip_metadata(fields: &PresetFields) -> PresetFields {
    fields
        .iter()
        .filter(|(key, _)| !is_metadata(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Field-wise recursive merge: mappings merge key by key, anything else is
/// replaced wholesale by the overlay.
fn deep_merge(base: &PresetFields, overlay: &PresetFields) -> PresetFields {
    let mut merged = base.clone();
    for (key, value) in overlay {
        match (merged.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                *existing = deep_merge(&existing.clone(), incoming);
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Ordered, precedence-bearing list of selected preset names.
///
/// Later entries take precedence over earlier ones when both set the same
/// key. A name re-declared at a deeper document level moves to the end of
/// the effective order for that subtree only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    names: Vec<String>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from an ordered list of names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::new();
        for name in names {
            selection.redeclare(&name.into());
        }
        selection
    }

    /// Move `name` to the end of the selection, adding it if absent.
    pub fn redeclare(&mut self, name: &str) {
        self.names.retain(|existing| existing != name);
        self.names.push(name.to_owned());
    }

    /// Selected names in precedence order (lowest first).
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Effective selection for a level, honouring a `presets` re-declaration
    /// in the level's source document.
    ///
    /// Accepts either a single string or a sequence of strings, matching the
    /// two spellings accepted in source documents. Non-string entries are
    /// ignored.
    #[must_use]
    pub(crate) fn redeclared_from(&self, source: Option<&Document>) -> Self {
        let mut effective = self.clone();
        let declared = source.and_then(|doc| doc.get(SELECTION_KEY));
        match declared {
            Some(Node::Leaf(Value::String(name))) => effective.redeclare(name),
            Some(Node::Leaf(Value::Array(names))) => {
                for name in names.iter().filter_map(Value::as_str) {
                    effective.redeclare(name);
                }
            }
            _ => {}
        }
        effective
    }
}

#[cfg(test)]
mod tests;
