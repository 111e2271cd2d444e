//! The ordered, annotatable nested-mapping model shared by every stage.
//!
//! A [`Document`] is an insertion-ordered map from string keys to either a
//! nested `Document` or a [`serde_json::Value`] leaf. Numeric indices are
//! represented canonically as digit strings. Each entry may carry a
//! provenance tag identifying the stage (or stage and preset) that produced
//! it; tags are diagnostics-only and never influence merge behaviour.

mod path;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ComposeError;

pub use path::KeyPath;

/// One value position in a [`Document`]: either a nested document or a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A nested mapping.
    Doc(Document),
    /// A scalar or sequence leaf value.
    Leaf(Value),
}

impl Node {
    /// Returns the nested document, if this node is one.
    #[must_use]
    pub fn as_doc(&self) -> Option<&Document> {
        match self {
            Self::Doc(doc) => Some(doc),
            Self::Leaf(_) => None,
        }
    }

    /// Returns the leaf value, if this node is one.
    #[must_use]
    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Self::Doc(_) => None,
            Self::Leaf(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    node: Node,
    provenance: Option<String>,
}

/// Ordered nested mapping with optional per-entry provenance tags.
///
/// # Examples
///
/// ```
/// use layerspec::Document;
/// use serde_json::json;
///
/// let mut doc = Document::new();
/// doc.set_scalar("title", &json!("draft"), Some("defaults"));
/// doc.ensure_child("figures", None);
/// assert_eq!(doc.provenance("title"), Some("defaults"));
/// assert_eq!(doc.keys().collect::<Vec<_>>(), ["title", "figures"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: IndexMap<String, Entry>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries at this level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether `key` is present at this level.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up the node stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key).map(|entry| &entry.node)
    }

    /// Look up the nested document stored under `key`, if any.
    #[must_use]
    pub fn get_child(&self, key: &str) -> Option<&Self> {
        self.get(key).and_then(Node::as_doc)
    }

    /// Mutable access to the nested document stored under `key`, if any.
    pub fn get_child_mut(&mut self, key: &str) -> Option<&mut Self> {
        match self.entries.get_mut(key) {
            Some(Entry {
                node: Node::Doc(doc),
                ..
            }) => Some(doc),
            _ => None,
        }
    }

    /// Store a deep copy of `value` under `key`, replacing any prior entry.
    ///
    /// The copy is independent of the caller's value: later mutation of the
    /// source cannot leak into the composed document. The provenance tag is
    /// recorded when one is supplied.
    pub fn set_scalar(&mut self, key: &str, value: &Value, provenance: Option<&str>) {
        self.entries.insert(
            key.to_owned(),
            Entry {
                node: Node::Leaf(value.clone()),
                provenance: provenance.map(ToOwned::to_owned),
            },
        );
    }

    /// Return the nested document under `key`, creating an empty one if the
    /// key is absent.
    ///
    /// An existing nested document is returned untouched; its content is
    /// never overwritten. An existing leaf under `key` is replaced by an
    /// empty nested document, consistent with later stages taking precedence
    /// over earlier ones.
    pub fn ensure_child(&mut self, key: &str, provenance: Option<&str>) -> &mut Self {
        let needs_child = !matches!(
            self.entries.get(key),
            Some(Entry {
                node: Node::Doc(_),
                ..
            })
        );
        if needs_child {
            self.entries.insert(
                key.to_owned(),
                Entry {
                    node: Node::Doc(Self::new()),
                    provenance: provenance.map(ToOwned::to_owned),
                },
            );
        }
        match self.entries.get_mut(key) {
            Some(Entry {
                node: Node::Doc(doc),
                ..
            }) => doc,
            _ => unreachable!("child document inserted above"),
        }
    }

    /// Ordered keys at this level.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Ordered `(key, node)` pairs at this level.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), &entry.node))
    }

    /// Numeric-index keys at this level, sorted ascending.
    #[must_use]
    pub fn digit_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .keys()
            .filter(|key| is_index(key))
            .cloned()
            .collect();
        keys.sort_by_key(|key| index_order(key));
        keys
    }

    /// Provenance tag recorded for `key`, if any.
    #[must_use]
    pub fn provenance(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|entry| entry.provenance.as_deref())
    }

    /// Ordered `(path, tag)` pairs for every annotated entry, recursively.
    ///
    /// This is the renderer-facing side table: a driver can use it to emit
    /// end-of-line comments or colour output lines without the document model
    /// committing to any textual representation.
    #[must_use]
    pub fn annotations(&self) -> Vec<(KeyPath, String)> {
        let mut out = Vec::new();
        self.collect_annotations(&KeyPath::root(), &mut out);
        out
    }

    fn collect_annotations(&self, path: &KeyPath, out: &mut Vec<(KeyPath, String)>) {
        for (key, entry) in &self.entries {
            let entry_path = path.child(key);
            if let Some(tag) = &entry.provenance {
                out.push((entry_path.clone(), tag.clone()));
            }
            if let Node::Doc(doc) = &entry.node {
                doc.collect_annotations(&entry_path, out);
            }
        }
    }

    /// Convert the document into a plain [`serde_json::Value`] mapping.
    ///
    /// Provenance tags are not part of the value representation.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (key, entry) in &self.entries {
            let value = match &entry.node {
                Node::Doc(doc) => doc.to_value(),
                Node::Leaf(value) => value.clone(),
            };
            map.insert(key.clone(), value);
        }
        Value::Object(map)
    }

    /// Build a document from a plain nested-mapping value.
    ///
    /// Mappings become nested documents; scalars and sequences become leaf
    /// entries. No provenance tags are recorded.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MalformedInput`] when `value` is not a
    /// mapping.
    pub fn from_value(value: &Value) -> Result<Self, ComposeError> {
        Self::from_value_at(value, &KeyPath::root())
    }

    fn from_value_at(value: &Value, path: &KeyPath) -> Result<Self, ComposeError> {
        let Value::Object(map) = value else {
            return Err(ComposeError::malformed(path, "expected a mapping"));
        };
        let mut doc = Self::new();
        for (key, entry) in map {
            match entry {
                Value::Object(_) => {
                    let child = Self::from_value_at(entry, &path.child(key))?;
                    doc.entries.insert(
                        key.clone(),
                        Entry {
                            node: Node::Doc(child),
                            provenance: None,
                        },
                    );
                }
                _ => doc.set_scalar(key, entry, None),
            }
        }
        Ok(doc)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            match &entry.node {
                Node::Doc(doc) => map.serialize_entry(key, doc)?,
                Node::Leaf(value) => map.serialize_entry(key, value)?,
            }
        }
        map.end()
    }
}

/// Whether `key` is a canonical numeric index (a non-empty digit string).
#[must_use]
pub(crate) fn is_index(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|byte| byte.is_ascii_digit())
}

/// Sort key placing numeric indices in ascending order.
pub(crate) fn index_order(key: &str) -> u64 {
    key.parse().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests;
