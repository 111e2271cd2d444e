//! The indexed-shape schema describing which keys own numbered child groups.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::document::KeyPath;
use crate::error::ComposeError;

/// Recursive description of the indexed levels of a document hierarchy.
///
/// Every key present in a shape denotes an *indexed level*: a level whose
/// children are keyed by numeric index rather than by fixed field name. The
/// sub-shape under a key describes the indexed levels found inside each of
/// that level's indices. Keys absent from the shape are ordinary nested
/// fields.
///
/// A shape is supplied once per composer invocation and never modified by a
/// stage.
///
/// # Examples
///
/// ```
/// use layerspec::Shape;
///
/// let shape = Shape::default().with_level("figures", Shape::default().with_level("subplots", Shape::default()));
/// assert!(shape.is_indexed("figures"));
/// assert!(!shape.is_indexed("title"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    levels: BTreeMap<String, Shape>,
}

impl Shape {
    /// Build a shape from a nested mapping value.
    ///
    /// A `null` value stands for an empty sub-shape, so the natural YAML
    /// spelling `figures:\n  subplots:` works unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::InvalidShape`] when a value other than a
    /// mapping or `null` appears at any key.
    pub fn from_value(value: &Value) -> Result<Self, ComposeError> {
        Self::from_value_at(value, &KeyPath::root())
    }

    fn from_value_at(value: &Value, path: &KeyPath) -> Result<Self, ComposeError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => {
                let mut levels = BTreeMap::new();
                for (key, sub) in map {
                    levels.insert(key.clone(), Self::from_value_at(sub, &path.child(key))?);
                }
                Ok(Self { levels })
            }
            _ => Err(ComposeError::invalid_shape(
                path,
                "expected a mapping or null",
            )),
        }
    }

    /// Add an indexed level to this shape, builder style.
    #[must_use]
    pub fn with_level(mut self, key: impl Into<String>, sub: Self) -> Self {
        self.levels.insert(key.into(), sub);
        self
    }

    /// Whether `key` denotes an indexed level at this depth.
    #[must_use]
    pub fn is_indexed(&self, key: &str) -> bool {
        self.levels.contains_key(key)
    }

    /// Sub-shape of the indexed level `key`, if `key` is indexed here.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&Self> {
        self.levels.get(key)
    }

    /// Indexed level keys at this depth with their sub-shapes.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Self)> {
        self.levels.iter().map(|(key, sub)| (key.as_str(), sub))
    }

    /// Whether this shape declares no indexed levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
