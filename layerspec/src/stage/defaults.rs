//! Default merger: applies the static default layer onto the shape.

use serde_json::Value;

use crate::document::{Document, KeyPath, Node};
use crate::error::ComposeError;
use crate::pipeline::ComposerConfig;
use crate::schema::Shape;

use super::Stage;

const NAME: &str = "defaults";

/// Merges a single static default layer onto the output document.
///
/// Defaults carry no per-index variation: at an indexed key the identical
/// default subtree is recursed into every index currently present in the
/// output, whose shape was fixed by the initializer. Scalars are set
/// unconditionally; pipeline order is the precedence order, and later stages
/// overwrite whatever this one sets.
#[derive(Debug, Clone)]
pub struct Defaults {
    shape: Shape,
    defaults: Document,
    annotate: bool,
}

impl Defaults {
    /// Build the stage for the given shape and default layer.
    #[must_use]
    pub fn new(shape: Shape, defaults: Document, annotate: bool) -> Self {
        Self {
            shape,
            defaults,
            annotate,
        }
    }

    pub(crate) fn from_config(config: &ComposerConfig) -> Self {
        Self::new(
            config.schema.clone(),
            config.defaults.clone(),
            config.annotate,
        )
    }

    fn tag(&self) -> Option<&'static str> {
        self.annotate.then_some(NAME)
    }

    fn process_level(
        &self,
        doc: &mut Document,
        shape: &Shape,
        defaults: &Document,
        path: &KeyPath,
    ) -> Result<(), ComposeError> {
        for (key, node) in defaults.iter() {
            if let Some(sub_shape) = shape.child(key) {
                let default_sub = match node {
                    Node::Doc(doc) => doc,
                    Node::Leaf(Value::Null) => continue,
                    Node::Leaf(_) => {
                        return Err(ComposeError::malformed(
                            &path.child(key),
                            "default for an indexed level must be a mapping",
                        ));
                    }
                };
                let level_path = path.child(key);
                let Some(level) = doc.get_child_mut(key) else {
                    continue;
                };
                for index in level.digit_keys() {
                    if let Some(child) = level.get_child_mut(&index) {
                        self.process_level(child, sub_shape, default_sub, &level_path.child(&index))?;
                    }
                }
            } else {
                match node {
                    Node::Doc(default_sub) => {
                        let empty = Shape::default();
                        let child = doc.ensure_child(key, self.tag());
                        self.process_level(child, &empty, default_sub, &path.child(key))?;
                    }
                    Node::Leaf(value) => doc.set_scalar(key, value, self.tag()),
                }
            }
        }
        Ok(())
    }
}

impl Stage for Defaults {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, mut doc: Document, _source: &Document) -> Result<Document, ComposeError> {
        if self.defaults.is_empty() {
            return Ok(doc);
        }
        self.process_level(&mut doc, &self.shape, &self.defaults, &KeyPath::root())?;
        Ok(doc)
    }
}
