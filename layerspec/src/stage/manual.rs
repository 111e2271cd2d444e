//! Manual merger: copies explicit source values, the final layer.

use serde_json::Value;

use crate::document::{Document, KeyPath, Node};
use crate::error::ComposeError;
use crate::pipeline::ComposerConfig;
use crate::schema::Shape;

use super::{Stage, WILDCARD_KEY};

const NAME: &str = "manual";

/// Copies explicit values from the source document onto the output,
/// overwriting anything earlier stages wrote.
///
/// Wildcard entries are applied to every index currently present in the
/// output before the corresponding explicit index entries, so an explicit
/// index always wins over a wildcard for the same key.
#[derive(Debug, Clone)]
pub struct Manual {
    shape: Shape,
    annotate: bool,
}

impl Manual {
    /// Build the stage for the given shape.
    #[must_use]
    pub fn new(shape: Shape, annotate: bool) -> Self {
        Self { shape, annotate }
    }

    pub(crate) fn from_config(config: &ComposerConfig) -> Self {
        Self::new(config.schema.clone(), config.annotate)
    }

    fn tag(&self) -> Option<&'static str> {
        self.annotate.then_some(NAME)
    }

    fn process_level(
        &self,
        doc: &mut Document,
        source: &Document,
        shape: &Shape,
        path: &KeyPath,
    ) -> Result<(), ComposeError> {
        for (key, node) in source.iter() {
            if let Some(sub_shape) = shape.child(key) {
                let src_level = match node {
                    Node::Doc(doc) => doc,
                    Node::Leaf(Value::Null) => continue,
                    Node::Leaf(_) => {
                        return Err(ComposeError::malformed(
                            &path.child(key),
                            "indexed level must be a mapping",
                        ));
                    }
                };
                let level_path = path.child(key);
                let Some(level) = doc.get_child_mut(key) else {
                    continue;
                };

                match src_level.get(WILDCARD_KEY) {
                    Some(Node::Doc(all_src)) => {
                        for index in level.digit_keys() {
                            if let Some(child) = level.get_child_mut(&index) {
                                self.process_level(
                                    child,
                                    all_src,
                                    sub_shape,
                                    &level_path.child(&index),
                                )?;
                            }
                        }
                    }
                    Some(Node::Leaf(value)) if !value.is_null() => {
                        return Err(ComposeError::malformed(
                            &level_path.child(WILDCARD_KEY),
                            "wildcard entry must be a mapping",
                        ));
                    }
                    _ => {}
                }

                for index in src_level.digit_keys() {
                    let index_src = match src_level.get(&index) {
                        Some(Node::Doc(doc)) => doc,
                        None | Some(Node::Leaf(Value::Null)) => continue,
                        Some(Node::Leaf(_)) => {
                            return Err(ComposeError::malformed(
                                &level_path.child(&index),
                                "indexed entry must be a mapping",
                            ));
                        }
                    };
                    if let Some(child) = level.get_child_mut(&index) {
                        self.process_level(child, index_src, sub_shape, &level_path.child(&index))?;
                    }
                }
                // Keys at an indexed level that are neither indices nor the
                // wildcard carry no structural meaning and are ignored.
            } else {
                match node {
                    Node::Doc(sub_source) => {
                        let empty = Shape::default();
                        let child = doc.ensure_child(key, self.tag());
                        self.process_level(child, sub_source, &empty, &path.child(key))?;
                    }
                    Node::Leaf(value) => doc.set_scalar(key, value, self.tag()),
                }
            }
        }
        Ok(())
    }
}

impl Stage for Manual {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, mut doc: Document, source: &Document) -> Result<Document, ComposeError> {
        self.process_level(&mut doc, source, &self.shape, &KeyPath::root())?;
        Ok(doc)
    }
}
