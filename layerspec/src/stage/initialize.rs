//! Shape initializer: materializes the indexed skeleton of the output.

use serde_json::Value;

use crate::document::{Document, KeyPath, Node, index_order};
use crate::error::ComposeError;
use crate::pipeline::ComposerConfig;
use crate::schema::Shape;

use super::{Stage, WILDCARD_KEY};

const NAME: &str = "initialize";

/// Walks the source document against the shape and creates the indexed
/// child groups warranted by it, without populating any leaf values.
///
/// At each indexed level, a wildcard entry is expanded first over the union
/// of already-materialized and explicitly named indices, so that indices
/// introduced by one layer are visible to the next; explicit indices follow.
/// A wildcard alone never fabricates an index.
#[derive(Debug, Clone)]
pub struct Initialize {
    shape: Shape,
    annotate: bool,
}

impl Initialize {
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
        for (key, sub_shape) in shape.iter() {
            let src_level = match source.get(key) {
                None | Some(Node::Leaf(Value::Null)) => continue,
                Some(Node::Doc(doc)) => doc,
                Some(Node::Leaf(_)) => {
                    return Err(ComposeError::malformed(
                        &path.child(key),
                        "indexed level must be a mapping",
                    ));
                }
            };
            let level_path = path.child(key);
            let explicit = src_level.digit_keys();
            let level = doc.ensure_child(key, self.tag());

            if let Some(all_node) = src_level.get(WILDCARD_KEY) {
                let all_src = match all_node {
                    Node::Doc(doc) => Some(doc),
                    Node::Leaf(Value::Null) => None,
                    Node::Leaf(_) => {
                        return Err(ComposeError::malformed(
                            &level_path.child(WILDCARD_KEY),
                            "wildcard entry must be a mapping",
                        ));
                    }
                };
                if let Some(all_src) = all_src {
                    // Union of indices known so far; the wildcard establishes
                    // which indices exist before explicit entries refine them.
                    let mut union = level.digit_keys();
                    for index in &explicit {
                        if !union.contains(index) {
                            union.push(index.clone());
                        }
                    }
                    union.sort_by_key(|index| index_order(index));
                    for index in &union {
                        let child = level.ensure_child(index, self.tag());
                        self.process_level(child, all_src, sub_shape, &level_path.child(index))?;
                    }
                }
            }

            for index in &explicit {
                let index_src = match src_level.get(index) {
                    None | Some(Node::Leaf(Value::Null)) => None,
                    Some(Node::Doc(doc)) => Some(doc),
                    Some(Node::Leaf(_)) => {
                        return Err(ComposeError::malformed(
                            &level_path.child(index),
                            "indexed entry must be a mapping",
                        ));
                    }
                };
                let child = level.ensure_child(index, self.tag());
                if let Some(index_src) = index_src {
                    self.process_level(child, index_src, sub_shape, &level_path.child(index))?;
                }
            }
        }
        Ok(())
    }
}

impl Stage for Initialize {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, mut doc: Document, source: &Document) -> Result<Document, ComposeError> {
        self.process_level(&mut doc, source, &self.shape, &KeyPath::root())?;
        Ok(doc)
    }
}
