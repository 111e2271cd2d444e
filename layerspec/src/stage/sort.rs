//! Deterministic sorter: rewrites the document with a stable key order.

use crate::document::{Document, Node, index_order, is_index};
use crate::error::ComposeError;
use crate::pipeline::ComposerConfig;
use crate::schema::Shape;

use super::Stage;

const NAME: &str = "sort";

/// Produces a new document with identical content but deterministic key
/// ordering at every level: configured header keys first (in their given
/// priority order), then remaining non-indexed keys lexicographically, then
/// indexed-level keys lexicographically, then configured footer keys.
/// Numeric children of an indexed level are ordered by ascending index.
///
/// Sorting is a full reconstruction, never in place, and is idempotent.
/// Provenance tags travel with their entries unchanged.
#[derive(Debug, Clone)]
pub struct Sort {
    shape: Shape,
    header: Vec<String>,
    footer: Vec<String>,
}

impl Sort {
    /// Build the stage for the given shape and header/footer key lists.
    #[must_use]
    pub fn new(shape: Shape, header: Vec<String>, footer: Vec<String>) -> Self {
        Self {
            shape,
            header,
            footer,
        }
    }

    pub(crate) fn from_config(config: &ComposerConfig) -> Self {
        Self::new(
            config.schema.clone(),
            config.header_keys.clone(),
            config.footer_keys.clone(),
        )
    }

    fn level_order(&self, source: &Document, shape: &Shape) -> Vec<String> {
        let pinned =
            |key: &str| self.header.iter().any(|h| h == key) || self.footer.iter().any(|f| f == key);

        let mut order: Vec<String> = self
            .header
            .iter()
            .filter(|key| source.contains_key(key))
            .cloned()
            .collect();

        let mut body: Vec<String> = source
            .keys()
            .filter(|key| !pinned(key) && !shape.is_indexed(key))
            .map(ToOwned::to_owned)
            .collect();
        body.sort();
        order.extend(body);

        let mut indexed: Vec<String> = source
            .keys()
            .filter(|key| !pinned(key) && shape.is_indexed(key))
            .map(ToOwned::to_owned)
            .collect();
        indexed.sort();
        order.extend(indexed);

        order.extend(
            self.footer
                .iter()
                .filter(|key| source.contains_key(key))
                .cloned(),
        );
        order
    }

    fn index_container_order(source: &Document) -> Vec<String> {
        let mut indices = source.digit_keys();
        indices.sort_by_key(|key| index_order(key));
        let mut rest: Vec<String> = source
            .keys()
            .filter(|key| !is_index(key))
            .map(ToOwned::to_owned)
            .collect();
        rest.sort();
        indices.extend(rest);
        indices
    }

    fn process_level(
        &self,
        source: &Document,
        out: &mut Document,
        shape: &Shape,
        index_container: bool,
    ) {
        let order = if index_container {
            Self::index_container_order(source)
        } else {
            self.level_order(source, shape)
        };
        for key in order {
            let Some(node) = source.get(&key) else {
                continue;
            };
            let tag = source.provenance(&key);
            match node {
                Node::Doc(sub_source) => {
                    let child = out.ensure_child(&key, tag);
                    if index_container {
                        // Each index child is a plain level governed by the
                        // same sub-shape.
                        self.process_level(sub_source, child, shape, false);
                    } else if let Some(sub_shape) = shape.child(&key) {
                        self.process_level(sub_source, child, sub_shape, true);
                    } else {
                        let empty = Shape::default();
                        self.process_level(sub_source, child, &empty, false);
                    }
                }
                Node::Leaf(value) => out.set_scalar(&key, value, tag),
            }
        }
    }
}

impl Stage for Sort {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, doc: Document, _source: &Document) -> Result<Document, ComposeError> {
        let mut out = Document::new();
        self.process_level(&doc, &mut out, &self.shape, false);
        Ok(out)
    }
}
