//! Preset merger: applies selected presets in precedence order.

use serde_json::Value;

use crate::document::Document;
use crate::error::ComposeError;
use crate::pipeline::ComposerConfig;
use crate::preset::{PresetTable, Selection, is_metadata};
use crate::schema::Shape;

use super::Stage;

const NAME: &str = "presets";

/// Applies every selected preset's fields in selection order: later
/// selections override earlier ones for the same key.
///
/// The preset table is resolved once at construction, before any
/// application. At each level the effective selection is recomputed from the
/// level's source document, so a `presets` re-declaration reorders
/// precedence for that subtree only. At indexed and nested keys the table is
/// projected down to the sub-fields applicable there before recursing.
#[derive(Debug, Clone)]
pub struct Presets {
    shape: Shape,
    table: PresetTable,
    selection: Selection,
    annotate: bool,
}

impl Presets {
    /// Build the stage from a raw preset table, resolving all `_inherits`
    /// and `_extends` references against the (already raw) parent-scope
    /// table.
    #[must_use]
    pub fn new(
        shape: Shape,
        table: &PresetTable,
        parent: Option<&PresetTable>,
        selection: Selection,
        annotate: bool,
    ) -> Self {
        let resolved_parent = parent.map(|parent| parent.resolve(None));
        let table = table.resolve(resolved_parent.as_ref());
        Self {
            shape,
            table,
            selection,
            annotate,
        }
    }

    pub(crate) fn from_config(config: &ComposerConfig) -> Self {
        Self::new(
            config.schema.clone(),
            &config.presets,
            config.parent_presets.as_ref(),
            config.selection.clone(),
            config.annotate,
        )
    }

    /// Resolved preset table applied by this stage.
    #[must_use]
    pub fn table(&self) -> &PresetTable {
        &self.table
    }

    fn container_tag(&self) -> Option<&'static str> {
        self.annotate.then_some(NAME)
    }

    fn value_tag(&self, preset: &str) -> Option<String> {
        self.annotate.then(|| format!("{NAME}:{preset}"))
    }

    fn process_level(
        &self,
        doc: &mut Document,
        source: Option<&Document>,
        shape: &Shape,
        table: &PresetTable,
        inherited: &Selection,
    ) -> Result<(), ComposeError> {
        let effective = inherited.redeclared_from(source);
        for name in effective.iter() {
            let Some(fields) = table.get(name) else {
                tracing::debug!(preset = name, "selected preset not available; skipping");
                continue;
            };
            for (key, value) in fields.iter().filter(|(key, _)| !is_metadata(key)) {
                if let Some(sub_shape) = shape.child(key) {
                    if !doc.contains_key(key) {
                        continue;
                    }
                    let projected = table.project(key);
                    let indices = doc
                        .get_child(key)
                        .map(Document::digit_keys)
                        .unwrap_or_default();
                    for index in indices {
                        let index_source = source
                            .and_then(|src| src.get_child(key))
                            .and_then(|level| level.get_child(&index));
                        let Some(child) = doc
                            .get_child_mut(key)
                            .and_then(|level| level.get_child_mut(&index))
                        else {
                            continue;
                        };
                        self.process_level(child, index_source, sub_shape, &projected, &effective)?;
                    }
                } else if let Value::Object(_) = value {
                    let projected = table.project(key);
                    let sub_source = source.and_then(|src| src.get_child(key));
                    let empty = Shape::default();
                    let child = doc.ensure_child(key, self.container_tag());
                    self.process_level(child, sub_source, &empty, &projected, &effective)?;
                } else {
                    doc.set_scalar(key, value, self.value_tag(name).as_deref());
                }
            }
        }
        Ok(())
    }
}

impl Stage for Presets {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, mut doc: Document, source: &Document) -> Result<Document, ComposeError> {
        if self.table.is_empty() {
            return Ok(doc);
        }
        self.process_level(
            &mut doc,
            Some(source),
            &self.shape,
            &self.table,
            &self.selection,
        )?;
        Ok(doc)
    }
}
