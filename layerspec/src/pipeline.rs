//! The composer: configuration plus an ordered pipeline of stages.

use crate::document::Document;
use crate::error::ComposeError;
use crate::preset::{PresetTable, Selection};
use crate::schema::Shape;
use crate::stage::{self, Stage, StageKind};

/// Static inputs shared by the pipeline stages.
///
/// A configuration bundles the indexed-shape schema with the stage-specific
/// static data: the default layer, the preset table (and optionally a
/// parent-scope table for `_inherits` resolution), the caller-level preset
/// selection, and the header/footer key lists used by the sorter. Callers
/// needing a specialized variant build their own value; there is no
/// inheritance mechanism to override.
///
/// # Examples
///
/// ```
/// use layerspec::{ComposerConfig, Shape};
///
/// let config = ComposerConfig::new(Shape::default().with_level("figures", Shape::default()))
///     .with_selection(["manuscript"])
///     .with_header_keys(["presets"]);
/// assert!(config.annotate());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComposerConfig {
    pub(crate) schema: Shape,
    pub(crate) defaults: Document,
    pub(crate) presets: PresetTable,
    pub(crate) parent_presets: Option<PresetTable>,
    pub(crate) selection: Selection,
    pub(crate) header_keys: Vec<String>,
    pub(crate) footer_keys: Vec<String>,
    pub(crate) annotate: bool,
}

impl ComposerConfig {
    /// Create a configuration for `schema` with annotation enabled and all
    /// layers empty.
    #[must_use]
    pub fn new(schema: Shape) -> Self {
        Self {
            schema,
            annotate: true,
            ..Self::default()
        }
    }

    /// Set the static default layer.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Document) -> Self {
        self.defaults = defaults;
        self
    }

    /// Set the available-preset table.
    #[must_use]
    pub fn with_presets(mut self, presets: PresetTable) -> Self {
        self.presets = presets;
        self
    }

    /// Set the enclosing scope's preset table, consulted when resolving
    /// `_inherits` references.
    #[must_use]
    pub fn with_parent_presets(mut self, parent: PresetTable) -> Self {
        self.parent_presets = Some(parent);
        self
    }

    /// Set the caller-level preset selection, lowest precedence first.
    #[must_use]
    pub fn with_selection<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = Selection::from_names(names);
        self
    }

    /// Keys pinned to the top of every sorted level, in priority order.
    #[must_use]
    pub fn with_header_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Keys pinned to the bottom of every sorted level, in priority order.
    #[must_use]
    pub fn with_footer_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.footer_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable provenance annotation (enabled by default).
    #[must_use]
    pub fn with_annotate(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Whether provenance annotation is enabled.
    #[must_use]
    pub fn annotate(&self) -> bool {
        self.annotate
    }
}

/// Runs an ordered list of stages over one shared output document.
///
/// Stage implementations are resolved from their [`StageKind`] when the
/// composer is constructed; `run` then threads a single output document
/// through them by value, each stage consuming the previous stage's result.
///
/// # Examples
///
/// ```
/// use layerspec::{Composer, ComposerConfig, Document, Shape};
/// use serde_json::json;
///
/// let shape = Shape::default().with_level("figures", Shape::default());
/// let source = Document::from_value(&json!({
///     "figures": {"0": {"width": 4}}
/// }))?;
/// let composed = Composer::new(ComposerConfig::new(shape)).run(&source)?;
/// assert_eq!(composed.to_value(), json!({"figures": {"0": {"width": 4}}}));
/// # Ok::<(), layerspec::ComposeError>(())
/// ```
pub struct Composer {
    stages: Vec<Box<dyn Stage>>,
}

impl Composer {
    /// Build a composer running the conventional stage order:
    /// initialize, defaults, presets, manual, sort.
    #[must_use]
    pub fn new(config: ComposerConfig) -> Self {
        Self::with_stages(config, &StageKind::DEFAULT_ORDER)
    }

    /// Build a composer running `kinds` in the given order.
    #[must_use]
    pub fn with_stages(config: ComposerConfig, kinds: &[StageKind]) -> Self {
        let stages = kinds
            .iter()
            .map(|kind| stage::build(*kind, &config))
            .collect();
        Self { stages }
    }

    /// Compose an output document from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MalformedInput`] when a stage finds a scalar
    /// or sequence where a mapping is required. The run is abandoned; a
    /// partially merged document is never returned.
    pub fn run(&self, source: &Document) -> Result<Document, ComposeError> {
        let mut doc = Document::new();
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), "applying stage");
            doc = stage.apply(doc, source)?;
        }
        Ok(doc)
    }
}
