//! Composition stages and the stage registry.
//!
//! Each stage implements one uniform contract: consume the output document
//! produced so far, consult the shared source document, and return the
//! updated output. Stages are identified by a fixed [`StageKind`]
//! enumeration and resolved to implementations when a
//! [`Composer`](crate::Composer) is constructed, not at call time.

mod defaults;
mod initialize;
mod manual;
mod presets;
mod sort;

use std::fmt;
use std::str::FromStr;

use crate::document::Document;
use crate::error::ComposeError;
use crate::pipeline::ComposerConfig;

pub use defaults::Defaults;
pub use initialize::Initialize;
pub use manual::Manual;
pub use presets::Presets;
pub use sort::Sort;

/// Wildcard index entry applied to every index of an indexed level before
/// index-specific entries.
pub const WILDCARD_KEY: &str = "all";

/// One step of the composition pipeline.
pub trait Stage {
    /// Stage name, used for provenance tags and logging.
    fn name(&self) -> &'static str;

    /// Apply this stage, consuming the output document produced so far.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MalformedInput`] when a scalar or sequence is
    /// found where the stage requires a mapping.
    fn apply(&self, doc: Document, source: &Document) -> Result<Document, ComposeError>;
}

/// The fixed set of stage kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Materialize the indexed skeleton from the source document.
    Initialize,
    /// Merge the static default layer.
    Defaults,
    /// Resolve and apply selected presets.
    Presets,
    /// Copy explicit source values, the highest-precedence layer.
    Manual,
    /// Rewrite the document with deterministic key ordering.
    Sort,
}

impl StageKind {
    /// The conventional pipeline order.
    pub const DEFAULT_ORDER: [Self; 5] = [
        Self::Initialize,
        Self::Defaults,
        Self::Presets,
        Self::Manual,
        Self::Sort,
    ];

    /// Stable name of this stage kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Defaults => "defaults",
            Self::Presets => "presets",
            Self::Manual => "manual",
            Self::Sort => "sort",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StageKind {
    type Err = ComposeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::DEFAULT_ORDER
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ComposeError::UnknownStage {
                name: name.to_owned(),
            })
    }
}

/// Resolve a stage kind to its implementation for `config`.
pub(crate) fn build(kind: StageKind, config: &ComposerConfig) -> Box<dyn Stage> {
    match kind {
        StageKind::Initialize => Box::new(Initialize::from_config(config)),
        StageKind::Defaults => Box::new(Defaults::from_config(config)),
        StageKind::Presets => Box::new(Presets::from_config(config)),
        StageKind::Manual => Box::new(Manual::from_config(config)),
        StageKind::Sort => Box::new(Sort::from_config(config)),
    }
}

#[cfg(test)]
mod tests;
