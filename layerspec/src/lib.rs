//! Deterministic composition of layered, indexed configuration documents.
//!
//! `layerspec` builds a single output document from several layered sources:
//! a static default layer, named inheritable presets selected by name, and
//! explicit per-document overrides. The output mirrors a recursively nested
//! hierarchy in which some levels are *indexed*: they contain numbered child
//! groups, and any layer can target a specific index or all current and
//! future indices through the wildcard entry `all`.
//!
//! Composition runs as a strict pipeline of stages over one output
//! [`Document`]: initialize the indexed skeleton, merge defaults, apply
//! selected presets, copy manual overrides, and finally sort keys into a
//! stable order. Pipeline order is precedence order; each later stage's
//! writes win over earlier ones.
//!
//! The crate neither reads nor writes files. Drivers hand it plain parsed
//! values (the optional `yaml` feature provides text-to-value helpers) and
//! render the composed document however they like, optionally using the
//! per-entry provenance tags exposed by [`Document::annotations`].

mod document;
mod error;
mod pipeline;
mod preset;
mod schema;
pub mod stage;
#[cfg(feature = "yaml")]
pub mod yaml;

pub use document::{Document, KeyPath, Node};
pub use error::ComposeError;
pub use pipeline::{Composer, ComposerConfig};
pub use preset::{
    EXTENDS_KEY, INHERITS_KEY, METADATA_PREFIX, PresetFields, PresetTable, SELECTION_KEY,
    Selection, is_metadata,
};
pub use schema::Shape;
pub use stage::{Stage, StageKind, WILDCARD_KEY};
