//! Stage unit tests and shared fixtures.


use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::document::Document;
use crate::schema::Shape;

use super::*;

/// Build a document from a `json!` literal.
fn doc(value: &Value) -> Result<Document> {
    Document::from_value(value).map_err(|e| anyhow!(e))
}

/// One indexed level, `level_1`, with nothing below it.
fn flat_shape() -> Shape {
    Shape::default().with_level("level_1", Shape::default())
}

/// The three-deep indexed hierarchy used by the pipeline fixtures:
/// `level_1` containing `level_2` containing `level_3`.
fn deep_shape() -> Shape {
    Shape::default().with_level(
        "level_1",
        Shape::default().with_level("level_2", Shape::default().with_level("level_3", Shape::default())),
    )
}

#[test]
fn stage_kinds_round_trip_through_names() -> Result<()> {
    for kind in StageKind::DEFAULT_ORDER {
        let parsed: StageKind = kind.name().parse().map_err(|e: ComposeError| anyhow!(e))?;
        anyhow::ensure!(parsed == kind, "{kind} did not round trip");
    }
    Ok(())
}

#[test]
fn unknown_stage_names_are_rejected() {
    assert!(matches!(
        "render".parse::<StageKind>(),
        Err(ComposeError::UnknownStage { .. })
    ));
}
