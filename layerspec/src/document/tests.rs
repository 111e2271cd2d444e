//! Tests for the document model.

use super::*;
use anyhow::{Result, anyhow, ensure};
use serde_json::json;

#[test]
fn set_scalar_stores_an_independent_copy() -> Result<()> {
    let mut source = json!({"colour": ["red", "green"]});
    let mut doc = Document::new();
    let Some(colour) = source.get("colour") else {
        return Err(anyhow!("fixture missing colour"));
    };
    doc.set_scalar("colour", colour, None);
    if let Some(Value::Array(items)) = source.get_mut("colour") {
        items.push(json!("blue"));
    }
    ensure!(
        doc.get("colour").and_then(Node::as_leaf) == Some(&json!(["red", "green"])),
        "mutating the source leaked into the document"
    );
    Ok(())
}

#[test]
fn ensure_child_never_overwrites_existing_content() -> Result<()> {
    let mut doc = Document::new();
    doc.ensure_child("figures", Some("initialize"))
        .set_scalar("width", &json!(4), Some("defaults"));
    let child = doc.ensure_child("figures", Some("presets"));
    ensure!(
        child.get("width").and_then(Node::as_leaf) == Some(&json!(4)),
        "existing child content was lost"
    );
    ensure!(
        doc.provenance("figures") == Some("initialize"),
        "original provenance tag was replaced"
    );
    Ok(())
}

#[test]
fn ensure_child_replaces_a_leaf_with_an_empty_child() -> Result<()> {
    let mut doc = Document::new();
    doc.set_scalar("figures", &json!(3), Some("defaults"));
    let child = doc.ensure_child("figures", Some("manual"));
    ensure!(child.is_empty());
    ensure!(doc.provenance("figures") == Some("manual"));
    Ok(())
}

#[test]
fn keys_preserve_insertion_order() {
    let mut doc = Document::new();
    doc.set_scalar("zebra", &json!(1), None);
    doc.set_scalar("apple", &json!(2), None);
    doc.ensure_child("mango", None);
    assert_eq!(doc.keys().collect::<Vec<_>>(), ["zebra", "apple", "mango"]);
}

#[test]
fn digit_keys_sort_numerically_not_lexicographically() {
    let mut doc = Document::new();
    for key in ["10", "2", "all", "0"] {
        doc.ensure_child(key, None);
    }
    assert_eq!(doc.digit_keys(), ["0", "2", "10"]);
}

#[test]
fn annotations_walk_the_tree_in_order() -> Result<()> {
    let mut doc = Document::new();
    doc.set_scalar("title", &json!("draft"), Some("defaults"));
    doc.ensure_child("figures", Some("initialize"))
        .set_scalar("width", &json!(4), Some("presets:manuscript"));
    let annotations = doc.annotations();
    let rendered: Vec<(String, &str)> = annotations
        .iter()
        .map(|(path, tag)| (path.to_string(), tag.as_str()))
        .collect();
    ensure!(
        rendered
            == vec![
                ("title".to_owned(), "defaults"),
                ("figures".to_owned(), "initialize"),
                ("figures.width".to_owned(), "presets:manuscript"),
            ],
        "unexpected annotations {rendered:?}"
    );
    Ok(())
}

#[test]
fn from_value_round_trips_nested_mappings() -> Result<()> {
    let value = json!({
        "title": "draft",
        "figures": {"0": {"width": 4, "panels": [1, 2]}}
    });
    let doc = Document::from_value(&value).map_err(|e| anyhow!(e))?;
    ensure!(doc.to_value() == value, "round trip changed the value");
    ensure!(doc.get_child("figures").is_some());
    Ok(())
}

#[test]
fn from_value_rejects_non_mappings() {
    assert!(matches!(
        Document::from_value(&json!([1, 2])),
        Err(ComposeError::MalformedInput { .. })
    ));
}

#[test]
fn key_path_display_names_the_offending_entry() {
    let path = KeyPath::root().child("figures").child("0").child("width");
    assert_eq!(path.to_string(), "figures.0.width");
}
