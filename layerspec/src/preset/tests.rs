//! Tests for preset resolution and selection handling.

use super::*;
use anyhow::{Result, anyhow, ensure};
use rstest::rstest;
use serde_json::json;

fn table(value: serde_json::Value) -> Result<PresetTable> {
    PresetTable::from_value(&value).map_err(|e| anyhow!(e))
}

fn fields<'t>(table: &'t PresetTable, name: &str) -> Result<&'t PresetFields> {
    table
        .get(name)
        .ok_or_else(|| anyhow!("preset {name} missing from table"))
}

#[test]
fn inherits_seeds_fields_from_the_parent_scope() -> Result<()> {
    let parent = table(json!({
        "parent": {"_help": "outer", "colour": "red", "size": {"width": 4}}
    }))?;
    let child = table(json!({
        "child": {"_inherits": "parent"}
    }))?;
    let resolved = child.resolve(Some(&parent.resolve(None)));
    let child_fields = fields(&resolved, "child")?;
    ensure!(child_fields.get("colour") == Some(&json!("red")));
    ensure!(child_fields.get("size") == Some(&json!({"width": 4})));
    ensure!(
        child_fields.get("_help").is_none(),
        "parent metadata must not leak into the child"
    );
    Ok(())
}

#[test]
fn extends_layers_own_fields_over_the_base() -> Result<()> {
    let presets = table(json!({
        "general": {"colour": "red", "size": {"width": 4, "height": 3}},
        "special": {"_extends": "general", "size": {"width": 6}, "y": 9}
    }))?;
    let resolved = presets.resolve(None);
    let special = fields(&resolved, "special")?;
    ensure!(special.get("colour") == Some(&json!("red")));
    ensure!(
        special.get("size") == Some(&json!({"width": 6, "height": 3})),
        "deep merge should be field-wise, own fields winning"
    );
    ensure!(special.get("y") == Some(&json!(9)));
    Ok(())
}

#[test]
fn extends_sees_the_base_after_inheritance() -> Result<()> {
    let parent = table(json!({"outer": {"colour": "red"}}))?;
    let presets = table(json!({
        "base": {"_inherits": "outer", "size": 4},
        "leaf": {"_extends": "base"}
    }))?;
    let resolved = presets.resolve(Some(&parent.resolve(None)));
    let leaf = fields(&resolved, "leaf")?;
    ensure!(
        leaf.get("colour") == Some(&json!("red")),
        "extension base must include inherited fields"
    );
    ensure!(leaf.get("size") == Some(&json!(4)));
    Ok(())
}

#[test]
fn extension_is_single_hop() -> Result<()> {
    let presets = table(json!({
        "a": {"x": 1},
        "b": {"_extends": "a", "y": 2},
        "c": {"_extends": "b", "z": 3}
    }))?;
    let resolved = presets.resolve(None);
    let c = fields(&resolved, "c")?;
    ensure!(c.get("y") == Some(&json!(2)));
    ensure!(
        c.get("x").is_none(),
        "extension chains must not be flattened transitively"
    );
    Ok(())
}

#[rstest]
#[case::missing_inherit(json!({"p": {"_inherits": "ghost", "x": 1}}))]
#[case::missing_extend(json!({"p": {"_extends": "ghost", "x": 1}}))]
fn unresolvable_references_are_skipped(#[case] value: serde_json::Value) -> Result<()> {
    let resolved = table(value)?.resolve(None);
    let p = fields(&resolved, "p")?;
    ensure!(
        p.get("x") == Some(&json!(1)),
        "preset must keep its own declared fields"
    );
    Ok(())
}

#[test]
fn resolution_is_independently_mutable_from_the_base() -> Result<()> {
    let parent = table(json!({"parent": {"size": {"width": 4}}}))?;
    let child = table(json!({"child": {"_inherits": "parent"}}))?;
    let mut resolved = child.resolve(Some(&parent.resolve(None)));
    if let Some(Value::Object(size)) = resolved
        .presets
        .get_mut("child")
        .and_then(|fields| fields.get_mut("size"))
    {
        size.insert("width".to_owned(), json!(9));
    }
    ensure!(
        parent.get("parent").and_then(|f| f.get("size")) == Some(&json!({"width": 4})),
        "mutating the resolved child must not touch the parent table"
    );
    Ok(())
}

#[test]
fn project_keeps_only_presets_contributing_to_the_key() -> Result<()> {
    let presets = table(json!({
        "a": {"figures": {"width": 4}},
        "b": {"figures": 7},
        "c": {"colour": "red"}
    }))?;
    let projected = presets.project("figures");
    ensure!(projected.contains("a"));
    ensure!(
        !projected.contains("b"),
        "non-mapping contributions must be dropped"
    );
    ensure!(!projected.contains("c"));
    Ok(())
}

#[test]
fn preset_bodies_must_be_mappings() {
    assert!(matches!(
        PresetTable::from_value(&json!({"p": 3})),
        Err(ComposeError::MalformedInput { .. })
    ));
}

#[rstest]
#[case::string(json!("a"), vec!["b", "a"])]
#[case::list(json!(["a"]), vec!["b", "a"])]
#[case::new_name(json!(["c"]), vec!["a", "b", "c"])]
#[case::non_strings_ignored(json!([1, true]), vec!["a", "b"])]
fn redeclaration_moves_names_to_the_end(
    #[case] declared: serde_json::Value,
    #[case] expected: Vec<&str>,
) -> Result<()> {
    let inherited = Selection::from_names(["a", "b"]);
    let source =
        Document::from_value(&json!({"presets": declared})).map_err(|e| anyhow!(e))?;
    let effective = inherited.redeclared_from(Some(&source));
    ensure!(
        effective.iter().collect::<Vec<_>>() == expected,
        "unexpected effective selection {:?}",
        effective.iter().collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn selection_without_redeclaration_is_unchanged() {
    let inherited = Selection::from_names(["a", "b"]);
    let effective = inherited.redeclared_from(None);
    assert_eq!(effective, inherited);
}
