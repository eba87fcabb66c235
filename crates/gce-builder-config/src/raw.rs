// crates/gce-builder-config/src/raw.rs
// ============================================================================
// Module: Raw Configuration Layers
// Description: Untyped key/value input and left-to-right layer merging.
// Purpose: Preserve caller key order while applying overrides.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A [`RawConfig`] is the untyped input supplied by a caller. Layers are merged
//! left to right: later layers replace values for keys that earlier layers
//! already set, and the key keeps the position where it first appeared. A JSON
//! `null` marks a recognized key as unset, so an override layer can clear a
//! value supplied by a base layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Untyped, insertion-ordered key/value configuration input.
pub type RawConfig = Map<String, Value>;

// ============================================================================
// SECTION: Merging
// ============================================================================

/// Merges `overrides` onto `base`, left to right, into a fresh map.
///
/// Inputs are never mutated.
#[must_use]
pub fn merge_layers(base: &RawConfig, overrides: &[RawConfig]) -> RawConfig {
    let mut merged = base.clone();
    for layer in overrides {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

// ============================================================================
// SECTION: Value Helpers
// ============================================================================

/// Returns a short human-readable name for the shape of `value`.
#[must_use]
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_i64() || number.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Renders a raw value the way it appears in error messages.
///
/// Strings are rendered without quotes; other values use their JSON form.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use serde_json::json;

    use super::*;

    fn layer(value: Value) -> RawConfig {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn merge_overrides_replace_values_in_place() {
        let base = layer(json!({"zone": "us-east1-a", "project_id": "base"}));
        let overrides = [layer(json!({"project_id": "override"}))];
        let merged = merge_layers(&base, &overrides);
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zone", "project_id"]);
        assert_eq!(merged["project_id"], json!("override"));
    }

    #[test]
    fn merge_appends_new_keys_in_layer_order() {
        let base = layer(json!({"zone": "us-east1-a"}));
        let overrides = [layer(json!({"b": 1})), layer(json!({"a": 2, "b": 3}))];
        let merged = merge_layers(&base, &overrides);
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zone", "b", "a"]);
        assert_eq!(merged["b"], json!(3));
    }

    #[test]
    fn merge_does_not_mutate_inputs() {
        let base = layer(json!({"zone": "us-east1-a"}));
        let overrides = [layer(json!({"zone": null}))];
        let merged = merge_layers(&base, &overrides);
        assert_eq!(base["zone"], json!("us-east1-a"));
        assert!(merged["zone"].is_null());
    }

    #[test]
    fn render_value_strips_string_quotes() {
        assert_eq!(render_value(&json!("MIGRATE")), "MIGRATE");
        assert_eq!(render_value(&json!(1)), "1");
        assert_eq!(render_value(&json!(false)), "false");
    }

    #[test]
    fn value_kind_distinguishes_integers() {
        assert_eq!(value_kind(&json!(3)), "integer");
        assert_eq!(value_kind(&json!(-3)), "integer");
        assert_eq!(value_kind(&json!(1.5)), "number");
        assert_eq!(value_kind(&json!(["a"])), "list");
    }
}
