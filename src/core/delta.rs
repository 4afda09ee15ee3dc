//! Structural difference between configuration layers
//!
//! A layer is persisted as the difference between its parent's canonical tree
//! and its own. Replaying that difference over the parent with
//! [`crate::core::document::Document::overlay`] restores the layer.
//!
//! Canonical trees leave out default values. [`diff_layer`] looks such keys
//! up in the layer itself, so an explicit `false`, `0` or `""` over a parent
//! value is kept. Removed dictionary entries cannot be expressed and do not
//! appear in the delta.

use serde_yaml::{Mapping, Value};

use crate::core::node::Node;

/// Compute `curr - prev`
///
/// Equal values are dropped, mappings are compared key by key, anything else
/// that differs is taken from `curr` wholesale. Nested mappings left empty by
/// the comparison are pruned.
pub fn diff(prev: &Value, curr: &Value) -> Value {
    match (prev, curr) {
        (Value::Mapping(prev), Value::Mapping(curr)) => {
            // Without a layer to consult nothing can fail
            Value::Mapping(diff_mapping(prev, curr, None).unwrap_or_default())
        }
        _ if prev == curr => Value::Mapping(Mapping::new()),
        _ => curr.clone(),
    }
}

/// Compute `layer - prev`, keeping values of `layer` that equal a default
///
/// A key of `prev` missing from the canonical tree of `layer` is read back
/// from `layer`; when it still resolves and differs from `prev` it enters the
/// delta.
pub fn diff_layer(prev: &Value, layer: &dyn Node) -> Result<Value, String> {
    let curr = layer.encode()?;
    if let (Value::Mapping(prev_map), Value::Mapping(curr_map)) = (prev, &curr) {
        return Ok(Value::Mapping(diff_mapping(prev_map, curr_map, Some(layer))?));
    }
    if *prev == curr {
        return Ok(Value::Mapping(Mapping::new()));
    }
    Ok(curr)
}

fn diff_mapping(
    prev: &Mapping,
    curr: &Mapping,
    layer: Option<&dyn Node>,
) -> Result<Mapping, String> {
    let mut delta = Mapping::new();
    for (key, curr_value) in curr {
        match (prev.get(key), curr_value) {
            (Some(prev_value), _) if prev_value == curr_value => {}
            (Some(Value::Mapping(prev_map)), Value::Mapping(curr_map)) => {
                let nested = diff_mapping(prev_map, curr_map, child_of(layer, key))?;
                if !nested.is_empty() {
                    delta.insert(key.clone(), Value::Mapping(nested));
                }
            }
            _ => {
                delta.insert(key.clone(), curr_value.clone());
            }
        }
    }

    if layer.is_none() {
        return Ok(delta);
    }
    for (key, prev_value) in prev {
        if curr.contains_key(key) {
            continue;
        }
        let Some(child) = child_of(layer, key) else {
            continue;
        };
        let value = child.encode()?;
        match (prev_value, &value) {
            (Value::Mapping(prev_map), Value::Mapping(curr_map)) => {
                let nested = diff_mapping(prev_map, curr_map, Some(child))?;
                if !nested.is_empty() {
                    delta.insert(key.clone(), Value::Mapping(nested));
                }
            }
            _ if *prev_value != value => {
                delta.insert(key.clone(), value);
            }
            _ => {}
        }
    }
    Ok(delta)
}

fn child_of<'a>(layer: Option<&'a dyn Node>, key: &Value) -> Option<&'a dyn Node> {
    layer?.child(key.as_str()?).ok()
}

/// Whether a delta carries no change
pub fn is_empty(delta: &Value) -> bool {
    match delta {
        Value::Mapping(map) => map.is_empty(),
        Value::Null => true,
        _ => false,
    }
}
