//! Layered merge of YAML configuration values.
//!
//! Later layers override earlier ones:
//!
//! - Mappings are merged key by key, recursively
//! - Sequences are replaced wholesale (a local `checks.skip` replaces the global one)
//! - A `null` in the overlay removes the key from the base
//! - Any other overlay value replaces the base value

use serde_yaml::Value;

/// Merge `overlay` on top of `base`, returning a new value.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in overlay_map {
                if value.is_null() {
                    merged.remove(key);
                    continue;
                }
                let next = match base_map.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Mapping(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Fold a list of layers, first is lowest priority.
pub fn merge_layers(layers: &[Value]) -> Value {
    layers
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, layer| {
            deep_merge(&acc, layer)
        })
}
