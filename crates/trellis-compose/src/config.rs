//! Tree-shaped configuration and its deep merge.
//!
//! Later layers override scalar leaves and structurally union sibling keys.
//! Arrays are replaced wholesale, never concatenated.

use serde_json::{Map, Value};
use trellis_common::constants::SEPARATOR;

/// A nested key-value configuration.
pub type Config = Map<String, Value>;

/// Merges `overlay` into `base`, overlay winning on conflicting leaves.
pub fn deep_merge(base: &mut Config, overlay: &Config) {
    for (key, incoming) in overlay {
        match (base.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => deep_merge(existing, nested),
            _ => {
                let _ = base.insert(key.clone(), incoming.clone());
            }
        }
    }
}

/// Merges layers in increasing precedence into a fresh configuration.
#[must_use]
pub fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a Config>) -> Config {
    let mut merged = Config::new();
    for layer in layers {
        deep_merge(&mut merged, layer);
    }
    merged
}

/// Views a JSON value as a configuration; anything but an object is empty.
#[must_use]
pub fn as_config(value: &Value) -> Config {
    match value {
        Value::Object(map) => map.clone(),
        _ => Config::new(),
    }
}

/// Decodes a `__`-joined setting name into a nested single-leaf configuration.
///
/// `a__b__c` with value `v` becomes `{a: {b: {c: v}}}`.
#[must_use]
pub fn nest_setting(name: &str, value: Value) -> Config {
    let mut segments = name.rsplit(SEPARATOR);
    let mut nested = Config::new();
    let Some(leaf) = segments.next() else {
        return nested;
    };
    let _ = nested.insert(leaf.to_owned(), value);
    for segment in segments {
        let mut outer = Config::new();
        let _ = outer.insert(segment.to_owned(), Value::Object(nested));
        nested = outer;
    }
    nested
}

/// Folds persisted `(name, value)` settings into one nested configuration.
pub fn decode_settings(entries: impl IntoIterator<Item = (String, Value)>) -> Config {
    let mut decoded = Config::new();
    for (name, value) in entries {
        deep_merge(&mut decoded, &nest_setting(&name, value));
    }
    decoded
}
