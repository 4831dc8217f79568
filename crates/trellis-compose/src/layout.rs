//! Structural discovery of components embedded in layout descriptions.
//!
//! A layout is an ordered tree of items. Any object item carrying a
//! `class_name` is a component marker: it is lifted out into an
//! instance-level [`ComponentDescriptor`] and replaced in place by a
//! `{"component": name}` reference token.

use std::collections::BTreeSet;

use heck::ToSnakeCase;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use trellis_common::constants::{
    CLASS_NAME_KEY, COMPONENT_REF_KEY, ITEMS_KEY, LAZY_KEY, NAME_KEY,
};

use crate::catalog::ComponentDescriptor;

/// Result of scanning one layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScannedLayout {
    /// The layout with every marker replaced by a reference token.
    pub layout: Option<Value>,
    /// Components discovered in traversal order.
    pub components: IndexMap<String, ComponentDescriptor>,
}

impl ScannedLayout {
    /// Drops the given components and their reference tokens.
    pub fn remove_components(&mut self, removed: &BTreeSet<String>) {
        if removed.is_empty() {
            return;
        }
        self.components.retain(|name, _| !removed.contains(name));
        if let Some(layout) = self.layout.as_mut() {
            prune_tokens(layout, removed);
        }
    }
}

/// Scans a layout depth-first in a single pass.
///
/// Anonymous markers are named after their class plus a counter scoped to
/// this scan, so scanning the same input twice yields the same names.
#[must_use]
pub fn scan_layout(items: &Value) -> ScannedLayout {
    let mut scanner = LayoutScanner::default();
    scanner.reserve_explicit(items);
    let layout = scanner.visit(items);
    ScannedLayout {
        layout: Some(layout),
        components: scanner.components,
    }
}

#[derive(Debug, Default)]
struct LayoutScanner {
    counter: usize,
    reserved: BTreeSet<String>,
    components: IndexMap<String, ComponentDescriptor>,
}

impl LayoutScanner {
    /// Collects explicit marker names up front so synthesized names never
    /// take one that appears later in the layout.
    fn reserve_explicit(&mut self, item: &Value) {
        match item {
            Value::Array(items) => items.iter().for_each(|i| self.reserve_explicit(i)),
            Value::Object(map) => {
                if map.contains_key(CLASS_NAME_KEY) {
                    if let Some(Value::String(name)) = map.get(NAME_KEY) {
                        let _ = self.reserved.insert(name.clone());
                    }
                } else if let Some(nested) = map.get(ITEMS_KEY) {
                    self.reserve_explicit(nested);
                }
            }
            _ => {}
        }
    }

    fn visit(&mut self, item: &Value) -> Value {
        match item {
            Value::Array(items) => Value::Array(items.iter().map(|i| self.visit(i)).collect()),
            Value::Object(map) => match map.get(CLASS_NAME_KEY) {
                Some(Value::String(class_name)) => self.lift_marker(class_name, map),
                _ => self.visit_container(map),
            },
            other => other.clone(),
        }
    }

    fn visit_container(&mut self, map: &Map<String, Value>) -> Value {
        let mut out = map.clone();
        if let Some(nested) = map.get(ITEMS_KEY) {
            let _ = out.insert(ITEMS_KEY.to_owned(), self.visit(nested));
        }
        Value::Object(out)
    }

    fn lift_marker(&mut self, class_name: &str, map: &Map<String, Value>) -> Value {
        let name = match map.get(NAME_KEY).and_then(Value::as_str) {
            Some(explicit) if !self.components.contains_key(explicit) => explicit.to_owned(),
            Some(explicit) => {
                tracing::warn!(name = explicit, class = class_name, "duplicate component name in layout, renaming");
                self.synthesize_name(class_name)
            }
            None => self.synthesize_name(class_name),
        };
        let lazy = map.get(LAZY_KEY).and_then(Value::as_bool).unwrap_or(false);
        let mut static_config = map.clone();
        for key in [CLASS_NAME_KEY, NAME_KEY, LAZY_KEY] {
            let _ = static_config.remove(key);
        }
        tracing::trace!(name, class = class_name, "lifted component marker from layout");

        let descriptor = ComponentDescriptor {
            name: name.clone(),
            class_name: class_name.to_owned(),
            static_config,
            lazy,
        };
        let _ = self.components.insert(name.clone(), descriptor);

        let mut token = Map::new();
        let _ = token.insert(COMPONENT_REF_KEY.to_owned(), Value::String(name));
        Value::Object(token)
    }

    fn synthesize_name(&mut self, class_name: &str) -> String {
        let base = short_class_name(class_name).to_snake_case();
        loop {
            self.counter += 1;
            let candidate = format!("{base}_{}", self.counter);
            if !self.components.contains_key(&candidate) && !self.reserved.contains(&candidate) {
                return candidate;
            }
        }
    }
}

fn prune_tokens(item: &mut Value, removed: &BTreeSet<String>) {
    match item {
        Value::Array(items) => {
            items.retain(|i| !is_removed_token(i, removed));
            items.iter_mut().for_each(|i| prune_tokens(i, removed));
        }
        Value::Object(map) => {
            if let Some(nested) = map.get_mut(ITEMS_KEY) {
                prune_tokens(nested, removed);
            }
        }
        _ => {}
    }
}

fn is_removed_token(item: &Value, removed: &BTreeSet<String>) -> bool {
    item.as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.get(COMPONENT_REF_KEY))
        .and_then(Value::as_str)
        .is_some_and(|name| removed.contains(name))
}

/// Strips module qualifiers: `Admin::UserGrid` and `admin.UserGrid` both
/// yield `UserGrid`.
fn short_class_name(class_name: &str) -> &str {
    class_name
        .rsplit([':', '.'])
        .next()
        .unwrap_or(class_name)
}
