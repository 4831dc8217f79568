//! Per-session scratch state keyed by component global id.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};
use trellis_common::types::GlobalId;

/// Scratch mapping per component, living as long as the client session.
pub trait SessionStore: fmt::Debug {
    /// Returns the scratch mapping of a component, if any.
    fn get(&self, id: &GlobalId) -> Option<&Map<String, Value>>;

    /// Stores one scratch value for a component.
    fn set(&mut self, id: &GlobalId, key: &str, value: Value);

    /// Drops all scratch state of a component.
    fn clear(&mut self, id: &GlobalId);
}

/// Session store held in memory for the duration of one session object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySession {
    scopes: HashMap<GlobalId, Map<String, Value>>,
}

impl MemorySession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, id: &GlobalId) -> Option<&Map<String, Value>> {
        self.scopes.get(id)
    }

    fn set(&mut self, id: &GlobalId, key: &str, value: Value) {
        let _ = self
            .scopes
            .entry(id.clone())
            .or_default()
            .insert(key.to_owned(), value);
    }

    fn clear(&mut self, id: &GlobalId) {
        if self.scopes.remove(id).is_some() {
            tracing::debug!(global_id = %id, "cleared session scratch");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scratch_is_scoped_per_component() {
        let mut session = MemorySession::new();
        let grid = GlobalId::root("app").child("grid");
        let form = GlobalId::root("app").child("form");
        session.set(&grid, "page", json!(3));
        session.set(&form, "dirty", json!(true));
        session.clear(&grid);
        assert!(session.get(&grid).is_none());
        assert_eq!(session.get(&form).map(|m| m["dirty"].clone()), Some(json!(true)));
    }
}
