//! Domain primitive types used across the Trellis workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::SEPARATOR;

/// Fully-qualified path of a component from the tree root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalId(String);

impl GlobalId {
    /// Creates a global id for a root component.
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the id of a child named `name` below this one.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}{SEPARATOR}{name}", self.0))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<GlobalId> for String {
    fn from(id: GlobalId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_ids_chain_with_separator() {
        let root = GlobalId::root("app");
        let grid = root.child("grid").child("toolbar");
        assert_eq!(grid.as_str(), "app__grid__toolbar");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = GlobalId::root("app").child("x");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"app__x\"");
    }
}
