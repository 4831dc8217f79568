//! Persisted per-component configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use trellis_common::error::Result;

/// Key-value store addressed by `(persistence key, setting name)`.
///
/// Setting names use `__` to encode nesting; decoding into nested
/// configuration is the caller's concern.
pub trait PersistenceBackend: fmt::Debug {
    /// Returns every setting stored under `key`, in name order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn find_all_for_key(&self, key: &str) -> Result<Vec<(String, Value)>>;

    /// Writes a single setting under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, name: &str, value: Value) -> Result<()>;

    /// Removes every setting stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn delete(&mut self, key: &str) -> Result<()>;
}

/// Process-local persistence backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryPersistence {
    entries: BTreeMap<String, BTreeMap<String, Value>>,
}

impl MemoryPersistence {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persistence keys holding at least one setting.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }
}

impl PersistenceBackend for MemoryPersistence {
    fn find_all_for_key(&self, key: &str) -> Result<Vec<(String, Value)>> {
        Ok(self
            .entries
            .get(key)
            .map(|settings| {
                settings
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn set(&mut self, key: &str, name: &str, value: Value) -> Result<()> {
        tracing::debug!(key, name, "persisting setting");
        let _ = self
            .entries
            .entry(key.to_owned())
            .or_default()
            .insert(name.to_owned(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        tracing::debug!(key, "deleting persisted settings");
        let _ = self.entries.remove(key);
        Ok(())
    }
}
