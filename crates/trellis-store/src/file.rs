//! JSON-file persistence backend.
//!
//! Maintains a local JSON index of persisted settings, rewritten through a
//! temporary sibling file and a rename on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_common::error::{Result, TrellisError};

use crate::persistence::PersistenceBackend;

/// One persisted setting with its last update time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    /// Persisted value.
    pub value: Value,
    /// When the value was last written.
    pub updated_at: DateTime<Utc>,
}

type Index = BTreeMap<String, BTreeMap<String, SettingEntry>>;

/// Persistence backend stored as a single JSON document on disk.
#[derive(Debug)]
pub struct JsonFilePersistence {
    path: PathBuf,
    index: Index,
}

impl JsonFilePersistence {
    /// Opens the index at `path`, starting empty when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        tracing::debug!(path = %path.display(), "loading persistence index");
        let index = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| TrellisError::Io {
                path: path.clone(),
                source,
            })?;
            if content.trim().is_empty() {
                Index::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Index::new()
        };
        Ok(Self { path, index })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the last update time of a setting.
    #[must_use]
    pub fn updated_at(&self, key: &str, name: &str) -> Option<DateTime<Utc>> {
        self.index
            .get(key)
            .and_then(|settings| settings.get(name))
            .map(|entry| entry.updated_at)
    }

    /// Rewrites the index file. Write failures surface as
    /// [`TrellisError::PersistenceUnavailable`]; the in-memory index keeps
    /// the change.
    fn save(&self) -> Result<()> {
        tracing::debug!(path = %self.path.display(), "saving persistence index");
        let json = serde_json::to_string_pretty(&self.index)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| TrellisError::PersistenceUnavailable {
                message: format!("cannot write {}: {e}", self.path.display()),
            })
    }
}

impl PersistenceBackend for JsonFilePersistence {
    fn find_all_for_key(&self, key: &str) -> Result<Vec<(String, Value)>> {
        Ok(self
            .index
            .get(key)
            .map(|settings| {
                settings
                    .iter()
                    .map(|(name, entry)| (name.clone(), entry.value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn set(&mut self, key: &str, name: &str, value: Value) -> Result<()> {
        let entry = SettingEntry {
            value,
            updated_at: Utc::now(),
        };
        let _ = self
            .index
            .entry(key.to_owned())
            .or_default()
            .insert(name.to_owned(), entry);
        self.save()
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        if self.index.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFilePersistence::open(dir.path().join("state.json")).expect("open");
        assert!(store.find_all_for_key("app").expect("read").is_empty());
    }

    #[test]
    fn settings_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        {
            let mut store = JsonFilePersistence::open(&path).expect("open");
            store.set("app__grid", "columns__width", json!(120)).expect("set");
            assert!(store.updated_at("app__grid", "columns__width").is_some());
        }
        let reopened = JsonFilePersistence::open(&path).expect("reopen");
        assert_eq!(
            reopened.find_all_for_key("app__grid").expect("read"),
            vec![("columns__width".to_owned(), json!(120))]
        );
    }

    #[test]
    fn delete_rewrites_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        let mut store = JsonFilePersistence::open(&path).expect("open");
        store.set("app__form", "collapsed", json!(true)).expect("set");
        store.delete("app__form").expect("delete");
        let reopened = JsonFilePersistence::open(&path).expect("reopen");
        assert!(reopened.find_all_for_key("app__form").expect("read").is_empty());
    }

    #[test]
    fn unwritable_location_is_persistence_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join("state.json");
        let mut store = JsonFilePersistence::open(&path).expect("open");
        let err = store.set("app", "width", json!(1)).expect_err("no directory");
        assert!(matches!(err, TrellisError::PersistenceUnavailable { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").expect("write");
        let err = JsonFilePersistence::open(&path).expect_err("should fail");
        assert!(matches!(err, TrellisError::Serialization { .. }));
    }
}
