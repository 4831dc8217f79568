//! Runtime configuration model for a Trellis application.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for a Trellis application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrellisConfig {
    /// Path of the JSON file backing persisted component configuration.
    pub state_file: PathBuf,
    /// Whether a persistence backend is wired in at all.
    pub persistence: bool,
    /// Depth guard for eager materialization.
    pub max_depth: usize,
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(crate::constants::DEFAULT_STATE_FILE),
            persistence: true,
            max_depth: crate::constants::MAX_TREE_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_falls_back_to_defaults() {
        let config: TrellisConfig =
            serde_json::from_str(r#"{ "persistence": false }"#).expect("deserialize");
        assert!(!config.persistence);
        assert_eq!(config.max_depth, crate::constants::MAX_TREE_DEPTH);
        assert_eq!(
            config.state_file,
            PathBuf::from(crate::constants::DEFAULT_STATE_FILE)
        );
    }
}
