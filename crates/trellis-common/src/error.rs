//! Unified error types for the Trellis workspace.
//!
//! Addressing errors (`UnknownComponent`, `ActionNotExposed`) are recoverable
//! and get converted into feedback at the dispatch boundary. Structural errors
//! (`UnresolvedType`, `Config`, `StaleNode`) abort the current materialization.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum TrellisError {
    /// A component name is neither declared nor detected for its parent.
    #[error("unknown component '{name}' in '{parent}'")]
    UnknownComponent {
        /// Global id of the component that was asked for the child.
        parent: String,
        /// Local name that failed to resolve.
        name: String,
    },

    /// A class reference does not resolve to a known component class.
    #[error("unresolved component class '{class_name}' referenced by '{referenced_by}'")]
    UnresolvedType {
        /// The class name that could not be resolved.
        class_name: String,
        /// Component or class holding the dangling reference.
        referenced_by: String,
    },

    /// The dispatch target exists but the action is not externally callable.
    #[error("action '{action}' is not exposed by '{component}'")]
    ActionNotExposed {
        /// Global id of the dispatch target.
        component: String,
        /// Action name that was requested.
        action: String,
    },

    /// The persistence backend could not serve a request.
    #[error("persistence unavailable: {message}")]
    PersistenceUnavailable {
        /// Description of the backend failure.
        message: String,
    },

    /// A configuration or declaration is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A node handle refers to a component that has been removed.
    #[error("stale component handle #{index}")]
    StaleNode {
        /// Arena index of the stale handle.
        index: usize,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl TrellisError {
    /// Returns `true` for errors that the dispatch and load boundaries turn
    /// into feedback instead of failing the whole request.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownComponent { .. }
                | Self::ActionNotExposed { .. }
                | Self::PersistenceUnavailable { .. }
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, TrellisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addressing_errors_are_recoverable() {
        let unknown = TrellisError::UnknownComponent {
            parent: "app".into(),
            name: "ghost".into(),
        };
        let hidden = TrellisError::ActionNotExposed {
            component: "app".into(),
            action: "secret".into(),
        };
        assert!(unknown.is_recoverable());
        assert!(hidden.is_recoverable());
    }

    #[test]
    fn structural_errors_are_fatal() {
        let err = TrellisError::UnresolvedType {
            class_name: "Missing".into(),
            referenced_by: "app__grid".into(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "unresolved component class 'Missing' referenced by 'app__grid'"
        );
    }
}
