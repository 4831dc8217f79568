//! Request-scoped context handed to every resolver and dispatcher call.

use trellis_common::constants::MAX_TREE_DEPTH;
use trellis_store::{PersistenceBackend, SessionStore};

use crate::catalog::ComponentCatalog;

/// Collaborators available while serving one request.
///
/// A component tree and its context are confined to a single request; no
/// locking happens around tree caches or the collaborators.
#[derive(Debug)]
pub struct RequestContext<'a> {
    /// Class resolver and declaration tables.
    pub catalog: &'a ComponentCatalog,
    /// Persisted configuration, when a backend is configured.
    pub persistence: Option<&'a mut dyn PersistenceBackend>,
    /// Per-session scratch state.
    pub session: &'a mut dyn SessionStore,
    /// Depth guard for materialization.
    pub max_depth: usize,
}

impl<'a> RequestContext<'a> {
    /// Creates a context without a persistence backend.
    #[must_use]
    pub fn new(catalog: &'a ComponentCatalog, session: &'a mut dyn SessionStore) -> Self {
        Self {
            catalog,
            persistence: None,
            session,
            max_depth: MAX_TREE_DEPTH,
        }
    }

    /// Wires in a persistence backend.
    #[must_use]
    pub fn with_persistence(mut self, backend: &'a mut dyn PersistenceBackend) -> Self {
        self.persistence = Some(backend);
        self
    }

    /// Overrides the materialization depth guard.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the persistence backend for reads.
    #[must_use]
    pub fn persistence(&self) -> Option<&(dyn PersistenceBackend + 'a)> {
        self.persistence.as_deref()
    }

    /// Returns the persistence backend for writes.
    pub fn persistence_mut(&mut self) -> Option<&mut (dyn PersistenceBackend + 'a)> {
        self.persistence.as_deref_mut()
    }
}
