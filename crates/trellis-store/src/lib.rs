//! # trellis-store
//!
//! External collaborators of the composition engine:
//! - [`PersistenceBackend`](persistence::PersistenceBackend): per-component
//!   persisted configuration, keyed by persistence key and setting name.
//! - [`SessionStore`](session::SessionStore): per-global-id scratch state
//!   scoped to one client session.
//!
//! In-memory implementations back tests and single-request tools; the
//! JSON-file backend keeps persisted configuration across processes.

pub mod file;
pub mod persistence;
pub mod session;

pub use file::JsonFilePersistence;
pub use persistence::{MemoryPersistence, PersistenceBackend};
pub use session::{MemorySession, SessionStore};
