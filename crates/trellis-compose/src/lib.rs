//! # trellis-compose
//!
//! Composition engine for server-side component trees.
//!
//! Handles:
//! - **Config**: Deep merge of layered tree-shaped configuration.
//! - **Catalog**: Per-class component, action, and default-config tables
//!   resolved along an explicit ancestor chain.
//! - **Tree**: Lazy, parent-linked materialization of named components and
//!   the four-layer configuration precedence.
//! - **Layout**: Structural discovery of components embedded in layouts.
//! - **Path**: `parent__`-aware reference resolution to global ids.
//! - **Dispatch**: Routing of remote action paths to exposed endpoints.
//! - **Loader**: The lazy-loading endpoint and client dependency listing.

pub mod catalog;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod graph;
pub mod layout;
pub mod loader;
pub mod path;
pub mod tree;

pub use catalog::{ActionDef, ComponentCatalog, ComponentClass, ComponentDescriptor, Exposure, MissingHandler};
pub use config::Config;
pub use context::RequestContext;
pub use dispatch::{DispatchOutcome, Feedback, FeedbackKind, Invocation, dispatch};
pub use loader::{ClientCode, ComponentLoaded, LoadRequest, LoadResult, RenderInstruction, load_component};
pub use tree::{ComponentNode, ComponentTree, NodeId};
