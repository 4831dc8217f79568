//! # trellis-sdk
//!
//! Public SDK for using Trellis as a Rust library.
//!
//! Provides two entry points:
//! - [`Manifest`](manifest::Manifest): Declarative YAML/JSON description of
//!   component classes, turned into a [`ComponentCatalog`](trellis_compose::ComponentCatalog).
//! - [`Application`](app::Application): Builds request-scoped trees and
//!   serves the remote call surface (generic dispatch and lazy loading).
//!
//! # Example
//!
//! ```rust,no_run
//! use trellis_sdk::app::{Application, DispatchRequest};
//! use trellis_store::MemorySession;
//!
//! let app = Application::load(std::path::Path::new("app.yaml"))?;
//! let mut session = MemorySession::new();
//! let mut ctx = app.context(&mut session);
//! let mut tree = app.build_tree(&ctx)?;
//! let outcome = app.handle_dispatch(&mut tree, &mut ctx, DispatchRequest::new("grid__reload"));
//! # Ok::<(), trellis_common::error::TrellisError>(())
//! ```

pub mod app;
pub mod manifest;

pub use app::{Application, DispatchRequest, LoadComponentRequest};
pub use manifest::Manifest;
