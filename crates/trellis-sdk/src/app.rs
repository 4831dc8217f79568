//! Request-scoped application facade over the remote call surface.
//!
//! An [`Application`] owns the class catalog and the root declaration. Each
//! request builds its own [`RequestContext`] and [`ComponentTree`]; the
//! facade then maps the two remote entry points (generic dispatch and lazy
//! loading) onto the engine, turning any failure into feedback.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_common::config::TrellisConfig;
use trellis_common::error::Result;
use trellis_compose::{
    ComponentCatalog, ComponentTree, DispatchOutcome, Feedback, FeedbackKind, LoadRequest,
    LoadResult, RequestContext, dispatch, load_component,
};
use trellis_store::{JsonFilePersistence, SessionStore};

use crate::manifest::{Manifest, RootSpec};

/// Generic dispatch request: an action path relative to the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// `__`-joined path, e.g. `grid__toolbar__reload`.
    pub action_path: String,
    /// Action parameters.
    #[serde(default)]
    pub params: Value,
}

impl DispatchRequest {
    /// Creates a request without parameters.
    #[must_use]
    pub fn new(action_path: impl Into<String>) -> Self {
        Self {
            action_path: action_path.into(),
            params: Value::Null,
        }
    }

    /// Sets the action parameters.
    #[must_use]
    pub fn params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }
}

/// Lazy-load request addressed to a component below the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadComponentRequest {
    /// Path of the requesting component relative to the root; empty for
    /// the root itself.
    #[serde(default)]
    pub parent: String,
    /// What to load.
    #[serde(flatten)]
    pub request: LoadRequest,
}

/// A Trellis application: catalog, root declaration, and runtime settings.
#[derive(Debug)]
pub struct Application {
    catalog: ComponentCatalog,
    root: RootSpec,
    settings: TrellisConfig,
}

impl Application {
    /// Creates an application rooted at a component of `class_name`.
    #[must_use]
    pub fn new(catalog: ComponentCatalog, class_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            catalog,
            root: RootSpec {
                class_name: class_name.into(),
                name: name.into(),
                config: Value::Null,
            },
            settings: TrellisConfig::default(),
        }
    }

    /// Creates an application from a parsed manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest's classes do not form a valid catalog.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self> {
        Ok(Self {
            catalog: manifest.to_catalog()?,
            root: manifest.root.clone(),
            settings: TrellisConfig::default(),
        })
    }

    /// Loads a manifest file and creates the application.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_manifest(&Manifest::load(path)?)
    }

    /// Replaces the runtime settings.
    #[must_use]
    pub fn with_settings(mut self, settings: TrellisConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Runtime settings.
    #[must_use]
    pub const fn settings(&self) -> &TrellisConfig {
        &self.settings
    }

    /// The class catalog.
    #[must_use]
    pub const fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    /// Opens the JSON-file persistence backend named by the settings, or
    /// `None` when persistence is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file exists but cannot be read.
    pub fn open_persistence(&self) -> Result<Option<JsonFilePersistence>> {
        if !self.settings.persistence {
            return Ok(None);
        }
        let store = JsonFilePersistence::open(&self.settings.state_file)?;
        tracing::info!(path = %store.path().display(), "persistence enabled");
        Ok(Some(store))
    }

    /// Creates a request context over this application's catalog. Attach a
    /// backend with [`RequestContext::with_persistence`].
    pub fn context<'a>(&'a self, session: &'a mut dyn SessionStore) -> RequestContext<'a> {
        RequestContext::new(&self.catalog, session).with_max_depth(self.settings.max_depth)
    }

    /// Builds the component tree for one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the root or an eager descendant fails to materialize.
    pub fn build_tree(&self, ctx: &RequestContext<'_>) -> Result<ComponentTree> {
        ComponentTree::build(ctx, &self.root.class_name, &self.root.name, &self.root.config)
    }

    /// Serves a generic dispatch request against the root.
    ///
    /// Never fails: structural errors are logged and returned as
    /// server-error feedback.
    pub fn handle_dispatch(
        &self,
        tree: &mut ComponentTree,
        ctx: &mut RequestContext<'_>,
        request: DispatchRequest,
    ) -> DispatchOutcome {
        let root = tree.root();
        match dispatch(tree, ctx, root, &request.action_path, request.params) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(action_path = %request.action_path, error = %err, "dispatch failed");
                DispatchOutcome::Feedback(Feedback::from_error(&err))
            }
        }
    }

    /// Serves a lazy-load request.
    pub fn handle_load(
        &self,
        tree: &mut ComponentTree,
        ctx: &mut RequestContext<'_>,
        request: &LoadComponentRequest,
    ) -> LoadResult {
        let root = tree.root();
        match tree.node_at(ctx, root, &request.parent) {
            Ok(Some(parent)) => load_component(tree, ctx, parent, &request.request),
            Ok(None) => LoadResult::failed(Feedback::new(
                FeedbackKind::UnknownComponent,
                format!("'{}' is outside the component tree", request.parent),
            )),
            Err(err) => {
                tracing::warn!(parent = %request.parent, error = %err, "load target unavailable");
                LoadResult::failed(Feedback::from_error(&err))
            }
        }
    }
}
