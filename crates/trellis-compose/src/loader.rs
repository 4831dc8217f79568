//! The lazy-loading endpoint.
//!
//! Loading a child materializes it below the requesting component, clears
//! its session scratch state, and returns everything the client still needs
//! to render it: the client code of classes it has not cached yet, a render
//! instruction, and a confirmation event.

use std::collections::BTreeSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_common::error::Result;

use crate::context::RequestContext;
use crate::dispatch::Feedback;
use crate::tree::{ComponentTree, NodeId};

/// Parameters of a load request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadRequest {
    /// Classes whose client code the caller already holds.
    pub cached_types: BTreeSet<String>,
    /// Local name of the child to load.
    pub name: String,
    /// Client-side container the child renders into.
    pub container: Option<String>,
}

impl LoadRequest {
    /// Creates a request for `name` with an empty cache.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the render container.
    #[must_use]
    pub fn container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Adds classes the caller already holds.
    #[must_use]
    pub fn cached<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cached_types.extend(types.into_iter().map(Into::into));
        self
    }
}

/// Client code of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCode {
    /// Class the code belongs to.
    pub class_name: String,
    /// Code body; `None` when the class ships no code of its own.
    pub code: Option<String>,
}

/// Where and how to render the loaded component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderInstruction {
    /// Target container, as given in the request.
    pub container: Option<String>,
    /// Client config of the loaded component.
    pub config: Value,
}

/// Confirmation event naming the loaded component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentLoaded {
    /// Local name of the component.
    pub name: String,
    /// Global id of the component.
    pub global_id: String,
}

/// Payload returned by [`load_component`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    /// Set when the load failed; every other field is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    /// Client code the caller lacks, dependencies first.
    pub missing_code: Vec<ClientCode>,
    /// Render instruction for the loaded component.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderInstruction>,
    /// Load confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded: Option<ComponentLoaded>,
}

impl LoadResult {
    /// A feedback-only failure result.
    #[must_use]
    pub fn failed(feedback: Feedback) -> Self {
        Self {
            feedback: Some(feedback),
            ..Self::default()
        }
    }

    /// Returns `true` if the component was loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Class names of the returned client code, in order.
    pub fn missing_types(&self) -> impl Iterator<Item = &str> {
        self.missing_code.iter().map(|code| code.class_name.as_str())
    }
}

/// Loads the child named by `request` below `node`.
///
/// Never fails: resolution and rendering errors come back as a
/// feedback-only [`LoadResult`]. Calling it again with the returned types
/// added to the cache yields no missing code.
pub fn load_component(
    tree: &mut ComponentTree,
    ctx: &mut RequestContext<'_>,
    node: NodeId,
    request: &LoadRequest,
) -> LoadResult {
    match try_load(tree, ctx, node, request) {
        Ok(result) => result,
        Err(err) => {
            if err.is_recoverable() {
                tracing::warn!(name = %request.name, error = %err, "component load refused");
            } else {
                tracing::error!(name = %request.name, error = %err, "component load failed");
            }
            LoadResult::failed(Feedback::from_error(&err))
        }
    }
}

fn try_load(
    tree: &mut ComponentTree,
    ctx: &mut RequestContext<'_>,
    node: NodeId,
    request: &LoadRequest,
) -> Result<LoadResult> {
    let child = tree.resolve_child(ctx, node, &request.name, None)?;
    let global_id = tree.global_id(child)?.clone();
    tracing::info!(
        global_id = %global_id,
        container = ?request.container,
        cached = request.cached_types.len(),
        "loading component"
    );

    // beforeLoad
    ctx.session.clear(&global_id);

    let mut needed: IndexSet<String> = tree.client_dependencies(ctx, node)?.into_iter().collect();
    needed.extend(tree.client_dependencies(ctx, child)?);
    let missing_code = needed
        .into_iter()
        .filter(|class_name| !request.cached_types.contains(class_name))
        .map(|class_name| {
            let code = ctx
                .catalog
                .get(&class_name)
                .and_then(|class| class.client_code())
                .map(ToOwned::to_owned);
            ClientCode { class_name, code }
        })
        .collect();

    let config = Value::Object(tree.client_config(ctx, child)?);
    Ok(LoadResult {
        feedback: None,
        missing_code,
        render: Some(RenderInstruction {
            container: request.container.clone(),
            config,
        }),
        loaded: Some(ComponentLoaded {
            name: request.name.clone(),
            global_id: global_id.into_string(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use trellis_common::types::GlobalId;
    use trellis_store::{MemorySession, SessionStore};

    use super::*;
    use crate::catalog::{ComponentCatalog, ComponentClass, ComponentDescriptor};
    use crate::dispatch::FeedbackKind;

    fn scenario_catalog() -> ComponentCatalog {
        ComponentCatalog::new()
            .with_class(ComponentClass::new("App").component("x", ComponentDescriptor::new("T")))
            .with_class(
                ComponentClass::new("T")
                    .with_client_code("define('T')")
                    .component(
                        "y",
                        ComponentDescriptor::new("U").lazy(true).config(json!({ "title": "Later" })),
                    ),
            )
            .with_class(ComponentClass::new("U").with_client_code("define('U')"))
    }

    #[test]
    fn loads_lazy_child_with_missing_code() {
        let catalog = scenario_catalog();
        let mut session = MemorySession::new();
        let mut ctx = RequestContext::new(&catalog, &mut session);
        let mut tree = ComponentTree::build(&ctx, "App", "R", &json!({})).expect("build");
        let x = tree.find("R__x").expect("x");

        let result = load_component(&mut tree, &mut ctx, x, &LoadRequest::new("y").container("east"));

        assert!(result.feedback.is_none());
        let types: Vec<&str> = result.missing_types().collect();
        assert_eq!(types, vec!["T", "U"]);
        assert_eq!(result.missing_code[1].code.as_deref(), Some("define('U')"));
        let render = result.render.expect("render");
        assert_eq!(render.container.as_deref(), Some("east"));
        assert_eq!(render.config["id"], json!("R__x__y"));
        assert_eq!(render.config["title"], json!("Later"));
        assert_eq!(
            result.loaded,
            Some(ComponentLoaded {
                name: "y".into(),
                global_id: "R__x__y".into()
            })
        );
        assert!(tree.find("R__x__y").is_some());
    }

    #[test]
    fn second_load_with_cached_types_has_no_missing_code() {
        let catalog = scenario_catalog();
        let mut session = MemorySession::new();
        let mut ctx = RequestContext::new(&catalog, &mut session);
        let mut tree = ComponentTree::build(&ctx, "App", "R", &json!({})).expect("build");
        let x = tree.find("R__x").expect("x");

        let first = load_component(&mut tree, &mut ctx, x, &LoadRequest::new("y"));
        let cached: Vec<String> = first.missing_types().map(ToOwned::to_owned).collect();
        let second = load_component(&mut tree, &mut ctx, x, &LoadRequest::new("y").cached(cached));

        assert!(second.is_loaded());
        assert!(second.missing_code.is_empty());
        assert_eq!(first.render, second.render);
    }

    #[test]
    fn unknown_child_is_feedback_only() {
        let catalog = scenario_catalog();
        let mut session = MemorySession::new();
        let mut ctx = RequestContext::new(&catalog, &mut session);
        let mut tree = ComponentTree::build(&ctx, "App", "R", &json!({})).expect("build");
        let root = tree.root();

        let result = load_component(&mut tree, &mut ctx, root, &LoadRequest::new("ghost"));
        assert!(!result.is_loaded());
        assert!(result.render.is_none());
        assert!(result.missing_code.is_empty());
        assert_eq!(result.feedback.map(|f| f.kind), Some(FeedbackKind::UnknownComponent));
    }

    #[test]
    fn unresolved_class_is_feedback_only() {
        let catalog = ComponentCatalog::new().with_class(
            ComponentClass::new("App").component("bad", ComponentDescriptor::new("Nowhere").lazy(true)),
        );
        let mut session = MemorySession::new();
        let mut ctx = RequestContext::new(&catalog, &mut session);
        let mut tree = ComponentTree::build(&ctx, "App", "R", &json!({})).expect("build");
        let root = tree.root();

        let result = load_component(&mut tree, &mut ctx, root, &LoadRequest::new("bad"));
        assert_eq!(result.feedback.map(|f| f.kind), Some(FeedbackKind::ServerError));
    }

    #[test]
    fn loads_base_class_container_embedding_a_subclass() {
        let catalog = ComponentCatalog::new()
            .with_class(ComponentClass::new("App").component(
                "win",
                ComponentDescriptor::new("Panel")
                    .lazy(true)
                    .config(json!({ "items": [{ "class_name": "Grid" }] })),
            ))
            .with_class(ComponentClass::new("Panel"))
            .with_class(ComponentClass::new("Grid").extends("Panel"));
        let mut session = MemorySession::new();
        let mut ctx = RequestContext::new(&catalog, &mut session);
        let mut tree = ComponentTree::build(&ctx, "App", "R", &json!({})).expect("build");
        let root = tree.root();

        let result = load_component(&mut tree, &mut ctx, root, &LoadRequest::new("win"));

        assert!(result.feedback.is_none(), "got: {:?}", result.feedback);
        let types: Vec<&str> = result.missing_types().collect();
        assert_eq!(types, vec!["App", "Panel", "Grid"]);
        let render = result.render.expect("render");
        assert_eq!(render.config["items"], json!([{ "component": "grid_1" }]));
    }

    #[test]
    fn before_load_clears_child_session_state() {
        let catalog = scenario_catalog();
        let mut session = MemorySession::new();
        let child_id = GlobalId::root("R").child("x").child("y");
        let sibling_id = GlobalId::root("R").child("x");
        session.set(&child_id, "page", json!(3));
        session.set(&sibling_id, "page", json!(1));
        let mut ctx = RequestContext::new(&catalog, &mut session);
        let mut tree = ComponentTree::build(&ctx, "App", "R", &json!({})).expect("build");
        let x = tree.find("R__x").expect("x");

        let _ = load_component(&mut tree, &mut ctx, x, &LoadRequest::new("y"));
        assert!(ctx.session.get(&child_id).is_none());
        assert!(ctx.session.get(&sibling_id).is_some());
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: LoadRequest = serde_json::from_value(json!({ "name": "y" })).expect("parse");
        assert_eq!(request, LoadRequest::new("y"));
        let request: LoadRequest = serde_json::from_value(json!({
            "cached_types": ["T"],
            "name": "y",
            "container": "main"
        }))
        .expect("parse");
        assert!(request.cached_types.contains("T"));
        assert_eq!(request.container.as_deref(), Some("main"));
    }
}
