//! Remote action dispatch.
//!
//! An action path is split into its first segment and the rest. The first
//! segment of a multi-segment path always names a child component, and the
//! rest is dispatched on that child, except for `parent`, which moves up one
//! level; a single-segment path names an action on the current component. Only actions registered with
//! [`Exposure::Endpoint`](crate::catalog::Exposure::Endpoint) run.
//!
//! Addressing failures never fail the request: they come back as a
//! [`Feedback`] outcome.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trellis_common::constants::{DELIVER_COMPONENT_ENDPOINT, PARENT_SEGMENT};
use trellis_common::error::{Result, TrellisError};
use trellis_common::types::GlobalId;

use crate::config::Config;
use crate::context::RequestContext;
use crate::loader::{LoadRequest, load_component};
use crate::path::split_head;
use crate::tree::{ComponentTree, NodeId};

/// Category of a feedback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// A path segment named a component that does not exist.
    UnknownComponent,
    /// The target exists but the action is not externally callable.
    ActionNotExposed,
    /// Persisted state could not be read or written.
    PersistenceUnavailable,
    /// The request parameters could not be understood.
    InvalidRequest,
    /// The server failed while serving an otherwise valid request.
    ServerError,
}

/// User-facing message returned instead of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Category of the message.
    pub kind: FeedbackKind,
    /// Human-readable diagnostic.
    pub message: String,
}

impl Feedback {
    /// Creates a feedback message.
    #[must_use]
    pub fn new(kind: FeedbackKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Converts an engine error into feedback.
    #[must_use]
    pub fn from_error(err: &TrellisError) -> Self {
        let kind = match err {
            TrellisError::UnknownComponent { .. } => FeedbackKind::UnknownComponent,
            TrellisError::ActionNotExposed { .. } => FeedbackKind::ActionNotExposed,
            TrellisError::PersistenceUnavailable { .. } => FeedbackKind::PersistenceUnavailable,
            TrellisError::Serialization { .. } => FeedbackKind::InvalidRequest,
            _ => FeedbackKind::ServerError,
        };
        Self::new(kind, err.to_string())
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The action ran and produced a response.
    Response(Value),
    /// The call could not be served; the message is meant for the user.
    Feedback(Feedback),
}

impl DispatchOutcome {
    /// Returns the feedback, if the call was not served.
    #[must_use]
    pub const fn feedback(&self) -> Option<&Feedback> {
        match self {
            Self::Feedback(feedback) => Some(feedback),
            Self::Response(_) => None,
        }
    }

    /// Returns the response payload, if the call was served.
    #[must_use]
    pub const fn response(&self) -> Option<&Value> {
        match self {
            Self::Response(value) => Some(value),
            Self::Feedback(_) => None,
        }
    }
}

/// What an action handler sees: the tree, the request context, and the
/// component the action was dispatched to.
#[derive(Debug)]
pub struct Invocation<'t, 'c> {
    tree: &'t mut ComponentTree,
    ctx: &'t mut RequestContext<'c>,
    node: NodeId,
}

impl<'t, 'c> Invocation<'t, 'c> {
    /// Creates an invocation of `node`.
    pub fn new(tree: &'t mut ComponentTree, ctx: &'t mut RequestContext<'c>, node: NodeId) -> Self {
        Self { tree, ctx, node }
    }

    /// The component the action runs on.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Global id of the component.
    ///
    /// # Errors
    ///
    /// Returns an error if the component was removed.
    pub fn global_id(&self) -> Result<GlobalId> {
        self.tree.global_id(self.node).cloned()
    }

    /// Resolved configuration of the component.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be resolved.
    pub fn config(&mut self) -> Result<Config> {
        self.tree.resolved_config(self.ctx, self.node).cloned()
    }

    /// Persists a setting for the component and refreshes its config.
    ///
    /// # Errors
    ///
    /// Returns an error if the component's configuration cannot be resolved.
    pub fn persist(&mut self, name: &str, value: Value) -> Result<()> {
        self.tree.persist(self.ctx, self.node, name, value)
    }

    /// Reads the component's session scratch state.
    ///
    /// # Errors
    ///
    /// Returns an error if the component was removed.
    pub fn session(&self) -> Result<Map<String, Value>> {
        let id = self.tree.global_id(self.node)?;
        Ok(self.ctx.session.get(id).cloned().unwrap_or_default())
    }

    /// Stores a value in the component's session scratch state.
    ///
    /// # Errors
    ///
    /// Returns an error if the component was removed.
    pub fn set_session(&mut self, key: &str, value: Value) -> Result<()> {
        let id = self.tree.global_id(self.node)?.clone();
        self.ctx.session.set(&id, key, value);
        Ok(())
    }

    /// Dispatches another action path relative to this component.
    ///
    /// # Errors
    ///
    /// Propagates structural errors from [`dispatch`].
    pub fn dispatch(&mut self, action_path: &str, params: Value) -> Result<DispatchOutcome> {
        dispatch(self.tree, self.ctx, self.node, action_path, params)
    }

    /// Gives direct access to the tree and context.
    pub fn parts(&mut self) -> (&mut ComponentTree, &mut RequestContext<'c>) {
        (&mut *self.tree, &mut *self.ctx)
    }
}

/// Dispatches `action_path` with `params` starting at `node`.
///
/// # Errors
///
/// Only structural failures escape as errors (an unresolvable class, a
/// stale node, a handler failing fatally). Unknown components and
/// unexposed actions come back as [`DispatchOutcome::Feedback`].
pub fn dispatch(
    tree: &mut ComponentTree,
    ctx: &mut RequestContext<'_>,
    node: NodeId,
    action_path: &str,
    params: Value,
) -> Result<DispatchOutcome> {
    match split_head(action_path) {
        (action, None) => invoke_action(tree, ctx, node, action, params),
        (PARENT_SEGMENT, Some(rest)) => match tree.node(node)?.parent() {
            Some(parent) => dispatch(tree, ctx, parent, rest, params),
            None => component_missing(tree, ctx, node, PARENT_SEGMENT).map(DispatchOutcome::Feedback),
        },
        (child_name, Some(rest)) => match tree.resolve_child(ctx, node, child_name, None) {
            Ok(child) => dispatch(tree, ctx, child, rest, params),
            Err(TrellisError::UnknownComponent { .. }) => {
                component_missing(tree, ctx, node, child_name).map(DispatchOutcome::Feedback)
            }
            Err(err) => Err(err),
        },
    }
}

fn invoke_action(
    tree: &mut ComponentTree,
    ctx: &mut RequestContext<'_>,
    node: NodeId,
    action: &str,
    params: Value,
) -> Result<DispatchOutcome> {
    let global_id = tree.global_id(node)?.clone();
    tracing::info!(global_id = %global_id, action, "dispatching action");

    if action == DELIVER_COMPONENT_ENDPOINT {
        return deliver_component(tree, ctx, node, params);
    }

    let catalog = ctx.catalog;
    let class_name = tree.node(node)?.class_name().to_owned();
    let Some(def) = catalog
        .find_action(&class_name, action)?
        .filter(|def| def.is_exposed())
    else {
        let err = TrellisError::ActionNotExposed {
            component: global_id.into_string(),
            action: action.to_owned(),
        };
        tracing::warn!(error = %err, "refused dispatch");
        return Ok(DispatchOutcome::Feedback(Feedback::from_error(&err)));
    };

    let mut invocation = Invocation::new(tree, ctx, node);
    match def.call(&mut invocation, params) {
        Ok(response) => Ok(DispatchOutcome::Response(response)),
        Err(err) if err.is_recoverable() => {
            Ok(DispatchOutcome::Feedback(Feedback::from_error(&err)))
        }
        Err(err) => Err(err),
    }
}

fn deliver_component(
    tree: &mut ComponentTree,
    ctx: &mut RequestContext<'_>,
    node: NodeId,
    params: Value,
) -> Result<DispatchOutcome> {
    let request: LoadRequest = match serde_json::from_value(params) {
        Ok(request) => request,
        Err(err) => {
            return Ok(DispatchOutcome::Feedback(Feedback::new(
                FeedbackKind::InvalidRequest,
                format!("invalid {DELIVER_COMPONENT_ENDPOINT} params: {err}"),
            )));
        }
    };
    let result = load_component(tree, ctx, node, &request);
    Ok(DispatchOutcome::Response(serde_json::to_value(result)?))
}

fn component_missing(
    tree: &ComponentTree,
    ctx: &RequestContext<'_>,
    node: NodeId,
    name: &str,
) -> Result<Feedback> {
    let node = tree.node(node)?;
    tracing::warn!(global_id = %node.global_id(), name, "dispatch to unknown component");
    Ok(
        match ctx.catalog.component_missing_handler(node.class_name())? {
            Some(handler) => handler.feedback(node.global_id(), name),
            None => Feedback::new(
                FeedbackKind::UnknownComponent,
                format!("Unknown component '{name}' in '{}'", node.global_id()),
            ),
        },
    )
}
