//! The instance-level component tree.
//!
//! Nodes live in an arena owned by [`ComponentTree`]. A node owns its
//! children through its child map and refers to its parent only by
//! [`NodeId`], which is what upward path resolution and configuration
//! inheritance walk.
//!
//! Every node's resolved configuration is the deep merge, in increasing
//! precedence, of:
//!
//! 1. class-level defaults (merged along the class ancestry),
//! 2. passed config (parent's weak children config, descriptor static
//!    config, config supplied at resolution time, the forced name),
//! 3. persisted config (only with `persistence: true` and a backend),
//! 4. the parent's strong children config.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value;
use trellis_common::constants::{
    CLASS_NAME_KEY, ID_KEY, ITEMS_KEY, NAME_KEY, PERSISTENCE_KEY, PERSISTENCE_KEY_OVERRIDE,
    SEPARATOR, SERVER_ONLY_KEYS, STRONG_CHILDREN_CONFIG_KEY, WEAK_CHILDREN_CONFIG_KEY,
};
use trellis_common::error::{Result, TrellisError};
use trellis_common::types::GlobalId;

use crate::catalog::ComponentDescriptor;
use crate::config::{Config, as_config, decode_settings, deep_merge, merge_layers};
use crate::context::RequestContext;
use crate::graph::DependencyGraph;
use crate::layout::{ScannedLayout, scan_layout};

/// Handle of a node inside one [`ComponentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index of the node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
enum Propagation {
    Strong,
    Weak,
}

impl Propagation {
    const fn key(self) -> &'static str {
        match self {
            Self::Strong => STRONG_CHILDREN_CONFIG_KEY,
            Self::Weak => WEAK_CHILDREN_CONFIG_KEY,
        }
    }
}

/// Per-node memoized values. Cleared only by [`ComponentTree::reset_config`].
#[derive(Debug, Clone, Default)]
struct NodeCache {
    resolved: Option<Config>,
    persisted: Option<Config>,
    strong_children: Option<Config>,
    weak_children: Option<Config>,
    layout: Option<ScannedLayout>,
    dependencies: Option<Vec<String>>,
}

impl NodeCache {
    fn propagated(&self, propagation: Propagation) -> Option<&Config> {
        match propagation {
            Propagation::Strong => self.strong_children.as_ref(),
            Propagation::Weak => self.weak_children.as_ref(),
        }
    }

    fn propagated_mut(&mut self, propagation: Propagation) -> &mut Option<Config> {
        match propagation {
            Propagation::Strong => &mut self.strong_children,
            Propagation::Weak => &mut self.weak_children,
        }
    }
}

/// A materialized component.
#[derive(Debug, Clone)]
pub struct ComponentNode {
    name: String,
    global_id: GlobalId,
    class_name: String,
    parent: Option<NodeId>,
    depth: usize,
    children: IndexMap<String, NodeId>,
    passed_config: Config,
    removed: BTreeSet<String>,
    cache: NodeCache,
}

impl ComponentNode {
    fn new(
        name: &str,
        global_id: GlobalId,
        class_name: &str,
        parent: Option<NodeId>,
        depth: usize,
        passed_config: Config,
    ) -> Self {
        Self {
            name: name.to_owned(),
            global_id,
            class_name: class_name.to_owned(),
            parent,
            depth,
            children: IndexMap::new(),
            passed_config,
            removed: BTreeSet::new(),
            cache: NodeCache::default(),
        }
    }

    /// Local name of the component.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Global id of the component.
    #[must_use]
    pub const fn global_id(&self) -> &GlobalId {
        &self.global_id
    }

    /// Class the component was instantiated from.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Parent handle; `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Distance from the root.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Materialized children in materialization order.
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children.iter().map(|(name, &id)| (name.as_str(), id))
    }

    /// Handle of a materialized child.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    /// Configuration passed by the parent when this node was materialized.
    #[must_use]
    pub const fn passed_config(&self) -> &Config {
        &self.passed_config
    }

    /// Returns `true` if `name` was removed from this instance.
    #[must_use]
    pub fn is_removed(&self, name: &str) -> bool {
        self.removed.contains(name)
    }
}

/// A tree of components rooted at one composite, scoped to one request.
#[derive(Debug, Clone)]
pub struct ComponentTree {
    nodes: Vec<Option<ComponentNode>>,
    root: NodeId,
}

impl ComponentTree {
    /// Builds a tree rooted at a component of class `class_name` and
    /// materializes every eager descendant.
    ///
    /// # Errors
    ///
    /// Returns an error if the root class or any eager descendant's class
    /// does not resolve, or if eager materialization exceeds the depth guard.
    pub fn build(
        ctx: &RequestContext<'_>,
        class_name: &str,
        name: &str,
        config: &Value,
    ) -> Result<Self> {
        let global_id = GlobalId::root(name);
        let _ = ctx.catalog.resolve_class(class_name, global_id.as_str())?;
        let mut passed_config = as_config(config);
        let _ = passed_config.insert(NAME_KEY.to_owned(), Value::String(name.to_owned()));

        tracing::debug!(global_id = %global_id, class = class_name, "building component tree");
        let root = ComponentNode::new(name, global_id, class_name, None, 0, passed_config);
        let mut tree = Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
        };
        tree.materialize_eager(ctx, tree.root)?;
        Ok(tree)
    }

    /// Handle of the root component.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns a live node.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::StaleNode`] if the node was removed.
    pub fn node(&self, id: NodeId) -> Result<&ComponentNode> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(TrellisError::StaleNode { index: id.0 })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut ComponentNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TrellisError::StaleNode { index: id.0 })
    }

    /// Returns the global id of a live node.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::StaleNode`] if the node was removed.
    pub fn global_id(&self, id: NodeId) -> Result<&GlobalId> {
        Ok(&self.node(id)?.global_id)
    }

    /// Iterates over live nodes in materialization order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ComponentNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|node| (NodeId(index), node)))
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always `false`: a tree holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds a materialized node by global id.
    #[must_use]
    pub fn find(&self, global_id: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.global_id.as_str() == global_id)
            .map(|(id, _)| id)
    }

    /// Returns the effective component table of a node: class declarations
    /// merged with components detected in its layout, minus removed names.
    ///
    /// # Errors
    ///
    /// Returns an error if the class chain or the node's config cannot be resolved.
    pub fn effective_components(
        &mut self,
        ctx: &RequestContext<'_>,
        id: NodeId,
    ) -> Result<IndexMap<String, ComponentDescriptor>> {
        let class_name = self.node(id)?.class_name.clone();
        let mut table = ctx.catalog.component_table(&class_name)?;
        let detected = self.scanned_layout(ctx, id)?.components.clone();
        for (name, descriptor) in detected {
            let _ = table.insert(name, descriptor);
        }
        let removed = &self.node(id)?.removed;
        table.retain(|name, _| !removed.contains(name));
        Ok(table)
    }

    fn find_descriptor(
        &mut self,
        ctx: &RequestContext<'_>,
        id: NodeId,
        name: &str,
    ) -> Result<Option<ComponentDescriptor>> {
        if self.node(id)?.removed.contains(name) {
            return Ok(None);
        }
        if let Some(detected) = self.scanned_layout(ctx, id)?.components.get(name) {
            return Ok(Some(detected.clone()));
        }
        let class_name = self.node(id)?.class_name.clone();
        ctx.catalog.find_component(&class_name, name)
    }

    /// Returns the layout scan of a node's `items`, computed once per node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node's config cannot be resolved.
    pub fn scanned_layout(&mut self, ctx: &RequestContext<'_>, id: NodeId) -> Result<&ScannedLayout> {
        if self.node(id)?.cache.layout.is_none() {
            let mut scanned = self
                .resolved_config(ctx, id)?
                .get(ITEMS_KEY)
                .map(scan_layout)
                .unwrap_or_default();
            let node = self.node_mut(id)?;
            scanned.remove_components(&node.removed);
            node.cache.layout = Some(scanned);
        }
        self.node(id)?
            .cache
            .layout
            .as_ref()
            .ok_or(TrellisError::StaleNode { index: id.0 })
    }

    /// Resolves `local_name` below `parent`, materializing it on first access.
    ///
    /// A fresh child is configured from the parent's weak children config,
    /// the descriptor's static config, `supplied`, and its forced name, then
    /// its own eager components are materialized. An already materialized
    /// child is returned as-is.
    ///
    /// # Errors
    ///
    /// - [`TrellisError::UnknownComponent`] if the name is not declared.
    /// - [`TrellisError::UnresolvedType`] if its class does not resolve.
    /// - [`TrellisError::Config`] for invalid names or exceeding the depth guard.
    pub fn resolve_child(
        &mut self,
        ctx: &RequestContext<'_>,
        parent: NodeId,
        local_name: &str,
        supplied: Option<&Config>,
    ) -> Result<NodeId> {
        if let Some(id) = self.node(parent)?.child(local_name) {
            return Ok(id);
        }

        let Some(descriptor) = self.find_descriptor(ctx, parent, local_name)? else {
            return Err(TrellisError::UnknownComponent {
                parent: self.global_id(parent)?.to_string(),
                name: local_name.to_owned(),
            });
        };
        if local_name.is_empty() || local_name.contains(SEPARATOR) {
            return Err(TrellisError::Config {
                message: format!("component name '{local_name}' must be non-empty and free of '{SEPARATOR}'"),
            });
        }

        let parent_node = self.node(parent)?;
        let global_id = parent_node.global_id.child(local_name);
        let depth = parent_node.depth + 1;
        if depth > ctx.max_depth {
            return Err(TrellisError::Config {
                message: format!(
                    "component tree exceeds depth {} at '{global_id}'",
                    ctx.max_depth
                ),
            });
        }
        let class = ctx
            .catalog
            .resolve_class(&descriptor.class_name, global_id.as_str())?;

        let mut config = self.weak_children_config(ctx, parent)?.clone();
        deep_merge(&mut config, &descriptor.static_config);
        if let Some(supplied) = supplied {
            deep_merge(&mut config, supplied);
        }
        let _ = config.insert(NAME_KEY.to_owned(), Value::String(local_name.to_owned()));

        tracing::debug!(
            global_id = %global_id,
            class = class.name(),
            lazy = descriptor.lazy,
            "materializing component"
        );
        let child = ComponentNode::new(
            local_name,
            global_id,
            class.name(),
            Some(parent),
            depth,
            config,
        );
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(child));
        let _ = self
            .node_mut(parent)?
            .children
            .insert(local_name.to_owned(), id);

        if let Err(err) = self.materialize_eager(ctx, id) {
            self.detach(parent, local_name)?;
            return Err(err);
        }
        Ok(id)
    }

    /// Materializes every non-lazy component of a node, recursively.
    ///
    /// # Errors
    ///
    /// Propagates the first materialization failure.
    pub fn materialize_eager(&mut self, ctx: &RequestContext<'_>, id: NodeId) -> Result<()> {
        for (name, descriptor) in self.effective_components(ctx, id)? {
            if descriptor.lazy {
                continue;
            }
            let _ = self.resolve_child(ctx, id, &name, None)?;
        }
        Ok(())
    }

    /// Returns the resolved configuration of a node, computed once and
    /// memoized until [`reset_config`](Self::reset_config).
    ///
    /// # Errors
    ///
    /// Returns an error if the node is stale or its class chain does not resolve.
    pub fn resolved_config(&mut self, ctx: &RequestContext<'_>, id: NodeId) -> Result<&Config> {
        if self.node(id)?.cache.resolved.is_none() {
            let resolved = self.compute_resolved_config(ctx, id)?;
            self.node_mut(id)?.cache.resolved = Some(resolved);
        }
        self.node(id)?
            .cache
            .resolved
            .as_ref()
            .ok_or(TrellisError::StaleNode { index: id.0 })
    }

    fn compute_resolved_config(&mut self, ctx: &RequestContext<'_>, id: NodeId) -> Result<Config> {
        let base = self.base_config(ctx, id)?;
        let persisted = self.persisted_config(ctx, id)?.clone();
        let strong = match self.node(id)?.parent {
            Some(parent) => self.strong_children_config(ctx, parent)?.clone(),
            None => Config::new(),
        };
        let mut config = merge_layers([&base, &persisted, &strong]);
        let name = self.node(id)?.name.clone();
        let _ = config.insert(NAME_KEY.to_owned(), Value::String(name));
        Ok(config)
    }

    /// Class defaults merged with passed config.
    fn base_config(&self, ctx: &RequestContext<'_>, id: NodeId) -> Result<Config> {
        let node = self.node(id)?;
        let mut config = ctx.catalog.default_config(&node.class_name)?;
        deep_merge(&mut config, &node.passed_config);
        Ok(config)
    }

    /// Returns the persisted layer of a node, decoded into nested config.
    ///
    /// Resolves to an empty layer when persistence is off for the node, no
    /// backend is configured, or the backend fails.
    ///
    /// # Errors
    ///
    /// Returns an error only if the node is stale or its class chain does not resolve.
    pub fn persisted_config(&mut self, ctx: &RequestContext<'_>, id: NodeId) -> Result<&Config> {
        if self.node(id)?.cache.persisted.is_none() {
            let base = self.base_config(ctx, id)?;
            let persisted = load_persisted(ctx, &base, self.global_id(id)?);
            self.node_mut(id)?.cache.persisted = Some(persisted);
        }
        self.node(id)?
            .cache
            .persisted
            .as_ref()
            .ok_or(TrellisError::StaleNode { index: id.0 })
    }

    /// Configuration this node forces onto its descendants: its own
    /// explicit `strong_children_config`, or else whatever its parent forces.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is stale or its class chain does not resolve.
    pub fn strong_children_config(&mut self, ctx: &RequestContext<'_>, id: NodeId) -> Result<&Config> {
        self.propagated_config(ctx, id, Propagation::Strong)
    }

    /// Low-precedence defaults this node hands to its descendants: its own
    /// explicit `weak_children_config`, or else its parent's.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is stale or its class chain does not resolve.
    pub fn weak_children_config(&mut self, ctx: &RequestContext<'_>, id: NodeId) -> Result<&Config> {
        self.propagated_config(ctx, id, Propagation::Weak)
    }

    fn propagated_config(
        &mut self,
        ctx: &RequestContext<'_>,
        id: NodeId,
        propagation: Propagation,
    ) -> Result<&Config> {
        if self.node(id)?.cache.propagated(propagation).is_none() {
            let base = self.base_config(ctx, id)?;
            let config = match base.get(propagation.key()) {
                Some(explicit) => as_config(explicit),
                None => match self.node(id)?.parent {
                    Some(parent) => self.propagated_config(ctx, parent, propagation)?.clone(),
                    None => Config::new(),
                },
            };
            *self.node_mut(id)?.cache.propagated_mut(propagation) = Some(config);
        }
        self.node(id)?
            .cache
            .propagated(propagation)
            .ok_or(TrellisError::StaleNode { index: id.0 })
    }

    /// Drops every memoized value of a node and its materialized descendants.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::StaleNode`] if the node was removed.
    pub fn reset_config(&mut self, id: NodeId) -> Result<()> {
        let _ = self.node(id)?;
        for member in self.subtree(id) {
            if let Some(Some(node)) = self.nodes.get_mut(member.0) {
                node.cache = NodeCache::default();
            }
        }
        tracing::debug!(global_id = %self.global_id(id)?, "reset component config");
        Ok(())
    }

    /// Writes one persisted setting for a node and invalidates its config.
    ///
    /// Does nothing when the node has persistence off or no backend is
    /// configured; backend failures are logged and swallowed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the node is stale or its class chain does not resolve.
    pub fn persist(
        &mut self,
        ctx: &mut RequestContext<'_>,
        id: NodeId,
        name: &str,
        value: Value,
    ) -> Result<()> {
        let base = self.base_config(ctx, id)?;
        let global_id = self.global_id(id)?.clone();
        if !persistence_enabled(&base) {
            tracing::debug!(global_id = %global_id, name, "persistence disabled, setting dropped");
            return Ok(());
        }
        let key = persistence_key(&base, &global_id);
        let Some(backend) = ctx.persistence_mut() else {
            tracing::debug!(global_id = %global_id, name, "no persistence backend, setting dropped");
            return Ok(());
        };
        if let Err(err) = backend.set(&key, name, value) {
            tracing::warn!(key, name, error = %err, "failed to persist setting");
            return Ok(());
        }
        self.reset_config(id)
    }

    /// Removes a component from one instance.
    ///
    /// The name stops resolving on this instance, its materialized subtree
    /// is discarded, and its persisted config is purged when a backend is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is stale or the child's config cannot be resolved.
    pub fn remove_component(
        &mut self,
        ctx: &mut RequestContext<'_>,
        parent: NodeId,
        name: &str,
    ) -> Result<()> {
        let global_id = self.global_id(parent)?.child(name);
        let key = match self.node(parent)?.child(name) {
            Some(child) => persistence_key(&self.base_config(ctx, child)?, &global_id),
            None => self.declared_persistence_key(ctx, parent, name, &global_id)?,
        };
        let _ = self.node_mut(parent)?.removed.insert(name.to_owned());
        self.detach(parent, name)?;
        self.node_mut(parent)?.cache.layout = None;
        self.invalidate_dependencies(parent);

        if let Some(backend) = ctx.persistence_mut() {
            if let Err(err) = backend.delete(&key) {
                tracing::warn!(key, error = %err, "failed to purge persisted config");
            }
        }
        tracing::info!(global_id = %global_id, "removed component");
        Ok(())
    }

    /// Persistence key of a declared but unmaterialized component, derived
    /// from the config it would be materialized with.
    fn declared_persistence_key(
        &mut self,
        ctx: &RequestContext<'_>,
        parent: NodeId,
        name: &str,
        global_id: &GlobalId,
    ) -> Result<String> {
        let Some(descriptor) = self.find_descriptor(ctx, parent, name)? else {
            return Ok(global_id.to_string());
        };
        let mut config = ctx
            .catalog
            .default_config(&descriptor.class_name)
            .unwrap_or_default();
        deep_merge(&mut config, self.weak_children_config(ctx, parent)?);
        deep_merge(&mut config, &descriptor.static_config);
        Ok(persistence_key(&config, global_id))
    }

    /// Drops the memoized client dependencies of a node and its ancestors.
    fn invalidate_dependencies(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(Some(node)) = current.and_then(|next| self.nodes.get_mut(next.0)) {
            node.cache.dependencies = None;
            current = node.parent;
        }
    }

    fn detach(&mut self, parent: NodeId, name: &str) -> Result<()> {
        if let Some(child) = self.node_mut(parent)?.children.shift_remove(name) {
            for member in self.subtree(child) {
                if let Some(slot) = self.nodes.get_mut(member.0) {
                    *slot = None;
                }
            }
        }
        Ok(())
    }

    /// A node and all its materialized descendants, parents first.
    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut members = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            members.push(current);
            if let Ok(node) = self.node(current) {
                stack.extend(node.children.values().rev().copied());
            }
        }
        members
    }

    /// Configuration shipped to the client: resolved config without
    /// server-only keys, with the scanned layout, global id, and class name.
    ///
    /// # Errors
    ///
    /// Returns an error if the node's config cannot be resolved.
    pub fn client_config(&mut self, ctx: &RequestContext<'_>, id: NodeId) -> Result<Config> {
        let mut config = self.resolved_config(ctx, id)?.clone();
        for key in SERVER_ONLY_KEYS {
            let _ = config.remove(*key);
        }
        if let Some(layout) = self.scanned_layout(ctx, id)?.layout.clone() {
            let _ = config.insert(ITEMS_KEY.to_owned(), layout);
        }
        let node = self.node(id)?;
        let _ = config.insert(
            ID_KEY.to_owned(),
            Value::String(node.global_id.to_string()),
        );
        let _ = config.insert(
            CLASS_NAME_KEY.to_owned(),
            Value::String(node.class_name.clone()),
        );
        Ok(config)
    }

    /// Classes the client needs to render a node: the node's class ancestry
    /// plus, recursively, its eager components. Ancestors always precede
    /// subclasses; embedded classes come first where ancestry allows.
    ///
    /// # Errors
    ///
    /// Returns an error if a class does not resolve or the classes form a cycle.
    pub fn client_dependencies(&mut self, ctx: &RequestContext<'_>, id: NodeId) -> Result<Vec<String>> {
        if self.node(id)?.cache.dependencies.is_none() {
            let mut graph = DependencyGraph::new();
            self.collect_dependencies(ctx, id, &mut graph)?;
            let order = graph.resolve_order()?;
            self.node_mut(id)?.cache.dependencies = Some(order);
        }
        Ok(self.node(id)?.cache.dependencies.clone().unwrap_or_default())
    }

    fn collect_dependencies(
        &mut self,
        ctx: &RequestContext<'_>,
        id: NodeId,
        graph: &mut DependencyGraph,
    ) -> Result<()> {
        for (name, descriptor) in self.effective_components(ctx, id)? {
            if descriptor.lazy {
                continue;
            }
            let child = self.resolve_child(ctx, id, &name, None)?;
            self.collect_dependencies(ctx, child, graph)?;
        }
        let class_name = self.node(id)?.class_name.clone();
        let ancestry = ctx.catalog.ancestry(&class_name)?;
        for class in ancestry.iter().rev() {
            let _ = graph.add_class(class.name());
        }
        for pair in ancestry.windows(2) {
            if let [derived, parent] = pair {
                graph.add_dependency(derived.name(), parent.name());
            }
        }
        Ok(())
    }
}

fn persistence_enabled(config: &Config) -> bool {
    config
        .get(PERSISTENCE_KEY)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn persistence_key(config: &Config, global_id: &GlobalId) -> String {
    config
        .get(PERSISTENCE_KEY_OVERRIDE)
        .and_then(Value::as_str)
        .map_or_else(|| global_id.to_string(), ToOwned::to_owned)
}

fn load_persisted(ctx: &RequestContext<'_>, base: &Config, global_id: &GlobalId) -> Config {
    if !persistence_enabled(base) {
        return Config::new();
    }
    let Some(backend) = ctx.persistence() else {
        tracing::trace!(global_id = %global_id, "no persistence backend configured");
        return Config::new();
    };
    let key = persistence_key(base, global_id);
    match backend.find_all_for_key(&key) {
        Ok(entries) => decode_settings(entries),
        Err(err) => {
            tracing::warn!(key, error = %err, "persisted config unavailable, using empty layer");
            Config::new()
        }
    }
}
