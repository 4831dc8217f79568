//! Class-level component declarations.
//!
//! Each [`ComponentClass`] carries an immutable table of sub-component
//! descriptors, actions, default configuration, and client code. Lookups on
//! a class walk its explicit ancestor chain; the most-derived declaration of
//! a name wins, and nothing a subclass declares touches its ancestors.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use trellis_common::constants::{STRONG_CHILDREN_CONFIG_KEY, WEAK_CHILDREN_CONFIG_KEY};
use trellis_common::error::{Result, TrellisError};
use trellis_common::types::GlobalId;

use crate::config::{Config, as_config, deep_merge};
use crate::dispatch::{Feedback, Invocation};

/// Static declaration of a named sub-component.
///
/// Declarations are inert: the class reference is only resolved when the
/// component is materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescriptor {
    /// Local name, unique within the declaring class or instance.
    pub name: String,
    /// Name of the component class to instantiate.
    pub class_name: String,
    /// Configuration passed to the component when it is materialized.
    pub static_config: Config,
    /// Deferred instantiation; skipped by eager materialization.
    pub lazy: bool,
}

impl ComponentDescriptor {
    /// Creates an eager descriptor for `class_name` with empty config.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            class_name: class_name.into(),
            static_config: Config::new(),
            lazy: false,
        }
    }

    /// Sets the static configuration. Non-object values are ignored.
    #[must_use]
    pub fn config(mut self, config: Value) -> Self {
        self.static_config = as_config(&config);
        self
    }

    /// Marks the component as lazily loaded.
    #[must_use]
    pub const fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }
}

/// Whether an action may be reached through remote dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exposure {
    /// Externally callable endpoint.
    Endpoint,
    /// Server-side only; dispatching to it fails.
    Internal,
}

type ActionFn = dyn Fn(&mut Invocation<'_, '_>, Value) -> Result<Value> + Send + Sync;
type MissingFn = dyn Fn(&GlobalId, &str) -> Feedback + Send + Sync;

/// A named action in a class's action table.
#[derive(Clone)]
pub struct ActionDef {
    /// Action name as addressed by dispatch paths.
    pub name: String,
    /// Exposure of the action.
    pub exposure: Exposure,
    handler: Arc<ActionFn>,
}

impl ActionDef {
    /// Runs the action against an invocation.
    ///
    /// # Errors
    ///
    /// Propagates whatever error the handler returns.
    pub fn call(&self, invocation: &mut Invocation<'_, '_>, params: Value) -> Result<Value> {
        (self.handler)(invocation, params)
    }

    /// Returns `true` if the action is externally callable.
    #[must_use]
    pub fn is_exposed(&self) -> bool {
        self.exposure == Exposure::Endpoint
    }
}

impl fmt::Debug for ActionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDef")
            .field("name", &self.name)
            .field("exposure", &self.exposure)
            .finish_non_exhaustive()
    }
}

/// Handler producing feedback when a dispatch path names an unknown child.
#[derive(Clone)]
pub struct MissingHandler(Arc<MissingFn>);

impl MissingHandler {
    /// Builds the feedback for `name` missing below `parent`.
    #[must_use]
    pub fn feedback(&self, parent: &GlobalId, name: &str) -> Feedback {
        (self.0)(parent, name)
    }
}

impl fmt::Debug for MissingHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MissingHandler")
    }
}

/// A component class: the unit of declaration and inheritance.
#[derive(Debug, Clone)]
pub struct ComponentClass {
    name: String,
    extends: Option<String>,
    default_config: Config,
    components: IndexMap<String, ComponentDescriptor>,
    actions: IndexMap<String, ActionDef>,
    client_code: Option<String>,
    component_missing: Option<MissingHandler>,
}

impl ComponentClass {
    /// Creates a class with no parent and empty tables.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            default_config: Config::new(),
            components: IndexMap::new(),
            actions: IndexMap::new(),
            client_code: None,
            component_missing: None,
        }
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent class name, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    /// Returns the components declared directly on this class.
    #[must_use]
    pub const fn own_components(&self) -> &IndexMap<String, ComponentDescriptor> {
        &self.components
    }

    /// Returns the client code declared directly on this class.
    #[must_use]
    pub fn client_code(&self) -> Option<&str> {
        self.client_code.as_deref()
    }

    /// Sets the parent class.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Deep-merges `config` into the class-level defaults.
    #[must_use]
    pub fn default_config(mut self, config: Value) -> Self {
        deep_merge(&mut self.default_config, &as_config(&config));
        self
    }

    /// Declares configuration forced onto every descendant component.
    #[must_use]
    pub fn strong_children_config(self, config: Value) -> Self {
        self.nested_default(STRONG_CHILDREN_CONFIG_KEY, config)
    }

    /// Declares low-precedence defaults for every descendant component.
    #[must_use]
    pub fn weak_children_config(self, config: Value) -> Self {
        self.nested_default(WEAK_CHILDREN_CONFIG_KEY, config)
    }

    fn nested_default(mut self, key: &str, config: Value) -> Self {
        let mut wrapper = Config::new();
        let _ = wrapper.insert(key.to_owned(), Value::Object(as_config(&config)));
        deep_merge(&mut self.default_config, &wrapper);
        self
    }

    /// Builder form of [`declare_component`](Self::declare_component).
    #[must_use]
    pub fn component(mut self, name: impl Into<String>, descriptor: ComponentDescriptor) -> Self {
        self.declare_component(name, descriptor);
        self
    }

    /// Registers `name -> descriptor`, replacing an earlier declaration.
    pub fn declare_component(&mut self, name: impl Into<String>, mut descriptor: ComponentDescriptor) {
        let name = name.into();
        descriptor.name.clone_from(&name);
        let _ = self.components.insert(name, descriptor);
    }

    /// Registers an externally callable action.
    #[must_use]
    pub fn endpoint<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Invocation<'_, '_>, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.action(name, Exposure::Endpoint, handler)
    }

    /// Registers a server-side action that dispatch refuses to call.
    #[must_use]
    pub fn internal<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Invocation<'_, '_>, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.action(name, Exposure::Internal, handler)
    }

    /// Registers an action with an explicit exposure.
    #[must_use]
    pub fn action<F>(mut self, name: impl Into<String>, exposure: Exposure, handler: F) -> Self
    where
        F: Fn(&mut Invocation<'_, '_>, Value) -> Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let def = ActionDef {
            name: name.clone(),
            exposure,
            handler: Arc::new(handler),
        };
        let _ = self.actions.insert(name, def);
        self
    }

    /// Sets the client-side code shipped for this class.
    #[must_use]
    pub fn with_client_code(mut self, code: impl Into<String>) -> Self {
        self.client_code = Some(code.into());
        self
    }

    /// Overrides the feedback returned when dispatch names an unknown child.
    #[must_use]
    pub fn on_component_missing<F>(mut self, handler: F) -> Self
    where
        F: Fn(&GlobalId, &str) -> Feedback + Send + Sync + 'static,
    {
        self.component_missing = Some(MissingHandler(Arc::new(handler)));
        self
    }
}

/// The set of component classes known to an application.
///
/// Also serves as the class resolver: a class name either resolves here or
/// materialization fails with [`TrellisError::UnresolvedType`].
#[derive(Debug, Clone, Default)]
pub struct ComponentCatalog {
    classes: IndexMap<String, ComponentClass>,
}

impl ComponentCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with_class(mut self, class: ComponentClass) -> Self {
        self.register(class);
        self
    }

    /// Adds a class, replacing an earlier class of the same name.
    pub fn register(&mut self, class: ComponentClass) {
        tracing::debug!(class = class.name(), parent = ?class.parent(), "registering component class");
        let _ = self.classes.insert(class.name.clone(), class);
    }

    /// Returns the number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterates over registered class names in registration order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Looks up a class by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ComponentClass> {
        self.classes.get(name)
    }

    /// Resolves a class reference held by `referenced_by`.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::UnresolvedType`] if the class is unknown.
    pub fn resolve_class(&self, class_name: &str, referenced_by: &str) -> Result<&ComponentClass> {
        self.get(class_name).ok_or_else(|| TrellisError::UnresolvedType {
            class_name: class_name.to_owned(),
            referenced_by: referenced_by.to_owned(),
        })
    }

    /// Returns the class and its ancestors, most-derived first.
    ///
    /// # Errors
    ///
    /// Returns an error if a class in the chain is unknown or the chain
    /// loops back on itself.
    pub fn ancestry(&self, class_name: &str) -> Result<Vec<&ComponentClass>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some((class_name, class_name));
        while let Some((name, referenced_by)) = current {
            if !seen.insert(name) {
                return Err(TrellisError::Config {
                    message: format!("cyclic class hierarchy through '{name}'"),
                });
            }
            let class = self.resolve_class(name, referenced_by)?;
            chain.push(class);
            current = class.parent().map(|parent| (parent, class.name()));
        }
        Ok(chain)
    }

    /// Returns the effective component table of a class: every declaration
    /// along the ancestor chain, the most-derived one winning per name.
    ///
    /// # Errors
    ///
    /// Returns an error if the ancestor chain cannot be resolved.
    pub fn component_table(&self, class_name: &str) -> Result<IndexMap<String, ComponentDescriptor>> {
        let mut table = IndexMap::new();
        for class in self.ancestry(class_name)?.into_iter().rev() {
            for (name, descriptor) in &class.components {
                let _ = table.insert(name.clone(), descriptor.clone());
            }
        }
        Ok(table)
    }

    /// Looks up one component declaration, most-derived first.
    ///
    /// # Errors
    ///
    /// Returns an error if the ancestor chain cannot be resolved.
    pub fn find_component(&self, class_name: &str, name: &str) -> Result<Option<ComponentDescriptor>> {
        Ok(self
            .ancestry(class_name)?
            .into_iter()
            .find_map(|class| class.components.get(name).cloned()))
    }

    /// Returns the class-level default config, merged base-first.
    ///
    /// # Errors
    ///
    /// Returns an error if the ancestor chain cannot be resolved.
    pub fn default_config(&self, class_name: &str) -> Result<Config> {
        let mut config = Config::new();
        for class in self.ancestry(class_name)?.into_iter().rev() {
            deep_merge(&mut config, &class.default_config);
        }
        Ok(config)
    }

    /// Looks up an action, most-derived first.
    ///
    /// # Errors
    ///
    /// Returns an error if the ancestor chain cannot be resolved.
    pub fn find_action(&self, class_name: &str, action: &str) -> Result<Option<&ActionDef>> {
        Ok(self
            .ancestry(class_name)?
            .into_iter()
            .find_map(|class| class.actions.get(action)))
    }

    /// Returns the nearest missing-component handler along the chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the ancestor chain cannot be resolved.
    pub fn component_missing_handler(&self, class_name: &str) -> Result<Option<&MissingHandler>> {
        Ok(self
            .ancestry(class_name)?
            .into_iter()
            .find_map(|class| class.component_missing.as_ref()))
    }
}
