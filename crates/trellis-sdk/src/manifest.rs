//! Declarative application manifests.
//!
//! A manifest names the root component and describes every component class:
//! its parent class, default configuration, sub-components, client code and
//! static endpoints. Both YAML and JSON are accepted.
//!
//! ```yaml
//! root:
//!   class_name: App
//!   name: app
//! classes:
//!   App:
//!     components:
//!       grid: { class_name: Grid }
//!   Grid:
//!     default_config: { persistence: true }
//!     endpoints:
//!       reload: { response: { rows: [] } }
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_common::error::{Result, TrellisError};
use trellis_compose::{ComponentCatalog, ComponentClass, ComponentDescriptor, Exposure};

/// A complete application description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// The root component of every tree.
    pub root: RootSpec,
    /// Component classes by name.
    #[serde(default)]
    pub classes: IndexMap<String, ClassSpec>,
}

/// The root component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootSpec {
    /// Class of the root component.
    pub class_name: String,
    /// Name (and global id) of the root component.
    pub name: String,
    /// Configuration passed to the root component.
    #[serde(default)]
    pub config: Value,
}

/// One component class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassSpec {
    /// Parent class name.
    pub extends: Option<String>,
    /// Class-level default configuration.
    pub default_config: Value,
    /// Configuration forced onto every descendant.
    pub strong_children_config: Option<Value>,
    /// Low-precedence defaults for every descendant.
    pub weak_children_config: Option<Value>,
    /// Client code shipped for this class.
    pub client_code: Option<String>,
    /// Sub-components by local name.
    pub components: IndexMap<String, ComponentSpec>,
    /// Static endpoints by action name.
    pub endpoints: IndexMap<String, EndpointSpec>,
}

/// One sub-component declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentSpec {
    /// Class to instantiate.
    pub class_name: String,
    /// Deferred instantiation.
    #[serde(default)]
    pub lazy: bool,
    /// Static configuration.
    #[serde(default)]
    pub config: Value,
}

/// A static endpoint: answers with a canned response, or echoes its params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointSpec {
    /// Whether remote dispatch may call the action.
    #[serde(default = "default_exposed")]
    pub exposed: bool,
    /// Canned response; the params are echoed back when absent.
    #[serde(default)]
    pub response: Option<Value>,
}

const fn default_exposed() -> bool {
    true
}

impl Manifest {
    /// Parses a YAML manifest.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Config`] if the document is malformed.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| TrellisError::Config {
            message: format!("invalid manifest: {e}"),
        })
    }

    /// Parses a JSON manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads a manifest file; `.json` files are parsed as JSON, anything
    /// else as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading manifest");
        let content = std::fs::read_to_string(path).map_err(|e| TrellisError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Builds the class catalog described by this manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the root class is missing or a class hierarchy
    /// refers to an unknown parent or loops.
    pub fn to_catalog(&self) -> Result<ComponentCatalog> {
        let mut catalog = ComponentCatalog::new();
        for (name, spec) in &self.classes {
            catalog.register(spec.to_class(name));
        }
        validate(&catalog, &self.root.class_name)?;
        Ok(catalog)
    }
}

impl ClassSpec {
    fn to_class(&self, name: &str) -> ComponentClass {
        let mut class = ComponentClass::new(name).default_config(self.default_config.clone());
        if let Some(parent) = &self.extends {
            class = class.extends(parent.clone());
        }
        if let Some(strong) = &self.strong_children_config {
            class = class.strong_children_config(strong.clone());
        }
        if let Some(weak) = &self.weak_children_config {
            class = class.weak_children_config(weak.clone());
        }
        if let Some(code) = &self.client_code {
            class = class.with_client_code(code.clone());
        }
        for (local_name, component) in &self.components {
            class.declare_component(
                local_name.clone(),
                ComponentDescriptor::new(component.class_name.clone())
                    .lazy(component.lazy)
                    .config(component.config.clone()),
            );
        }
        for (action, endpoint) in &self.endpoints {
            let exposure = if endpoint.exposed {
                Exposure::Endpoint
            } else {
                Exposure::Internal
            };
            let response = endpoint.response.clone();
            class = class.action(action.clone(), exposure, move |_, params| {
                Ok(response.clone().unwrap_or(params))
            });
        }
        class
    }
}

/// Checks that the root class exists and every class hierarchy resolves.
///
/// Sub-component class references are left alone: they only have to
/// resolve once the component is materialized.
fn validate(catalog: &ComponentCatalog, root_class: &str) -> Result<()> {
    let _ = catalog.resolve_class(root_class, "manifest root")?;
    for name in catalog.class_names() {
        let _ = catalog.ancestry(name)?;
    }
    tracing::debug!(classes = catalog.len(), "manifest validated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const YAML: &str = r"
root:
  class_name: App
  name: app
classes:
  Base:
    client_code: define('Base')
    endpoints:
      echo: {}
  App:
    extends: Base
    strong_children_config: { locale: fr }
    components:
      grid: { class_name: Grid, config: { title: Orders } }
      later: { class_name: Window, lazy: true }
  Grid:
    default_config: { persistence: true }
    endpoints:
      reload: { response: { rows: [] } }
      purge: { exposed: false }
";

    #[test]
    fn parses_yaml_manifest() {
        let manifest = Manifest::from_yaml(YAML).expect("parse");
        assert_eq!(manifest.root.name, "app");
        assert_eq!(manifest.classes.len(), 3);
        let app = &manifest.classes["App"];
        assert_eq!(app.extends.as_deref(), Some("Base"));
        assert!(app.components["later"].lazy);
        assert!(!manifest.classes["Grid"].endpoints["purge"].exposed);
        assert!(manifest.classes["Base"].endpoints["echo"].exposed);
    }

    #[test]
    fn builds_catalog_with_inheritance() {
        let catalog = Manifest::from_yaml(YAML).expect("parse").to_catalog().expect("catalog");
        let grid = catalog.find_component("App", "grid").expect("chain").expect("declared");
        assert_eq!(grid.class_name, "Grid");
        assert_eq!(grid.static_config["title"], json!("Orders"));
        assert!(catalog.find_action("App", "echo").expect("chain").is_some());
        assert!(
            !catalog
                .find_action("Grid", "purge")
                .expect("chain")
                .expect("declared")
                .is_exposed()
        );
        let defaults = catalog.default_config("App").expect("chain");
        assert_eq!(defaults["strong_children_config"], json!({ "locale": "fr" }));
    }

    #[test]
    fn dangling_component_class_is_accepted_until_use() {
        let manifest = Manifest::from_yaml(
            "root: { class_name: App, name: app }\nclasses:\n  App:\n    components:\n      x: { class_name: Missing, lazy: true }\n",
        )
        .expect("parse");
        assert!(manifest.to_catalog().is_ok());
    }

    #[test]
    fn missing_root_class_is_rejected() {
        let manifest = Manifest::from_yaml("root: { class_name: Nope, name: app }\n").expect("parse");
        let err = manifest.to_catalog().expect_err("no root");
        assert!(matches!(err, TrellisError::UnresolvedType { .. }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Manifest::from_yaml("root: { class_name: App, name: app, colour: red }\n")
            .expect_err("unknown field");
        assert!(err.to_string().contains("invalid manifest"));
    }

    #[test]
    fn json_and_files_are_supported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.json");
        std::fs::write(
            &path,
            r#"{ "root": { "class_name": "App", "name": "app" }, "classes": { "App": {} } }"#,
        )
        .expect("write");
        let manifest = Manifest::load(&path).expect("load");
        assert!(manifest.classes.contains_key("App"));

        let yaml_path = dir.path().join("app.yaml");
        std::fs::write(&yaml_path, YAML).expect("write");
        assert_eq!(Manifest::load(&yaml_path).expect("load").classes.len(), 3);
    }
}
