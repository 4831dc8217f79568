//! System-wide constants and reserved configuration keys.

/// Separator joining path segments in global ids and remote paths.
pub const SEPARATOR: &str = "__";

/// Path segment meaning "go to the parent component".
pub const PARENT_SEGMENT: &str = "parent";

/// Built-in endpoint present on every component that delivers a lazy child.
pub const DELIVER_COMPONENT_ENDPOINT: &str = "deliver_component";

/// Maximum depth of eager materialization below a single component.
pub const MAX_TREE_DEPTH: usize = 64;

/// Config key holding the local name of a component.
pub const NAME_KEY: &str = "name";

/// Client config key carrying the global id.
pub const ID_KEY: &str = "id";

/// Config key enabling persisted configuration for a component.
pub const PERSISTENCE_KEY: &str = "persistence";

/// Config key overriding the persistence key (defaults to the global id).
pub const PERSISTENCE_KEY_OVERRIDE: &str = "persistence_key";

/// Config key with configuration forced onto all descendants.
pub const STRONG_CHILDREN_CONFIG_KEY: &str = "strong_children_config";

/// Config key with low-precedence defaults for all descendants.
pub const WEAK_CHILDREN_CONFIG_KEY: &str = "weak_children_config";

/// Config key holding the nested layout description.
pub const ITEMS_KEY: &str = "items";

/// Layout key marking an embedded component definition.
pub const CLASS_NAME_KEY: &str = "class_name";

/// Layout key of a lightweight reference to a named component.
pub const COMPONENT_REF_KEY: &str = "component";

/// Config key flagging a component as lazily loaded.
pub const LAZY_KEY: &str = "lazy";

/// Config keys that never reach the client.
pub const SERVER_ONLY_KEYS: &[&str] = &[
    PERSISTENCE_KEY,
    PERSISTENCE_KEY_OVERRIDE,
    STRONG_CHILDREN_CONFIG_KEY,
    WEAK_CHILDREN_CONFIG_KEY,
];

/// Default path of the JSON persistence file.
pub const DEFAULT_STATE_FILE: &str = "trellis-state.json";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "trellis";
