//! CLI command definitions and dispatch.

pub mod config;
pub mod dispatch;
pub mod load;
pub mod resolve;
pub mod tree;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trellis_common::config::TrellisConfig;
use trellis_common::constants::{BIN_NAME, DEFAULT_STATE_FILE, MAX_TREE_DEPTH};
use trellis_compose::{ComponentTree, NodeId, RequestContext};
use trellis_sdk::Application;
use trellis_store::MemorySession;

/// Trellis — server-side component trees.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the application manifest (YAML or JSON).
    #[arg(short, long, global = true, env = "TRELLIS_MANIFEST", default_value = "trellis.yaml")]
    pub manifest: PathBuf,

    /// Path to the persisted configuration file.
    #[arg(long, global = true, default_value = DEFAULT_STATE_FILE)]
    pub state_file: PathBuf,

    /// Ignore persisted configuration entirely.
    #[arg(long, global = true)]
    pub no_persistence: bool,

    /// Depth guard for eager materialization.
    #[arg(long, global = true, default_value_t = MAX_TREE_DEPTH)]
    pub max_depth: usize,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the component tree.
    Tree(tree::TreeArgs),
    /// Print the resolved configuration of a component.
    Config(config::ConfigArgs),
    /// Resolve a path reference to a global id.
    Resolve(resolve::ResolveArgs),
    /// Dispatch an action path, as a remote client would.
    Dispatch(dispatch::DispatchArgs),
    /// Lazily load a component, as a remote client would.
    Load(load::LoadArgs),
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Globals {
    /// Manifest path.
    pub manifest: PathBuf,
    /// Runtime settings derived from the flags.
    pub settings: TrellisConfig,
}

impl Globals {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            manifest: cli.manifest.clone(),
            settings: TrellisConfig {
                state_file: cli.state_file.clone(),
                persistence: !cli.no_persistence,
                max_depth: cli.max_depth,
            },
        }
    }

    /// Loads the application described by the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or validated.
    pub fn application(&self) -> anyhow::Result<Application> {
        Ok(Application::load(&self.manifest)?.with_settings(self.settings.clone()))
    }
}

/// Builds a fresh request (session, optional persistence, tree) and runs
/// `run` against it.
///
/// # Errors
///
/// Returns an error if the application, its state file, or its tree
/// cannot be loaded, or if `run` fails.
pub fn with_request<T>(
    globals: &Globals,
    run: impl FnOnce(&Application, &mut ComponentTree, &mut RequestContext<'_>) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let app = globals.application()?;
    let mut persistence = app.open_persistence()?;
    let mut session = MemorySession::new();
    let mut ctx = app.context(&mut session);
    if let Some(store) = persistence.as_mut() {
        ctx = ctx.with_persistence(store);
    }
    let mut tree = app.build_tree(&ctx)?;
    run(&app, &mut tree, &mut ctx)
}

/// Resolves a root-relative path to a node, failing outside the tree.
///
/// # Errors
///
/// Returns an error if a segment does not resolve.
pub fn node_at(
    tree: &mut ComponentTree,
    ctx: &RequestContext<'_>,
    path: &str,
) -> anyhow::Result<NodeId> {
    let root = tree.root();
    tree.node_at(ctx, root, path)?
        .ok_or_else(|| anyhow::anyhow!("'{path}' is outside the component tree"))
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let globals = Globals::from_cli(&cli);
    match cli.command {
        Command::Tree(args) => tree::execute(&globals, &args),
        Command::Config(args) => config::execute(&globals, &args),
        Command::Resolve(args) => resolve::execute(&globals, &args),
        Command::Dispatch(args) => dispatch::execute(&globals, args),
        Command::Load(args) => load::execute(&globals, args),
    }
}
