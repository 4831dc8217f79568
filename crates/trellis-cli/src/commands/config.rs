//! `trellis config` — Print the resolved configuration of a component.

use clap::Args;
use serde_json::Value;

use super::{Globals, node_at, with_request};
use crate::output::print_json;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path of the component below the root (`grid__toolbar`); empty for the root.
    #[arg(default_value = "")]
    pub path: String,

    /// Print the client-facing config instead of the full resolved config.
    #[arg(long)]
    pub client: bool,

    /// Print only the persisted layer.
    #[arg(long, conflicts_with = "client")]
    pub persisted: bool,

    /// Print only the config passed by the parent at materialization.
    #[arg(long, conflicts_with_all = ["client", "persisted"])]
    pub passed: bool,
}

/// Executes the `config` command.
///
/// # Errors
///
/// Returns an error if the path does not resolve.
pub fn execute(globals: &Globals, args: &ConfigArgs) -> anyhow::Result<()> {
    with_request(globals, |_, tree, ctx| {
        let id = node_at(tree, ctx, &args.path)?;
        let config = if args.client {
            tree.client_config(ctx, id)?
        } else if args.persisted {
            tree.persisted_config(ctx, id)?.clone()
        } else if args.passed {
            tree.node(id)?.passed_config().clone()
        } else {
            tree.resolved_config(ctx, id)?.clone()
        };
        print_json(&Value::Object(config))
    })
}
