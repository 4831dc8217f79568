//! `trellis load` — Lazily load a component.

use clap::Args;
use trellis_compose::LoadRequest;
use trellis_sdk::LoadComponentRequest;

use super::{Globals, with_request};
use crate::output::print_json;

/// Arguments for the `load` command.
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Local name of the component to load.
    pub name: String,

    /// Path of the requesting component below the root; empty for the root.
    #[arg(long, default_value = "")]
    pub parent: String,

    /// Client container to render into.
    #[arg(long)]
    pub container: Option<String>,

    /// Classes already cached client-side (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub cached: Vec<String>,
}

/// Executes the `load` command.
///
/// Prints the load result (missing code, render instruction, event) as JSON.
///
/// # Errors
///
/// Returns an error if the application or tree cannot be loaded.
pub fn execute(globals: &Globals, args: LoadArgs) -> anyhow::Result<()> {
    let mut request = LoadRequest::new(args.name).cached(args.cached);
    request.container = args.container;
    let request = LoadComponentRequest {
        parent: args.parent,
        request,
    };
    with_request(globals, |app, tree, ctx| {
        let result = app.handle_load(tree, ctx, &request);
        print_json(&result)
    })
}
