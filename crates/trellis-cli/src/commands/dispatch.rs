//! `trellis dispatch` — Dispatch an action path against the root.

use clap::Args;
use serde_json::Value;
use trellis_sdk::DispatchRequest;

use super::{Globals, with_request};
use crate::output::{parse_params, print_json};

/// Arguments for the `dispatch` command.
#[derive(Args, Debug)]
pub struct DispatchArgs {
    /// Action path, e.g. `grid__toolbar__reload`.
    pub action_path: String,

    /// JSON parameters; plain text is sent as a string.
    #[arg(short, long)]
    pub params: Option<String>,
}

/// Executes the `dispatch` command.
///
/// Prints the outcome (response or feedback) as JSON.
///
/// # Errors
///
/// Returns an error if the application or tree cannot be loaded.
pub fn execute(globals: &Globals, args: DispatchArgs) -> anyhow::Result<()> {
    let params = args.params.as_deref().map_or(Value::Null, parse_params);
    let request = DispatchRequest::new(args.action_path).params(params);
    with_request(globals, |app, tree, ctx| {
        let outcome = app.handle_dispatch(tree, ctx, request);
        print_json(&outcome)
    })
}
