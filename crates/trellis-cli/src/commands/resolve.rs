//! `trellis resolve` — Resolve a path reference to a global id.

use clap::Args;

use super::{Globals, node_at, with_request};

/// Arguments for the `resolve` command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Reference to resolve, e.g. `parent__parent__grid`.
    pub reference: String,

    /// Component the reference is relative to; empty for the root.
    #[arg(long, default_value = "")]
    pub from: String,
}

/// Executes the `resolve` command.
///
/// The target does not need to exist; only the components along `--from`
/// are materialized.
///
/// # Errors
///
/// Returns an error if `--from` does not resolve or the reference ascends
/// past the root.
pub fn execute(globals: &Globals, args: &ResolveArgs) -> anyhow::Result<()> {
    with_request(globals, |_, tree, ctx| {
        let from = node_at(tree, ctx, &args.from)?;
        let global_id = tree
            .resolve_global_id(from, &args.reference)?
            .ok_or_else(|| anyhow::anyhow!("'{}' ascends past the root", args.reference))?;
        println!("{global_id}");
        Ok(())
    })
}
