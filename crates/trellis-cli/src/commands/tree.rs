//! `trellis tree` — Print the component tree.

use clap::Args;
use trellis_compose::{ComponentTree, NodeId, RequestContext};

use super::{Globals, with_request};
use crate::output::{TreeLine, render_tree};

/// Arguments for the `tree` command.
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Also materialize lazy components.
    #[arg(long)]
    pub expand: bool,
}

/// Executes the `tree` command.
///
/// Builds the tree, optionally loads every lazy component, and prints
/// one line per component; unloaded lazy components are marked.
///
/// # Errors
///
/// Returns an error if the tree cannot be built.
pub fn execute(globals: &Globals, args: &TreeArgs) -> anyhow::Result<()> {
    with_request(globals, |_, tree, ctx| {
        let mut lines = Vec::new();
        let root = tree.root();
        collect(tree, ctx, root, args.expand, &mut lines)?;
        print!("{}", render_tree(&lines));
        Ok(())
    })
}

fn collect(
    tree: &mut ComponentTree,
    ctx: &RequestContext<'_>,
    id: NodeId,
    expand: bool,
    lines: &mut Vec<TreeLine>,
) -> anyhow::Result<()> {
    let node = tree.node(id)?;
    let depth = node.depth();
    lines.push(TreeLine {
        depth,
        name: node.name().to_owned(),
        class_name: node.class_name().to_owned(),
        loaded: true,
    });

    for (name, descriptor) in tree.effective_components(ctx, id)? {
        let child = match tree.node(id)?.child(&name) {
            Some(child) => Some(child),
            None if expand => Some(tree.resolve_child(ctx, id, &name, None)?),
            None => None,
        };
        match child {
            Some(child) => collect(tree, ctx, child, expand, lines)?,
            None => lines.push(TreeLine {
                depth: depth + 1,
                name,
                class_name: descriptor.class_name,
                loaded: false,
            }),
        }
    }
    Ok(())
}
