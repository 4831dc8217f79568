//! Path references between components.
//!
//! A reference is a `__`-joined string. Leading `parent` segments ascend the
//! tree one level each; whatever remains is appended to the reached
//! component's global id without checking that it exists, so references
//! to components that are not materialized yet still produce an id.

use nom::bytes::complete::{tag, take_until};
use nom::multi::many0_count;
use nom::sequence::terminated;
use nom::{IResult, Parser};
use trellis_common::constants::{PARENT_SEGMENT, SEPARATOR};
use trellis_common::error::Result;
use trellis_common::types::GlobalId;

use crate::context::RequestContext;
use crate::tree::{ComponentTree, NodeId};

/// A parsed path reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRef<'a> {
    /// Number of levels to ascend before descending.
    pub ascend: usize,
    /// Remaining `__`-joined path below the reached component, if any.
    pub descend: Option<&'a str>,
}

fn parent_prefixes(input: &str) -> IResult<&str, usize> {
    many0_count(terminated(tag(PARENT_SEGMENT), tag(SEPARATOR))).parse(input)
}

fn head_segment(input: &str) -> IResult<&str, &str> {
    terminated(take_until(SEPARATOR), tag(SEPARATOR)).parse(input)
}

/// Parses a reference such as `parent__parent__grid__toolbar`.
///
/// A bare trailing `parent` also ascends, so `parent` alone names the
/// parent itself.
#[must_use]
pub fn parse_path_ref(input: &str) -> PathRef<'_> {
    let (remainder, mut ascend) = parent_prefixes(input).unwrap_or((input, 0));
    let descend = if remainder == PARENT_SEGMENT {
        ascend += 1;
        None
    } else if remainder.is_empty() {
        None
    } else {
        Some(remainder)
    };
    PathRef { ascend, descend }
}

/// Splits an action path into its first segment and the rest.
///
/// `grid__toolbar__reload` yields `("grid", Some("toolbar__reload"))`;
/// a path without separator yields `(path, None)`.
#[must_use]
pub fn split_head(path: &str) -> (&str, Option<&str>) {
    match head_segment(path) {
        Ok((rest, head)) if !rest.is_empty() => (head, Some(rest)),
        Ok((_, head)) => (head, None),
        Err(_) => (path, None),
    }
}

impl ComponentTree {
    /// Resolves a path reference relative to `from` into a global id.
    ///
    /// Returns `None` when the reference ascends past the root.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` or one of its ancestors is stale.
    pub fn resolve_global_id(&self, from: NodeId, reference: &str) -> Result<Option<GlobalId>> {
        let path = parse_path_ref(reference);
        let Some(target) = self.ascend(from, path.ascend)? else {
            return Ok(None);
        };
        let global_id = self.global_id(target)?;
        Ok(Some(match path.descend {
            Some(rest) => global_id.child(rest),
            None => global_id.clone(),
        }))
    }

    fn ascend(&self, from: NodeId, levels: usize) -> Result<Option<NodeId>> {
        let mut current = from;
        for _ in 0..levels {
            match self.node(current)?.parent() {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Resolves a path reference relative to `from` into a live node,
    /// materializing every component along the way.
    ///
    /// Returns `None` when the reference ascends past the root.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment names an unknown component or its class
    /// does not resolve.
    pub fn node_at(
        &mut self,
        ctx: &RequestContext<'_>,
        from: NodeId,
        reference: &str,
    ) -> Result<Option<NodeId>> {
        let path = parse_path_ref(reference);
        let Some(mut current) = self.ascend(from, path.ascend)? else {
            return Ok(None);
        };
        if let Some(rest) = path.descend {
            for segment in rest.split(SEPARATOR) {
                current = self.resolve_child(ctx, current, segment, None)?;
            }
        }
        Ok(Some(current))
    }

    /// Resolves a global id of this tree into a live node, materializing
    /// along the way. Returns `None` for ids outside this tree.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment names an unknown component or its class
    /// does not resolve.
    pub fn node_by_global_id(
        &mut self,
        ctx: &RequestContext<'_>,
        global_id: &str,
    ) -> Result<Option<NodeId>> {
        let root = self.root();
        let root_id = self.global_id(root)?.as_str().to_owned();
        if global_id == root_id {
            return Ok(Some(root));
        }
        match global_id
            .strip_prefix(root_id.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
        {
            Some(relative) if !relative.is_empty() => self.node_at(ctx, root, relative),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use trellis_store::MemorySession;

    use super::*;
    use crate::catalog::{ComponentCatalog, ComponentClass, ComponentDescriptor};

    #[test]
    fn parses_parent_prefixes() {
        assert_eq!(
            parse_path_ref("parent__parent__x"),
            PathRef { ascend: 2, descend: Some("x") }
        );
        assert_eq!(parse_path_ref("x__y"), PathRef { ascend: 0, descend: Some("x__y") });
        assert_eq!(parse_path_ref("parent"), PathRef { ascend: 1, descend: None });
        assert_eq!(
            parse_path_ref("parent__parent"),
            PathRef { ascend: 2, descend: None }
        );
    }

    #[test]
    fn parent_must_be_a_whole_segment() {
        assert_eq!(
            parse_path_ref("parental__x"),
            PathRef { ascend: 0, descend: Some("parental__x") }
        );
        assert_eq!(
            parse_path_ref("x__parent__y"),
            PathRef { ascend: 0, descend: Some("x__parent__y") }
        );
    }

    #[test]
    fn split_head_separates_first_segment() {
        assert_eq!(split_head("grid__toolbar__reload"), ("grid", Some("toolbar__reload")));
        assert_eq!(split_head("reload"), ("reload", None));
        assert_eq!(split_head("grid__"), ("grid", None));
        assert_eq!(split_head("set_title"), ("set_title", None));
    }

    fn nested_tree() -> (ComponentCatalog, MemorySession) {
        let catalog = ComponentCatalog::new()
            .with_class(
                ComponentClass::new("App")
                    .component("a", ComponentDescriptor::new("Mid"))
                    .component("x", ComponentDescriptor::new("Leaf").lazy(true)),
            )
            .with_class(ComponentClass::new("Mid").component("b", ComponentDescriptor::new("Leaf")))
            .with_class(ComponentClass::new("Leaf"));
        (catalog, MemorySession::new())
    }

    #[test]
    fn parent_references_ascend_then_append() {
        let (catalog, mut session) = nested_tree();
        let ctx = RequestContext::new(&catalog, &mut session);
        let tree = ComponentTree::build(&ctx, "App", "R", &json!({})).expect("build");
        let b = tree.find("R__a__b").expect("b");

        let id = tree.resolve_global_id(b, "parent__parent__x").expect("resolve");
        assert_eq!(id.map(GlobalId::into_string), Some("R__x".to_owned()));
        let sibling = tree.resolve_global_id(b, "parent__c").expect("resolve");
        assert_eq!(sibling.map(GlobalId::into_string), Some("R__a__c".to_owned()));
        let own = tree.resolve_global_id(b, "deep__er").expect("resolve");
        assert_eq!(own.map(GlobalId::into_string), Some("R__a__b__deep__er".to_owned()));
    }

    #[test]
    fn ascending_past_root_is_none() {
        let (catalog, mut session) = nested_tree();
        let ctx = RequestContext::new(&catalog, &mut session);
        let tree = ComponentTree::build(&ctx, "App", "R", &json!({})).expect("build");
        let b = tree.find("R__a__b").expect("b");

        assert!(tree.resolve_global_id(b, "parent__parent__parent__x").expect("resolve").is_none());
        assert_eq!(
            tree.resolve_global_id(b, "parent__parent").expect("resolve").map(GlobalId::into_string),
            Some("R".to_owned())
        );
    }

    #[test]
    fn resolved_id_matches_direct_traversal() {
        let (catalog, mut session) = nested_tree();
        let ctx = RequestContext::new(&catalog, &mut session);
        let mut tree = ComponentTree::build(&ctx, "App", "R", &json!({})).expect("build");
        let b = tree.find("R__a__b").expect("b");

        let id = tree
            .resolve_global_id(b, "parent__parent__x")
            .expect("resolve")
            .expect("inside tree");
        let via_id = tree
            .node_by_global_id(&ctx, id.as_str())
            .expect("materialize")
            .expect("node");
        let direct = tree.resolve_child(&ctx, tree.root(), "x", None).expect("x");
        assert_eq!(via_id, direct);
        let via_ref = tree.node_at(&ctx, b, "parent__parent__x").expect("walk");
        assert_eq!(via_ref, Some(direct));
    }

    #[test]
    fn ids_outside_tree_do_not_resolve() {
        let (catalog, mut session) = nested_tree();
        let ctx = RequestContext::new(&catalog, &mut session);
        let mut tree = ComponentTree::build(&ctx, "App", "R", &json!({})).expect("build");
        assert!(tree.node_by_global_id(&ctx, "Other__x").expect("lookup").is_none());
        assert!(tree.node_by_global_id(&ctx, "Rx").expect("lookup").is_none());
        assert_eq!(
            tree.node_by_global_id(&ctx, "R").expect("lookup"),
            Some(tree.root())
        );
    }
}
