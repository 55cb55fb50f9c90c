//! Depth-first traversal with an enter hook before a node's children and an
//! exit hook after them.
//!
//! # Example
//!
//! ```rust
//! use std::convert::Infallible;
//! use treez_dom::{DomTree, Node, NodeId, NodeKind, Visitor, walk};
//!
//! /// Records the order elements are entered.
//! #[derive(Default)]
//! struct Tags(Vec<String>);
//!
//! impl Visitor for Tags {
//!     type Error = Infallible;
//!
//!     fn enter(&mut self, node: &Node) -> Result<(), Infallible> {
//!         if node.kind == NodeKind::Element {
//!             self.0.push(node.label.clone());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut tree = DomTree::new();
//! let html = tree.alloc(Node::element("html", Vec::new()));
//! tree.append_child(NodeId::ROOT, html);
//! let body = tree.alloc(Node::element("body", Vec::new()));
//! tree.append_child(html, body);
//!
//! let mut tags = Tags::default();
//! let Ok(()) = walk(&tree, tree.root(), &mut tags);
//! assert_eq!(tags.0, ["html", "body"]);
//! ```

use crate::{DomTree, Node, NodeId};

/// A pair of hooks run around every node of a walk.
///
/// Both methods default to doing nothing, so a visitor overrides only the
/// phase it cares about. Returning `Err` from either aborts the walk.
pub trait Visitor {
    /// Failure type of the hooks. Use [`std::convert::Infallible`] for
    /// visitors that cannot fail.
    type Error;

    /// Called on a node before any of its children are walked.
    ///
    /// # Errors
    ///
    /// Any error stops the walk immediately.
    fn enter(&mut self, _node: &Node) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on a node after all of its children have been walked.
    ///
    /// # Errors
    ///
    /// Any error stops the walk immediately.
    fn exit(&mut self, _node: &Node) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Walk the subtree rooted at `id`.
///
/// Runs `visitor.enter` on `id`, then walks each child to completion in
/// sibling order (first child, then its next sibling, and so on), then runs
/// `visitor.exit` on `id`. Every node of the subtree is entered once and
/// exited once. An `id` not present in `tree` is an empty subtree.
///
/// Recursion depth equals the subtree height.
///
/// # Errors
///
/// Returns the first error raised by the visitor. Nothing else runs after
/// it: remaining siblings are not walked and ancestors already entered are
/// not exited.
pub fn walk<V>(tree: &DomTree, id: NodeId, visitor: &mut V) -> Result<(), V::Error>
where
    V: Visitor + ?Sized,
{
    let Some(node) = tree.get(id) else {
        return Ok(());
    };

    visitor.enter(node)?;

    let mut child = node.first_child();
    while let Some(child_id) = child {
        walk(tree, child_id, visitor)?;
        child = tree.next_sibling(child_id);
    }

    visitor.exit(node)
}

/// Placeholder type for an absent hook in [`Hooks`].
pub type NoHook<E> = fn(&Node) -> Result<(), E>;

/// A [`Visitor`] made of two optional closures.
///
/// `None` in either slot means nothing runs in that phase.
pub struct Hooks<F, G> {
    enter: Option<F>,
    exit: Option<G>,
}

impl<F, G> Hooks<F, G> {
    /// Build a visitor from an optional pre-order and post-order closure.
    pub const fn new(enter: Option<F>, exit: Option<G>) -> Self {
        Self { enter, exit }
    }
}

impl<E, F> Hooks<F, NoHook<E>>
where
    F: FnMut(&Node) -> Result<(), E>,
{
    /// A visitor with only a pre-order hook.
    pub const fn on_enter(enter: F) -> Self {
        Self {
            enter: Some(enter),
            exit: None,
        }
    }
}

impl<E, G> Hooks<NoHook<E>, G>
where
    G: FnMut(&Node) -> Result<(), E>,
{
    /// A visitor with only a post-order hook.
    pub const fn on_exit(exit: G) -> Self {
        Self {
            enter: None,
            exit: Some(exit),
        }
    }
}

impl<E, F, G> Visitor for Hooks<F, G>
where
    F: FnMut(&Node) -> Result<(), E>,
    G: FnMut(&Node) -> Result<(), E>,
{
    type Error = E;

    fn enter(&mut self, node: &Node) -> Result<(), E> {
        self.enter.as_mut().map_or(Ok(()), |hook| hook(node))
    }

    fn exit(&mut self, node: &Node) -> Result<(), E> {
        self.exit.as_mut().map_or(Ok(()), |hook| hook(node))
    }
}

/// Call `pre` on every node of the subtree at `id` before its children and
/// `post` after them. Either may be `None`.
///
/// # Errors
///
/// Returns the first error raised by either closure; see [`walk`].
pub fn for_each_node<E, F, G>(
    tree: &DomTree,
    id: NodeId,
    pre: Option<F>,
    post: Option<G>,
) -> Result<(), E>
where
    F: FnMut(&Node) -> Result<(), E>,
    G: FnMut(&Node) -> Result<(), E>,
{
    walk(tree, id, &mut Hooks::new(pre, post))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::convert::Infallible;

    use super::*;
    use crate::NodeKind;

    /// `<html><body><p>hi</p><div/></body></html>`
    fn sample() -> DomTree {
        let mut tree = DomTree::new();
        let html = tree.alloc(Node::element("html", Vec::new()));
        tree.append_child(NodeId::ROOT, html);
        let body = tree.alloc(Node::element("body", Vec::new()));
        tree.append_child(html, body);
        let p = tree.alloc(Node::element("p", Vec::new()));
        tree.append_child(body, p);
        let text = tree.alloc(Node::new(NodeKind::Text, "hi"));
        tree.append_child(p, text);
        let div = tree.alloc(Node::element("div", Vec::new()));
        tree.append_child(body, div);
        tree
    }

    #[test]
    fn test_enter_is_preorder_and_exit_is_postorder() {
        let tree = sample();
        let mut events = Vec::new();
        let mut hooks = Hooks::new(
            Some(|node: &Node| {
                events.push(format!("+{}", node.label));
                Ok::<(), Infallible>(())
            }),
            None::<NoHook<Infallible>>,
        );
        let Ok(()) = walk(&tree, tree.root(), &mut hooks);
        drop(hooks);
        assert_eq!(events, ["+", "+html", "+body", "+p", "+hi", "+div"]);

        let mut order = Vec::new();
        let Ok(()) = walk(
            &tree,
            tree.root(),
            &mut Hooks::on_exit(|node: &Node| {
                order.push(node.label.clone());
                Ok::<(), Infallible>(())
            }),
        );
        assert_eq!(order, ["hi", "p", "div", "body", "html", ""]);
    }

    #[test]
    fn test_every_node_visited_once_per_phase() {
        let tree = sample();
        let mut entered = 0;
        let mut exited = 0;
        let result: Result<(), Infallible> = for_each_node(
            &tree,
            tree.root(),
            Some(|_: &Node| {
                entered += 1;
                Ok(())
            }),
            Some(|_: &Node| {
                exited += 1;
                Ok(())
            }),
        );
        assert!(result.is_ok());
        assert_eq!(entered, tree.len());
        assert_eq!(exited, tree.len());
    }

    #[test]
    fn test_both_hooks_absent_is_a_no_op() {
        let tree = sample();
        let result = for_each_node(
            &tree,
            tree.root(),
            None::<NoHook<Infallible>>,
            None::<NoHook<Infallible>>,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_unknown_id_walks_nothing() {
        let tree = sample();
        let mut visits = 0;
        let Ok(()) = walk(
            &tree,
            NodeId(999),
            &mut Hooks::on_enter(|_: &Node| {
                visits += 1;
                Ok::<(), Infallible>(())
            }),
        );
        assert_eq!(visits, 0);
    }

    #[test]
    fn test_error_aborts_remaining_walk() {
        let tree = sample();
        let events = RefCell::new(Vec::new());
        let result = for_each_node(
            &tree,
            tree.root(),
            Some(|node: &Node| {
                if node.label == "p" {
                    return Err("stop");
                }
                events.borrow_mut().push(format!("+{}", node.label));
                Ok(())
            }),
            Some(|node: &Node| {
                events.borrow_mut().push(format!("-{}", node.label));
                Ok(())
            }),
        );
        assert_eq!(result, Err("stop"));
        // No exit for the entered ancestors, no visit of p's sibling div.
        assert_eq!(events.into_inner(), ["+", "+html", "+body"]);
    }

    #[test]
    fn test_error_from_exit_skips_later_siblings() {
        let tree = sample();
        let mut seen = Vec::new();
        let result = for_each_node(
            &tree,
            tree.root(),
            Some(|node: &Node| {
                seen.push(node.label.clone());
                Ok(())
            }),
            Some(|node: &Node| if node.label == "p" { Err(()) } else { Ok(()) }),
        );
        assert_eq!(result, Err(()));
        assert!(!seen.contains(&"div".to_string()));
    }
}
