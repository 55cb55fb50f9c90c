//! Node statistics gathered with the same walk as the outline.

use std::convert::Infallible;
use std::fmt;

use treez_dom::{DomTree, Node, NodeKind, Visitor, walk};

/// Node counts per kind and the deepest element nesting of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Element nodes.
    pub elements: usize,
    /// Text nodes.
    pub text: usize,
    /// Comment nodes.
    pub comments: usize,
    /// Doctype nodes.
    pub doctypes: usize,
    /// Document and unknown nodes.
    pub other: usize,
    /// Deepest element nesting; `<html>` alone is 1.
    pub max_depth: usize,
    depth: usize,
}

impl NodeStats {
    /// Count the nodes of the whole tree.
    #[must_use]
    pub fn collect(tree: &DomTree) -> Self {
        let mut stats = Self::default();
        let Ok(()) = walk(tree, tree.root(), &mut stats);
        stats
    }

    /// Number of nodes counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.elements + self.text + self.comments + self.doctypes + self.other
    }
}

impl Visitor for NodeStats {
    type Error = Infallible;

    fn enter(&mut self, node: &Node) -> Result<(), Infallible> {
        match node.kind {
            NodeKind::Element => {
                self.elements += 1;
                self.depth += 1;
                self.max_depth = self.max_depth.max(self.depth);
            }
            NodeKind::Text => self.text += 1,
            NodeKind::Comment => self.comments += 1,
            NodeKind::Doctype => self.doctypes += 1,
            NodeKind::Document | NodeKind::Error => self.other += 1,
        }
        Ok(())
    }

    fn exit(&mut self, node: &Node) -> Result<(), Infallible> {
        if node.kind == NodeKind::Element {
            self.depth -= 1;
        }
        Ok(())
    }
}

impl fmt::Display for NodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} elements, {} text, {} comments, {} doctypes, max depth {}",
            self.elements, self.text, self.comments, self.doctypes, self.max_depth
        )
    }
}
