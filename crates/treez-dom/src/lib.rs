//! Document tree for treez.
//!
//! This crate provides the arena-based tree the HTML parser builds and the
//! outline renderer walks, loosely following the node model of the
//! [DOM Living Standard](https://dom.spec.whatwg.org/).
//!
//! # Design
//!
//! Every node lives in one contiguous arena and all relationships are
//! [`NodeId`] indices. The arena owns the whole tree; a node's subtree is
//! reachable through its first child and the sibling chain that follows it.
//! The tree is built once by the parser and read-only afterwards.

/// Pre-order/post-order traversal over a [`DomTree`].
pub mod walk;

pub use walk::{Hooks, NoHook, Visitor, for_each_node, walk};

use strum_macros::Display;

/// A type-safe index into the document tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#dom-node-nodetype)
///
/// "Each node has an associated node type"
///
/// `Error` is the zero value: a node whose kind could not be determined.
/// The parser never produces one, but consumers must tolerate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum NodeKind {
    /// A node of unknown kind.
    Error,
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text,
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element,
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment,
    /// [§ 4.6 Interface DocumentType](https://dom.spec.whatwg.org/#interface-documenttype)
    Doctype,
}

/// [§ 4.9.2 Interface Attr](https://dom.spec.whatwg.org/#interface-attr)
///
/// One `key="value"` pair of an element. Attribute lists keep document order
/// and may repeat a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name, lowercased by the parser.
    pub key: String,
    /// Attribute value; empty for valueless attributes such as `hidden`.
    pub value: String,
}

impl Attribute {
    /// Create an attribute from a key and value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub kind: NodeKind,

    /// Tag name for elements, character data for text and comments, the
    /// doctype name for doctypes, empty for the document.
    pub label: String,

    /// "An element has an associated attribute list". Empty for every other
    /// kind.
    pub attributes: Vec<Attribute>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    pub next_sibling: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    pub prev_sibling: Option<NodeId>,
}

impl Node {
    /// Create a detached node.
    #[must_use]
    pub fn new(kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        }
    }

    /// Create a detached element node with the given attributes.
    #[must_use]
    pub fn element(tag_name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            ..Self::new(NodeKind::Element, tag_name)
        }
    }

    /// Whether this node is an element.
    #[must_use]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// The first child, if any.
    #[must_use]
    pub fn first_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    /// Returns the value of the first attribute named `key`.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }
}

/// Arena-based document tree with O(1) node access and traversal.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree. A tree is a finite hierarchical
/// tree structure."
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes in the tree, indexed by `NodeId`.
    /// The Document node is always at index 0 (`NodeId::ROOT`).
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new tree holding just the Document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document, "")],
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get the number of nodes in the tree, including the Document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for trees built with [`DomTree::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
            ..node
        });
        id
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before null."
    ///
    /// Appends a detached `child` as the last child of `parent`.
    /// Does nothing if either ID is unknown, if `child` is already attached,
    /// or if `child` is the root or an inclusive ancestor of `parent`, so the
    /// arena stays a tree.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if child == NodeId::ROOT
            || parent.0 >= self.nodes.len()
            || self.get(child).is_none_or(|n| n.parent.is_some())
            || self.is_inclusive_ancestor(child, parent)
        {
            return;
        }

        let prev_last_child = self.nodes[parent.0].children.last().copied();
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
    }

    /// Mutable access to the last child when it is a text node, so adjacent
    /// character data can be merged into one node while the tree is built.
    pub fn last_text_child_mut(&mut self, parent: NodeId) -> Option<&mut String> {
        let last = self.last_child(parent)?;
        let node = self.nodes.get_mut(last.0)?;
        (node.kind == NodeKind::Text).then_some(&mut node.label)
    }

    /// [§ 4.2 Trees](https://dom.spec.whatwg.org/#concept-tree-inclusive-ancestor)
    ///
    /// "An inclusive ancestor is an object or one of its ancestors."
    #[must_use]
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::first_child)
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Get the node if it is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&Node> {
        self.get(id).filter(|n| n.is_element())
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is that
    /// document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .copied()
            .find(|&id| self.as_element(id).is_some())
    }

    /// Number of nodes of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Height of the tree: 1 for a lone Document, +1 per level below it.
    ///
    /// Walks parent links from each leaf, so it never recurses.
    #[must_use]
    pub fn depth(&self) -> usize {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|&id| self.children(id).is_empty())
            .map(|leaf| {
                let mut levels = 1;
                let mut current = self.parent(leaf);
                while let Some(id) = current {
                    levels += 1;
                    current = self.parent(id);
                }
                levels
            })
            .max()
            .unwrap_or(0)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}
