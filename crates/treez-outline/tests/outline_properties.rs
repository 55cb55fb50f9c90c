//! Properties of the outline over generated trees.

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use treez_dom::{DomTree, Node, NodeId, NodeKind, walk};
use treez_outline::{NodeStats, OutlineOptions, OutlineRenderer, render_outline};

const TAGS: &[&str] = &["div", "p", "span", "ul", "li", "a"];
const KINDS: &[NodeKind] = &[
    NodeKind::Element,
    NodeKind::Element,
    NodeKind::Element,
    NodeKind::Text,
    NodeKind::Comment,
];

/// A tree of random shape below the Document node.
#[derive(Debug, Clone)]
struct RandomTree(DomTree);

impl Arbitrary for RandomTree {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut tree = DomTree::new();
        let mut parents = vec![NodeId::ROOT];
        let count = usize::arbitrary(g) % (g.size() + 1);
        for _ in 0..count {
            let parent = parents[usize::arbitrary(g) % parents.len()];
            let kind = *g.choose(KINDS).expect("kinds");
            let node = if kind == NodeKind::Element {
                Node::element(*g.choose(TAGS).expect("tags"), Vec::new())
            } else {
                Node::new(kind, "x")
            };
            let id = tree.alloc(node);
            tree.append_child(parent, id);
            if kind == NodeKind::Element {
                parents.push(id);
            }
        }
        Self(tree)
    }
}

fn outline(tree: &DomTree) -> String {
    let mut out = Vec::new();
    render_outline(tree, &mut out, OutlineOptions::default()).expect("renders");
    String::from_utf8(out).expect("utf-8")
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

#[quickcheck]
fn prop_one_open_and_one_close_per_element(tree: RandomTree) -> bool {
    let text = outline(&tree.0);
    let elements = tree.0.count_kind(NodeKind::Element);
    let closes = text
        .lines()
        .filter(|line| line.trim_start().starts_with("</"))
        .count();
    text.lines().count() == 2 * elements && closes == elements
}

#[quickcheck]
fn prop_each_close_matches_its_open(tree: RandomTree) -> bool {
    let text = outline(&tree.0);
    let mut open: Vec<(usize, String)> = Vec::new();
    for line in text.lines() {
        let fragment = line.trim_start();
        if let Some(tag) = fragment.strip_prefix("</") {
            let Some((indent, opened)) = open.pop() else {
                return false;
            };
            if indent != indent_of(line) || format!("<{tag}") != opened {
                return false;
            }
        } else {
            if indent_of(line) != open.len() * 4 {
                return false;
            }
            open.push((indent_of(line), fragment.to_string()));
        }
    }
    open.is_empty()
}

#[quickcheck]
fn prop_depth_returns_to_zero(tree: RandomTree) -> bool {
    let mut out = Vec::new();
    let mut renderer = OutlineRenderer::new(&mut out, OutlineOptions::default());
    walk(&tree.0, tree.0.root(), &mut renderer).is_ok() && renderer.depth() == 0
}

#[quickcheck]
fn prop_rendering_is_repeatable(tree: RandomTree) -> bool {
    outline(&tree.0) == outline(&tree.0)
}

#[quickcheck]
fn prop_stats_count_every_node(tree: RandomTree) -> bool {
    let stats = NodeStats::collect(&tree.0);
    stats.total() == tree.0.len() && stats.elements == tree.0.count_kind(NodeKind::Element)
}
