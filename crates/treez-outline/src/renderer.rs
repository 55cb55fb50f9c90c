//! Indented element outline.
//!
//! Every element becomes an opening line when it is entered and a closing
//! line when it is exited, indented by its nesting depth:
//!
//! ```text
//! <a>
//!     <b>
//!     </b>
//! </a>
//! ```
//!
//! Text, comments and other non-element nodes print nothing, but their
//! children are still walked.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use treez_dom::{DomTree, Node, Visitor, walk};

use crate::error::VisitorError;

/// Layout of the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineOptions {
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// Print attributes inside opening tags.
    pub show_attributes: bool,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            indent_width: 4,
            show_attributes: false,
        }
    }
}

/// Writes the outline of one tree to a sink.
///
/// The depth counter lives in the renderer, so build a fresh one for each
/// walk.
pub struct OutlineRenderer<W> {
    sink: W,
    depth: usize,
    options: OutlineOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl<W: Write> OutlineRenderer<W> {
    /// Create a renderer at depth 0.
    pub const fn new(sink: W, options: OutlineOptions) -> Self {
        Self {
            sink,
            depth: 0,
            options,
            cancel: None,
        }
    }

    /// Abort the walk with [`VisitorError::Cancelled`] once `flag` is set.
    #[must_use]
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Current nesting depth. Zero before a walk and after a complete one.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn check_cancelled(&self) -> Result<(), VisitorError> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(VisitorError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Padding is streamed rather than formatted: `{:width$}` panics past
    /// `u16::MAX` columns, which deep trees or a large indent reach.
    fn write_line(&mut self, fragment: &str) -> io::Result<()> {
        let width = self.depth.saturating_mul(self.options.indent_width);
        let width = u64::try_from(width).unwrap_or(u64::MAX);
        let _ = io::copy(&mut io::repeat(b' ').take(width), &mut self.sink)?;
        writeln!(self.sink, "{fragment}")
    }

    fn open_tag(&self, node: &Node) -> String {
        if !self.options.show_attributes || node.attributes.is_empty() {
            return format!("<{}>", node.label);
        }
        let attrs: Vec<String> = node
            .attributes
            .iter()
            .map(|attr| {
                if attr.value.is_empty() {
                    attr.key.clone()
                } else {
                    format!("{}=\"{}\"", attr.key, attr.value.replace('"', "&quot;"))
                }
            })
            .collect();
        format!("<{} {}>", node.label, attrs.join(" "))
    }
}

impl<W: Write> Visitor for OutlineRenderer<W> {
    type Error = VisitorError;

    fn enter(&mut self, node: &Node) -> Result<(), VisitorError> {
        self.check_cancelled()?;
        if node.is_element() {
            let tag = self.open_tag(node);
            self.write_line(&tag)?;
            self.depth += 1;
        }
        Ok(())
    }

    fn exit(&mut self, node: &Node) -> Result<(), VisitorError> {
        self.check_cancelled()?;
        if node.is_element() {
            self.depth = self.depth.saturating_sub(1);
            self.write_line(&format!("</{}>", node.label))?;
        }
        Ok(())
    }
}

/// Write the outline of the whole tree to `sink`.
///
/// # Errors
///
/// Returns [`VisitorError::Sink`] if a write fails; the outline stops at
/// that point.
pub fn render_outline<W: Write>(
    tree: &DomTree,
    sink: W,
    options: OutlineOptions,
) -> Result<(), VisitorError> {
    let mut renderer = OutlineRenderer::new(sink, options);
    walk(tree, tree.root(), &mut renderer)
}

#[cfg(test)]
mod tests {
    use treez_dom::{Attribute, NodeId, NodeKind};

    use super::*;

    fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
        let id = tree.alloc(Node::element(tag, Vec::new()));
        tree.append_child(parent, id);
        id
    }

    fn outline(tree: &DomTree, options: OutlineOptions) -> String {
        let mut out = Vec::new();
        render_outline(tree, &mut out, options).expect("renders");
        String::from_utf8(out).expect("utf-8")
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_nested_elements() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, NodeId::ROOT, "a");
        let _ = element(&mut tree, a, "b");
        let _ = element(&mut tree, a, "c");

        assert_eq!(
            outline(&tree, OutlineOptions::default()),
            "<a>\n    <b>\n    </b>\n    <c>\n    </c>\n</a>\n"
        );
    }

    #[test]
    fn test_text_only_tree_prints_nothing() {
        let mut tree = DomTree::new();
        let text = tree.alloc(Node::new(NodeKind::Text, "hello"));
        tree.append_child(NodeId::ROOT, text);
        assert_eq!(outline(&tree, OutlineOptions::default()), "");

        let mut out = Vec::new();
        let mut renderer = OutlineRenderer::new(&mut out, OutlineOptions::default());
        walk(&tree, text, &mut renderer).expect("renders");
        assert_eq!(renderer.depth(), 0);
        drop(renderer);
        assert!(out.is_empty());
    }

    #[test]
    fn test_children_of_skipped_nodes_are_rendered() {
        let mut tree = DomTree::new();
        let unknown = tree.alloc(Node::new(NodeKind::Error, ""));
        tree.append_child(NodeId::ROOT, unknown);
        let _ = element(&mut tree, unknown, "x");

        assert_eq!(outline(&tree, OutlineOptions::default()), "<x>\n</x>\n");
    }

    #[test]
    fn test_indent_width() {
        let mut tree = DomTree::new();
        let ul = element(&mut tree, NodeId::ROOT, "ul");
        let _ = element(&mut tree, ul, "li");
        let options = OutlineOptions {
            indent_width: 2,
            ..OutlineOptions::default()
        };
        assert_eq!(outline(&tree, options), "<ul>\n  <li>\n  </li>\n</ul>\n");
    }

    #[test]
    fn test_indent_wider_than_format_width_limit() {
        let mut tree = DomTree::new();
        let ul = element(&mut tree, NodeId::ROOT, "ul");
        let _ = element(&mut tree, ul, "li");
        let options = OutlineOptions {
            indent_width: 70_000,
            ..OutlineOptions::default()
        };

        let text = outline(&tree, options);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], format!("{}<li>", " ".repeat(70_000)));
        assert_eq!(lines[2], format!("{}</li>", " ".repeat(70_000)));
        assert_eq!(lines[3], "</ul>");
    }

    #[test]
    fn test_huge_indent_saturates() {
        let mut tree = DomTree::new();
        let ul = element(&mut tree, NodeId::ROOT, "ul");
        let _ = element(&mut tree, ul, "li");
        let options = OutlineOptions {
            indent_width: usize::MAX,
            ..OutlineOptions::default()
        };

        // Depth 1 asks for u64::MAX spaces; the sink gives up first.
        let result = render_outline(&tree, CountingSink::with_limit(64), options);
        assert!(matches!(result, Err(VisitorError::Sink(_))));
    }

    /// Counts bytes and lines without keeping them.
    struct CountingSink {
        bytes: u64,
        lines: u64,
        limit: u64,
    }

    impl CountingSink {
        const fn with_limit(limit: u64) -> Self {
            Self {
                bytes: 0,
                lines: 0,
                limit,
            }
        }
    }

    impl Write for CountingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.bytes += buf.len() as u64;
            if self.bytes > self.limit {
                return Err(io::Error::other("limit reached"));
            }
            self.lines += buf.iter().filter(|&&b| b == b'\n').count() as u64;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_deep_tree_past_format_width_limit() {
        const DEPTH: u64 = 16_400;

        // Recursion depth matches the tree, so give the walk room.
        let handle = std::thread::Builder::new()
            .stack_size(512 * 1024 * 1024)
            .spawn(|| {
                let mut tree = DomTree::new();
                let mut parent = NodeId::ROOT;
                for _ in 0..DEPTH {
                    parent = element(&mut tree, parent, "div");
                }

                let mut renderer =
                    OutlineRenderer::new(CountingSink::with_limit(u64::MAX), OutlineOptions::default());
                walk(&tree, tree.root(), &mut renderer).expect("renders");
                assert_eq!(renderer.depth(), 0);
                renderer.into_inner()
            })
            .expect("spawn");
        let sink = handle.join().expect("no panic");

        // Each level d writes 4d spaces twice plus "<div>\n" and "</div>\n".
        assert_eq!(sink.lines, 2 * DEPTH);
        assert_eq!(sink.bytes, 4 * DEPTH * (DEPTH - 1) + 13 * DEPTH);
    }

    #[test]
    fn test_attributes_only_on_opening_tag() {
        let mut tree = DomTree::new();
        let a = tree.alloc(Node::element(
            "a",
            vec![
                Attribute::new("href", "/x"),
                Attribute::new("hidden", ""),
                Attribute::new("title", "say \"hi\""),
            ],
        ));
        tree.append_child(NodeId::ROOT, a);

        let options = OutlineOptions {
            show_attributes: true,
            ..OutlineOptions::default()
        };
        assert_eq!(
            outline(&tree, options),
            "<a href=\"/x\" hidden title=\"say &quot;hi&quot;\">\n</a>\n"
        );
        assert_eq!(outline(&tree, OutlineOptions::default()), "<a>\n</a>\n");
    }

    #[test]
    fn test_sink_failure_stops_the_walk() {
        let mut tree = DomTree::new();
        let _ = element(&mut tree, NodeId::ROOT, "a");
        let result = render_outline(&tree, BrokenSink, OutlineOptions::default());
        assert!(matches!(result, Err(VisitorError::Sink(_))));
    }

    #[test]
    fn test_cancelled_renderer_writes_nothing() {
        let mut tree = DomTree::new();
        let _ = element(&mut tree, NodeId::ROOT, "a");
        let flag = Arc::new(AtomicBool::new(true));

        let mut out = Vec::new();
        let mut renderer =
            OutlineRenderer::new(&mut out, OutlineOptions::default()).with_cancel(flag);
        let result = walk(&tree, tree.root(), &mut renderer);
        assert!(matches!(result, Err(VisitorError::Cancelled)));
        drop(renderer);
        assert!(out.is_empty());
    }
}
