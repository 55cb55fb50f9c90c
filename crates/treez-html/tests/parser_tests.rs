//! Integration tests for the HTML parser.

use quickcheck_macros::quickcheck;
use treez_dom::{DomTree, NodeId, NodeKind};
use treez_html::{
    DEFAULT_MAX_DEPTH, HTMLParser, HTMLTokenizer, ParseError, ParserOptions, parse,
    parse_with_options,
};

/// Helper to parse HTML and return the DOM tree
fn parse_html(html: &str) -> DomTree {
    let mut tokenizer = HTMLTokenizer::new(html);
    tokenizer.run();
    let (tree, _) = HTMLParser::new(tokenizer.into_tokens())
        .run()
        .expect("parses");
    tree
}

/// Element structure below `id` as `tag(child,child)`, skipping non-elements.
fn structure(tree: &DomTree, id: NodeId) -> String {
    let children: Vec<String> = tree
        .children(id)
        .iter()
        .filter(|&&child| tree.as_element(child).is_some())
        .map(|&child| structure(tree, child))
        .collect();
    let label = tree.get(id).map_or("", |n| n.label.as_str());
    if children.is_empty() {
        label.to_string()
    } else {
        format!("{label}({})", children.join(","))
    }
}

/// Structure of the whole document starting at `<html>`.
fn document_structure(html: &str) -> String {
    let tree = parse_html(html);
    let root = tree.document_element().expect("document element");
    structure(&tree, root)
}

/// Helper to get element by tag name (first match, depth-first)
fn find_element(tree: &DomTree, from: NodeId, tag: &str) -> Option<NodeId> {
    if tree.as_element(from).is_some_and(|n| n.label == tag) {
        return Some(from);
    }
    tree.children(from)
        .iter()
        .find_map(|&child| find_element(tree, child, tag))
}

/// Helper to get text content of a node (concatenated)
fn text_content(tree: &DomTree, id: NodeId) -> String {
    match tree.get(id) {
        Some(node) if node.kind == NodeKind::Text => node.label.clone(),
        Some(_) => tree
            .children(id)
            .iter()
            .map(|&child| text_content(tree, child))
            .collect(),
        None => String::new(),
    }
}

#[test]
fn test_document_structure() {
    let tree = parse_html("<!DOCTYPE html><html><head></head><body></body></html>");

    let root_kinds: Vec<NodeKind> = tree
        .children(NodeId::ROOT)
        .iter()
        .filter_map(|&id| tree.get(id).map(|n| n.kind))
        .collect();
    assert_eq!(root_kinds, [NodeKind::Doctype, NodeKind::Element]);

    let doctype = tree.children(NodeId::ROOT)[0];
    assert_eq!(tree.get(doctype).map(|n| n.label.as_str()), Some("html"));

    let html = tree.document_element().expect("html");
    assert_eq!(structure(&tree, html), "html(head,body)");
}

#[test]
fn test_implied_html_head_and_body() {
    assert_eq!(document_structure("<p>hi"), "html(head,body(p))");
    assert_eq!(document_structure("just text"), "html(head,body)");
    assert_eq!(document_structure(""), "html(head,body)");
}

#[test]
fn test_head_content_goes_to_head() {
    assert_eq!(
        document_structure("<title>T</title><meta charset=utf-8><p>x"),
        "html(head(title,meta),body(p))"
    );
}

#[test]
fn test_head_content_after_head_is_moved_into_head() {
    assert_eq!(
        document_structure("<head></head><link rel=x><body>"),
        "html(head(link),body)"
    );
}

#[test]
fn test_text_node() {
    let tree = parse_html("<html><body>Hello World</body></html>");
    let body = find_element(&tree, NodeId::ROOT, "body").expect("body");
    assert_eq!(text_content(&tree, body), "Hello World");
    assert_eq!(tree.children(body).len(), 1);
}

#[test]
fn test_comment_before_html_belongs_to_document() {
    let tree = parse_html("<!-- c --><p>x</p>");
    let first = tree.children(NodeId::ROOT)[0];
    let node = tree.get(first).expect("comment");
    assert_eq!(node.kind, NodeKind::Comment);
    assert_eq!(node.label, " c ");
}

#[test]
fn test_p_closes_open_p() {
    assert_eq!(document_structure("<p>one<p>two"), "html(head,body(p,p))");
    assert_eq!(
        document_structure("<p>para<div>block</div>"),
        "html(head,body(p,div))"
    );
}

#[test]
fn test_list_items_close_each_other() {
    assert_eq!(
        document_structure("<ul><li>a<li>b</ul>"),
        "html(head,body(ul(li,li)))"
    );
    assert_eq!(
        document_structure("<dl><dt>a<dd>b<dt>c</dl>"),
        "html(head,body(dl(dt,dd,dt)))"
    );
}

#[test]
fn test_nested_lists_keep_their_items() {
    assert_eq!(
        document_structure("<ul><li>a<ul><li>b</ul><li>c</ul>"),
        "html(head,body(ul(li(ul(li)),li)))"
    );
}

#[test]
fn test_headings_do_not_nest() {
    assert_eq!(document_structure("<h1>a<h2>b"), "html(head,body(h1,h2))");
}

#[test]
fn test_void_elements_take_no_children() {
    let tree = parse_html("<br><img src=x>text<input/>");
    let img = find_element(&tree, NodeId::ROOT, "img").expect("img");
    assert!(tree.children(img).is_empty());
    assert_eq!(
        structure(&tree, tree.document_element().expect("html")),
        "html(head,body(br,img,input))"
    );
}

#[test]
fn test_end_tag_closes_unclosed_children() {
    let tree = parse_html("<div><span></div>after");
    let html = tree.document_element().expect("html");
    assert_eq!(structure(&tree, html), "html(head,body(div(span)))");
    let body = find_element(&tree, NodeId::ROOT, "body").expect("body");
    assert_eq!(tree.children(body).len(), 2);
}

#[test]
fn test_stray_end_tag_is_ignored_and_reported() {
    let mut tokenizer = HTMLTokenizer::new("<div></span>x</div>");
    tokenizer.run();
    let (tree, issues) = HTMLParser::new(tokenizer.into_tokens())
        .run()
        .expect("parses");

    assert_eq!(
        structure(&tree, tree.document_element().expect("html")),
        "html(head,body(div))"
    );
    assert!(
        issues
            .iter()
            .any(|issue| issue.message.contains("</span> ignored inside <div>"))
    );
}

#[test]
fn test_nested_links_are_split() {
    assert_eq!(
        document_structure("<a href=1>one<a href=2>two"),
        "html(head,body(a,a))"
    );
}

#[test]
fn test_attributes_reach_the_tree() {
    let tree = parse_html(r#"<a href="/x" class=c href="/y">"#);
    let a = find_element(&tree, NodeId::ROOT, "a").expect("a");
    let node = tree.get(a).expect("node");
    assert_eq!(node.attribute("href"), Some("/x"));
    assert_eq!(node.attributes.len(), 3);
}

#[test]
fn test_script_content_stays_text() {
    let tree = parse_html("<script>a<b</script><p>");
    let html = tree.document_element().expect("html");
    assert_eq!(structure(&tree, html), "html(head(script),body(p))");
    let script = find_element(&tree, NodeId::ROOT, "script").expect("script");
    assert_eq!(text_content(&tree, script), "a<b");
}

#[test]
fn test_unclosed_raw_text_is_closed_at_eof() {
    let tree = parse_html("<body><textarea>never closed");
    let textarea = find_element(&tree, NodeId::ROOT, "textarea").expect("textarea");
    assert_eq!(text_content(&tree, textarea), "never closed");
}

#[test]
fn test_text_after_html_end_goes_to_body() {
    let tree = parse_html("<p>a</p></body></html> tail");
    let body = find_element(&tree, NodeId::ROOT, "body").expect("body");
    assert!(text_content(&tree, body).ends_with("tail"));
}

#[test]
fn test_nesting_limit() {
    let markup = "<div>".repeat(10);
    let options = ParserOptions {
        max_depth: 5,
        ..ParserOptions::default()
    };
    let err = parse_with_options(markup.as_bytes(), &options).expect_err("too deep");
    assert_eq!(err, ParseError::NestingTooDeep { limit: 5 });

    let roomy = ParserOptions {
        max_depth: 20,
        ..ParserOptions::default()
    };
    assert!(parse_with_options(markup.as_bytes(), &roomy).is_ok());
}

#[test]
fn test_default_nesting_limit() {
    let markup = "<span>".repeat(DEFAULT_MAX_DEPTH + 10);
    assert_eq!(
        parse(markup.as_bytes()).expect_err("too deep"),
        ParseError::NestingTooDeep {
            limit: DEFAULT_MAX_DEPTH
        }
    );
}

#[test]
fn test_invalid_utf8_is_rejected_unless_lossy() {
    let bytes = b"<p>\xFFx";
    assert_eq!(
        parse(bytes).expect_err("invalid"),
        ParseError::InvalidUtf8 { valid_up_to: 3 }
    );

    let lossy = ParserOptions {
        lossy_utf8: true,
        ..ParserOptions::default()
    };
    let doc = parse_with_options(bytes, &lossy).expect("lossy parse");
    let p = find_element(&doc.tree, NodeId::ROOT, "p").expect("p");
    assert_eq!(text_content(&doc.tree, p), "\u{FFFD}x");
}

#[test]
fn test_byte_order_mark_is_skipped() {
    let doc = parse(b"\xEF\xBB\xBF<p>x").expect("parses");
    assert_eq!(doc.tree.children(NodeId::ROOT).len(), 1);

    assert_eq!(
        parse(b"\xEF\xBB\xBF<p>\xFF").expect_err("invalid"),
        ParseError::InvalidUtf8 { valid_up_to: 6 }
    );
}

#[test]
fn test_well_formed_document_has_no_issues() {
    let doc = parse(b"<!DOCTYPE html><html><head><title>t</title></head><body><p>x</p></body></html>")
        .expect("parses");
    assert!(doc.issues.is_empty(), "{:?}", doc.issues);
}

/// Markup fragments that exercise the tricky paths of both stages.
const FRAGMENTS: &[&str] = &[
    "<div>", "</div>", "<p>", "</p>", "<li>", "</li>", "<ul>", "</ul>", "<a href=x>", "</a>",
    "<br/>", "<script>", "</script>", "<title>", "</title>", "<!--", "-->", "<!DOCTYPE html>",
    "</body>", "</html>", "<head>", "<body>", "&amp", "&#x41;", "text", " ", "<", "\"", "=",
    "<h1>", "</h3>", "<table>", "<td>", "</span>",
];

#[quickcheck]
fn prop_any_markup_builds_html_with_head_and_body(choices: Vec<u8>) -> bool {
    let markup: String = choices
        .iter()
        .map(|&c| FRAGMENTS[usize::from(c) % FRAGMENTS.len()])
        .collect();
    let Ok(doc) = parse(markup.as_bytes()) else {
        return false;
    };
    let Some(html) = doc.tree.document_element() else {
        return false;
    };
    let sections: Vec<&str> = doc
        .tree
        .children(html)
        .iter()
        .filter_map(|&id| doc.tree.as_element(id))
        .map(|n| n.label.as_str())
        .collect();
    sections == ["head", "body"] && doc.tree.depth() <= DEFAULT_MAX_DEPTH + 2
}
