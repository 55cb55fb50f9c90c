use strum_macros::Display;

use treez_common::warning::warn_once;
use treez_dom::{Attribute, DomTree, Node, NodeId, NodeKind};

use crate::tokenizer::Token;
use crate::{ParseError, ParseIssue};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// "The insertion mode is a state variable that controls the primary operation
/// of the tree construction stage."
///
/// Table, select, template and frameset content is built with the "in body"
/// rules, so those modes do not exist here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InsertionMode {
    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    Initial,
    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    BeforeHtml,
    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    BeforeHead,
    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    InHead,
    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    AfterHead,
    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    InBody,
    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    Text,
    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    AfterBody,
    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    AfterAfterBody,
}

/// [§ 13.1.2 Void elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "hr", "img", "input", "keygen",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Start tags in "in body" that close an open `p` in button scope before
/// being inserted.
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "details", "dialog", "dir", "div",
    "dl", "fieldset", "figcaption", "figure", "footer", "header", "hgroup", "main", "menu", "nav",
    "ol", "p", "search", "section", "summary", "ul", "pre", "listing", "form", "table", "plaintext",
];

/// End tags in "in body" that pop up to their element when it is in scope.
const BLOCK_END_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "button", "center", "details", "dialog", "dir",
    "div", "dl", "fieldset", "figcaption", "figure", "footer", "form", "header", "hgroup",
    "listing", "main", "menu", "nav", "ol", "pre", "search", "section", "summary", "ul",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Start tags that "in body" hands to the "in head" rules.
const HEAD_CONTENT: &[&str] = &[
    "base", "basefont", "bgsound", "link", "meta", "noframes", "script", "style", "title",
];

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
///
/// The HTML parser builds a DOM tree from a stream of tokens.
pub struct HTMLParser {
    /// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
    insertion_mode: InsertionMode,

    /// [§ 13.2.4.2 The original insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#original-insertion-mode)
    original_insertion_mode: Option<InsertionMode>,

    /// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    ///
    /// Stores `NodeId`s into the arena.
    stack_of_open_elements: Vec<NodeId>,

    /// [§ 13.2.4.4 The element pointers](https://html.spec.whatwg.org/multipage/parsing.html#the-element-pointers)
    head_element_pointer: Option<NodeId>,

    /// DOM tree with parent/sibling pointers.
    /// `NodeId::ROOT` (index 0) is the Document node.
    tree: DomTree,

    /// Input tokens from the tokenizer.
    tokens: Vec<Token>,

    /// Current position in token stream.
    token_index: usize,

    /// Whether we've stopped parsing.
    stopped: bool,

    /// Parse issues encountered while building the tree.
    issues: Vec<ParseIssue>,

    /// Upper bound on the stack of open elements.
    max_depth: usize,

    /// Set when parsing had to be abandoned.
    failure: Option<ParseError>,
}

impl HTMLParser {
    /// Create a new parser from a token stream.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            insertion_mode: InsertionMode::Initial,
            original_insertion_mode: None,
            stack_of_open_elements: Vec::new(),
            head_element_pointer: None,
            tree: DomTree::new(),
            tokens,
            token_index: 0,
            stopped: false,
            issues: Vec::new(),
            max_depth: crate::DEFAULT_MAX_DEPTH,
            failure: None,
        }
    }

    /// Limit how deeply elements may nest before parsing fails with
    /// [`ParseError::NestingTooDeep`].
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Run the parser and return the DOM tree and any parse issues.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NestingTooDeep`] if elements nest deeper than the
    /// configured limit.
    pub fn run(mut self) -> Result<(DomTree, Vec<ParseIssue>), ParseError> {
        let tokens = std::mem::take(&mut self.tokens);
        for (index, token) in tokens.iter().enumerate() {
            if self.stopped {
                break;
            }
            self.token_index = index;
            self.process_token(token);
        }
        match self.failure {
            Some(error) => Err(error),
            None => Ok((self.tree, self.issues)),
        }
    }

    /// Record a parse error. Parsing continues.
    fn parse_error(&mut self, message: &str) {
        let _ = warn_once("HTML Parser", message);
        self.issues.push(ParseIssue::new(
            "HTML Parser",
            format!("{message} (token {})", self.token_index),
        ));
    }

    /// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction-dispatcher)
    fn process_token(&mut self, token: &Token) {
        if self.stopped {
            return;
        }
        match self.insertion_mode {
            InsertionMode::Initial => self.handle_initial_mode(token),
            InsertionMode::BeforeHtml => self.handle_before_html_mode(token),
            InsertionMode::BeforeHead => self.handle_before_head_mode(token),
            InsertionMode::InHead => self.handle_in_head_mode(token),
            InsertionMode::AfterHead => self.handle_after_head_mode(token),
            InsertionMode::InBody => self.handle_in_body_mode(token),
            InsertionMode::Text => self.handle_text_mode(token),
            InsertionMode::AfterBody => self.handle_after_body_mode(token),
            InsertionMode::AfterAfterBody => self.handle_after_after_body_mode(token),
        }
    }

    /// "Reprocess the token" - process the same token again in a new insertion mode.
    fn reprocess_token(&mut self, token: &Token) {
        self.process_token(token);
    }

    /// [§ 12.1.4 ASCII whitespace](https://infra.spec.whatwg.org/#ascii-whitespace)
    const fn is_whitespace(c: char) -> bool {
        matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ')
    }

    /// Split character data into its leading whitespace and the rest.
    ///
    /// Several modes treat "a character token that is whitespace" differently
    /// from "anything else"; with coalesced text the two halves are handled
    /// in turn.
    fn split_leading_whitespace(data: &str) -> (&str, &str) {
        let split = data
            .find(|c: char| !Self::is_whitespace(c))
            .unwrap_or(data.len());
        data.split_at(split)
    }

    /// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#current-node)
    ///
    /// "The current node is the bottommost node in this stack of open elements."
    fn current_node(&self) -> Option<NodeId> {
        self.stack_of_open_elements.last().copied()
    }

    /// Get the tag name of a node (local name of the element).
    fn get_tag_name(&self, id: NodeId) -> Option<&str> {
        self.tree.as_element(id).map(|node| node.label.as_str())
    }

    fn current_tag_name(&self) -> Option<&str> {
        self.current_node().and_then(|id| self.get_tag_name(id))
    }

    /// [§ 13.2.6.1 Insert a character](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-character)
    ///
    /// "If there is a Text node immediately before the adjusted insertion
    /// location, then append data to that Text node's data."
    fn insert_text(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        let parent = self.current_node().unwrap_or(NodeId::ROOT);
        if let Some(existing) = self.tree.last_text_child_mut(parent) {
            existing.push_str(data);
            return;
        }
        let text = self.tree.alloc(Node::new(NodeKind::Text, data));
        self.tree.append_child(parent, text);
    }

    /// [§ 13.2.6.1 Insert a comment](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-comment)
    fn insert_comment(&mut self, data: &str) {
        let parent = self.current_node().unwrap_or(NodeId::ROOT);
        self.insert_comment_into(parent, data);
    }

    fn insert_comment_into(&mut self, parent: NodeId, data: &str) {
        let comment = self.tree.alloc(Node::new(NodeKind::Comment, data));
        self.tree.append_child(parent, comment);
    }

    /// [§ 13.2.6.1 Insert an HTML element](https://html.spec.whatwg.org/multipage/parsing.html#insert-an-html-element)
    ///
    /// Creates the element, appends it to the current node and pushes it onto
    /// the stack of open elements. Returns `None` and stops parsing once the
    /// stack would exceed the nesting limit.
    fn insert_html_element(&mut self, name: &str, attributes: &[Attribute]) -> Option<NodeId> {
        if self.stack_of_open_elements.len() >= self.max_depth {
            self.failure = Some(ParseError::NestingTooDeep {
                limit: self.max_depth,
            });
            self.stopped = true;
            return None;
        }
        let parent = self.current_node().unwrap_or(NodeId::ROOT);
        let element = self.tree.alloc(Node::element(name, attributes.to_vec()));
        self.tree.append_child(parent, element);
        self.stack_of_open_elements.push(element);
        Some(element)
    }

    /// Insert an element for a start tag token.
    fn insert_for_token(&mut self, token: &Token) -> Option<NodeId> {
        match token {
            Token::StartTag {
                name, attributes, ..
            } => self.insert_html_element(name, attributes),
            _ => None,
        }
    }

    /// Insert an element and immediately pop it: void elements never hold
    /// children.
    ///
    /// "Acknowledge the token's self-closing flag, if it is set."
    fn insert_void_element(&mut self, name: &str, attributes: &[Attribute]) {
        if self.insert_html_element(name, attributes).is_some() {
            let _ = self.stack_of_open_elements.pop();
        }
    }

    /// [§ 13.2.6.2 The generic raw text element parsing algorithm](https://html.spec.whatwg.org/multipage/parsing.html#generic-raw-text-element-parsing-algorithm)
    ///
    /// "Insert an HTML element for the token. Let the original insertion mode
    /// be the current insertion mode. Then, switch the insertion mode to "text"."
    ///
    /// The tokenizer has already switched itself to RAWTEXT or RCDATA.
    fn insert_raw_text_element(&mut self, token: &Token) {
        if self.insert_for_token(token).is_some() {
            self.original_insertion_mode = Some(self.insertion_mode);
            self.insertion_mode = InsertionMode::Text;
        }
    }

    /// Pop elements from the stack of open elements until we find one
    /// with the given tag name (inclusive).
    fn pop_until_tag(&mut self, tag_name: &str) {
        self.pop_until_one_of(&[tag_name]);
    }

    /// Pop elements until one of the given tag names has been popped.
    fn pop_until_one_of(&mut self, tag_names: &[&str]) {
        while let Some(id) = self.stack_of_open_elements.pop() {
            if self
                .get_tag_name(id)
                .is_some_and(|name| tag_names.contains(&name))
            {
                break;
            }
        }
    }

    /// [§ 13.2.4.2 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-scope)
    ///
    /// "The stack of open elements is said to have an element target node in a
    /// specific scope consisting of a list of element types list when the
    /// following algorithm terminates in a match state"
    fn has_element_in_specific_scope(&self, tag_names: &[&str], scope_markers: &[&str]) -> bool {
        for &node_id in self.stack_of_open_elements.iter().rev() {
            if let Some(node_tag) = self.get_tag_name(node_id) {
                if tag_names.contains(&node_tag) {
                    return true;
                }
                if scope_markers.contains(&node_tag) {
                    return false;
                }
            }
        }
        false
    }

    /// "has an element in scope" (default scope).
    fn has_element_in_scope(&self, tag_name: &str) -> bool {
        self.has_one_of_in_scope(&[tag_name])
    }

    fn has_one_of_in_scope(&self, tag_names: &[&str]) -> bool {
        const DEFAULT_SCOPE: &[&str] = &[
            "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
        ];
        self.has_element_in_specific_scope(tag_names, DEFAULT_SCOPE)
    }

    /// "has an element in button scope" — default scope markers plus button.
    fn has_element_in_button_scope(&self, tag_name: &str) -> bool {
        const BUTTON_SCOPE: &[&str] = &[
            "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
            "button",
        ];
        self.has_element_in_specific_scope(&[tag_name], BUTTON_SCOPE)
    }

    /// "has an element in list item scope" — default scope markers plus ol, ul.
    fn has_element_in_list_item_scope(&self, tag_name: &str) -> bool {
        const LIST_ITEM_SCOPE: &[&str] = &[
            "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
            "ol", "ul",
        ];
        self.has_element_in_specific_scope(&[tag_name], LIST_ITEM_SCOPE)
    }

    /// [§ 13.2.6.2 Generate implied end tags](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
    ///
    /// "If a step requires the user agent to generate implied end tags but lists
    /// an element to exclude from the process, then the user agent must perform
    /// the above steps as if that element was not in the above list."
    fn generate_implied_end_tags_excluding(&mut self, exclude: Option<&str>) {
        const IMPLIED_END_TAG_ELEMENTS: &[&str] = &[
            "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc",
        ];

        while let Some(tag) = self.current_tag_name() {
            if !IMPLIED_END_TAG_ELEMENTS.contains(&tag) || exclude == Some(tag) {
                break;
            }
            let _ = self.stack_of_open_elements.pop();
        }
    }

    fn generate_implied_end_tags(&mut self) {
        self.generate_implied_end_tags_excluding(None);
    }

    /// [§ 13.2.6.4.7 Close a p element](https://html.spec.whatwg.org/multipage/parsing.html#close-a-p-element)
    ///
    /// "Generate implied end tags, except for p elements. If the current node is
    /// not a p element, then this is a parse error. Pop elements from the stack
    /// of open elements until a p element has been popped from the stack."
    fn close_p_element(&mut self) {
        self.generate_implied_end_tags_excluding(Some("p"));
        if self.current_tag_name() != Some("p") {
            self.parse_error("unclosed elements inside <p>");
        }
        self.pop_until_tag("p");
    }

    /// "If the stack of open elements has a p element in button scope, then
    /// close a p element."
    fn close_p_if_in_button_scope(&mut self) {
        if self.has_element_in_button_scope("p") {
            self.close_p_element();
        }
    }

    /// [§ 13.1.1 Special](https://html.spec.whatwg.org/multipage/parsing.html#special)
    ///
    /// "The following elements have varying levels of special parsing rules"
    fn is_special_element(tag_name: &str) -> bool {
        matches!(
            tag_name,
            "address"
                | "applet"
                | "area"
                | "article"
                | "aside"
                | "base"
                | "basefont"
                | "bgsound"
                | "blockquote"
                | "body"
                | "br"
                | "button"
                | "caption"
                | "center"
                | "col"
                | "colgroup"
                | "dd"
                | "details"
                | "dir"
                | "div"
                | "dl"
                | "dt"
                | "embed"
                | "fieldset"
                | "figcaption"
                | "figure"
                | "footer"
                | "form"
                | "frame"
                | "frameset"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "head"
                | "header"
                | "hgroup"
                | "hr"
                | "html"
                | "iframe"
                | "img"
                | "input"
                | "keygen"
                | "li"
                | "link"
                | "listing"
                | "main"
                | "marquee"
                | "menu"
                | "meta"
                | "nav"
                | "noembed"
                | "noframes"
                | "noscript"
                | "object"
                | "ol"
                | "p"
                | "param"
                | "plaintext"
                | "pre"
                | "script"
                | "search"
                | "section"
                | "select"
                | "source"
                | "style"
                | "summary"
                | "table"
                | "tbody"
                | "td"
                | "template"
                | "textarea"
                | "tfoot"
                | "th"
                | "thead"
                | "title"
                | "tr"
                | "track"
                | "ul"
                | "wbr"
                | "xmp"
        )
    }

    /// [§ 13.2.6.4.7 "Any other end tag"](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    ///
    /// 1. "Initialize node to be the current node (the bottommost node of the stack)."
    /// 2. "Loop: If node is an HTML element with the same tag name as the token, then:"
    ///    a. "Generate implied end tags, except for HTML elements with the same tag name
    ///    as the token."
    ///    b. "If node is not the current node, then this is a parse error."
    ///    c. "Pop all the nodes from the current node up to node, including node, then stop
    ///    these steps."
    /// 3. "Otherwise, if node is in the special category, then this is a parse error;
    ///    ignore the token, and return."
    /// 4. "Set node to the previous entry in the stack of open elements and return to
    ///    the step labeled loop."
    fn any_other_end_tag(&mut self, tag_name: &str) {
        let mut i = self.stack_of_open_elements.len();
        while i > 0 {
            i -= 1;
            let node_id = self.stack_of_open_elements[i];
            let Some(node_tag) = self.get_tag_name(node_id) else {
                continue;
            };
            if node_tag == tag_name {
                self.generate_implied_end_tags_excluding(Some(tag_name));
                if self.current_node() != Some(node_id) {
                    self.parse_error(&format!("end tag </{tag_name}> closes unclosed children"));
                }
                self.stack_of_open_elements.truncate(i);
                return;
            }
            if Self::is_special_element(node_tag) {
                let message = format!("end tag </{tag_name}> ignored inside <{node_tag}>");
                self.parse_error(&message);
                return;
            }
        }
    }

    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    fn handle_initial_mode(&mut self, token: &Token) {
        match token {
            // "A character token that is one of U+0009 CHARACTER TABULATION, U+000A LINE FEED (LF),
            // U+000C FORM FEED (FF), U+000D CARRIAGE RETURN (CR), or U+0020 SPACE"
            // "Ignore the token."
            Token::Text { data } => {
                let (_, rest) = Self::split_leading_whitespace(data);
                if !rest.is_empty() {
                    self.insertion_mode = InsertionMode::BeforeHtml;
                    self.reprocess_token(&Token::text(rest));
                }
            }

            // "A comment token"
            // "Insert a comment as the last child of the Document object."
            Token::Comment { data } => self.insert_comment_into(NodeId::ROOT, data),

            // "A DOCTYPE token"
            // "Append a DocumentType node to the Document node, with its name set to
            // the name given in the DOCTYPE token, or the empty string if the name
            // was missing. Then, switch the insertion mode to "before html"."
            Token::Doctype { name } => {
                let label = name.clone().unwrap_or_default();
                let doctype = self.tree.alloc(Node::new(NodeKind::Doctype, label));
                self.tree.append_child(NodeId::ROOT, doctype);
                self.insertion_mode = InsertionMode::BeforeHtml;
            }

            // "Anything else"
            // "Switch the insertion mode to "before html", then reprocess the token."
            _ => {
                self.insertion_mode = InsertionMode::BeforeHtml;
                self.reprocess_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    fn handle_before_html_mode(&mut self, token: &Token) {
        match token {
            // "A DOCTYPE token"
            // "Parse error. Ignore the token."
            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),

            // "A comment token"
            // "Insert a comment as the last child of the Document object."
            Token::Comment { data } => self.insert_comment_into(NodeId::ROOT, data),

            Token::Text { data } => {
                let (_, rest) = Self::split_leading_whitespace(data);
                if !rest.is_empty() {
                    self.handle_before_html_anything_else(&Token::text(rest));
                }
            }

            // "A start tag whose tag name is "html""
            // "Create an element for the token in the HTML namespace, with the
            // Document as the intended parent. Append it to the Document object.
            // Put this element in the stack of open elements."
            Token::StartTag { name, .. } if name == "html" => {
                if self.insert_for_token(token).is_some() {
                    self.insertion_mode = InsertionMode::BeforeHead;
                }
            }

            // "An end tag whose tag name is one of: "head", "body", "html", "br""
            // "Act as described in the "anything else" entry below."
            Token::EndTag { name } if matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.handle_before_html_anything_else(token);
            }

            // "Any other end tag"
            // "Parse error. Ignore the token."
            Token::EndTag { name } => {
                self.parse_error(&format!("unexpected end tag </{name}> before <html>"));
            }

            _ => self.handle_before_html_anything_else(token),
        }
    }

    /// "Anything else":
    /// "Create an html element whose node document is the Document object.
    /// Append it to the Document object. Put this element in the stack of
    /// open elements. Switch the insertion mode to "before head", then
    /// reprocess the token."
    fn handle_before_html_anything_else(&mut self, token: &Token) {
        if self.insert_html_element("html", &[]).is_some() {
            self.insertion_mode = InsertionMode::BeforeHead;
            self.reprocess_token(token);
        }
    }

    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    fn handle_before_head_mode(&mut self, token: &Token) {
        match token {
            Token::Text { data } => {
                let (_, rest) = Self::split_leading_whitespace(data);
                if !rest.is_empty() {
                    self.handle_before_head_anything_else(&Token::text(rest));
                }
            }

            Token::Comment { data } => self.insert_comment(data),

            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),

            // "A start tag whose tag name is "html""
            // "Process the token using the rules for the "in body" insertion mode."
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),

            // "A start tag whose tag name is "head""
            // "Insert an HTML element for the token."
            // "Set the head element pointer to the newly created head element."
            // "Switch the insertion mode to "in head"."
            Token::StartTag { name, .. } if name == "head" => {
                if let Some(head) = self.insert_for_token(token) {
                    self.head_element_pointer = Some(head);
                    self.insertion_mode = InsertionMode::InHead;
                }
            }

            Token::EndTag { name } if matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.handle_before_head_anything_else(token);
            }

            Token::EndTag { name } => {
                self.parse_error(&format!("unexpected end tag </{name}> before <head>"));
            }

            _ => self.handle_before_head_anything_else(token),
        }
    }

    /// "Anything else":
    /// "Insert an HTML element for a "head" start tag token with no attributes.
    /// Set the head element pointer to the newly created head element.
    /// Switch the insertion mode to "in head". Reprocess the current token."
    fn handle_before_head_anything_else(&mut self, token: &Token) {
        if let Some(head) = self.insert_html_element("head", &[]) {
            self.head_element_pointer = Some(head);
            self.insertion_mode = InsertionMode::InHead;
            self.reprocess_token(token);
        }
    }

    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    fn handle_in_head_mode(&mut self, token: &Token) {
        match token {
            // "A character token that is one of U+0009 CHARACTER TABULATION, ..."
            // "Insert the character."
            Token::Text { data } => {
                let (whitespace, rest) = Self::split_leading_whitespace(data);
                self.insert_text(whitespace);
                if !rest.is_empty() {
                    self.handle_in_head_anything_else(&Token::text(rest));
                }
            }

            Token::Comment { data } => self.insert_comment(data),

            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),

            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),

            // "A start tag whose tag name is one of: "base", "basefont", "bgsound", "link""
            // "Insert an HTML element for the token. Immediately pop the current node off the
            // stack of open elements."
            Token::StartTag {
                name, attributes, ..
            } if matches!(
                name.as_str(),
                "base" | "basefont" | "bgsound" | "link" | "meta"
            ) =>
            {
                self.insert_void_element(name, attributes);
            }

            // "A start tag whose tag name is "title""
            // "Follow the generic RCDATA element parsing algorithm."
            //
            // "A start tag whose tag name is one of: "noscript", "noframes", "style""
            // "Follow the generic raw text element parsing algorithm."
            //
            // "A start tag whose tag name is "script"" follows the same steps once
            // script execution is out of the picture.
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "title" | "noscript" | "noframes" | "style" | "script"
                ) =>
            {
                self.insert_raw_text_element(token);
            }

            // "A start tag whose tag name is "head""
            // "Parse error. Ignore the token."
            Token::StartTag { name, .. } if name == "head" => {
                self.parse_error("unexpected <head> inside <head>");
            }

            // "An end tag whose tag name is "head""
            // "Pop the current node (which will be the head element) off the stack of open elements."
            // "Switch the insertion mode to "after head"."
            Token::EndTag { name } if name == "head" => {
                let _ = self.stack_of_open_elements.pop();
                self.insertion_mode = InsertionMode::AfterHead;
            }

            Token::EndTag { name } if matches!(name.as_str(), "body" | "html" | "br") => {
                self.handle_in_head_anything_else(token);
            }

            Token::EndTag { name } => {
                self.parse_error(&format!("unexpected end tag </{name}> in <head>"));
            }

            _ => self.handle_in_head_anything_else(token),
        }
    }

    /// "Anything else":
    /// "Pop the current node (which will be the head element) off the stack of open elements."
    /// "Switch the insertion mode to "after head"."
    /// "Reprocess the token."
    fn handle_in_head_anything_else(&mut self, token: &Token) {
        let _ = self.stack_of_open_elements.pop();
        self.insertion_mode = InsertionMode::AfterHead;
        self.reprocess_token(token);
    }

    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    fn handle_after_head_mode(&mut self, token: &Token) {
        match token {
            Token::Text { data } => {
                let (whitespace, rest) = Self::split_leading_whitespace(data);
                self.insert_text(whitespace);
                if !rest.is_empty() {
                    self.handle_after_head_anything_else(&Token::text(rest));
                }
            }

            Token::Comment { data } => self.insert_comment(data),

            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),

            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),

            // "A start tag whose tag name is "body""
            // "Insert an HTML element for the token."
            // "Switch the insertion mode to "in body"."
            Token::StartTag { name, .. } if name == "body" => {
                if self.insert_for_token(token).is_some() {
                    self.insertion_mode = InsertionMode::InBody;
                }
            }

            // "A start tag whose tag name is one of: "base", "basefont", "bgsound",
            // "link", "meta", "noframes", "script", "style", "template", "title""
            // "Parse error."
            // "Push the node pointed to by the head element pointer onto the stack of open elements."
            // "Process the token using the rules for the "in head" insertion mode."
            // "Remove the node pointed to by the head element pointer from the stack of open elements."
            Token::StartTag { name, .. } if HEAD_CONTENT.contains(&name.as_str()) => {
                self.parse_error(&format!("<{name}> after </head>"));
                let Some(head) = self.head_element_pointer else {
                    return;
                };
                self.stack_of_open_elements.push(head);
                self.handle_in_head_mode(token);
                if let Some(pos) = self.stack_of_open_elements.iter().rposition(|&id| id == head) {
                    let _ = self.stack_of_open_elements.remove(pos);
                }
            }

            Token::StartTag { name, .. } if name == "head" => {
                self.parse_error("unexpected <head> after </head>");
            }

            Token::EndTag { name } if matches!(name.as_str(), "body" | "html" | "br") => {
                self.handle_after_head_anything_else(token);
            }

            Token::EndTag { name } => {
                self.parse_error(&format!("unexpected end tag </{name}> after </head>"));
            }

            _ => self.handle_after_head_anything_else(token),
        }
    }

    /// "Anything else":
    /// "Insert an HTML element for a "body" start tag token with no attributes."
    /// "Switch the insertion mode to "in body"."
    /// "Reprocess the current token."
    fn handle_after_head_anything_else(&mut self, token: &Token) {
        if self.insert_html_element("body", &[]).is_some() {
            self.insertion_mode = InsertionMode::InBody;
            self.reprocess_token(token);
        }
    }

    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    fn handle_in_body_mode(&mut self, token: &Token) {
        match token {
            // "A character token that is U+0000 NULL"
            // "Parse error. Ignore the token."
            //
            // "Any other character token"
            // "Insert the character."
            Token::Text { data } => {
                if data.contains('\0') {
                    self.parse_error("unexpected NULL character");
                    let filtered: String = data.chars().filter(|&c| c != '\0').collect();
                    self.insert_text(&filtered);
                } else {
                    self.insert_text(data);
                }
            }

            Token::Comment { data } => self.insert_comment(data),

            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),

            // "A start tag whose tag name is "html""
            // "Parse error."
            Token::StartTag { name, .. } if name == "html" => {
                self.parse_error("unexpected <html> inside the document");
            }

            // "A start tag whose tag name is one of: "base", "basefont", "bgsound",
            // "link", "meta", "noframes", "script", "style", "template", "title""
            // "Process the token using the rules for the "in head" insertion mode."
            Token::StartTag { name, .. } if HEAD_CONTENT.contains(&name.as_str()) => {
                self.handle_in_head_mode(token);
            }

            // "A start tag whose tag name is "body""
            // "Parse error."
            Token::StartTag { name, .. } if name == "body" => {
                self.parse_error("unexpected <body> inside <body>");
            }

            // "A start tag whose tag name is "head""
            // "Parse error. Ignore the token."
            Token::StartTag { name, .. } if name == "head" => {
                self.parse_error("unexpected <head> inside <body>");
            }

            // "An end tag whose tag name is "body""
            // "If the stack of open elements does not have a body element in scope,
            // this is a parse error; ignore the token."
            // "Switch the insertion mode to "after body"."
            Token::EndTag { name } if name == "body" => {
                if self.has_element_in_scope("body") {
                    self.insertion_mode = InsertionMode::AfterBody;
                } else {
                    self.parse_error("</body> without an open <body>");
                }
            }

            // "An end tag whose tag name is "html""
            // "Switch the insertion mode to "after body". Reprocess the token."
            Token::EndTag { name } if name == "html" => {
                if self.has_element_in_scope("body") {
                    self.insertion_mode = InsertionMode::AfterBody;
                    self.reprocess_token(token);
                } else {
                    self.parse_error("</html> without an open <body>");
                }
            }

            // "A start tag whose tag name is one of: "h1", "h2", "h3", "h4", "h5", "h6""
            // "If the stack of open elements has a p element in button scope, then close a p element."
            // "If the current node is an HTML element whose tag name is one of "h1", "h2",
            // "h3", "h4", "h5", or "h6", then this is a parse error; pop the current node
            // off the stack of open elements."
            // "Insert an HTML element for the token."
            Token::StartTag { name, .. } if HEADINGS.contains(&name.as_str()) => {
                self.close_p_if_in_button_scope();
                if self
                    .current_tag_name()
                    .is_some_and(|tag| HEADINGS.contains(&tag))
                {
                    self.parse_error(&format!("<{name}> nested in a heading"));
                    let _ = self.stack_of_open_elements.pop();
                }
                let _ = self.insert_for_token(token);
            }

            // "A start tag whose tag name is "li""
            Token::StartTag { name, .. } if name == "li" => {
                self.close_list_item(&["li"]);
                self.close_p_if_in_button_scope();
                let _ = self.insert_for_token(token);
            }

            // "A start tag whose tag name is one of: "dd", "dt""
            Token::StartTag { name, .. } if matches!(name.as_str(), "dd" | "dt") => {
                self.close_list_item(&["dd", "dt"]);
                self.close_p_if_in_button_scope();
                let _ = self.insert_for_token(token);
            }

            // "A start tag whose tag name is "hr""
            // "If the stack of open elements has a p element in button scope, then close a p element."
            // "Insert an HTML element for the token. Immediately pop the current node off the
            // stack of open elements."
            Token::StartTag {
                name, attributes, ..
            } if name == "hr" => {
                self.close_p_if_in_button_scope();
                self.insert_void_element(name, attributes);
            }

            // "A start tag whose tag name is "xmp""
            // "If the stack of open elements has a p element in button scope, then close a p element."
            // "Follow the generic raw text element parsing algorithm."
            Token::StartTag { name, .. } if name == "xmp" => {
                self.close_p_if_in_button_scope();
                self.insert_raw_text_element(token);
            }

            // "A start tag whose tag name is one of: "textarea", "iframe", "noembed",
            // "noscript"" all switch the tokenizer out of the data state.
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "textarea" | "iframe" | "noembed" | "noscript"
                ) =>
            {
                self.insert_raw_text_element(token);
            }

            Token::StartTag { name, .. } if CLOSES_P.contains(&name.as_str()) => {
                self.close_p_if_in_button_scope();
                let _ = self.insert_for_token(token);
            }

            // "A start tag whose tag name is "button""
            // "If the stack of open elements has a button element in scope, then run these
            // substeps: Parse error. Generate implied end tags. Pop elements from the stack
            // of open elements until a button element has been popped from the stack."
            Token::StartTag { name, .. } if name == "button" => {
                if self.has_element_in_scope("button") {
                    self.parse_error("<button> nested in a button");
                    self.generate_implied_end_tags();
                    self.pop_until_tag("button");
                }
                let _ = self.insert_for_token(token);
            }

            // "A start tag whose tag name is "a""
            // "If the list of active formatting elements contains an a element ...
            // then this is a parse error; run the adoption agency algorithm for the
            // token."
            //
            // Without the formatting list, an open `a` is closed like an end tag.
            Token::StartTag { name, .. } if name == "a" => {
                if self.has_element_in_scope("a") {
                    self.parse_error("<a> nested in a link");
                    self.any_other_end_tag("a");
                }
                let _ = self.insert_for_token(token);
            }

            // "A start tag whose tag name is "image""
            // "Parse error. Change the token's tag name to "img" and reprocess it."
            Token::StartTag { name, attributes, .. } if name == "image" => {
                self.parse_error("<image> treated as <img>");
                self.insert_void_element("img", attributes);
            }

            // "A start tag whose tag name is one of: "area", "br", "embed", "img",
            // "keygen", "wbr"" and "input", "param", "source", "track":
            // "Insert an HTML element for the token. Immediately pop the current node
            // off the stack of open elements."
            Token::StartTag {
                name, attributes, ..
            } if VOID_ELEMENTS.contains(&name.as_str()) => {
                self.insert_void_element(name, attributes);
            }

            // "Any other start tag"
            // "Insert an HTML element for the token."
            Token::StartTag {
                name, self_closing, ..
            } => {
                if *self_closing {
                    self.parse_error(&format!("self-closing syntax on non-void <{name}>"));
                }
                let _ = self.insert_for_token(token);
            }

            // "An end tag whose tag name is one of: "address", "article", ..."
            // "If the stack of open elements does not have an element in scope that is an
            // HTML element with the same tag name as that of the token, then this is a
            // parse error; ignore the token."
            // "Otherwise: Generate implied end tags. If the current node is not an HTML
            // element with the same tag name as that of the token, then this is a parse
            // error. Pop elements from the stack of open elements until an HTML element
            // with the same tag name as the token has been popped from the stack."
            Token::EndTag { name } if BLOCK_END_TAGS.contains(&name.as_str()) => {
                self.close_in_scope(&[name.as_str()], name);
            }

            // "An end tag whose tag name is "p""
            // "If the stack of open elements does not have a p element in button scope,
            // then this is a parse error; insert an HTML element for a "p" start tag token
            // with no attributes."
            // "Close a p element."
            Token::EndTag { name } if name == "p" => {
                if !self.has_element_in_button_scope("p") {
                    self.parse_error("</p> without an open <p>");
                    if self.insert_html_element("p", &[]).is_none() {
                        return;
                    }
                }
                self.close_p_element();
            }

            // "An end tag whose tag name is "li""
            // "If the stack of open elements does not have an li element in list item
            // scope, then this is a parse error; ignore the token."
            Token::EndTag { name } if name == "li" => {
                if self.has_element_in_list_item_scope("li") {
                    self.generate_implied_end_tags_excluding(Some("li"));
                    if self.current_tag_name() != Some("li") {
                        self.parse_error("</li> closes unclosed children");
                    }
                    self.pop_until_tag("li");
                } else {
                    self.parse_error("</li> without an open <li>");
                }
            }

            // "An end tag whose tag name is one of: "dd", "dt""
            Token::EndTag { name } if matches!(name.as_str(), "dd" | "dt") => {
                if self.has_element_in_scope(name) {
                    self.generate_implied_end_tags_excluding(Some(name.as_str()));
                    if self.current_tag_name() != Some(name.as_str()) {
                        self.parse_error(&format!("</{name}> closes unclosed children"));
                    }
                    self.pop_until_tag(name);
                } else {
                    self.parse_error(&format!("</{name}> without an open <{name}>"));
                }
            }

            // "An end tag whose tag name is one of: "h1", "h2", "h3", "h4", "h5", "h6""
            Token::EndTag { name } if HEADINGS.contains(&name.as_str()) => {
                self.close_in_scope(HEADINGS, name);
            }

            // "An end tag whose tag name is "br""
            // "Parse error. Drop the attributes from the token, and act as described in
            // the next entry; i.e. act as if this was a "br" start tag token with no
            // attributes, rather than the end tag token that it actually is."
            Token::EndTag { name } if name == "br" => {
                self.parse_error("</br> treated as <br>");
                self.insert_void_element("br", &[]);
            }

            Token::EndTag { name } => self.any_other_end_tag(name),

            // "An end-of-file token"
            // "Stop parsing."
            Token::EndOfFile => self.stopped = true,
        }
    }

    /// The "li" and "dd"/"dt" start tag steps: walk down the stack closing the
    /// nearest open item of the same family, stopping at special elements
    /// other than address, div and p.
    fn close_list_item(&mut self, family: &[&str]) {
        for i in (0..self.stack_of_open_elements.len()).rev() {
            let Some(tag) = self.get_tag_name(self.stack_of_open_elements[i]) else {
                continue;
            };
            if family.contains(&tag) {
                let tag = tag.to_string();
                self.generate_implied_end_tags_excluding(Some(tag.as_str()));
                if self.current_tag_name() != Some(tag.as_str()) {
                    self.parse_error(&format!("<{tag}> closes unclosed children"));
                }
                self.pop_until_tag(&tag);
                return;
            }
            if Self::is_special_element(tag) && !matches!(tag, "address" | "div" | "p") {
                return;
            }
        }
    }

    /// Close the nearest element named in `targets` if one is in scope;
    /// otherwise record a parse error and ignore the end tag.
    fn close_in_scope(&mut self, targets: &[&str], end_tag: &str) {
        if !self.has_one_of_in_scope(targets) {
            self.parse_error(&format!("</{end_tag}> without a matching open element"));
            return;
        }
        self.generate_implied_end_tags();
        if self.current_tag_name() != Some(end_tag) {
            self.parse_error(&format!("</{end_tag}> closes unclosed children"));
        }
        self.pop_until_one_of(targets);
    }

    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    fn handle_text_mode(&mut self, token: &Token) {
        match token {
            // "A character token"
            // "Insert the character."
            Token::Text { data } => self.insert_text(data),

            // "An end-of-file token"
            // "Parse error."
            // "Pop the current node off the stack of open elements."
            // "Switch the insertion mode to the original insertion mode and reprocess the token."
            Token::EndOfFile => {
                let tag = self.current_tag_name().unwrap_or_default().to_string();
                self.parse_error(&format!("end of file inside <{tag}>"));
                let _ = self.stack_of_open_elements.pop();
                self.insertion_mode = self
                    .original_insertion_mode
                    .take()
                    .unwrap_or(InsertionMode::InBody);
                self.reprocess_token(token);
            }

            // "Any other end tag"
            // "Pop the current node off the stack of open elements."
            // "Switch the insertion mode to the original insertion mode."
            Token::EndTag { .. } => {
                let _ = self.stack_of_open_elements.pop();
                self.insertion_mode = self
                    .original_insertion_mode
                    .take()
                    .unwrap_or(InsertionMode::InBody);
            }

            // The tokenizer only produces text and the closing end tag while in
            // RAWTEXT/RCDATA.
            Token::StartTag { .. } | Token::Comment { .. } | Token::Doctype { .. } => {}
        }
    }

    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    fn handle_after_body_mode(&mut self, token: &Token) {
        match token {
            // "A character token that is one of U+0009 CHARACTER TABULATION, ..."
            // "Process the token using the rules for the "in body" insertion mode."
            Token::Text { data } => {
                let (whitespace, rest) = Self::split_leading_whitespace(data);
                self.handle_in_body_mode(&Token::text(whitespace));
                if !rest.is_empty() {
                    self.handle_after_body_anything_else(&Token::text(rest));
                }
            }

            // "A comment token"
            // "Insert a comment as the last child of the first element in the stack
            // of open elements (the html element)."
            Token::Comment { data } => {
                let html = self
                    .stack_of_open_elements
                    .first()
                    .copied()
                    .unwrap_or(NodeId::ROOT);
                self.insert_comment_into(html, data);
            }

            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),

            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),

            // "An end tag whose tag name is "html""
            // "Switch the insertion mode to "after after body"."
            Token::EndTag { name } if name == "html" => {
                self.insertion_mode = InsertionMode::AfterAfterBody;
            }

            // "An end-of-file token"
            // "Stop parsing."
            Token::EndOfFile => self.stopped = true,

            _ => self.handle_after_body_anything_else(token),
        }
    }

    /// "Anything else":
    /// "Parse error. Switch the insertion mode to "in body" and reprocess the token."
    fn handle_after_body_anything_else(&mut self, token: &Token) {
        self.parse_error("content after </body>");
        self.insertion_mode = InsertionMode::InBody;
        self.reprocess_token(token);
    }

    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    fn handle_after_after_body_mode(&mut self, token: &Token) {
        match token {
            // "A comment token"
            // "Insert a comment as the last child of the Document object."
            Token::Comment { data } => self.insert_comment_into(NodeId::ROOT, data),

            // "A DOCTYPE token", "A character token that is one of U+0009 ...",
            // "A start tag whose tag name is "html""
            // "Process the token using the rules for the "in body" insertion mode."
            Token::Doctype { .. } => self.handle_in_body_mode(token),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),
            Token::Text { data } => {
                let (whitespace, rest) = Self::split_leading_whitespace(data);
                self.handle_in_body_mode(&Token::text(whitespace));
                if !rest.is_empty() {
                    self.handle_after_body_anything_else(&Token::text(rest));
                }
            }

            Token::EndOfFile => self.stopped = true,

            _ => self.handle_after_body_anything_else(token),
        }
    }
}
