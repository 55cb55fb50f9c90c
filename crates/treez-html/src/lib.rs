//! HTML tokenizer and tree builder for treez.
//!
//! # Scope
//!
//! This crate implements:
//! - **HTML Tokenizer** ([WHATWG § 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization))
//!   - Data, RCDATA and RAWTEXT states, tags and attributes
//!   - DOCTYPE, comment and common character reference handling
//!
//! - **HTML Parser / Tree Builder** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction))
//!   - Insertion modes: Initial, BeforeHtml, BeforeHead, InHead, AfterHead, InBody, Text, AfterBody, AfterAfterBody
//!   - Implied `html`/`head`/`body`, void elements, implied end tags
//!
//! # Not Implemented
//!
//! - Table, select, template and frameset insertion modes (their content is
//!   built with the "in body" rules)
//! - Active formatting element reconstruction and the adoption agency algorithm
//! - Foreign content (SVG/MathML)

use std::fmt;

use thiserror::Error;
use tracing::debug;
use treez_dom::DomTree;

/// HTML parser and tree construction.
pub mod parser;
/// HTML tokenizer for converting input into tokens.
pub mod tokenizer;

pub use parser::{HTMLParser, InsertionMode};
pub use tokenizer::{HTMLTokenizer, Token};

/// Default limit on element nesting.
pub const DEFAULT_MAX_DEPTH: usize = 512;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Failure to turn one source's bytes into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input is not UTF-8 and lossy decoding was not requested.
    #[error("input is not valid UTF-8 (first invalid byte at offset {valid_up_to})")]
    InvalidUtf8 {
        /// Byte offset of the first invalid sequence.
        valid_up_to: usize,
    },

    /// Elements nest deeper than the configured limit.
    #[error("element nesting exceeds the limit of {limit}")]
    NestingTooDeep {
        /// The limit that was exceeded.
        limit: usize,
    },
}

/// [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
///
/// A recoverable irregularity in the markup. Parsing continues after one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// Stage that reported the issue.
    pub component: &'static str,
    /// What went wrong and where.
    pub message: String,
}

impl ParseIssue {
    /// Create an issue for the given stage.
    #[must_use]
    pub fn new(component: &'static str, message: impl Into<String>) -> Self {
        Self {
            component,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.component, self.message)
    }
}

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Deepest allowed element nesting.
    pub max_depth: usize,
    /// Replace invalid UTF-8 with U+FFFD instead of failing.
    pub lossy_utf8: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            lossy_utf8: false,
        }
    }
}

/// A fully built document and the issues seen while building it.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// The document tree.
    pub tree: DomTree,
    /// Recoverable parse errors, tokenizer first.
    pub issues: Vec<ParseIssue>,
}

/// Parse raw bytes with the default options.
///
/// # Errors
///
/// See [`parse_with_options`].
pub fn parse(bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
    parse_with_options(bytes, &ParserOptions::default())
}

/// Decode `bytes` as UTF-8 and parse them into a document tree.
///
/// A leading byte order mark is skipped.
///
/// # Errors
///
/// Returns [`ParseError::InvalidUtf8`] for undecodable input (unless
/// `lossy_utf8` is set) and [`ParseError::NestingTooDeep`] when the markup
/// nests deeper than `max_depth`.
pub fn parse_with_options(
    bytes: &[u8],
    options: &ParserOptions,
) -> Result<ParsedDocument, ParseError> {
    let (bom_len, body) = match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => (UTF8_BOM.len(), rest),
        None => (0, bytes),
    };

    if options.lossy_utf8 {
        parse_str(&String::from_utf8_lossy(body), options)
    } else {
        let markup = std::str::from_utf8(body).map_err(|e| ParseError::InvalidUtf8 {
            valid_up_to: bom_len + e.valid_up_to(),
        })?;
        parse_str(markup, options)
    }
}

/// Parse already-decoded markup into a document tree.
///
/// # Errors
///
/// Returns [`ParseError::NestingTooDeep`] when the markup nests deeper than
/// `options.max_depth`.
pub fn parse_str(markup: &str, options: &ParserOptions) -> Result<ParsedDocument, ParseError> {
    let mut tokenizer = HTMLTokenizer::new(markup);
    tokenizer.run();
    let (tokens, mut issues) = tokenizer.into_parts();
    debug!(tokens = tokens.len(), "tokenized");

    let (tree, parser_issues) = HTMLParser::new(tokens)
        .with_max_depth(options.max_depth)
        .run()?;
    issues.extend(parser_issues);
    debug!(nodes = tree.len(), issues = issues.len(), "parsed");

    Ok(ParsedDocument { tree, issues })
}
