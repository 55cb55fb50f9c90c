//! Fetch, parse and render, one source at a time.
//!
//! A batch keeps going when one source fails: the failure is handed to the
//! caller and the next source starts from a clean slate.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};
use treez_common::warning::clear_warnings;
use treez_common::{FetchError, SourceLoader};
use treez_dom::walk;
use treez_html::{ParsedDocument, ParserOptions, parse_str, parse_with_options};

use crate::error::{OutlineError, VisitorError};
use crate::renderer::{OutlineOptions, OutlineRenderer};
use crate::stats::NodeStats;

/// Something that turns a source string into raw bytes.
pub trait Fetch {
    /// Acquire the bytes of `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the source cannot be read.
    fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError>;
}

impl Fetch for SourceLoader {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        self.load(source)
    }
}

/// What rendering one source produced besides the outline itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineReport {
    /// Node counts of the parsed tree.
    pub stats: NodeStats,
    /// Recoverable parse errors seen while building the tree.
    pub issues: usize,
}

/// Totals of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Sources rendered completely.
    pub succeeded: usize,
    /// Sources that failed at any stage.
    pub failed: usize,
}

/// Per-source driver: fetcher plus parser and outline settings.
///
/// Each source or markup string starts with a fresh warning set. That set
/// is process-wide (see [`treez_common::warning`]), so pipelines running
/// concurrently reset each other's deduplication.
pub struct Pipeline<F> {
    fetcher: F,
    parser_options: ParserOptions,
    outline_options: OutlineOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl<F: Fetch> Pipeline<F> {
    /// A pipeline with default parser and outline settings.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            parser_options: ParserOptions::default(),
            outline_options: OutlineOptions::default(),
            cancel: None,
        }
    }

    /// Use these parser settings.
    #[must_use]
    pub const fn with_parser_options(mut self, options: ParserOptions) -> Self {
        self.parser_options = options;
        self
    }

    /// Use these outline settings.
    #[must_use]
    pub const fn with_outline_options(mut self, options: OutlineOptions) -> Self {
        self.outline_options = options;
        self
    }

    /// Stop rendering, and stop the batch, once `flag` is set.
    #[must_use]
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Fetch `source`, parse it and write its outline to `sink`.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure. Lines written before a render
    /// failure stay in the sink.
    pub fn outline_source<W: Write>(
        &self,
        source: &str,
        sink: &mut W,
    ) -> Result<OutlineReport, OutlineError> {
        clear_warnings();
        let bytes = self.fetcher.fetch(source)?;
        debug!(source, bytes = bytes.len(), "fetched source");
        let document = parse_with_options(&bytes, &self.parser_options)?;
        self.render(&document, sink)
    }

    /// Parse `markup` and write its outline to `sink`.
    ///
    /// # Errors
    ///
    /// Returns a parse or render failure.
    pub fn outline_markup<W: Write>(
        &self,
        markup: &str,
        sink: &mut W,
    ) -> Result<OutlineReport, OutlineError> {
        clear_warnings();
        let document = parse_str(markup, &self.parser_options)?;
        self.render(&document, sink)
    }

    fn render<W: Write>(
        &self,
        document: &ParsedDocument,
        sink: &mut W,
    ) -> Result<OutlineReport, OutlineError> {
        let tree = &document.tree;
        let mut renderer = OutlineRenderer::new(&mut *sink, self.outline_options);
        if let Some(flag) = &self.cancel {
            renderer = renderer.with_cancel(Arc::clone(flag));
        }
        walk(tree, tree.root(), &mut renderer)?;
        drop(renderer);
        sink.flush().map_err(VisitorError::from)?;

        let stats = NodeStats::collect(tree);
        debug!(nodes = stats.total(), issues = document.issues.len(), "rendered outline");
        Ok(OutlineReport {
            stats,
            issues: document.issues.len(),
        })
    }

    /// Outline every source in order.
    ///
    /// `on_result` sees each source's outcome as soon as it is known. A
    /// failed source never stops the batch; cancellation does.
    pub fn run_batch<I, S, W, R>(&self, sources: I, sink: &mut W, mut on_result: R) -> BatchSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        W: Write,
        R: FnMut(&str, &Result<OutlineReport, OutlineError>),
    {
        let mut summary = BatchSummary::default();
        for source in sources {
            if self.is_cancelled() {
                info!("batch cancelled");
                break;
            }
            let source = source.as_ref();

            let result = self.outline_source(source, sink);
            match &result {
                Ok(_) => summary.succeeded += 1,
                Err(error) => {
                    debug!(source, stage = error.stage(), %error, "source failed");
                    summary.failed += 1;
                }
            }
            on_result(source, &result);
        }
        summary
    }
}
