//! Error types for outline rendering.

use std::io;

use thiserror::Error;
use treez_common::FetchError;
use treez_html::ParseError;

/// A visitor failed during a walk.
#[derive(Debug, Error)]
pub enum VisitorError {
    /// Writing to the output sink failed.
    #[error("failed to write outline: {0}")]
    Sink(#[from] io::Error),

    /// The walk was cancelled from outside.
    #[error("outline cancelled")]
    Cancelled,
}

/// Why one source produced no (or only part of an) outline.
#[derive(Debug, Error)]
pub enum OutlineError {
    /// The source could not be acquired.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The source's bytes could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Rendering stopped part way.
    #[error(transparent)]
    Visit(#[from] VisitorError),
}

impl OutlineError {
    /// Short name of the stage that failed, for log fields.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Parse(_) => "parse",
            Self::Visit(_) => "render",
        }
    }
}
