//! Outline rendering for treez.
//!
//! # Scope
//!
//! This crate provides:
//! - **Outline Renderer** - enter/exit visitors that print every element as
//!   an indented `<tag>` / `</tag>` pair
//! - **Node Statistics** - a second visitor counting nodes per kind
//! - **Pipeline** - fetch, parse and render one source at a time, keeping a
//!   batch going when a single source fails
//!
//! # Not Yet Implemented
//!
//! - Concurrent fetching (sources are handled strictly in order)

pub mod error;
pub mod pipeline;
pub mod renderer;
pub mod stats;

pub use error::{OutlineError, VisitorError};
pub use pipeline::{BatchSummary, Fetch, OutlineReport, Pipeline};
pub use renderer::{OutlineOptions, OutlineRenderer, render_outline};
pub use stats::NodeStats;
