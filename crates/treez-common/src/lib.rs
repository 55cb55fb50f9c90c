//! Common utilities for treez.
//!
//! This crate provides shared infrastructure used by the other crates:
//! - **Source loading** - HTTP(S), `data:` URLs and local files
//! - **Warning System** - deduplicated warnings for recoverable problems

pub mod net;
pub mod warning;

pub use net::{FetchConfig, FetchError, SourceLoader};
