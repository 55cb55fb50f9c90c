//! Deduplicated warnings for recoverable problems.
//!
//! The parser reports malformed markup here instead of failing. A page with
//! hundreds of stray end tags produces one warning per distinct message.
//!
//! The set of seen messages is process-wide. Every parse in the process
//! shares it, and [`clear_warnings`] resets it for all of them.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Emit a warning once per unique `(component, message)` pair.
///
/// Returns `true` if the warning was emitted, `false` if it was a repeat.
///
/// # Example
/// ```
/// treez_common::warning::warn_once("HTML Parser", "unexpected end tag </p>");
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let first_time = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if first_time {
        warn!(component, "{message}");
    }
    first_time
}

/// Clear all recorded warnings (call when loading a new source)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
