//! Source loading for treez.
//!
//! A source is one command-line argument: an `http(s)://` URL fetched with a
//! blocking GET, a `data:` URL decoded in place, or a local file path.
//!
//! TODO: Honour the response charset instead of handing raw bytes to the
//! parser (<https://fetch.spec.whatwg.org/>).

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use base64::Engine;
use thiserror::Error;
use tracing::debug;

/// User-Agent header sent with all requests unless overridden.
///
/// Mimics a common desktop browser to avoid basic bot detection.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure to acquire the bytes of one source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent or timed out.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested URL.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} responded with HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status.
        status: reqwest::StatusCode,
    },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        /// Requested URL.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// A local file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A `data:` URL was malformed.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),
}

/// Settings for HTTP fetches.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Where a source's bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `http://` or `https://`
    Http,
    /// `data:`
    Data,
    /// Anything else, including `file://`.
    File,
}

impl SourceKind {
    /// Classify a source string by its scheme.
    #[must_use]
    pub fn of(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Http
        } else if source.starts_with("data:") {
            Self::Data
        } else {
            Self::File
        }
    }
}

/// Loads sources with one shared HTTP client.
pub struct SourceLoader {
    client: reqwest::blocking::Client,
}

impl SourceLoader {
    /// Build a loader from the given fetch settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be created.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Load the raw bytes of one source, dispatching on its scheme.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing why the source could not be read.
    pub fn load(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        let kind = SourceKind::of(source);
        debug!(source, ?kind, "loading source");
        match kind {
            SourceKind::Http => self.fetch_bytes(source),
            SourceKind::Data => decode_data_url(source),
            SourceKind::File => read_file(source),
        }
    }

    /// Fetch a URL and return its body as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the response has a non-success
    /// status, or the body cannot be read.
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
        debug!(url, status = status.as_u16(), bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}

/// Read a local file. A leading `file://` is stripped.
///
/// # Errors
///
/// Returns [`FetchError::Io`] if the file cannot be read.
pub fn read_file(source: &str) -> Result<Vec<u8>, FetchError> {
    let path = PathBuf::from(source.strip_prefix("file://").unwrap_or(source));
    fs::read(&path).map_err(|source| FetchError::Io { path, source })
}

/// Decode a `data:[<mediatype>][;base64],<data>` URL into raw bytes.
///
/// Base64 payloads may contain ASCII whitespace. Any other payload is
/// percent-decoded.
///
/// # Errors
///
/// Returns [`FetchError::InvalidDataUrl`] if the scheme or the comma is
/// missing, or if the base64 payload is malformed.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, FetchError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::InvalidDataUrl("missing data: scheme".to_string()))?;
    let (metadata, data) = rest
        .split_once(',')
        .ok_or_else(|| FetchError::InvalidDataUrl("missing comma".to_string()))?;

    if metadata.to_ascii_lowercase().ends_with(";base64") {
        let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| FetchError::InvalidDataUrl(format!("base64 decode error: {e}")))
    } else {
        Ok(percent_decode(data))
    }
}

/// [URL Standard § 1.3 Percent-encoded bytes](https://url.spec.whatwg.org/#percent-decode)
///
/// "For each byte byte in input: if byte is not 0x25 (%), then append byte
/// to output. Otherwise, if byte is 0x25 (%) and the next two bytes after
/// byte in input are not in the ranges 0x30 (0) to 0x39 (9), 0x41 (A) to 0x46
/// (F), and 0x61 (a) to 0x66 (f), all inclusive, append byte to output."
fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escape = (bytes[i] == b'%')
            .then(|| {
                let hi = bytes.get(i + 1).copied().and_then(hex_value)?;
                let lo = bytes.get(i + 2).copied().and_then(hex_value)?;
                Some((hi << 4) | lo)
            })
            .flatten();
        match escape {
            Some(byte) => {
                output.push(byte);
                i += 3;
            }
            None => {
                output.push(bytes[i]);
                i += 1;
            }
        }
    }
    output
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_by_scheme() {
        assert_eq!(SourceKind::of("https://example.com"), SourceKind::Http);
        assert_eq!(SourceKind::of("http://example.com"), SourceKind::Http);
        assert_eq!(SourceKind::of("data:,hi"), SourceKind::Data);
        assert_eq!(SourceKind::of("file:///tmp/a.html"), SourceKind::File);
        assert_eq!(SourceKind::of("page.html"), SourceKind::File);
    }

    #[test]
    fn test_decode_base64_data_url() {
        // "<p>hi</p>"
        let bytes = decode_data_url("data:text/html;base64,PHA+aGk8L3A+").expect("decodes");
        assert_eq!(bytes, b"<p>hi</p>");
    }

    #[test]
    fn test_decode_base64_ignores_whitespace_and_case() {
        let bytes = decode_data_url("data:text/html;BASE64,PHA+ aGk8\nL3A+").expect("decodes");
        assert_eq!(bytes, b"<p>hi</p>");
    }

    #[test]
    fn test_decode_percent_encoded_data_url() {
        let bytes = decode_data_url("data:text/html,%3Cb%3Ex%3C/b%3E%zz").expect("decodes");
        assert_eq!(bytes, b"<b>x</b>%zz");
    }

    #[test]
    fn test_decode_data_url_without_comma_fails() {
        let err = decode_data_url("data:text/html;base64").expect_err("no comma");
        assert!(matches!(err, FetchError::InvalidDataUrl(_)));
    }

    #[test]
    fn test_decode_bad_base64_fails() {
        let err = decode_data_url("data:;base64,***").expect_err("bad base64");
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let err = read_file("file:///definitely/not/here.html").expect_err("missing");
        match err {
            FetchError::Io { path, .. } => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.html"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
