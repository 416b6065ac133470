//! Error types.
//!
//! Parse problems never surface here: malformed markdown degrades to text.
//! Navigation misses are not errors either. What remains are buffer misuse,
//! store failures, and the editor-level distinction between a failed save
//! (possible data loss, raised) and a failed upload (logged and skipped).

use thiserror::Error;

use crate::store::PageId;

/// Misuse of the line buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("line {line} is out of range (buffer has {count} lines)")]
    LineOutOfRange { line: usize, count: usize },
    #[error("line {line} would contain an embedded newline")]
    EmbeddedNewline { line: usize },
}

/// Failure talking to the page store or the content store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} {url} returned status {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },
    #[error("no item id in response url {0}")]
    MissingId(String),
    #[error("response is missing the {0} header")]
    MissingHeader(&'static str),
    #[error("invalid store url: {0}")]
    Url(#[from] url::ParseError),
    #[error("page {0} not found")]
    NotFound(PageId),
    #[error("{0}")]
    Unavailable(String),
}

/// Errors raised to the caller of the editor.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("saving page {page} failed: {source}")]
    Save { page: PageId, source: StoreError },
    #[error("loading page {page} failed: {source}")]
    Load { page: PageId, source: StoreError },
    #[error("creating a page failed: {0}")]
    Create(StoreError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl EditorError {
    /// True when the error means an edit may not have been persisted.
    pub const fn is_data_loss(&self) -> bool {
        matches!(self, Self::Save { .. })
    }
}
