//! Clients for the page store and the content store.
//!
//! The page store keeps one markdown body per page id together with
//! revision metadata. The content store accepts raw bytes with a content
//! type and hands back an id. Both are external services; [`HttpStore`]
//! talks to them over HTTP and [`MemoryStore`] stands in for them in-process.

mod http;
mod memory;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub use http::{HttpStore, id_from_url, parse_http_date};
pub use memory::{MemoryStore, Scripted};

/// Identifier of a page in the page store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A stored revision of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

/// A page as loaded from the page store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub body: String,
    /// Absent for a page that has never been saved.
    pub revision: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl PageSnapshot {
    /// Revision metadata, when the store reported a revision id.
    pub fn revision(&self) -> Option<Revision> {
        let id = self.revision.clone()?;
        Some(Revision {
            id,
            timestamp: self.last_modified.unwrap_or_else(Utc::now),
        })
    }
}

/// Markdown bodies keyed by page id.
// The editor runs its futures on one thread, so no `Send` bound is wanted.
#[allow(async_fn_in_trait)]
pub trait PageStore {
    async fn load(&self, page: &PageId) -> Result<PageSnapshot, StoreError>;

    /// Store a new body, returning the revision it became.
    async fn save(&self, page: &PageId, body: String) -> Result<Revision, StoreError>;

    /// Create an empty page.
    async fn create(&self) -> Result<PageId, StoreError>;
}

/// Arbitrary byte payloads addressed by id.
#[allow(async_fn_in_trait)]
pub trait ContentStore {
    /// Upload bytes, returning the id of the created item.
    async fn upload(&self, content_type: &str, bytes: Vec<u8>) -> Result<String, StoreError>;
}
