//! In-process page and content store.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::Utc;

use super::{ContentStore, PageId, PageSnapshot, PageStore, Revision};
use crate::error::StoreError;

/// Behavior of one scripted store call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scripted {
    /// How long the call takes before resolving.
    pub delay: Duration,
    /// Whether the call fails.
    pub fail: bool,
}

impl Scripted {
    pub const fn ok_after(delay: Duration) -> Self {
        Self { delay, fail: false }
    }

    pub const fn fail_after(delay: Duration) -> Self {
        Self { delay, fail: true }
    }
}

#[derive(Debug)]
struct StoredPage {
    body: String,
    revision: Option<Revision>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredItem {
    content_type: String,
    bytes: Vec<u8>,
}

/// Page and content store kept in memory.
///
/// Calls succeed immediately unless scripted: each call pops the next
/// [`Scripted`] entry of its queue, sleeps for its delay and fails if asked.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: RefCell<HashMap<PageId, StoredPage>>,
    items: RefCell<HashMap<String, StoredItem>>,
    next_id: Cell<u64>,
    save_script: RefCell<VecDeque<Scripted>>,
    upload_script: RefCell<VecDeque<Scripted>>,
    save_calls: Cell<usize>,
    upload_calls: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page with an initial body and revision `"1"`.
    pub fn insert_page(&self, page: &PageId, body: &str) {
        self.pages.borrow_mut().insert(
            page.clone(),
            StoredPage {
                body: body.to_string(),
                revision: Some(Revision {
                    id: "1".to_string(),
                    timestamp: Utc::now(),
                }),
            },
        );
    }

    pub fn script_saves(&self, calls: impl IntoIterator<Item = Scripted>) {
        self.save_script.borrow_mut().extend(calls);
    }

    pub fn script_uploads(&self, calls: impl IntoIterator<Item = Scripted>) {
        self.upload_script.borrow_mut().extend(calls);
    }

    pub fn page_body(&self, page: &PageId) -> Option<String> {
        self.pages.borrow().get(page).map(|stored| stored.body.clone())
    }

    /// Content type and bytes of an uploaded item.
    pub fn item(&self, id: &str) -> Option<(String, Vec<u8>)> {
        self.items
            .borrow()
            .get(id)
            .map(|item| (item.content_type.clone(), item.bytes.clone()))
    }

    pub fn item_count(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.get()
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.get()
    }

    fn allocate_id(&self) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id.to_string()
    }

    async fn play(script: &RefCell<VecDeque<Scripted>>, what: &str) -> Result<(), StoreError> {
        let step = script.borrow_mut().pop_front().unwrap_or_default();
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        if step.fail {
            return Err(StoreError::Unavailable(format!("{what} rejected")));
        }
        Ok(())
    }
}

impl PageStore for MemoryStore {
    async fn load(&self, page: &PageId) -> Result<PageSnapshot, StoreError> {
        let pages = self.pages.borrow();
        let stored = pages
            .get(page)
            .ok_or_else(|| StoreError::NotFound(page.clone()))?;
        Ok(PageSnapshot {
            body: stored.body.clone(),
            revision: stored.revision.as_ref().map(|r| r.id.clone()),
            last_modified: stored.revision.as_ref().map(|r| r.timestamp),
        })
    }

    async fn save(&self, page: &PageId, body: String) -> Result<Revision, StoreError> {
        self.save_calls.set(self.save_calls.get() + 1);
        Self::play(&self.save_script, "save").await?;
        let mut pages = self.pages.borrow_mut();
        let stored = pages
            .get_mut(page)
            .ok_or_else(|| StoreError::NotFound(page.clone()))?;
        let next = stored
            .revision
            .as_ref()
            .and_then(|r| r.id.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        let revision = Revision {
            id: next.to_string(),
            timestamp: Utc::now(),
        };
        stored.body = body;
        stored.revision = Some(revision.clone());
        Ok(revision)
    }

    async fn create(&self) -> Result<PageId, StoreError> {
        let page = PageId::new(format!("page-{}", self.allocate_id()));
        self.pages.borrow_mut().insert(
            page.clone(),
            StoredPage {
                body: String::new(),
                revision: None,
            },
        );
        Ok(page)
    }
}

impl ContentStore for MemoryStore {
    async fn upload(&self, content_type: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        self.upload_calls.set(self.upload_calls.get() + 1);
        Self::play(&self.upload_script, "upload").await?;
        let id = self.allocate_id();
        self.items.borrow_mut().insert(
            id.clone(),
            StoredItem {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(id)
    }
}
