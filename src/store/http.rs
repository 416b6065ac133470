//! HTTP client for the wiki server's page and data endpoints.

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::{CONTENT_TYPE, DATE, HeaderMap, LAST_MODIFIED, LOCATION};
use reqwest::{Client, Response, StatusCode, redirect};
use tracing::debug;
use url::Url;

use super::{ContentStore, PageId, PageSnapshot, PageStore, Revision};
use crate::error::StoreError;

const REVISION_ID: &str = "Revision-ID";

/// Page and content store served over HTTP.
///
/// Endpoints, relative to the base URL:
/// - `GET`/`POST api/v1/page/{id}` load and save a page body
/// - `POST api/v1/page/new` creates a page and redirects to it
/// - `POST api/v1/data/new` stores bytes and redirects to the new item
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base: Url,
}

impl HttpStore {
    /// Create a client rooted at `base` (a trailing slash is added if missing).
    ///
    /// # Errors
    /// Fails if `base` is not a valid URL or the client cannot be built.
    pub fn new(base: &str) -> Result<Self, StoreError> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        // Redirects carry the created id; read them instead of following.
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { client, base })
    }

    pub const fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.base.join(path)?)
    }

    fn page_url(&self, page: &PageId) -> Result<Url, StoreError> {
        let mut url = self.endpoint("api/v1/page/")?;
        url.path_segments_mut()
            .map_err(|()| StoreError::Unavailable(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .push(page.as_str());
        Ok(url)
    }
}

impl PageStore for HttpStore {
    async fn load(&self, page: &PageId) -> Result<PageSnapshot, StoreError> {
        let url = self.page_url(page)?;
        debug!(%url, "loading page");
        let response = self.client.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(StoreError::NotFound(page.clone())),
            // A page without revisions.
            StatusCode::NO_CONTENT => return Ok(PageSnapshot::default()),
            status if !status.is_success() => return Err(status_error("GET", &url, status)),
            _ => {}
        }
        let revision = header_str(response.headers(), REVISION_ID).map(str::to_string);
        let last_modified = header_str(response.headers(), LAST_MODIFIED.as_str()).and_then(parse_http_date);
        let body = response.text().await?;
        Ok(PageSnapshot {
            body,
            revision,
            last_modified,
        })
    }

    async fn save(&self, page: &PageId, body: String) -> Result<Revision, StoreError> {
        let url = self.page_url(page)?;
        debug!(%url, bytes = body.len(), "saving page");
        let response = self.client.post(url.clone()).body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error("POST", &url, status));
        }
        let headers = response.headers();
        let id = header_str(headers, REVISION_ID).ok_or(StoreError::MissingHeader(REVISION_ID))?;
        let timestamp = header_str(headers, LAST_MODIFIED.as_str())
            .or_else(|| header_str(headers, DATE.as_str()))
            .and_then(parse_http_date)
            .unwrap_or_else(Utc::now);
        Ok(Revision {
            id: id.to_string(),
            timestamp,
        })
    }

    async fn create(&self) -> Result<PageId, StoreError> {
        let url = self.endpoint("api/v1/page/new")?;
        let response = self.client.post(url.clone()).send().await?;
        created_id(&response, "POST", &url).map(PageId::new)
    }
}

impl ContentStore for HttpStore {
    async fn upload(&self, content_type: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        let url = self.endpoint("api/v1/data/new")?;
        debug!(%url, content_type, bytes = bytes.len(), "uploading content");
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        created_id(&response, "POST", &url)
    }
}

/// Id of the item a creation request redirected to.
fn created_id(response: &Response, method: &'static str, url: &Url) -> Result<String, StoreError> {
    let status = response.status();
    let target = if status.is_redirection() {
        let location = header_str(response.headers(), LOCATION.as_str())
            .ok_or(StoreError::MissingHeader("Location"))?;
        url.join(location)?
    } else if status.is_success() {
        response.url().clone()
    } else {
        return Err(status_error(method, url, status));
    };
    id_from_url(&target).ok_or_else(|| StoreError::MissingId(target.to_string()))
}

/// Trailing non-empty path segment of a URL, ignoring any query.
pub fn id_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .rfind(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Parse an HTTP date (RFC 1123).
///
/// Zone abbreviations other than GMT/UT are read as UTC.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    let (stamp, _zone) = value.trim().rsplit_once(' ')?;
    NaiveDateTime::parse_from_str(stamp, "%a, %d %b %Y %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn status_error(method: &'static str, url: &Url, status: StatusCode) -> StoreError {
    StoreError::Status {
        method,
        url: url.to_string(),
        status: status.as_u16(),
    }
}
