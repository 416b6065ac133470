//! Clipboard paste classification and markup synthesis.
//!
//! A paste is classified by the first matching rule:
//! 1. HTML made only of anchors becomes `[text](href)` links joined by spaces.
//! 2. HTML mixing anchors with other markup falls back to the plain text,
//!    with literal `<a href="...">...</a>` substrings rewritten to links.
//! 3. Image files are uploaded and referenced as `![](prefix/id)`.
//! 4. Any other files are uploaded and referenced as `[](prefix/id)`.
//! 5. Anything else is left to the platform's own paste.
//!
//! Uploads themselves are run by the editor against a
//! [`ContentStore`](crate::store::ContentStore).

pub mod html;

use std::path::Path;

use serde::{Deserialize, Serialize};

use html::FragmentShape;

/// Content type used when a file declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// The payloads of one paste event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardData {
    /// The `text/html` flavor, if present.
    pub html: Option<String>,
    /// The `text/plain` flavor, if present.
    pub text: Option<String>,
    pub files: Vec<ClipboardFile>,
}

impl ClipboardData {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn html(html: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            text: Some(text.into()),
            files: Vec::new(),
        }
    }

    pub fn files(files: Vec<ClipboardFile>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }
}

/// A file item on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardFile {
    pub name: String,
    /// Declared type; empty when the platform gave none.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ClipboardFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// How an uploaded item is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Image,
    Attachment,
}

impl AssetKind {
    /// Markdown referencing an uploaded item.
    pub fn markup(self, content_prefix: &str, id: &str) -> String {
        let prefix = content_prefix.trim_end_matches('/');
        match self {
            Self::Image => format!("![]({prefix}/{id})"),
            Self::Attachment => format!("[]({prefix}/{id})"),
        }
    }

    pub fn for_content_type(content_type: &str) -> Self {
        if content_type.starts_with("image/") {
            Self::Image
        } else {
            Self::Attachment
        }
    }
}

/// One upload to run for a paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub name: String,
    pub kind: AssetKind,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadJob {
    fn from_file(file: &ClipboardFile, kind: AssetKind) -> Self {
        let content_type = if file.content_type.is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            file.content_type.clone()
        };
        Self {
            name: file.name.clone(),
            kind,
            content_type,
            bytes: file.bytes.clone(),
        }
    }
}

/// Outcome of classifying a paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteAction {
    /// Insert this text at the caret and suppress the platform paste.
    InsertText(String),
    /// Suppress the platform paste and upload these items independently.
    Upload(Vec<UploadJob>),
    /// Let the platform paste proceed.
    PassThrough,
}

impl PasteAction {
    /// Whether the host should suppress its default paste handling.
    pub const fn intercepts(&self) -> bool {
        !matches!(self, Self::PassThrough)
    }
}

/// Decide what a paste should do.
pub fn classify(data: &ClipboardData) -> PasteAction {
    if let Some(html) = data.html.as_deref() {
        let text = match html::fragment_shape(html) {
            FragmentShape::AnchorsOnly(anchors) => {
                let links: Vec<String> = anchors.iter().map(html::Anchor::to_markdown).collect();
                links.join(" ")
            }
            FragmentShape::Mixed => {
                html::rewrite_literal_anchors(data.text.as_deref().unwrap_or_default())
            }
            FragmentShape::NoAnchors => String::new(),
        };
        // Nothing to insert: fall through rather than swallow the paste.
        if !text.is_empty() {
            return PasteAction::InsertText(text);
        }
    }

    let images: Vec<UploadJob> = data
        .files
        .iter()
        .filter(|file| file.is_image())
        .map(|file| UploadJob::from_file(file, AssetKind::Image))
        .collect();
    if !images.is_empty() {
        return PasteAction::Upload(images);
    }

    if !data.files.is_empty() {
        return PasteAction::Upload(
            data.files
                .iter()
                .map(|file| UploadJob::from_file(file, AssetKind::Attachment))
                .collect(),
        );
    }

    PasteAction::PassThrough
}

/// Content type for a local file, guessed from its extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
