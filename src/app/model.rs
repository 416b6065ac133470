use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::editor::LineBuffer;
use crate::markdown::{LinkRewrite, MarkdownEngine, NodeRef, RenderedOutput};
use crate::paste::UploadJob;
use crate::store::{PageId, Revision};
use crate::title::TitleWatcher;

/// Default path under which uploaded content is referenced.
pub const DEFAULT_CONTENT_PREFIX: &str = "/content";

/// Default delay before a pending save shows the busy indicator.
pub const DEFAULT_SAVE_GRACE: Duration = Duration::from_millis(100);

/// Settings the editor is built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    pub links: LinkRewrite,
    /// Path prefix for `![](prefix/id)` references to uploaded content.
    pub content_prefix: String,
    pub save_grace: Duration,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            links: LinkRewrite::default(),
            content_prefix: DEFAULT_CONTENT_PREFIX.to_string(),
            save_grace: DEFAULT_SAVE_GRACE,
        }
    }
}

/// Notifications for whoever hosts the editor.
///
/// These are observational: the editor never waits on them being handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    TitleChanged { title: String },
    RevisionChanged {
        page: PageId,
        revision: String,
        timestamp: DateTime<Utc>,
    },
    /// A save has been pending longer than the grace period (`true`), or
    /// the last pending save finished (`false`).
    Busy { busy: bool },
    /// An upload failed; only the inline reference to it is missing.
    UploadFailed { name: String, reason: String },
    /// A save failed; the edit may not have been persisted.
    SaveFailed { page: PageId, reason: String },
}

/// Side effects requested by [`update`](super::update), run by the
/// [`EditorSurface`](super::EditorSurface) against the display surface and
/// the stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show the current render.
    Present,
    /// Replace the editable view's lines with the buffer's.
    LoadLines,
    /// Scroll the node matching the caret line into view.
    RevealCaret,
    /// Focus the editable line a rendered node came from.
    FocusRendered(NodeRef),
    /// Insert text at the caret, then read the view back.
    InsertAtCaret(String),
    Emit(EditorEvent),
    Save { page: PageId, body: String, seq: u64 },
    GraceTimer { seq: u64, after: Duration },
    Upload(UploadJob),
}

/// The complete editor state.
///
/// `source` is the authoritative document and always equals the buffer's
/// joined lines once an update has returned.
#[derive(Debug)]
pub struct Model {
    pub settings: EditorSettings,
    pub engine: MarkdownEngine,
    pub buffer: LineBuffer,
    pub source: String,
    pub rendered: RenderedOutput,
    pub title: TitleWatcher,
    /// The page edits are saved to, if one is open.
    pub page: Option<PageId>,
    pub revision: Option<Revision>,
    /// Sequence number of the most recently issued save.
    pub save_seq: u64,
    pub(super) saves_in_flight: BTreeSet<u64>,
    pub(super) uploads_in_flight: usize,
    pub busy: bool,
    effects: Vec<Effect>,
}

impl Model {
    pub fn new(settings: EditorSettings) -> Self {
        let engine = MarkdownEngine::new(settings.links.clone());
        let rendered = engine.render_source("");
        Self {
            settings,
            engine,
            buffer: LineBuffer::default(),
            source: String::new(),
            rendered,
            title: TitleWatcher::new(),
            page: None,
            revision: None,
            save_seq: 0,
            saves_in_flight: BTreeSet::new(),
            uploads_in_flight: 0,
            busy: false,
            effects: Vec::new(),
        }
    }

    pub fn pending_saves(&self) -> usize {
        self.saves_in_flight.len()
    }

    pub const fn pending_uploads(&self) -> usize {
        self.uploads_in_flight
    }

    pub(super) fn push_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub(super) fn emit(&mut self, event: EditorEvent) {
        self.effects.push(Effect::Emit(event));
    }

    /// Effects queued since the last call, in order.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Re-render `source`, present it and report a changed title.
    pub(super) fn render(&mut self) {
        self.rendered = self.engine.render_source(&self.source);
        self.push_effect(Effect::Present);
        if let Some(title) = self.title.observe(&self.rendered, &self.source) {
            self.emit(EditorEvent::TitleChanged { title });
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}
