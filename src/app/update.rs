use tracing::{debug, error, info, warn};

use crate::app::Model;
use crate::app::model::{EditorEvent, Effect};
use crate::error::{EditorError, StoreError};
use crate::markdown::NodeRef;
use crate::paste::{self, AssetKind, ClipboardData, PasteAction};
use crate::position;
use crate::store::{PageId, PageSnapshot, Revision};

/// Everything that can happen to the editor.
///
/// Host input (edits, caret moves, clicks, pastes) and the completions of
/// the editor's own asynchronous work both arrive here.
#[derive(Debug)]
pub enum Message {
    // External loads
    /// Replace the whole source without saving it.
    SetValue(String),
    /// A page was loaded from the page store.
    PageLoaded { page: PageId, snapshot: PageSnapshot },

    // Editable view
    /// One line's text changed in place (1-based line).
    LineEdited { line: usize, text: String },
    /// The view's lines after it split or merged lines.
    LinesReplaced(Vec<String>),
    /// The caret moved to another line.
    CaretMoved,

    // Rendered view
    /// A rendered node was clicked.
    RenderedClicked(NodeRef),

    // Clipboard
    Paste(ClipboardData),

    // Completions
    UploadFinished {
        name: String,
        kind: AssetKind,
        result: Result<String, StoreError>,
    },
    SaveFinished {
        page: PageId,
        seq: u64,
        result: Result<Revision, StoreError>,
    },
    /// The grace period of save `seq` ran out.
    SaveGraceElapsed(u64),
}

/// Whether the host should suppress its own default handling of the input
/// that produced a message (a native paste, a link click).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Consumed,
    Ignored,
}

/// Apply a message to the model, queueing the effects it implies.
///
/// # Errors
/// Returns [`EditorError::Buffer`] for an edit naming a missing line or
/// carrying a newline, and [`EditorError::Save`] when a save failed. A
/// failed save has already cleared the busy indicator and queued a
/// [`EditorEvent::SaveFailed`] notification.
pub fn update(model: &mut Model, msg: Message) -> Result<Disposition, EditorError> {
    match msg {
        Message::SetValue(source) => {
            load_source(model, source);
        }
        Message::PageLoaded { page, snapshot } => {
            info!(%page, revision = ?snapshot.revision, "page opened");
            model.title.reset();
            model.revision = snapshot.revision();
            if let Some(revision) = &model.revision {
                model.emit(EditorEvent::RevisionChanged {
                    page: page.clone(),
                    revision: revision.id.clone(),
                    timestamp: revision.timestamp,
                });
            }
            model.page = Some(page);
            load_source(model, snapshot.body);
        }

        Message::LineEdited { line, text } => {
            model.buffer.set_line_text(line, &text)?;
            after_edit(model);
        }
        Message::LinesReplaced(lines) => {
            model.buffer.replace_lines(&lines)?;
            after_edit(model);
        }
        Message::CaretMoved => model.push_effect(Effect::RevealCaret),

        Message::RenderedClicked(node) => {
            if position::line_for_node(&model.rendered, &model.buffer, node).is_none() {
                debug!(node = node.0, "click left to the platform");
                return Ok(Disposition::Ignored);
            }
            model.push_effect(Effect::FocusRendered(node));
        }

        Message::Paste(data) => match paste::classify(&data) {
            PasteAction::InsertText(text) => model.push_effect(Effect::InsertAtCaret(text)),
            PasteAction::Upload(jobs) => {
                debug!(count = jobs.len(), "uploading pasted files");
                for job in jobs {
                    model.uploads_in_flight += 1;
                    model.push_effect(Effect::Upload(job));
                }
            }
            PasteAction::PassThrough => return Ok(Disposition::Ignored),
        },

        Message::UploadFinished { name, kind, result } => {
            model.uploads_in_flight = model.uploads_in_flight.saturating_sub(1);
            match result {
                Ok(id) => {
                    debug!(%name, %id, "upload finished");
                    let markup = kind.markup(&model.settings.content_prefix, &id);
                    model.push_effect(Effect::InsertAtCaret(markup));
                }
                Err(err) => {
                    warn!(%name, error = %err, "upload failed, skipping insertion");
                    model.emit(EditorEvent::UploadFailed {
                        name,
                        reason: err.to_string(),
                    });
                }
            }
        }
        Message::SaveFinished { page, seq, result } => {
            model.saves_in_flight.remove(&seq);
            if model.saves_in_flight.is_empty() && model.busy {
                model.busy = false;
                model.emit(EditorEvent::Busy { busy: false });
            }
            match result {
                Ok(revision) => {
                    debug!(%page, revision = %revision.id, "page saved");
                    model.emit(EditorEvent::RevisionChanged {
                        page,
                        revision: revision.id.clone(),
                        timestamp: revision.timestamp,
                    });
                    model.revision = Some(revision);
                }
                Err(source) => {
                    error!(%page, error = %source, "saving page failed");
                    model.emit(EditorEvent::SaveFailed {
                        page: page.clone(),
                        reason: source.to_string(),
                    });
                    return Err(EditorError::Save { page, source });
                }
            }
        }
        Message::SaveGraceElapsed(seq) => {
            if model.saves_in_flight.contains(&seq) && !model.busy {
                model.busy = true;
                model.emit(EditorEvent::Busy { busy: true });
            }
        }
    }
    Ok(Disposition::Consumed)
}

fn load_source(model: &mut Model, source: String) {
    model.buffer.load(&source);
    model.source = source;
    model.push_effect(Effect::LoadLines);
    model.render();
}

/// Resynchronize after the view changed the buffer: rebuild the source,
/// re-render, follow the caret and save.
fn after_edit(model: &mut Model) {
    model.source = model.buffer.to_source();
    model.render();
    model.push_effect(Effect::RevealCaret);

    let Some(page) = model.page.clone() else {
        return;
    };
    model.save_seq += 1;
    let seq = model.save_seq;
    model.saves_in_flight.insert(seq);
    model.push_effect(Effect::Save {
        page,
        body: model.source.clone(),
        seq,
    });
    model.push_effect(Effect::GraceTimer {
        seq,
        after: model.settings.save_grace,
    });
}
