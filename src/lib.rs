// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. store::StoreError)
    clippy::module_name_repetitions,
    // The editor runs on one thread; its futures hold `Rc` and `RefCell`
    clippy::future_not_send
)]

//! # convind-editor
//!
//! The editing core of the convind wiki: a markdown source kept in sync
//! with a rendered preview.
//!
//! - Every rendered element remembers the source span it came from, so a
//!   click in the preview focuses the right source line and moving the
//!   caret scrolls the matching element into view
//! - Private `convind://ID` links are rewritten to internal page paths
//! - Pasted links become markdown; pasted files are uploaded to the
//!   content store and referenced inline
//! - Edits are saved to the page store, with a busy indicator for slow saves
//!
//! ## Architecture
//!
//! The editor uses The Elm Architecture (TEA) pattern:
//! - **Model**: Editor state
//! - **Message**: Host input and async completions
//! - **Update**: State transitions that queue effects
//! - **Surface**: A [`surface::DisplaySurface`] the effects are applied to
//!
//! ## Modules
//!
//! - [`markdown`]: Parsing, link rewriting, span-annotated rendering
//! - [`editor`]: The line buffer
//! - [`position`]: Rendered node and editable line correspondence
//! - [`paste`]: Clipboard classification
//! - [`title`]: Title detection
//! - [`surface`]: The display capability and a headless implementation
//! - [`store`]: Page and content store clients
//! - [`app`]: The editor surface orchestrating all of the above

pub mod app;
pub mod config;
pub mod editor;
pub mod error;
pub mod markdown;
pub mod paste;
pub mod position;
pub mod store;
pub mod surface;
pub mod title;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{Disposition, EditorEvent, EditorSettings, EditorSurface, Message, Model};
    pub use crate::editor::LineBuffer;
    pub use crate::error::{BufferError, EditorError, StoreError};
    pub use crate::markdown::{MarkdownEngine, RenderedOutput, SourceSpan};
    pub use crate::surface::{DisplaySurface, HeadlessSurface};
}
