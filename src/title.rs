//! Title derivation from rendered output.

use crate::markdown::RenderedOutput;

/// Tracks the document title across renders.
///
/// The title is the first level-1 heading's text, or the first source line
/// when there is no such heading, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleWatcher {
    current: String,
}

impl TitleWatcher {
    pub const fn new() -> Self {
        Self {
            current: String::new(),
        }
    }

    /// The last reported title (empty until one has been seen).
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Record the title of a fresh render.
    ///
    /// Returns the new title only when it differs from the recorded one and
    /// is non-empty; an empty candidate leaves the record untouched.
    pub fn observe(&mut self, output: &RenderedOutput, source: &str) -> Option<String> {
        let title = derive_title(output, source);
        if title.is_empty() || title == self.current {
            return None;
        }
        self.current.clone_from(&title);
        Some(title)
    }

    /// Forget the recorded title, e.g. when a different page is loaded.
    pub fn reset(&mut self) {
        self.current.clear();
    }
}

/// Title of a render without any change tracking.
pub fn derive_title(output: &RenderedOutput, source: &str) -> String {
    output.heading_text(1).map_or_else(
        || source.split('\n').next().unwrap_or_default().trim().to_string(),
        |heading| heading.trim().to_string(),
    )
}
