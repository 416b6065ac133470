//! The display surface capability.
//!
//! The editor core never touches a UI toolkit directly. Whatever shows the
//! rendered preview and the editable lines implements [`DisplaySurface`];
//! the position mapper and the orchestrator only talk to this trait.

use crate::markdown::{NodeRef, RenderedOutput, SourceSpan};

/// How a rendered node should be brought into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOptions {
    pub block: ScrollBlock,
    pub smooth: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBlock {
    Start,
    Center,
    End,
    Nearest,
}

impl ScrollOptions {
    /// Centered, smooth scrolling used when following the caret.
    pub const fn centered() -> Self {
        Self {
            block: ScrollBlock::Center,
            smooth: true,
        }
    }
}

/// A rendered pane plus an editable line view.
pub trait DisplaySurface {
    /// Replace the rendered pane with fresh output.
    fn present(&mut self, output: &RenderedOutput);

    /// Replace the editable view's lines (external load).
    fn load_lines(&mut self, lines: &[String]);

    /// Read the editable view's lines back.
    fn editable_lines(&self) -> Vec<String>;

    /// The currently presented node carrying `span`, if any.
    fn render_node_at(&self, span: &SourceSpan) -> Option<NodeRef>;

    fn scroll_into_view(&mut self, node: NodeRef, options: ScrollOptions);

    /// Move editing focus to a 1-based line.
    fn focus_line(&mut self, line: usize);

    /// 1-based line holding the edit caret, if the view has focus.
    fn current_caret_line(&self) -> Option<usize>;

    /// Insert text at the current selection, as if typed.
    fn insert_at_caret(&mut self, text: &str);
}

/// In-memory surface: keeps lines and a caret, records focus and scroll
/// requests. Used by the command line front end and by tests.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    lines: Vec<String>,
    /// 1-based line and byte column of the caret.
    caret: Option<(usize, usize)>,
    presented: RenderedOutput,
    present_count: usize,
    scrolled: Vec<(NodeRef, ScrollOptions)>,
    focused: Vec<usize>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            ..Self::default()
        }
    }

    /// Place the caret at a 1-based line and byte column (clamped).
    pub fn set_caret(&mut self, line: usize, column: usize) {
        let line = line.clamp(1, self.lines.len().max(1));
        let len = self.lines.get(line - 1).map_or(0, String::len);
        let mut column = column.min(len);
        if let Some(text) = self.lines.get(line - 1) {
            while !text.is_char_boundary(column) {
                column -= 1;
            }
        }
        self.caret = Some((line, column));
    }

    pub const fn caret(&self) -> Option<(usize, usize)> {
        self.caret
    }

    /// Replace the text of one line, as a user typing would.
    pub fn type_line(&mut self, line: usize, text: &str) {
        if let Some(slot) = line.checked_sub(1).and_then(|i| self.lines.get_mut(i)) {
            slot.clear();
            slot.push_str(text);
        }
        if let Some((caret_line, column)) = self.caret
            && caret_line == line
        {
            self.set_caret(line, column);
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub const fn presented(&self) -> &RenderedOutput {
        &self.presented
    }

    pub const fn present_count(&self) -> usize {
        self.present_count
    }

    pub fn scrolled(&self) -> &[(NodeRef, ScrollOptions)] {
        &self.scrolled
    }

    pub fn focused(&self) -> &[usize] {
        &self.focused
    }
}

impl DisplaySurface for HeadlessSurface {
    fn present(&mut self, output: &RenderedOutput) {
        self.presented = output.clone();
        self.present_count += 1;
    }

    fn load_lines(&mut self, lines: &[String]) {
        self.lines = if lines.is_empty() {
            vec![String::new()]
        } else {
            lines.to_vec()
        };
        self.caret = None;
    }

    fn editable_lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    fn render_node_at(&self, span: &SourceSpan) -> Option<NodeRef> {
        self.presented.find_span(span)
    }

    fn scroll_into_view(&mut self, node: NodeRef, options: ScrollOptions) {
        self.scrolled.push((node, options));
    }

    fn focus_line(&mut self, line: usize) {
        self.focused.push(line);
        self.set_caret(line, 0);
    }

    fn current_caret_line(&self) -> Option<usize> {
        self.caret.map(|(line, _)| line)
    }

    fn insert_at_caret(&mut self, text: &str) {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        let (line, column) = self
            .caret
            .unwrap_or((self.lines.len(), usize::MAX));
        // The lines may have changed under the caret; land on a valid boundary.
        self.set_caret(line, column);
        let Some((line, column)) = self.caret else {
            return;
        };
        let current = &self.lines[line - 1];
        let (before, after) = current.split_at(column);
        let after = after.to_string();
        let mut combined = before.to_string();
        combined.push_str(text);
        let caret_column = combined.rsplit('\n').next().map_or(0, str::len);
        combined.push_str(&after);

        let inserted: Vec<String> = combined.split('\n').map(ToString::to_string).collect();
        let added = inserted.len() - 1;
        self.lines.splice(line - 1..line, inserted);
        self.caret = Some((line + added, caret_column));
    }
}
