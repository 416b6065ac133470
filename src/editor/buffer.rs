use ropey::Rope;

use crate::error::BufferError;

/// The editable representation of the source: one record per
/// `\n`-delimited line, addressed by 1-based line number.
///
/// Backed by a rope built without CR/Unicode line breaks, so only `\n`
/// separates lines and `join(lines, "\n")` is always the source text.
/// Editing is done by the view replacing a line's text; the buffer never
/// splits or merges lines on its own.
#[derive(Clone, Default)]
pub struct LineBuffer {
    rope: Rope,
}

impl LineBuffer {
    /// Create a buffer from source text.
    pub fn from_source(source: &str) -> Self {
        Self {
            rope: Rope::from_str(source),
        }
    }

    /// Replace every line with the lines of `source`.
    pub fn load(&mut self, source: &str) {
        self.rope = Rope::from_str(source);
    }

    /// Join all lines with `\n`.
    pub fn to_source(&self) -> String {
        self.rope.to_string()
    }

    /// Total number of lines; an empty buffer still has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Whether `line` (1-based) names an existing record.
    pub fn contains_line(&self, line: usize) -> bool {
        line >= 1 && line <= self.line_count()
    }

    /// Text of a line (1-based), without its terminating newline.
    pub fn line_text(&self, line: usize) -> Option<String> {
        if !self.contains_line(line) {
            return None;
        }
        let text = self.rope.line(line - 1).to_string();
        Some(match text.strip_suffix('\n') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }

    /// All lines in order.
    pub fn lines(&self) -> Vec<String> {
        (1..=self.line_count())
            .filter_map(|line| self.line_text(line))
            .collect()
    }

    /// Replace the text of one line (1-based).
    ///
    /// # Errors
    /// Fails if the line does not exist or `text` contains a newline.
    pub fn set_line_text(&mut self, line: usize, text: &str) -> Result<(), BufferError> {
        if !self.contains_line(line) {
            return Err(BufferError::LineOutOfRange {
                line,
                count: self.line_count(),
            });
        }
        if text.contains('\n') {
            return Err(BufferError::EmbeddedNewline { line });
        }
        let start = self.rope.line_to_char(line - 1);
        let slice = self.rope.line(line - 1);
        let mut len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
        }
        self.rope.remove(start..start + len);
        self.rope.insert(start, text);
        Ok(())
    }

    /// Replace all records with `lines`, as read back from the editable view
    /// after it split or merged lines.
    ///
    /// # Errors
    /// Fails without modifying the buffer if any element contains a newline.
    pub fn replace_lines(&mut self, lines: &[String]) -> Result<(), BufferError> {
        if let Some(line) = lines.iter().position(|l| l.contains('\n')) {
            return Err(BufferError::EmbeddedNewline { line: line + 1 });
        }
        self.rope = Rope::from_str(&lines.join("\n"));
        Ok(())
    }
}

impl std::fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .finish()
    }
}
