//! Correspondence between rendered nodes and editable lines.
//!
//! Both directions are best-effort. A lookup that finds nothing is an
//! expected outcome (a link anchor was clicked, the caret sits on a blank
//! line) and is logged at debug level, never raised.

use tracing::debug;

use crate::editor::LineBuffer;
use crate::markdown::{NodeRef, RenderedOutput};
use crate::surface::{DisplaySurface, ScrollOptions};

/// Editable line a rendered node originates from.
///
/// `None` when the node carries no span or its start line no longer exists
/// in the buffer.
pub fn line_for_node(output: &RenderedOutput, buffer: &LineBuffer, node: NodeRef) -> Option<usize> {
    let span = output.span_of(node)?;
    buffer
        .contains_line(span.start.line)
        .then_some(span.start.line)
}

/// Most specific rendered node starting on `line`.
///
/// Candidates are ranked by the length of their `"L:C"` start label; among
/// equally long labels the later node in document order (the deeper one)
/// wins.
pub fn node_for_line(output: &RenderedOutput, line: usize) -> Option<NodeRef> {
    output
        .nodes_starting_at(line)
        .max_by_key(|(_, span)| span.start_label().len())
        .map(|(node, _)| node)
}

/// Move editing focus to the line a clicked node came from.
///
/// Returns the focused line, or `None` when the click should be left to the
/// platform (typically link navigation).
pub fn focus_from_rendered<D: DisplaySurface>(
    surface: &mut D,
    output: &RenderedOutput,
    buffer: &LineBuffer,
    node: NodeRef,
) -> Option<usize> {
    let Some(line) = line_for_node(output, buffer, node) else {
        debug!(node = node.0, "clicked node has no editable line");
        return None;
    };
    surface.focus_line(line);
    Some(line)
}

/// Scroll the rendered node matching the caret's line into view.
pub fn reveal_caret<D: DisplaySurface>(surface: &mut D, output: &RenderedOutput) -> Option<NodeRef> {
    let line = surface.current_caret_line()?;
    let Some(node) = node_for_line(output, line) else {
        debug!(line, "no rendered node starts on caret line");
        return None;
    };
    surface.scroll_into_view(node, ScrollOptions::centered());
    Some(node)
}
