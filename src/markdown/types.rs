//! Rendered output types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 1-based line/column position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LineColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Inclusive range of source text a rendered node came from.
///
/// Displays (and parses) as `"3:1-5:12"`, the same form the rendered HTML
/// carries in its `data-sourcepos` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: LineColumn,
    pub end: LineColumn,
}

impl SourceSpan {
    pub const fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start: LineColumn {
                line: start_line,
                column: start_col,
            },
            end: LineColumn {
                line: end_line,
                column: end_col,
            },
        }
    }

    /// The start position rendered as `"L:C"`.
    pub fn start_label(&self) -> String {
        self.start.to_string()
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Error returned when a span string is not of the form `L:C-L:C`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed source span {0:?}")]
pub struct ParseSpanError(String);

impl FromStr for SourceSpan {
    type Err = ParseSpanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseSpanError(s.to_string());
        let (start, end) = s.split_once('-').ok_or_else(malformed)?;
        let position = |part: &str| -> Option<LineColumn> {
            let (line, column) = part.split_once(':')?;
            Some(LineColumn {
                line: line.trim().parse().ok()?,
                column: column.trim().parse().ok()?,
            })
        };
        Ok(Self {
            start: position(start).ok_or_else(malformed)?,
            end: position(end).ok_or_else(malformed)?,
        })
    }
}

/// Index of a node inside a [`RenderedOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef(pub usize);

/// The visible element a rendered node stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    Paragraph,
    Heading { level: u8 },
    BlockQuote,
    List { ordered: bool, start: usize },
    Item,
    CodeBlock { info: String },
    ThematicBreak,
    Table,
    TableRow { header: bool },
    TableCell { header: bool },
    Emph,
    Strong,
    Strikethrough,
    Code,
    Link { href: String, title: String },
    Image { src: String, title: String },
    LineBreak,
}

impl ElementKind {
    /// HTML tag used when serializing this element.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Paragraph => "p",
            Self::Heading { level } => match level {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            Self::BlockQuote => "blockquote",
            Self::List { ordered: true, .. } => "ol",
            Self::List { ordered: false, .. } => "ul",
            Self::Item => "li",
            Self::CodeBlock { .. } => "pre",
            Self::ThematicBreak => "hr",
            Self::Table => "table",
            Self::TableRow { .. } => "tr",
            Self::TableCell { header: true } => "th",
            Self::TableCell { header: false } => "td",
            Self::Emph => "em",
            Self::Strong => "strong",
            Self::Strikethrough => "del",
            Self::Code => "code",
            Self::Link { .. } => "a",
            Self::Image { .. } => "img",
            Self::LineBreak => "br",
        }
    }

    const fn is_void(&self) -> bool {
        matches!(self, Self::ThematicBreak | Self::Image { .. } | Self::LineBreak)
    }
}

/// A child of a rendered node: either literal text or another node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Text(String),
    Node(NodeRef),
}

/// One element of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedNode {
    pub kind: ElementKind,
    /// Where this element came from; `None` for link anchors and line breaks.
    pub span: Option<SourceSpan>,
    pub parent: Option<NodeRef>,
    pub children: Vec<Content>,
}

/// The rendered preview: a tree of elements in document order.
///
/// Nodes are stored in pre-order, so a node always comes after its
/// ancestors. Replaced wholesale on every render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedOutput {
    pub(crate) nodes: Vec<RenderedNode>,
    pub(crate) roots: Vec<NodeRef>,
}

impl RenderedOutput {
    pub fn nodes(&self) -> &[RenderedNode] {
        &self.nodes
    }

    pub fn roots(&self) -> &[NodeRef] {
        &self.roots
    }

    pub fn node(&self, node: NodeRef) -> Option<&RenderedNode> {
        self.nodes.get(node.0)
    }

    pub fn span_of(&self, node: NodeRef) -> Option<SourceSpan> {
        self.node(node).and_then(|n| n.span)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over `(NodeRef, &RenderedNode)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &RenderedNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeRef(i), n))
    }

    /// Nodes with a span whose start line equals `line`.
    pub fn nodes_starting_at(&self, line: usize) -> impl Iterator<Item = (NodeRef, SourceSpan)> + '_ {
        self.iter().filter_map(move |(node_ref, node)| {
            node.span
                .filter(|span| span.start.line == line)
                .map(|span| (node_ref, span))
        })
    }

    /// The node carrying exactly this span, if any.
    pub fn find_span(&self, span: &SourceSpan) -> Option<NodeRef> {
        self.iter()
            .find(|(_, node)| node.span.as_ref() == Some(span))
            .map(|(node_ref, _)| node_ref)
    }

    /// Text content of a node and all of its descendants, with line
    /// breaks read as spaces.
    pub fn text_of(&self, node: NodeRef) -> String {
        let mut text = String::new();
        self.collect_text(node, &mut text);
        text
    }

    fn collect_text(&self, node: NodeRef, out: &mut String) {
        let Some(n) = self.node(node) else {
            return;
        };
        if n.kind == ElementKind::LineBreak {
            out.push(' ');
            return;
        }
        if let ElementKind::Image { .. } = n.kind {
            return;
        }
        for child in &n.children {
            match child {
                Content::Text(text) => out.push_str(text),
                Content::Node(child) => self.collect_text(*child, out),
            }
        }
    }

    /// Text of the first heading at `level`, in document order.
    pub fn heading_text(&self, level: u8) -> Option<String> {
        self.iter()
            .find(|(_, node)| node.kind == ElementKind::Heading { level })
            .map(|(node_ref, _)| self.text_of(node_ref))
    }

    /// Serialize to HTML, annotating every spanned element with `data-sourcepos`.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for root in &self.roots {
            self.write_html(*root, &mut html);
        }
        html
    }

    fn write_html(&self, node: NodeRef, out: &mut String) {
        let Some(n) = self.node(node) else {
            return;
        };
        let tag = n.kind.tag();
        out.push('<');
        out.push_str(tag);
        if let Some(span) = n.span {
            out.push_str(&format!(" data-sourcepos=\"{span}\""));
        }
        match &n.kind {
            ElementKind::List {
                ordered: true,
                start,
            } if *start != 1 => out.push_str(&format!(" start=\"{start}\"")),
            ElementKind::Link { href, title } => {
                push_attr(out, "href", href);
                if !title.is_empty() {
                    push_attr(out, "title", title);
                }
            }
            ElementKind::Image { src, title } => {
                push_attr(out, "src", src);
                push_attr(out, "alt", &self.image_alt(n));
                if !title.is_empty() {
                    push_attr(out, "title", title);
                }
            }
            _ => {}
        }
        if n.kind.is_void() {
            out.push_str(" />");
            if matches!(n.kind, ElementKind::LineBreak | ElementKind::ThematicBreak) {
                out.push('\n');
            }
            return;
        }
        out.push('>');
        if let ElementKind::CodeBlock { info } = &n.kind {
            out.push_str("<code");
            if let Some(lang) = info.split_whitespace().next() {
                push_attr(out, "class", &format!("language-{lang}"));
            }
            out.push('>');
        }
        for child in &n.children {
            match child {
                Content::Text(text) => escape_into(out, text),
                Content::Node(child) => self.write_html(*child, out),
            }
        }
        if let ElementKind::CodeBlock { .. } = n.kind {
            out.push_str("</code>");
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
        if n.span.is_some() && !is_inline(&n.kind) {
            out.push('\n');
        }
    }

    fn image_alt(&self, image: &RenderedNode) -> String {
        let mut alt = String::new();
        for child in &image.children {
            match child {
                Content::Text(text) => alt.push_str(text),
                Content::Node(child) => self.collect_text(*child, &mut alt),
            }
        }
        alt
    }
}

const fn is_inline(kind: &ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::Emph
            | ElementKind::Strong
            | ElementKind::Strikethrough
            | ElementKind::Code
            | ElementKind::Link { .. }
            | ElementKind::Image { .. }
            | ElementKind::LineBreak
    )
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_into(out, value);
    out.push('"');
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display_matches_sourcepos_format() {
        let span = SourceSpan::new(3, 1, 5, 12);
        assert_eq!(span.to_string(), "3:1-5:12");
        assert_eq!(span.start_label(), "3:1");
    }

    #[test]
    fn test_span_parses_its_own_display() {
        let span: SourceSpan = "2:1-2:10".parse().unwrap();
        assert_eq!(span, SourceSpan::new(2, 1, 2, 10));
    }

    #[test]
    fn test_span_rejects_malformed_input() {
        assert!("2:1".parse::<SourceSpan>().is_err());
        assert!("a:b-c:d".parse::<SourceSpan>().is_err());
        assert!("".parse::<SourceSpan>().is_err());
    }

    #[test]
    fn test_escape_into_escapes_markup() {
        let mut out = String::new();
        escape_into(&mut out, "<a href=\"x\">&</a>");
        assert_eq!(out, "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_heading_tag_clamps_level() {
        assert_eq!(ElementKind::Heading { level: 1 }.tag(), "h1");
        assert_eq!(ElementKind::Heading { level: 9 }.tag(), "h6");
    }
}
