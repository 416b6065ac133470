//! Rendering a parsed document into the span-annotated preview tree.

use comrak::nodes::{AstNode, ListType, NodeValue, Sourcepos};

use super::MarkdownEngine;
use super::parser::ParsedDocument;
use super::types::{Content, ElementKind, LineColumn, NodeRef, RenderedNode, RenderedOutput, SourceSpan};

impl MarkdownEngine {
    /// Render a parsed document. Pure: the same document always yields the
    /// same output, spans included.
    pub fn render(&self, doc: &ParsedDocument<'_>) -> RenderedOutput {
        let mut builder = TreeBuilder::default();
        for child in doc.root.children() {
            builder.visit(child, None);
        }
        builder.output
    }
}

#[derive(Default)]
struct TreeBuilder {
    output: RenderedOutput,
}

impl TreeBuilder {
    fn visit<'a>(&mut self, node: &'a AstNode<'a>, parent: Option<NodeRef>) {
        let ast = node.data.borrow();
        let sourcepos = ast.sourcepos;
        let element = match &ast.value {
            NodeValue::Text(text) => {
                self.push_text(parent, text.to_string());
                return;
            }
            NodeValue::Code(code) => {
                let code_ref = self.open(ElementKind::Code, span_of(sourcepos), parent);
                self.push_text(Some(code_ref), code.literal.to_string());
                return;
            }
            NodeValue::HtmlInline(raw) => {
                self.push_text(parent, raw.to_string());
                return;
            }
            NodeValue::HtmlBlock(block) => {
                let para = self.open(ElementKind::Paragraph, span_of(sourcepos), parent);
                self.push_text(Some(para), block.literal.trim_end_matches('\n').to_string());
                return;
            }
            NodeValue::CodeBlock(block) => {
                let info = block.info.to_string();
                let pre = self.open(ElementKind::CodeBlock { info }, span_of(sourcepos), parent);
                self.push_text(Some(pre), block.literal.to_string());
                return;
            }
            NodeValue::SoftBreak | NodeValue::LineBreak => {
                self.open(ElementKind::LineBreak, None, parent);
                return;
            }
            NodeValue::TaskItem(checked) => {
                let marker = if checked.is_some() { "[x] " } else { "[ ] " };
                let item = self.open(ElementKind::Item, span_of(sourcepos), parent);
                self.push_text(Some(item), marker.to_string());
                Some(item)
            }
            NodeValue::TableCell => {
                let header = parent
                    .and_then(|p| self.output.node(p))
                    .is_some_and(|row| row.kind == ElementKind::TableRow { header: true });
                Some(self.open(ElementKind::TableCell { header }, span_of(sourcepos), parent))
            }
            NodeValue::Link(link) => Some(self.open(
                ElementKind::Link {
                    href: link.url.to_string(),
                    title: link.title.to_string(),
                },
                None,
                parent,
            )),
            value => element_kind(value).map(|kind| self.open(kind, span_of(sourcepos), parent)),
        };
        drop(ast);

        // Containers without an element of their own pass children through.
        let next_parent = element.or(parent);
        for child in node.children() {
            self.visit(child, next_parent);
        }
    }

    fn open(&mut self, kind: ElementKind, span: Option<SourceSpan>, parent: Option<NodeRef>) -> NodeRef {
        let node_ref = NodeRef(self.output.nodes.len());
        self.output.nodes.push(RenderedNode {
            kind,
            span,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.output.nodes[parent.0].children.push(Content::Node(node_ref)),
            None => self.output.roots.push(node_ref),
        }
        node_ref
    }

    fn push_text(&mut self, parent: Option<NodeRef>, text: String) {
        if text.is_empty() {
            return;
        }
        let Some(parent) = parent else {
            // Stray top-level text gets a paragraph so it stays visible.
            let para = self.open(ElementKind::Paragraph, None, None);
            self.output.nodes[para.0].children.push(Content::Text(text));
            return;
        };
        let children = &mut self.output.nodes[parent.0].children;
        if let Some(Content::Text(last)) = children.last_mut() {
            last.push_str(&text);
        } else {
            children.push(Content::Text(text));
        }
    }
}

fn element_kind(value: &NodeValue) -> Option<ElementKind> {
    let kind = match value {
        NodeValue::Paragraph => ElementKind::Paragraph,
        NodeValue::Heading(heading) => ElementKind::Heading {
            level: heading.level,
        },
        NodeValue::BlockQuote => ElementKind::BlockQuote,
        NodeValue::List(list) => ElementKind::List {
            ordered: list.list_type == ListType::Ordered,
            start: list.start,
        },
        NodeValue::Item(_) => ElementKind::Item,
        NodeValue::ThematicBreak => ElementKind::ThematicBreak,
        NodeValue::Table(_) => ElementKind::Table,
        NodeValue::TableRow(header) => ElementKind::TableRow { header: *header },
        NodeValue::Emph => ElementKind::Emph,
        NodeValue::Strong => ElementKind::Strong,
        NodeValue::Strikethrough => ElementKind::Strikethrough,
        NodeValue::Image(link) => ElementKind::Image {
            src: link.url.to_string(),
            title: link.title.to_string(),
        },
        _ => return None,
    };
    Some(kind)
}

/// Spans with a zero line are placeholders comrak leaves on synthesized nodes.
const fn span_of(pos: Sourcepos) -> Option<SourceSpan> {
    if pos.start.line == 0 {
        return None;
    }
    Some(SourceSpan {
        start: LineColumn {
            line: pos.start.line,
            column: pos.start.column,
        },
        end: LineColumn {
            line: pos.end.line,
            column: pos.end.column,
        },
    })
}
