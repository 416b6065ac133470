//! Markdown parsing and rendering.
//!
//! This module handles:
//! - Parsing markdown with comrak
//! - Rewriting private-scheme links (`convind://ID`) to internal paths
//! - Rendering to a preview tree whose elements remember their source span

mod parser;
mod render;
mod types;

pub use comrak::Arena;
pub use parser::{LinkRewrite, ParsedDocument};
pub use types::{
    Content, ElementKind, LineColumn, NodeRef, ParseSpanError, RenderedNode, RenderedOutput,
    SourceSpan,
};

/// Parses, link-rewrites and renders markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownEngine {
    links: LinkRewrite,
}

impl MarkdownEngine {
    pub const fn new(links: LinkRewrite) -> Self {
        Self { links }
    }

    pub const fn links(&self) -> &LinkRewrite {
        &self.links
    }

    /// Parse, rewrite links once, and render.
    ///
    /// # Example
    ///
    /// ```
    /// use convind_editor::markdown::{ElementKind, LinkRewrite, MarkdownEngine};
    ///
    /// let engine = MarkdownEngine::new(LinkRewrite::new("convind", "/page"));
    /// let output = engine.render_source("# Hello\n\n[next](convind://42)");
    /// assert_eq!(output.heading_text(1).as_deref(), Some("Hello"));
    /// assert!(output.to_html().contains("href=\"/page/42\""));
    /// ```
    pub fn render_source(&self, source: &str) -> RenderedOutput {
        let arena = Arena::new();
        let doc = self.parse(&arena, source);
        self.rewrite_links(&doc);
        self.render(&doc)
    }
}
