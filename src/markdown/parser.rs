//! Markdown parsing with comrak, plus the private-scheme link pass.

use comrak::nodes::{AstNode, NodeValue};
use comrak::{Arena, Options, parse_document};

use super::MarkdownEngine;

/// A parsed markdown document borrowed from a comrak arena.
///
/// Immutable apart from the single [`MarkdownEngine::rewrite_links`] pass.
#[derive(Clone, Copy)]
pub struct ParsedDocument<'a> {
    pub(crate) root: &'a AstNode<'a>,
}

impl<'a> ParsedDocument<'a> {
    pub const fn root(&self) -> &'a AstNode<'a> {
        self.root
    }
}

impl std::fmt::Debug for ParsedDocument<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedDocument")
            .field("nodes", &self.root.descendants().count())
            .finish()
    }
}

/// Rewrites destinations of the form `scheme://REST` to `prefix/REST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRewrite {
    scheme: String,
    prefix: String,
}

impl LinkRewrite {
    pub fn new(scheme: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The part of `url` after `scheme://`, if it uses the private scheme.
    pub fn strip_scheme<'u>(&self, url: &'u str) -> Option<&'u str> {
        url.strip_prefix(self.scheme.as_str())?.strip_prefix("://")
    }

    /// Rewrite a single destination; `None` if it is not a private-scheme link.
    pub fn rewrite(&self, url: &str) -> Option<String> {
        self.strip_scheme(url)
            .map(|rest| format!("{}/{rest}", self.prefix))
    }
}

impl Default for LinkRewrite {
    fn default() -> Self {
        Self::new("convind", "/page")
    }
}

impl MarkdownEngine {
    /// Parse markdown source into a document allocated in `arena`.
    ///
    /// Never fails: malformed markdown degrades to literal text.
    pub fn parse<'a>(&self, arena: &'a Arena<AstNode<'a>>, source: &str) -> ParsedDocument<'a> {
        let mut options = Options::default();
        configure_options(&mut options);
        ParsedDocument {
            root: parse_document(arena, source, &options),
        }
    }

    /// Rewrite every private-scheme link destination in place.
    ///
    /// Returns the number of links rewritten.
    pub fn rewrite_links(&self, doc: &ParsedDocument<'_>) -> usize {
        let mut rewritten = 0;
        for node in doc.root.descendants() {
            let mut ast = node.data.borrow_mut();
            if let NodeValue::Link(link) = &mut ast.value
                && let Some(url) = self.links.rewrite(&link.url)
            {
                tracing::trace!(from = %link.url, to = %url, "rewrote private link");
                link.url = url;
                rewritten += 1;
            }
        }
        rewritten
    }

    /// Page ids referenced through the private scheme, in document order.
    ///
    /// Must be called before [`Self::rewrite_links`], which removes the scheme.
    pub fn page_links(&self, doc: &ParsedDocument<'_>) -> Vec<String> {
        doc.root
            .descendants()
            .filter_map(|node| match &node.data.borrow().value {
                NodeValue::Link(link) => self.links.strip_scheme(&link.url).map(ToString::to_string),
                _ => None,
            })
            .collect()
    }
}

fn configure_options(options: &mut Options) {
    // GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;

    options.render.sourcepos = true;
    options.render.hardbreaks = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MarkdownEngine {
        MarkdownEngine::new(LinkRewrite::new("scheme", "/path"))
    }

    fn link_urls(doc: &ParsedDocument<'_>) -> Vec<String> {
        doc.root
            .descendants()
            .filter_map(|node| match &node.data.borrow().value {
                NodeValue::Link(link) => Some(link.url.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_rewrite_private_scheme_destination() {
        let engine = engine();
        let arena = Arena::new();
        let doc = engine.parse(&arena, "[x](scheme://abc/def)");
        assert_eq!(engine.rewrite_links(&doc), 1);
        assert_eq!(link_urls(&doc), vec!["/path/abc/def".to_string()]);
    }

    #[test]
    fn test_rewrite_leaves_other_destinations_untouched() {
        let engine = engine();
        let arena = Arena::new();
        let doc = engine.parse(
            &arena,
            "[a](https://example.com) [b](/local) [c](myscheme://x) [d](schemes://y)",
        );
        assert_eq!(engine.rewrite_links(&doc), 0);
        assert_eq!(
            link_urls(&doc),
            vec![
                "https://example.com".to_string(),
                "/local".to_string(),
                "myscheme://x".to_string(),
                "schemes://y".to_string(),
            ]
        );
    }

    #[test]
    fn test_rewrite_preserves_remainder_verbatim() {
        let rewrite = LinkRewrite::new("scheme", "/path/");
        assert_eq!(
            rewrite.rewrite("scheme://a/b?rev=3#top"),
            Some("/path/a/b?rev=3#top".to_string())
        );
        assert_eq!(rewrite.rewrite("scheme:/a"), None);
    }

    #[test]
    fn test_rewrite_reaches_nested_links() {
        let engine = engine();
        let arena = Arena::new();
        let doc = engine.parse(&arena, "> - item with [link](scheme://deep)\n");
        engine.rewrite_links(&doc);
        assert_eq!(link_urls(&doc), vec!["/path/deep".to_string()]);
    }

    #[test]
    fn test_page_links_lists_private_targets_in_order() {
        let engine = engine();
        let arena = Arena::new();
        let doc = engine.parse(
            &arena,
            "[one](scheme://01) and [web](https://x.org)\n\n[two](scheme://02)",
        );
        assert_eq!(engine.page_links(&doc), vec!["01".to_string(), "02".to_string()]);
    }

    #[test]
    fn test_parse_never_fails_on_malformed_input() {
        let engine = engine();
        let arena = Arena::new();
        let doc = engine.parse(&arena, "[unclosed](link\n**bold\n```\nfence");
        assert!(doc.root.descendants().count() > 1);
    }
}
