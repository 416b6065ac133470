//! Just enough HTML inspection to classify clipboard fragments.
//!
//! Clipboard HTML is a fragment, often wrapped in an envelope by the
//! platform (`<html><body><!--StartFragment-->...`), so this works on tags
//! and text rather than building a document tree.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|<![^>]*>").expect("comment pattern is valid"));

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?([A-Za-z][A-Za-z0-9-]*)[^>]*>").expect("tag pattern is valid"));

/// An anchor runs to its closing tag, or to the end of an unterminated fragment.
static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\b([^>]*)>(.*?)(?:</a\s*>|$)").expect("anchor pattern is valid")
});

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("href pattern is valid")
});

/// Anchors as they appear in plain-text clipboard payloads.
static LITERAL_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a\s[^>]*?href="([^"]*)"[^>]*>(.*?)</a>"#).expect("literal anchor pattern is valid")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z]+);").expect("entity pattern is valid")
});

/// Tags that wrap a clipboard fragment without being part of it.
const ENVELOPE_TAGS: &[&str] = &["html", "head", "body", "meta"];

/// One `<a>` element from a clipboard fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub href: Option<String>,
}

impl Anchor {
    /// `[text](href)`, or the bare text when there is no href.
    pub fn to_markdown(&self) -> String {
        match &self.href {
            Some(href) => format!("[{}]({href})", self.text),
            None => self.text.clone(),
        }
    }
}

/// What kind of markup a fragment holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentShape {
    /// Every element is an anchor.
    AnchorsOnly(Vec<Anchor>),
    /// Anchors together with other elements.
    Mixed,
    /// No anchors at all.
    NoAnchors,
}

/// Classify a fragment by the elements it contains.
pub fn fragment_shape(html: &str) -> FragmentShape {
    let html = COMMENT.replace_all(html, "");
    let mut has_anchor = false;
    let mut has_other = false;
    for caps in TAG.captures_iter(&html) {
        let name = caps[1].to_ascii_lowercase();
        if name == "a" {
            has_anchor = true;
        } else if !ENVELOPE_TAGS.contains(&name.as_str()) {
            has_other = true;
        }
    }
    match (has_anchor, has_other) {
        (false, _) => FragmentShape::NoAnchors,
        (true, true) => FragmentShape::Mixed,
        (true, false) => FragmentShape::AnchorsOnly(anchors(&html)),
    }
}

/// All anchors of a fragment in order.
pub fn anchors(html: &str) -> Vec<Anchor> {
    ANCHOR
        .captures_iter(html)
        .map(|caps| {
            let href = HREF.captures(&caps[1]).and_then(|h| {
                h.get(1)
                    .or_else(|| h.get(2))
                    .or_else(|| h.get(3))
                    .map(|m| decode_entities(m.as_str()))
            });
            let inner = TAG.replace_all(&caps[2], "");
            Anchor {
                text: collapse_whitespace(&decode_entities(&inner)),
                href,
            }
        })
        .collect()
}

/// Rewrite literal `<a href="URL">TEXT</a>` substrings into `[TEXT](URL)`.
pub fn rewrite_literal_anchors(text: &str) -> String {
    LITERAL_ANCHOR
        .replace_all(text, |caps: &Captures<'_>| format!("[{}]({})", &caps[2], &caps[1]))
        .into_owned()
}

/// Decode named and numeric character references.
///
/// Unknown names and invalid code points are left as written.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => return None,
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Shape ---

    #[test]
    fn test_single_anchor_is_anchors_only() {
        let shape = fragment_shape(r#"<a href="/x">A</a>"#);
        assert_eq!(
            shape,
            FragmentShape::AnchorsOnly(vec![Anchor {
                text: "A".to_string(),
                href: Some("/x".to_string()),
            }])
        );
    }

    #[test]
    fn test_envelope_and_comments_are_ignored() {
        let html = "<html><body>\n<!--StartFragment--><meta charset=\"utf-8\">\
                    <a href='https://example.com/?a=1&amp;b=2'>Example</a><!--EndFragment-->\n</body></html>";
        let FragmentShape::AnchorsOnly(anchors) = fragment_shape(html) else {
            panic!("expected anchors only");
        };
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].href.as_deref(), Some("https://example.com/?a=1&b=2"));
    }

    #[test]
    fn test_anchor_with_sibling_markup_is_mixed() {
        assert_eq!(
            fragment_shape(r#"<p>see <a href="/x">A</a></p>"#),
            FragmentShape::Mixed
        );
        assert_eq!(
            fragment_shape(r#"<a href="/x"><b>A</b></a>"#),
            FragmentShape::Mixed
        );
    }

    #[test]
    fn test_markup_without_anchor() {
        assert_eq!(fragment_shape("<p>plain <b>bold</b></p>"), FragmentShape::NoAnchors);
        assert_eq!(fragment_shape("just text"), FragmentShape::NoAnchors);
    }

    // --- Anchors ---

    #[test]
    fn test_anchor_without_href_renders_bare_text() {
        let anchors = anchors(r#"<a name="top">Top</a> <A HREF=/y>  Why &lt;not&gt;  </A>"#);
        let rendered: Vec<String> = anchors.iter().map(Anchor::to_markdown).collect();
        assert_eq!(rendered, ["Top", "[Why <not>](/y)"]);
    }

    #[test]
    fn test_unterminated_anchor_runs_to_end_of_fragment() {
        let shape = fragment_shape(r#"<a href="/x">A"#);
        assert_eq!(
            shape,
            FragmentShape::AnchorsOnly(vec![Anchor {
                text: "A".to_string(),
                href: Some("/x".to_string()),
            }])
        );
        let anchors = anchors(r#"<a href="/x">A</a> <a href="/y">B"#);
        let rendered: Vec<String> = anchors.iter().map(Anchor::to_markdown).collect();
        assert_eq!(rendered, ["[A](/x)", "[B](/y)"]);
    }

    // --- Plain-text rewrite ---

    #[test]
    fn test_literal_anchor_rewrite() {
        let text = r#"read <a href="https://a.example">this</a> and <a class="x" href="/b">that</a>."#;
        assert_eq!(
            rewrite_literal_anchors(text),
            "read [this](https://a.example) and [that](/b)."
        );
    }

    #[test]
    fn test_literal_rewrite_leaves_other_text() {
        assert_eq!(rewrite_literal_anchors("a < b > c"), "a < b > c");
    }

    // --- Entities ---

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("&amp;&#65;&#x42;&unknown;&#xD800;"), "&AB&unknown;&#xD800;");
    }
}
