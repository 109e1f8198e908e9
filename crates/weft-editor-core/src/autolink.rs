//! Turning plain-text URLs into links.

use std::sync::LazyLock;

use regex::Regex;
use weft_dom::{Document, NodeId};

use crate::error::EditorResult;

/// URL-like substrings: an `http(s)://` or `www.` prefix and at least three
/// more characters up to whitespace or `<`.
pub static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(https?://|www\.)[^\s<]{3,}").unwrap());

/// A trailing character that is probably sentence punctuation, plus an
/// optional comma after it.
static TRAILING_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_/\-],?$").unwrap());

/// Subtrees that are never linked.
const IGNORED_TAGS: &[&str] = &["code", "pre", "a", "script", "head", "title", "style"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoLinkOptions {
    /// Link text longer than this many chars is cut and gets `...`.
    pub max_display_length: usize,
}

impl Default for AutoLinkOptions {
    fn default() -> Self {
        Self {
            max_display_length: 100,
        }
    }
}

/// One URL found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatch {
    /// Text the URL pattern matched, punctuation included.
    pub matched: String,
    pub href: String,
    pub display: String,
    /// Trailing punctuation that stays outside the link.
    pub punctuation: String,
    /// Byte range of `matched` in the scanned text.
    pub range: std::ops::Range<usize>,
}

fn closing_to_opening(c: &str) -> Option<char> {
    match c {
        ")" => Some('('),
        "]" => Some('['),
        "}" => Some('{'),
        _ => None,
    }
}

/// The `href` for a URL as typed: a `www.` prefix, in any case, gets `http://`.
pub fn href_for(url: &str) -> String {
    let has_www = url
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("www."));
    if has_www {
        format!("http://{url}")
    } else {
        url.to_string()
    }
}

/// Find every URL in `text`.
pub fn find_links(text: &str, options: &AutoLinkOptions) -> Vec<LinkMatch> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| {
            let matched = m.as_str();
            let (mut url, mut punctuation) = match TRAILING_CHAR.find(matched) {
                Some(trail) => (
                    matched[..trail.start()].to_string(),
                    trail.as_str().to_string(),
                ),
                None => (matched.to_string(), String::new()),
            };
            // keep a closing bracket that balances an opening one inside the URL
            if let Some(opening) = closing_to_opening(&punctuation) {
                let opened = url.matches(opening).count();
                let closed = url.matches(punctuation.as_str()).count();
                if opened > closed {
                    url.push_str(&punctuation);
                    punctuation.clear();
                }
            }

            let display = if url.chars().count() > options.max_display_length {
                let cut: String = url.chars().take(options.max_display_length).collect();
                format!("{cut}...")
            } else {
                url.clone()
            };
            let href = href_for(&url);
            LinkMatch {
                matched: matched.to_string(),
                href,
                display,
                punctuation,
                range: m.range(),
            }
        })
        .collect()
}

/// Whether some ancestor of `node` (below the body) is an ignored container.
fn has_ignored_ancestor(doc: &Document, node: NodeId) -> bool {
    doc.ancestors(node)
        .take_while(|&n| n != doc.body())
        .any(|n| doc.has_tag(n, IGNORED_TAGS))
}

/// Link every URL inside `root` with default options. Returns `root`.
pub fn auto_link(doc: &mut Document, root: NodeId) -> EditorResult<NodeId> {
    auto_link_with(doc, root, &AutoLinkOptions::default())
}

/// Link every URL inside `root`. Returns `root`.
pub fn auto_link_with(
    doc: &mut Document,
    root: NodeId,
    options: &AutoLinkOptions,
) -> EditorResult<NodeId> {
    if has_ignored_ancestor(doc, root) {
        tracing::trace!(target: "weft::autolink", "root is inside an ignored container");
        return Ok(root);
    }
    let mut linked = 0;
    link_node(doc, root, options, &mut linked)?;
    if linked > 0 {
        tracing::debug!(target: "weft::autolink", linked, "auto-linked urls");
    }
    Ok(root)
}

fn link_node(
    doc: &mut Document,
    node: NodeId,
    options: &AutoLinkOptions,
    linked: &mut usize,
) -> EditorResult<()> {
    if doc.has_tag(node, IGNORED_TAGS) {
        return Ok(());
    }
    if let Some(text) = doc.text(node) {
        let matches = find_links(text, options);
        if !matches.is_empty() && doc.parent(node).is_some() {
            let text = text.to_string();
            *linked += matches.len();
            wrap_matches(doc, node, &text, &matches)?;
        }
        return Ok(());
    }
    for child in doc.children(node).to_vec() {
        link_node(doc, child, options, linked)?;
    }
    Ok(())
}

/// Replace `node` by text and anchors built from `matches`.
fn wrap_matches(
    doc: &mut Document,
    node: NodeId,
    text: &str,
    matches: &[LinkMatch],
) -> EditorResult<()> {
    let mut pending = String::new();
    let mut cursor = 0;
    for m in matches {
        pending.push_str(&text[cursor..m.range.start]);
        if !pending.is_empty() {
            let before = doc.create_text(std::mem::take(&mut pending));
            doc.insert_before(node, before)?;
        }
        let anchor = doc.create_element("a");
        doc.set_attr(anchor, "href", m.href.as_str())?;
        let label = doc.create_text(m.display.as_str());
        doc.append_child(anchor, label)?;
        doc.insert_before(node, anchor)?;
        pending.push_str(&m.punctuation);
        cursor = m.range.end;
    }
    pending.push_str(&text[cursor..]);
    if !pending.is_empty() {
        let after = doc.create_text(pending);
        doc.insert_before(node, after)?;
    }
    doc.remove(node);
    Ok(())
}
