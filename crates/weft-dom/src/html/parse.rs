//! HTML fragment parsing.
//!
//! html5ever does the tree building, in the context of a `body` element, so
//! implied end tags, misnested formatting and raw text all follow the HTML
//! parsing rules. The resulting reference-counted tree is then copied into the
//! document's arena.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, QualName, local_name, namespace_url, ns};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::document::Document;
use crate::node::NodeId;

impl Document {
    /// Parse an HTML fragment into detached nodes owned by this document.
    ///
    /// Returns the top-level nodes in order. They are not attached anywhere.
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let context = QualName::new(None, ns!(html), local_name!("body"));
        let dom = html5ever::parse_fragment(
            RcDom::default(),
            ParseOpts::default(),
            context,
            Vec::new(),
        )
        .one(html);
        if !dom.errors.is_empty() {
            tracing::trace!(
                target: "weft::dom",
                errors = dom.errors.len(),
                "recovered from malformed html"
            );
        }

        // the fragment lands under a synthetic `html` element
        let root = dom.document.children.borrow().first().cloned();
        let Some(root) = root else {
            return Vec::new();
        };
        let children = root.children.borrow();
        children
            .iter()
            .filter_map(|child| self.import(child))
            .collect()
    }

    /// Copy a parsed node and its subtree into the arena, detached.
    fn import(&mut self, handle: &Handle) -> Option<NodeId> {
        let id = match &handle.data {
            NodeData::Text { contents } => {
                return Some(self.create_text(contents.borrow().to_string()));
            }
            NodeData::Comment { contents } => {
                return Some(self.create_comment(contents.to_string()));
            }
            NodeData::Element { name, attrs, .. } => {
                let element = self.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    // first occurrence of an attribute wins
                    if self.attr(element, &attr.name.local).is_none() {
                        let _ = self.set_attr(element, &attr.name.local, attr.value.to_string());
                    }
                }
                element
            }
            NodeData::Document
            | NodeData::Doctype { .. }
            | NodeData::ProcessingInstruction { .. } => return None,
        };
        for child in handle.children.borrow().iter() {
            if let Some(child) = self.import(child) {
                self.attach(id, None, child);
            }
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn test_implied_li_end() {
        let doc = Document::parse("<ul><li>one<li>two</ul>");
        assert_eq!(doc.inner_html(doc.body()), "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn test_nested_list_keeps_outer_li_open() {
        let doc = Document::parse("<ul><li>a<ul><li>b<li>c</ul></li></ul>");
        assert_eq!(
            doc.inner_html(doc.body()),
            "<ul><li>a<ul><li>b</li><li>c</li></ul></li></ul>"
        );
    }

    #[test]
    fn test_paragraph_closed_by_block() {
        let doc = Document::parse("<p>a<div>b</div>");
        assert_eq!(doc.inner_html(doc.body()), "<p>a</p><div>b</div>");
    }

    #[test]
    fn test_misnested_formatting_is_reopened() {
        let doc = Document::parse("<p><b>x<div>y</div></b>");
        assert_eq!(
            doc.inner_html(doc.body()),
            "<p><b>x</b></p><div><b>y</b></div>"
        );
    }

    #[test]
    fn test_crossed_end_tags() {
        let doc = Document::parse("<b>1<i>2</b>3</i>");
        assert_eq!(doc.inner_html(doc.body()), "<b>1<i>2</i></b><i>3</i>");
    }

    #[test]
    fn test_attributes_and_entities() {
        let doc = Document::parse(r#"<a href='x?a=1&amp;b=2' data-x=y hidden>&lt;ok&gt;</a>"#);
        let a = doc.first_child(doc.body()).unwrap();
        assert_eq!(doc.attr(a, "href"), Some("x?a=1&b=2"));
        assert_eq!(doc.attr(a, "data-x"), Some("y"));
        assert_eq!(doc.attr(a, "hidden"), Some(""));
        assert_eq!(doc.text_content(a), "<ok>");
    }

    #[test]
    fn test_duplicate_attribute_keeps_first() {
        let doc = Document::parse(r#"<span class="a" class="b">x</span>"#);
        let span = doc.first_child(doc.body()).unwrap();
        assert_eq!(doc.attr(span, "class"), Some("a"));
    }

    #[test]
    fn test_raw_text_and_comments() {
        let doc = Document::parse("<script>if (a < b) {}</script><!-- note -->x");
        assert_eq!(
            doc.inner_html(doc.body()),
            "<script>if (a < b) {}</script><!-- note -->x"
        );
    }

    #[test]
    fn test_stray_end_tag_and_lone_lt() {
        let doc = Document::parse("a < b</span>c");
        assert_eq!(doc.text_content(doc.body()), "a < bc");
    }

    #[test]
    fn test_document_level_tags_are_dropped() {
        let doc = Document::parse("<html><body><p>x</p></body></html>");
        assert_eq!(doc.inner_html(doc.body()), "<p>x</p>");
    }

    #[test]
    fn test_fragment_nodes_are_detached() {
        let mut doc = Document::new();
        let nodes = doc.parse_fragment("a<b>b</b>");
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|&n| doc.parent(n).is_none()));
        assert_eq!(doc.child_count(doc.body()), 0);
    }
}
