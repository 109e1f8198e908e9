//! HTML serialization.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::node::{NodeId, NodeKind, is_raw_text_element};

impl Document {
    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize `id` itself, including its children.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Replace the children of `id` with the parsed fragment.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> DomResult<()> {
        if !self.is_element(id) {
            return Err(DomError::NotAnElement(id));
        }
        for child in self.take_children(id) {
            self.remove(child);
        }
        for node in self.parse_fragment(html) {
            self.attach(id, None, node);
        }
        Ok(())
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => {
                let raw = self
                    .parent(id)
                    .and_then(|p| self.tag_name(p))
                    .is_some_and(is_raw_text_element);
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&encode_text(text));
                }
            }
            Some(NodeKind::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeKind::Element(el)) => {
                out.push('<');
                out.push_str(&el.name);
                for (key, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if el.is_void() {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn test_escaping() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.create_element("a");
        doc.set_attr(a, "title", r#"say "hi" & bye"#).unwrap();
        let t = doc.create_text("1 < 2 & 3");
        doc.append_child(a, t).unwrap();
        doc.append_child(body, a).unwrap();
        insta::assert_snapshot!(
            doc.inner_html(body),
            @r#"<a title="say &quot;hi&quot; &amp; bye">1 &lt; 2 &amp; 3</a>"#
        );
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let doc = Document::parse("a<br>b<img src=x.png>");
        assert_eq!(doc.inner_html(doc.body()), r#"a<br>b<img src="x.png">"#);
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let mut doc = Document::parse("<div>old</div>");
        let div = doc.first_child(doc.body()).unwrap();
        doc.set_inner_html(div, "<b>new</b>").unwrap();
        assert_eq!(doc.outer_html(div), "<div><b>new</b></div>");
    }
}
