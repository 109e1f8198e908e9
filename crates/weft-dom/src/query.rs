//! Tree queries and structural helpers shared by the editing commands.

use regex::Regex;

use crate::document::Document;
use crate::error::DomResult;
use crate::node::{INVISIBLE_SPACE, NodeId};

/// Matches elements by tag name and class.
///
/// With a `class_pattern`, an element matches only when the *last* class
/// matching the pattern equals `class_name`. Without a `class_name`, any
/// class matching the pattern is enough.
#[derive(Debug, Clone, Default)]
pub struct ElementFilter {
    pub tag_names: Vec<String>,
    pub class_name: Option<String>,
    pub class_pattern: Option<Regex>,
}

impl ElementFilter {
    pub fn tags(tag_names: &[&str]) -> Self {
        Self {
            tag_names: tag_names.iter().map(|t| t.to_ascii_lowercase()).collect(),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.class_pattern = Some(pattern);
        self
    }

    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(tag) = doc.tag_name(id) else {
            return false;
        };
        if !self.tag_names.is_empty() && !self.tag_names.iter().any(|t| t == tag) {
            return false;
        }
        let class = doc.class_name(id);
        match (&self.class_pattern, &self.class_name) {
            (Some(pattern), Some(name)) => pattern
                .find_iter(class)
                .last()
                .is_some_and(|m| m.as_str() == name),
            (Some(pattern), None) => pattern.is_match(class),
            (None, Some(name)) => doc.has_class(id, name),
            (None, None) => true,
        }
    }
}

impl Document {
    /// Nearest inclusive ancestor of `node` matching `filter`.
    ///
    /// The walk covers at most `levels` nodes, stops at the body and never
    /// returns the body itself.
    pub fn find_parent_element(
        &self,
        node: NodeId,
        filter: &ElementFilter,
        levels: usize,
    ) -> Option<NodeId> {
        self.inclusive_ancestors(node)
            .take(levels)
            .take_while(|&n| n != self.body())
            .find(|&n| filter.matches(self, n))
    }

    /// Nearest inclusive ancestor that is a block element, the body included.
    pub fn block_ancestor(&self, node: NodeId) -> NodeId {
        self.inclusive_ancestors(node)
            .find(|&n| self.is_block(n))
            .unwrap_or_else(|| self.body())
    }

    /// Move all children of `id` to its place and detach it.
    pub fn replace_with_child_nodes(&mut self, id: NodeId) -> DomResult<()> {
        let children = self.take_children(id);
        for child in children {
            self.insert_before(id, child)?;
        }
        self.remove(id);
        Ok(())
    }

    /// Rename an element and return it. Identity, attributes and children are kept.
    pub fn rename_element(&mut self, id: NodeId, name: &str) -> DomResult<NodeId> {
        self.set_tag_name(id, name)?;
        Ok(id)
    }

    /// Whether any descendant of `root` is an element with one of the tags.
    pub fn has_element_with_tag_name(&self, root: NodeId, tags: &[&str]) -> bool {
        self.descendants(root).any(|n| self.has_tag(n, tags))
    }

    /// Whether any descendant of `root` carries a class matching `pattern`.
    pub fn has_element_with_class_name(&self, root: NodeId, pattern: &Regex) -> bool {
        self.descendants(root)
            .any(|n| self.is_element(n) && pattern.is_match(self.class_name(n)))
    }

    /// Remove empty text child nodes of `id`.
    pub fn remove_empty_text_nodes(&mut self, id: NodeId) {
        let empty: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|&c| self.text(c).is_some_and(str::is_empty))
            .collect();
        for node in empty {
            self.remove(node);
        }
    }

    /// Remove every class on `id` matched by `pattern`.
    pub fn remove_classes_matching(&mut self, id: NodeId, pattern: &Regex) -> DomResult<()> {
        let value = pattern.replace_all(self.class_name(id), "").into_owned();
        self.set_class_name(id, &value)
    }

    /// Whether `id` has no visible content: no children, only an invisible
    /// space, or a single `<br>`.
    pub fn is_visually_empty(&self, id: NodeId) -> bool {
        let children = self.children(id);
        match children {
            [] => true,
            [only] => {
                self.is_line_break(*only)
                    || self
                        .text(*only)
                        .is_some_and(|t| t.chars().all(|c| c == INVISIBLE_SPACE))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(doc: &Document) -> NodeId {
        doc.first_child(doc.body()).unwrap()
    }

    #[test]
    fn test_filter_uses_last_pattern_match() {
        let doc = Document::parse(
            r#"<span class="wysiwyg-color-red wysiwyg-color-blue">x</span>"#,
        );
        let span = first(&doc);
        let pattern = Regex::new("wysiwyg-color-[0-9a-z]+").unwrap();
        let blue = ElementFilter::tags(&["span"])
            .with_class("wysiwyg-color-blue")
            .with_pattern(pattern.clone());
        let red = ElementFilter::tags(&["span"])
            .with_class("wysiwyg-color-red")
            .with_pattern(pattern.clone());
        let any = ElementFilter::tags(&["span"]).with_pattern(pattern);
        assert!(blue.matches(&doc, span));
        assert!(!red.matches(&doc, span));
        assert!(any.matches(&doc, span));
    }

    #[test]
    fn test_find_parent_element_respects_depth_and_body() {
        let doc = Document::parse("<ul><li><b>x</b></li></ul>");
        let text = doc.text_nodes(doc.body())[0];
        let lists = ElementFilter::tags(&["ul", "ol"]);
        assert_eq!(doc.find_parent_element(text, &lists, 2), None);
        assert_eq!(doc.find_parent_element(text, &lists, 4), Some(first(&doc)));
        let body = ElementFilter::tags(&["body"]);
        assert_eq!(doc.find_parent_element(text, &body, 50), None);
    }

    #[test]
    fn test_replace_with_child_nodes() {
        let mut doc = Document::parse("a<span>b<i>c</i></span>d");
        let span = doc.children(doc.body())[1];
        doc.replace_with_child_nodes(span).unwrap();
        assert_eq!(doc.inner_html(doc.body()), "ab<i>c</i>d");
        assert!(!doc.exists(span));
    }

    #[test]
    fn test_visually_empty() {
        let doc = Document::parse("<p></p><p><br></p><p>\u{FEFF}</p><p>x</p>");
        let ps = doc.children(doc.body()).to_vec();
        let empty: Vec<bool> = ps.iter().map(|&p| doc.is_visually_empty(p)).collect();
        assert_eq!(empty, vec![true, true, true, false]);
    }

    #[test]
    fn test_remove_classes_matching() {
        let mut doc = Document::parse(r#"<p class="keep wysiwyg-text-align-left">x</p>"#);
        let p = first(&doc);
        let pattern = Regex::new("wysiwyg-text-align-[0-9a-z]+").unwrap();
        doc.remove_classes_matching(p, &pattern).unwrap();
        assert_eq!(doc.class_name(p), "keep");
    }
}
