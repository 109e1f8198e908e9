//! The arena-backed document tree.
//!
//! Nodes live in a [`SlotMap`] keyed by [`NodeId`]. Parent and child links are
//! stored on each node. Detached nodes stay in the arena until they are
//! [`remove`](Document::remove)d, so ids handed out to callers survive moves.

use std::cmp::Ordering;

use slotmap::SlotMap;
use smol_str::SmolStr;

use crate::error::{DomError, DomResult};
use crate::node::{ElementData, NodeData, NodeKind, NodeId, is_block_element};

/// A DOM-like tree rooted at a `body` element.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: SlotMap<NodeId, NodeData>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an empty body.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(NodeData::new(NodeKind::Element(ElementData::new("body"))));
        Self { nodes, body }
    }

    /// Create a document whose body holds the parsed fragment.
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        let fragment = doc.parse_fragment(html);
        let body = doc.body;
        for node in fragment {
            doc.attach(body, None, node);
        }
        doc
    }

    /// The root `body` element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Whether `id` refers to a live node.
    pub fn exists(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // === Creation ===

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.nodes
            .insert(NodeData::new(NodeKind::Element(ElementData::new(name))))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.nodes.insert(NodeData::new(NodeKind::Text(text.into())))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.nodes
            .insert(NodeData::new(NodeKind::Comment(text.into())))
    }

    // === Inspection ===

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id)? {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        match self.nodes.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::InvalidNode(id)),
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    /// Whether `id` is an element whose tag is one of `names` (case-insensitive).
    pub fn has_tag(&self, id: NodeId, names: &[&str]) -> bool {
        self.tag_name(id)
            .is_some_and(|tag| names.iter().any(|n| n.eq_ignore_ascii_case(tag)))
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        self.tag_name(id).is_some_and(is_block_element)
    }

    pub fn is_line_break(&self, id: NodeId) -> bool {
        self.tag_name(id) == Some("br")
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Children of `id`; empty for leaves and invalid ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.child(parent, index + 1)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    /// DOM node length: chars for character data, child count for elements.
    pub fn node_length(&self, id: NodeId) -> usize {
        match self.kind(id) {
            Some(NodeKind::Text(t)) | Some(NodeKind::Comment(t)) => t.chars().count(),
            Some(NodeKind::Element(_)) => self.child_count(id),
            None => 0,
        }
    }

    /// Ancestors of `id`, nearest first, not including `id`.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// `id` followed by its ancestors.
    pub fn inclusive_ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.exists(id).then_some(id),
        }
    }

    /// Descendants of `id` in tree order, not including `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Text node descendants of `id` in tree order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id).filter(|&n| self.is_text(n)).collect()
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inclusive_ancestors(node).any(|a| a == ancestor)
    }

    /// Topmost ancestor of `id` (the body for attached nodes).
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.inclusive_ancestors(id).last().unwrap_or(id)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.exists(id) && self.root_of(id) == self.body
    }

    /// Child-index path from the root of `id`'s tree down to `id`.
    pub fn tree_path(&self, id: NodeId) -> Vec<usize> {
        let mut path: Vec<usize> = self
            .inclusive_ancestors(id)
            .filter_map(|n| self.index_in_parent(n))
            .collect();
        path.reverse();
        path
    }

    /// Compare two nodes in document order. Ancestors sort before descendants.
    pub fn tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.tree_path(a).cmp(&self.tree_path(b))
    }

    // === Mutation ===

    /// Link a detached node under `parent` without validation.
    ///
    /// Only used for nodes this crate just created.
    pub(crate) fn attach(&mut self, parent: NodeId, index: Option<usize>, child: NodeId) {
        if let Some(data) = self.nodes.get_mut(parent) {
            match index {
                Some(i) if i < data.children.len() => data.children.insert(i, child),
                _ => data.children.push(child),
            }
        }
        if let Some(data) = self.nodes.get_mut(child) {
            data.parent = Some(parent);
        }
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if !self.exists(parent) {
            return Err(DomError::InvalidNode(parent));
        }
        if !self.exists(child) {
            return Err(DomError::InvalidNode(child));
        }
        if !self.is_element(parent) {
            return Err(DomError::HierarchyRequest("parent is not an element"));
        }
        if child == self.body {
            return Err(DomError::HierarchyRequest("body cannot be moved"));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest("node would become its own ancestor"));
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.attach(parent, None, child);
        Ok(())
    }

    /// Insert `child` at `index` among `parent`'s children.
    ///
    /// The index is interpreted after `child` has been detached, which matters
    /// when moving a node within the same parent.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.detach(child);
        let len = self.child_count(parent);
        if index > len {
            return Err(DomError::OffsetOutOfBounds { offset: index, len });
        }
        self.attach(parent, Some(index), child);
        Ok(())
    }

    /// Insert `node` immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> DomResult<()> {
        if reference == node {
            return Ok(());
        }
        let parent = self.parent(reference).ok_or(DomError::NoParent(reference))?;
        self.check_insert(parent, node)?;
        self.detach(node);
        let index = self
            .index_in_parent(reference)
            .ok_or(DomError::NoParent(reference))?;
        self.attach(parent, Some(index), node);
        Ok(())
    }

    /// Insert `node` immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> DomResult<()> {
        if reference == node {
            return Ok(());
        }
        let parent = self.parent(reference).ok_or(DomError::NoParent(reference))?;
        self.check_insert(parent, node)?;
        self.detach(node);
        let index = self
            .index_in_parent(reference)
            .ok_or(DomError::NoParent(reference))?;
        self.attach(parent, Some(index + 1), node);
        Ok(())
    }

    /// Unlink `id` from its parent. The subtree stays alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(data) = self.nodes.get_mut(parent) {
            data.children.retain(|&c| c != id);
        }
        if let Some(data) = self.nodes.get_mut(id) {
            data.parent = None;
        }
    }

    /// Unlink `id` and free it together with its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.body {
            tracing::warn!(target: "weft::dom", "refusing to remove the body element");
            return;
        }
        self.detach(id);
        let doomed: Vec<NodeId> = self.descendants(id).collect();
        for node in doomed {
            self.nodes.remove(node);
        }
        self.nodes.remove(id);
    }

    /// Put `new` where `old` is and detach `old`.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> DomResult<()> {
        if old == new {
            return Ok(());
        }
        self.insert_before(old, new)?;
        self.detach(old);
        Ok(())
    }

    /// Detach and return all children of `id`.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = match self.nodes.get_mut(id) {
            Some(data) => std::mem::take(&mut data.children),
            None => return Vec::new(),
        };
        for &child in &children {
            if let Some(data) = self.nodes.get_mut(child) {
                data.parent = None;
            }
        }
        children
    }

    /// Copy of `id` without its children.
    pub fn clone_shallow(&mut self, id: NodeId) -> DomResult<NodeId> {
        let kind = self.kind(id).ok_or(DomError::InvalidNode(id))?.clone();
        Ok(self.nodes.insert(NodeData::new(kind)))
    }

    /// Copy of `id` including its whole subtree.
    pub fn clone_deep(&mut self, id: NodeId) -> DomResult<NodeId> {
        let copy = self.clone_shallow(id)?;
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.clone_deep(child)?;
            self.attach(copy, None, child_copy);
        }
        Ok(copy)
    }

    // === Attributes ===

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn attrs(&self, id: NodeId) -> &[(SmolStr, String)] {
        self.element(id)
            .map(|el| el.attrs.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> DomResult<()> {
        self.element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id).ok()?.remove_attr(name)
    }

    /// Change an element's tag name in place. Attributes, children and the id are kept.
    pub fn set_tag_name(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        self.element_mut(id)?.name = SmolStr::new(name.to_ascii_lowercase());
        Ok(())
    }

    /// The raw `class` attribute, or `""`.
    pub fn class_name(&self, id: NodeId) -> &str {
        self.attr(id, "class").unwrap_or("")
    }

    /// Set the `class` attribute, dropping it when the value is blank.
    pub fn set_class_name(&mut self, id: NodeId, value: &str) -> DomResult<()> {
        let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            self.element_mut(id)?.remove_attr("class");
            Ok(())
        } else {
            self.set_attr(id, "class", normalized)
        }
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.class_name(id).split_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let value = format!("{} {}", self.class_name(id), class);
        self.set_class_name(id, &value)
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        let value = self
            .classes(id)
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_class_name(id, &value)
    }

    // === Text ===

    /// Data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Length of a text node in chars.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map(|t| t.chars().count()).unwrap_or(0)
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> DomResult<()> {
        match self.nodes.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Text(t)) => {
                *t = text.into();
                Ok(())
            }
            Some(_) => Err(DomError::NotText(id)),
            None => Err(DomError::InvalidNode(id)),
        }
    }

    /// Concatenated data of all text descendants (or the node itself).
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            Some(NodeKind::Text(t)) | Some(NodeKind::Comment(t)) => t.clone(),
            Some(NodeKind::Element(_)) => self
                .descendants(id)
                .filter_map(|n| self.text(n))
                .collect(),
            None => String::new(),
        }
    }

    /// Replace the children of an element by a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        if self.is_text(id) {
            return self.set_text(id, text);
        }
        self.element_mut(id)?;
        for child in self.take_children(id) {
            self.remove(child);
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.attach(id, None, node);
        }
        Ok(())
    }

    /// Split a text node at a char offset.
    ///
    /// The original node keeps the head, the returned node holds the tail and
    /// is inserted right after it (if the original is attached).
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> DomResult<NodeId> {
        let text = self.text(id).ok_or(DomError::NotText(id))?;
        let len = text.chars().count();
        if offset > len {
            return Err(DomError::OffsetOutOfBounds { offset, len });
        }
        let byte = char_to_byte(text, offset);
        let tail = text[byte..].to_string();
        let head = text[..byte].to_string();
        self.set_text(id, head)?;
        let new_node = self.create_text(tail);
        if let Some(parent) = self.parent(id) {
            let index = self.index_in_parent(id).unwrap_or(0);
            self.attach(parent, Some(index + 1), new_node);
        }
        tracing::trace!(target: "weft::dom", ?id, offset, ?new_node, "split text node");
        Ok(new_node)
    }

    /// Append the data of `next` to `text` and remove `next`.
    ///
    /// Returns the char length of `text` before the merge.
    pub fn merge_text(&mut self, text: NodeId, next: NodeId) -> DomResult<usize> {
        let head_len = self.text_len(text);
        let tail = self.text(next).ok_or(DomError::NotText(next))?.to_string();
        let mut merged = self.text(text).ok_or(DomError::NotText(text))?.to_string();
        merged.push_str(&tail);
        self.set_text(text, merged)?;
        self.remove(next);
        Ok(head_len)
    }

    /// Merge adjacent text nodes and drop empty ones below `id`.
    pub fn normalize(&mut self, id: NodeId) {
        let mut index = 0;
        while let Some(child) = self.child(id, index) {
            if self.is_text(child) {
                if self.text_len(child) == 0 {
                    self.remove(child);
                    continue;
                }
                while let Some(next) = self.child(id, index + 1) {
                    if !self.is_text(next) {
                        break;
                    }
                    if self.merge_text(child, next).is_err() {
                        break;
                    }
                }
            } else {
                self.normalize(child);
            }
            index += 1;
        }
    }
}

/// Convert a char offset into a byte offset, clamped to the string length.
pub fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// Iterator over ancestors of a node.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_navigate() {
        let mut doc = Document::new();
        let body = doc.body();
        let p = doc.create_element("P");
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        doc.append_child(body, p).unwrap();
        doc.append_child(p, a).unwrap();
        doc.append_child(p, b).unwrap();

        assert_eq!(doc.tag_name(p), Some("p"));
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.previous_sibling(b), Some(a));
        assert_eq!(doc.index_in_parent(b), Some(1));
        assert!(doc.contains(body, b));
        assert!(doc.is_connected(b));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();
        assert!(matches!(
            doc.append_child(inner, outer),
            Err(DomError::HierarchyRequest(_))
        ));
    }

    #[test]
    fn test_split_and_merge_text() {
        let mut doc = Document::parse("héllo");
        let text = doc.first_child(doc.body()).unwrap();
        let tail = doc.split_text(text, 2).unwrap();
        assert_eq!(doc.text(text), Some("hé"));
        assert_eq!(doc.text(tail), Some("llo"));
        assert_eq!(doc.child_count(doc.body()), 2);

        let head_len = doc.merge_text(text, tail).unwrap();
        assert_eq!(head_len, 2);
        assert_eq!(doc.text(text), Some("héllo"));
        assert!(!doc.exists(tail));
    }

    #[test]
    fn test_tree_order() {
        let doc = Document::parse("<p>a<b>b</b></p><p>c</p>");
        let body = doc.body();
        let texts = doc.text_nodes(body);
        assert_eq!(texts.len(), 3);
        assert_eq!(doc.tree_order(texts[0], texts[1]), Ordering::Less);
        assert_eq!(doc.tree_order(texts[2], texts[1]), Ordering::Greater);
        let first_p = doc.first_child(body).unwrap();
        assert_eq!(doc.tree_order(first_p, texts[0]), Ordering::Less);
    }

    #[test]
    fn test_class_helpers() {
        let mut doc = Document::parse(r#"<span class="a  b">x</span>"#);
        let span = doc.first_child(doc.body()).unwrap();
        assert!(doc.has_class(span, "b"));
        doc.add_class(span, "c").unwrap();
        assert_eq!(doc.class_name(span), "a b c");
        doc.remove_class(span, "a").unwrap();
        doc.remove_class(span, "b").unwrap();
        doc.remove_class(span, "c").unwrap();
        assert_eq!(doc.attr(span, "class"), None);
    }

    #[test]
    fn test_normalize_merges_text() {
        let mut doc = Document::new();
        let body = doc.body();
        for part in ["a", "", "b"] {
            let t = doc.create_text(part);
            doc.append_child(body, t).unwrap();
        }
        doc.normalize(body);
        assert_eq!(doc.child_count(body), 1);
        assert_eq!(doc.text_content(body), "ab");
    }
}
