//! Inline formatting over a range.
//!
//! An [`HtmlApplier`] toggles one [`FormatSpec`] (a set of equivalent tags and
//! an optional class with its class family) over a [`Range`]. Applying wraps
//! every selected text node that is not already formatted. Removing splits
//! formatted ancestors at the range edges and unwraps the selected part.

use regex::Regex;
use smol_str::SmolStr;
use weft_dom::{Document, INVISIBLE_SPACE, NodeId};

use crate::error::EditorResult;
use crate::range::{BoundaryPoint, Range};

/// Tags that mean the same formatting.
const TAG_ALIASES: &[(&str, &str)] = &[("b", "strong"), ("i", "em")];

/// `tag` followed by its alias, if it has one.
pub fn tag_names_with_alias(tag: &str) -> Vec<SmolStr> {
    let tag = tag.to_ascii_lowercase();
    let mut names = vec![SmolStr::new(&tag)];
    for (a, b) in TAG_ALIASES {
        if tag == *a {
            names.push(SmolStr::new(b));
        } else if tag == *b {
            names.push(SmolStr::new(a));
        }
    }
    names
}

/// One formatting concept.
#[derive(Debug, Clone)]
pub struct FormatSpec {
    /// Equivalent tags. The first one is used for new elements.
    pub tag_names: Vec<SmolStr>,
    pub class_name: Option<String>,
    /// Matches every class of the same family as `class_name`.
    pub class_pattern: Option<Regex>,
}

impl FormatSpec {
    /// Spec for a tag and its alias, without classes.
    pub fn tag(tag: &str) -> Self {
        Self {
            tag_names: tag_names_with_alias(tag),
            class_name: None,
            class_pattern: None,
        }
    }

    pub fn with_class(mut self, class_name: impl Into<String>, pattern: Option<Regex>) -> Self {
        self.class_name = Some(class_name.into()).filter(|c: &String| !c.is_empty());
        self.class_pattern = pattern;
        self
    }
}

/// Applies, removes and detects one [`FormatSpec`].
#[derive(Debug, Clone)]
pub struct HtmlApplier {
    spec: FormatSpec,
}

impl HtmlApplier {
    pub fn new(spec: FormatSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    /// Point a cached applier at another class of the same family.
    pub(crate) fn set_class_name(&mut self, class_name: Option<String>) {
        self.spec.class_name = class_name;
    }

    fn has_tag(&self, doc: &Document, node: NodeId) -> bool {
        doc.tag_name(node)
            .is_some_and(|tag| self.spec.tag_names.iter().any(|t| t == tag))
    }

    /// Whether the element carries this spec's class.
    fn has_class(&self, doc: &Document, node: NodeId) -> bool {
        let Some(class_name) = &self.spec.class_name else {
            return true;
        };
        match &self.spec.class_pattern {
            Some(pattern) => pattern
                .find_iter(doc.class_name(node))
                .last()
                .is_some_and(|m| m.as_str() == class_name),
            None => doc.has_class(node, class_name),
        }
    }

    /// Nearest inclusive ancestor formatted with this spec.
    pub fn ancestor_with_class(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        doc.inclusive_ancestors(node)
            .take_while(|&n| n != doc.body())
            .find(|&n| self.has_tag(doc, n) && self.has_class(doc, n))
    }

    /// Replace the class family on `el` with this spec's class.
    fn add_class(&self, doc: &mut Document, el: NodeId) -> EditorResult<()> {
        let Some(class_name) = &self.spec.class_name else {
            return Ok(());
        };
        if let Some(pattern) = &self.spec.class_pattern {
            doc.remove_classes_matching(el, pattern)?;
        }
        doc.add_class(el, class_name)?;
        Ok(())
    }

    /// Strip this spec's class (family) from `el`.
    fn remove_class(&self, doc: &mut Document, el: NodeId) -> EditorResult<()> {
        match (&self.spec.class_pattern, &self.spec.class_name) {
            (Some(pattern), _) => doc.remove_classes_matching(el, pattern)?,
            (None, Some(class_name)) => doc.remove_class(el, class_name)?,
            (None, None) => {}
        }
        Ok(())
    }

    /// Whether `el` can be unwrapped once the class is gone.
    fn is_removable(&self, doc: &Document, el: NodeId) -> bool {
        self.has_tag(doc, el)
            && (self.spec.class_name.is_none() || doc.class_name(el).is_empty())
    }

    fn create_container(&self, doc: &mut Document) -> EditorResult<NodeId> {
        let tag = self
            .spec
            .tag_names
            .first()
            .map(SmolStr::as_str)
            .unwrap_or("span");
        let el = doc.create_element(tag);
        if let Some(class_name) = &self.spec.class_name {
            doc.set_class_name(el, class_name)?;
        }
        Ok(el)
    }

    fn apply_to_text_node(&self, doc: &mut Document, text: NodeId) -> EditorResult<()> {
        let Some(parent) = doc.parent(text) else {
            return Ok(());
        };
        if doc.child_count(parent) == 1 && self.has_tag(doc, parent) {
            self.add_class(doc, parent)?;
        } else {
            let el = self.create_container(doc)?;
            doc.insert_before(text, el)?;
            doc.append_child(el, text)?;
        }
        Ok(())
    }

    /// Formatted ancestors covering the range, or `None` if any part is unformatted.
    pub fn applied_ancestors(&self, doc: &Document, range: &Range) -> Option<Vec<NodeId>> {
        let text_nodes = range.text_nodes(doc);
        if text_nodes.is_empty() {
            return self
                .ancestor_with_class(doc, range.start.node)
                .map(|a| vec![a]);
        }
        let mut ancestors = Vec::new();
        for text in text_nodes {
            let only_placeholder = doc
                .text(text)
                .is_some_and(|t| t.chars().all(|c| c == INVISIBLE_SPACE));
            match self.ancestor_with_class(doc, text) {
                Some(a) => {
                    if !ancestors.contains(&a) {
                        ancestors.push(a);
                    }
                }
                None if only_placeholder => {}
                None => return None,
            }
        }
        (!ancestors.is_empty()).then_some(ancestors)
    }

    pub fn is_applied(&self, doc: &Document, range: &Range) -> bool {
        self.applied_ancestors(doc, range).is_some()
    }

    /// Remove the format if the whole range has it, otherwise apply it.
    pub fn toggle(&self, doc: &mut Document, range: &mut Range) -> EditorResult<()> {
        if self.is_applied(doc, range) {
            self.undo(doc, range)
        } else {
            self.apply(doc, range)
        }
    }

    /// Format every selected character.
    pub fn apply(&self, doc: &mut Document, range: &mut Range) -> EditorResult<()> {
        if range.text_nodes(doc).is_empty() {
            return self.apply_without_text(doc, range);
        }
        range.split_boundaries(doc)?;
        let text_nodes = range.text_nodes(doc);
        let offsets = range.text_offsets(doc, doc.body());
        for &text in &text_nodes {
            if self.ancestor_with_class(doc, text).is_none() {
                self.apply_to_text_node(doc, text)?;
            }
        }
        tracing::trace!(
            target: "weft::applier",
            tags = ?self.spec.tag_names,
            class = ?self.spec.class_name,
            count = text_nodes.len(),
            "applied format"
        );
        self.normalize(doc, &text_nodes, range, offsets);
        Ok(())
    }

    fn apply_without_text(&self, doc: &mut Document, range: &mut Range) -> EditorResult<()> {
        if range.is_collapsed() {
            let el = self.create_container(doc)?;
            let placeholder = doc.create_text(INVISIBLE_SPACE.to_string());
            doc.append_child(el, placeholder)?;
            range.insert_node(doc, el)?;
            *range = Range::collapsed(BoundaryPoint::new(placeholder, 1));
            return Ok(());
        }
        // only elements selected, e.g. an image: wrap them if they share a parent
        if range.start.node == range.end.node && doc.is_element(range.start.node) {
            let parent = range.start.node;
            let end = range.end.offset.min(doc.child_count(parent));
            let start = range.start.offset.min(end);
            let selected: Vec<NodeId> = doc.children(parent)[start..end].to_vec();
            let el = self.create_container(doc)?;
            doc.insert_child(parent, start, el)?;
            for node in selected {
                doc.append_child(el, node)?;
            }
            *range = Range::node_contents(doc, el);
        }
        Ok(())
    }

    /// Remove the format from every selected character.
    pub fn undo(&self, doc: &mut Document, range: &mut Range) -> EditorResult<()> {
        let mut text_nodes = range.text_nodes(doc);
        if text_nodes.is_empty() {
            if let Some(container) = self.placeholder_container(doc, range) {
                if let Some(point) = BoundaryPoint::before(doc, container) {
                    doc.remove(container);
                    *range = Range::collapsed(point);
                    tracing::trace!(target: "weft::applier", "dropped empty caret container");
                    return Ok(());
                }
            }
            let placeholder = doc.create_text(INVISIBLE_SPACE.to_string());
            range.insert_node(doc, placeholder)?;
            text_nodes = vec![placeholder];
        } else {
            range.split_boundaries(doc)?;
            text_nodes = range.text_nodes(doc);
        }
        let offsets = {
            let span = text_span(doc, &text_nodes);
            span.text_offsets(doc, doc.body())
        };

        for &text in &text_nodes {
            if let Some(ancestor) = self.ancestor_with_class(doc, text) {
                let span = text_span(doc, &text_nodes);
                self.undo_to_text_node(doc, &span, ancestor)?;
            }
        }

        if let [only] = text_nodes.as_slice() {
            let only = *only;
            let is_placeholder = doc
                .text(only)
                .is_some_and(|t| t.chars().all(|c| c == INVISIBLE_SPACE));
            if is_placeholder {
                if let Some(after) = BoundaryPoint::after(doc, only) {
                    *range = Range::collapsed(after);
                }
            } else {
                *range = Range::node_contents(doc, only);
            }
        } else {
            self.normalize(doc, &text_nodes, range, offsets);
        }
        tracing::trace!(
            target: "weft::applier",
            tags = ?self.spec.tag_names,
            class = ?self.spec.class_name,
            "removed format"
        );
        Ok(())
    }

    /// The formatted element around a collapsed caret, if it still holds
    /// nothing but invisible spaces (left behind by a collapsed apply).
    fn placeholder_container(&self, doc: &Document, range: &Range) -> Option<NodeId> {
        if !range.is_collapsed() {
            return None;
        }
        let container = self.ancestor_with_class(doc, range.start.node)?;
        let only_placeholders = doc.descendants(container).all(|n| {
            doc.text(n)
                .is_some_and(|t| t.chars().all(|c| c == INVISIBLE_SPACE))
        });
        only_placeholders.then_some(container)
    }

    fn undo_to_text_node(
        &self,
        doc: &mut Document,
        range: &Range,
        ancestor: NodeId,
    ) -> EditorResult<()> {
        let mut ancestor = ancestor;
        if !range.contains_node(doc, ancestor) {
            if doc.contains(ancestor, range.end.node) && is_split_point(doc, range.end) {
                split_node_at(doc, ancestor, range.end)?;
            }
            if doc.contains(ancestor, range.start.node) && is_split_point(doc, range.start) {
                let second = split_node_at(doc, ancestor, range.start)?;
                drop_if_empty(doc, ancestor);
                ancestor = second;
            }
        }
        self.remove_class(doc, ancestor)?;
        if self.is_removable(doc, ancestor) {
            doc.replace_with_child_nodes(ancestor)?;
        }
        Ok(())
    }

    /// Merge formatted siblings and adjacent text, then re-anchor the range.
    fn normalize(
        &self,
        doc: &mut Document,
        text_nodes: &[NodeId],
        range: &mut Range,
        offsets: (usize, usize),
    ) {
        let Some(&first) = text_nodes.first() else {
            return;
        };
        let block = doc.block_ancestor(first);
        self.merge_siblings(doc, block);
        doc.normalize(block);
        *range = Range::from_text_offsets(doc, doc.body(), offsets.0, offsets.1);
    }

    fn merge_siblings(&self, doc: &mut Document, parent: NodeId) {
        let mut index = 0;
        while let Some(child) = doc.child(parent, index) {
            while let Some(next) = doc.child(parent, index + 1) {
                if !self.mergeable(doc, child, next) {
                    break;
                }
                for grandchild in doc.take_children(next) {
                    if doc.append_child(child, grandchild).is_err() {
                        break;
                    }
                }
                doc.remove(next);
            }
            if doc.is_element(child) {
                self.merge_siblings(doc, child);
            }
            index += 1;
        }
    }

    fn mergeable(&self, doc: &Document, a: NodeId, b: NodeId) -> bool {
        if !(self.has_tag(doc, a) && doc.tag_name(a) == doc.tag_name(b)) {
            return false;
        }
        let mut attrs_a = doc.attrs(a).to_vec();
        let mut attrs_b = doc.attrs(b).to_vec();
        attrs_a.sort();
        attrs_b.sort();
        attrs_a == attrs_b
    }
}

/// Range from the start of the first to the end of the last text node.
fn text_span(doc: &Document, text_nodes: &[NodeId]) -> Range {
    match (text_nodes.first(), text_nodes.last()) {
        (Some(&first), Some(&last)) => Range {
            start: BoundaryPoint::new(first, 0),
            end: BoundaryPoint::new(last, doc.text_len(last)),
        },
        _ => Range::collapsed(BoundaryPoint::new(doc.body(), 0)),
    }
}

/// Whether splitting at `point` leaves content on both sides.
fn is_split_point(doc: &Document, point: BoundaryPoint) -> bool {
    if doc.is_text(point.node) {
        if point.offset == 0 {
            return doc.previous_sibling(point.node).is_some();
        }
        if point.offset >= doc.text_len(point.node) {
            return doc.next_sibling(point.node).is_some();
        }
        return true;
    }
    point.offset > 0 && point.offset < doc.child_count(point.node)
}

/// Split `ancestor` at `point`, cloning every element on the way up.
///
/// Returns the new element holding everything after the split point.
fn split_node_at(
    doc: &mut Document,
    ancestor: NodeId,
    point: BoundaryPoint,
) -> EditorResult<NodeId> {
    let mut node = point.node;
    let mut offset = point.offset;
    let mut new_node = None;

    if doc.is_text(node) {
        if offset == 0 {
            offset = doc.index_in_parent(node).unwrap_or(0);
            node = doc.parent(node).unwrap_or(ancestor);
        } else if offset >= doc.text_len(node) {
            offset = doc.index_in_parent(node).map(|i| i + 1).unwrap_or(0);
            node = doc.parent(node).unwrap_or(ancestor);
        } else {
            new_node = Some(doc.split_text(node, offset)?);
        }
    }

    let new_node = match new_node {
        Some(n) => n,
        None => {
            let copy = doc.clone_shallow(node)?;
            doc.remove_attr(copy, "id");
            let moved: Vec<NodeId> = doc.children(node).iter().skip(offset).copied().collect();
            for child in moved {
                doc.append_child(copy, child)?;
            }
            doc.insert_after(node, copy)?;
            copy
        }
    };

    if node == ancestor {
        return Ok(new_node);
    }
    let parent = doc.parent(new_node).unwrap_or(ancestor);
    let index = doc.index_in_parent(new_node).unwrap_or(0);
    split_node_at(doc, ancestor, BoundaryPoint::new(parent, index))
}

fn drop_if_empty(doc: &mut Document, el: NodeId) {
    let empty = doc.is_element(el)
        && doc.text_content(el).is_empty()
        && doc.descendants(el).all(|n| !doc.is_element(n));
    if empty {
        doc.remove(el);
    }
}
