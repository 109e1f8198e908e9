//! Caret and selection state for one document.

use weft_dom::{Document, NodeId};

use crate::error::EditorResult;
use crate::range::{BoundaryPoint, Range};

const MARKER_ATTR: &str = "data-weft-marker";

/// The current selection of an editable document.
///
/// Holds at most one [`Range`]. Reads validate the range against the tree,
/// so a selection pointing at removed nodes reads as "no selection".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    range: Option<Range>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current range, if it still fits the tree.
    pub fn get_range(&self, doc: &Document) -> Option<Range> {
        self.range.filter(|r| r.is_valid(doc))
    }

    pub fn set_selection(&mut self, range: Range) {
        tracing::trace!(target: "weft::selection", ?range, "set selection");
        self.range = Some(range);
    }

    pub fn clear(&mut self) {
        self.range = None;
    }

    /// Put the caret right before `node`.
    pub fn set_before(&mut self, doc: &Document, node: NodeId) -> bool {
        match BoundaryPoint::before(doc, node) {
            Some(point) => {
                self.set_selection(Range::collapsed(point));
                true
            }
            None => false,
        }
    }

    /// Put the caret right after `node`.
    pub fn set_after(&mut self, doc: &Document, node: NodeId) -> bool {
        match BoundaryPoint::after(doc, node) {
            Some(point) => {
                self.set_selection(Range::collapsed(point));
                true
            }
            None => false,
        }
    }

    pub fn select_node(&mut self, doc: &Document, node: NodeId) -> bool {
        match Range::around_node(doc, node) {
            Some(range) => {
                self.set_selection(range);
                true
            }
            None => false,
        }
    }

    pub fn select_node_contents(&mut self, doc: &Document, node: NodeId) {
        self.set_selection(Range::node_contents(doc, node));
    }

    /// Insert `node` at the start of the selection.
    pub fn insert_node(&mut self, doc: &mut Document, node: NodeId) -> EditorResult<()> {
        let range = self.get_range(doc).ok_or(crate::EditorError::NoRange)?;
        range.insert_node(doc, node)?;
        Ok(())
    }

    /// Replace the selection with parsed markup and put the caret after it.
    pub fn insert_html(&mut self, doc: &mut Document, html: &str) -> EditorResult<()> {
        let mut range = self.get_range(doc).ok_or(crate::EditorError::NoRange)?;
        range.delete_contents(doc)?;
        let nodes = doc.parse_fragment(html);
        let Some(&first) = nodes.first() else {
            self.set_selection(range);
            return Ok(());
        };
        range.insert_node(doc, first)?;
        let mut last = first;
        for node in nodes.into_iter().skip(1) {
            doc.insert_after(last, node)?;
            last = node;
        }
        self.set_after(doc, last);
        Ok(())
    }

    /// The single node the selection is on.
    ///
    /// If exactly one child of an element is selected that child is returned,
    /// otherwise the deepest node containing the whole selection.
    pub fn get_selected_node(&self, doc: &Document) -> Option<NodeId> {
        let range = self.get_range(doc)?;
        if range.start.node == range.end.node
            && doc.is_element(range.start.node)
            && range.end.offset == range.start.offset + 1
        {
            return doc.child(range.start.node, range.start.offset);
        }
        Some(range.common_ancestor(doc))
    }

    pub fn get_text(&self, doc: &Document) -> String {
        self.get_range(doc)
            .map(|r| r.get_text(doc))
            .unwrap_or_default()
    }

    /// Selection as character offsets from the start of the body.
    pub fn caret_text_offset(&self, doc: &Document) -> Option<(usize, usize)> {
        self.get_range(doc).map(|r| r.text_offsets(doc, doc.body()))
    }

    /// Place the selection at character offsets from the start of the body.
    pub fn set_caret_text_offset(&mut self, doc: &Document, start: usize, end: usize) {
        self.set_selection(Range::from_text_offsets(doc, doc.body(), start, end));
    }

    /// Run `f`, then put the selection back where it logically was.
    ///
    /// Marker elements are placed at both ends of the selection before `f`
    /// runs. Node ids survive moves, so as long as `f` keeps the markers in
    /// the tree the selection follows them. Otherwise it falls back to the
    /// character offsets captured up front.
    pub fn execute_and_restore<T>(
        &mut self,
        doc: &mut Document,
        f: impl FnOnce(&mut Document, &mut Self) -> T,
    ) -> T {
        let Some(range) = self.get_range(doc) else {
            return f(doc, self);
        };
        let offsets = range.text_offsets(doc, doc.body());
        let markers = insert_markers(doc, range);
        let result = f(doc, self);

        let restored = markers.and_then(|(start, end)| {
            let restored = restore_markers(doc, start, end);
            for marker in [start, end] {
                if doc.exists(marker) {
                    doc.remove(marker);
                }
            }
            restored
        });
        match restored {
            Some(range) => self.set_selection(range),
            None => {
                tracing::debug!(
                    target: "weft::selection",
                    ?offsets,
                    "restore markers lost, falling back to text offsets"
                );
                self.set_caret_text_offset(doc, offsets.0, offsets.1);
            }
        }
        result
    }
}

fn insert_markers(doc: &mut Document, range: Range) -> Option<(NodeId, NodeId)> {
    let end = doc.create_element("span");
    let start = doc.create_element("span");
    let placed = (|| -> EditorResult<()> {
        doc.set_attr(end, MARKER_ATTR, "end")?;
        doc.set_attr(start, MARKER_ATTR, "start")?;
        Range::collapsed(range.end).insert_node(doc, end)?;
        Range::collapsed(range.start).insert_node(doc, start)?;
        Ok(())
    })();
    match placed {
        Ok(()) => Some((start, end)),
        Err(err) => {
            tracing::warn!(target: "weft::selection", %err, "could not place restore markers");
            doc.remove(start);
            doc.remove(end);
            None
        }
    }
}

fn restore_markers(doc: &mut Document, start: NodeId, end: NodeId) -> Option<Range> {
    if !(doc.is_connected(start) && doc.is_connected(end)) {
        return None;
    }
    let start_point = remove_marker(doc, start, None)?;
    let mut tracked = Some(start_point);
    let end_point = remove_marker(doc, end, tracked.as_mut())?;
    let start_point = tracked.unwrap_or(start_point);
    Some(Range::new(doc, start_point, end_point))
}

/// Remove a marker and merge the text nodes it separated.
///
/// Returns the point where the marker was. `other` is a point computed
/// earlier that is kept valid across the removal.
fn remove_marker(
    doc: &mut Document,
    marker: NodeId,
    mut other: Option<&mut BoundaryPoint>,
) -> Option<BoundaryPoint> {
    let parent = doc.parent(marker)?;
    let index = doc.index_in_parent(marker)?;
    doc.remove(marker);
    if let Some(p) = other.as_deref_mut() {
        if p.node == parent && p.offset > index {
            p.offset -= 1;
        }
    }

    let prev = index.checked_sub(1).and_then(|i| doc.child(parent, i));
    let next = doc.child(parent, index);
    match (prev.filter(|&n| doc.is_text(n)), next.filter(|&n| doc.is_text(n))) {
        (Some(prev), Some(next)) => {
            let prev_len = doc.merge_text(prev, next).ok()?;
            if let Some(p) = other {
                if p.node == next {
                    *p = BoundaryPoint::new(prev, prev_len + p.offset);
                } else if p.node == parent && p.offset > index {
                    p.offset -= 1;
                }
            }
            Some(BoundaryPoint::new(prev, prev_len))
        }
        (Some(prev), None) => Some(BoundaryPoint::new(prev, doc.text_len(prev))),
        (None, Some(next)) => Some(BoundaryPoint::new(next, 0)),
        (None, None) => Some(BoundaryPoint::new(parent, index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_and_restore_follows_moved_text() {
        let mut doc = Document::parse("abcd");
        let body = doc.body();
        let mut selection = Selection::new();
        selection.set_caret_text_offset(&doc, 1, 3);

        selection.execute_and_restore(&mut doc, |doc, _| {
            let wrapper = doc.create_element("p");
            for child in doc.take_children(body) {
                doc.append_child(wrapper, child).unwrap();
            }
            doc.append_child(body, wrapper).unwrap();
        });

        assert_eq!(doc.inner_html(body), "<p>abcd</p>");
        assert_eq!(selection.get_text(&doc), "bc");
        assert_eq!(selection.caret_text_offset(&doc), Some((1, 3)));
    }

    #[test]
    fn test_execute_and_restore_falls_back_to_offsets() {
        let mut doc = Document::parse("abcd");
        let body = doc.body();
        let mut selection = Selection::new();
        selection.set_caret_text_offset(&doc, 2, 2);

        selection.execute_and_restore(&mut doc, |doc, _| {
            doc.set_inner_html(body, "<b>abcd</b>").unwrap();
        });

        assert_eq!(doc.inner_html(body), "<b>abcd</b>");
        assert_eq!(selection.caret_text_offset(&doc), Some((2, 2)));
    }

    #[test]
    fn test_insert_html_replaces_selection() {
        let mut doc = Document::parse("abcd");
        let mut selection = Selection::new();
        selection.set_caret_text_offset(&doc, 1, 3);
        selection.insert_html(&mut doc, "<i>x</i>y").unwrap();
        assert_eq!(doc.inner_html(doc.body()), "a<i>x</i>yd");
        let range = selection.get_range(&doc).unwrap();
        assert!(range.is_collapsed());
        assert_eq!(selection.caret_text_offset(&doc), Some((3, 3)));
    }

    #[test]
    fn test_selected_node() {
        let doc = Document::parse("a<img src=x>b");
        let mut selection = Selection::new();
        let img = doc.children(doc.body())[1];
        selection.select_node(&doc, img);
        assert_eq!(selection.get_selected_node(&doc), Some(img));
    }
}
