//! DOM ranges over a [`Document`].
//!
//! A [`Range`] is a pair of boundary points. Inside a text node the offset is
//! a char offset, inside an element it is a child index. Comparison follows
//! the DOM boundary-point ordering.

use std::cmp::Ordering;

use weft_dom::{Document, DomResult, NodeId};

/// One end of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Point immediately before `node` in its parent.
    pub fn before(doc: &Document, node: NodeId) -> Option<Self> {
        let parent = doc.parent(node)?;
        Some(Self::new(parent, doc.index_in_parent(node)?))
    }

    /// Point immediately after `node` in its parent.
    pub fn after(doc: &Document, node: NodeId) -> Option<Self> {
        let parent = doc.parent(node)?;
        Some(Self::new(parent, doc.index_in_parent(node)? + 1))
    }

    /// Order two points in the document.
    pub fn compare(doc: &Document, a: Self, b: Self) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }
        if doc.contains(a.node, b.node) {
            // child of a.node on the path to b.node
            let child = doc
                .inclusive_ancestors(b.node)
                .find(|&n| doc.parent(n) == Some(a.node));
            let index = child.and_then(|c| doc.index_in_parent(c)).unwrap_or(0);
            return if index < a.offset {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        if doc.contains(b.node, a.node) {
            return Self::compare(doc, b, a).reverse();
        }
        doc.tree_order(a.node, b.node)
    }
}

/// A start/end pair of boundary points with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Range {
    /// Build a range, swapping the points if they are out of order.
    pub fn new(doc: &Document, a: BoundaryPoint, b: BoundaryPoint) -> Self {
        if BoundaryPoint::compare(doc, a, b) == Ordering::Greater {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn collapsed(point: BoundaryPoint) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Range around `node` itself.
    pub fn around_node(doc: &Document, node: NodeId) -> Option<Self> {
        Some(Self {
            start: BoundaryPoint::before(doc, node)?,
            end: BoundaryPoint::after(doc, node)?,
        })
    }

    /// Range over the contents of `node`.
    pub fn node_contents(doc: &Document, node: NodeId) -> Self {
        Self {
            start: BoundaryPoint::new(node, 0),
            end: BoundaryPoint::new(node, doc.node_length(node)),
        }
    }

    /// Whether both ends still point into the live tree.
    pub fn is_valid(&self, doc: &Document) -> bool {
        let fits = |p: BoundaryPoint| doc.exists(p.node) && p.offset <= doc.node_length(p.node);
        fits(self.start) && fits(self.end)
    }

    /// Deepest node containing both ends.
    pub fn common_ancestor(&self, doc: &Document) -> NodeId {
        doc.inclusive_ancestors(self.start.node)
            .find(|&a| doc.contains(a, self.end.node))
            .unwrap_or_else(|| doc.body())
    }

    /// Whether `node` lies entirely inside the range.
    pub fn contains_node(&self, doc: &Document, node: NodeId) -> bool {
        let (Some(before), Some(after)) = (
            BoundaryPoint::before(doc, node),
            BoundaryPoint::after(doc, node),
        ) else {
            return false;
        };
        BoundaryPoint::compare(doc, self.start, before) != Ordering::Greater
            && BoundaryPoint::compare(doc, after, self.end) != Ordering::Greater
    }

    /// Whether the range and `node` overlap.
    ///
    /// For a collapsed range this is true for every ancestor of the caret.
    pub fn intersects_node(&self, doc: &Document, node: NodeId) -> bool {
        let (Some(before), Some(after)) = (
            BoundaryPoint::before(doc, node),
            BoundaryPoint::after(doc, node),
        ) else {
            return doc.contains(node, self.start.node);
        };
        BoundaryPoint::compare(doc, self.start, after) == Ordering::Less
            && BoundaryPoint::compare(doc, before, self.end) == Ordering::Less
    }

    /// Text nodes with at least one selected character, in tree order.
    pub fn text_nodes(&self, doc: &Document) -> Vec<NodeId> {
        if self.is_collapsed() {
            return Vec::new();
        }
        let root = self.common_ancestor(doc);
        std::iter::once(root)
            .chain(doc.descendants(root))
            .filter(|&n| doc.is_text(n))
            .filter(|&n| {
                let len = doc.text_len(n);
                BoundaryPoint::compare(doc, self.start, BoundaryPoint::new(n, len))
                    == Ordering::Less
                    && BoundaryPoint::compare(doc, BoundaryPoint::new(n, 0), self.end)
                        == Ordering::Less
            })
            .collect()
    }

    /// Elements overlapping the range that satisfy `pred`, outermost first.
    pub fn intersecting_elements(
        &self,
        doc: &Document,
        pred: impl Fn(&Document, NodeId) -> bool,
    ) -> Vec<NodeId> {
        let root = self.common_ancestor(doc);
        let mut ancestors: Vec<NodeId> = doc
            .inclusive_ancestors(root)
            .filter(|&n| n != doc.body())
            .collect();
        ancestors.reverse();
        let mut found: Vec<NodeId> = ancestors
            .into_iter()
            .filter(|&n| doc.is_element(n) && pred(doc, n))
            .collect();
        if !self.is_collapsed() {
            found.extend(
                doc.descendants(root)
                    .filter(|&n| doc.is_element(n) && pred(doc, n))
                    .filter(|&n| self.intersects_node(doc, n)),
            );
        }
        found
    }

    /// Split partially selected text nodes so every selected character lives in
    /// a fully selected text node.
    pub fn split_boundaries(&mut self, doc: &mut Document) -> DomResult<()> {
        let end = self.end;
        let end_len = doc.text_len(end.node);
        if doc.is_text(end.node) && end.offset > 0 && end.offset < end_len {
            doc.split_text(end.node, end.offset)?;
        }
        let start = self.start;
        let start_len = doc.text_len(start.node);
        if doc.is_text(start.node) && start.offset > 0 && start.offset < start_len {
            let parent = doc.parent(start.node);
            let index = doc.index_in_parent(start.node);
            let tail = doc.split_text(start.node, start.offset)?;
            if self.end.node == start.node {
                self.end = BoundaryPoint::new(tail, self.end.offset - start.offset);
            } else if Some(self.end.node) == parent && index.is_some_and(|i| self.end.offset > i) {
                // the tail was inserted before the end point
                self.end.offset += 1;
            }
            self.start = BoundaryPoint::new(tail, 0);
        }
        Ok(())
    }

    /// Insert `node` at the start of the range, splitting a text node if needed.
    pub fn insert_node(&self, doc: &mut Document, node: NodeId) -> DomResult<()> {
        let point = self.start;
        if doc.is_text(point.node) {
            let len = doc.text_len(point.node);
            if point.offset == 0 {
                doc.insert_before(point.node, node)
            } else if point.offset >= len {
                doc.insert_after(point.node, node)
            } else {
                let tail = doc.split_text(point.node, point.offset)?;
                doc.insert_before(tail, node)
            }
        } else {
            let offset = point.offset.min(doc.child_count(point.node));
            doc.insert_child(point.node, offset, node)
        }
    }

    /// Remove the selected content and collapse the range to where it was.
    pub fn delete_contents(&mut self, doc: &mut Document) -> DomResult<()> {
        if self.is_collapsed() {
            return Ok(());
        }
        self.split_boundaries(doc)?;
        self.start = element_point(doc, self.start);
        self.end = element_point(doc, self.end);
        let root = self.common_ancestor(doc);
        let top_level: Vec<NodeId> = doc
            .descendants(root)
            .filter(|&n| self.contains_node(doc, n))
            .filter(|&n| doc.parent(n).is_none_or(|p| !self.contains_node(doc, p)))
            .collect();

        let mut collapse_to = self.start;
        if let Some(&removed) = top_level.iter().find(|&&n| doc.contains(n, self.start.node)) {
            if let Some(point) = BoundaryPoint::before(doc, removed) {
                collapse_to = point;
            }
        }
        for node in top_level {
            doc.remove(node);
        }
        tracing::trace!(target: "weft::selection", ?collapse_to, "deleted range contents");
        *self = Self::collapsed(collapse_to);
        Ok(())
    }

    /// Selected text.
    pub fn get_text(&self, doc: &Document) -> String {
        let mut out = String::new();
        for node in self.text_nodes(doc) {
            let text = doc.text(node).unwrap_or("");
            let len = doc.text_len(node);
            let from = if node == self.start.node { self.start.offset } else { 0 };
            let to = if node == self.end.node { self.end.offset } else { len };
            out.extend(text.chars().skip(from).take(to.saturating_sub(from)));
        }
        out
    }

    /// Character offsets of both ends, counted over the text inside `root`.
    pub fn text_offsets(&self, doc: &Document, root: NodeId) -> (usize, usize) {
        (
            text_offset_of(doc, root, self.start),
            text_offset_of(doc, root, self.end),
        )
    }

    /// Rebuild a range from character offsets inside `root`.
    ///
    /// At a text node seam the start lands in the later node and the end in
    /// the earlier one, so the range hugs the selected text.
    pub fn from_text_offsets(doc: &Document, root: NodeId, start: usize, end: usize) -> Self {
        let start_point = point_at_text_offset(doc, root, start, true);
        let end_point = if start == end {
            start_point
        } else {
            point_at_text_offset(doc, root, end, false)
        };
        Self::new(doc, start_point, end_point)
    }
}

/// Re-express a point at either edge of a text node as a point in its parent.
fn element_point(doc: &Document, point: BoundaryPoint) -> BoundaryPoint {
    if !doc.is_text(point.node) {
        return point;
    }
    let edge = if point.offset == 0 {
        BoundaryPoint::before(doc, point.node)
    } else if point.offset >= doc.text_len(point.node) {
        BoundaryPoint::after(doc, point.node)
    } else {
        None
    };
    edge.unwrap_or(point)
}

/// Number of characters inside `root` that come before `point`.
pub fn text_offset_of(doc: &Document, root: NodeId, point: BoundaryPoint) -> usize {
    let mut offset = 0;
    for text in doc.text_nodes(root) {
        if text == point.node {
            return offset + point.offset;
        }
        let len = doc.text_len(text);
        let end = BoundaryPoint::new(text, len);
        if BoundaryPoint::compare(doc, end, point) == Ordering::Greater {
            break;
        }
        offset += len;
    }
    offset
}

/// Boundary point at character `offset` inside `root`.
pub fn point_at_text_offset(
    doc: &Document,
    root: NodeId,
    offset: usize,
    prefer_later: bool,
) -> BoundaryPoint {
    let texts = doc.text_nodes(root);
    let mut acc = 0;
    for &text in &texts {
        let len = doc.text_len(text);
        if offset < acc + len || (offset == acc + len && !prefer_later) {
            return BoundaryPoint::new(text, offset - acc);
        }
        acc += len;
    }
    match texts.last() {
        Some(&last) => BoundaryPoint::new(last, doc.text_len(last)),
        None => BoundaryPoint::new(root, doc.child_count(root)),
    }
}
