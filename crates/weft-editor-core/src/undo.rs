//! Undo/redo for editor commands.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `HtmlUndoManager` - snapshots the body markup and caret before each command

use weft_dom::Document;

use crate::selection::Selection;

/// Trait for managing undo/redo operations.
///
/// Implementations must actually restore the document, not just track state.
/// The composer calls [`transact`](Self::transact) before every command that
/// is not itself `undo` or `redo`.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Record the current state as an undo step.
    fn transact(&mut self, doc: &Document, selection: &Selection);

    /// Perform undo. Returns true if successful.
    fn undo(&mut self, doc: &mut Document, selection: &mut Selection) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self, doc: &mut Document, selection: &mut Selection) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// Body markup plus caret, as character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    html: String,
    caret: Option<(usize, usize)>,
}

impl Snapshot {
    fn capture(doc: &Document, selection: &Selection) -> Self {
        Self {
            html: doc.inner_html(doc.body()),
            caret: selection.caret_text_offset(doc),
        }
    }

    fn restore(&self, doc: &mut Document, selection: &mut Selection) -> bool {
        let body = doc.body();
        if let Err(err) = doc.set_inner_html(body, &self.html) {
            tracing::warn!(target: "weft::undo", %err, "could not restore snapshot");
            return false;
        }
        match self.caret {
            Some((start, end)) => selection.set_caret_text_offset(doc, start, end),
            None => selection.clear(),
        }
        true
    }
}

/// Snapshot-based undo over the whole body.
#[derive(Debug, Clone)]
pub struct HtmlUndoManager {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_steps: usize,
}

impl Default for HtmlUndoManager {
    fn default() -> Self {
        Self::new(25)
    }
}

impl HtmlUndoManager {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
}

impl UndoManager for HtmlUndoManager {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn transact(&mut self, doc: &Document, selection: &Selection) {
        let snapshot = Snapshot::capture(doc, selection);
        if self.undo_stack.last().is_some_and(|s| s.html == snapshot.html) {
            return;
        }
        // Clear redo stack on new edit
        self.redo_stack.clear();
        self.undo_stack.push(snapshot);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    fn undo(&mut self, doc: &mut Document, selection: &mut Selection) -> bool {
        let current = Snapshot::capture(doc, selection);
        // steps recorded before commands that changed nothing
        while self
            .undo_stack
            .last()
            .is_some_and(|s| s.html == current.html)
        {
            self.undo_stack.pop();
        }
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        if !snapshot.restore(doc, selection) {
            self.undo_stack.push(snapshot);
            return false;
        }
        tracing::debug!(target: "weft::undo", remaining = self.undo_stack.len(), "undo");
        self.redo_stack.push(current);
        true
    }

    fn redo(&mut self, doc: &mut Document, selection: &mut Selection) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = Snapshot::capture(doc, selection);
        if !snapshot.restore(doc, selection) {
            self.redo_stack.push(snapshot);
            return false;
        }
        tracing::debug!(target: "weft::undo", remaining = self.redo_stack.len(), "redo");
        self.undo_stack.push(current);
        true
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut doc = Document::parse("one");
        let mut selection = Selection::new();
        selection.set_caret_text_offset(&doc, 1, 1);
        let mut undo = HtmlUndoManager::default();

        undo.transact(&doc, &selection);
        let body = doc.body();
        doc.set_inner_html(body, "<b>one</b>").unwrap();

        assert!(undo.can_undo());
        assert!(undo.undo(&mut doc, &mut selection));
        assert_eq!(doc.inner_html(body), "one");
        assert_eq!(selection.caret_text_offset(&doc), Some((1, 1)));

        assert!(undo.can_redo());
        assert!(undo.redo(&mut doc, &mut selection));
        assert_eq!(doc.inner_html(body), "<b>one</b>");
        assert!(!undo.can_redo());
    }

    #[test]
    fn test_unchanged_steps_are_skipped() {
        let mut doc = Document::parse("a");
        let mut selection = Selection::new();
        let mut undo = HtmlUndoManager::default();
        undo.transact(&doc, &selection);
        let body = doc.body();
        doc.set_inner_html(body, "b").unwrap();
        undo.transact(&doc, &selection);

        assert!(undo.undo(&mut doc, &mut selection));
        assert_eq!(doc.inner_html(body), "a");
        assert!(!undo.undo(&mut doc, &mut selection));
    }

    #[test]
    fn test_max_steps_trims_oldest() {
        let mut doc = Document::new();
        let selection = Selection::new();
        let mut undo = HtmlUndoManager::new(2);
        let body = doc.body();
        for html in ["a", "b", "c"] {
            doc.set_inner_html(body, html).unwrap();
            undo.transact(&doc, &selection);
        }
        assert_eq!(undo.undo_depth(), 2);
        undo.clear_history();
        assert!(!undo.can_undo());
    }
}
