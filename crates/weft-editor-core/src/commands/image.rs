//! `insertImage`: insert an image at the caret, or remove the selected one.

use weft_dom::{Document, INVISIBLE_SPACE, NodeId};

use super::{Command, CommandContext, CommandState, CommandValue, Commands};
use crate::error::EditorResult;
use crate::range::{BoundaryPoint, Range};
use crate::selection::Selection;

pub(super) struct InsertImage;

/// The image the selection consists of, if it is exactly one image.
///
/// Either the image itself is selected, or an element whose selected text is
/// blank and which holds exactly one image inside the selection.
pub(crate) fn selected_image(doc: &Document, selection: &Selection) -> Option<NodeId> {
    let node = selection.get_selected_node(doc)?;
    if doc.has_tag(node, &["img"]) {
        return Some(node);
    }
    if !doc.is_element(node) {
        return None;
    }
    let range = selection.get_range(doc)?;
    let text = range.get_text(doc);
    if !text.trim_matches(|c: char| c.is_whitespace() || c == INVISIBLE_SPACE).is_empty() {
        return None;
    }
    match range
        .intersecting_elements(doc, |doc, n| doc.has_tag(n, &["img"]))
        .as_slice()
    {
        [only] => Some(*only),
        _ => None,
    }
}

/// Remove `image` and an anchor it leaves empty. The caret goes where it was.
fn remove_image(doc: &mut Document, selection: &mut Selection, image: NodeId) {
    let Some(parent) = doc.parent(image) else {
        return;
    };
    let index = doc.index_in_parent(image).unwrap_or(0);
    doc.remove(image);
    doc.remove_empty_text_nodes(parent);

    if doc.has_tag(parent, &["a"]) && doc.child_count(parent) == 0 {
        if let Some(point) = BoundaryPoint::before(doc, parent) {
            selection.set_selection(Range::collapsed(point));
        }
        doc.remove(parent);
    } else {
        let offset = index.min(doc.child_count(parent));
        selection.set_selection(Range::collapsed(BoundaryPoint::new(parent, offset)));
    }
    tracing::debug!(target: "weft::commands", "removed image");
}

impl Command for InsertImage {
    fn exec(
        &self,
        _commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        if let Some(image) = selected_image(cx.doc, cx.selection) {
            remove_image(cx.doc, cx.selection, image);
            return Ok(true);
        }
        if cx.selection.get_range(cx.doc).is_none() {
            return Ok(false);
        }

        let image = cx.doc.create_element("img");
        for (name, value) in value.map(|v| v.attribute_pairs("src")).unwrap_or_default() {
            cx.doc.set_attr(image, &name, value)?;
        }
        cx.selection.insert_node(cx.doc, image)?;
        cx.selection.set_after(cx.doc, image);
        tracing::debug!(
            target: "weft::commands",
            src = ?cx.doc.attr(image, "src"),
            "inserted image"
        );
        Ok(true)
    }

    fn state(
        &self,
        _commands: &mut Commands,
        cx: &CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<CommandState> {
        let doc = &*cx.doc;
        if !doc.has_element_with_tag_name(doc.body(), &["img"]) {
            return Ok(CommandState::Off);
        }
        Ok(CommandState::from_node(selected_image(doc, cx.selection)))
    }
}
