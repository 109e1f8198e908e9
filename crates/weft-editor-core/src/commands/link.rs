//! `createLink`: wrap the selection in an anchor, or take existing links apart.

use weft_dom::{Document, INVISIBLE_SPACE, NodeId};

use super::{Command, CommandContext, CommandState, CommandValue, Commands};
use crate::applier::FormatSpec;
use crate::autolink::URL_PATTERN;
use crate::error::EditorResult;
use crate::range::Range;

/// Marks anchors created by the current call until their attributes are set.
const TEMP_LINK_CLASS: &str = "_weft-temp-link";

/// Element a URL-looking link turns into, so auto-linking leaves it alone.
const PROTECTED_TAG: &str = "code";

pub(super) struct CreateLink;

fn anchors_in(doc: &Document, range: &Range) -> Vec<NodeId> {
    range.intersecting_elements(doc, |doc, n| doc.has_tag(n, &["a"]))
}

/// Unwrap each anchor, or protect it if its text is itself a URL.
fn remove_links(doc: &mut Document, anchors: &[NodeId]) -> EditorResult<()> {
    for &anchor in anchors {
        if !doc.exists(anchor) {
            continue;
        }
        let looks_like_url = URL_PATTERN.is_match(&doc.text_content(anchor));
        let protected = doc
            .ancestors(anchor)
            .any(|n| doc.has_tag(n, &[PROTECTED_TAG]));
        if looks_like_url && !protected {
            doc.rename_element(anchor, PROTECTED_TAG)?;
            doc.remove_attr(anchor, "href");
            doc.remove_attr(anchor, "target");
        } else {
            doc.replace_with_child_nodes(anchor)?;
        }
    }
    tracing::debug!(target: "weft::commands", count = anchors.len(), "removed links");
    Ok(())
}

fn is_empty_anchor(doc: &Document, anchor: NodeId) -> bool {
    let text = doc.text_content(anchor);
    doc.children(anchor).iter().all(|&c| !doc.is_element(c))
        && text.chars().all(|c| c == INVISIBLE_SPACE)
}

impl Command for CreateLink {
    fn exec(
        &self,
        commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        let Some(mut range) = cx.selection.get_range(cx.doc) else {
            return Ok(false);
        };
        let existing = anchors_in(cx.doc, &range);
        if !existing.is_empty() {
            cx.selection
                .execute_and_restore(cx.doc, |doc, _| remove_links(doc, &existing))?;
            return Ok(true);
        }

        let attributes = value
            .map(|v| v.attribute_pairs("href"))
            .unwrap_or_default();
        let applier = commands.applier(FormatSpec::tag("a").with_class(TEMP_LINK_CLASS, None));
        applier.apply(cx.doc, &mut range)?;

        let body = cx.doc.body();
        let created: Vec<NodeId> = cx
            .doc
            .descendants(body)
            .filter(|&n| cx.doc.has_tag(n, &["a"]) && cx.doc.has_class(n, TEMP_LINK_CLASS))
            .collect();
        for &anchor in &created {
            cx.doc.remove_class(anchor, TEMP_LINK_CLASS)?;
            for (name, value) in &attributes {
                if name != "text" {
                    cx.doc.set_attr(anchor, name, value.as_str())?;
                }
            }
        }

        match created.as_slice() {
            [anchor] if is_empty_anchor(cx.doc, *anchor) => {
                let anchor = *anchor;
                let text = value
                    .and_then(|v| v.attr("text"))
                    .or_else(|| cx.doc.attr(anchor, "href"))
                    .unwrap_or_default()
                    .to_string();
                cx.doc.set_text_content(anchor, &text)?;
                let space = cx.doc.create_text(" ");
                cx.doc.insert_after(anchor, space)?;
                cx.selection.set_after(cx.doc, space);
            }
            [.., last] => {
                cx.selection.set_after(cx.doc, *last);
            }
            [] => {
                cx.selection.set_selection(range);
            }
        }
        tracing::debug!(target: "weft::commands", count = created.len(), "created links");
        Ok(!created.is_empty())
    }

    fn state(
        &self,
        _commands: &mut Commands,
        cx: &CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<CommandState> {
        let doc = &*cx.doc;
        if !doc.has_element_with_tag_name(doc.body(), &["a"]) {
            return Ok(CommandState::Off);
        }
        let Some(range) = cx.selection.get_range(doc) else {
            return Ok(CommandState::Off);
        };
        Ok(CommandState::from_nodes(anchors_in(doc, &range)))
    }
}
