//! Block formatting: `formatBlock` and the `justify*` commands.

use std::sync::LazyLock;

use regex::Regex;
use weft_dom::{Document, ElementFilter, NodeId};

use super::{Command, CommandContext, CommandState, CommandValue, Commands};
use crate::error::{EditorError, EditorResult};
use crate::range::{BoundaryPoint, Range};
use crate::selection::Selection;

static TEXT_ALIGN_FAMILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"wysiwyg-text-align-[0-9a-z]+").unwrap());

/// Blocks that are renamed into each other instead of nested.
const BLOCK_GROUP: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "blockquote", "div",
];

const DEFAULT_BLOCK: &str = "div";

fn is_break_or_block(doc: &Document, node: NodeId) -> bool {
    doc.is_line_break(node) || doc.is_block(node)
}

/// Nearest sibling that is not whitespace-only text.
fn sibling_not_blank(doc: &Document, node: NodeId, forward: bool) -> Option<NodeId> {
    let step = |n| {
        if forward {
            doc.next_sibling(n)
        } else {
            doc.previous_sibling(n)
        }
    };
    let mut sibling = step(node);
    while let Some(s) = sibling {
        if !doc.text(s).is_some_and(|t| t.trim().is_empty()) {
            return Some(s);
        }
        sibling = step(s);
    }
    None
}

/// Keep the lines around `block` apart once it is unwrapped.
fn add_line_breaks_around(doc: &mut Document, block: NodeId) -> EditorResult<()> {
    if let Some(next) = sibling_not_blank(doc, block, true) {
        if !is_break_or_block(doc, next) {
            let br = doc.create_element("br");
            doc.insert_before(next, br)?;
        }
    }
    if let Some(previous) = sibling_not_blank(doc, block, false) {
        if !is_break_or_block(doc, previous) {
            let br = doc.create_element("br");
            doc.insert_before(block, br)?;
        }
    }
    Ok(())
}

fn remove_line_breaks_around(doc: &mut Document, block: NodeId) {
    for forward in [true, false] {
        if let Some(sibling) = sibling_not_blank(doc, block, forward) {
            if doc.is_line_break(sibling) {
                doc.remove(sibling);
            }
        }
    }
    if let Some(last) = doc.last_child(block) {
        if doc.is_line_break(last) {
            doc.remove(last);
        }
    }
}

/// Move the caret's line into `el`.
///
/// The line is the longest run of inline siblings around the caret, inside
/// the nearest block, that contains no `<br>`.
fn wrap_line(doc: &mut Document, selection: &mut Selection, el: NodeId) -> EditorResult<()> {
    let range = selection.get_range(doc).ok_or(EditorError::NoRange)?;
    let caret = range.start.node;
    let container = doc.block_ancestor(caret);
    let index = if caret == container {
        range.start.offset.min(doc.child_count(container))
    } else {
        doc.inclusive_ancestors(caret)
            .find(|&n| doc.parent(n) == Some(container))
            .and_then(|n| doc.index_in_parent(n))
            .unwrap_or(0)
    };

    let children = doc.children(container);
    let in_line = |n: NodeId| !is_break_or_block(doc, n);
    let mut start = index;
    while start > 0 && in_line(children[start - 1]) {
        start -= 1;
    }
    let mut end = index;
    while end < children.len() && in_line(children[end]) {
        end += 1;
    }
    let line = children[start..end].to_vec();

    doc.insert_child(container, start, el)?;
    for node in line {
        doc.append_child(el, node)?;
    }
    remove_line_breaks_around(doc, el);
    tracing::trace!(target: "weft::commands", nodes = end - start, "wrapped line");

    // element points inside the moved run now live in `el`
    let remap = |p: BoundaryPoint| {
        if p.node == container && p.offset >= start && p.offset <= end {
            BoundaryPoint::new(el, p.offset - start)
        } else {
            p
        }
    };
    let moved = Range {
        start: remap(range.start),
        end: remap(range.end),
    };
    if moved.is_valid(doc) && doc.contains(el, moved.start.node) {
        selection.set_selection(moved);
    } else {
        selection.select_node_contents(doc, el);
    }
    Ok(())
}

/// Toggle a block around the selection.
///
/// `tag` is the block to toggle, `None` means any block carrying `class`.
/// An enclosing match is taken apart: the class family is stripped, then the
/// element is unwrapped (or turned into a paragraph) when nothing else is
/// left on it. Otherwise a block of the group around the caret is renamed,
/// and failing that the caret's line is wrapped in a new block.
pub(super) fn format_block(
    commands: &mut Commands,
    cx: &mut CommandContext<'_>,
    tag: Option<&str>,
    class: Option<&str>,
    pattern: Option<&Regex>,
) -> EditorResult<bool> {
    let Some(node) = cx.selection.get_selected_node(cx.doc) else {
        return Ok(false);
    };
    let depth = cx.config.parent_lookup_depth;
    let use_line_breaks = cx.config.use_line_breaks;
    let target = tag.unwrap_or(DEFAULT_BLOCK);

    let filter = block_filter(tag, class, pattern);
    if let Some(block) = cx.doc.find_parent_element(node, &filter, depth) {
        cx.selection
            .execute_and_restore(cx.doc, |doc, _| -> EditorResult<()> {
                if let Some(pattern) = pattern {
                    doc.remove_classes_matching(block, pattern)?;
                }
                let has_classes = !doc.class_name(block).trim().is_empty();
                if !has_classes && doc.has_tag(block, &[target]) {
                    if use_line_breaks || target == "p" {
                        add_line_breaks_around(doc, block)?;
                        doc.replace_with_child_nodes(block)?;
                    } else {
                        doc.rename_element(block, "p")?;
                    }
                } else if has_classes && tag.is_some() {
                    // keep the styling on a neutral block
                    doc.rename_element(block, DEFAULT_BLOCK)?;
                }
                Ok(())
            })?;
        tracing::debug!(target: "weft::commands", block = target, ?class, "removed block format");
        return Ok(true);
    }

    if tag.is_none_or(|t| BLOCK_GROUP.contains(&t)) {
        let group = ElementFilter::tags(BLOCK_GROUP);
        if let Some(block) = cx.doc.find_parent_element(node, &group, depth) {
            cx.selection
                .execute_and_restore(cx.doc, |doc, _| -> EditorResult<()> {
                    if let Some(tag) = tag {
                        doc.rename_element(block, tag)?;
                    }
                    if let Some(class) = class {
                        if let Some(pattern) = pattern {
                            doc.remove_classes_matching(block, pattern)?;
                        }
                        doc.add_class(block, class)?;
                    }
                    Ok(())
                })?;
            tracing::debug!(target: "weft::commands", block = target, ?class, "renamed block");
            return Ok(true);
        }
    }

    if class.is_none() && commands.supports_native(&*cx.native, "formatBlock") {
        let value = CommandValue::text(target);
        return Ok(commands.native_exec(cx, "formatBlock", Some(&value)));
    }

    let el = cx.doc.create_element(target);
    if let Some(class) = class {
        cx.doc.set_class_name(el, class)?;
    }
    wrap_line(cx.doc, cx.selection, el)?;
    tracing::debug!(target: "weft::commands", block = target, ?class, "created block");
    Ok(true)
}

fn block_filter(
    tag: Option<&str>,
    class: Option<&str>,
    pattern: Option<&Regex>,
) -> ElementFilter {
    ElementFilter {
        tag_names: tag.map(|t| vec![t.to_ascii_lowercase()]).unwrap_or_default(),
        class_name: class.map(str::to_string),
        class_pattern: pattern.cloned(),
    }
}

fn block_state(
    cx: &CommandContext<'_>,
    tag: Option<&str>,
    class: Option<&str>,
    pattern: Option<&Regex>,
) -> CommandState {
    let doc = &*cx.doc;
    let found = cx.selection.get_selected_node(doc).and_then(|node| {
        doc.find_parent_element(
            node,
            &block_filter(tag, class, pattern),
            cx.config.parent_lookup_depth,
        )
    });
    CommandState::from_node(found)
}

fn block_tag(value: Option<&CommandValue>) -> Option<String> {
    value
        .and_then(CommandValue::as_text)
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_alphanumeric()))
}

pub(super) struct FormatBlock;

impl Command for FormatBlock {
    fn exec(
        &self,
        commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        match block_tag(value) {
            Some(tag) => format_block(commands, cx, Some(&tag), None, None),
            None => Ok(false),
        }
    }

    fn state(
        &self,
        _commands: &mut Commands,
        cx: &CommandContext<'_>,
        value: Option<&CommandValue>,
    ) -> EditorResult<CommandState> {
        Ok(match block_tag(value) {
            Some(tag) => block_state(cx, Some(&tag), None, None),
            None => CommandState::Off,
        })
    }
}

/// Text alignment, as a class on the enclosing block.
pub(super) struct Justify {
    class: &'static str,
}

pub(super) static JUSTIFY_LEFT: Justify = Justify {
    class: "wysiwyg-text-align-left",
};
pub(super) static JUSTIFY_CENTER: Justify = Justify {
    class: "wysiwyg-text-align-center",
};
pub(super) static JUSTIFY_RIGHT: Justify = Justify {
    class: "wysiwyg-text-align-right",
};

impl Command for Justify {
    fn exec(
        &self,
        commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        format_block(commands, cx, None, Some(self.class), Some(&*TEXT_ALIGN_FAMILY))
    }

    fn state(
        &self,
        _commands: &mut Commands,
        cx: &CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<CommandState> {
        Ok(block_state(cx, None, Some(self.class), Some(&*TEXT_ALIGN_FAMILY)))
    }
}
