//! Converting content to lists and lists back to content.

use weft_dom::{Document, NodeId, is_void_element};

use crate::error::EditorResult;

const LIST_TAGS: &[&str] = &["ul", "ol", "menu"];

/// Block content that keeps an item from being wrapped in a paragraph.
const NESTED_BLOCK_TAGS: &[&str] = &[
    "div", "p", "ul", "ol", "menu", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Which list to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListType {
    Ordered,
    Unordered,
}

impl ListType {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Ordered => "ol",
            Self::Unordered => "ul",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Ordered => Self::Unordered,
            Self::Unordered => Self::Ordered,
        }
    }
}

pub fn is_list(doc: &Document, node: NodeId) -> bool {
    doc.has_tag(node, LIST_TAGS)
}

/// Whether `node` shows anything: text, a void element such as an image, or
/// an element with children. Empty inline wrappers do not count.
fn has_content(doc: &Document, node: NodeId) -> bool {
    match doc.text(node) {
        Some(text) => !text.is_empty(),
        None => {
            doc.child_count(node) > 0 || doc.tag_name(node).is_some_and(is_void_element)
        }
    }
}

fn is_blank_text(doc: &Document, node: NodeId) -> bool {
    doc.text(node).is_some_and(|t| t.trim().is_empty())
}

/// Replace `container` by a list with one item per line of its content.
///
/// Line breaks separate items and are dropped. Block children get an item of
/// their own. Empty lines produce no item, so empty content gives an empty
/// list. Lists are returned unchanged.
pub fn convert_to_list(
    doc: &mut Document,
    container: NodeId,
    list_type: ListType,
) -> EditorResult<NodeId> {
    if is_list(doc, container) {
        return Ok(container);
    }

    // a <br> ending an inline element moves behind it, one ending a block goes away
    let line_breaks: Vec<NodeId> = doc
        .descendants(container)
        .filter(|&n| doc.is_line_break(n))
        .collect();
    for br in line_breaks {
        while let Some(parent) = doc.parent(br) {
            if parent == container || doc.last_child(parent) != Some(br) {
                break;
            }
            if doc.is_block(parent) {
                doc.remove(br);
                break;
            }
            doc.insert_after(parent, br)?;
        }
    }

    let list = doc.create_element(list_type.tag());
    let mut current: Option<NodeId> = None;
    for child in doc.take_children(container) {
        if doc.is_block(child) {
            let item = doc.create_element("li");
            doc.append_child(list, item)?;
            doc.append_child(item, child)?;
            current = None;
        } else if doc.is_line_break(child) {
            doc.remove(child);
            current = None;
        } else {
            let item = match current {
                Some(item) => item,
                None => {
                    let item = doc.create_element("li");
                    doc.append_child(list, item)?;
                    current = Some(item);
                    item
                }
            };
            doc.append_child(item, child)?;
        }
    }

    doc.replace_node(container, list)?;
    doc.remove(container);
    tracing::debug!(
        target: "weft::lists",
        list = list_type.tag(),
        items = doc.child_count(list),
        "converted to list"
    );
    Ok(list)
}

/// Replace `list` by its items' content.
///
/// With `use_line_breaks`, lines are separated by `<br>`. Otherwise every item
/// becomes a paragraph, unless it already holds block content. Non-lists are
/// left alone. Returns the nodes that took the list's place.
pub fn resolve_list(
    doc: &mut Document,
    list: NodeId,
    use_line_breaks: bool,
) -> EditorResult<Vec<NodeId>> {
    if !is_list(doc, list) {
        return Ok(Vec::new());
    }
    let mut output: Vec<NodeId> = Vec::new();

    if use_line_breaks {
        let previous = {
            let mut sibling = doc.previous_sibling(list);
            while let Some(s) = sibling.filter(|&s| is_blank_text(doc, s)) {
                sibling = doc.previous_sibling(s);
            }
            sibling
        };
        if previous.is_some_and(|p| !doc.is_block(p) && !doc.is_line_break(p)) {
            output.push(doc.create_element("br"));
        }
    }

    for item in doc.take_children(list) {
        if !doc.is_element(item) {
            doc.remove(item);
            continue;
        }
        let children = doc.take_children(item);
        if use_line_breaks {
            let last = children.last().copied();
            let shows_content = children.iter().any(|&c| has_content(doc, c));
            for child in children {
                let needs_break = shows_content
                    && Some(child) == last
                    && !doc.is_block(child)
                    && !doc.is_line_break(child);
                output.push(child);
                if needs_break {
                    output.push(doc.create_element("br"));
                }
            }
        } else {
            let has_block = children.iter().any(|&c| {
                doc.has_tag(c, NESTED_BLOCK_TAGS)
                    || doc.has_element_with_tag_name(c, NESTED_BLOCK_TAGS)
            });
            if has_block {
                output.extend(children);
            } else {
                let paragraph = doc.create_element("p");
                for child in children {
                    doc.append_child(paragraph, child)?;
                }
                output.push(paragraph);
            }
        }
        doc.remove(item);
    }

    for &node in &output {
        doc.insert_before(list, node)?;
    }
    doc.remove(list);
    tracing::debug!(
        target: "weft::lists",
        use_line_breaks,
        nodes = output.len(),
        "resolved list"
    );
    Ok(output)
}

/// Change a list's type in place, keeping its items.
pub fn rename_list(
    doc: &mut Document,
    list: NodeId,
    list_type: ListType,
) -> EditorResult<NodeId> {
    Ok(doc.rename_element(list, list_type.tag())?)
}
