//! `insertOrderedList` / `insertUnorderedList`.

use weft_dom::ElementFilter;

use super::block::format_block;
use super::{Command, CommandContext, CommandKind, CommandState, CommandValue, Commands};
use crate::error::EditorResult;
use crate::lists::{ListType, convert_to_list, rename_list, resolve_list};
use crate::range::{BoundaryPoint, Range};

pub(super) struct InsertList {
    kind: CommandKind,
}

pub(super) static ORDERED: InsertList = InsertList {
    kind: CommandKind::InsertOrderedList,
};
pub(super) static UNORDERED: InsertList = InsertList {
    kind: CommandKind::InsertUnorderedList,
};

impl InsertList {
    fn list_type(&self) -> ListType {
        self.kind.list_type().unwrap_or(ListType::Unordered)
    }
}

impl Command for InsertList {
    fn exec(
        &self,
        commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        let list_type = self.list_type();
        let Some(node) = cx.selection.get_selected_node(cx.doc) else {
            return Ok(false);
        };
        let lists = ElementFilter::tags(&["ul", "ol"]);
        let enclosing = cx
            .doc
            .find_parent_element(node, &lists, cx.config.parent_lookup_depth);

        if let Some(list) = enclosing {
            let use_line_breaks = cx.config.use_line_breaks;
            if cx.doc.has_tag(list, &[list_type.tag()]) {
                cx.selection.execute_and_restore(cx.doc, |doc, _| {
                    resolve_list(doc, list, use_line_breaks)
                })?;
            } else {
                cx.selection
                    .execute_and_restore(cx.doc, |doc, _| rename_list(doc, list, list_type))?;
            }
            return Ok(true);
        }

        if commands.supports_native(&*cx.native, self.kind.name()) {
            return Ok(commands.native_exec(cx, self.kind.name(), None));
        }

        // wrap the caret's block in a marked div, then turn that div into the list
        let marker = commands.temp_class();
        format_block(commands, cx, Some("div"), Some(&marker), None)?;
        let body = cx.doc.body();
        let Some(container) = cx
            .doc
            .descendants(body)
            .find(|&n| cx.doc.has_class(n, &marker))
        else {
            return Ok(false);
        };
        cx.doc.remove_class(container, &marker)?;
        let was_empty = cx.doc.is_visually_empty(container);

        let list = cx
            .selection
            .execute_and_restore(cx.doc, |doc, _| convert_to_list(doc, container, list_type))?;

        let first_item = cx
            .doc
            .children(list)
            .iter()
            .copied()
            .find(|&n| cx.doc.has_tag(n, &["li"]));
        let item = match first_item {
            Some(item) => item,
            None => {
                let item = cx.doc.create_element("li");
                cx.doc.append_child(list, item)?;
                item
            }
        };
        if was_empty || first_item.is_none() {
            let caret = BoundaryPoint::new(item, cx.doc.child_count(item));
            cx.selection.set_selection(Range::collapsed(caret));
        }
        Ok(true)
    }

    fn state(
        &self,
        _commands: &mut Commands,
        cx: &CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<CommandState> {
        let doc = &*cx.doc;
        let filter = ElementFilter::tags(&[self.list_type().tag()]);
        let list = cx
            .selection
            .get_selected_node(doc)
            .and_then(|node| doc.find_parent_element(node, &filter, cx.config.parent_lookup_depth));
        Ok(CommandState::from_node(list))
    }
}
