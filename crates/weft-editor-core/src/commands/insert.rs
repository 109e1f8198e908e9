//! `insertLineBreak` and `insertHTML`.

use super::{Command, CommandContext, CommandKind, CommandValue, Commands};
use crate::error::EditorResult;

pub(super) struct InsertLineBreak;

impl Command for InsertLineBreak {
    fn exec(
        &self,
        commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        let name = CommandKind::InsertLineBreak.name();
        if commands.supports_native(&*cx.native, name) {
            return Ok(commands.native_exec(cx, name, None));
        }
        let html = CommandValue::text("<br>");
        Ok(commands.exec(cx, CommandKind::InsertHtml.name(), Some(&html)))
    }
}

pub(super) struct InsertHtml;

impl Command for InsertHtml {
    fn exec(
        &self,
        commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        let Some(html) = value.and_then(CommandValue::as_text) else {
            return Ok(false);
        };
        let name = CommandKind::InsertHtml.name();
        if commands.supports_native(&*cx.native, name) {
            return Ok(commands.native_exec(cx, name, value));
        }
        if cx.selection.get_range(cx.doc).is_none() {
            return Ok(false);
        }
        cx.selection.insert_html(cx.doc, html)?;
        Ok(true)
    }
}
