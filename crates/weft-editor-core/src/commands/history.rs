//! `undo` and `redo`, handed to the undo manager.

use super::{Command, CommandContext, CommandValue, Commands};
use crate::error::EditorResult;

pub(super) struct Undo;

impl Command for Undo {
    fn exec(
        &self,
        _commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        Ok(cx.undo.undo(cx.doc, cx.selection))
    }
}

pub(super) struct Redo;

impl Command for Redo {
    fn exec(
        &self,
        _commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        Ok(cx.undo.redo(cx.doc, cx.selection))
    }
}
