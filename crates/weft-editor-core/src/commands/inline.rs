//! Inline formatting commands, all backed by [`HtmlApplier`].

use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;

use super::{Command, CommandContext, CommandState, CommandValue, Commands};
use crate::applier::FormatSpec;
use crate::error::EditorResult;

static FONT_SIZE_FAMILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"wysiwyg-font-size-[0-9a-z\-]+").unwrap());

static COLOR_FAMILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"wysiwyg-color-[0-9a-z]+").unwrap());

/// Toggle `spec` over the selection.
pub(super) fn exec_format(
    commands: &mut Commands,
    cx: &mut CommandContext<'_>,
    spec: FormatSpec,
) -> EditorResult<bool> {
    let Some(mut range) = cx.selection.get_range(cx.doc) else {
        return Ok(false);
    };
    let applier = commands.applier(spec);
    applier.toggle(cx.doc, &mut range)?;
    cx.selection.set_selection(range);
    Ok(true)
}

/// The formatted elements covering the selection.
///
/// Bails out before touching the range if the document has no element with
/// a matching tag, or no element with the class.
pub(super) fn state_format(
    commands: &mut Commands,
    cx: &CommandContext<'_>,
    spec: FormatSpec,
) -> EditorResult<CommandState> {
    let doc = &*cx.doc;
    let body = doc.body();
    let tags: Vec<&str> = spec.tag_names.iter().map(SmolStr::as_str).collect();
    if !doc.has_element_with_tag_name(body, &tags) {
        return Ok(CommandState::Off);
    }
    if let Some(class_name) = &spec.class_name {
        if !doc.descendants(body).any(|n| doc.has_class(n, class_name)) {
            return Ok(CommandState::Off);
        }
    }
    let Some(range) = cx.selection.get_range(doc) else {
        return Ok(CommandState::Off);
    };
    let applier = commands.applier(spec);
    Ok(applier
        .applied_ancestors(doc, &range)
        .map_or(CommandState::Off, CommandState::Nodes))
}

/// A semantic tag: `bold`, `italic`, `underline`.
pub(super) struct TagFormat {
    tag: &'static str,
}

pub(super) static BOLD: TagFormat = TagFormat { tag: "b" };
pub(super) static ITALIC: TagFormat = TagFormat { tag: "i" };
pub(super) static UNDERLINE: TagFormat = TagFormat { tag: "u" };

impl Command for TagFormat {
    fn exec(
        &self,
        commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        exec_format(commands, cx, FormatSpec::tag(self.tag))
    }

    fn state(
        &self,
        commands: &mut Commands,
        cx: &CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<CommandState> {
        state_format(commands, cx, FormatSpec::tag(self.tag))
    }
}

/// Any inline tag, named by the value.
pub(super) struct FormatInline;

fn inline_tag(value: Option<&CommandValue>) -> Option<&str> {
    value
        .and_then(CommandValue::as_text)
        .map(str::trim)
        .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_alphanumeric()))
}

impl Command for FormatInline {
    fn exec(
        &self,
        commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        match inline_tag(value) {
            Some(tag) => exec_format(commands, cx, FormatSpec::tag(tag)),
            None => Ok(false),
        }
    }

    fn state(
        &self,
        commands: &mut Commands,
        cx: &CommandContext<'_>,
        value: Option<&CommandValue>,
    ) -> EditorResult<CommandState> {
        match inline_tag(value) {
            Some(tag) => state_format(commands, cx, FormatSpec::tag(tag)),
            None => Ok(CommandState::Off),
        }
    }
}

/// A `span` whose class carries the formatting: `fontSize`, `foreColor`.
pub(super) struct ClassFormat {
    prefix: &'static str,
    family: &'static LazyLock<Regex>,
}

pub(super) static FONT_SIZE: ClassFormat = ClassFormat {
    prefix: "wysiwyg-font-size-",
    family: &FONT_SIZE_FAMILY,
};

pub(super) static FORE_COLOR: ClassFormat = ClassFormat {
    prefix: "wysiwyg-color-",
    family: &COLOR_FAMILY,
};

impl ClassFormat {
    fn spec(&self, value: &str) -> FormatSpec {
        let family: &Regex = self.family;
        let class_name = format!("{}{value}", self.prefix);
        FormatSpec::tag("span").with_class(class_name, Some(family.clone()))
    }
}

fn text_value(value: Option<&CommandValue>) -> Option<&str> {
    value
        .and_then(CommandValue::as_text)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl Command for ClassFormat {
    fn exec(
        &self,
        commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        value: Option<&CommandValue>,
    ) -> EditorResult<bool> {
        match text_value(value) {
            Some(value) => exec_format(commands, cx, self.spec(value)),
            None => Ok(false),
        }
    }

    fn state(
        &self,
        commands: &mut Commands,
        cx: &CommandContext<'_>,
        value: Option<&CommandValue>,
    ) -> EditorResult<CommandState> {
        match text_value(value) {
            Some(value) => state_format(commands, cx, self.spec(value)),
            None => Ok(if self.value(cx)?.is_some() {
                CommandState::On
            } else {
                CommandState::Off
            }),
        }
    }

    /// Suffix of the family class on the nearest `span` around the selection.
    fn value(&self, cx: &CommandContext<'_>) -> EditorResult<Option<String>> {
        let doc = &*cx.doc;
        if !doc.has_element_with_class_name(doc.body(), self.family) {
            return Ok(None);
        }
        let Some(range) = cx.selection.get_range(doc) else {
            return Ok(None);
        };
        let found = doc
            .inclusive_ancestors(range.start.node)
            .take_while(|&n| n != doc.body())
            .filter(|&n| doc.has_tag(n, &["span"]))
            .find_map(|n| self.family.find_iter(doc.class_name(n)).last())
            .and_then(|m| m.as_str().strip_prefix(self.prefix))
            .map(str::to_string);
        Ok(found)
    }
}
