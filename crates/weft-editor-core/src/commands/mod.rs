//! Named editing commands.
//!
//! Every command implements the same three operations: `exec` changes the
//! document, `state` reports whether the command is active at the selection,
//! `value` reports its current value. Known commands are the variants of
//! [`CommandKind`]. Anything else goes to the host's native primitives, if
//! the host claims to support them.
//!
//! Failures never reach the caller: they are logged and read as "nothing
//! happened".

mod block;
mod history;
mod image;
mod inline;
mod insert;
mod link;
mod list;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use smol_str::SmolStr;
use weft_dom::{Document, NodeId};

use crate::applier::{FormatSpec, HtmlApplier};
use crate::config::EditorConfig;
use crate::error::EditorResult;
use crate::lists::ListType;
use crate::native::NativeCommands;
use crate::selection::Selection;
use crate::undo::UndoManager;

/// Every command with its own implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Bold,
    Italic,
    Underline,
    FontSize,
    ForeColor,
    CreateLink,
    InsertImage,
    InsertOrderedList,
    InsertUnorderedList,
    InsertLineBreak,
    InsertHtml,
    Undo,
    Redo,
    FormatInline,
    FormatBlock,
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
}

impl CommandKind {
    pub const ALL: &'static [CommandKind] = &[
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::FontSize,
        Self::ForeColor,
        Self::CreateLink,
        Self::InsertImage,
        Self::InsertOrderedList,
        Self::InsertUnorderedList,
        Self::InsertLineBreak,
        Self::InsertHtml,
        Self::Undo,
        Self::Redo,
        Self::FormatInline,
        Self::FormatBlock,
        Self::JustifyLeft,
        Self::JustifyCenter,
        Self::JustifyRight,
    ];

    /// The command's name as hosts spell it.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::FontSize => "fontSize",
            Self::ForeColor => "foreColor",
            Self::CreateLink => "createLink",
            Self::InsertImage => "insertImage",
            Self::InsertOrderedList => "insertOrderedList",
            Self::InsertUnorderedList => "insertUnorderedList",
            Self::InsertLineBreak => "insertLineBreak",
            Self::InsertHtml => "insertHTML",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::FormatInline => "formatInline",
            Self::FormatBlock => "formatBlock",
            Self::JustifyLeft => "justifyLeft",
            Self::JustifyCenter => "justifyCenter",
            Self::JustifyRight => "justifyRight",
        }
    }

    /// Look a command up by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    fn handler(self) -> &'static dyn Command {
        match self {
            Self::Bold => &inline::BOLD,
            Self::Italic => &inline::ITALIC,
            Self::Underline => &inline::UNDERLINE,
            Self::FontSize => &inline::FONT_SIZE,
            Self::ForeColor => &inline::FORE_COLOR,
            Self::FormatInline => &inline::FormatInline,
            Self::CreateLink => &link::CreateLink,
            Self::InsertImage => &image::InsertImage,
            Self::InsertOrderedList => &list::ORDERED,
            Self::InsertUnorderedList => &list::UNORDERED,
            Self::InsertLineBreak => &insert::InsertLineBreak,
            Self::InsertHtml => &insert::InsertHtml,
            Self::Undo => &history::Undo,
            Self::Redo => &history::Redo,
            Self::FormatBlock => &block::FormatBlock,
            Self::JustifyLeft => &block::JUSTIFY_LEFT,
            Self::JustifyCenter => &block::JUSTIFY_CENTER,
            Self::JustifyRight => &block::JUSTIFY_RIGHT,
        }
    }

    pub(crate) fn list_type(self) -> Option<ListType> {
        match self {
            Self::InsertOrderedList => Some(ListType::Ordered),
            Self::InsertUnorderedList => Some(ListType::Unordered),
            _ => None,
        }
    }
}

/// Argument of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandValue {
    Text(String),
    /// Attribute name/value pairs, e.g. for `createLink` and `insertImage`.
    Attributes(Vec<(String, String)>),
}

impl CommandValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn attributes<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Attributes(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Attributes(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Self::Attributes(pairs) => pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            Self::Text(_) => None,
        }
    }

    /// Attribute pairs, with a bare text value standing for `text_key`.
    ///
    /// `className` is spelled `class`.
    pub(crate) fn attribute_pairs(&self, text_key: &str) -> Vec<(String, String)> {
        match self {
            Self::Text(text) => vec![(text_key.to_string(), text.clone())],
            Self::Attributes(pairs) => pairs
                .iter()
                .map(|(k, v)| {
                    let key = if k == "className" { "class" } else { k.as_str() };
                    (key.to_string(), v.clone())
                })
                .collect(),
        }
    }
}

impl From<&str> for CommandValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Answer of a `state` query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CommandState {
    #[default]
    Off,
    On,
    /// Active, because of this element.
    Node(NodeId),
    /// Active, because of these elements.
    Nodes(Vec<NodeId>),
}

impl CommandState {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Off)
    }

    pub(crate) fn from_node(node: Option<NodeId>) -> Self {
        node.map_or(Self::Off, Self::Node)
    }

    pub(crate) fn from_nodes(nodes: Vec<NodeId>) -> Self {
        if nodes.is_empty() {
            Self::Off
        } else {
            Self::Nodes(nodes)
        }
    }
}

/// Everything a command works on.
pub struct CommandContext<'a> {
    pub doc: &'a mut Document,
    pub selection: &'a mut Selection,
    pub config: &'a EditorConfig,
    pub native: &'a mut dyn NativeCommands,
    pub undo: &'a mut dyn UndoManager,
}

/// One command's implementation.
trait Command: Sync {
    fn exec(
        &self,
        commands: &mut Commands,
        cx: &mut CommandContext<'_>,
        value: Option<&CommandValue>,
    ) -> EditorResult<bool>;

    fn state(
        &self,
        _commands: &mut Commands,
        _cx: &CommandContext<'_>,
        _value: Option<&CommandValue>,
    ) -> EditorResult<CommandState> {
        Ok(CommandState::Off)
    }

    fn value(&self, _cx: &CommandContext<'_>) -> EditorResult<Option<String>> {
        Ok(None)
    }
}

type ApplierKey = (SmolStr, Option<String>);

/// Command dispatch plus the state it keeps between calls.
///
/// Holds the applier cache and what the host said about native support.
/// Nothing here is shared between editors.
#[derive(Debug, Default)]
pub struct Commands {
    appliers: HashMap<ApplierKey, HtmlApplier>,
    native_support: HashMap<String, bool>,
    temp_counter: u64,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exec(
        &mut self,
        cx: &mut CommandContext<'_>,
        name: &str,
        value: Option<&CommandValue>,
    ) -> bool {
        let Some(kind) = CommandKind::from_name(name) else {
            return self.native_exec(cx, name, value);
        };
        tracing::debug!(target: "weft::commands", command = kind.name(), ?value, "exec");
        match kind.handler().exec(self, cx, value) {
            Ok(changed) => changed,
            Err(err) => {
                tracing::warn!(
                    target: "weft::commands",
                    command = kind.name(),
                    %err,
                    "exec failed"
                );
                false
            }
        }
    }

    pub fn state(
        &mut self,
        cx: &CommandContext<'_>,
        name: &str,
        value: Option<&CommandValue>,
    ) -> CommandState {
        let Some(kind) = CommandKind::from_name(name) else {
            if !self.supports_native(&*cx.native, name) {
                return CommandState::Off;
            }
            let text = value.and_then(CommandValue::as_text);
            return match cx.native.state(&*cx.doc, &*cx.selection, name, text) {
                Ok(true) => CommandState::On,
                Ok(false) => CommandState::Off,
                Err(err) => {
                    tracing::warn!(
                        target: "weft::commands",
                        command = name,
                        %err,
                        "native state failed"
                    );
                    CommandState::Off
                }
            };
        };
        match kind.handler().state(self, cx, value) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(
                    target: "weft::commands",
                    command = kind.name(),
                    %err,
                    "state failed"
                );
                CommandState::Off
            }
        }
    }

    pub fn value(&mut self, cx: &CommandContext<'_>, name: &str) -> Option<String> {
        let Some(kind) = CommandKind::from_name(name) else {
            if !self.supports_native(&*cx.native, name) {
                return None;
            }
            return cx
                .native
                .value(&*cx.doc, &*cx.selection, name)
                .unwrap_or_else(|err| {
                    tracing::warn!(
                        target: "weft::commands",
                        command = name,
                        %err,
                        "native value failed"
                    );
                    None
                });
        };
        kind.handler().value(cx).unwrap_or_else(|err| {
            tracing::warn!(target: "weft::commands", command = kind.name(), %err, "value failed");
            None
        })
    }

    /// Whether the host supports `name`, asked once per name.
    pub(crate) fn supports_native(&mut self, native: &dyn NativeCommands, name: &str) -> bool {
        *self
            .native_support
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| {
                let supported = native.supports(name);
                tracing::debug!(
                    target: "weft::commands",
                    command = name,
                    supported,
                    "native support"
                );
                supported
            })
    }

    /// Run the host's primitive. Unsupported or failing calls count as no change.
    pub(crate) fn native_exec(
        &mut self,
        cx: &mut CommandContext<'_>,
        name: &str,
        value: Option<&CommandValue>,
    ) -> bool {
        if !self.supports_native(&*cx.native, name) {
            tracing::debug!(target: "weft::commands", command = name, "no handler for command");
            return false;
        }
        let text = value.and_then(CommandValue::as_text);
        match cx.native.exec(cx.doc, cx.selection, name, text) {
            Ok(changed) => changed,
            Err(err) => {
                tracing::warn!(
                    target: "weft::commands",
                    command = name,
                    %err,
                    "native exec failed"
                );
                false
            }
        }
    }

    /// The cached applier for `spec`.
    ///
    /// Entries are keyed on the tag and the class family, so every
    /// `fontSize`/`foreColor` value shares one applier and one compiled
    /// pattern. The entry is switched to the requested class on the way out.
    pub(crate) fn applier(&mut self, spec: FormatSpec) -> &HtmlApplier {
        let key = (
            spec.tag_names.first().cloned().unwrap_or_default(),
            spec.class_pattern
                .as_ref()
                .map(|p| p.as_str().to_string())
                .or_else(|| spec.class_name.clone()),
        );
        match self.appliers.entry(key) {
            Entry::Occupied(entry) => {
                let applier = entry.into_mut();
                applier.set_class_name(spec.class_name);
                applier
            }
            Entry::Vacant(entry) => entry.insert(HtmlApplier::new(spec)),
        }
    }

    /// A class name that is unique within this editor.
    pub(crate) fn temp_class(&mut self) -> String {
        self.temp_counter += 1;
        format!("_weft-temp-{}", self.temp_counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_case_insensitively() {
        assert_eq!(CommandKind::from_name("bold"), Some(CommandKind::Bold));
        assert_eq!(CommandKind::from_name("insertHtml"), Some(CommandKind::InsertHtml));
        assert_eq!(CommandKind::from_name("CREATELINK"), Some(CommandKind::CreateLink));
        assert_eq!(CommandKind::from_name("strikeThrough"), None);
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_name(kind.name()), Some(*kind));
        }
    }

    #[test]
    fn test_attribute_pairs() {
        let value = CommandValue::attributes([("className", "wide"), ("src", "a.png")]);
        assert_eq!(
            value.attribute_pairs("src"),
            vec![
                ("class".to_string(), "wide".to_string()),
                ("src".to_string(), "a.png".to_string())
            ]
        );
        assert_eq!(
            CommandValue::from("x.png").attribute_pairs("src"),
            vec![("src".to_string(), "x.png".to_string())]
        );
    }

    #[test]
    fn test_applier_cache_reuses_entries() {
        let mut commands = Commands::new();
        commands.applier(FormatSpec::tag("b"));
        commands.applier(FormatSpec::tag("b"));
        commands.applier(FormatSpec::tag("span").with_class("x", None));
        assert_eq!(commands.appliers.len(), 2);
    }

    #[test]
    fn test_applier_cache_keeps_one_entry_per_class_family() {
        let family = regex::Regex::new("wysiwyg-color-[0-9a-z]+").unwrap();
        let mut commands = Commands::new();
        for color in ["red", "green", "blue"] {
            let spec = FormatSpec::tag("span")
                .with_class(format!("wysiwyg-color-{color}"), Some(family.clone()));
            let applier = commands.applier(spec);
            assert_eq!(
                applier.spec().class_name.as_deref(),
                Some(format!("wysiwyg-color-{color}").as_str())
            );
        }
        assert_eq!(commands.appliers.len(), 1);
    }
}
