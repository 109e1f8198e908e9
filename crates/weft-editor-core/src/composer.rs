//! The editor a host talks to.
//!
//! A [`Composer`] owns the document and its selection and routes commands,
//! key events and deferred fixups to the pieces that implement them.

use std::collections::VecDeque;

use smol_str::SmolStr;
use weft_dom::{Document, ElementFilter, INVISIBLE_SPACE, NodeId};

use crate::actions::{Key, KeydownResult, Modifiers};
use crate::autolink::{AutoLinkOptions, URL_PATTERN, auto_link_with, href_for};
use crate::commands::{CommandContext, CommandKind, CommandState, CommandValue, Commands};
use crate::config::EditorConfig;
use crate::error::EditorResult;
use crate::native::{NativeCommands, NoNativeCommands};
use crate::range::{BoundaryPoint, Range};
use crate::selection::Selection;
use crate::undo::{HtmlUndoManager, UndoManager};

/// Blocks in which the host's own Enter handling is kept.
const NATIVE_BREAK_BLOCKS: &[&str] = &["li", "p", "h1", "h2", "h3", "h4", "h5", "h6"];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

const LIST_TAGS: &[&str] = &["ul", "ol", "menu"];

/// Markup that counts as no content at all.
const EMPTY_VALUES: &[&str] = &["", "<br>", "<p></p>", "<p><br></p>"];

/// Notified around every command the composer runs.
pub trait CommandObserver {
    fn before_command(&mut self, _command: &str, _value: Option<&CommandValue>) {}

    fn after_command(&mut self, _command: &str, _value: Option<&CommandValue>, _changed: bool) {}
}

/// Work queued for the next [`Composer::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingTask {
    /// The host handled Enter inside this kind of block.
    FixupAfterEnter { block: SmolStr },
}

pub struct Composer {
    doc: Document,
    selection: Selection,
    config: EditorConfig,
    commands: Commands,
    native: Box<dyn NativeCommands>,
    undo: Box<dyn UndoManager>,
    observers: Vec<Box<dyn CommandObserver>>,
    pending: VecDeque<PendingTask>,
}

impl Composer {
    pub fn new(config: EditorConfig) -> Self {
        let undo = HtmlUndoManager::new(config.max_undo_steps);
        Self {
            doc: Document::new(),
            selection: Selection::new(),
            config,
            commands: Commands::new(),
            native: Box::new(NoNativeCommands),
            undo: Box::new(undo),
            observers: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn from_html(html: &str, config: EditorConfig) -> Self {
        let mut composer = Self::new(config);
        composer.doc = Document::parse(html);
        composer
    }

    pub fn with_native(mut self, native: impl NativeCommands + 'static) -> Self {
        self.native = Box::new(native);
        self
    }

    pub fn with_undo_manager(mut self, undo: impl UndoManager + 'static) -> Self {
        self.undo = Box::new(undo);
        self
    }

    pub fn add_observer(&mut self, observer: impl CommandObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// Direct access to the tree, as the host's own editing would have.
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Select from `start` to `end`, in characters from the start of the content.
    pub fn set_caret(&mut self, start: usize, end: usize) {
        self.selection.set_caret_text_offset(&self.doc, start, end);
    }

    pub fn select_node(&mut self, node: NodeId) -> bool {
        self.selection.select_node(&self.doc, node)
    }

    fn context(&mut self) -> (&mut Commands, CommandContext<'_>) {
        (
            &mut self.commands,
            CommandContext {
                doc: &mut self.doc,
                selection: &mut self.selection,
                config: &self.config,
                native: &mut *self.native,
                undo: &mut *self.undo,
            },
        )
    }

    /// Run a command. Returns whether anything changed.
    pub fn exec(&mut self, command: &str, value: Option<&CommandValue>) -> bool {
        let kind = CommandKind::from_name(command);
        if !matches!(kind, Some(CommandKind::Undo | CommandKind::Redo)) {
            self.undo.transact(&self.doc, &self.selection);
        }
        for observer in &mut self.observers {
            observer.before_command(command, value);
        }
        let changed = {
            let (commands, mut cx) = self.context();
            commands.exec(&mut cx, command, value)
        };
        for observer in &mut self.observers {
            observer.after_command(command, value, changed);
        }
        changed
    }

    pub fn state(&mut self, command: &str, value: Option<&CommandValue>) -> CommandState {
        let (commands, cx) = self.context();
        commands.state(&cx, command, value)
    }

    pub fn value(&mut self, command: &str) -> Option<String> {
        let (commands, cx) = self.context();
        commands.value(&cx, command)
    }

    pub fn get_value(&self) -> String {
        self.doc.inner_html(self.doc.body())
    }

    /// Replace the content. The selection is dropped.
    pub fn set_value(&mut self, html: &str) -> EditorResult<()> {
        let body = self.doc.body();
        self.doc.set_inner_html(body, html)?;
        self.selection.clear();
        Ok(())
    }

    /// Plain text of the content, without caret placeholders.
    pub fn get_text(&self) -> String {
        self.doc
            .text_content(self.doc.body())
            .replace(INVISIBLE_SPACE, "")
    }

    pub fn is_empty(&self) -> bool {
        let value = self.get_value();
        EMPTY_VALUES.contains(&value.trim())
    }

    /// React to a key press before the host acts on it.
    pub fn handle_key_down(&mut self, key: &Key, modifiers: Modifiers) -> KeydownResult {
        if modifiers.primary() {
            let command = if key.is_char('z') {
                if modifiers.shift { "redo" } else { "undo" }
            } else if key.is_char('y') {
                "redo"
            } else {
                return KeydownResult::NotHandled;
            };
            self.exec(command, None);
            return KeydownResult::Handled;
        }

        if matches!(key, Key::Backspace | Key::Delete) {
            if let CommandState::Node(_) = self.state("insertImage", None) {
                self.exec("insertImage", None);
                return KeydownResult::Handled;
            }
            return KeydownResult::NotHandled;
        }

        let types_content = matches!(key, Key::Character(_) | Key::Space | Key::Enter);
        if !self.config.use_line_breaks && types_content && self.is_empty() {
            self.start_paragraph();
        }

        if self.config.auto_link && matches!(key, Key::Space | Key::Enter) {
            self.auto_link_at_caret();
        }

        if *key == Key::Enter && !modifiers.shift {
            if let Some(block) = self.caret_element(NATIVE_BREAK_BLOCKS, 4) {
                let block = SmolStr::new(self.doc.tag_name(block).unwrap_or_default());
                tracing::trace!(target: "weft::composer", %block, "enter left to the host");
                self.pending.push_back(PendingTask::FixupAfterEnter { block });
                return KeydownResult::PassThrough;
            }
            if self.config.use_line_breaks {
                self.exec("insertLineBreak", None);
                return KeydownResult::Handled;
            }
        }
        KeydownResult::NotHandled
    }

    /// React to a key release: keep a link's `href` in line with its text.
    pub fn handle_key_up(&mut self, key: &Key) {
        if key.is_navigation() {
            return;
        }
        let Some(anchor) = self.caret_element(&["a"], 4) else {
            return;
        };
        let text = self.doc.text_content(anchor).replace(INVISIBLE_SPACE, "");
        let text = text.trim();
        let is_url = URL_PATTERN
            .find(text)
            .is_some_and(|m| m.start() == 0 && m.end() == text.len());
        if !is_url {
            return;
        }
        let href = href_for(text);
        if self.doc.attr(anchor, "href") != Some(href.as_str()) {
            tracing::debug!(target: "weft::composer", %href, "syncing link href to its text");
            if let Err(err) = self.doc.set_attr(anchor, "href", href) {
                tracing::warn!(target: "weft::composer", %err, "could not sync href");
            }
        }
    }

    /// Insert pasted markup at the caret and link any URLs in it.
    pub fn handle_paste(&mut self, html: &str) -> bool {
        let changed = self.exec("insertHTML", Some(&CommandValue::text(html)));
        if changed && self.config.auto_link {
            let body = self.doc.body();
            self.auto_link_root(body);
        }
        changed
    }

    pub fn handle_blur(&mut self) {
        if self.config.auto_link {
            let body = self.doc.body();
            self.auto_link_root(body);
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Run the work queued by earlier events, once the host has applied its
    /// own changes.
    pub fn tick(&mut self) {
        while let Some(task) = self.pending.pop_front() {
            match task {
                PendingTask::FixupAfterEnter { block } => self.fixup_after_enter(&block),
            }
        }
    }

    /// Drop the paragraph the host made when Enter left a list or a heading.
    fn fixup_after_enter(&mut self, block: &str) {
        let Some(node) = self.selection.get_selected_node(&self.doc) else {
            return;
        };
        let left_list = block == "li"
            && self
                .doc
                .find_parent_element(node, &ElementFilter::tags(LIST_TAGS), 2)
                .is_none();
        if !(left_list || HEADINGS.contains(&block)) {
            return;
        }
        let Some(paragraph) = self.caret_element(&["p", "div"], 2) else {
            return;
        };
        let use_line_breaks = self.config.use_line_breaks;
        let result = self
            .selection
            .execute_and_restore(&mut self.doc, |doc, _| -> EditorResult<()> {
                if use_line_breaks {
                    doc.replace_with_child_nodes(paragraph)?;
                } else if !doc.has_tag(paragraph, &["p"]) {
                    doc.rename_element(paragraph, "p")?;
                }
                Ok(())
            });
        match result {
            Ok(()) => tracing::debug!(target: "weft::composer", block, "fixed up after enter"),
            Err(err) => tracing::warn!(target: "weft::composer", %err, "fixup after enter failed"),
        }
    }

    /// Nearest element with one of `tags` around the caret, within `levels`.
    fn caret_element(&self, tags: &[&str], levels: usize) -> Option<NodeId> {
        let node = self.selection.get_selected_node(&self.doc)?;
        self.doc
            .find_parent_element(node, &ElementFilter::tags(tags), levels)
    }

    fn start_paragraph(&mut self) {
        let body = self.doc.body();
        for child in self.doc.take_children(body) {
            self.doc.remove(child);
        }
        let paragraph = self.doc.create_element("p");
        if let Err(err) = self.doc.append_child(body, paragraph) {
            tracing::warn!(target: "weft::composer", %err, "could not start a paragraph");
            return;
        }
        self.selection
            .set_selection(Range::collapsed(BoundaryPoint::new(paragraph, 0)));
    }

    fn auto_link_at_caret(&mut self) {
        let Some(node) = self.selection.get_selected_node(&self.doc) else {
            return;
        };
        if self.caret_element(&["a"], 4).is_some() {
            return;
        }
        let root = if self.doc.is_text(node) {
            self.doc.parent(node).unwrap_or(node)
        } else {
            node
        };
        self.auto_link_root(root);
    }

    fn auto_link_root(&mut self, root: NodeId) {
        let options = AutoLinkOptions {
            max_display_length: self.config.max_link_display_length,
        };
        // boundary markers would split a URL the caret sits in, so the caret
        // is carried over by character offset instead
        let caret = self.selection.caret_text_offset(&self.doc);
        if let Err(err) = auto_link_with(&mut self.doc, root, &options) {
            tracing::warn!(target: "weft::composer", %err, "auto-link failed");
        }
        if let Some((start, end)) = caret {
            self.selection.set_caret_text_offset(&self.doc, start, end);
        }
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
