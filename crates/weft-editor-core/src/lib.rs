//! weft-editor-core: rich-text editing commands over a weft-dom tree.
//!
//! This crate provides:
//! - `Range` / `Selection` - DOM ranges with save/restore around edits
//! - `HtmlApplier` - toggles inline tag/class formatting over a range
//! - `convert_to_list` / `resolve_list` - list surgery
//! - `auto_link` - turns plain-text URLs into anchors
//! - `Commands` - the `exec`/`state`/`value` command registry
//! - `Composer` - one editable document with undo, key handling and fixups

pub mod actions;
pub mod applier;
pub mod autolink;
pub mod commands;
pub mod composer;
pub mod config;
pub mod error;
pub mod lists;
pub mod native;
pub mod range;
pub mod selection;
pub mod undo;

pub use actions::{Key, KeydownResult, Modifiers};
pub use applier::{FormatSpec, HtmlApplier, tag_names_with_alias};
pub use autolink::{
    AutoLinkOptions, LinkMatch, URL_PATTERN, auto_link, auto_link_with, find_links, href_for,
};
pub use commands::{CommandContext, CommandKind, CommandState, CommandValue, Commands};
pub use composer::{CommandObserver, Composer, PendingTask};
pub use config::EditorConfig;
pub use error::{EditorError, EditorResult, NativeError};
pub use lists::{ListType, convert_to_list, is_list, rename_list, resolve_list};
pub use native::{NativeCommands, NoNativeCommands};
pub use range::{BoundaryPoint, Range};
pub use selection::Selection;
pub use smol_str::SmolStr;
pub use undo::{HtmlUndoManager, UndoManager};
pub use weft_dom::{Document, NodeId};
