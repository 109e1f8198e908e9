//! Node storage types.

use slotmap::new_key_type;
use smol_str::SmolStr;

new_key_type! {
    /// Stable handle to a node in a [`Document`](crate::Document).
    ///
    /// Ids stay valid while the node is moved around the tree and become
    /// invalid once the node is removed.
    pub struct NodeId;
}

/// Elements that never have children and serialize without a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text (not parsed, not escaped).
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements that render as blocks.
///
/// There is no layout engine behind the tree, so "block" is decided by tag
/// name. The list follows the HTML default stylesheet.
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "dialog", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hgroup", "hr", "li", "main", "menu", "nav", "ol", "p", "pre", "section", "table",
    "ul",
];

/// Invisible placeholder character used to give empty inline elements a caret position.
pub const INVISIBLE_SPACE: char = '\u{FEFF}';

/// What kind of node this is, with its kind-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// Tag name and attributes of an element.
///
/// Tag and attribute names are always ASCII-lowercase. Attribute order is
/// preserved for stable serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: SmolStr,
    pub attrs: Vec<(SmolStr, String)>,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: SmolStr::new(name.to_ascii_lowercase()),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self
                .attrs
                .push((SmolStr::new(name.to_ascii_lowercase()), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn is_void(&self) -> bool {
        is_void_element(&self.name)
    }
}

/// Internal per-node record stored in the arena.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            kind,
        }
    }
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

pub fn is_block_element(name: &str) -> bool {
    BLOCK_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}
