//! Arena-backed DOM tree for the weft editor.
//!
//! The tree models the subset of a browser DOM the editing commands need:
//! elements with attributes, text and comments, stable node ids, and
//! HTML fragment parsing and serialization.

pub mod document;
pub mod error;
mod html;
pub mod node;
pub mod query;

pub use document::{Ancestors, Descendants, Document, char_to_byte};
pub use error::{DomError, DomResult};
pub use node::{
    BLOCK_ELEMENTS, ElementData, INVISIBLE_SPACE, NodeId, NodeKind, VOID_ELEMENTS,
    is_block_element, is_void_element,
};
pub use query::ElementFilter;
