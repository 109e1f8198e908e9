//! Error types for DOM tree operations.

use miette::Diagnostic;
use thiserror::Error;

use crate::NodeId;

/// Errors that can occur while mutating the tree.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DomError {
    /// The node id does not refer to a live node.
    #[error("invalid node id {0:?}")]
    #[diagnostic(code(weft::dom::invalid_node))]
    InvalidNode(NodeId),

    /// Inserting the node would create a cycle or put a child under a leaf.
    #[error("hierarchy request error: {0}")]
    #[diagnostic(code(weft::dom::hierarchy))]
    HierarchyRequest(&'static str),

    /// The operation needs an element node.
    #[error("node {0:?} is not an element")]
    #[diagnostic(code(weft::dom::not_element))]
    NotAnElement(NodeId),

    /// The operation needs a text node.
    #[error("node {0:?} is not a text node")]
    #[diagnostic(code(weft::dom::not_text))]
    NotText(NodeId),

    /// The node is detached but the operation needs a parent.
    #[error("node {0:?} has no parent")]
    #[diagnostic(code(weft::dom::no_parent))]
    NoParent(NodeId),

    /// An offset is past the end of the node.
    #[error("offset {offset} out of bounds for node of length {len}")]
    #[diagnostic(code(weft::dom::offset))]
    OffsetOutOfBounds { offset: usize, len: usize },
}

/// Result type for DOM operations.
pub type DomResult<T> = std::result::Result<T, DomError>;
