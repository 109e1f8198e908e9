//! Error types for editor operations.

use miette::Diagnostic;
use thiserror::Error;
use weft_dom::DomError;

/// Errors raised inside command implementations.
///
/// These never reach the host through `exec`/`state`/`value`: the command
/// boundary logs them and degrades to "no change".
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum EditorError {
    /// A tree mutation failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Dom(#[from] DomError),

    /// The operation needs a selection but none is set.
    #[error("no active selection")]
    #[diagnostic(code(weft::editor::no_range))]
    NoRange,

    /// Editor configuration could not be read.
    #[error("invalid editor configuration: {0}")]
    #[diagnostic(code(weft::editor::config), help("check the JSON against EditorConfig"))]
    Config(#[from] serde_json::Error),
}

/// Result type for editor operations.
pub type EditorResult<T> = std::result::Result<T, EditorError>;

/// Error reported by a host's native formatting primitive.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("native command {command} failed: {message}")]
#[diagnostic(code(weft::editor::native))]
pub struct NativeError {
    pub command: String,
    pub message: String,
}

impl NativeError {
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
        }
    }
}
