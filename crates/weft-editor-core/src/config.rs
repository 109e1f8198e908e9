//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::error::EditorResult;

/// Settings shared by the composer and the commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Separate lines with `<br>` instead of paragraphs.
    pub use_line_breaks: bool,
    /// Turn typed URLs into links on space/enter.
    pub auto_link: bool,
    /// Link text longer than this is shortened with `...`.
    pub max_link_display_length: usize,
    /// How far commands walk up the tree looking for an enclosing element.
    pub parent_lookup_depth: usize,
    pub max_undo_steps: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            use_line_breaks: true,
            auto_link: true,
            max_link_display_length: 100,
            parent_lookup_depth: 50,
            max_undo_steps: 25,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON object. Missing keys take defaults.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
