//! The host's own formatting primitives.
//!
//! A browser exposes `execCommand`-style operations that may be missing, may
//! claim support and then fail, or may produce markup we would rather not
//! have. Commands check [`NativeCommands::supports`] first and treat every
//! `Err` from the actual call as "nothing happened".

use weft_dom::Document;

use crate::error::NativeError;
use crate::selection::Selection;

/// Native command primitives of the embedding host.
pub trait NativeCommands {
    /// Whether the host claims to implement `command`.
    fn supports(&self, command: &str) -> bool;

    /// Run `command`. `Ok(true)` means the host changed something.
    fn exec(
        &mut self,
        doc: &mut Document,
        selection: &mut Selection,
        command: &str,
        value: Option<&str>,
    ) -> Result<bool, NativeError>;

    /// Whether `command` is active at the selection.
    fn state(
        &self,
        doc: &Document,
        selection: &Selection,
        command: &str,
        value: Option<&str>,
    ) -> Result<bool, NativeError>;

    /// Current value of `command` at the selection.
    fn value(
        &self,
        doc: &Document,
        selection: &Selection,
        command: &str,
    ) -> Result<Option<String>, NativeError>;
}

/// A host without native primitives. Every command takes the manual path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNativeCommands;

impl NativeCommands for NoNativeCommands {
    fn supports(&self, _command: &str) -> bool {
        false
    }

    fn exec(
        &mut self,
        _doc: &mut Document,
        _selection: &mut Selection,
        command: &str,
        _value: Option<&str>,
    ) -> Result<bool, NativeError> {
        Err(NativeError::new(command, "no native commands available"))
    }

    fn state(
        &self,
        _doc: &Document,
        _selection: &Selection,
        command: &str,
        _value: Option<&str>,
    ) -> Result<bool, NativeError> {
        Err(NativeError::new(command, "no native commands available"))
    }

    fn value(
        &self,
        _doc: &Document,
        _selection: &Selection,
        command: &str,
    ) -> Result<Option<String>, NativeError> {
        Err(NativeError::new(command, "no native commands available"))
    }
}
