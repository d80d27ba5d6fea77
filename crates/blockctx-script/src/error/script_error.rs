//! The ScriptError type for wrapping diagnostics.
//!
//! [`ScriptError`] wraps one or more [`Diagnostic`]s that occurred while
//! lexing, parsing or evaluating statements.

use thiserror::Error;

use crate::error::Diagnostic;

/// Error type for the script engine.
///
/// Wraps one or more diagnostics. Displays as the first diagnostic, with a
/// count of the rest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summarize(.diagnostics))]
pub struct ScriptError {
    diagnostics: Vec<Diagnostic>,
}

impl ScriptError {
    /// Create a new script error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => String::new(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (+{} more)", rest.len()),
    }
}

impl From<Diagnostic> for ScriptError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ScriptError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_script_error_from_diagnostic() {
        let diag = Diagnostic::error("undefined variable `k`").with_code(ErrorCode::E200);
        let err: ScriptError = diag.into();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.diagnostics()[0].message(), "undefined variable `k`");
    }

    #[test]
    fn test_script_error_display_single() {
        let err: ScriptError = Diagnostic::error("unknown function `foo`").into();
        assert_eq!(err.to_string(), "error: unknown function `foo`");
    }

    #[test]
    fn test_script_error_display_multiple() {
        let diags = vec![
            Diagnostic::error("first error"),
            Diagnostic::error("second error"),
            Diagnostic::error("third error"),
        ];
        let err: ScriptError = diags.into();

        assert_eq!(err.to_string(), "error: first error (+2 more)");
    }

    #[test]
    fn test_script_error_is_std_error() {
        let err: ScriptError = Diagnostic::error("type mismatch").into();
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);

        assert_eq!(boxed.to_string(), "error: type mismatch");
        assert!(boxed.source().is_none());
        assert_eq!(ScriptError::new(Vec::new()).to_string(), "");
    }
}
