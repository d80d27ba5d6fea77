//! Accumulates diagnostics across a pass.

use crate::error::{Diagnostic, ScriptError};

/// Collects diagnostics so a pass can report every problem it finds.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Returns `Ok(())` if nothing was emitted, otherwise all diagnostics.
    pub(crate) fn finish(self) -> Result<(), ScriptError> {
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(ScriptError::new(self.diagnostics))
        }
    }
}
