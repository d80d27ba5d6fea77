//! Evaluation session backed by the in-process interpreter.

use indexmap::IndexMap;
use log::{debug, trace};

use blockctx_script::{Interpreter, Value};

use crate::session::{EvaluationRequest, EvaluationSession, SessionError, SlotValue};

/// An [`EvaluationSession`] running statements in a [`blockctx_script::Interpreter`].
///
/// Slots live next to the interpreter globals. Evaluation runs the context
/// lines in a fresh scope over the globals, so globals set through
/// [`interpreter_mut`](Self::interpreter_mut) are visible to every request.
#[derive(Debug, Default)]
pub struct ScriptSession {
    interpreter: Interpreter,
    slots: IndexMap<String, SlotValue<Value>>,
}

impl ScriptSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}

impl EvaluationSession for ScriptSession {
    type Value = Value;

    fn write_lines(&mut self, slot: &str, lines: &[String]) -> Result<(), SessionError> {
        if slot.is_empty() {
            return Err(SessionError::Write {
                slot: slot.to_string(),
                reason: "slot name is empty".to_string(),
            });
        }
        trace!(slot, lines = lines.len(); "Writing slot");
        self.slots
            .insert(slot.to_string(), SlotValue::Strings(lines.to_vec()));
        Ok(())
    }

    fn submit(&mut self, request: &EvaluationRequest) -> Result<(), SessionError> {
        let lines = match self.slots.get(request.context_slot()) {
            Some(SlotValue::Strings(lines)) => lines.as_slice(),
            Some(SlotValue::Values(_)) => {
                return Err(SessionError::Evaluation(format!(
                    "slot `{}` does not hold statements",
                    request.context_slot()
                )));
            }
            None => &[],
        };

        let bindings = self
            .interpreter
            .evaluate_statements(lines)
            .map_err(|err| SessionError::Evaluation(err.to_string()))?;
        debug!(bindings = bindings.len(); "Captured evaluated variables");

        let (names, values): (Vec<_>, Vec<_>) = bindings.into_iter().unzip();
        self.slots
            .insert(request.names_slot().to_string(), SlotValue::Strings(names));
        self.slots
            .insert(request.values_slot().to_string(), SlotValue::Values(values));
        Ok(())
    }

    fn read(&self, slot: &str) -> Option<SlotValue<Value>> {
        self.slots.get(slot).cloned()
    }
}
