//! Evaluation sessions.
//!
//! An [`EvaluationSession`] is a single-threaded, stateful interpreter the
//! [`Broker`](crate::broker::Broker) hands out exclusive access to. The broker
//! only needs three things from it: store statement lines in a named slot,
//! evaluate those lines, and read back the resulting names and values.

mod script;

pub use script::ScriptSession;

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::config::SessionConfig;

/// Evaluated variables, by name.
pub type EvaluatedContext<V> = IndexMap<String, V>;

/// The content of a session slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue<V> {
    /// A string array, such as statement lines or variable names.
    Strings(Vec<String>),
    /// A list of session values.
    Values(Vec<V>),
}

/// A request to evaluate the statements stored in `context_slot` and to
/// capture the resulting variables.
///
/// After a successful evaluation `names_slot` holds the variable names and
/// `values_slot` the matching values, in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    context_slot: String,
    names_slot: String,
    values_slot: String,
}

impl EvaluationRequest {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            context_slot: config.context_slot().to_string(),
            names_slot: config.names_slot().to_string(),
            values_slot: config.values_slot().to_string(),
        }
    }

    pub fn context_slot(&self) -> &str {
        &self.context_slot
    }

    pub fn names_slot(&self) -> &str {
        &self.names_slot
    }

    pub fn values_slot(&self) -> &str {
        &self.values_slot
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The session refused to store data in a slot.
    #[error("cannot write slot `{slot}`: {reason}")]
    Write { slot: String, reason: String },

    /// The session reported an error while evaluating statements.
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// An interpreter session reachable through the broker.
pub trait EvaluationSession: Send {
    /// Values produced by evaluation.
    type Value: Clone + fmt::Debug + fmt::Display + Send;

    /// Stores `lines` in `slot`, replacing its previous content.
    fn write_lines(&mut self, slot: &str, lines: &[String]) -> Result<(), SessionError>;

    /// Evaluates the statements named by `request`.
    fn submit(&mut self, request: &EvaluationRequest) -> Result<(), SessionError>;

    /// Reads a slot, `None` if it was never written.
    fn read(&self, slot: &str) -> Option<SlotValue<Self::Value>>;
}
