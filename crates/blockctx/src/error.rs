//! Error types for blockctx operations.
//!
//! [`BlockCtxError`] wraps every failure the resolver, the broker and the
//! mask customization model can report.

use std::io;

use thiserror::Error;

use blockctx_core::{ShapeError, node::NodeRef};
use blockctx_script::ScriptError;

use crate::{session::SessionError, store::StoreError};

/// The main error type for blockctx operations.
///
/// # Diagnostic Variants
///
/// The `Script` variant keeps the evaluated source next to the diagnostics so
/// callers can render labeled spans.
#[derive(Debug, Error)]
pub enum BlockCtxError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed mask data: {0}")]
    Shape(#[from] ShapeError),

    #[error("hierarchy above {start} does not reach a diagram within {depth} nodes")]
    Cycle { start: NodeRef, depth: usize },

    #[error("property store error: {0}")]
    Store(#[from] StoreError),

    #[error("evaluation session error: {0}")]
    Session(#[from] SessionError),

    #[error("{err}")]
    Script { err: ScriptError, src: String },

    #[error("invalid document: {0}")]
    Document(String),

    #[error("invalid document: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("row {index} is out of range for a mask with {len} entries")]
    RowOutOfRange { index: usize, len: usize },
}

impl BlockCtxError {
    /// Create a new `Script` error with the associated source text.
    pub fn new_script_error(err: ScriptError, src: impl Into<String>) -> Self {
        Self::Script {
            err,
            src: src.into(),
        }
    }
}
