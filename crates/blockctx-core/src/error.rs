//! Error types for wire data.

use thiserror::Error;

/// Malformed wire data.
///
/// Raised when a value does not have the shape the mask codec expects. The
/// only repair ever applied silently is the documented substitution of the
/// legacy empty-double markers; everything else surfaces as a `ShapeError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("expected {expected} for {field}, found {found}")]
    UnexpectedType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected {field} to hold {expected} elements, found {found}")]
    Length {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("descriptions must hold at least the title")]
    MissingTitle,

    #[error("no {field} value for entry {index}")]
    MissingCell { field: &'static str, index: usize },

    #[error("a {rows}x{cols} matrix cannot hold {len} cells")]
    Dimensions { rows: usize, cols: usize, len: usize },
}
