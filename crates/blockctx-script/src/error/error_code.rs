//! Error codes for the script diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Evaluation errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but never closed on the same line.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that does not start any token.
    E002,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before a complete statement was parsed.
    E101,

    /// Expression nested too deeply.
    ///
    /// Parentheses, brackets, prefix signs, exponents or operator chains
    /// exceed the nesting limit.
    E102,

    // =========================================================================
    // Evaluation Errors (E2xx)
    // =========================================================================
    /// Undefined variable.
    ///
    /// A name was read that is bound neither by an earlier statement nor by
    /// the session.
    E200,

    /// Unknown function.
    E201,

    /// Wrong number of arguments.
    E202,

    /// Type mismatch.
    ///
    /// An operator or function was applied to values it does not support,
    /// such as adding a string to a number.
    E203,

    /// Dimension mismatch.
    ///
    /// Element-wise arithmetic between vectors of different lengths.
    E204,

    /// Assignment to a predefined constant such as `%pi`.
    E205,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "expression nested too deeply",
            ErrorCode::E200 => "undefined variable",
            ErrorCode::E201 => "unknown function",
            ErrorCode::E202 => "wrong number of arguments",
            ErrorCode::E203 => "type mismatch",
            ErrorCode::E204 => "dimension mismatch",
            ErrorCode::E205 => "cannot assign to constant",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
