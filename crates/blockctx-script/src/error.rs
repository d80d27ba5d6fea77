//! Error and diagnostic system for the script engine.
//!
//! Lexing, parsing and evaluation all report problems as [`Diagnostic`]s:
//! a message with an optional [`ErrorCode`], labeled source spans and help
//! text. One or more diagnostics are returned wrapped in a [`ScriptError`].
//!
//! # Example
//!
//! ```
//! # use blockctx_script::error::{Diagnostic, ErrorCode};
//! # use blockctx_script::Span;
//!
//! let diag = Diagnostic::error("undefined variable `gain`")
//!     .with_code(ErrorCode::E200)
//!     .with_label(Span::new(4..8), "not defined in this context")
//!     .with_help("define `gain` in an enclosing context or mask");
//! assert_eq!(diag.to_string(), "error: undefined variable `gain`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod script_error;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use script_error::ScriptError;
