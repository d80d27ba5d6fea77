//! In-process evaluator for block context statements.
//!
//! Context and mask statements are short assignment lines such as
//! `gain = 2 * %pi` or `names = ['in', 'out']`. This crate lexes, parses and
//! evaluates them:
//!
//! - [`lexer`] and [`parser`] turn text into a [`Program`].
//! - [`Interpreter`] evaluates programs against a global variable table.
//! - [`error`] carries [`Diagnostic`]s with error codes and source spans.
//!
//! # Example
//!
//! ```
//! use blockctx_script::{Interpreter, Value};
//!
//! let mut interp = Interpreter::new();
//! interp.set("base", Value::Number(2.0));
//!
//! let bindings = interp
//!     .evaluate_statements(&["gain = base * 10", "label = 'amp'"])
//!     .unwrap();
//! assert_eq!(bindings["gain"], Value::Number(20.0));
//! assert_eq!(bindings["label"].to_string(), "\"amp\"");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod tokens;

mod builtins;
mod interpreter;
mod value;

pub use ast::Program;
pub use error::{Diagnostic, ErrorCode, ScriptError};
pub use interpreter::{Interpreter, join_lines};
pub use parser::parse;
pub use span::Span;
pub use value::Value;
