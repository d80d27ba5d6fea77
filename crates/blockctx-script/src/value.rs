//! Runtime values.

use std::fmt;

/// A value produced by evaluating an expression.
///
/// Numeric vectors and string vectors are row vectors; a one-element
/// vector collapses to the scalar variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The empty matrix `[]`.
    Empty,
    Number(f64),
    Row(Vec<f64>),
    Bool(bool),
    Str(String),
    Strings(Vec<String>),
    List(Vec<Value>),
}

impl Value {
    /// Returns a short name of the value type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty matrix",
            Value::Number(_) => "number",
            Value::Row(_) => "row vector",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
            Value::Strings(_) => "string vector",
            Value::List(_) => "list",
        }
    }

    /// Builds a numeric value from cells, collapsing to `Empty` or `Number`.
    pub fn from_numbers(mut cells: Vec<f64>) -> Self {
        match cells.len() {
            0 => Value::Empty,
            1 => Value::Number(cells.remove(0)),
            _ => Value::Row(cells),
        }
    }

    /// Builds a string value from cells, collapsing to `Empty` or `Str`.
    pub fn from_strings(mut cells: Vec<String>) -> Self {
        match cells.len() {
            0 => Value::Empty,
            1 => Value::Str(cells.remove(0)),
            _ => Value::Strings(cells),
        }
    }

    /// Returns the numeric cells, treating booleans as `0`/`1`.
    ///
    /// `None` for strings and lists.
    pub fn numbers(&self) -> Option<Vec<f64>> {
        match self {
            Value::Empty => Some(Vec::new()),
            Value::Number(n) => Some(vec![*n]),
            Value::Row(cells) => Some(cells.clone()),
            Value::Bool(b) => Some(vec![if *b { 1.0 } else { 0.0 }]),
            Value::Str(_) | Value::Strings(_) | Value::List(_) => None,
        }
    }

    /// Returns the string cells. `None` for anything but strings.
    pub fn strings(&self) -> Option<Vec<String>> {
        match self {
            Value::Str(s) => Some(vec![s.clone()]),
            Value::Strings(cells) => Some(cells.clone()),
            _ => None,
        }
    }

    /// Returns the scalar number, if this value is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Format a number the way it would be written in a statement.
///
/// Integral values print without a fractional part; non-finite values use
/// the `Inf`/`Nan` spelling.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "Nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Inf" } else { "-Inf" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => write!(f, "[]"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Row(cells) => {
                let cells: Vec<_> = cells.iter().map(|n| format_number(*n)).collect();
                write!(f, "[{}]", cells.join(","))
            }
            Value::Bool(true) => write!(f, "%t"),
            Value::Bool(false) => write!(f, "%f"),
            Value::Str(s) => write!(f, "{}", quote(s)),
            Value::Strings(cells) => {
                let cells: Vec<_> = cells.iter().map(|s| quote(s)).collect();
                write!(f, "[{}]", cells.join(","))
            }
            Value::List(items) => {
                let items: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "list({})", items.join(","))
            }
        }
    }
}
