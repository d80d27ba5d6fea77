//! Builtin functions.

use crate::{
    error::{Diagnostic, ErrorCode},
    span::Span,
    value::{Value, format_number},
};

/// Names of every builtin, for help messages.
pub(crate) const BUILTIN_NAMES: &[&str] = &[
    "abs", "ceil", "cos", "exp", "floor", "list", "log", "max", "min", "round", "sin", "size",
    "sqrt", "string", "tan",
];

#[derive(Debug, Clone, Copy)]
pub(crate) enum Builtin {
    /// A numeric function applied to every cell.
    Elementwise(fn(f64) -> f64),
    Min,
    Max,
    Size,
    String,
    List,
}

impl Builtin {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        let builtin = match name {
            "sin" => Builtin::Elementwise(f64::sin),
            "cos" => Builtin::Elementwise(f64::cos),
            "tan" => Builtin::Elementwise(f64::tan),
            "sqrt" => Builtin::Elementwise(f64::sqrt),
            "exp" => Builtin::Elementwise(f64::exp),
            "log" => Builtin::Elementwise(f64::ln),
            "abs" => Builtin::Elementwise(f64::abs),
            "floor" => Builtin::Elementwise(f64::floor),
            "ceil" => Builtin::Elementwise(f64::ceil),
            "round" => Builtin::Elementwise(f64::round),
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "size" => Builtin::Size,
            "string" => Builtin::String,
            "list" => Builtin::List,
            _ => return None,
        };
        Some(builtin)
    }

    /// Apply the builtin to evaluated arguments.
    pub(crate) fn call(self, name: &str, args: Vec<Value>, span: Span) -> Result<Value, Diagnostic> {
        match self {
            Builtin::Elementwise(f) => {
                let arg = single(name, args, span)?;
                let cells = numeric(name, &arg, span)?;
                Ok(Value::from_numbers(cells.into_iter().map(f).collect()))
            }
            Builtin::Min => extremum(name, args, span, f64::min),
            Builtin::Max => extremum(name, args, span, f64::max),
            Builtin::Size => {
                let arg = single(name, args, span)?;
                Ok(match arg {
                    Value::Empty => Value::Row(vec![0.0, 0.0]),
                    Value::Number(_) | Value::Bool(_) | Value::Str(_) => Value::Row(vec![1.0, 1.0]),
                    Value::Row(cells) => Value::Row(vec![1.0, cells.len() as f64]),
                    Value::Strings(cells) => Value::Row(vec![1.0, cells.len() as f64]),
                    Value::List(items) => Value::Number(items.len() as f64),
                })
            }
            Builtin::String => {
                let arg = single(name, args, span)?;
                match arg {
                    Value::Empty => Ok(Value::Str(String::new())),
                    Value::Number(n) => Ok(Value::Str(format_number(n))),
                    Value::Row(cells) => Ok(Value::Strings(
                        cells.into_iter().map(format_number).collect(),
                    )),
                    Value::Bool(b) => Ok(Value::Str(if b { "T" } else { "F" }.to_string())),
                    text @ (Value::Str(_) | Value::Strings(_)) => Ok(text),
                    Value::List(_) => Err(type_mismatch(name, "list", span)),
                }
            }
            Builtin::List => Ok(Value::List(args)),
        }
    }
}

fn arity(name: &str, expected: &str, found: usize, span: Span) -> Diagnostic {
    Diagnostic::error(format!("`{name}` takes {expected}, found {found}"))
        .with_code(ErrorCode::E202)
        .with_label(span, ErrorCode::E202.description())
}

fn type_mismatch(name: &str, found: &str, span: Span) -> Diagnostic {
    Diagnostic::error(format!("`{name}` does not accept a {found}"))
        .with_code(ErrorCode::E203)
        .with_label(span, ErrorCode::E203.description())
}

fn single(name: &str, args: Vec<Value>, span: Span) -> Result<Value, Diagnostic> {
    let found = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(arg), None) => Ok(arg),
        _ => Err(arity(name, "1 argument", found, span)),
    }
}

fn numeric(name: &str, value: &Value, span: Span) -> Result<Vec<f64>, Diagnostic> {
    value
        .numbers()
        .ok_or_else(|| type_mismatch(name, value.type_name(), span))
}

/// `min(v)` reduces a vector; `min(a, b)` compares element-wise.
fn extremum(
    name: &str,
    args: Vec<Value>,
    span: Span,
    pick: fn(f64, f64) -> f64,
) -> Result<Value, Diagnostic> {
    match args.as_slice() {
        [single] => {
            let cells = numeric(name, single, span)?;
            Ok(cells
                .into_iter()
                .reduce(pick)
                .map_or(Value::Empty, Value::Number))
        }
        [lhs, rhs] => {
            let lhs = numeric(name, lhs, span)?;
            let rhs = numeric(name, rhs, span)?;
            let cells = broadcast(&lhs, &rhs, |a, b| pick(*a, *b), span)?;
            Ok(Value::from_numbers(cells))
        }
        _ => Err(arity(name, "1 or 2 arguments", args.len(), span)),
    }
}

/// Combine two vectors element-wise, broadcasting a one-element side.
pub(crate) fn broadcast<T, R>(
    lhs: &[T],
    rhs: &[T],
    f: impl Fn(&T, &T) -> R,
    span: Span,
) -> Result<Vec<R>, Diagnostic> {
    match (lhs, rhs) {
        ([x], _) => Ok(rhs.iter().map(|y| f(x, y)).collect()),
        (_, [y]) => Ok(lhs.iter().map(|x| f(x, y)).collect()),
        _ if lhs.len() == rhs.len() => Ok(lhs.iter().zip(rhs).map(|(x, y)| f(x, y)).collect()),
        _ => Err(Diagnostic::error(format!(
            "operands have {} and {} elements",
            lhs.len(),
            rhs.len()
        ))
        .with_code(ErrorCode::E204)
        .with_label(span, ErrorCode::E204.description())
        .with_help("use vectors of the same length, or a scalar")),
    }
}
