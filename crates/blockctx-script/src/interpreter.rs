//! Statement interpreter.
//!
//! An [`Interpreter`] owns a global variable table. [`Interpreter::run`]
//! executes statements against it, while [`Interpreter::evaluate_statements`]
//! evaluates a batch in a fresh scope that reads globals but never writes
//! them, and returns only the names the batch assigned.

use indexmap::IndexMap;
use log::{debug, trace};

use crate::{
    ast::{BinaryOp, Expr, ExprKind, Program, Statement, UnaryOp},
    builtins::{BUILTIN_NAMES, Builtin, broadcast},
    error::{Diagnostic, ErrorCode, ScriptError},
    parser::parse,
    span::Span,
    value::Value,
};

/// Returns the value of a predefined constant.
fn constant(name: &str) -> Option<Value> {
    match name {
        "%pi" => Some(Value::Number(std::f64::consts::PI)),
        "%e" => Some(Value::Number(std::f64::consts::E)),
        "%t" | "%T" => Some(Value::Bool(true)),
        "%f" | "%F" => Some(Value::Bool(false)),
        "%inf" => Some(Value::Number(f64::INFINITY)),
        "%nan" => Some(Value::Number(f64::NAN)),
        _ => None,
    }
}

/// Joins statement lines into one source text, one line per statement line.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Evaluates statements against a global variable table.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    variables: IndexMap<String, Value>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a global variable.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Returns all global variables in definition order.
    pub fn variables(&self) -> &IndexMap<String, Value> {
        &self.variables
    }

    /// Removes every global variable.
    pub fn clear(&mut self) {
        self.variables.clear();
    }

    /// Executes statements in the global scope.
    ///
    /// Assignments made before a failing statement are kept.
    ///
    /// # Errors
    ///
    /// Returns a [`ScriptError`] on syntax or evaluation errors.
    pub fn run(&mut self, source: &str) -> Result<(), ScriptError> {
        let program = parse(source)?;

        let mut scope = Scope::new(&self.variables);
        let result = scope.execute(&program);
        let assigned = scope.locals;

        trace!(assigned = assigned.len(); "Merging assignments into globals");
        self.variables.extend(assigned);
        result.map_err(ScriptError::from)
    }

    /// Evaluates statement lines in a fresh local scope.
    ///
    /// Each statement sees the globals and every earlier assignment of the
    /// batch. Globals are left untouched. Returns the names assigned by the
    /// batch in first-assignment order, each with its final value.
    ///
    /// # Errors
    ///
    /// Returns a [`ScriptError`] on the first syntax or evaluation error.
    /// Spans refer to the lines joined with `\n` (see [`join_lines`]).
    pub fn evaluate_statements<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<IndexMap<String, Value>, ScriptError> {
        let source = join_lines(lines);
        let program = parse(&source)?;

        let mut scope = Scope::new(&self.variables);
        scope.execute(&program)?;

        debug!(lines = lines.len(), bindings = scope.locals.len(); "Evaluated statements");
        Ok(scope.locals)
    }
}

/// A local scope layered over the globals.
struct Scope<'g> {
    globals: &'g IndexMap<String, Value>,
    locals: IndexMap<String, Value>,
}

impl<'g> Scope<'g> {
    fn new(globals: &'g IndexMap<String, Value>) -> Self {
        Self {
            globals,
            locals: IndexMap::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.locals
            .get(name)
            .or_else(|| self.globals.get(name))
            .cloned()
            .or_else(|| constant(name))
    }

    fn execute(&mut self, program: &Program) -> Result<(), Diagnostic> {
        for statement in &program.statements {
            match statement {
                Statement::Assign {
                    name,
                    name_span,
                    value,
                } => {
                    if constant(name).is_some() {
                        return Err(Diagnostic::error(format!("cannot assign to `{name}`"))
                            .with_code(ErrorCode::E205)
                            .with_label(*name_span, "predefined constant")
                            .with_help("choose a name that does not start with `%`"));
                    }
                    let value = self.eval(value)?;
                    self.locals.insert(name.clone(), value);
                }
                Statement::Expr(expr) => {
                    self.eval(expr)?;
                }
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr) -> Result<Value, Diagnostic> {
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            ExprKind::Variable(name) => self.lookup(name).ok_or_else(|| {
                Diagnostic::error(format!("undefined variable `{name}`"))
                    .with_code(ErrorCode::E200)
                    .with_label(expr.span, "not defined in this context")
                    .with_help(format!(
                        "define `{name}` in an enclosing context, or assign it before use"
                    ))
            }),
            ExprKind::Vector(items) => self.vector(items),
            ExprKind::Call {
                name,
                name_span,
                args,
            } => self.call(name, *name_span, args, expr.span),
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                let cells = value.numbers().ok_or_else(|| {
                    Diagnostic::error(format!("cannot negate a {}", value.type_name()))
                        .with_code(ErrorCode::E203)
                        .with_label(operand.span, ErrorCode::E203.description())
                })?;
                Ok(match op {
                    UnaryOp::Neg => Value::from_numbers(cells.into_iter().map(|n| -n).collect()),
                    UnaryOp::Plus => Value::from_numbers(cells),
                })
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary(*op, &lhs, &rhs, expr.span)
            }
        }
    }

    /// Concatenate items into a row: all numbers or all strings.
    fn vector(&self, items: &[Expr]) -> Result<Value, Diagnostic> {
        let mut numbers = Vec::new();
        let mut strings = Vec::new();

        for item in items {
            let value = self.eval(item)?;
            if let Some(cells) = value.numbers() {
                numbers.extend(cells);
            } else if let Some(cells) = value.strings() {
                strings.extend(cells);
            } else {
                return Err(Diagnostic::error(format!(
                    "a {} cannot be an element of a vector",
                    value.type_name()
                ))
                .with_code(ErrorCode::E203)
                .with_label(item.span, ErrorCode::E203.description()));
            }

            if !numbers.is_empty() && !strings.is_empty() {
                return Err(Diagnostic::error("cannot mix numbers and strings in a vector")
                    .with_code(ErrorCode::E203)
                    .with_label(item.span, ErrorCode::E203.description()));
            }
        }

        if strings.is_empty() {
            Ok(Value::from_numbers(numbers))
        } else {
            Ok(Value::from_strings(strings))
        }
    }

    /// Evaluate `name(args)`: indexing when `name` is bound, otherwise a
    /// builtin call.
    fn call(
        &self,
        name: &str,
        name_span: Span,
        args: &[Expr],
        span: Span,
    ) -> Result<Value, Diagnostic> {
        if let Some(target) = self.lookup(name) {
            return self.index(name, &target, args, span);
        }

        let Some(builtin) = Builtin::lookup(name) else {
            return Err(Diagnostic::error(format!("unknown function `{name}`"))
                .with_code(ErrorCode::E201)
                .with_label(name_span, ErrorCode::E201.description())
                .with_help(format!("available functions: {}", BUILTIN_NAMES.join(", "))));
        };

        let values = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>, _>>()?;
        builtin.call(name, values, span)
    }

    /// 1-based indexing into a vector or list.
    fn index(&self, name: &str, target: &Value, args: &[Expr], span: Span) -> Result<Value, Diagnostic> {
        let [arg] = args else {
            return Err(Diagnostic::error(format!(
                "indexing `{name}` takes 1 index, found {}",
                args.len()
            ))
            .with_code(ErrorCode::E202)
            .with_label(span, ErrorCode::E202.description()));
        };

        let position = self
            .eval(arg)?
            .as_number()
            .filter(|n| n.fract() == 0.0 && *n >= 1.0)
            .ok_or_else(|| {
                Diagnostic::error("index must be a positive integer")
                    .with_code(ErrorCode::E203)
                    .with_label(arg.span, ErrorCode::E203.description())
            })?;
        let offset = position as usize - 1;

        let item = match target {
            Value::Empty => None,
            Value::Row(cells) => cells.get(offset).map(|n| Value::Number(*n)),
            Value::Strings(cells) => cells.get(offset).cloned().map(Value::Str),
            Value::List(items) => items.get(offset).cloned(),
            scalar @ (Value::Number(_) | Value::Bool(_) | Value::Str(_)) => {
                (offset == 0).then(|| scalar.clone())
            }
        };

        item.ok_or_else(|| {
            Diagnostic::error(format!("index {position} is out of bounds for `{name}`"))
                .with_code(ErrorCode::E204)
                .with_label(arg.span, ErrorCode::E204.description())
        })
    }
}

/// Apply a binary operator element-wise.
///
/// `+` also concatenates strings. Arithmetic with `[]` yields `[]`.
fn binary(op: BinaryOp, lhs: &Value, rhs: &Value, span: Span) -> Result<Value, Diagnostic> {
    if op == BinaryOp::Add {
        if let (Some(a), Some(b)) = (lhs.strings(), rhs.strings()) {
            let cells = broadcast(&a, &b, |x, y| format!("{x}{y}"), span)?;
            return Ok(Value::from_strings(cells));
        }
    }

    let (Some(a), Some(b)) = (lhs.numbers(), rhs.numbers()) else {
        return Err(Diagnostic::error(format!(
            "cannot apply `{op}` to {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ))
        .with_code(ErrorCode::E203)
        .with_label(span, ErrorCode::E203.description()));
    };

    if a.is_empty() || b.is_empty() {
        return Ok(Value::Empty);
    }

    let apply = |x: &f64, y: &f64| match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::Pow => x.powf(*y),
    };
    broadcast(&a, &b, apply, span).map(Value::from_numbers)
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    // =========================================================================
    // Strategies
    // =========================================================================

    fn name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,6}"
    }

    fn assignments() -> impl Strategy<Value = Vec<(String, i32)>> {
        prop::collection::vec((name(), -1000i32..1000), 0..12)
    }

    // =========================================================================
    // Property Test Functions
    // =========================================================================

    /// Every name is bound to its last assigned value, in first-assignment order.
    fn check_last_write_wins(assignments: &[(String, i32)]) -> Result<(), TestCaseError> {
        let lines: Vec<String> = assignments
            .iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect();

        let bindings = Interpreter::new()
            .evaluate_statements(&lines)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let mut expected: IndexMap<String, Value> = IndexMap::new();
        for (name, value) in assignments {
            expected.insert(name.clone(), Value::Number(f64::from(*value)));
        }

        prop_assert_eq!(bindings, expected);
        Ok(())
    }

    /// Displaying a numeric result and evaluating it again gives the same value.
    fn check_display_reparses(cells: &[i32]) -> Result<(), TestCaseError> {
        let value = Value::from_numbers(cells.iter().map(|n| f64::from(*n)).collect());
        let bindings = Interpreter::new()
            .evaluate_statements(&[format!("v = {value}")])
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&bindings["v"], &value);
        Ok(())
    }

    // =========================================================================
    // Proptest Wrappers
    // =========================================================================

    proptest! {
        #[test]
        fn last_write_wins(assignments in assignments()) {
            check_last_write_wins(&assignments)?;
        }

        #[test]
        fn display_reparses(cells in prop::collection::vec(-500i32..500, 0..6)) {
            check_display_reparses(&cells)?;
        }
    }
}
