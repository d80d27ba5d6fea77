//! Parser for statement tokens.
//!
//! Transforms the token stream from the [`lexer`](super::lexer) into a
//! [`Program`]. Whitespace and comments are dropped before parsing; newlines
//! are kept because they separate statements.
//!
//! Operator precedence, loosest first:
//!
//! | level            | operators | associativity |
//! |------------------|-----------|---------------|
//! | additive         | `+ -`     | left          |
//! | multiplicative   | `* /`     | left          |
//! | unary            | `- +`     | prefix        |
//! | power            | `^`       | right         |
//!
//! so `-2^2` is `-(2^2)` and `2^-1` is `2^(-1)`.
//!
//! Nesting is capped at [`MAX_NESTING`] levels. Each prefix sign, exponent,
//! bracketed group and chained binary operator is one level; past the cap
//! parsing stops with an `E102` diagnostic.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, fail, opt, repeat, separated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{Stateful, Stream, TokenSlice},
    token::any,
};

use crate::{
    ast::{BinaryOp, Expr, ExprKind, Program, Statement, UnaryOp},
    error::{Diagnostic, ErrorCode, ScriptError},
    lexer::tokenize,
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
enum Context {
    /// Description of what was expected
    Label(&'static str),
    /// The nesting cap was reached
    Nesting,
}

/// Deepest expression nesting the parser accepts.
pub const MAX_NESTING: usize = 128;

/// Current nesting level, carried alongside the token stream.
#[derive(Debug, Clone, Copy, Default)]
struct Depth(usize);

type Input<'src> = Stateful<TokenSlice<'src, PositionedToken<'src>>, Depth>;
type IResult<O> = ModalResult<O, ContextError<Context>>;

/// Enter one nesting level, failing hard at the cap.
fn descend<'src>(input: &mut Input<'src>) -> IResult<()> {
    if input.state.0 >= MAX_NESTING {
        return cut_err(fail.context(Context::Nesting)).parse_next(input);
    }
    input.state.0 += 1;
    Ok(())
}

/// Match one specific token, returning its span.
fn punct<'src>(
    expected: Token<'static>,
) -> impl winnow::Parser<Input<'src>, Span, ErrMode<ContextError<Context>>> {
    any.verify_map(move |token: &PositionedToken<'_>| {
        (token.token == expected).then_some(token.span)
    })
}

/// Parse a statement separator: `;` or newline.
fn separator<'src>(input: &mut Input<'src>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| {
        matches!(token.token, Token::Semicolon | Token::Newline)
    })
    .void()
    .parse_next(input)
}

fn separators0<'src>(input: &mut Input<'src>) -> IResult<()> {
    repeat(0.., separator).parse_next(input)
}

fn identifier<'src>(input: &mut Input<'src>) -> IResult<(&'src str, Span)> {
    any.verify_map(|token: &PositionedToken<'src>| match token.token {
        Token::Identifier(name) => Some((name, token.span)),
        _ => None,
    })
    .context(Context::Label("identifier"))
    .parse_next(input)
}

fn number<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::Number(value) => Some(Expr::new(ExprKind::Number(value), token.span)),
        _ => None,
    })
    .parse_next(input)
}

fn string<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::StringLiteral(text) => Some(Expr::new(ExprKind::Str(text.clone()), token.span)),
        _ => None,
    })
    .parse_next(input)
}

/// Parse comma-separated expressions up to `close`, after the opening
/// delimiter has been consumed. Returns the items and the closing span.
fn items_until<'src>(
    input: &mut Input<'src>,
    close: Token<'static>,
    label: &'static str,
) -> IResult<(Vec<Expr>, Span)> {
    if let Some(span) = opt(punct(close.clone())).parse_next(input)? {
        return Ok((Vec::new(), span));
    }

    let items: Vec<Expr> = separated(1.., expression, punct(Token::Comma)).parse_next(input)?;
    let span = punct(close)
        .context(Context::Label(label))
        .parse_next(input)?;
    Ok((items, span))
}

/// Parse a variable reference or a call: `x`, `sin(x)`, `v(2)`.
fn call_or_variable<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let (name, name_span) = identifier(input)?;

    if opt(punct(Token::LeftParen)).parse_next(input)?.is_none() {
        return Ok(Expr::new(ExprKind::Variable(name.to_string()), name_span));
    }

    let (args, close) = cut_err(|i: &mut Input<'src>| items_until(i, Token::RightParen, "`)`"))
        .parse_next(input)?;

    Ok(Expr::new(
        ExprKind::Call {
            name: name.to_string(),
            name_span,
            args,
        },
        name_span.union(close),
    ))
}

/// Parse a row vector: `[]`, `[1, 2, 3]`.
fn vector<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let open = punct(Token::LeftBracket).parse_next(input)?;
    let (items, close) =
        cut_err(|i: &mut Input<'src>| items_until(i, Token::RightBracket, "`]`"))
            .parse_next(input)?;
    Ok(Expr::new(ExprKind::Vector(items), open.union(close)))
}

fn parenthesized<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let open = punct(Token::LeftParen).parse_next(input)?;
    let inner = cut_err(expression).parse_next(input)?;
    let close = cut_err(punct(Token::RightParen))
        .context(Context::Label("`)`"))
        .parse_next(input)?;
    Ok(Expr::new(inner.kind, open.union(close)))
}

fn primary<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    alt((number, string, call_or_variable, parenthesized, vector))
        .context(Context::Label("expression"))
        .parse_next(input)
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span.union(rhs.span);
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}

fn power<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let base = primary(input)?;
    if opt(punct(Token::Caret)).parse_next(input)?.is_none() {
        return Ok(base);
    }
    let exponent = cut_err(unary)
        .context(Context::Label("exponent"))
        .parse_next(input)?;
    Ok(binary(BinaryOp::Pow, base, exponent))
}

fn unary_op<'src>(input: &mut Input<'src>) -> IResult<(UnaryOp, Span)> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::Minus => Some((UnaryOp::Neg, token.span)),
        Token::Plus => Some((UnaryOp::Plus, token.span)),
        _ => None,
    })
    .parse_next(input)
}

fn unary<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    descend(input)?;
    let result = signed(input);
    input.state.0 -= 1;
    result
}

fn signed<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let Some((op, op_span)) = opt(unary_op).parse_next(input)? else {
        return power(input);
    };
    let operand = cut_err(unary)
        .context(Context::Label("operand"))
        .parse_next(input)?;
    let span = op_span.union(operand.span);
    Ok(Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    ))
}

fn multiplicative_op<'src>(input: &mut Input<'src>) -> IResult<BinaryOp> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::Star => Some(BinaryOp::Mul),
        Token::Slash => Some(BinaryOp::Div),
        _ => None,
    })
    .parse_next(input)
}

fn multiplicative<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let mut lhs = unary(input)?;
    let depth = input.state.0;
    while let Some(op) = opt(multiplicative_op).parse_next(input)? {
        descend(input)?;
        let rhs = cut_err(unary)
            .context(Context::Label("operand"))
            .parse_next(input)?;
        lhs = binary(op, lhs, rhs);
    }
    input.state.0 = depth;
    Ok(lhs)
}

fn additive_op<'src>(input: &mut Input<'src>) -> IResult<BinaryOp> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Sub),
        _ => None,
    })
    .parse_next(input)
}

fn additive<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let mut lhs = multiplicative(input)?;
    // Left-leaning chains deepen the tree by one level per operator.
    let depth = input.state.0;
    while let Some(op) = opt(additive_op).parse_next(input)? {
        descend(input)?;
        let rhs = cut_err(multiplicative)
            .context(Context::Label("operand"))
            .parse_next(input)?;
        lhs = binary(op, lhs, rhs);
    }
    input.state.0 = depth;
    Ok(lhs)
}

fn expression<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    additive(input)
}

/// Parse `name = expr` or a bare expression.
fn statement<'src>(input: &mut Input<'src>) -> IResult<Statement> {
    let checkpoint = input.checkpoint();

    if let Ok((name, name_span)) = (identifier, punct(Token::Equals))
        .map(|(target, _)| target)
        .parse_next(input)
    {
        let value = cut_err(expression)
            .context(Context::Label("value"))
            .parse_next(input)?;
        return Ok(Statement::Assign {
            name: name.to_string(),
            name_span,
            value,
        });
    }

    input.reset(&checkpoint);
    expression.map(Statement::Expr).parse_next(input)
}

fn program<'src>(input: &mut Input<'src>) -> IResult<Program> {
    let mut statements = Vec::new();
    loop {
        separators0(input)?;
        if input.eof_offset() == 0 {
            break;
        }
        statements.push(statement(input)?);
        if input.eof_offset() != 0 {
            cut_err(separator)
                .context(Context::Label("`;` or newline"))
                .parse_next(input)?;
        }
    }
    Ok(Program { statements })
}

/// Convert a winnow error into a diagnostic.
///
/// The error position is derived from the number of tokens left unconsumed.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
    source_len: usize,
) -> Diagnostic {
    let context = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().next().cloned(),
        ErrMode::Incomplete(_) => None,
    };
    let offset = tokens.len().saturating_sub(current_remaining);

    let expected = match context {
        Some(Context::Label(label)) => Some(label),
        Some(Context::Nesting) => {
            let span = tokens
                .get(offset)
                .or(tokens.last())
                .map_or(Span::new(source_len..source_len), |token| token.span);
            return Diagnostic::error(format!(
                "expression nests deeper than {MAX_NESTING} levels"
            ))
            .with_code(ErrorCode::E102)
            .with_label(span, ErrorCode::E102.description())
            .with_help("split the expression into intermediate assignments");
        }
        None => None,
    };

    match tokens.get(offset) {
        Some(found) => {
            let message = match expected {
                Some(label) => format!("unexpected `{}`, expected {label}", found.token),
                None => format!("unexpected `{}`", found.token),
            };
            Diagnostic::error(message)
                .with_code(ErrorCode::E100)
                .with_label(found.span, ErrorCode::E100.description())
        }
        None => {
            let message = match expected {
                Some(label) => format!("input ended early, expected {label}"),
                None => "input ended early".to_string(),
            };
            let span = Span::new(source_len..source_len);
            let mut diag = Diagnostic::error(message)
                .with_code(ErrorCode::E101)
                .with_label(span, ErrorCode::E101.description());
            if let Some(last) = tokens.last() {
                diag = diag.with_secondary_label(last.span, "statement is incomplete after this");
            }
            diag
        }
    }
}

/// Build a program from tokens with trivia already removed.
fn build_program(tokens: &[PositionedToken<'_>], source_len: usize) -> Result<Program, Diagnostic> {
    let mut input = Input {
        input: TokenSlice::new(tokens),
        state: Depth::default(),
    };

    program
        .parse_next(&mut input)
        .map_err(|e| convert_error(e, tokens, input.eof_offset(), source_len))
}

/// Lex and parse statement text.
///
/// # Errors
///
/// Returns every lexical diagnostic if lexing fails, or the first syntax
/// diagnostic otherwise.
pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let tokens: Vec<_> = tokenize(source)?
        .into_iter()
        .filter(|t| !t.token.is_trivia())
        .collect();

    let program = build_program(&tokens, source.len())?;
    log::trace!(statements = program.statements.len(); "Parsed statements");
    Ok(program)
}
