//! Lexical analyzer for context statements.
//!
//! The lexer converts statement text into a stream of [`Token`]s for the
//! [`parser`](super::parser). It recovers from errors by skipping a single
//! character, so every problem in a line is reported in one pass.

use winnow::{
    Parser as _,
    ascii::{digit0, digit1},
    combinator::{alt, not, opt, peek, preceded},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{one_of, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ScriptError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Parse a quoted string literal.
///
/// Both `"` and `'` delimit strings. The opening quote must be matched by
/// the same character, and a doubled quote stands for one literal quote:
/// `'it''s'` lexes to `it's`. Strings do not span lines.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start = input.current_token_start();

    let rest: &'a str = **input;
    let Some(quote) = rest.chars().next().filter(|c| matches!(c, '"' | '\'')) else {
        return Err(ErrMode::Backtrack(ContextError::new()));
    };
    input.next_token();

    let mut content = String::new();
    loop {
        let rest: &'a str = **input;
        let stop = rest.find(|c: char| c == quote || c == '\n' || c == '\r');

        match stop {
            Some(idx) if rest[idx..].starts_with(quote) => {
                content.push_str(&rest[..idx]);
                input.next_slice(idx + quote.len_utf8());

                let after: &'a str = **input;
                if after.starts_with(quote) {
                    content.push(quote);
                    input.next_token();
                } else {
                    return Ok(Token::StringLiteral(content));
                }
            }
            _ => {
                input.next_slice(stop.unwrap_or(rest.len()));
                return Err(ErrMode::Cut(ContextError::new().add_context(
                    input,
                    &input.checkpoint(),
                    LexerDiagnostic {
                        code: ErrorCode::E001,
                        message: "unterminated string literal",
                        help: Some("close the string on the same line; double a quote to embed it"),
                        start,
                    },
                )));
            }
        }
    }
}

/// Parse an exponent suffix: `e3`, `E-2`, `d+1`.
fn exponent<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    (
        one_of(['e', 'E', 'd', 'D']),
        opt(one_of(['+', '-'])),
        digit1,
    )
        .void()
        .parse_next(input)
}

/// Parse a number literal: `3`, `2.5`, `.5`, `1e-3`, `1d3`.
fn number_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    (
        alt(((digit1, opt(('.', digit0))).void(), ('.', digit1).void())),
        opt(exponent),
        // Reject `2x` rather than splitting it into two tokens
        peek(not(one_of(|c: char| c.is_ascii_alphanumeric() || c == '_'))),
    )
        .take()
        .verify_map(|text: &str| text.replace(['d', 'D'], "e").parse::<f64>().ok())
        .map(Token::Number)
        .parse_next(input)
}

/// Parse line comment starting with '//'
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Parse identifiers, including `%`-prefixed constants.
fn identifier<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '%'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .map(Token::Identifier)
        .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        '+'.value(Token::Plus),
        '-'.value(Token::Minus),
        '*'.value(Token::Star),
        '/'.value(Token::Slash),
        '^'.value(Token::Caret),
        '='.value(Token::Equals),
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        ','.value(Token::Comma),
        ';'.value(Token::Semicolon),
    ))
    .parse_next(input)
}

/// Parse whitespace (spaces, tabs, etc. but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse newline
fn newline<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<'a, PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,      // Must come before single char '/'
        string_literal,    // Must come before any single char
        number_literal,    // Must come before single char '.'
        identifier,        // Must come before single chars
        single_char_token, // Single character tokens
        newline,           // Must come before whitespace
        whitespace,        // General whitespace
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    let span = Span::new(start_pos..end_pos);

    Ok(PositionedToken::new(token, span))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    self.diagnostics.emit(Self::convert_err_mode(e, error_pos));

                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ScriptError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Falls back to E002 (unexpected character) if the error carries no
    /// lexer context.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos);

            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Tokenize statement text, collecting every lexical error.
///
/// # Errors
///
/// Returns a [`ScriptError`] holding one diagnostic per problem found.
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ScriptError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}
