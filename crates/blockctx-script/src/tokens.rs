//! Token definitions for the statement language.

use std::fmt;

use crate::span::Span;

/// A lexical token.
///
/// Identifiers borrow from the source; string literals own their content
/// because doubled quotes are unescaped while lexing.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    Number(f64),
    StringLiteral(String),
    /// A name, possibly `%`-prefixed (`%pi`, `%t`).
    Identifier(&'src str),

    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Equals,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,

    LineComment(&'src str),
    Whitespace,
    Newline,
}

impl Token<'_> {
    /// Returns `true` for tokens the parser never sees.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::LineComment(_))
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::Equals => write!(f, "="),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::LineComment(text) => write!(f, "//{text}"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Newline => write!(f, "newline"),
        }
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}
