//! The token definition for the filter language.

use std::fmt;

use crate::ast::Operator;

/// A token is a single unit of the language, with a specific kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// True when the token text came from a double-quoted run.
    pub fn is_quoted(&self) -> bool {
        matches!(self.kind, TokenKind::Quoted(_))
    }
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Punctuation
    LParen, // (
    RParen, // )

    // Logical operators
    And, // &&
    Or,  // ||

    // Comparison operators: = != < <= > >=
    Op(Operator),

    // Literals
    Literal(String),
    Quoted(String), // content between double quotes, quotes stripped
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::And => f.write_str("AND"),
            TokenKind::Or => f.write_str("OR"),
            TokenKind::Op(op) => write!(f, "{op}"),
            TokenKind::Literal(text) | TokenKind::Quoted(text) => f.write_str(text),
        }
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
