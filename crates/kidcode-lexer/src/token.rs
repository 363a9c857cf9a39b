//! Token types for program text.

use kidcode_types::Span;
use std::fmt;

/// A single token with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every token kind in program text.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──
    /// `42`, `3.5`
    Number(f64),
    /// `"hello"`, escapes already resolved.
    Str(String),

    /// Host function name.
    Identifier(String),

    // ── Punctuation & operators ──
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,

    /// Ends a call.
    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Str(s) => write!(f, "string \"{s}\""),
            Self::Identifier(name) => write!(f, "'{name}'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::Comma => f.write_str("','"),
            Self::Plus => f.write_str("'+'"),
            Self::Minus => f.write_str("'-'"),
            Self::Star => f.write_str("'*'"),
            Self::Slash => f.write_str("'/'"),
            Self::Newline => f.write_str("end of line"),
            Self::Eof => f.write_str("end of program"),
        }
    }
}
