//! Kidcode lexer: converts generated program text into a token stream.

pub mod lexer;
pub mod token;

pub use lexer::{LexResult, Lexer, MAX_ERRORS};
pub use token::{Token, TokenKind};
