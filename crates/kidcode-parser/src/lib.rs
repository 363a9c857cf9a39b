//! Kidcode parser: converts a token stream into a [`Script`].
//!
//! [`parse_source`] runs the lexer and the parser in one step and is what
//! the sandbox uses.

mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::{ParseResult, Parser, MAX_NESTING};

use kidcode_lexer::Lexer;
use kidcode_types::script::Script;
use kidcode_types::{BlockError, SourceFile};

/// Lex and parse `source`. Errors from both stages are returned together,
/// lexer errors first.
pub fn parse_source(source: &SourceFile) -> Result<Script, Vec<BlockError>> {
    let lexed = Lexer::new(source).lex();
    let mut errors = lexed.errors;
    let parsed = Parser::new(lexed.tokens).parse();
    errors.extend(parsed.errors);
    if errors.is_empty() {
        Ok(parsed.script)
    } else {
        Err(errors)
    }
}
