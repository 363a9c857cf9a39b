//! Core parser infrastructure: token cursor, error reporting, helpers.

use kidcode_lexer::token::{Token, TokenKind};
use kidcode_lexer::MAX_ERRORS;
use kidcode_types::script::Script;
use kidcode_types::{BlockError, ErrorCode, Span};

/// Maximum expression nesting (parentheses and unary minus count).
pub const MAX_NESTING: u32 = 64;

// Any expression the code generator can emit must parse.
const _: () = assert!(MAX_NESTING as usize >= kidcode_types::MAX_VALUE_DEPTH + 2);

/// The program text parser.
///
/// Consumes a token stream produced by the lexer and builds a [`Script`].
/// Collects errors and resumes at the next line after each one.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<BlockError>,
    /// Current expression nesting depth.
    pub(crate) expr_depth: u32,
}

/// Result of parsing. `script` holds every call that parsed cleanly.
pub struct ParseResult {
    pub script: Script,
    pub errors: Vec<BlockError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            expr_depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.peek().map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.peek().cloned();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek()
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(1, 1))
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// Expect a specific token kind, reporting an error if it is missing.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Span> {
        if self.check(expected) {
            self.advance().map(|t| t.span)
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected {expected}, got {}", self.peek_kind()),
            );
            None
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.errors.push(BlockError::new(code, message).with_span(span));
    }

    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.len() >= MAX_ERRORS
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip to the start of the next line.
    pub(crate) fn synchronize(&mut self) {
        while !self.at_end() {
            if self.eat(&TokenKind::Newline) {
                self.skip_newlines();
                return;
            }
            self.advance();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a [`Script`].
    pub fn parse(mut self) -> ParseResult {
        let script = self.parse_script();
        ParseResult {
            script,
            errors: self.errors,
        }
    }
}
