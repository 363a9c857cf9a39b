//! Program text lexer.
//!
//! - Identifiers, numbers, double-quoted strings with `\\ \" \n \t` escapes
//! - `( ) , + - * /`
//! - Newlines are tokens (one call per line); spaces, tabs and `\r` are skipped
//! - Error recovery: collects up to [`MAX_ERRORS`] errors instead of
//!   stopping at the first

use kidcode_types::{BlockError, ErrorCode, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// Lexing stops after this many errors.
pub const MAX_ERRORS: usize = 20;

pub struct Lexer<'src> {
    source: &'src str,
    /// Byte offset into `source`.
    pos: usize,
    line: u32,
    col: u32,
    errors: Vec<BlockError>,
}

/// Result of lexing: tokens plus any errors collected.
pub struct LexResult {
    /// Always ends with [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    pub errors: Vec<BlockError>,
}

impl LexResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: &source_file.source,
            pos: 0,
            line: 1,
            col: 1,
            errors: Vec::new(),
        }
    }

    /// Lex the whole text.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.len() >= MAX_ERRORS {
                tokens.push(Token::new(TokenKind::Eof, self.current_span()));
                break;
            }
            let token = self.scan();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.errors.push(BlockError::new(code, message).with_span(span));
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    fn scan(&mut self) -> Token {
        loop {
            if self.errors.len() >= MAX_ERRORS {
                return Token::new(TokenKind::Eof, self.current_span());
            }
            while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
                self.advance();
            }

            let start_line = self.line;
            let start_col = self.col;
            let Some(ch) = self.advance() else {
                return Token::new(TokenKind::Eof, self.current_span());
            };
            let single = |lexer: &Self, kind| Token::new(kind, lexer.span_from(start_line, start_col));

            return match ch {
                '\n' => single(self, TokenKind::Newline),
                '(' => single(self, TokenKind::LParen),
                ')' => single(self, TokenKind::RParen),
                ',' => single(self, TokenKind::Comma),
                '+' => single(self, TokenKind::Plus),
                '-' => single(self, TokenKind::Minus),
                '*' => single(self, TokenKind::Star),
                '/' => single(self, TokenKind::Slash),
                '"' => self.scan_string(start_line, start_col),
                '0'..='9' | '.' => self.scan_number(ch, start_line, start_col),
                c if c.is_ascii_alphabetic() || c == '_' => {
                    self.scan_identifier(ch, start_line, start_col)
                }
                other => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        format!("unexpected character '{}'", other.escape_debug()),
                        span,
                    );
                    continue;
                }
            };
        }
    }

    fn scan_identifier(&mut self, first: char, start_line: u32, start_col: u32) -> Token {
        let mut name = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(
            TokenKind::Identifier(name),
            self.span_from(start_line, start_col),
        )
    }

    fn scan_number(&mut self, first: char, start_line: u32, start_col: u32) -> Token {
        let mut text = String::from(first);
        let mut seen_dot = first == '.';
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                seen_dot |= c == '.';
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        // Exponent, as produced by float formatting of very large values.
        if matches!(self.peek(), Some('e' | 'E')) {
            text.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.advance();
            }
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                text.push(c);
                self.advance();
            }
        }

        let span = self.span_from(start_line, start_col);
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Token::new(TokenKind::Number(n), span),
            _ => {
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("'{text}' is not a number"),
                    span,
                );
                Token::new(TokenKind::Number(0.0), span)
            }
        }
    }

    fn scan_string(&mut self, start_line: u32, start_col: u32) -> Token {
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start_line, start_col);
                    self.errors.push(
                        BlockError::new(ErrorCode::UNTERMINATED_STRING, "unterminated string")
                            .with_span(span)
                            .with_suggestion("close the string with '\"'"),
                    );
                    return Token::new(TokenKind::Str(value), span);
                }
                Some('"') => {
                    self.advance();
                    return Token::new(TokenKind::Str(value), self.span_from(start_line, start_col));
                }
                Some('\\') => {
                    let esc_line = self.line;
                    let esc_col = self.col;
                    self.advance();
                    match self.advance() {
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        other => {
                            let shown = other.map(|c| c.to_string()).unwrap_or_default();
                            let span = self.span_from(esc_line, esc_col);
                            self.emit_error(
                                ErrorCode::UNEXPECTED_CHARACTER,
                                format!("unknown escape '\\{shown}'"),
                                span,
                            );
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> LexResult {
        let sf = SourceFile::new("program", src);
        Lexer::new(&sf).lex()
    }

    #[test]
    fn empty_text_is_eof() {
        let result = lex("");
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn string_spans_cover_quotes() {
        let result = lex("say(\"hi\")");
        assert_eq!(result.tokens[2].kind, TokenKind::Str("hi".into()));
        assert_eq!(result.tokens[2].span, Span::new(1, 5, 1, 8));
    }

    #[test]
    fn newline_advances_line() {
        let result = lex("a\nb");
        assert_eq!(result.tokens[2].span.line, 2);
        assert_eq!(result.tokens[2].span.column, 1);
    }
}
