//! Call parsing.
//!
//! ```text
//! Script = { Newline } { Call ( Newline | Eof ) { Newline } }
//! Call   = Identifier "(" [ Expr { "," Expr } ] ")"
//! ```

use kidcode_lexer::token::TokenKind;
use kidcode_types::script::{Call, Script};
use kidcode_types::ErrorCode;

use crate::parser::Parser;

impl Parser {
    pub(crate) fn parse_script(&mut self) -> Script {
        let mut script = Script::default();
        self.skip_newlines();
        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            match self.parse_call() {
                Some(call) => {
                    script.calls.push(call);
                    self.expect_line_end();
                }
                None => self.synchronize(),
            }
        }
        script
    }

    fn parse_call(&mut self) -> Option<Call> {
        let start = self.current_span();
        let function = match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                name
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected a function name, got {other}"),
                );
                return None;
            }
        };

        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.expect(&TokenKind::RParen)?;

        Some(Call {
            function,
            args,
            span: start.merge(end),
        })
    }

    /// A call must be followed by a newline or the end of the text.
    fn expect_line_end(&mut self) {
        if self.at_end() {
            return;
        }
        if self.eat(&TokenKind::Newline) {
            self.skip_newlines();
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected end of line, got {}", self.peek_kind()),
            );
            self.synchronize();
        }
    }
}
