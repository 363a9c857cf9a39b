//! Expression parsing.
//!
//! Precedence (lowest → highest):
//! 3. `+`, `-`
//! 2. `*`, `/`
//! 1. unary `-`
//!
//! Binary operators are left-associative.

use kidcode_lexer::token::TokenKind;
use kidcode_types::script::{BinOp, Expr, ExprKind};
use kidcode_types::ErrorCode;

use crate::parser::{Parser, MAX_NESTING};

impl Parser {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.nested(Self::parse_additive)
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested(&mut self, f: fn(&mut Self) -> Option<Expr>) -> Option<Expr> {
        self.expr_depth += 1;
        if self.expr_depth > MAX_NESTING {
            self.error_at_current(
                ErrorCode::NESTING_LIMIT,
                format!("expressions nest at most {MAX_NESTING} levels deep"),
            );
            self.expr_depth -= 1;
            return None;
        }
        let result = f(self);
        self.expr_depth -= 1;
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_additive(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `MulExpr = UnaryExpr { ("*" | "/") UnaryExpr }`
    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `UnaryExpr = "-" UnaryExpr | Primary`
    fn parse_unary(&mut self) -> Option<Expr> {
        if self.check(&TokenKind::Minus) {
            let start = self.current_span();
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            let span = start.merge(operand.span);
            return Some(Expr::new(ExprKind::Neg(Box::new(operand)), span));
        }
        self.parse_primary()
    }

    /// `Primary = Number | String | "(" Expr ")"`
    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.current_span();
        match self.peek_kind().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Some(Expr::new(ExprKind::Number(n), span))
            }
            TokenKind::Str(s) => {
                self.advance();
                Some(Expr::new(ExprKind::Text(s), span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                let end = self.expect(&TokenKind::RParen)?;
                Some(Expr::new(ExprKind::Paren(Box::new(inner)), span.merge(end)))
            }
            TokenKind::Identifier(name) => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("'{name}' cannot be used as a value"),
                );
                None
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected a value, got {other}"),
                );
                None
            }
        }
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}
