//! AST for generated program text.
//!
//! Program text is a sequence of host calls, one per line:
//!
//! ```text
//! moveActor("RIGHT", 50)
//! actorSay("score: " + (2 * 21))
//! ```
//!
//! Arguments are literals combined with `+ - * /`, unary `-` and
//! parentheses. There are no variables, loops or definitions.

use crate::Span;
use std::fmt;

/// A parsed program: host calls in execution order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub calls: Vec<Call>,
}

/// `name(arg, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub function: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    Text(String),
    /// Unary minus.
    Neg(Box<Expr>),
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
