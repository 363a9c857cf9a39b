//! Runtime error types for the sandbox.

use kidcode_types::{BlockError, ErrorCode, Span};
use serde::Serialize;
use thiserror::Error;

/// A fault raised while interpreting a script.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: usize,
        found: usize,
    },

    /// A `Number` parameter received text.
    #[error("argument '{param}' of {function} must be a number, got {found}")]
    NotANumber {
        function: &'static str,
        param: &'static str,
        found: String,
    },

    #[error("cannot apply '{op}' to {operand}")]
    Operand { op: &'static str, operand: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("result of '{0}' is not a finite number")]
    Overflow(&'static str),

    /// The host returned an error.
    #[error("{function} failed: {message}")]
    Host {
        function: &'static str,
        message: String,
    },

    /// The host panicked; the panic was contained.
    #[error("{function} crashed: {message}")]
    HostPanic {
        function: &'static str,
        message: String,
    },

    #[error("step limit of {0} exceeded")]
    StepLimit(u64),
}

impl Fault {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownFunction(_) => ErrorCode::UNKNOWN_FUNCTION,
            Self::Arity { .. } | Self::NotANumber { .. } | Self::Operand { .. } => {
                ErrorCode::ARGUMENT_MISMATCH
            }
            Self::DivisionByZero => ErrorCode::DIVISION_BY_ZERO,
            Self::Overflow(_) => ErrorCode::NUMERIC_OVERFLOW,
            Self::Host { .. } | Self::HostPanic { .. } => ErrorCode::HOST_FAILURE,
            Self::StepLimit(_) => ErrorCode::STEP_LIMIT,
        }
    }
}

/// Why a run stopped early.
///
/// Syntax errors are reported before any call runs. Runtime faults are
/// reported after every earlier call has already reached the host.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{code}: {message}")]
pub struct ExecutionError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl ExecutionError {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }

    pub(crate) fn fault(fault: Fault, span: Span) -> Self {
        Self::new(fault.code(), fault.to_string(), Some(span))
    }

    /// First syntax error, mentioning how many more were found.
    pub(crate) fn syntax(mut errors: Vec<BlockError>) -> Self {
        let more = errors.len().saturating_sub(1);
        if errors.is_empty() {
            return Self::new(ErrorCode::INTERNAL, "program text was rejected", None);
        }
        let first = errors.swap_remove(0);
        let message = match more {
            0 => first.message,
            n => format!("{} (and {n} more)", first.message),
        };
        Self::new(first.code, message, first.span)
    }

    /// 1-based line of the fault, when known.
    pub fn line(&self) -> Option<u32> {
        self.span.map(|s| s.line)
    }
}

impl From<ExecutionError> for BlockError {
    fn from(err: ExecutionError) -> Self {
        let mut out = BlockError::new(err.code, err.message);
        out.span = err.span;
        out
    }
}
