use crate::{BlockId, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The failure classes surfaced to the presentation layer.
///
/// Every [`ErrorCode`] maps to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DuplicateType,
    UnknownType,
    StructuralError,
    TypeMismatch,
    MalformedDocument,
    /// Program text could not be read or run.
    ExecutionError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DuplicateType => "duplicate_type",
            Self::UnknownType => "unknown_type",
            Self::StructuralError => "structural_error",
            Self::TypeMismatch => "type_mismatch",
            Self::MalformedDocument => "malformed_document",
            Self::ExecutionError => "execution_error",
        };
        f.write_str(name)
    }
}

/// Numeric error code (E100–E699).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Registry (E100–E199) ──
    pub const DUPLICATE_TYPE: Self = Self(100);
    pub const UNKNOWN_TYPE: Self = Self(110);

    // ── Structure (E200–E299) ──
    pub const UNKNOWN_BLOCK: Self = Self(200);
    pub const UNKNOWN_FIELD: Self = Self(201);
    pub const UNKNOWN_SOCKET: Self = Self(202);
    pub const ALREADY_CONNECTED: Self = Self(203);
    pub const SEQUENCING_FORBIDDEN: Self = Self(204);
    pub const SOCKET_OCCUPIED: Self = Self(205);
    pub const CYCLE: Self = Self(206);
    pub const INVALID_SCHEMA: Self = Self(207);
    pub const EMPTY_INPUT: Self = Self(208);
    pub const VALUE_TOO_DEEP: Self = Self(209);

    // ── Types (E300–E399) ──
    pub const TYPE_MISMATCH: Self = Self(300);
    pub const INVALID_FIELD_VALUE: Self = Self(301);

    // ── Documents (E400–E499) ──
    pub const MALFORMED_DOCUMENT: Self = Self(400);
    pub const UNSUPPORTED_VERSION: Self = Self(401);
    pub const DANGLING_REFERENCE: Self = Self(402);
    pub const DUPLICATE_ID: Self = Self(403);

    // ── Program text (E500–E599) ──
    pub const UNEXPECTED_CHARACTER: Self = Self(500);
    pub const UNTERMINATED_STRING: Self = Self(501);
    pub const UNEXPECTED_TOKEN: Self = Self(502);
    pub const INVALID_NUMBER: Self = Self(503);
    pub const NESTING_LIMIT: Self = Self(504);

    // ── Execution (E600–E699) ──
    pub const UNKNOWN_FUNCTION: Self = Self(600);
    pub const ARGUMENT_MISMATCH: Self = Self(601);
    pub const DIVISION_BY_ZERO: Self = Self(602);
    pub const HOST_FAILURE: Self = Self(603);
    pub const STEP_LIMIT: Self = Self(604);
    pub const NUMERIC_OVERFLOW: Self = Self(605);
    pub const INTERNAL: Self = Self(699);

    /// Get the kind for this error code.
    pub fn kind(self) -> ErrorKind {
        match self.0 {
            100..=109 => ErrorKind::DuplicateType,
            110..=199 => ErrorKind::UnknownType,
            200..=299 => ErrorKind::StructuralError,
            300..=399 => ErrorKind::TypeMismatch,
            400..=499 => ErrorKind::MalformedDocument,
            _ => ErrorKind::ExecutionError,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured kidcode error.
///
/// Carries enough context for the presentation layer to show a message
/// without parsing free-form strings.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code} [{kind}] {message}")]
pub struct BlockError {
    pub code: ErrorCode,
    /// Derived from `code`.
    pub kind: ErrorKind,
    pub message: String,
    /// The block the error is about, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockId>,
    /// Location in program text, for syntax errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl BlockError {
    /// Create a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: code.kind(),
            message: message.into(),
            block: None,
            span: None,
            suggestion: None,
        }
    }

    pub fn unknown_type(type_id: &str) -> Self {
        Self::new(
            ErrorCode::UNKNOWN_TYPE,
            format!("unknown block type '{type_id}'"),
        )
    }

    pub fn unknown_block(id: BlockId) -> Self {
        Self::new(ErrorCode::UNKNOWN_BLOCK, format!("no block with id {id}")).with_block(id)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MALFORMED_DOCUMENT, message)
    }

    pub fn with_block(mut self, block: BlockId) -> Self {
        self.block = Some(block);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Re-classify any error as a document error, keeping its message.
    ///
    /// Used when a document is rebuilt through the ordinary graph
    /// operations: whatever they reject, the document is what was wrong.
    pub fn into_malformed(self) -> Self {
        if self.kind == ErrorKind::MalformedDocument {
            return self;
        }
        let mut err = Self::malformed(format!("{} ({})", self.message, self.code));
        err.block = self.block;
        err
    }
}
