//! Shared types for kidcode.
//!
//! This crate defines the block schema model, field values, block ids,
//! the structured error type, source spans, and the program-text AST
//! used across every stage of the pipeline.

mod error;
mod id;
mod span;
mod value;
pub mod schema;
pub mod script;

pub use error::{BlockError, ErrorCode, ErrorKind};
pub use id::BlockId;
pub use schema::{BlockTypeSchema, DropdownOption, FieldKind, FieldSpec, SocketSpec};
pub use span::{SourceFile, Span};
pub use value::{format_number, FieldValue, ValueType};

/// Longest chain of value links allowed below any block. Generated
/// expressions nest at most one level per link, plus the argument itself
/// and a leading minus sign.
pub const MAX_VALUE_DEPTH: usize = 32;

/// Result type used throughout kidcode.
pub type Result<T> = std::result::Result<T, BlockError>;
