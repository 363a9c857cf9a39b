//! Codegen error types.

use kidcode_types::{BlockError, BlockId, ErrorCode};
use thiserror::Error;

/// Errors that can occur while generating program text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    /// A block's type has no schema or no emitter.
    #[error("unknown block type '{type_id}' (block {block})")]
    UnknownType { block: BlockId, type_id: String },

    /// A value socket is empty and the policy rejects empty inputs.
    #[error("input '{socket}' of block {block} is empty")]
    EmptyInput { block: BlockId, socket: String },

    /// An internal consistency check failed.
    #[error("internal codegen error: {0}")]
    Internal(String),
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;

impl From<CodegenError> for BlockError {
    fn from(err: CodegenError) -> Self {
        match &err {
            CodegenError::UnknownType { block, type_id } => {
                BlockError::unknown_type(type_id).with_block(*block)
            }
            CodegenError::EmptyInput { block, .. } => {
                BlockError::new(ErrorCode::EMPTY_INPUT, err.to_string())
                    .with_block(*block)
                    .with_suggestion("connect a value block or allow empty inputs")
            }
            CodegenError::Internal(_) => BlockError::new(ErrorCode::INTERNAL, err.to_string()),
        }
    }
}
