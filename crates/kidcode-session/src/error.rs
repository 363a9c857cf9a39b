//! Session error type.

use kidcode_codegen::CodegenError;
use kidcode_eval::ExecutionError;
use kidcode_types::{BlockError, BlockId, ErrorCode};
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// A registry, graph or document error.
    #[error(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// The program faulted while running. `block` is the statement whose
    /// line faulted, when it can be traced.
    #[error("{error}")]
    Execution {
        error: ExecutionError,
        block: Option<BlockId>,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid session config: {0}")]
    Config(String),
}

impl From<ExecutionError> for SessionError {
    fn from(error: ExecutionError) -> Self {
        Self::Execution { error, block: None }
    }
}

impl SessionError {
    /// The structured form handed to the presentation layer.
    pub fn to_block_error(&self) -> BlockError {
        match self {
            Self::Block(e) => e.clone(),
            Self::Codegen(e) => e.clone().into(),
            Self::Execution { error, block } => {
                let mut e: BlockError = error.clone().into();
                e.block = *block;
                e
            }
            Self::Storage(e) => BlockError::new(ErrorCode::INTERNAL, e.to_string())
                .with_suggestion("check that the program storage is writable"),
            Self::Config(msg) => BlockError::new(ErrorCode::INTERNAL, msg.clone()),
        }
    }
}
