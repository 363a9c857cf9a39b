//! Source mapping: generated line → originating block.
//!
//! Lets the session point an execution fault (which carries a line number)
//! back at the block that produced the failing call.

use kidcode_types::BlockId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMap {
    pub entries: Vec<SourceMapEntry>,
}

/// One generated line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMapEntry {
    /// 1-based line in the generated text.
    pub line: u32,
    pub block: BlockId,
    pub type_id: String,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: u32, block: BlockId, type_id: impl Into<String>) {
        self.entries.push(SourceMapEntry {
            line,
            block,
            type_id: type_id.into(),
        });
    }

    /// The block that produced `line`.
    pub fn block_at(&self, line: u32) -> Option<BlockId> {
        self.entries
            .iter()
            .find(|e| e.line == line)
            .map(|e| e.block)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
