//! The emitter seam: one [`Emitter`] per block type, held in an
//! [`EmitterTable`].

use std::collections::HashMap;

use kidcode_graph::BlockInstance;
use kidcode_types::ValueType;

use crate::emitters::quote;
use crate::error::{CodegenError, CodegenResult};

/// Binding strength of an emitted expression, weakest first.
///
/// A child whose tier is below the tier its socket requires is wrapped in
/// parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// A whole call argument; never needs parentheses.
    Argument,
    Additive,
    Multiplicative,
    Unary,
    Atomic,
}

/// Program text for a value block.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub code: String,
    pub tier: Precedence,
}

impl Expression {
    pub fn new(code: impl Into<String>, tier: Precedence) -> Self {
        Self {
            code: code.into(),
            tier,
        }
    }

    pub fn atomic(code: impl Into<String>) -> Self {
        Self::new(code, Precedence::Atomic)
    }

    /// The code, parenthesised if it binds weaker than `required`.
    pub fn wrap(self, required: Precedence) -> String {
        if self.tier < required {
            format!("({})", self.code)
        } else {
            self.code
        }
    }
}

/// What an emitter produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Statement blocks: whole lines, without terminators.
    Lines(Vec<String>),
    /// Expression blocks.
    Expression(Expression),
}

/// Resolved value inputs of one block, in schema socket order. Each entry
/// is already wrapped for the tier the emitter asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    entries: Vec<(String, String)>,
}

impl Inputs {
    pub fn push(&mut self, socket: impl Into<String>, code: impl Into<String>) {
        self.entries.push((socket.into(), code.into()));
    }

    /// Code for `socket`.
    pub fn code(&self, socket: &str) -> CodegenResult<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == socket)
            .map(|(_, c)| c.as_str())
            .ok_or_else(|| CodegenError::Internal(format!("input '{socket}' was not resolved")))
    }
}

/// Per-type code generation.
pub trait Emitter: Send + Sync {
    fn emit(&self, block: &BlockInstance, inputs: &Inputs) -> CodegenResult<Fragment>;

    /// Tier the code for `socket` must reach before it is substituted.
    fn input_tier(&self, _block: &BlockInstance, _socket: &str) -> Precedence {
        Precedence::Argument
    }

    /// Code used for an empty socket: `""` where text is accepted, `0`
    /// otherwise.
    fn empty_input(&self, _socket: &str, accepts: &[ValueType]) -> Expression {
        if accepts.contains(&ValueType::String) {
            Expression::atomic(quote(""))
        } else {
            Expression::atomic("0")
        }
    }
}

/// Type id → emitter.
#[derive(Default)]
pub struct EmitterTable {
    emitters: HashMap<String, Box<dyn Emitter>>,
}

impl EmitterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emitters for the built-in catalog.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.register_statements();
        table.register_values();
        table
    }

    /// Add or replace the emitter for `type_id`.
    pub fn register(&mut self, type_id: impl Into<String>, emitter: Box<dyn Emitter>) {
        self.emitters.insert(type_id.into(), emitter);
    }

    pub fn get(&self, type_id: &str) -> Option<&dyn Emitter> {
        self.emitters.get(type_id).map(|e| e.as_ref())
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.emitters.contains_key(type_id)
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }
}

impl std::fmt::Debug for EmitterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.emitters.keys().collect();
        ids.sort();
        f.debug_struct("EmitterTable").field("types", &ids).finish()
    }
}
