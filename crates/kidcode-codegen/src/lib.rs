//! Kidcode code generator: turns a program graph into program text.
//!
//! # Output
//!
//! One host call per statement block, one call per line:
//!
//! ```text
//! moveActor("RIGHT", 50)
//! actorSay("Hi")
//! ```
//!
//! Value blocks are substituted into their parent's arguments as literals
//! or `+ - * /` expressions, parenthesised by [`Precedence`] tier.
//!
//! # Dispatch
//!
//! Each block type has an [`Emitter`] registered in an [`EmitterTable`].
//! [`EmitterTable::builtin`] covers the built-in catalog; callers that add
//! block types to the registry register emitters for them the same way.

pub mod emitter;
pub mod emitters;
pub mod error;
pub mod generator;
pub mod source_map;

pub use emitter::{Emitter, EmitterTable, Expression, Fragment, Inputs, Precedence};
pub use error::{CodegenError, CodegenResult};
pub use generator::{generate, generate_with_source_map, EmptyInputPolicy, GenerateOptions};
pub use source_map::{SourceMap, SourceMapEntry};
