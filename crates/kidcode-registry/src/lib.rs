//! Kidcode block registry.
//!
//! [`BlockRegistry`] is the process-wide catalog of block type schemas.
//! It is filled once (see [`BlockRegistry::builtin`]) and then shared
//! read-only with every editing session.

pub mod catalog;
pub mod reference;
mod registry;

pub use registry::BlockRegistry;
