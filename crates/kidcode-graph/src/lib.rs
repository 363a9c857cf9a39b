//! Kidcode program graph.
//!
//! [`ProgramGraph`] holds the placed blocks of one editing session: their
//! field values, statement links (`previous`/`next`), value bindings and
//! the ordered root list. The [`portable`] module converts a graph to and
//! from the JSON document used for saving and sharing.

mod graph;
pub mod portable;
mod traverse;

pub use graph::{BlockInstance, Input, ProgramGraph, ValueLink};
pub use portable::{from_portable, to_portable, PortableBlock, PortableDocument};
pub use traverse::{GraphShape, GraphStats, ShapeNode, Traverse};
