//! Read-only views over a [`ProgramGraph`]: traversal order, statistics
//! and the id-free structural shape.

use std::collections::BTreeMap;

use kidcode_registry::BlockRegistry;
use kidcode_types::{BlockId, FieldValue};
use serde::Serialize;

use crate::{BlockInstance, ProgramGraph};

/// Depth-first walk: each root in order, then for every block its value
/// children (schema socket order) before its next block.
///
/// Created by [`ProgramGraph::traverse`]; call that again to restart.
pub struct Traverse<'g> {
    graph: &'g ProgramGraph,
    stack: Vec<BlockId>,
}

impl<'g> Iterator for Traverse<'g> {
    type Item = &'g BlockInstance;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let Some(block) = self.graph.block(id) else {
                continue;
            };
            if let Some(next) = block.next() {
                self.stack.push(next);
            }
            self.stack
                .extend(block.inputs().iter().rev().filter_map(|i| i.child));
            return Some(block);
        }
        None
    }
}

/// Block counts for the statistics panel and the achievement evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub block_count: usize,
    pub distinct_category_count: usize,
    pub per_category: BTreeMap<String, usize>,
}

/// A block and its bound values, without ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeNode {
    pub type_id: String,
    pub fields: BTreeMap<String, FieldValue>,
    pub inputs: Vec<(String, Option<ShapeNode>)>,
}

/// Every root chain in root order, each chain top to bottom. Two graphs are
/// isomorphic iff their shapes are equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphShape {
    pub roots: Vec<Vec<ShapeNode>>,
}

impl ProgramGraph {
    pub fn traverse(&self) -> Traverse<'_> {
        Traverse {
            graph: self,
            stack: self.roots().iter().rev().copied().collect(),
        }
    }

    pub fn stats(&self, registry: &BlockRegistry) -> GraphStats {
        let mut per_category: BTreeMap<String, usize> = BTreeMap::new();
        for block in self.blocks() {
            let category = registry
                .get(block.type_id())
                .map(|s| s.category.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            *per_category.entry(category).or_default() += 1;
        }
        GraphStats {
            block_count: self.len(),
            distinct_category_count: per_category.len(),
            per_category,
        }
    }

    pub fn shape(&self) -> GraphShape {
        GraphShape {
            roots: self
                .roots()
                .iter()
                .map(|&id| {
                    self.chain_from(id)
                        .into_iter()
                        .filter_map(|b| self.shape_of(b))
                        .collect()
                })
                .collect(),
        }
    }

    /// Value recursion is bounded by `MAX_VALUE_DEPTH`.
    fn shape_of(&self, id: BlockId) -> Option<ShapeNode> {
        let block = self.block(id)?;
        Some(ShapeNode {
            type_id: block.type_id().to_string(),
            fields: block.fields().clone(),
            inputs: block
                .inputs()
                .iter()
                .map(|i| (i.socket.clone(), i.child.and_then(|c| self.shape_of(c))))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(g: &ProgramGraph) -> Vec<BlockId> {
        g.traverse().map(|b| b.id()).collect()
    }

    #[test]
    fn traverse_empty() {
        assert_eq!(ProgramGraph::new().traverse().count(), 0);
    }

    #[test]
    fn traverse_visits_values_before_next() {
        let reg = BlockRegistry::builtin();
        let mut g = ProgramGraph::new();
        let say = g.insert_block(&reg, "character_say").unwrap();
        let after = g.insert_block(&reg, "play_sound").unwrap();
        let join = g.insert_block(&reg, "join_text").unwrap();
        let a = g.insert_block(&reg, "text").unwrap();
        let b = g.insert_block(&reg, "number").unwrap();
        let other_root = g.insert_block(&reg, "say_hello").unwrap();

        g.connect_statement(&reg, say, after).unwrap();
        // Bind B before A: traversal still follows socket order.
        g.connect_value(&reg, join, "B", b).unwrap();
        g.connect_value(&reg, join, "A", a).unwrap();
        g.connect_value(&reg, say, "MESSAGE", join).unwrap();

        assert_eq!(ids(&g), vec![say, join, a, b, after, other_root]);
        // Restartable.
        assert_eq!(ids(&g), ids(&g));
    }

    #[test]
    fn stats_count_categories() {
        let reg = BlockRegistry::builtin();
        let mut g = ProgramGraph::new();
        for ty in ["say_hello", "play_sound", "move_character", "text"] {
            g.insert_block(&reg, ty).unwrap();
        }
        let stats = g.stats(&reg);
        assert_eq!(stats.block_count, 4);
        assert_eq!(stats.distinct_category_count, 3);
        assert_eq!(stats.per_category["Basics"], 2);
    }

    #[test]
    fn shape_of_a_long_chain() {
        let reg = BlockRegistry::builtin();
        let mut g = ProgramGraph::new();
        let mut tail = g.insert_block(&reg, "say_hello").unwrap();
        for _ in 1..50_000 {
            let next = g.insert_block(&reg, "play_sound").unwrap();
            g.connect_statement(&reg, tail, next).unwrap();
            tail = next;
        }
        let shape = g.shape();
        assert_eq!(shape.roots.len(), 1);
        assert_eq!(shape.roots[0].len(), 50_000);
        assert_eq!(shape.roots[0][0].type_id, "say_hello");
        assert_eq!(shape, g.clone().shape());
    }

    #[test]
    fn shape_ignores_ids() {
        let reg = BlockRegistry::builtin();

        let mut left = ProgramGraph::new();
        let a = left.insert_block(&reg, "say_hello").unwrap();
        let b = left.insert_block(&reg, "play_sound").unwrap();
        left.connect_statement(&reg, a, b).unwrap();

        // Same structure, different creation order and so different ids.
        let mut right = ProgramGraph::new();
        let b2 = right.insert_block(&reg, "play_sound").unwrap();
        let a2 = right.insert_block(&reg, "say_hello").unwrap();
        right.connect_statement(&reg, a2, b2).unwrap();

        assert_eq!(left.shape(), right.shape());

        right
            .set_field(&reg, a2, "NAME", FieldValue::from("Ada"))
            .unwrap();
        assert_ne!(left.shape(), right.shape());
    }
}
