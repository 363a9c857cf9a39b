use std::collections::{BTreeMap, BTreeSet};

use kidcode_registry::BlockRegistry;
use kidcode_types::{BlockError, BlockId, ErrorCode, FieldValue, MAX_VALUE_DEPTH};
use tracing::debug;

/// The value parent of an expression block: which block and which socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueLink {
    pub owner: BlockId,
    pub socket: String,
}

/// One value socket of a block instance. Sockets are created from the
/// schema at insert time and keep schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub socket: String,
    pub child: Option<BlockId>,
}

/// A placed block.
///
/// Only [`ProgramGraph`] mutates instances, so the link fields stay
/// mutually consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockInstance {
    id: BlockId,
    type_id: String,
    fields: BTreeMap<String, FieldValue>,
    previous: Option<BlockId>,
    next: Option<BlockId>,
    inputs: Vec<Input>,
    parent: Option<ValueLink>,
}

impl BlockInstance {
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn previous(&self) -> Option<BlockId> {
        self.previous
    }

    pub fn next(&self) -> Option<BlockId> {
        self.next
    }

    /// Value sockets in schema order, bound or not.
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// The child bound to `socket`, if any.
    pub fn input(&self, socket: &str) -> Option<BlockId> {
        self.inputs
            .iter()
            .find(|i| i.socket == socket)
            .and_then(|i| i.child)
    }

    pub fn parent(&self) -> Option<&ValueLink> {
        self.parent.as_ref()
    }

    fn has_socket(&self, socket: &str) -> bool {
        self.inputs.iter().any(|i| i.socket == socket)
    }

    fn bind(&mut self, socket: &str, child: Option<BlockId>) {
        if let Some(input) = self.inputs.iter_mut().find(|i| i.socket == socket) {
            input.child = child;
        }
    }
}

/// All block instances of one editing session plus the ordered root list.
///
/// A block is a root iff it has no previous link and no value parent.
/// Every mutation checks all of its preconditions before touching state,
/// so a rejected edit leaves the graph exactly as it was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramGraph {
    blocks: BTreeMap<BlockId, BlockInstance>,
    roots: Vec<BlockId>,
    next_id: u32,
}

impl ProgramGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ══════════════════════════════════════════════════════════════════════
    // Queries
    // ══════════════════════════════════════════════════════════════════════

    pub fn block(&self, id: BlockId) -> Option<&BlockInstance> {
        self.blocks.get(&id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    /// Blocks in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockInstance> {
        self.blocks.values()
    }

    pub fn roots(&self) -> &[BlockId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn get(&self, id: BlockId) -> Result<&BlockInstance, BlockError> {
        self.blocks.get(&id).ok_or_else(|| BlockError::unknown_block(id))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Insert & field edit
    // ══════════════════════════════════════════════════════════════════════

    /// Place a new block with schema defaults. It starts as a root.
    pub fn insert_block(
        &mut self,
        registry: &BlockRegistry,
        type_id: &str,
    ) -> Result<BlockId, BlockError> {
        self.insert_block_with(registry, type_id, &[])
    }

    /// Place a new block, overlaying `initial_fields` on the schema defaults.
    pub fn insert_block_with(
        &mut self,
        registry: &BlockRegistry,
        type_id: &str,
        initial_fields: &[(&str, FieldValue)],
    ) -> Result<BlockId, BlockError> {
        let schema = registry.lookup(type_id)?;

        let mut fields: BTreeMap<String, FieldValue> = schema
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect();
        for (name, value) in initial_fields {
            let spec = schema.field(name).ok_or_else(|| {
                BlockError::new(
                    ErrorCode::UNKNOWN_FIELD,
                    format!("block type '{type_id}' has no field '{name}'"),
                )
            })?;
            fields.insert(spec.name.clone(), spec.coerce(value.clone())?);
        }

        self.next_id += 1;
        let id = BlockId(self.next_id);
        let inputs = schema
            .value_sockets()
            .map(|(name, _)| Input {
                socket: name.to_string(),
                child: None,
            })
            .collect();
        self.blocks.insert(
            id,
            BlockInstance {
                id,
                type_id: type_id.to_string(),
                fields,
                previous: None,
                next: None,
                inputs,
                parent: None,
            },
        );
        self.roots.push(id);
        debug!(block = %id, type_id, "block inserted");
        Ok(id)
    }

    /// Edit one field. Numbers are clamped to the field's range.
    pub fn set_field(
        &mut self,
        registry: &BlockRegistry,
        id: BlockId,
        name: &str,
        value: FieldValue,
    ) -> Result<(), BlockError> {
        let block = self.get(id)?;
        let schema = registry.lookup(&block.type_id)?;
        let spec = schema.field(name).ok_or_else(|| {
            BlockError::new(
                ErrorCode::UNKNOWN_FIELD,
                format!("block {id} ({}) has no field '{name}'", block.type_id),
            )
            .with_block(id)
        })?;
        let value = spec.coerce(value).map_err(|e| e.with_block(id))?;

        if let Some(block) = self.blocks.get_mut(&id) {
            debug!(block = %id, field = name, value = %value, "field set");
            block.fields.insert(name.to_string(), value);
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statement links
    // ══════════════════════════════════════════════════════════════════════

    /// Attach `child` (and the chain hanging below it) under `parent`.
    ///
    /// If `parent` already had a next block, that block moves to the tail
    /// of `child`'s chain.
    pub fn connect_statement(
        &mut self,
        registry: &BlockRegistry,
        parent: BlockId,
        child: BlockId,
    ) -> Result<(), BlockError> {
        let p = self.get(parent)?;
        let c = self.get(child)?;
        if parent == child {
            return Err(cycle(child));
        }

        let p_schema = registry.lookup(&p.type_id)?;
        let c_schema = registry.lookup(&c.type_id)?;
        if !p_schema.has_next() {
            return Err(BlockError::new(
                ErrorCode::SEQUENCING_FORBIDDEN,
                format!("block {parent} ({}) cannot have a next block", p.type_id),
            )
            .with_block(parent));
        }
        if !c_schema.has_previous() {
            return Err(BlockError::new(
                ErrorCode::SEQUENCING_FORBIDDEN,
                format!("block {child} ({}) cannot follow another block", c.type_id),
            )
            .with_block(child));
        }
        if c.previous.is_some() || c.parent.is_some() {
            return Err(BlockError::new(
                ErrorCode::ALREADY_CONNECTED,
                format!("block {child} is already connected"),
            )
            .with_block(child)
            .with_suggestion("disconnect it first"));
        }

        let chain = self.chain_from(child);
        if chain.contains(&parent) {
            return Err(cycle(child));
        }
        let tail = chain.last().copied().unwrap_or(child);
        let old_next = p.next;
        if old_next.is_some() {
            let tail_type = &self.get(tail)?.type_id;
            if !registry.lookup(tail_type)?.has_next() {
                return Err(BlockError::new(
                    ErrorCode::SEQUENCING_FORBIDDEN,
                    format!("block {tail} ({tail_type}) ends the chain; cannot splice it in"),
                )
                .with_block(tail));
            }
        }

        // All checks passed.
        self.roots.retain(|&r| r != child);
        if let Some(b) = self.blocks.get_mut(&parent) {
            b.next = Some(child);
        }
        if let Some(b) = self.blocks.get_mut(&child) {
            b.previous = Some(parent);
        }
        if let Some(old) = old_next {
            if let Some(b) = self.blocks.get_mut(&tail) {
                b.next = Some(old);
            }
            if let Some(b) = self.blocks.get_mut(&old) {
                b.previous = Some(tail);
            }
        }
        debug!(%parent, %child, spliced = old_next.is_some(), "statement connected");
        Ok(())
    }

    /// Unlink `id` from the block above it. The block and its tail become
    /// a new root at the end of the root list.
    pub fn disconnect_statement(&mut self, id: BlockId) -> Result<(), BlockError> {
        let Some(prev) = self.get(id)?.previous else {
            return Ok(());
        };
        if let Some(b) = self.blocks.get_mut(&prev) {
            b.next = None;
        }
        if let Some(b) = self.blocks.get_mut(&id) {
            b.previous = None;
        }
        self.roots.push(id);
        debug!(block = %id, "statement disconnected");
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Value links
    // ══════════════════════════════════════════════════════════════════════

    /// Bind expression block `child` into `socket` of `parent`.
    pub fn connect_value(
        &mut self,
        registry: &BlockRegistry,
        parent: BlockId,
        socket: &str,
        child: BlockId,
    ) -> Result<(), BlockError> {
        let p = self.get(parent)?;
        let c = self.get(child)?;
        let accepts = registry
            .lookup(&p.type_id)?
            .value_socket(socket)
            .ok_or_else(|| {
                BlockError::new(
                    ErrorCode::UNKNOWN_SOCKET,
                    format!("block {parent} ({}) has no input '{socket}'", p.type_id),
                )
                .with_block(parent)
            })?;
        let output = registry.lookup(&c.type_id)?.output.ok_or_else(|| {
            BlockError::new(
                ErrorCode::TYPE_MISMATCH,
                format!("block {child} ({}) does not produce a value", c.type_id),
            )
            .with_block(child)
        })?;
        if !accepts.contains(&output) {
            let expected: Vec<String> = accepts.iter().map(|t| t.to_string()).collect();
            return Err(BlockError::new(
                ErrorCode::TYPE_MISMATCH,
                format!(
                    "input '{socket}' accepts {}, found {output}",
                    expected.join(" or ")
                ),
            )
            .with_block(child));
        }

        match p.input(socket) {
            Some(bound) if bound == child => return Ok(()),
            Some(bound) => {
                return Err(BlockError::new(
                    ErrorCode::SOCKET_OCCUPIED,
                    format!("input '{socket}' of block {parent} already holds {bound}"),
                )
                .with_block(parent)
                .with_suggestion("disconnect the current value first"));
            }
            None => {}
        }
        if c.parent.is_some() || c.previous.is_some() {
            return Err(BlockError::new(
                ErrorCode::ALREADY_CONNECTED,
                format!("block {child} is already connected"),
            )
            .with_block(child));
        }
        if parent == child || self.value_ancestors(parent).contains(&child) {
            return Err(cycle(child));
        }
        let depth = self.value_ancestors(parent).len() + 1 + self.value_height(child);
        if depth > MAX_VALUE_DEPTH {
            return Err(BlockError::new(
                ErrorCode::VALUE_TOO_DEEP,
                format!("values nest at most {MAX_VALUE_DEPTH} levels deep, this would make {depth}"),
            )
            .with_block(child)
            .with_suggestion("split the calculation into smaller pieces"));
        }

        self.roots.retain(|&r| r != child);
        if let Some(b) = self.blocks.get_mut(&parent) {
            b.bind(socket, Some(child));
        }
        if let Some(b) = self.blocks.get_mut(&child) {
            b.parent = Some(ValueLink {
                owner: parent,
                socket: socket.to_string(),
            });
        }
        debug!(%parent, socket, %child, "value connected");
        Ok(())
    }

    /// Empty `socket` of `parent`. The former child becomes a root.
    pub fn disconnect_value(
        &mut self,
        parent: BlockId,
        socket: &str,
    ) -> Result<Option<BlockId>, BlockError> {
        let p = self.get(parent)?;
        if !p.has_socket(socket) {
            return Err(BlockError::new(
                ErrorCode::UNKNOWN_SOCKET,
                format!("block {parent} ({}) has no input '{socket}'", p.type_id),
            )
            .with_block(parent));
        }
        let Some(child) = p.input(socket) else {
            return Ok(None);
        };
        if let Some(b) = self.blocks.get_mut(&parent) {
            b.bind(socket, None);
        }
        if let Some(b) = self.blocks.get_mut(&child) {
            b.parent = None;
        }
        self.roots.push(child);
        debug!(%parent, socket, %child, "value disconnected");
        Ok(Some(child))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Delete
    // ══════════════════════════════════════════════════════════════════════

    /// Remove `id` and every value block bound beneath it.
    ///
    /// The block's next chain survives as a root: it takes over the deleted
    /// block's root slot when there was one, otherwise it is appended.
    /// Returns the removed ids, `id` first.
    pub fn delete_block(&mut self, id: BlockId) -> Result<Vec<BlockId>, BlockError> {
        let block = self.get(id)?;
        let previous = block.previous;
        let next = block.next;
        let parent = block.parent.clone();

        if let Some(prev) = previous {
            if let Some(b) = self.blocks.get_mut(&prev) {
                b.next = None;
            }
        }
        if let Some(link) = &parent {
            if let Some(b) = self.blocks.get_mut(&link.owner) {
                b.bind(&link.socket, None);
            }
        }

        let slot = self.roots.iter().position(|&r| r == id);
        match (slot, next) {
            (Some(i), Some(n)) => self.roots[i] = n,
            (Some(i), None) => {
                self.roots.remove(i);
            }
            (None, Some(n)) => self.roots.push(n),
            (None, None) => {}
        }
        if let Some(n) = next {
            if let Some(b) = self.blocks.get_mut(&n) {
                b.previous = None;
            }
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(inst) = self.blocks.remove(&cur) {
                removed.push(cur);
                stack.extend(inst.inputs.iter().rev().filter_map(|i| i.child));
            }
        }
        self.roots.retain(|r| !removed.contains(r));
        debug!(block = %id, removed = removed.len(), "block deleted");
        Ok(removed)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Internal helpers
    // ══════════════════════════════════════════════════════════════════════

    /// `start` followed by every block reachable through `next`.
    pub(crate) fn chain_from(&self, start: BlockId) -> Vec<BlockId> {
        let mut chain = vec![start];
        let mut seen = BTreeSet::from([start]);
        let mut cur = self.blocks.get(&start).and_then(|b| b.next);
        while let Some(id) = cur {
            if !seen.insert(id) {
                break;
            }
            chain.push(id);
            cur = self.blocks.get(&id).and_then(|b| b.next);
        }
        chain
    }

    /// Owners above `id` through value links, nearest first.
    fn value_ancestors(&self, id: BlockId) -> Vec<BlockId> {
        let mut out = Vec::new();
        let mut cur = self.blocks.get(&id).and_then(|b| b.parent.as_ref());
        while let Some(link) = cur {
            if out.contains(&link.owner) {
                break;
            }
            out.push(link.owner);
            cur = self.blocks.get(&link.owner).and_then(|b| b.parent.as_ref());
        }
        out
    }

    /// Longest chain of value links below `id`.
    fn value_height(&self, id: BlockId) -> usize {
        let mut height = 0;
        let mut stack = vec![(id, 0)];
        while let Some((cur, depth)) = stack.pop() {
            height = height.max(depth);
            if depth > MAX_VALUE_DEPTH {
                continue;
            }
            if let Some(b) = self.blocks.get(&cur) {
                stack.extend(b.inputs.iter().filter_map(|i| i.child).map(|c| (c, depth + 1)));
            }
        }
        height
    }

    /// Replace the root order. The caller guarantees `order` is a
    /// permutation of the current roots.
    pub(crate) fn reorder_roots(&mut self, order: Vec<BlockId>) {
        debug_assert_eq!(order.len(), self.roots.len());
        self.roots = order;
    }

    /// Check every structural invariant.
    ///
    /// Mutations keep these by construction; this exists for tests and for
    /// validating rebuilt graphs.
    pub fn check_invariants(&self, registry: &BlockRegistry) -> Result<(), BlockError> {
        let fail = |msg: String| Err(BlockError::new(ErrorCode::CYCLE, msg));

        for (&id, b) in &self.blocks {
            if let Some(n) = b.next {
                match self.blocks.get(&n) {
                    Some(nb) if nb.previous == Some(id) => {}
                    _ => return fail(format!("{id}.next = {n} is not mirrored")),
                }
            }
            if let Some(p) = b.previous {
                match self.blocks.get(&p) {
                    Some(pb) if pb.next == Some(id) => {}
                    _ => return fail(format!("{id}.previous = {p} is not mirrored")),
                }
            }
            for input in &b.inputs {
                let Some(child) = input.child else { continue };
                let Some(cb) = self.blocks.get(&child) else {
                    return fail(format!("{id}.{} points at missing {child}", input.socket));
                };
                let mirrored = cb
                    .parent
                    .as_ref()
                    .is_some_and(|l| l.owner == id && l.socket == input.socket);
                if !mirrored {
                    return fail(format!("{id}.{} -> {child} is not mirrored", input.socket));
                }
                let accepts = registry
                    .lookup(&b.type_id)?
                    .value_socket(&input.socket)
                    .unwrap_or(&[]);
                let output = registry.lookup(&cb.type_id)?.output;
                if !output.is_some_and(|o| accepts.contains(&o)) {
                    return Err(BlockError::new(
                        ErrorCode::TYPE_MISMATCH,
                        format!("{id}.{} holds an incompatible value", input.socket),
                    ));
                }
            }
            let is_root = b.previous.is_none() && b.parent.is_none();
            let listed = self.roots.iter().filter(|&&r| r == id).count();
            if listed != usize::from(is_root) {
                return fail(format!("{id} root listing is inconsistent"));
            }
            if self.chain_from(id).last().and_then(|t| self.blocks.get(t)?.next).is_some() {
                return fail(format!("statement chain from {id} is cyclic"));
            }
            if self.value_ancestors(id).contains(&id) {
                return fail(format!("value links above {id} are cyclic"));
            }
        }
        if self.roots.iter().any(|r| !self.blocks.contains_key(r)) {
            return fail("root list names a missing block".to_string());
        }
        Ok(())
    }
}

fn cycle(child: BlockId) -> BlockError {
    BlockError::new(
        ErrorCode::CYCLE,
        format!("connecting {child} here would create a loop"),
    )
    .with_block(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidcode_types::ErrorKind;

    fn setup() -> (BlockRegistry, ProgramGraph) {
        (BlockRegistry::builtin(), ProgramGraph::new())
    }

    #[test]
    fn insert_uses_defaults() {
        let (reg, mut g) = setup();
        let id = g.insert_block(&reg, "move_character").unwrap();
        let b = g.block(id).unwrap();
        assert_eq!(b.field("DIRECTION"), Some(&FieldValue::from("RIGHT")));
        assert_eq!(b.field("STEPS"), Some(&FieldValue::from(50)));
        assert_eq!(g.roots(), &[id]);
    }

    #[test]
    fn insert_unknown_type() {
        let (reg, mut g) = setup();
        let err = g.insert_block(&reg, "rocket").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownType);
        assert!(g.is_empty());
    }

    #[test]
    fn insert_with_bad_field_leaves_graph_empty() {
        let (reg, mut g) = setup();
        let err = g
            .insert_block_with(&reg, "play_sound", &[("SOUND", FieldValue::from("MOO"))])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert!(g.is_empty());
    }

    #[test]
    fn set_field_clamps_numbers() {
        let (reg, mut g) = setup();
        let id = g.insert_block(&reg, "move_sprite").unwrap();
        g.set_field(&reg, id, "STEPS", FieldValue::from(1000)).unwrap();
        assert_eq!(g.block(id).unwrap().field("STEPS"), Some(&FieldValue::from(100)));
    }

    #[test]
    fn set_field_unknown_name() {
        let (reg, mut g) = setup();
        let id = g.insert_block(&reg, "say_hello").unwrap();
        let err = g
            .set_field(&reg, id, "COLOUR", FieldValue::from("red"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::StructuralError);
        assert_eq!(err.block, Some(id));
    }

    #[test]
    fn connect_statement_links_both_ways() {
        let (reg, mut g) = setup();
        let a = g.insert_block(&reg, "say_hello").unwrap();
        let b = g.insert_block(&reg, "play_sound").unwrap();
        g.connect_statement(&reg, a, b).unwrap();
        assert_eq!(g.block(a).unwrap().next(), Some(b));
        assert_eq!(g.block(b).unwrap().previous(), Some(a));
        assert_eq!(g.roots(), &[a]);
        g.check_invariants(&reg).unwrap();
    }

    #[test]
    fn connect_statement_splices_chain() {
        let (reg, mut g) = setup();
        let a = g.insert_block(&reg, "say_hello").unwrap();
        let c = g.insert_block(&reg, "play_sound").unwrap();
        g.connect_statement(&reg, a, c).unwrap();

        let x = g.insert_block(&reg, "character_jump").unwrap();
        let y = g.insert_block(&reg, "character_spin").unwrap();
        g.connect_statement(&reg, x, y).unwrap();

        g.connect_statement(&reg, a, x).unwrap();
        assert_eq!(g.chain_from(a), vec![a, x, y, c]);
        assert_eq!(g.roots(), &[a]);
        g.check_invariants(&reg).unwrap();
    }

    #[test]
    fn connect_statement_rejects_cycle() {
        let (reg, mut g) = setup();
        let a = g.insert_block(&reg, "say_hello").unwrap();
        let b = g.insert_block(&reg, "play_sound").unwrap();
        g.connect_statement(&reg, a, b).unwrap();
        let before = g.clone();

        let err = g.connect_statement(&reg, b, a).unwrap_err();
        assert_eq!(err.code, ErrorCode::CYCLE);
        assert_eq!(g, before);
        assert_eq!(
            g.connect_statement(&reg, a, a).unwrap_err().code,
            ErrorCode::CYCLE
        );
    }

    #[test]
    fn connect_statement_rejects_second_parent() {
        let (reg, mut g) = setup();
        let a = g.insert_block(&reg, "say_hello").unwrap();
        let b = g.insert_block(&reg, "say_hello").unwrap();
        let c = g.insert_block(&reg, "play_sound").unwrap();
        g.connect_statement(&reg, a, c).unwrap();
        let err = g.connect_statement(&reg, b, c).unwrap_err();
        assert_eq!(err.code, ErrorCode::ALREADY_CONNECTED);
    }

    #[test]
    fn expression_cannot_be_sequenced() {
        let (reg, mut g) = setup();
        let a = g.insert_block(&reg, "say_hello").unwrap();
        let t = g.insert_block(&reg, "text").unwrap();
        let err = g.connect_statement(&reg, a, t).unwrap_err();
        assert_eq!(err.code, ErrorCode::SEQUENCING_FORBIDDEN);
        let err = g.connect_statement(&reg, t, a).unwrap_err();
        assert_eq!(err.code, ErrorCode::SEQUENCING_FORBIDDEN);
    }

    #[test]
    fn connect_value_type_mismatch_leaves_graph_unchanged() {
        let (reg, mut g) = setup();
        let say = g.insert_block(&reg, "character_say").unwrap();
        let num = g.insert_block(&reg, "number").unwrap();
        let before = g.clone();

        let err = g.connect_value(&reg, say, "MESSAGE", num).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(g, before);
    }

    #[test]
    fn connect_value_rebind_same_child_is_noop() {
        let (reg, mut g) = setup();
        let say = g.insert_block(&reg, "character_say").unwrap();
        let t = g.insert_block(&reg, "text").unwrap();
        g.connect_value(&reg, say, "MESSAGE", t).unwrap();
        let before = g.clone();
        g.connect_value(&reg, say, "MESSAGE", t).unwrap();
        assert_eq!(g, before);
        assert_eq!(g.roots(), &[say]);
    }

    #[test]
    fn connect_value_occupied_socket() {
        let (reg, mut g) = setup();
        let say = g.insert_block(&reg, "character_say").unwrap();
        let t1 = g.insert_block(&reg, "text").unwrap();
        let t2 = g.insert_block(&reg, "text").unwrap();
        g.connect_value(&reg, say, "MESSAGE", t1).unwrap();
        let err = g.connect_value(&reg, say, "MESSAGE", t2).unwrap_err();
        assert_eq!(err.code, ErrorCode::SOCKET_OCCUPIED);
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn connect_value_rejects_cycle() {
        let (reg, mut g) = setup();
        let outer = g.insert_block(&reg, "arithmetic").unwrap();
        let inner = g.insert_block(&reg, "arithmetic").unwrap();
        g.connect_value(&reg, outer, "A", inner).unwrap();
        let before = g.clone();
        let err = g.connect_value(&reg, inner, "B", outer).unwrap_err();
        assert_eq!(err.code, ErrorCode::CYCLE);
        assert_eq!(g, before);
        assert_eq!(
            g.connect_value(&reg, outer, "A", outer).unwrap_err().code,
            ErrorCode::CYCLE
        );
    }

    #[test]
    fn connect_value_rejects_deep_nesting() {
        let (reg, mut g) = setup();
        let say = g.insert_block(&reg, "character_say").unwrap();
        let mut parent = say;
        let mut socket = "MESSAGE";
        for _ in 0..MAX_VALUE_DEPTH {
            let join = g.insert_block(&reg, "join_text").unwrap();
            g.connect_value(&reg, parent, socket, join).unwrap();
            parent = join;
            socket = "B";
        }
        let leaf = g.insert_block(&reg, "text").unwrap();
        let before = g.clone();
        let err = g.connect_value(&reg, parent, "B", leaf).unwrap_err();
        assert_eq!(err.code, ErrorCode::VALUE_TOO_DEEP);
        assert_eq!(err.kind, ErrorKind::StructuralError);
        assert_eq!(g, before);
        let other = g.insert_block(&reg, "text").unwrap();
        assert!(g.connect_value(&reg, parent, "A", other).is_err());
    }

    #[test]
    fn connect_value_counts_the_subtree_being_bound() {
        let (reg, mut g) = setup();
        let top = g.insert_block(&reg, "join_text").unwrap();
        let mut parent = top;
        for _ in 0..MAX_VALUE_DEPTH {
            let join = g.insert_block(&reg, "join_text").unwrap();
            g.connect_value(&reg, parent, "B", join).unwrap();
            parent = join;
        }
        let say = g.insert_block(&reg, "character_say").unwrap();
        let err = g.connect_value(&reg, say, "MESSAGE", top).unwrap_err();
        assert_eq!(err.code, ErrorCode::VALUE_TOO_DEEP);
        assert!(g.roots().contains(&top));
    }

    #[test]
    fn connect_value_unknown_socket() {
        let (reg, mut g) = setup();
        let say = g.insert_block(&reg, "character_say").unwrap();
        let t = g.insert_block(&reg, "text").unwrap();
        let err = g.connect_value(&reg, say, "TEXT", t).unwrap_err();
        assert_eq!(err.code, ErrorCode::UNKNOWN_SOCKET);
    }

    #[test]
    fn disconnect_statement_appends_root() {
        let (reg, mut g) = setup();
        let a = g.insert_block(&reg, "say_hello").unwrap();
        let b = g.insert_block(&reg, "play_sound").unwrap();
        let c = g.insert_block(&reg, "draw_shape").unwrap();
        g.connect_statement(&reg, a, b).unwrap();
        g.connect_statement(&reg, b, c).unwrap();

        g.disconnect_statement(b).unwrap();
        assert_eq!(g.roots(), &[a, b]);
        assert_eq!(g.chain_from(b), vec![b, c]);
        assert_eq!(g.block(a).unwrap().next(), None);

        // Already a root: nothing happens.
        g.disconnect_statement(b).unwrap();
        assert_eq!(g.roots(), &[a, b]);
        g.check_invariants(&reg).unwrap();
    }

    #[test]
    fn disconnect_value_returns_child() {
        let (reg, mut g) = setup();
        let say = g.insert_block(&reg, "show_message").unwrap();
        let t = g.insert_block(&reg, "text").unwrap();
        g.connect_value(&reg, say, "MESSAGE", t).unwrap();
        assert_eq!(g.disconnect_value(say, "MESSAGE").unwrap(), Some(t));
        assert_eq!(g.disconnect_value(say, "MESSAGE").unwrap(), None);
        assert_eq!(g.roots(), &[say, t]);
    }

    #[test]
    fn delete_root_promotes_next_into_slot() {
        let (reg, mut g) = setup();
        let first = g.insert_block(&reg, "say_hello").unwrap();
        let a = g.insert_block(&reg, "play_sound").unwrap();
        let b = g.insert_block(&reg, "draw_shape").unwrap();
        g.connect_statement(&reg, a, b).unwrap();
        let last = g.insert_block(&reg, "character_spin").unwrap();
        assert_eq!(g.roots(), &[first, a, last]);

        assert_eq!(g.delete_block(a).unwrap(), vec![a]);
        assert_eq!(g.roots(), &[first, b, last]);
        assert_eq!(g.block(b).unwrap().previous(), None);
        g.check_invariants(&reg).unwrap();
    }

    #[test]
    fn delete_middle_detaches_tail() {
        let (reg, mut g) = setup();
        let a = g.insert_block(&reg, "say_hello").unwrap();
        let b = g.insert_block(&reg, "play_sound").unwrap();
        let c = g.insert_block(&reg, "draw_shape").unwrap();
        g.connect_statement(&reg, a, b).unwrap();
        g.connect_statement(&reg, b, c).unwrap();

        g.delete_block(b).unwrap();
        assert_eq!(g.roots(), &[a, c]);
        assert_eq!(g.block(a).unwrap().next(), None);
        g.check_invariants(&reg).unwrap();
    }

    #[test]
    fn delete_removes_value_descendants() {
        let (reg, mut g) = setup();
        let say = g.insert_block(&reg, "character_say").unwrap();
        let join = g.insert_block(&reg, "join_text").unwrap();
        let t = g.insert_block(&reg, "text").unwrap();
        let n = g.insert_block(&reg, "number").unwrap();
        g.connect_value(&reg, join, "A", t).unwrap();
        g.connect_value(&reg, join, "B", n).unwrap();
        g.connect_value(&reg, say, "MESSAGE", join).unwrap();

        let removed = g.delete_block(join).unwrap();
        assert_eq!(removed, vec![join, t, n]);
        assert_eq!(g.len(), 1);
        assert_eq!(g.block(say).unwrap().input("MESSAGE"), None);
        assert_eq!(g.roots(), &[say]);
        g.check_invariants(&reg).unwrap();
    }

    #[test]
    fn unknown_block_is_structural() {
        let (reg, mut g) = setup();
        let err = g.delete_block(BlockId(9)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::StructuralError);
        let err = g.connect_statement(&reg, BlockId(1), BlockId(2)).unwrap_err();
        assert_eq!(err.code, ErrorCode::UNKNOWN_BLOCK);
    }
}
