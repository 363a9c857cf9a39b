//! The portable document: a flat JSON form of a program graph used for
//! saving, loading and sharing.
//!
//! ```json
//! {
//!   "format": "kidcode-blocks",
//!   "version": 1,
//!   "roots": ["b1"],
//!   "blocks": [
//!     { "id": "b1", "type": "character_say", "fields": {}, "inputs": { "MESSAGE": "b2" } },
//!     { "id": "b2", "type": "text", "fields": { "TEXT": "Hi" } }
//!   ]
//! }
//! ```
//!
//! Ids are renumbered `b1, b2, ...` in traversal order when writing, so
//! isomorphic graphs produce byte-identical documents.

use std::collections::{BTreeMap, HashMap, HashSet};

use kidcode_registry::BlockRegistry;
use kidcode_types::{BlockError, BlockId, ErrorCode, FieldValue};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::ProgramGraph;

pub const FORMAT: &str = "kidcode-blocks";
pub const VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableDocument {
    pub format: String,
    pub version: u32,
    pub roots: Vec<String>,
    pub blocks: Vec<PortableBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, String>,
}

impl PortableDocument {
    /// Compact canonical JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(text: &str) -> Result<Self, BlockError> {
        serde_json::from_str(text)
            .map_err(|e| BlockError::malformed(format!("not a block document: {e}")))
    }

    /// SHA-256 of the canonical JSON, lowercase hex.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.to_json().as_bytes());
        format!("{digest:x}")
    }
}

/// Write `graph` as a portable document with canonical ids.
pub fn to_portable(graph: &ProgramGraph) -> PortableDocument {
    let order: Vec<BlockId> = graph.traverse().map(|b| b.id()).collect();
    let canonical: HashMap<BlockId, String> = order
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, BlockId(i as u32 + 1).to_string()))
        .collect();
    let name = |id: BlockId| canonical.get(&id).cloned().unwrap_or_else(|| id.to_string());

    let blocks = graph
        .traverse()
        .map(|b| PortableBlock {
            id: name(b.id()),
            type_id: b.type_id().to_string(),
            fields: b.fields().clone(),
            next: b.next().map(name),
            inputs: b
                .inputs()
                .iter()
                .filter_map(|i| i.child.map(|c| (i.socket.clone(), name(c))))
                .collect(),
        })
        .collect();

    PortableDocument {
        format: FORMAT.to_string(),
        version: VERSION,
        roots: graph.roots().iter().map(|&r| name(r)).collect(),
        blocks,
    }
}

/// Rebuild a graph from a document.
///
/// Every failure is reported as `MalformedDocument`; the underlying cause
/// is kept in the message.
pub fn from_portable(
    doc: &PortableDocument,
    registry: &BlockRegistry,
) -> Result<ProgramGraph, BlockError> {
    rebuild(doc, registry).map_err(|e| {
        warn!(error = %e, "portable document rejected");
        e.into_malformed()
    })
}

fn rebuild(doc: &PortableDocument, registry: &BlockRegistry) -> Result<ProgramGraph, BlockError> {
    if doc.format != FORMAT {
        return Err(BlockError::malformed(format!(
            "unknown document format '{}'",
            doc.format
        )));
    }
    if doc.version != VERSION {
        return Err(BlockError::new(
            ErrorCode::UNSUPPORTED_VERSION,
            format!("document version {} is not supported", doc.version),
        )
        .with_suggestion(format!("expected version {VERSION}")));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for block in &doc.blocks {
        if !seen.insert(block.id.as_str()) {
            return Err(BlockError::new(
                ErrorCode::DUPLICATE_ID,
                format!("block id '{}' appears twice", block.id),
            ));
        }
    }
    let resolve = |id: &str| -> Result<(), BlockError> {
        if seen.contains(id) {
            Ok(())
        } else {
            Err(BlockError::new(
                ErrorCode::DANGLING_REFERENCE,
                format!("reference to missing block '{id}'"),
            ))
        }
    };
    for block in &doc.blocks {
        if let Some(next) = &block.next {
            resolve(next)?;
        }
        for child in block.inputs.values() {
            resolve(child)?;
        }
    }
    for root in &doc.roots {
        resolve(root)?;
    }

    // Blocks, with their fields.
    let mut graph = ProgramGraph::new();
    let mut ids: HashMap<&str, BlockId> = HashMap::new();
    for block in &doc.blocks {
        let schema = registry.lookup(&block.type_id)?;
        if let Some(missing) = schema
            .fields
            .iter()
            .find(|f| !block.fields.contains_key(&f.name))
        {
            return Err(BlockError::malformed(format!(
                "block '{}' ({}) is missing field '{}'",
                block.id, block.type_id, missing.name
            )));
        }
        let fields: Vec<(&str, FieldValue)> = block
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        let id = graph.insert_block_with(registry, &block.type_id, &fields)?;
        ids.insert(block.id.as_str(), id);
    }
    let id_of = |name: &str| ids.get(name).copied().ok_or_else(|| BlockError::malformed(name));

    // Links. Value bindings first so statement checks see settled blocks.
    for block in &doc.blocks {
        let parent = id_of(&block.id)?;
        for (socket, child) in &block.inputs {
            graph.connect_value(registry, parent, socket, id_of(child)?)?;
        }
    }
    for block in &doc.blocks {
        if let Some(next) = &block.next {
            graph.connect_statement(registry, id_of(&block.id)?, id_of(next)?)?;
        }
    }

    // The root list must name exactly the blocks left without a parent.
    let listed: Vec<BlockId> = doc
        .roots
        .iter()
        .map(|r| id_of(r))
        .collect::<Result<_, _>>()?;
    let expected: HashSet<BlockId> = graph.roots().iter().copied().collect();
    let unique: HashSet<BlockId> = listed.iter().copied().collect();
    if unique.len() != listed.len() || unique != expected {
        return Err(BlockError::malformed(
            "root list does not match the blocks without a parent",
        ));
    }
    graph.reorder_roots(listed);

    debug!(blocks = graph.len(), roots = graph.roots().len(), "portable document loaded");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidcode_types::ErrorKind;

    fn sample(reg: &BlockRegistry) -> ProgramGraph {
        let mut g = ProgramGraph::new();
        let mv = g
            .insert_block_with(reg, "move_character", &[("STEPS", FieldValue::from(120))])
            .unwrap();
        let say = g.insert_block(reg, "character_say").unwrap();
        let text = g
            .insert_block_with(reg, "text", &[("TEXT", FieldValue::from("Hi"))])
            .unwrap();
        g.connect_statement(reg, mv, say).unwrap();
        g.connect_value(reg, say, "MESSAGE", text).unwrap();
        g.insert_block(reg, "draw_shape").unwrap();
        g
    }

    #[test]
    fn document_shape() {
        let reg = BlockRegistry::builtin();
        let doc = to_portable(&sample(&reg));
        assert_eq!(doc.format, FORMAT);
        assert_eq!(doc.roots, vec!["b1", "b4"]);
        assert_eq!(doc.blocks[0].type_id, "move_character");
        assert_eq!(doc.blocks[0].next.as_deref(), Some("b2"));
        assert_eq!(doc.blocks[1].inputs["MESSAGE"], "b3");

        let json: serde_json::Value = serde_json::from_str(&doc.to_json()).unwrap();
        assert_eq!(json["blocks"][0]["type"], "move_character");
        assert_eq!(json["blocks"][0]["fields"]["STEPS"], 120.0);
        assert!(json["blocks"][3].get("next").is_none());
    }

    #[test]
    fn round_trip_preserves_shape() {
        let reg = BlockRegistry::builtin();
        let g = sample(&reg);
        let back = from_portable(&to_portable(&g), &reg).unwrap();
        assert_eq!(back.shape(), g.shape());
        back.check_invariants(&reg).unwrap();
    }

    #[test]
    fn fingerprint_is_stable() {
        let reg = BlockRegistry::builtin();
        let doc = to_portable(&sample(&reg));
        let fp = doc.fingerprint();
        assert_eq!(fp.len(), 64);
        for i in 0..100 {
            assert_eq!(
                fp,
                to_portable(&sample(&reg)).fingerprint(),
                "Determinism failure at iteration {i}"
            );
        }
    }

    #[test]
    fn unknown_type_is_malformed() {
        let reg = BlockRegistry::builtin();
        let mut doc = to_portable(&sample(&reg));
        doc.blocks[3].type_id = "rocket".to_string();
        let err = from_portable(&doc, &reg).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedDocument);
        assert!(err.message.contains("rocket"));
    }

    #[test]
    fn wrong_version_is_malformed() {
        let reg = BlockRegistry::builtin();
        let mut doc = to_portable(&sample(&reg));
        doc.version = 7;
        assert_eq!(
            from_portable(&doc, &reg).unwrap_err().kind,
            ErrorKind::MalformedDocument
        );
    }
}
