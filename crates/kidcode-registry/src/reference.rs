//! Machine-generated palette table.
//!
//! Produces a JSON description of every registered block type, grouped by
//! category in registration order. Palette tooling and documentation read
//! this instead of a hand-written list, so it tracks the registry.

use serde::Serialize;

use kidcode_types::BlockTypeSchema;

use crate::BlockRegistry;

#[derive(Serialize)]
struct PaletteTable<'a> {
    total_blocks: usize,
    categories: Vec<PaletteCategory<'a>>,
}

#[derive(Serialize)]
struct PaletteCategory<'a> {
    name: &'a str,
    colour: &'a str,
    blocks: Vec<&'a BlockTypeSchema>,
}

/// Generate the palette table as pretty-printed JSON.
pub fn palette_table(registry: &BlockRegistry) -> String {
    let categories: Vec<PaletteCategory<'_>> = registry
        .categories()
        .into_iter()
        .map(|name| {
            let blocks: Vec<&BlockTypeSchema> =
                registry.types().filter(|s| s.category == name).collect();
            PaletteCategory {
                name,
                colour: blocks.first().map(|s| s.colour.as_str()).unwrap_or(""),
                blocks,
            }
        })
        .collect();

    let table = PaletteTable {
        total_blocks: registry.len(),
        categories,
    };
    serde_json::to_string_pretty(&table).unwrap_or_else(|_| "{}".to_string())
}
