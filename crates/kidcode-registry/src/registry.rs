use std::collections::HashMap;

use kidcode_types::{BlockError, BlockTypeSchema, ErrorCode};
use tracing::trace;

/// Registry mapping type id → block type schema.
///
/// Iteration follows registration order so palettes and tables are stable.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    types: Vec<BlockTypeSchema>,
    index: HashMap<String, usize>,
}

impl BlockRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in catalog.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.register_basics();
        reg.register_motion();
        reg.register_character();
        reg.register_music();
        reg.register_art();
        reg.register_values();
        reg
    }

    /// Register a new block type.
    ///
    /// Fails with `DuplicateType` if the id is taken, or `StructuralError`
    /// if the schema is inconsistent.
    pub fn register_type(&mut self, schema: BlockTypeSchema) -> Result<(), BlockError> {
        if self.index.contains_key(&schema.id) {
            return Err(BlockError::new(
                ErrorCode::DUPLICATE_TYPE,
                format!("block type '{}' is already registered", schema.id),
            ));
        }
        schema.validate()?;
        self.add(schema);
        Ok(())
    }

    /// Look up a schema by type id.
    pub fn lookup(&self, id: &str) -> Result<&BlockTypeSchema, BlockError> {
        self.get(id).ok_or_else(|| BlockError::unknown_type(id))
    }

    pub fn get(&self, id: &str) -> Option<&BlockTypeSchema> {
        self.index.get(id).map(|&i| &self.types[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All schemas in registration order.
    pub fn types(&self) -> impl Iterator<Item = &BlockTypeSchema> {
        self.types.iter()
    }

    /// Distinct categories in order of first registration.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for schema in &self.types {
            if !seen.contains(&schema.category.as_str()) {
                seen.push(&schema.category);
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ──────────────────────────────────────────────────────────────────────
    // Registration helpers
    // ──────────────────────────────────────────────────────────────────────

    /// Unchecked insert used by the built-in catalog.
    pub(crate) fn add(&mut self, schema: BlockTypeSchema) {
        trace!(type_id = %schema.id, category = %schema.category, "block type registered");
        self.index.insert(schema.id.clone(), self.types.len());
        self.types.push(schema);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidcode_types::{ErrorKind, FieldSpec, ValueType};

    #[test]
    fn register_and_lookup() {
        let mut reg = BlockRegistry::new();
        reg.register_type(
            BlockTypeSchema::statement("wave", "Character", "#FF4081")
                .with_field(FieldSpec::text("HAND", "left")),
        )
        .unwrap();
        assert_eq!(reg.lookup("wave").unwrap().category, "Character");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_type_rejected() {
        let mut reg = BlockRegistry::new();
        let schema = BlockTypeSchema::statement("wave", "Character", "#FF4081");
        reg.register_type(schema.clone()).unwrap();
        let err = reg.register_type(schema).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateType);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unknown_type_lookup() {
        let reg = BlockRegistry::new();
        assert_eq!(reg.lookup("rocket").unwrap_err().kind, ErrorKind::UnknownType);
    }

    #[test]
    fn invalid_schema_not_registered() {
        let mut reg = BlockRegistry::new();
        let schema = BlockTypeSchema::expression("pair", "Values", "#5C6BC0", ValueType::Number)
            .with_value_input("A", &[]);
        assert_eq!(
            reg.register_type(schema).unwrap_err().kind,
            ErrorKind::StructuralError
        );
        assert!(!reg.contains("pair"));
    }

    #[test]
    fn categories_in_registration_order() {
        let reg = BlockRegistry::builtin();
        assert_eq!(
            reg.categories(),
            vec!["Basics", "Motion", "Character", "Music", "Art", "Values"]
        );
    }
}
