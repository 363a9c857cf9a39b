//! Block type schemas.
//!
//! A [`BlockTypeSchema`] is the immutable definition of one kind of block:
//! its fields, its sockets, and whether it is statement-shaped (sits in a
//! sequence) or expression-shaped (produces a value for a socket).

use serde::Serialize;
use std::collections::HashSet;

use crate::{BlockError, ErrorCode, FieldValue, ValueType};

// ══════════════════════════════════════════════════════════════════════════════
// Fields
// ══════════════════════════════════════════════════════════════════════════════

/// One entry of a dropdown field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownOption {
    /// Text shown in the palette.
    pub label: String,
    /// Value stored on the block and passed to generated code.
    pub value: String,
}

/// What a field accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    /// Numbers are clamped into `[min, max]` rather than rejected.
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Dropdown { options: Vec<DropdownOption> },
}

/// A named, typed field with a default value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub default: FieldValue,
}

impl FieldSpec {
    pub fn text(name: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            default: FieldValue::from(default),
        }
    }

    pub fn number(name: &str, default: f64, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Number { min, max },
            default: FieldValue::Number(default),
        }
    }

    /// A dropdown from `(label, value)` pairs; the first option is the default.
    pub fn dropdown(name: &str, options: &[(&str, &str)]) -> Self {
        let options: Vec<DropdownOption> = options
            .iter()
            .map(|(label, value)| DropdownOption {
                label: label.to_string(),
                value: value.to_string(),
            })
            .collect();
        let default = options
            .first()
            .map(|o| FieldValue::from(o.value.as_str()))
            .unwrap_or_else(|| FieldValue::from(""));
        Self {
            name: name.to_string(),
            kind: FieldKind::Dropdown { options },
            default,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self.kind {
            FieldKind::Number { .. } => ValueType::Number,
            FieldKind::Text | FieldKind::Dropdown { .. } => ValueType::String,
        }
    }

    /// Check `value` against this field, clamping numbers into range.
    pub fn coerce(&self, value: FieldValue) -> Result<FieldValue, BlockError> {
        match (&self.kind, value) {
            (FieldKind::Text, FieldValue::Text(s)) => Ok(FieldValue::Text(s)),
            (FieldKind::Number { min, max }, FieldValue::Number(n)) => {
                if !n.is_finite() {
                    return Err(BlockError::new(
                        ErrorCode::INVALID_FIELD_VALUE,
                        format!("field '{}' needs a finite number, got {n}", self.name),
                    ));
                }
                let mut n = n;
                if let Some(min) = min {
                    n = n.max(*min);
                }
                if let Some(max) = max {
                    n = n.min(*max);
                }
                Ok(FieldValue::Number(n))
            }
            (FieldKind::Dropdown { options }, FieldValue::Text(s)) => {
                if options.iter().any(|o| o.value == s) {
                    Ok(FieldValue::Text(s))
                } else {
                    let allowed: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
                    Err(BlockError::new(
                        ErrorCode::INVALID_FIELD_VALUE,
                        format!("'{s}' is not an option of field '{}'", self.name),
                    )
                    .with_suggestion(format!("use one of: {}", allowed.join(", "))))
                }
            }
            (_, other) => Err(BlockError::new(
                ErrorCode::TYPE_MISMATCH,
                format!(
                    "field '{}' expects {}, found {}",
                    self.name,
                    self.value_type(),
                    other.value_type()
                ),
            )),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Sockets
// ══════════════════════════════════════════════════════════════════════════════

/// A connection point on a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SocketSpec {
    /// Accepts one statement block above this one.
    Previous,
    /// Accepts one statement block below this one.
    Next,
    /// Holds one expression block whose output type is in `accepts`.
    Value {
        name: String,
        accepts: Vec<ValueType>,
    },
}

// ══════════════════════════════════════════════════════════════════════════════
// Schema
// ══════════════════════════════════════════════════════════════════════════════

/// Immutable definition of a block type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockTypeSchema {
    pub id: String,
    pub category: String,
    /// Palette colour, e.g. `#FF4081`.
    pub colour: String,
    pub tooltip: String,
    pub fields: Vec<FieldSpec>,
    pub sockets: Vec<SocketSpec>,
    /// Set for expression-shaped blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ValueType>,
}

impl BlockTypeSchema {
    /// A statement block with `previous` and `next` sockets.
    pub fn statement(id: &str, category: &str, colour: &str) -> Self {
        Self {
            id: id.to_string(),
            category: category.to_string(),
            colour: colour.to_string(),
            tooltip: String::new(),
            fields: Vec::new(),
            sockets: vec![SocketSpec::Previous, SocketSpec::Next],
            output: None,
        }
    }

    /// An expression block producing `output`.
    pub fn expression(id: &str, category: &str, colour: &str, output: ValueType) -> Self {
        Self {
            id: id.to_string(),
            category: category.to_string(),
            colour: colour.to_string(),
            tooltip: String::new(),
            fields: Vec::new(),
            sockets: Vec::new(),
            output: Some(output),
        }
    }

    pub fn with_tooltip(mut self, tooltip: &str) -> Self {
        self.tooltip = tooltip.to_string();
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_value_input(mut self, name: &str, accepts: &[ValueType]) -> Self {
        self.sockets.push(SocketSpec::Value {
            name: name.to_string(),
            accepts: accepts.to_vec(),
        });
        self
    }

    pub fn has_previous(&self) -> bool {
        self.sockets.contains(&SocketSpec::Previous)
    }

    pub fn has_next(&self) -> bool {
        self.sockets.contains(&SocketSpec::Next)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Value sockets in declaration order.
    pub fn value_sockets(&self) -> impl Iterator<Item = (&str, &[ValueType])> {
        self.sockets.iter().filter_map(|s| match s {
            SocketSpec::Value { name, accepts } => Some((name.as_str(), accepts.as_slice())),
            _ => None,
        })
    }

    /// Accepted types of the named value socket.
    pub fn value_socket(&self, name: &str) -> Option<&[ValueType]> {
        self.value_sockets()
            .find(|(socket, _)| *socket == name)
            .map(|(_, accepts)| accepts)
    }

    /// Check the schema is internally consistent.
    pub fn validate(&self) -> Result<(), BlockError> {
        let invalid = |message: String| {
            Err(BlockError::new(
                ErrorCode::INVALID_SCHEMA,
                format!("block type '{}': {message}", self.id),
            ))
        };

        if self.id.is_empty() {
            return invalid("empty type id".to_string());
        }
        if self.output.is_some() && (self.has_previous() || self.has_next()) {
            return invalid("expression blocks cannot have sequencing sockets".to_string());
        }

        let mut names = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return invalid(format!("duplicate field '{}'", field.name));
            }
            if field.coerce(field.default.clone()).as_ref() != Ok(&field.default) {
                return invalid(format!("default of field '{}' does not fit it", field.name));
            }
        }

        let mut sockets = HashSet::new();
        for (name, accepts) in self.value_sockets() {
            if !sockets.insert(name) {
                return invalid(format!("duplicate socket '{name}'"));
            }
            if accepts.is_empty() {
                return invalid(format!("socket '{name}' accepts no types"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn move_block() -> BlockTypeSchema {
        BlockTypeSchema::statement("move_character", "Character", "#FF4081")
            .with_field(FieldSpec::dropdown(
                "DIRECTION",
                &[("right", "RIGHT"), ("left", "LEFT")],
            ))
            .with_field(FieldSpec::number("STEPS", 50.0, Some(0.0), Some(500.0)))
    }

    #[test]
    fn number_fields_clamp() {
        let schema = move_block();
        let steps = schema.field("STEPS").unwrap();
        assert_eq!(steps.coerce(FieldValue::from(900)), Ok(FieldValue::from(500)));
        assert_eq!(steps.coerce(FieldValue::from(-3)), Ok(FieldValue::from(0)));
        assert_eq!(steps.coerce(FieldValue::from(42)), Ok(FieldValue::from(42)));
    }

    #[test]
    fn non_finite_numbers_rejected() {
        let schema = move_block();
        let err = schema
            .field("STEPS")
            .unwrap()
            .coerce(FieldValue::Number(f64::NAN))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_FIELD_VALUE);
    }

    #[test]
    fn dropdown_checks_options() {
        let schema = move_block();
        let dir = schema.field("DIRECTION").unwrap();
        assert_eq!(dir.default, FieldValue::from("RIGHT"));
        assert!(dir.coerce(FieldValue::from("LEFT")).is_ok());
        let err = dir.coerce(FieldValue::from("SIDEWAYS")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(err.suggestion.as_deref(), Some("use one of: RIGHT, LEFT"));
    }

    #[test]
    fn wrong_value_type_is_mismatch() {
        let schema = move_block();
        let err = schema
            .field("STEPS")
            .unwrap()
            .coerce(FieldValue::from("fast"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TYPE_MISMATCH);
        assert_eq!(err.message, "field 'STEPS' expects Number, found String");
    }

    #[test]
    fn validate_rejects_duplicate_fields() {
        let schema = move_block().with_field(FieldSpec::text("STEPS", ""));
        assert_eq!(
            schema.validate().unwrap_err().code,
            ErrorCode::INVALID_SCHEMA
        );
    }

    #[test]
    fn validate_rejects_out_of_range_default() {
        let schema = BlockTypeSchema::statement("draw", "Art", "#2196F3")
            .with_field(FieldSpec::number("SIZE", 5.0, Some(10.0), Some(200.0)));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn validate_rejects_sequenced_expression() {
        let mut schema = BlockTypeSchema::expression("text", "Values", "#5C6BC0", ValueType::String);
        schema.sockets.push(SocketSpec::Next);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn value_socket_lookup() {
        let schema = BlockTypeSchema::statement("character_say", "Character", "#FF4081")
            .with_value_input("MESSAGE", &[ValueType::String]);
        assert_eq!(schema.value_socket("MESSAGE"), Some(&[ValueType::String][..]));
        assert_eq!(schema.value_socket("OTHER"), None);
        assert!(schema.has_previous() && schema.has_next());
        assert!(schema.validate().is_ok());
    }
}
