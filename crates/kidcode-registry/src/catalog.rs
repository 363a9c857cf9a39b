//! The built-in block catalog.
//!
//! Statement blocks drive the host API (sound, motion, the character,
//! music, drawing). Expression blocks in the `Values` category feed the
//! value sockets of statements.

use kidcode_types::{BlockTypeSchema, FieldSpec, ValueType};

use crate::BlockRegistry;

pub const BASICS: &str = "Basics";
pub const MOTION: &str = "Motion";
pub const CHARACTER: &str = "Character";
pub const MUSIC: &str = "Music";
pub const ART: &str = "Art";
pub const VALUES: &str = "Values";

const DIRECTIONS: &[(&str, &str)] = &[
    ("right", "RIGHT"),
    ("left", "LEFT"),
    ("up", "UP"),
    ("down", "DOWN"),
];

impl BlockRegistry {
    /// Basics: 3 blocks
    pub(crate) fn register_basics(&mut self) {
        let colour = "#4CAF50";
        self.add(
            BlockTypeSchema::statement("say_hello", BASICS, colour)
                .with_field(FieldSpec::text("NAME", "world"))
                .with_tooltip("Says hello to someone!"),
        );
        self.add(
            BlockTypeSchema::statement("show_message", BASICS, colour)
                .with_value_input("MESSAGE", &[ValueType::String])
                .with_tooltip("Shows a message"),
        );
        self.add(
            BlockTypeSchema::statement("play_sound", BASICS, colour)
                .with_field(FieldSpec::dropdown(
                    "SOUND",
                    &[("beep", "BEEP"), ("victory", "VICTORY"), ("error", "ERROR")],
                ))
                .with_tooltip("Plays a sound effect"),
        );
    }

    /// Motion: 2 blocks
    pub(crate) fn register_motion(&mut self) {
        let colour = "#FF5722";
        self.add(
            BlockTypeSchema::statement("move_sprite", MOTION, colour)
                .with_field(FieldSpec::dropdown("DIRECTION", DIRECTIONS))
                .with_field(FieldSpec::number("STEPS", 10.0, Some(0.0), Some(100.0)))
                .with_tooltip("Moves a sprite in the specified direction"),
        );
        self.add(
            BlockTypeSchema::statement("particle_effect", MOTION, colour)
                .with_field(FieldSpec::dropdown(
                    "EFFECT",
                    &[
                        ("sparkles", "SPARKLE"),
                        ("bubbles", "BUBBLE"),
                        ("stars", "STAR"),
                        ("hearts", "HEART"),
                    ],
                ))
                .with_tooltip("Add particle effects"),
        );
    }

    /// Character: 5 blocks
    pub(crate) fn register_character(&mut self) {
        let colour = "#FF4081";
        self.add(
            BlockTypeSchema::statement("move_character", CHARACTER, colour)
                .with_field(FieldSpec::dropdown("DIRECTION", DIRECTIONS))
                .with_field(FieldSpec::number("STEPS", 50.0, Some(0.0), Some(500.0)))
                .with_tooltip("Move the character in a direction"),
        );
        self.add(
            BlockTypeSchema::statement("character_say", CHARACTER, colour)
                .with_value_input("MESSAGE", &[ValueType::String])
                .with_tooltip("Make the character say something"),
        );
        self.add(
            BlockTypeSchema::statement("character_dance", CHARACTER, colour)
                .with_field(FieldSpec::dropdown(
                    "DANCE",
                    &[("happy", "HAPPY"), ("cool", "COOL"), ("silly", "SILLY")],
                ))
                .with_tooltip("Make the character dance"),
        );
        self.add(
            BlockTypeSchema::statement("character_jump", CHARACTER, colour)
                .with_field(FieldSpec::dropdown(
                    "HEIGHT",
                    &[("small", "SMALL"), ("medium", "MEDIUM"), ("high", "HIGH")],
                ))
                .with_tooltip("Make the character jump"),
        );
        self.add(
            BlockTypeSchema::statement("character_spin", CHARACTER, colour)
                .with_field(FieldSpec::dropdown(
                    "SPEED",
                    &[("slowly", "SLOW"), ("normally", "NORMAL"), ("quickly", "FAST")],
                ))
                .with_tooltip("Make the character spin"),
        );
    }

    /// Music: 2 blocks
    pub(crate) fn register_music(&mut self) {
        let colour = "#9C27B0";
        self.add(
            BlockTypeSchema::statement("play_music", MUSIC, colour)
                .with_field(FieldSpec::dropdown(
                    "MUSIC",
                    &[
                        ("happy tune", "HAPPY"),
                        ("adventure music", "ADVENTURE"),
                        ("victory fanfare", "VICTORY"),
                    ],
                ))
                .with_tooltip("Play background music"),
        );
        self.add(
            BlockTypeSchema::statement("create_melody", MUSIC, colour)
                .with_field(FieldSpec::dropdown(
                    "MELODY",
                    &[
                        ("happy", "HAPPY"),
                        ("mysterious", "MYSTERY"),
                        ("victory", "VICTORY"),
                    ],
                ))
                .with_tooltip("Play a melody"),
        );
    }

    /// Art: 1 block
    pub(crate) fn register_art(&mut self) {
        self.add(
            BlockTypeSchema::statement("draw_shape", ART, "#2196F3")
                .with_field(FieldSpec::dropdown(
                    "SHAPE",
                    &[
                        ("circle", "CIRCLE"),
                        ("square", "SQUARE"),
                        ("star", "STAR"),
                        ("heart", "HEART"),
                    ],
                ))
                .with_field(FieldSpec::number("SIZE", 50.0, Some(10.0), Some(200.0)))
                .with_tooltip("Draw a shape"),
        );
    }

    /// Values: 4 expression blocks
    pub(crate) fn register_values(&mut self) {
        use ValueType::*;
        let colour = "#5C6BC0";
        self.add(
            BlockTypeSchema::expression("text", VALUES, colour, String)
                .with_field(FieldSpec::text("TEXT", ""))
                .with_tooltip("A piece of text"),
        );
        self.add(
            BlockTypeSchema::expression("number", VALUES, colour, Number)
                .with_field(FieldSpec::number("NUM", 0.0, None, None))
                .with_tooltip("A number"),
        );
        self.add(
            BlockTypeSchema::expression("join_text", VALUES, colour, String)
                .with_value_input("A", &[String, Number])
                .with_value_input("B", &[String, Number])
                .with_tooltip("Join two pieces of text together"),
        );
        self.add(
            BlockTypeSchema::expression("arithmetic", VALUES, colour, Number)
                .with_field(FieldSpec::dropdown(
                    "OP",
                    &[("+", "ADD"), ("-", "MINUS"), ("×", "MULTIPLY"), ("÷", "DIVIDE")],
                ))
                .with_value_input("A", &[Number])
                .with_value_input("B", &[Number])
                .with_tooltip("Do some maths"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidcode_types::FieldValue;

    #[test]
    fn builtin_schemas_are_valid() {
        let reg = BlockRegistry::builtin();
        assert_eq!(reg.len(), 17);
        for schema in reg.types() {
            schema
                .validate()
                .unwrap_or_else(|e| panic!("{} is invalid: {e}", schema.id));
        }
    }

    #[test]
    fn builtin_ids_unique() {
        let reg = BlockRegistry::builtin();
        let mut fresh = BlockRegistry::new();
        for schema in reg.types() {
            fresh.register_type(schema.clone()).unwrap();
        }
        assert_eq!(fresh.len(), reg.len());
    }

    #[test]
    fn move_character_defaults() {
        let reg = BlockRegistry::builtin();
        let schema = reg.lookup("move_character").unwrap();
        assert_eq!(schema.field("DIRECTION").unwrap().default, FieldValue::from("RIGHT"));
        assert_eq!(schema.field("STEPS").unwrap().default, FieldValue::from(50));
        assert!(schema.has_previous() && schema.has_next());
        assert!(schema.output.is_none());
    }

    #[test]
    fn values_are_expressions() {
        let reg = BlockRegistry::builtin();
        for schema in reg.types().filter(|s| s.category == VALUES) {
            assert!(schema.output.is_some(), "{} has no output", schema.id);
            assert!(!schema.has_previous() && !schema.has_next());
        }
    }
}
