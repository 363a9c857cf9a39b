//! Built-in emitters.
//!
//! Statement blocks become one host call each. Value blocks become
//! literals or `+ - * /` expressions.

use kidcode_graph::BlockInstance;
use kidcode_types::{format_number, FieldValue};

use crate::emitter::{Emitter, EmitterTable, Expression, Fragment, Inputs, Precedence};
use crate::error::{CodegenError, CodegenResult};

/// Quote `text` as a program-text string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn field<'b>(block: &'b BlockInstance, name: &str) -> CodegenResult<&'b FieldValue> {
    block.field(name).ok_or_else(|| {
        CodegenError::Internal(format!(
            "block {} ({}) has no field '{name}'",
            block.id(),
            block.type_id()
        ))
    })
}

fn number_field(block: &BlockInstance, name: &str) -> CodegenResult<f64> {
    field(block, name)?.as_number().ok_or_else(|| {
        CodegenError::Internal(format!("field '{name}' of block {} is not a number", block.id()))
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// One argument of a host call.
#[derive(Debug, Clone, Copy)]
pub enum Arg {
    /// A field, quoted as text.
    Text(&'static str),
    /// A numeric field.
    Number(&'static str),
    /// A value socket.
    Input(&'static str),
}

/// `function(arg, ...)`
#[derive(Debug, Clone)]
pub struct HostCall {
    function: &'static str,
    args: Vec<Arg>,
}

impl HostCall {
    pub fn new(function: &'static str, args: &[Arg]) -> Self {
        Self {
            function,
            args: args.to_vec(),
        }
    }
}

impl Emitter for HostCall {
    fn emit(&self, block: &BlockInstance, inputs: &Inputs) -> CodegenResult<Fragment> {
        let mut args = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            args.push(match *arg {
                Arg::Text(name) => quote(&field(block, name)?.to_string()),
                Arg::Number(name) => format_number(number_field(block, name)?),
                Arg::Input(socket) => inputs.code(socket)?.to_string(),
            });
        }
        Ok(Fragment::Lines(vec![format!(
            "{}({})",
            self.function,
            args.join(", ")
        )]))
    }
}

/// `say_hello`: the greeting is built at generation time.
#[derive(Debug, Clone, Copy)]
pub struct Greeting;

impl Emitter for Greeting {
    fn emit(&self, block: &BlockInstance, _inputs: &Inputs) -> CodegenResult<Fragment> {
        let name = field(block, "NAME")?;
        Ok(Fragment::Lines(vec![format!(
            "appendOutput({})",
            quote(&format!("Hello, {name}! "))
        )]))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Values
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
pub struct TextLiteral;

impl Emitter for TextLiteral {
    fn emit(&self, block: &BlockInstance, _inputs: &Inputs) -> CodegenResult<Fragment> {
        let text = field(block, "TEXT")?.to_string();
        Ok(Fragment::Expression(Expression::atomic(quote(&text))))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NumberLiteral;

impl Emitter for NumberLiteral {
    fn emit(&self, block: &BlockInstance, _inputs: &Inputs) -> CodegenResult<Fragment> {
        let n = number_field(block, "NUM")?;
        let tier = if n < 0.0 {
            Precedence::Unary
        } else {
            Precedence::Atomic
        };
        Ok(Fragment::Expression(Expression::new(format_number(n), tier)))
    }
}

/// `"" + A + B`: the leading empty string makes `+` concatenate even when
/// both inputs are numbers.
#[derive(Debug, Clone, Copy)]
pub struct JoinText;

impl Emitter for JoinText {
    fn emit(&self, _block: &BlockInstance, inputs: &Inputs) -> CodegenResult<Fragment> {
        Ok(Fragment::Expression(Expression::new(
            format!("\"\" + {} + {}", inputs.code("A")?, inputs.code("B")?),
            Precedence::Additive,
        )))
    }

    fn input_tier(&self, _block: &BlockInstance, _socket: &str) -> Precedence {
        Precedence::Multiplicative
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Arithmetic;

impl Arithmetic {
    fn operator(block: &BlockInstance) -> CodegenResult<(&'static str, Precedence)> {
        match field(block, "OP")?.as_text() {
            Some("ADD") => Ok(("+", Precedence::Additive)),
            Some("MINUS") => Ok(("-", Precedence::Additive)),
            Some("MULTIPLY") => Ok(("*", Precedence::Multiplicative)),
            Some("DIVIDE") => Ok(("/", Precedence::Multiplicative)),
            other => Err(CodegenError::Internal(format!(
                "block {} has unknown operator {other:?}",
                block.id()
            ))),
        }
    }
}

impl Emitter for Arithmetic {
    fn emit(&self, block: &BlockInstance, inputs: &Inputs) -> CodegenResult<Fragment> {
        let (symbol, tier) = Self::operator(block)?;
        Ok(Fragment::Expression(Expression::new(
            format!("{} {symbol} {}", inputs.code("A")?, inputs.code("B")?),
            tier,
        )))
    }

    /// Left operands bind at the operator's own tier and right operands one
    /// tier higher, so `a - (b - c)` keeps its parentheses.
    fn input_tier(&self, block: &BlockInstance, socket: &str) -> Precedence {
        let own = Self::operator(block)
            .map(|(_, tier)| tier)
            .unwrap_or(Precedence::Multiplicative);
        match (socket, own) {
            ("A", tier) => tier,
            (_, Precedence::Additive) => Precedence::Multiplicative,
            _ => Precedence::Unary,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Registration
// ══════════════════════════════════════════════════════════════════════════════

impl EmitterTable {
    pub(crate) fn register_statements(&mut self) {
        use Arg::*;
        let calls: &[(&str, &'static str, &[Arg])] = &[
            ("show_message", "appendOutput", &[Input("MESSAGE")]),
            ("play_sound", "playSound", &[Text("SOUND")]),
            ("move_sprite", "moveActor", &[Text("DIRECTION"), Number("STEPS")]),
            ("particle_effect", "spawnParticles", &[Text("EFFECT")]),
            ("move_character", "moveActor", &[Text("DIRECTION"), Number("STEPS")]),
            ("character_say", "actorSay", &[Input("MESSAGE")]),
            ("character_dance", "actorAnimate", &[Text("DANCE")]),
            ("character_jump", "actorJump", &[Text("HEIGHT")]),
            ("character_spin", "actorSpin", &[Text("SPEED")]),
            ("play_music", "playTrack", &[Text("MUSIC")]),
            ("create_melody", "playTune", &[Text("MELODY")]),
            ("draw_shape", "renderShape", &[Text("SHAPE"), Number("SIZE")]),
        ];
        self.register("say_hello", Box::new(Greeting));
        for &(type_id, function, args) in calls {
            self.register(type_id, Box::new(HostCall::new(function, args)));
        }
    }

    pub(crate) fn register_values(&mut self) {
        self.register("text", Box::new(TextLiteral));
        self.register("number", Box::new(NumberLiteral));
        self.register("join_text", Box::new(JoinText));
        self.register("arithmetic", Box::new(Arithmetic));
    }
}
