//! The host API: the only functions program text can call.

use std::fmt;

use kidcode_types::format_number;
use serde::{Deserialize, Serialize};

use crate::error::Fault;

/// What a host returns from each call. `Err` carries a message for the user.
pub type HostResult = Result<(), String>;

/// The presentation layer's side of a run.
///
/// Method names mirror the program-text names (`moveActor` →
/// [`move_actor`](HostApi::move_actor)).
pub trait HostApi {
    fn play_sound(&mut self, effect_id: &str) -> HostResult;
    fn move_actor(&mut self, direction: &str, distance: f64) -> HostResult;
    fn actor_say(&mut self, text: &str) -> HostResult;
    fn actor_animate(&mut self, kind: &str) -> HostResult;
    fn play_track(&mut self, track_id: &str) -> HostResult;
    fn render_shape(&mut self, shape_id: &str, size: f64) -> HostResult;
    fn actor_jump(&mut self, height: &str) -> HostResult;
    fn actor_spin(&mut self, speed: &str) -> HostResult;
    fn spawn_particles(&mut self, kind: &str) -> HostResult;
    fn play_tune(&mut self, tune_id: &str) -> HostResult;
    fn append_output(&mut self, text: &str) -> HostResult;
}

// ══════════════════════════════════════════════════════════════════════════════
// Values and signatures
// ══════════════════════════════════════════════════════════════════════════════

/// A runtime value: what an argument expression evaluates to.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Text; numbers are accepted and rendered as text.
    Text,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSignature {
    pub name: &'static str,
    pub params: &'static [(&'static str, ParamType)],
}

use ParamType::{Number as N, Text as T};

/// Every callable function.
pub const HOST_FUNCTIONS: &[HostSignature] = &[
    HostSignature { name: "playSound", params: &[("effectId", T)] },
    HostSignature { name: "moveActor", params: &[("direction", T), ("distance", N)] },
    HostSignature { name: "actorSay", params: &[("text", T)] },
    HostSignature { name: "actorAnimate", params: &[("kind", T)] },
    HostSignature { name: "playTrack", params: &[("trackId", T)] },
    HostSignature { name: "renderShape", params: &[("shapeId", T), ("size", N)] },
    HostSignature { name: "actorJump", params: &[("height", T)] },
    HostSignature { name: "actorSpin", params: &[("speed", T)] },
    HostSignature { name: "spawnParticles", params: &[("kind", T)] },
    HostSignature { name: "playTune", params: &[("tuneId", T)] },
    HostSignature { name: "appendOutput", params: &[("text", T)] },
];

pub fn signature(name: &str) -> Option<&'static HostSignature> {
    HOST_FUNCTIONS.iter().find(|sig| sig.name == name)
}

// ══════════════════════════════════════════════════════════════════════════════
// Calls
// ══════════════════════════════════════════════════════════════════════════════

/// One host call with checked arguments.
///
/// Serializes as `{"function": "moveActor", "direction": "RIGHT", "distance": 50.0}`
/// so a browser host can replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostCall {
    PlaySound { effect_id: String },
    MoveActor { direction: String, distance: f64 },
    ActorSay { text: String },
    ActorAnimate { kind: String },
    PlayTrack { track_id: String },
    RenderShape { shape_id: String, size: f64 },
    ActorJump { height: String },
    ActorSpin { speed: String },
    SpawnParticles { kind: String },
    PlayTune { tune_id: String },
    AppendOutput { text: String },
}

impl HostCall {
    /// Check `args` against `sig` and build the call.
    pub fn bind(sig: &HostSignature, args: Vec<Value>) -> Result<Self, Fault> {
        if args.len() != sig.params.len() {
            return Err(Fault::Arity {
                function: sig.name,
                expected: sig.params.len(),
                found: args.len(),
            });
        }
        let mut text = Vec::new();
        let mut numbers = Vec::new();
        for (&(param, ty), arg) in sig.params.iter().zip(args) {
            match (ty, arg) {
                (ParamType::Number, Value::Number(n)) => numbers.push(n),
                (ParamType::Number, other) => {
                    return Err(Fault::NotANumber {
                        function: sig.name,
                        param,
                        found: other.type_name().to_string(),
                    })
                }
                (ParamType::Text, value) => text.push(value.to_string()),
            }
        }
        let mut text = text.into_iter();
        let mut s = || text.next().unwrap_or_default();
        let n = numbers.first().copied().unwrap_or_default();
        Ok(match sig.name {
            "playSound" => Self::PlaySound { effect_id: s() },
            "moveActor" => Self::MoveActor { direction: s(), distance: n },
            "actorSay" => Self::ActorSay { text: s() },
            "actorAnimate" => Self::ActorAnimate { kind: s() },
            "playTrack" => Self::PlayTrack { track_id: s() },
            "renderShape" => Self::RenderShape { shape_id: s(), size: n },
            "actorJump" => Self::ActorJump { height: s() },
            "actorSpin" => Self::ActorSpin { speed: s() },
            "spawnParticles" => Self::SpawnParticles { kind: s() },
            "playTune" => Self::PlayTune { tune_id: s() },
            "appendOutput" => Self::AppendOutput { text: s() },
            other => return Err(Fault::UnknownFunction(other.to_string())),
        })
    }

    /// Program-text name of the function.
    pub fn function(&self) -> &'static str {
        match self {
            Self::PlaySound { .. } => "playSound",
            Self::MoveActor { .. } => "moveActor",
            Self::ActorSay { .. } => "actorSay",
            Self::ActorAnimate { .. } => "actorAnimate",
            Self::PlayTrack { .. } => "playTrack",
            Self::RenderShape { .. } => "renderShape",
            Self::ActorJump { .. } => "actorJump",
            Self::ActorSpin { .. } => "actorSpin",
            Self::SpawnParticles { .. } => "spawnParticles",
            Self::PlayTune { .. } => "playTune",
            Self::AppendOutput { .. } => "appendOutput",
        }
    }

    /// Invoke the matching [`HostApi`] method.
    pub fn dispatch(&self, host: &mut dyn HostApi) -> HostResult {
        match self {
            Self::PlaySound { effect_id } => host.play_sound(effect_id),
            Self::MoveActor { direction, distance } => host.move_actor(direction, *distance),
            Self::ActorSay { text } => host.actor_say(text),
            Self::ActorAnimate { kind } => host.actor_animate(kind),
            Self::PlayTrack { track_id } => host.play_track(track_id),
            Self::RenderShape { shape_id, size } => host.render_shape(shape_id, *size),
            Self::ActorJump { height } => host.actor_jump(height),
            Self::ActorSpin { speed } => host.actor_spin(speed),
            Self::SpawnParticles { kind } => host.spawn_particles(kind),
            Self::PlayTune { tune_id } => host.play_tune(tune_id),
            Self::AppendOutput { text } => host.append_output(text),
        }
    }
}

impl fmt::Display for HostCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = match self {
            Self::MoveActor { direction, distance } => {
                format!("{direction:?}, {}", format_number(*distance))
            }
            Self::RenderShape { shape_id, size } => {
                format!("{shape_id:?}, {}", format_number(*size))
            }
            Self::PlaySound { effect_id: s }
            | Self::ActorSay { text: s }
            | Self::ActorAnimate { kind: s }
            | Self::PlayTrack { track_id: s }
            | Self::ActorJump { height: s }
            | Self::ActorSpin { speed: s }
            | Self::SpawnParticles { kind: s }
            | Self::PlayTune { tune_id: s }
            | Self::AppendOutput { text: s } => format!("{s:?}"),
        };
        write!(f, "{}({args})", self.function())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// RecordingHost
// ══════════════════════════════════════════════════════════════════════════════

/// A host that records every call in order.
///
/// Optionally fails every call to one function, for exercising fault
/// handling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
    fail_on: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report failure from every call to `function`, after recording it.
    pub fn failing_on(function: impl Into<String>) -> Self {
        Self {
            calls: Vec::new(),
            fail_on: Some(function.into()),
        }
    }

    /// Everything passed to `appendOutput`, concatenated.
    pub fn output(&self) -> String {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::AppendOutput { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, call: HostCall) -> HostResult {
        let function = call.function();
        self.calls.push(call);
        match &self.fail_on {
            Some(f) if f == function => Err(format!("{function} is unavailable")),
            _ => Ok(()),
        }
    }
}

impl HostApi for RecordingHost {
    fn play_sound(&mut self, effect_id: &str) -> HostResult {
        self.record(HostCall::PlaySound { effect_id: effect_id.into() })
    }
    fn move_actor(&mut self, direction: &str, distance: f64) -> HostResult {
        self.record(HostCall::MoveActor { direction: direction.into(), distance })
    }
    fn actor_say(&mut self, text: &str) -> HostResult {
        self.record(HostCall::ActorSay { text: text.into() })
    }
    fn actor_animate(&mut self, kind: &str) -> HostResult {
        self.record(HostCall::ActorAnimate { kind: kind.into() })
    }
    fn play_track(&mut self, track_id: &str) -> HostResult {
        self.record(HostCall::PlayTrack { track_id: track_id.into() })
    }
    fn render_shape(&mut self, shape_id: &str, size: f64) -> HostResult {
        self.record(HostCall::RenderShape { shape_id: shape_id.into(), size })
    }
    fn actor_jump(&mut self, height: &str) -> HostResult {
        self.record(HostCall::ActorJump { height: height.into() })
    }
    fn actor_spin(&mut self, speed: &str) -> HostResult {
        self.record(HostCall::ActorSpin { speed: speed.into() })
    }
    fn spawn_particles(&mut self, kind: &str) -> HostResult {
        self.record(HostCall::SpawnParticles { kind: kind.into() })
    }
    fn play_tune(&mut self, tune_id: &str) -> HostResult {
        self.record(HostCall::PlayTune { tune_id: tune_id.into() })
    }
    fn append_output(&mut self, text: &str) -> HostResult {
        self.record(HostCall::AppendOutput { text: text.into() })
    }
}
