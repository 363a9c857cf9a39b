//! Kidcode session as a WASM module for the browser page.
//!
//! The page owns rendering, drag and drop, audio and animation. It drives
//! a [`Workspace`] and gets JSON strings back.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { Workspace } from 'kidcode-wasm';
//!
//! await init();
//!
//! const ws = new Workspace("{}", localStorage.getItem("kidsProgramBlocks"),
//!                          localStorage.getItem("tutorialShown") !== null);
//! const walk = JSON.parse(ws.insert_block("move_character", '{"DIRECTION":"RIGHT"}')).value;
//! const result = JSON.parse(ws.run());
//! // { ok: true, calls: [{ function: "moveActor", direction: "RIGHT", distance: 50 }] }
//! result.calls.forEach(replay);
//! ```
//!
//! Every method answers `{"ok": true, "value": ...}` or
//! `{"ok": false, "error": {code, kind, message, block?, span?, suggestion?}}`.

use std::collections::BTreeMap;
use std::time::Duration;

use kidcode_eval::tune::{self, Note};
use kidcode_eval::{HostCall, RecordingHost, Scheduler, TaskId};
use kidcode_session::{KeyValueStore, MemoryStore, Session, SessionConfig, SessionError};
use kidcode_types::{BlockError, BlockId, ErrorCode, FieldValue};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct Reply<T: Serialize> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<BlockError>,
}

#[derive(Serialize)]
struct RunReply {
    ok: bool,
    /// Calls to replay, including those made before a fault.
    calls: Vec<HostCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<BlockError>,
}

/// A note the page should start playing now.
#[derive(Serialize)]
struct NoteReply {
    note: &'static str,
    hz: f64,
    duration_ms: u64,
}

impl From<Note> for NoteReply {
    fn from(n: Note) -> Self {
        Self {
            note: n.name,
            hz: n.frequency,
            duration_ms: millis(tune::BEAT.mul_f64(n.beats)),
        }
    }
}

#[derive(Serialize)]
struct TuneStep {
    delay_ms: u64,
    #[serde(flatten)]
    note: NoteReply,
}

#[derive(Serialize)]
struct TuneReply {
    task: u64,
    steps: Vec<TuneStep>,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(
            r#"{{"ok":false,"error":{{"code":{},"kind":"execution_error","message":"serialization error: {}"}}}}"#,
            ErrorCode::INTERNAL.0,
            e
        )
    })
}

fn reply<T: Serialize>(result: Result<T, BlockError>) -> String {
    let reply = match result {
        Ok(value) => Reply {
            ok: true,
            value: Some(value),
            error: None,
        },
        Err(error) => Reply {
            ok: false,
            value: None,
            error: Some(error),
        },
    };
    to_json(&reply)
}

fn session_reply<T: Serialize>(result: Result<T, SessionError>) -> String {
    reply(result.map_err(|e| e.to_block_error()))
}

fn block_id(text: &str) -> Result<BlockId, BlockError> {
    text.parse()
        .map_err(|msg: String| BlockError::new(ErrorCode::UNKNOWN_BLOCK, msg))
}

fn field_value(json: &str) -> Result<FieldValue, BlockError> {
    serde_json::from_str(json).map_err(|e| {
        BlockError::new(
            ErrorCode::TYPE_MISMATCH,
            format!("field value must be a JSON number or string: {e}"),
        )
    })
}

/// One editing session.
#[wasm_bindgen]
pub struct Workspace {
    session: Session<MemoryStore>,
    tunes: Scheduler<Note>,
}

#[wasm_bindgen]
impl Workspace {
    /// `config_json` may be `"{}"`. `saved_program` is the last value
    /// returned by [`save`](Self::save), if the page kept one.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, saved_program: Option<String>, tutorial_shown: bool) -> Workspace {
        let config = SessionConfig::from_json(config_json).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring session config");
            SessionConfig::default()
        });
        let mut store = MemoryStore::new();
        let seeded = [
            (&config.storage_key, saved_program),
            (&config.tutorial_key, tutorial_shown.then(|| "true".to_string())),
        ];
        for (key, value) in seeded {
            let Some(value) = value else { continue };
            if let Err(e) = store.put(key, &value) {
                warn!(key = %key, error = %e, "could not seed page storage");
            }
        }
        let session = match Session::open(config.clone(), store.clone()) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "starting with an empty program");
                Session::new(config, store)
            }
        };
        Workspace {
            session,
            tunes: Scheduler::new(),
        }
    }

    // ── Editing ──

    /// `fields_json` is an object of field name → value, or `""`.
    /// Answers the new block id.
    pub fn insert_block(&mut self, type_id: &str, fields_json: &str) -> String {
        let fields: BTreeMap<String, FieldValue> = if fields_json.trim().is_empty() {
            BTreeMap::new()
        } else {
            match serde_json::from_str(fields_json) {
                Ok(fields) => fields,
                Err(e) => {
                    return reply::<()>(Err(BlockError::new(
                        ErrorCode::TYPE_MISMATCH,
                        format!("fields must be a JSON object of numbers and strings: {e}"),
                    )))
                }
            }
        };
        let fields: Vec<(&str, FieldValue)> = fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        session_reply(self.session.insert_block(type_id, &fields))
    }

    pub fn set_field(&mut self, block: &str, name: &str, value_json: &str) -> String {
        let edit = block_id(block).and_then(|id| Ok((id, field_value(value_json)?)));
        match edit {
            Ok((id, value)) => session_reply(self.session.set_field(id, name, value)),
            Err(e) => reply::<()>(Err(e)),
        }
    }

    pub fn connect_statement(&mut self, parent: &str, child: &str) -> String {
        match (block_id(parent), block_id(child)) {
            (Ok(p), Ok(c)) => session_reply(self.session.connect_statement(p, c)),
            (Err(e), _) | (_, Err(e)) => reply::<()>(Err(e)),
        }
    }

    pub fn connect_value(&mut self, parent: &str, socket: &str, child: &str) -> String {
        match (block_id(parent), block_id(child)) {
            (Ok(p), Ok(c)) => session_reply(self.session.connect_value(p, socket, c)),
            (Err(e), _) | (_, Err(e)) => reply::<()>(Err(e)),
        }
    }

    pub fn disconnect_statement(&mut self, block: &str) -> String {
        match block_id(block) {
            Ok(id) => session_reply(self.session.disconnect_statement(id)),
            Err(e) => reply::<()>(Err(e)),
        }
    }

    /// Answers the detached block id, or `null`.
    pub fn disconnect_value(&mut self, parent: &str, socket: &str) -> String {
        match block_id(parent) {
            Ok(id) => session_reply(self.session.disconnect_value(id, socket)),
            Err(e) => reply::<()>(Err(e)),
        }
    }

    /// Answers every removed block id.
    pub fn delete_block(&mut self, block: &str) -> String {
        match block_id(block) {
            Ok(id) => session_reply(self.session.delete_block(id)),
            Err(e) => reply::<()>(Err(e)),
        }
    }

    pub fn clear(&mut self) -> String {
        self.session.clear();
        reply::<()>(Ok(()))
    }

    // ── Generate & run ──

    pub fn generate(&self) -> String {
        session_reply(self.session.generate())
    }

    /// Run the program, recording host calls for the page to replay.
    pub fn run(&self) -> String {
        let mut host = RecordingHost::new();
        let result = self.session.run(&mut host);
        to_json(&RunReply {
            ok: result.is_ok(),
            calls: host.calls,
            error: result.err().map(|e| e.to_block_error()),
        })
    }

    // ── Melodies ──

    /// Schedule a `create_melody` tune. Answers `{task, steps}`, each step
    /// `{delay_ms, note, hz, duration_ms}` with the delay counted from the
    /// previous note. Notes come due through [`advance_tunes`](Self::advance_tunes).
    pub fn play_tune(&mut self, tune_id: &str) -> String {
        let Some(notes) = tune::melody(tune_id) else {
            return reply::<()>(Err(BlockError::new(
                ErrorCode::ARGUMENT_MISMATCH,
                format!("unknown tune '{tune_id}'"),
            )
            .with_suggestion("use HAPPY, MYSTERY or VICTORY")));
        };
        let steps = tune::steps(notes);
        let task = self.tunes.schedule(steps.iter().copied());
        reply(Ok(TuneReply {
            task: task.get(),
            steps: steps
                .into_iter()
                .map(|(delay, note)| TuneStep {
                    delay_ms: millis(delay),
                    note: note.into(),
                })
                .collect(),
        }))
    }

    /// Move the melody clock forward. Answers the notes to start now, in
    /// order.
    pub fn advance_tunes(&mut self, elapsed_ms: f64) -> String {
        let elapsed = Duration::try_from_secs_f64(elapsed_ms.max(0.0) / 1000.0)
            .unwrap_or(Duration::MAX);
        let due: Vec<NoteReply> = self
            .tunes
            .advance(elapsed)
            .into_iter()
            .map(NoteReply::from)
            .collect();
        reply(Ok(due))
    }

    /// Answers how many notes were dropped.
    pub fn cancel_tune(&mut self, task: u64) -> String {
        reply(Ok(self.tunes.cancel(TaskId::from(task))))
    }

    pub fn stop_tunes(&mut self) -> String {
        self.tunes.clear();
        reply::<()>(Ok(()))
    }

    // ── Persistence & sharing ──

    /// Answers the saved document as JSON text, for the page to store.
    pub fn save(&mut self) -> String {
        let saved = self.session.save().map(|()| self.session.document().to_json());
        session_reply(saved)
    }

    /// Answers whether a saved program was found.
    pub fn load(&mut self) -> String {
        session_reply(self.session.load())
    }

    pub fn document(&self) -> String {
        reply(Ok(self.session.document()))
    }

    pub fn share_link(&self) -> String {
        reply(Ok(self.session.share_link()))
    }

    pub fn load_shared(&mut self, link: &str) -> String {
        session_reply(self.session.load_shared(link))
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.session.has_unsaved_changes()
    }

    // ── Page state ──

    pub fn select_character(&mut self, character: &str) -> String {
        self.session.select_character(character);
        reply::<()>(Ok(()))
    }

    pub fn toggle_theme(&mut self) -> String {
        reply(Ok(self.session.toggle_theme()))
    }

    pub fn theme(&self) -> String {
        reply(Ok(self.session.theme()))
    }

    pub fn tutorial_shown(&self) -> String {
        session_reply(self.session.tutorial_shown())
    }

    pub fn mark_tutorial_shown(&mut self) -> String {
        session_reply(self.session.mark_tutorial_shown())
    }

    pub fn stats(&self) -> String {
        reply(Ok(self.session.stats()))
    }

    pub fn achievements(&self) -> String {
        reply(Ok(self.session.achievements()))
    }

    /// Achievements unlocked since the last call, to announce once.
    pub fn take_new_achievements(&mut self) -> String {
        reply(Ok(self.session.take_new_achievements()))
    }
}

/// JSON table of every block type, for building the palette.
#[wasm_bindgen]
pub fn palette_table() -> String {
    kidcode_registry::reference::palette_table(&kidcode_registry::BlockRegistry::builtin())
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
