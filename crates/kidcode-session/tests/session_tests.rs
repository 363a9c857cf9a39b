//! Session tests: the end-to-end scenarios (edit → generate → run,
//! save/load, share links, achievements) through the public surface.

use kidcode_codegen::CodegenError;
use kidcode_eval::{HostCall, RecordingHost};
use kidcode_session::achievements::{
    CATEGORY_MASTER, CHARACTER_SELECTED, CODE_WIZARD, FIRST_PROGRAM,
};
use kidcode_session::{
    FileStore, KeyValueStore, MemoryStore, Session, SessionConfig, SessionError,
};
use kidcode_types::{BlockId, ErrorCode, ErrorKind, FieldValue, MAX_VALUE_DEPTH};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn session() -> Session<MemoryStore> {
    Session::new(SessionConfig::default(), MemoryStore::new())
}

fn text(s: &str) -> FieldValue {
    FieldValue::Text(s.to_string())
}

fn num(n: f64) -> FieldValue {
    FieldValue::Number(n)
}

/// The error's structured form, panicking if the call succeeded.
fn block_error<T: std::fmt::Debug>(result: Result<T, SessionError>) -> kidcode_types::BlockError {
    match result {
        Ok(v) => panic!("expected an error, got {v:?}"),
        Err(e) => e.to_block_error(),
    }
}

/// move_character(RIGHT, 50) → character_say("Hi"). Returns the two
/// statement ids.
fn walk_and_greet(s: &mut Session<impl KeyValueStore>) -> (BlockId, BlockId) {
    let walk = s
        .insert_block("move_character", &[("DIRECTION", text("RIGHT")), ("STEPS", num(50.0))])
        .unwrap();
    let say = s.insert_block("character_say", &[]).unwrap();
    let hi = s.insert_block("text", &[("TEXT", text("Hi"))]).unwrap();
    s.connect_value(say, "MESSAGE", hi).unwrap();
    s.connect_statement(walk, say).unwrap();
    (walk, say)
}

// ══════════════════════════════════════════════════════════════════════════════
// Generate & run
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn empty_session_generates_nothing() {
    let s = session();
    assert_eq!(s.generate().unwrap(), "");
    let mut host = RecordingHost::new();
    assert_eq!(s.run(&mut host).unwrap().calls, 0);
}

#[test]
fn move_then_say_scenario() {
    let mut s = session();
    walk_and_greet(&mut s);
    assert_eq!(
        s.generate().unwrap(),
        "moveActor(\"RIGHT\", 50)\nactorSay(\"Hi\")\n"
    );
    let mut host = RecordingHost::new();
    let report = s.run(&mut host).unwrap();
    assert_eq!(report.calls, 2);
    assert_eq!(
        host.calls,
        vec![
            HostCall::MoveActor { direction: "RIGHT".into(), distance: 50.0 },
            HostCall::ActorSay { text: "Hi".into() },
        ]
    );
}

#[test]
fn runtime_fault_names_the_block() {
    let mut s = session();
    let hello = s.insert_block("say_hello", &[]).unwrap();
    let say = s.insert_block("character_say", &[]).unwrap();
    let join = s.insert_block("join_text", &[]).unwrap();
    let div = s
        .insert_block("arithmetic", &[("OP", text("DIVIDE"))])
        .unwrap();
    let one = s.insert_block("number", &[("NUM", num(1.0))]).unwrap();
    let zero = s.insert_block("number", &[("NUM", num(0.0))]).unwrap();
    s.connect_value(div, "A", one).unwrap();
    s.connect_value(div, "B", zero).unwrap();
    s.connect_value(join, "A", div).unwrap();
    s.connect_value(say, "MESSAGE", join).unwrap();
    s.connect_statement(hello, say).unwrap();

    let mut host = RecordingHost::new();
    let err = s.run(&mut host).unwrap_err();
    match &err {
        SessionError::Execution { error, block } => {
            assert_eq!(error.code, ErrorCode::DIVISION_BY_ZERO);
            assert_eq!(*block, Some(say));
        }
        other => panic!("expected an execution error, got {other:?}"),
    }
    assert_eq!(err.to_block_error().kind, ErrorKind::ExecutionError);
    assert_eq!(host.output(), "Hello, world! ");
}

#[test]
fn deepest_allowed_values_still_run() {
    let mut s = session();
    let say = s.insert_block("character_say", &[]).unwrap();
    let mut parent = say;
    let mut socket = "MESSAGE";
    let mut joins = Vec::new();
    for _ in 0..MAX_VALUE_DEPTH {
        let join = s.insert_block("join_text", &[]).unwrap();
        s.connect_value(parent, socket, join).unwrap();
        joins.push(join);
        parent = join;
        socket = "B";
    }
    let x = s.insert_block("text", &[("TEXT", text("x"))]).unwrap();
    s.connect_value(joins[0], "A", x).unwrap();

    // Growing the chain past the limit is refused at edit time.
    let extra = s.insert_block("text", &[("TEXT", text("y"))]).unwrap();
    let before = s.graph().clone();
    let err = block_error(s.connect_value(parent, "B", extra));
    assert_eq!(err.code, ErrorCode::VALUE_TOO_DEEP);
    assert_eq!(err.kind, ErrorKind::StructuralError);
    assert_eq!(s.graph(), &before);

    let mut host = RecordingHost::new();
    s.run(&mut host).unwrap();
    assert_eq!(host.calls, vec![HostCall::ActorSay { text: "x".into() }]);
}

#[test]
fn deepest_allowed_arithmetic_still_runs() {
    let mut s = session();
    let say = s.insert_block("character_say", &[]).unwrap();
    let join = s.insert_block("join_text", &[]).unwrap();
    s.connect_value(say, "MESSAGE", join).unwrap();
    let mut parent = join;
    let mut socket = "A";
    // 0 - (0 - (... (0 - -1))) with a negated literal at the bottom.
    for _ in 0..MAX_VALUE_DEPTH - 2 {
        let minus = s
            .insert_block("arithmetic", &[("OP", text("MINUS"))])
            .unwrap();
        s.connect_value(parent, socket, minus).unwrap();
        parent = minus;
        socket = "B";
    }
    let leaf = s.insert_block("number", &[("NUM", num(-1.0))]).unwrap();
    s.connect_value(parent, "B", leaf).unwrap();

    let mut host = RecordingHost::new();
    s.run(&mut host).unwrap();
    assert_eq!(host.calls, vec![HostCall::ActorSay { text: "-1".into() }]);
}

#[test]
fn reject_policy_from_config() {
    let config = SessionConfig::from_json(r#"{"empty_input_policy": "reject"}"#).unwrap();
    let mut s = Session::new(config, MemoryStore::new());
    let say = s.insert_block("character_say", &[]).unwrap();
    let err = s.generate().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Codegen(CodegenError::EmptyInput { block, .. }) if block == say
    ));
    assert_eq!(err.to_block_error().code, ErrorCode::EMPTY_INPUT);
}

#[test]
fn step_limit_from_config() {
    let config = SessionConfig {
        max_steps: Some(3),
        ..SessionConfig::default()
    };
    let mut s = Session::new(config, MemoryStore::new());
    walk_and_greet(&mut s);
    let mut host = RecordingHost::new();
    let err = s.run(&mut host).unwrap_err();
    assert_eq!(err.to_block_error().code, ErrorCode::STEP_LIMIT);
    assert_eq!(host.calls.len(), 1);
}

// ══════════════════════════════════════════════════════════════════════════════
// Editing
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn number_into_text_socket_is_rejected() {
    let mut s = session();
    let say = s.insert_block("character_say", &[]).unwrap();
    let n = s.insert_block("number", &[("NUM", num(7.0))]).unwrap();
    let before = s.graph().clone();
    let err = block_error(s.connect_value(say, "MESSAGE", n));
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert_eq!(s.graph(), &before);
}

#[test]
fn bad_field_value_is_rejected() {
    let mut s = session();
    let sound = s.insert_block("play_sound", &[]).unwrap();
    let err = block_error(s.set_field(sound, "SOUND", text("KABOOM")));
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert!(err.suggestion.is_some());
    s.set_field(sound, "SOUND", text("VICTORY")).unwrap();
    assert_eq!(s.generate().unwrap(), "playSound(\"VICTORY\")\n");
}

#[test]
fn delete_returns_value_children() {
    let mut s = session();
    let (walk, say) = walk_and_greet(&mut s);
    let removed = s.delete_block(say).unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(removed[0], say);
    assert_eq!(s.graph().len(), 1);
    assert_eq!(s.graph().roots(), [walk]);
}

#[test]
fn disconnect_makes_roots() {
    let mut s = session();
    let (walk, say) = walk_and_greet(&mut s);
    s.disconnect_statement(say).unwrap();
    assert_eq!(s.graph().roots(), [walk, say]);
    let hi = s.disconnect_value(say, "MESSAGE").unwrap();
    assert!(hi.is_some());
    assert_eq!(s.graph().roots().len(), 3);
    assert_eq!(s.disconnect_value(say, "MESSAGE").unwrap(), None);
}

// ══════════════════════════════════════════════════════════════════════════════
// Achievements
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn ten_blocks_three_categories() {
    let mut s = session();
    let types = [
        "say_hello",
        "move_sprite",
        "draw_shape",
        "say_hello",
        "say_hello",
        "move_sprite",
        "move_sprite",
        "draw_shape",
        "draw_shape",
        "say_hello",
    ];
    for t in types {
        s.insert_block(t, &[]).unwrap();
    }
    assert_eq!(s.stats().block_count, 10);
    assert_eq!(s.stats().distinct_category_count, 3);
    assert_eq!(s.achievements(), [FIRST_PROGRAM, CATEGORY_MASTER, CODE_WIZARD]);
    assert_eq!(
        s.take_new_achievements(),
        [FIRST_PROGRAM, CATEGORY_MASTER, CODE_WIZARD]
    );
}

#[test]
fn achievements_never_revoke() {
    let mut s = session();
    let ids: Vec<BlockId> = (0..3)
        .map(|_| s.insert_block("say_hello", &[]).unwrap())
        .collect();
    assert_eq!(s.achievements(), [FIRST_PROGRAM]);
    for id in ids {
        s.delete_block(id).unwrap();
    }
    assert!(s.graph().is_empty());
    assert_eq!(s.achievements(), [FIRST_PROGRAM]);
    s.select_character("robot");
    assert_eq!(s.achievements(), [FIRST_PROGRAM, CHARACTER_SELECTED]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Persistence & sharing
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn save_then_load() {
    let mut s = session();
    walk_and_greet(&mut s);
    let shape = s.graph().shape();
    s.save().unwrap();
    assert!(s.store().get("kidsProgramBlocks").unwrap().is_some());

    s.clear();
    assert!(s.has_unsaved_changes());
    assert!(s.load().unwrap());
    assert_eq!(s.graph().shape(), shape);
    assert!(!s.has_unsaved_changes());
}

#[test]
fn load_without_save() {
    let mut s = session();
    assert!(!s.load().unwrap());
}

#[test]
fn unknown_type_in_document_keeps_graph() {
    let mut s = session();
    walk_and_greet(&mut s);
    s.save().unwrap();
    let saved = s.store().get("kidsProgramBlocks").unwrap().unwrap();
    let tampered = saved.replacen("\"move_character\"", "\"launch_rocket\"", 1);

    let mut store = MemoryStore::new();
    store.put("kidsProgramBlocks", &tampered).unwrap();
    let mut other = Session::new(SessionConfig::default(), store);
    other.insert_block("play_sound", &[]).unwrap();
    let before = other.graph().clone();
    let err = block_error(other.load());
    assert_eq!(err.kind, ErrorKind::MalformedDocument);
    assert_eq!(other.graph(), &before);
}

#[test]
fn open_restores_saved_program() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    {
        let store = FileStore::open(dir.path()).unwrap();
        let mut s = Session::new(SessionConfig::default(), store);
        walk_and_greet(&mut s);
        s.save().unwrap();
    }
    let store = FileStore::open(dir.path()).unwrap();
    let s = Session::open(SessionConfig::default(), store).unwrap();
    assert_eq!(s.graph().len(), 3);
    assert_eq!(
        s.generate().unwrap(),
        "moveActor(\"RIGHT\", 50)\nactorSay(\"Hi\")\n"
    );
}

#[test]
fn open_skips_corrupt_save() {
    let mut store = MemoryStore::new();
    store.put("kidsProgramBlocks", "<xml>not json</xml>").unwrap();
    let s = Session::open(SessionConfig::default(), store).unwrap();
    assert!(s.graph().is_empty());
    assert_eq!(
        s.store().get("kidsProgramBlocks").unwrap().as_deref(),
        Some("<xml>not json</xml>")
    );
}

#[test]
fn custom_storage_key() {
    let config = SessionConfig::from_json(r#"{"storage_key": "slot-2"}"#).unwrap();
    let mut s = Session::new(config, MemoryStore::new());
    s.insert_block("say_hello", &[]).unwrap();
    s.save().unwrap();
    assert!(s.store().get("slot-2").unwrap().is_some());
    assert!(s.store().get("kidsProgramBlocks").unwrap().is_none());
}

#[test]
fn share_link_round_trip() {
    let config = SessionConfig {
        share_base_url: "https://kids.example/".into(),
        ..SessionConfig::default()
    };
    let mut s = Session::new(config, MemoryStore::new());
    walk_and_greet(&mut s);
    let link = s.share_link();
    assert!(link.starts_with("https://kids.example/#code="));

    let mut other = session();
    other.load_shared(&link).unwrap();
    assert_eq!(other.graph().shape(), s.graph().shape());
}

#[test]
fn broken_share_link_keeps_graph() {
    let mut s = session();
    walk_and_greet(&mut s);
    let before = s.graph().clone();
    let err = block_error(s.load_shared("https://kids.example/#code=%%%"));
    assert_eq!(err.kind, ErrorKind::MalformedDocument);
    assert_eq!(s.graph(), &before);
}

#[test]
fn save_is_deterministic() {
    let build = || {
        let mut s = session();
        walk_and_greet(&mut s);
        s.save().unwrap();
        s.store().get("kidsProgramBlocks").unwrap().unwrap()
    };
    let first = build();
    for _ in 0..100 {
        assert_eq!(build(), first);
    }
}
