use annotations::edit::EditMode;
use annotations::input::MoveKey;
use protocol::{MediaKind, ShapeKind, Vec3};

use super::*;

fn session() -> SessionState {
    SessionState { room: "K3Z9Q".into(), last_created: None }
}

fn commands(out: &Outgoing) -> Vec<&'static str> {
    out.messages.iter().map(Message::command).collect()
}

#[test]
fn create_then_edit_last_reselects() {
    let mut engine = Engine::new();
    let mut state = session();

    let out = handle_event(&mut engine, &mut state, ScriptEvent::Create(ShapeKind::Square));
    assert_eq!(commands(&out), vec!["create"]);
    let created = state.last_created.clone().unwrap();

    handle_event(&mut engine, &mut state, ScriptEvent::Escape);
    let out = handle_event(&mut engine, &mut state, ScriptEvent::EditLast);
    assert_eq!(out.messages, vec![Message::Select { annotation_id: created }]);
}

#[test]
fn edit_last_without_create_is_noop() {
    let mut engine = Engine::new();
    let mut state = session();
    assert_eq!(handle_event(&mut engine, &mut state, ScriptEvent::EditLast), Outgoing::default());
}

#[test]
fn held_key_moves_on_tick_not_on_keydown() {
    let mut engine = Engine::new();
    let mut state = session();
    handle_event(&mut engine, &mut state, ScriptEvent::Create(ShapeKind::Circle));

    let out = handle_event(&mut engine, &mut state, ScriptEvent::KeyDown { key: "d".into(), shift: true });
    assert!(out.messages.is_empty());

    let ticked = engine.tick();
    let [Message::Update { position, .. }] = ticked.as_slice() else {
        panic!("expected one update");
    };
    assert_eq!(*position, Vec3::new(0.05, 0.0, 0.0));
}

#[test]
fn blur_releases_held_keys() {
    let mut engine = Engine::new();
    let mut state = session();
    handle_event(&mut engine, &mut state, ScriptEvent::Create(ShapeKind::Circle));
    handle_event(&mut engine, &mut state, ScriptEvent::KeyDown { key: "d".into(), shift: true });
    assert_eq!(engine.tick().len(), 1);

    let out = handle_event(&mut engine, &mut state, ScriptEvent::Blur);
    assert_eq!(out, Outgoing::default());
    assert!(engine.tick().is_empty(), "no movement after focus loss");
    assert!(engine.editing_id().is_some(), "blur keeps the edit session");
}

#[test]
fn wheel_and_nudge_send_updates() {
    let mut engine = Engine::new();
    let mut state = session();
    handle_event(&mut engine, &mut state, ScriptEvent::Create(ShapeKind::Circle));
    handle_event(&mut engine, &mut state, ScriptEvent::Mode(EditMode::Rotation));

    let out = handle_event(&mut engine, &mut state, ScriptEvent::Wheel { delta: 10.0, shift: true });
    assert_eq!(commands(&out), vec!["update"]);

    let out = handle_event(&mut engine, &mut state, ScriptEvent::Nudge(MoveKey::W));
    assert_eq!(commands(&out), vec!["update"]);

    let out = handle_event(&mut engine, &mut state, ScriptEvent::Wheel { delta: 10.0, shift: false });
    assert!(out.messages.is_empty());
}

#[test]
fn delete_current_emits_deselect_then_delete() {
    let mut engine = Engine::new();
    let mut state = session();
    handle_event(&mut engine, &mut state, ScriptEvent::Create(ShapeKind::Triangle));

    let out = handle_event(&mut engine, &mut state, ScriptEvent::DeleteCurrent);
    assert_eq!(commands(&out), vec!["deselect", "delete"]);
    assert!(engine.store().is_empty());

    assert_eq!(handle_event(&mut engine, &mut state, ScriptEvent::DeleteCurrent), Outgoing::default());
}

#[test]
fn share_produces_file_notice_for_room() {
    let mut engine = Engine::new();
    let mut state = session();

    let out = handle_event(
        &mut engine,
        &mut state,
        ScriptEvent::Share { kind: MediaKind::Image, url: "/uploads/K3Z9Q/image/1_a.png".into() },
    );
    let [Notice::File { file_type, url, room_code, timestamp }] = out.notices.as_slice() else {
        panic!("expected one notice");
    };
    assert_eq!(*file_type, MediaKind::Image);
    assert_eq!(url, "/uploads/K3Z9Q/image/1_a.png");
    assert_eq!(room_code, "K3Z9Q");
    assert!(!timestamp.is_empty());
    assert_eq!(engine.shared_files().len(), 1);
}

#[test]
fn mode_and_sensitivity_emit_nothing() {
    let mut engine = Engine::new();
    let mut state = session();
    assert_eq!(handle_event(&mut engine, &mut state, ScriptEvent::Mode(EditMode::Scale)), Outgoing::default());
    assert_eq!(handle_event(&mut engine, &mut state, ScriptEvent::Sensitivity(0.2)), Outgoing::default());
    assert_eq!(engine.mode(), EditMode::Scale);
    assert!((engine.sensitivity() - 0.2).abs() < f64::EPSILON);
}

#[test]
fn describe_inbound_summarizes_frames() {
    let msg = Inbound::Annotation(Message::Delete { annotation_id: "AN-0001".into() });
    assert_eq!(describe_inbound(&msg), "<- delete AN-0001");

    let notice = Inbound::Notice(file_notice(MediaKind::Pdf, "/u/a.pdf".into(), "R"));
    assert_eq!(describe_inbound(&notice), "<- file pdf /u/a.pdf");
}
