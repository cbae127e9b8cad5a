#![allow(clippy::float_cmp)]

use protocol::Vec3;

use super::*;

fn ids(list: &[&str]) -> impl FnMut() -> AnnotationId {
    let mut queue: Vec<AnnotationId> = list.iter().rev().map(|s| (*s).to_owned()).collect();
    move || queue.pop().unwrap_or_else(|| "AN-LAST".to_owned())
}

fn commands(out: &[Message]) -> Vec<(&'static str, String)> {
    out.iter()
        .map(|msg| (msg.command(), msg.annotation_id().to_owned()))
        .collect()
}

fn store_with(ids: &[&str]) -> AnnotationStore {
    let mut store = AnnotationStore::new();
    for id in ids {
        store.create(id, ShapeKind::Circle, Transform::IDENTITY).unwrap();
    }
    store
}

fn nudge_x(amount: f64) -> impl FnOnce(&mut Transform) {
    move |t: &mut Transform| t.position.x += amount
}

// =============================================================
// EditMode
// =============================================================

#[test]
fn edit_mode_parses_and_defaults_to_position() {
    assert_eq!(EditMode::default(), EditMode::Position);
    assert_eq!("rotation".parse::<EditMode>(), Ok(EditMode::Rotation));
    assert_eq!("SCALE".parse::<EditMode>(), Ok(EditMode::Scale));
    assert!("skew".parse::<EditMode>().is_err());
}

// =============================================================
// start_edit
// =============================================================

#[test]
fn start_edit_emits_select_and_sets_baseline() {
    let mut store = store_with(&["A"]);
    store.apply_delta("A", &Transform::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec3::ZERO));
    let mut session = EditSession::new();

    let out = session.start_edit(&store, "A");
    assert_eq!(commands(&out), vec![("select", "A".to_owned())]);

    let editing = session.editing().unwrap();
    assert_eq!(editing.baseline.position.x, 1.0);
    assert_eq!(editing.live, editing.baseline);
}

#[test]
fn start_edit_on_other_id_deselects_previous_first() {
    let store = store_with(&["A", "B"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    let out = session.start_edit(&store, "B");
    assert_eq!(commands(&out), vec![("deselect", "A".to_owned()), ("select", "B".to_owned())]);
    assert_eq!(session.editing_id(), Some("B"));
}

#[test]
fn start_edit_same_id_does_not_deselect() {
    let store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    let out = session.start_edit(&store, "A");
    assert_eq!(commands(&out), vec![("select", "A".to_owned())]);
}

#[test]
fn start_edit_missing_target_is_noop() {
    let store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    assert!(session.start_edit(&store, "ghost").is_empty());
    assert_eq!(session.editing_id(), Some("A"));
}

// =============================================================
// create
// =============================================================

#[test]
fn create_inserts_identity_and_starts_editing() {
    let mut store = AnnotationStore::new();
    let mut session = EditSession::new();

    let out = session.create(&mut store, ShapeKind::Triangle, ids(&["AN-0001"])).unwrap();
    assert_eq!(out.len(), 1);
    let Message::Create { kind, annotation_id, position, rotation, scale } = &out[0] else {
        panic!("expected create");
    };
    assert_eq!(*kind, ShapeKind::Triangle);
    assert_eq!(annotation_id, "AN-0001");
    assert_eq!((*position, *rotation, *scale), (Vec3::ZERO, Vec3::ZERO, Vec3::ONE));

    assert_eq!(session.editing_id(), Some("AN-0001"));
    assert_eq!(store.get("AN-0001").unwrap().transform, Transform::IDENTITY);
}

#[test]
fn create_regenerates_colliding_ids() {
    let mut store = store_with(&["AN-AAAA"]);
    let mut session = EditSession::new();

    let out = session.create(&mut store, ShapeKind::Circle, ids(&["AN-AAAA", "AN-BBBB"])).unwrap();
    assert_eq!(out[0].annotation_id(), "AN-BBBB");
    assert_eq!(store.len(), 2);
}

#[test]
fn create_gives_up_when_every_id_collides() {
    let mut store = store_with(&["AN-AAAA"]);
    let mut session = EditSession::new();

    let err = session
        .create(&mut store, ShapeKind::Circle, || "AN-AAAA".to_owned())
        .unwrap_err();
    assert_eq!(err, StoreError::DuplicateId("AN-AAAA".into()));
    assert!(!session.is_editing());
}

#[test]
fn create_while_editing_releases_previous() {
    let mut store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    let out = session.create(&mut store, ShapeKind::Square, ids(&["B"])).unwrap();
    assert_eq!(commands(&out), vec![("deselect", "A".to_owned()), ("create", "B".to_owned())]);
}

// =============================================================
// escape / delete / set_mode
// =============================================================

#[test]
fn escape_deselects_and_goes_idle() {
    let store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    assert_eq!(commands(&session.escape()), vec![("deselect", "A".to_owned())]);
    assert_eq!(*session.state(), EditState::Idle);
    assert!(session.escape().is_empty());
}

#[test]
fn delete_edited_emits_deselect_then_delete() {
    let mut store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    let out = session.delete(&mut store, "A");
    assert_eq!(commands(&out), vec![("deselect", "A".to_owned()), ("delete", "A".to_owned())]);
    assert!(!session.is_editing());
    assert!(!store.contains("A"));
}

#[test]
fn delete_other_keeps_editing() {
    let mut store = store_with(&["A", "B"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    let out = session.delete(&mut store, "B");
    assert_eq!(commands(&out), vec![("delete", "B".to_owned())]);
    assert_eq!(session.editing_id(), Some("A"));
    assert!(!store.contains("B"));
}

#[test]
fn set_mode_persists_across_idle() {
    let store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.set_mode(EditMode::Scale);
    session.start_edit(&store, "A");
    session.escape();
    assert_eq!(session.mode(), EditMode::Scale);
}

// =============================================================
// apply_local
// =============================================================

#[test]
fn apply_local_emits_delta_and_advances_baseline() {
    let mut store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    let out = session.apply_local(&mut store, nudge_x(0.05));
    let Message::Update { position, rotation, scale, .. } = &out[0] else {
        panic!("expected update");
    };
    assert_eq!(*position, Vec3::new(0.05, 0.0, 0.0));
    assert_eq!((*rotation, *scale), (Vec3::ZERO, Vec3::ZERO));

    let editing = session.editing().unwrap();
    assert_eq!(editing.baseline, editing.live);
    assert_eq!(store.get("A").unwrap().transform.position.x, 0.05);
}

#[test]
fn apply_local_without_movement_emits_nothing() {
    let mut store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    assert!(session.apply_local(&mut store, |_| {}).is_empty());
}

#[test]
fn apply_local_while_idle_emits_nothing() {
    let mut store = store_with(&["A"]);
    let mut session = EditSession::new();
    assert!(session.apply_local(&mut store, nudge_x(1.0)).is_empty());
    assert_eq!(store.get("A").unwrap().transform, Transform::IDENTITY);
}

#[test]
fn sent_deltas_sum_to_total_movement() {
    let mut store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    let mut sum = Transform::ZERO;
    for step in [0.05, 0.05, -0.02, 0.13] {
        for msg in session.apply_local(&mut store, nudge_x(step)) {
            if let Message::Update { position, rotation, scale, .. } = msg {
                sum = sum + Transform::new(position, rotation, scale);
            }
        }
    }
    let moved = store.get("A").unwrap().transform - Transform::IDENTITY;
    assert!((sum.position.x - moved.position.x).abs() < 1e-9);
    assert!((sum.position.x - 0.21).abs() < 1e-9);
}

// =============================================================
// Remote effects
// =============================================================

#[test]
fn remote_delete_of_edited_returns_to_idle_silently() {
    let store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    session.on_remote_removed("A");
    assert!(!session.is_editing());
}

#[test]
fn remote_delta_is_not_echoed() {
    let mut store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    let remote = Transform::new(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO, Vec3::ZERO);
    store.apply_delta("A", &remote);
    session.on_remote_delta("A", &remote);

    let out = session.apply_local(&mut store, nudge_x(0.05));
    let Message::Update { position, .. } = &out[0] else {
        panic!("expected update");
    };
    assert_eq!(*position, Vec3::new(0.05, 0.0, 0.0));
    assert_eq!(store.get("A").unwrap().transform.position, Vec3::new(0.05, 0.5, 0.0));
}

#[test]
fn remote_absolute_resets_live_and_baseline() {
    let store = store_with(&["A"]);
    let mut session = EditSession::new();
    session.start_edit(&store, "A");

    let target = Transform::new(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO, Vec3::ONE);
    session.on_remote_absolute("A", target);
    let editing = session.editing().unwrap();
    assert_eq!(editing.baseline, target);
    assert_eq!(editing.live, target);
}
