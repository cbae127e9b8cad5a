#![allow(clippy::float_cmp)]

use protocol::{ShapeKind, Vec3};

use super::*;

#[test]
fn compute_delta_subtracts_every_triple() {
    let baseline = Transform::IDENTITY;
    let live = Transform::new(Vec3::new(0.1, 0.0, 0.0), Vec3::new(0.0, 0.5, 0.0), Vec3::new(1.0, 1.0, 1.2));

    let delta = compute_delta(&live, &baseline);
    assert_eq!(delta.position, Vec3::new(0.1, 0.0, 0.0));
    assert_eq!(delta.rotation, Vec3::new(0.0, 0.5, 0.0));
    assert!((delta.scale.z - 0.2).abs() < 1e-12);
    assert_eq!(delta.scale.x, 0.0);
}

#[test]
fn has_signal_ignores_noise_below_epsilon() {
    assert!(!has_signal(&Transform::ZERO));

    let mut tiny = Transform::ZERO;
    tiny.rotation.z = 5e-7;
    assert!(!has_signal(&tiny));

    let mut real = Transform::ZERO;
    real.scale.y = -2e-6;
    assert!(has_signal(&real));
}

#[test]
fn apply_inbound_adds_to_known_annotation() {
    let mut store = AnnotationStore::new();
    store.create("A", ShapeKind::Circle, Transform::IDENTITY).unwrap();

    let mut delta = Transform::ZERO;
    delta.position.y = 0.25;
    assert!(apply_inbound(&mut store, "A", &delta));
    assert_eq!(store.get("A").unwrap().transform.position.y, 0.25);
}

#[test]
fn apply_inbound_ignores_unknown_annotation() {
    let mut store = AnnotationStore::new();
    assert!(!apply_inbound(&mut store, "ghost", &Transform::IDENTITY));
    assert!(store.is_empty());
}

#[test]
fn update_message_carries_delta_triples() {
    let mut delta = Transform::ZERO;
    delta.position.x = 0.05;
    let Message::Update { annotation_id, position, rotation, scale } = update_message("A", &delta) else {
        panic!("expected update");
    };
    assert_eq!(annotation_id, "A");
    assert_eq!(position, Vec3::new(0.05, 0.0, 0.0));
    assert_eq!(rotation, Vec3::ZERO);
    assert_eq!(scale, Vec3::ZERO);
}

#[test]
fn sum_of_sent_deltas_equals_total_movement() {
    let start = Transform::IDENTITY;
    let mut baseline = start;
    let mut live = start;
    let mut sent = Transform::ZERO;

    for step in [0.05, -0.02, 0.3, 0.0, 0.11] {
        live.position.x += step;
        live.rotation.y += step * 10.0;
        let delta = compute_delta(&live, &baseline);
        if has_signal(&delta) {
            sent = sent + delta;
            baseline = live;
        }
    }

    let total = live - start;
    assert!((sent.position.x - total.position.x).abs() < 1e-9);
    assert!((sent.rotation.y - total.rotation.y).abs() < 1e-9);
}
