#![allow(clippy::float_cmp)]

use protocol::Vec3;

use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// =============================================================
// KeyState
// =============================================================

#[test]
fn key_down_tracks_lowercase_and_modifier() {
    let mut keys = KeyState::new();
    keys.key_down(&Key::new("D"), Modifiers::SHIFT);

    assert!(keys.is_held(MoveKey::D));
    assert!(keys.modifier_held());
}

#[test]
fn key_up_releases_key_and_refreshes_modifier() {
    let mut keys = KeyState::new();
    keys.key_down(&Key::new("w"), Modifiers::SHIFT);
    keys.key_up(&Key::new("Shift"), Modifiers::NONE);

    assert!(keys.is_held(MoveKey::W));
    assert!(!keys.modifier_held());

    keys.key_up(&Key::new("W"), Modifiers::NONE);
    assert!(!keys.is_held(MoveKey::W));
}

#[test]
fn held_moves_are_in_wasd_order() {
    let mut keys = KeyState::new();
    for name in ["d", "w", "x", "s"] {
        keys.key_down(&Key::new(name), Modifiers::SHIFT);
    }
    assert_eq!(keys.held_moves(), vec![MoveKey::W, MoveKey::S, MoveKey::D]);
}

#[test]
fn clear_forgets_everything() {
    let mut keys = KeyState::new();
    keys.key_down(&Key::new("a"), Modifiers::SHIFT);
    keys.clear();
    assert!(keys.held_moves().is_empty());
    assert!(!keys.modifier_held());
}

#[test]
fn key_classification() {
    assert!(Key::new("Escape").is_escape());
    assert_eq!(Key::new("A").move_key(), Some(MoveKey::A));
    assert_eq!(Key::new("q").move_key(), None);
}

// =============================================================
// apply_move
// =============================================================

#[test]
fn position_mapping() {
    let mut t = Transform::IDENTITY;
    apply_move(&mut t, EditMode::Position, MoveKey::W, 0.05);
    apply_move(&mut t, EditMode::Position, MoveKey::D, 0.05);
    apply_move(&mut t, EditMode::Position, MoveKey::D, 0.05);
    assert!(close(t.position.y, 0.05));
    assert!(close(t.position.x, 0.1));

    apply_move(&mut t, EditMode::Position, MoveKey::S, 0.05);
    apply_move(&mut t, EditMode::Position, MoveKey::A, 0.05);
    assert!(close(t.position.y, 0.0));
    assert!(close(t.position.x, 0.05));
    assert_eq!(t.rotation, Vec3::ZERO);
    assert_eq!(t.scale, Vec3::ONE);
}

#[test]
fn rotation_mapping_is_ten_times_sensitivity() {
    let mut t = Transform::IDENTITY;
    apply_move(&mut t, EditMode::Rotation, MoveKey::W, 0.05);
    apply_move(&mut t, EditMode::Rotation, MoveKey::A, 0.05);
    assert!(close(t.rotation.x, 0.5));
    assert!(close(t.rotation.y, -0.5));
    assert_eq!(t.position, Vec3::ZERO);
}

#[test]
fn scale_mapping() {
    let mut t = Transform::IDENTITY;
    apply_move(&mut t, EditMode::Scale, MoveKey::S, 0.1);
    apply_move(&mut t, EditMode::Scale, MoveKey::D, 0.1);
    assert!(close(t.scale.y, 0.9));
    assert!(close(t.scale.x, 1.1));
    assert_eq!(t.scale.z, 1.0);
}

// =============================================================
// apply_wheel
// =============================================================

#[test]
fn wheel_moves_z_per_mode() {
    let mut t = Transform::IDENTITY;
    apply_wheel(&mut t, EditMode::Position, 100.0);
    apply_wheel(&mut t, EditMode::Rotation, 10.0);
    assert!(close(t.position.z, 1.0));
    assert!(close(t.rotation.z, 1.0));
}

#[test]
fn wheel_scale_is_clamped_to_floor() {
    let mut t = Transform::IDENTITY;
    apply_wheel(&mut t, EditMode::Scale, -500.0);
    assert!(close(t.scale.z, 0.1));

    apply_wheel(&mut t, EditMode::Scale, 20.0);
    assert!(close(t.scale.z, 0.3));
}
