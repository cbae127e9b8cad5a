#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn identity_has_unit_scale() {
    assert_eq!(Transform::IDENTITY.position, Vec3::ZERO);
    assert_eq!(Transform::IDENTITY.rotation, Vec3::ZERO);
    assert_eq!(Transform::IDENTITY.scale, Vec3::ONE);
    assert_eq!(Transform::default(), Transform::IDENTITY);
}

#[test]
fn add_then_sub_restores_original() {
    let a = Transform::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 0.0, -1.0), Vec3::ONE);
    let d = Transform::new(Vec3::new(0.25, 0.0, 0.0), Vec3::ZERO, Vec3::new(0.0, 0.0, 0.5));
    assert_eq!((a + d) - d, a);
    assert_eq!((a + d) - a, d);
}

#[test]
fn triple_selects_by_mode() {
    let mut t = Transform::IDENTITY;
    t.triple_mut(EditMode::Rotation).y = 0.5;
    t.triple_mut(EditMode::Scale).z = 2.0;
    t.triple_mut(EditMode::Position).x = -1.0;

    assert_eq!(t.triple(EditMode::Rotation), Vec3::new(0.0, 0.5, 0.0));
    assert_eq!(t.triple(EditMode::Scale), Vec3::new(1.0, 1.0, 2.0));
    assert_eq!(t.triple(EditMode::Position), Vec3::new(-1.0, 0.0, 0.0));
}

#[test]
fn identity_minus_identity_is_zero() {
    assert_eq!(Transform::IDENTITY - Transform::IDENTITY, Transform::ZERO);
}
