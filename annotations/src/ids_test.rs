use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

#[test]
fn annotation_id_shape() {
    for _ in 0..100 {
        let id = annotation_id();
        assert_eq!(id.len(), 7);
        assert!(id.starts_with("AN-"));
        assert!(id[3..].bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()));
    }
}

#[test]
fn room_code_shape() {
    for _ in 0..100 {
        let code = room_code();
        assert!(is_room_code(&code), "bad room code {code}");
    }
}

#[test]
fn seeded_generation_is_deterministic() {
    let mut a = StdRng::seed_from_u64(7);
    let mut b = StdRng::seed_from_u64(7);
    assert_eq!(annotation_id_with(&mut a), annotation_id_with(&mut b));
    assert_eq!(room_code_with(&mut a), room_code_with(&mut b));
}

#[test]
fn is_room_code_rejects_bad_input() {
    assert!(is_room_code("K3Z9Q"));
    assert!(!is_room_code("k3z9q"));
    assert!(!is_room_code("K3Z9"));
    assert!(!is_room_code("K3Z9Q1"));
    assert!(!is_room_code("K3-9Q"));
}
