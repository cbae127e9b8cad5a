//! Random annotation ids and room codes.

#[cfg(test)]
#[path = "ids_test.rs"]
mod ids_test;

use rand::Rng;

use crate::consts::{ANNOTATION_ID_LEN, ANNOTATION_ID_PREFIX, ROOM_CODE_LEN};
use crate::store::AnnotationId;

const BASE36_UPPER: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn random_chars<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(BASE36_UPPER[rng.random_range(0..BASE36_UPPER.len())]))
        .collect()
}

/// `AN-` followed by four uppercase base-36 characters.
#[must_use]
pub fn annotation_id() -> AnnotationId {
    annotation_id_with(&mut rand::rng())
}

#[must_use]
pub fn annotation_id_with<R: Rng + ?Sized>(rng: &mut R) -> AnnotationId {
    format!("{ANNOTATION_ID_PREFIX}{}", random_chars(rng, ANNOTATION_ID_LEN))
}

/// Five characters from `A-Z0-9`.
#[must_use]
pub fn room_code() -> String {
    room_code_with(&mut rand::rng())
}

#[must_use]
pub fn room_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_chars(rng, ROOM_CODE_LEN)
}

/// True if `code` has the shape of a room code.
#[must_use]
pub fn is_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LEN && code.bytes().all(|b| BASE36_UPPER.contains(&b))
}
