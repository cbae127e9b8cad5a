//! Delta codec: local edits become additive `update` frames, inbound
//! `update` frames are added onto the local store.
//!
//! DESIGN
//! ======
//! Deltas are always full transforms (all nine components), measured against
//! the edit session's baseline. The baseline only advances after a send, so
//! the sum of every transmitted delta equals `final live - transform at edit
//! start` with no drift from dropped ticks.

#[cfg(test)]
#[path = "delta_test.rs"]
mod delta_test;

use protocol::Message;
use tracing::debug;

use crate::consts::DELTA_EPSILON;
use crate::store::AnnotationStore;
use crate::transform::Transform;

/// Componentwise `live - baseline` over all three triples.
#[must_use]
pub fn compute_delta(live: &Transform, baseline: &Transform) -> Transform {
    *live - *baseline
}

/// True when any component moved by more than [`DELTA_EPSILON`].
#[must_use]
pub fn has_signal(delta: &Transform) -> bool {
    [delta.position, delta.rotation, delta.scale]
        .iter()
        .any(|v| v.max_abs() > DELTA_EPSILON)
}

/// Add an inbound delta onto the store. Unknown ids are ignored.
pub fn apply_inbound(store: &mut AnnotationStore, id: &str, delta: &Transform) -> bool {
    let applied = store.apply_delta(id, delta);
    if !applied {
        debug!(annotation_id = %id, "delta: update for unknown annotation ignored");
    }
    applied
}

/// Build the wire `update` frame for a delta.
#[must_use]
pub fn update_message(id: &str, delta: &Transform) -> Message {
    Message::Update {
        annotation_id: id.to_owned(),
        position: delta.position,
        rotation: delta.rotation,
        scale: delta.scale,
    }
}
