//! Edit session: which annotation this client is editing, in which mode, and
//! what it last told the room about it.
//!
//! DESIGN
//! ======
//! - At most one annotation is in `Editing` locally. Moving the edit to a new
//!   target emits `deselect(prev)` before any frame that names the new one.
//! - `baseline` is the transform most recently transmitted (or the stored
//!   transform when editing began). `live` is the local view, which includes
//!   increments not yet sent. Inbound deltas from peers shift both by the same
//!   amount, so they never show up in an outgoing delta.
//! - Selection is advisory. Nothing here checks what peers have selected.

#[cfg(test)]
#[path = "edit_test.rs"]
mod edit_test;

use std::fmt;
use std::str::FromStr;

use protocol::{Message, ShapeKind};
use tracing::{debug, warn};

use crate::consts::MAX_ID_ATTEMPTS;
use crate::delta::{compute_delta, has_signal, update_message};
use crate::store::{AnnotationId, AnnotationStore, StoreError};
use crate::transform::Transform;

/// Which triple keyboard and wheel input acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Position,
    Rotation,
    Scale,
}

impl EditMode {
    pub const ALL: [Self; 3] = [Self::Position, Self::Rotation, Self::Scale];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Rotation => "rotation",
            Self::Scale => "scale",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown edit mode: {s}"))
    }
}

/// The annotation currently being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Editing {
    pub id: AnnotationId,
    /// Last transmitted transform.
    pub baseline: Transform,
    /// Local transform including unsent increments.
    pub live: Transform,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing(Editing),
}

/// Local edit state machine. Every transition returns the frames to send, in order.
#[derive(Debug, Default)]
pub struct EditSession {
    state: EditState,
    mode: EditMode,
}

impl EditSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &EditState {
        &self.state
    }

    #[must_use]
    pub fn mode(&self) -> EditMode {
        self.mode
    }

    #[must_use]
    pub fn editing(&self) -> Option<&Editing> {
        match &self.state {
            EditState::Idle => None,
            EditState::Editing(editing) => Some(editing),
        }
    }

    #[must_use]
    pub fn editing_id(&self) -> Option<&str> {
        self.editing().map(|editing| editing.id.as_str())
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing(_))
    }

    // --- Local transitions ---

    /// Begin editing `id`. Absent targets are ignored.
    pub fn start_edit(&mut self, store: &AnnotationStore, id: &str) -> Vec<Message> {
        let Some(annotation) = store.get(id) else {
            debug!(annotation_id = %id, "edit: start_edit on missing annotation ignored");
            return Vec::new();
        };
        let transform = annotation.transform;
        let mut out = self.release_other(id);
        self.state = EditState::Editing(Editing { id: id.to_owned(), baseline: transform, live: transform });
        out.push(Message::Select { annotation_id: id.to_owned() });
        out
    }

    /// Create a new annotation at the identity transform and start editing it.
    ///
    /// `next_id` is called until it yields an id not already in the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if every generated id collided.
    pub fn create(
        &mut self,
        store: &mut AnnotationStore,
        kind: ShapeKind,
        mut next_id: impl FnMut() -> AnnotationId,
    ) -> Result<Vec<Message>, StoreError> {
        let mut id = next_id();
        for _ in 1..MAX_ID_ATTEMPTS {
            if !store.contains(&id) {
                break;
            }
            id = next_id();
        }
        store.create(&id, kind, Transform::IDENTITY)?;

        let mut out = self.release_other(&id);
        self.state = EditState::Editing(Editing {
            id: id.clone(),
            baseline: Transform::IDENTITY,
            live: Transform::IDENTITY,
        });
        out.push(Message::Create {
            kind,
            annotation_id: id,
            position: Transform::IDENTITY.position,
            rotation: Transform::IDENTITY.rotation,
            scale: Transform::IDENTITY.scale,
        });
        Ok(out)
    }

    /// Switch which triple input acts on. Never emits.
    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode;
    }

    /// Stop editing, announcing the release.
    pub fn escape(&mut self) -> Vec<Message> {
        match std::mem::take(&mut self.state) {
            EditState::Idle => Vec::new(),
            EditState::Editing(editing) => vec![Message::Deselect { annotation_id: editing.id }],
        }
    }

    /// Delete `id` locally and announce it. Deleting the edited annotation
    /// releases it first.
    pub fn delete(&mut self, store: &mut AnnotationStore, id: &str) -> Vec<Message> {
        let mut out = Vec::new();
        if self.editing_id() == Some(id) {
            out.extend(self.escape());
        }
        store.remove(id);
        out.push(Message::Delete { annotation_id: id.to_owned() });
        out
    }

    /// Apply a local input increment to the edited annotation and run the send
    /// path. Returns an `update` frame when the live transform has drifted from
    /// the baseline, and advances the baseline to match.
    pub fn apply_local(&mut self, store: &mut AnnotationStore, step: impl FnOnce(&mut Transform)) -> Vec<Message> {
        let EditState::Editing(editing) = &mut self.state else {
            return Vec::new();
        };
        let before = editing.live;
        step(&mut editing.live);
        let increment = editing.live - before;
        if !store.apply_delta(&editing.id, &increment) {
            warn!(annotation_id = %editing.id, "edit: edited annotation missing from store");
        }

        let delta = compute_delta(&editing.live, &editing.baseline);
        if !has_signal(&delta) {
            return Vec::new();
        }
        editing.baseline = editing.live;
        vec![update_message(&editing.id, &delta)]
    }

    // --- Remote effects ---

    /// A peer deleted `id`. Drops back to `Idle` without emitting if it was ours.
    pub fn on_remote_removed(&mut self, id: &str) {
        if self.editing_id() == Some(id) {
            debug!(annotation_id = %id, "edit: edited annotation deleted remotely");
            self.state = EditState::Idle;
        }
    }

    /// A peer re-created `id` with an absolute transform. Resets our view of it.
    pub fn on_remote_absolute(&mut self, id: &str, transform: Transform) {
        if let EditState::Editing(editing) = &mut self.state {
            if editing.id == id {
                editing.baseline = transform;
                editing.live = transform;
            }
        }
    }

    /// A peer sent a delta for `id`. Shifts live and baseline together so the
    /// live view tracks the store and the peer's delta is never re-sent.
    pub fn on_remote_delta(&mut self, id: &str, delta: &Transform) {
        if let EditState::Editing(editing) = &mut self.state {
            if editing.id == id {
                editing.live = editing.live + *delta;
                editing.baseline = editing.baseline + *delta;
            }
        }
    }

    fn release_other(&mut self, next: &str) -> Vec<Message> {
        let switching = self.editing_id().is_some_and(|prev| prev != next);
        if switching { self.escape() } else { Vec::new() }
    }
}
