//! Engine: the single entry point through which every mutation flows.
//!
//! The host feeds local actions (create, start edit, delete), raw input (key,
//! wheel, tick, nudge) and decoded inbound frames into the engine. Local
//! operations return the [`Message`]s to send, in order; inbound frames return
//! nothing and only reconcile local state.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashSet;

use protocol::{Inbound, Message, Notice, ShapeKind};
use tracing::debug;

use crate::consts::{SENSITIVITY_DEFAULT, SENSITIVITY_MAX, SENSITIVITY_MIN};
use crate::delta;
use crate::edit::{EditMode, EditSession};
use crate::ids;
use crate::input::{self, Key, KeyState, Modifiers, MoveKey, WheelOutcome};
use crate::store::{Annotation, AnnotationId, AnnotationStore, StoreError};
use crate::transform::Transform;

/// Result of a wheel event.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelResult {
    pub outcome: WheelOutcome,
    pub messages: Vec<Message>,
}

/// Client-side annotation state for one room.
#[derive(Debug)]
pub struct Engine {
    store: AnnotationStore,
    edit: EditSession,
    keys: KeyState,
    sensitivity: f64,
    remote_selected: HashSet<AnnotationId>,
    shared_files: Vec<Notice>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            store: AnnotationStore::new(),
            edit: EditSession::new(),
            keys: KeyState::new(),
            sensitivity: SENSITIVITY_DEFAULT,
            remote_selected: HashSet::new(),
            shared_files: Vec::new(),
        }
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Local actions ---

    /// Create a new annotation with a random id and start editing it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if no unused id could be generated.
    pub fn create(&mut self, kind: ShapeKind) -> Result<Vec<Message>, StoreError> {
        self.create_with_ids(kind, ids::annotation_id)
    }

    /// [`Engine::create`] with a caller-supplied id source.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if every id from `next_id` collided.
    pub fn create_with_ids(
        &mut self,
        kind: ShapeKind,
        next_id: impl FnMut() -> AnnotationId,
    ) -> Result<Vec<Message>, StoreError> {
        self.edit.create(&mut self.store, kind, next_id)
    }

    pub fn start_edit(&mut self, id: &str) -> Vec<Message> {
        self.edit.start_edit(&self.store, id)
    }

    pub fn escape(&mut self) -> Vec<Message> {
        self.edit.escape()
    }

    pub fn delete(&mut self, id: &str) -> Vec<Message> {
        self.remote_selected.remove(id);
        self.edit.delete(&mut self.store, id)
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.edit.set_mode(mode);
    }

    /// Set the per-step sensitivity, clamped to the slider range.
    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.sensitivity = if sensitivity.is_nan() {
            SENSITIVITY_DEFAULT
        } else {
            sensitivity.clamp(SENSITIVITY_MIN, SENSITIVITY_MAX)
        };
    }

    // --- Input ---

    /// Key pressed. Escape releases the current edit.
    pub fn key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Message> {
        if key.is_escape() {
            return self.escape();
        }
        self.keys.key_down(key, modifiers);
        Vec::new()
    }

    pub fn key_up(&mut self, key: &Key, modifiers: Modifiers) {
        self.keys.key_up(key, modifiers);
    }

    /// Wheel moved. Accepted only while editing with the modifier held.
    /// Non-finite deltas are ignored and leave the transform untouched.
    pub fn wheel(&mut self, wheel_delta: f64, modifiers: Modifiers) -> WheelResult {
        if !self.edit.is_editing() || !modifiers.shift || !wheel_delta.is_finite() {
            return WheelResult { outcome: WheelOutcome::Ignored, messages: Vec::new() };
        }
        let mode = self.edit.mode();
        let messages = self
            .edit
            .apply_local(&mut self.store, |t| input::apply_wheel(t, mode, wheel_delta));
        WheelResult { outcome: WheelOutcome::Consumed, messages }
    }

    /// Scheduler period elapsed. Each held direction key moves once.
    pub fn tick(&mut self) -> Vec<Message> {
        if !self.edit.is_editing() || !self.keys.modifier_held() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for key in self.keys.held_moves() {
            out.extend(self.step(key));
        }
        out
    }

    /// One move from an on-screen direction button. No modifier required.
    pub fn nudge(&mut self, key: MoveKey) -> Vec<Message> {
        self.step(key)
    }

    /// Forget held keys, e.g. on focus loss.
    pub fn clear_keys(&mut self) {
        self.keys.clear();
    }

    fn step(&mut self, key: MoveKey) -> Vec<Message> {
        let mode = self.edit.mode();
        let sensitivity = self.sensitivity;
        self.edit
            .apply_local(&mut self.store, |t| input::apply_move(t, mode, key, sensitivity))
    }

    // --- Inbound ---

    /// Reconcile one decoded inbound frame into local state.
    pub fn apply_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Annotation(msg) => self.apply_remote(msg),
            Inbound::Notice(notice) => self.shared_files.push(notice),
        }
    }

    fn apply_remote(&mut self, msg: Message) {
        match msg {
            Message::Create { kind, annotation_id, position, rotation, scale } => {
                let transform = Transform::new(position, rotation, scale);
                self.store.apply_absolute(&annotation_id, kind, transform);
                self.edit.on_remote_absolute(&annotation_id, transform);
            }
            Message::Update { annotation_id, position, rotation, scale } => {
                let delta = Transform::new(position, rotation, scale);
                if delta::apply_inbound(&mut self.store, &annotation_id, &delta) {
                    self.edit.on_remote_delta(&annotation_id, &delta);
                }
            }
            Message::Delete { annotation_id } => {
                self.store.remove(&annotation_id);
                self.remote_selected.remove(&annotation_id);
                self.edit.on_remote_removed(&annotation_id);
            }
            Message::Select { annotation_id } => {
                debug!(annotation_id = %annotation_id, "engine: peer selected annotation");
                self.remote_selected.insert(annotation_id);
            }
            Message::Deselect { annotation_id } => {
                self.remote_selected.remove(&annotation_id);
            }
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    #[must_use]
    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.store.get(id)
    }

    #[must_use]
    pub fn editing_id(&self) -> Option<&str> {
        self.edit.editing_id()
    }

    #[must_use]
    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    #[must_use]
    pub fn mode(&self) -> EditMode {
        self.edit.mode()
    }

    #[must_use]
    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Whether a peer has announced it is editing `id`. Advisory only.
    #[must_use]
    pub fn is_remotely_selected(&self, id: &str) -> bool {
        self.remote_selected.contains(id)
    }

    /// Files announced in this room, in arrival order.
    #[must_use]
    pub fn shared_files(&self) -> &[Notice] {
        &self.shared_files
    }

    /// Record a file this client shared itself. Peers receive the notice over
    /// the channel; the sender never sees its own frame echoed.
    pub fn record_shared_file(&mut self, notice: Notice) {
        self.shared_files.push(notice);
    }
}
