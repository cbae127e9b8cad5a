//! Annotation model and the in-memory store that owns every live annotation.
//!
//! Each client holds one `AnnotationStore`. It is written by the local edit
//! session (creates, deletes, input increments) and by inbound frames from
//! room peers (absolute creates, additive updates, deletes). The store never
//! validates who may edit what; advisory selection lives in the engine.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;

use protocol::{Message, ShapeKind};
use serde::Serialize;

use crate::transform::Transform;

/// Annotation identifiers are opaque strings chosen by the creating client.
pub type AnnotationId = String;

/// One marker placed in the shared scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: ShapeKind,
    pub transform: Transform,
}

impl Annotation {
    /// The absolute `create` frame announcing this annotation.
    #[must_use]
    pub fn create_message(&self) -> Message {
        Message::Create {
            kind: self.kind,
            annotation_id: self.id.clone(),
            position: self.transform.position,
            rotation: self.transform.rotation,
            scale: self.transform.scale,
        }
    }
}

/// Error returned by store mutations that refuse to overwrite.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("annotation {0} already exists")]
    DuplicateId(AnnotationId),
}

/// Runtime store keyed by annotation id.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    annotations: HashMap<AnnotationId, Annotation>,
}

impl AnnotationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { annotations: HashMap::new() }
    }

    /// Insert a new annotation. Never overwrites.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if `id` is already present.
    pub fn create(&mut self, id: &str, kind: ShapeKind, transform: Transform) -> Result<(), StoreError> {
        if self.annotations.contains_key(id) {
            return Err(StoreError::DuplicateId(id.to_owned()));
        }
        self.annotations
            .insert(id.to_owned(), Annotation { id: id.to_owned(), kind, transform });
        Ok(())
    }

    /// Insert or replace an annotation with an absolute transform.
    pub fn apply_absolute(&mut self, id: &str, kind: ShapeKind, transform: Transform) {
        self.annotations
            .insert(id.to_owned(), Annotation { id: id.to_owned(), kind, transform });
    }

    /// Add `delta` onto the stored transform. Returns false if `id` doesn't exist.
    pub fn apply_delta(&mut self, id: &str, delta: &Transform) -> bool {
        let Some(annotation) = self.annotations.get_mut(id) else {
            return false;
        };
        annotation.transform = annotation.transform + *delta;
        true
    }

    /// Remove an annotation by id, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<Annotation> {
        self.annotations.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.annotations.contains_key(id)
    }

    /// All annotations, sorted by id.
    #[must_use]
    pub fn list(&self) -> Vec<&Annotation> {
        let mut all: Vec<&Annotation> = self.annotations.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
