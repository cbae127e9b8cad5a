//! Input model: held keys, modifier state, and the per-mode axis mapping.
//!
//! Keys are tracked by lowercase name so that a shifted `D` and a plain `d`
//! refer to the same held key. The modifier flag is refreshed from every key
//! event, matching how browsers report `shiftKey` alongside the key itself.
//! Movement is applied by the engine, either once per tick for every held
//! direction key or once per accepted wheel event.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::HashSet;

use crate::consts::{ROTATION_STEP_FACTOR, SCALE_FLOOR, WHEEL_FACTOR_LINEAR, WHEEL_FACTOR_ROTATION};
use crate::edit::EditMode;
use crate::transform::Transform;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held. Gates all tick and wheel movement.
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { shift: false };
    pub const SHIFT: Self = Self { shift: true };
}

/// A keyboard key as reported by the host (e.g. `"w"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Lowercased key name used for held-key tracking.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0.eq_ignore_ascii_case("escape")
    }

    /// Direction key this maps to, if any.
    #[must_use]
    pub fn move_key(&self) -> Option<MoveKey> {
        MoveKey::from_name(&self.0)
    }
}

/// The four direction keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    W,
    A,
    S,
    D,
}

impl MoveKey {
    /// Tick evaluation order.
    pub const ALL: [Self; 4] = [Self::W, Self::A, Self::S, Self::D];

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "w" => Some(Self::W),
            "a" => Some(Self::A),
            "s" => Some(Self::S),
            "d" => Some(Self::D),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::W => "w",
            Self::A => "a",
            Self::S => "s",
            Self::D => "d",
        }
    }
}

/// Whether the host should suppress its default handling of a wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelOutcome {
    /// Wheel was applied to the edited annotation; don't scroll.
    Consumed,
    /// Wheel was not for us.
    Ignored,
}

/// Held keys and the modifier flag, as of the last key event.
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    held: HashSet<String>,
    modifier: bool,
}

impl KeyState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: &Key, modifiers: Modifiers) {
        self.held.insert(key.normalized());
        self.modifier = modifiers.shift;
    }

    pub fn key_up(&mut self, key: &Key, modifiers: Modifiers) {
        self.held.remove(&key.normalized());
        self.modifier = modifiers.shift;
    }

    #[must_use]
    pub fn is_held(&self, key: MoveKey) -> bool {
        self.held.contains(key.name())
    }

    #[must_use]
    pub fn modifier_held(&self) -> bool {
        self.modifier
    }

    /// Held direction keys in tick order (W, A, S, D).
    #[must_use]
    pub fn held_moves(&self) -> Vec<MoveKey> {
        MoveKey::ALL.into_iter().filter(|key| self.is_held(*key)).collect()
    }

    /// Forget every held key, e.g. when the host loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
        self.modifier = false;
    }
}

/// Apply one direction-key step to `transform` in `mode`.
pub fn apply_move(transform: &mut Transform, mode: EditMode, key: MoveKey, sensitivity: f64) {
    let step = match mode {
        EditMode::Position | EditMode::Scale => sensitivity,
        EditMode::Rotation => sensitivity * ROTATION_STEP_FACTOR,
    };
    let triple = transform.triple_mut(mode);
    match (mode, key) {
        (EditMode::Rotation, MoveKey::W) => triple.x += step,
        (EditMode::Rotation, MoveKey::S) => triple.x -= step,
        (EditMode::Rotation, MoveKey::A) => triple.y -= step,
        (EditMode::Rotation, MoveKey::D) => triple.y += step,
        (_, MoveKey::W) => triple.y += step,
        (_, MoveKey::S) => triple.y -= step,
        (_, MoveKey::A) => triple.x -= step,
        (_, MoveKey::D) => triple.x += step,
    }
}

/// Apply one wheel step along z in `mode`. Scale z is clamped to [`SCALE_FLOOR`].
pub fn apply_wheel(transform: &mut Transform, mode: EditMode, wheel_delta: f64) {
    match mode {
        EditMode::Position => transform.position.z += wheel_delta * WHEEL_FACTOR_LINEAR,
        EditMode::Rotation => transform.rotation.z += wheel_delta * WHEEL_FACTOR_ROTATION,
        EditMode::Scale => {
            transform.scale.z = (transform.scale.z + wheel_delta * WHEEL_FACTOR_LINEAR).max(SCALE_FLOOR);
        }
    }
}
