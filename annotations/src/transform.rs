//! Position, rotation, and scale of one annotation.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use std::ops::{Add, Sub};

use protocol::Vec3;
use serde::{Deserialize, Serialize};

use crate::edit::EditMode;

/// Full transform. Each triple is independent; arithmetic is componentwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Zero position, zero rotation, unit scale.
    pub const IDENTITY: Self = Self { position: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ONE };

    /// All nine components zero. The neutral delta.
    pub const ZERO: Self = Self { position: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ZERO };

    #[must_use]
    pub const fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// The triple an edit mode acts on.
    #[must_use]
    pub fn triple(&self, mode: EditMode) -> Vec3 {
        match mode {
            EditMode::Position => self.position,
            EditMode::Rotation => self.rotation,
            EditMode::Scale => self.scale,
        }
    }

    /// Mutable access to the triple an edit mode acts on.
    pub fn triple_mut(&mut self, mode: EditMode) -> &mut Vec3 {
        match mode {
            EditMode::Position => &mut self.position,
            EditMode::Rotation => &mut self.rotation,
            EditMode::Scale => &mut self.scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Add for Transform {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            position: self.position + rhs.position,
            rotation: self.rotation + rhs.rotation,
            scale: self.scale + rhs.scale,
        }
    }
}

impl Sub for Transform {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            position: self.position - rhs.position,
            rotation: self.rotation - rhs.rotation,
            scale: self.scale - rhs.scale,
        }
    }
}
