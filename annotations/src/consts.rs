//! Shared numeric constants for the annotations crate.

use std::time::Duration;

// ── Input ───────────────────────────────────────────────────────

/// Period of the held-key tick.
pub const TICK_PERIOD: Duration = Duration::from_millis(50);

/// Default per-tick step for position and scale.
pub const SENSITIVITY_DEFAULT: f64 = 0.05;

/// Lower bound of the sensitivity slider.
pub const SENSITIVITY_MIN: f64 = 0.01;

/// Upper bound of the sensitivity slider.
pub const SENSITIVITY_MAX: f64 = 0.2;

/// Rotation steps are this many times the position step.
pub const ROTATION_STEP_FACTOR: f64 = 10.0;

// ── Wheel ───────────────────────────────────────────────────────

/// Wheel delta multiplier for position and scale depth.
pub const WHEEL_FACTOR_LINEAR: f64 = 0.01;

/// Wheel delta multiplier for rotation about z.
pub const WHEEL_FACTOR_ROTATION: f64 = 0.1;

/// Scale z never drops below this after a wheel step.
pub const SCALE_FLOOR: f64 = 0.1;

// ── Delta ───────────────────────────────────────────────────────

/// Components at or below this magnitude do not count as movement.
pub const DELTA_EPSILON: f64 = 1e-6;

// ── Ids ─────────────────────────────────────────────────────────

/// Prefix of every annotation id.
pub const ANNOTATION_ID_PREFIX: &str = "AN-";

/// Random characters after the annotation id prefix.
pub const ANNOTATION_ID_LEN: usize = 4;

/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 5;

/// Fresh ids tried by `create` before giving up.
pub const MAX_ID_ATTEMPTS: usize = 64;
