//! Snapping tuning constants.
//!
//! These values encode the feel of the snap and are the defaults behind
//! [`crate::SnapTuning`].

// Break distance per unit of break scale (camera distance or viewer scale)
pub const BREAK_DISTANCE: f32 = 0.04;

// Acquisition threshold as a fraction of the maintenance threshold
pub const SNAP_DISTANCE_SCALE: f32 = 0.75;

// Break distance multiplier when motion is blocked
pub const BLOCKED_BREAK_SCALE: f32 = 5.0;

// A surface hit only counts if dot(ray, normal) is below this
pub const MAX_RAY_DOT: f32 = -0.5;

// Implicit ground plane
pub const GROUND_HEIGHT: f32 = 0.0;

// Pointer-ray lengths (scaled by viewer scale)
pub const GROUND_SNAPPING_MAX_RAY_LENGTH: f32 = 25.0;
pub const SURFACE_SNAPPING_MAX_RAY_LENGTH: f32 = 100.0;

// Below this, a direction is treated as degenerate
pub const DIRECTION_EPSILON: f32 = 1e-6;
