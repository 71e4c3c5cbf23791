//! Snapping preferences and tuning values.
//!
//! The preference flags are owned by whatever UI toggles them; the engine only
//! receives them as a plain value.

use crate::constants::*;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },
    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("snap_distance_scale must be in (0, 1], got {0}")]
    SnapDistanceScale(f32),
    #[error("blocked_break_scale must be at least 1, got {0}")]
    BlockedBreakScale(f32),
    #[error("max_ray_dot must be in [-1, 0), got {0}")]
    MaxRayDot(f32),
}

/// Numeric thresholds that shape the snap. Defaults come from [`crate::constants`].
#[derive(Clone, Debug, PartialEq)]
pub struct SnapTuning {
    pub break_distance: f32,
    pub snap_distance_scale: f32,
    pub blocked_break_scale: f32,
    pub max_ray_dot: f32,
    pub ground_height: f32,
    pub ground_max_ray_length: f32,
    pub surface_max_ray_length: f32,
}

impl Default for SnapTuning {
    fn default() -> Self {
        Self {
            break_distance: BREAK_DISTANCE,
            snap_distance_scale: SNAP_DISTANCE_SCALE,
            blocked_break_scale: BLOCKED_BREAK_SCALE,
            max_ray_dot: MAX_RAY_DOT,
            ground_height: GROUND_HEIGHT,
            ground_max_ray_length: GROUND_SNAPPING_MAX_RAY_LENGTH,
            surface_max_ray_length: SURFACE_SNAPPING_MAX_RAY_LENGTH,
        }
    }
}

impl SnapTuning {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let fields = [
            ("break_distance", self.break_distance),
            ("snap_distance_scale", self.snap_distance_scale),
            ("blocked_break_scale", self.blocked_break_scale),
            ("max_ray_dot", self.max_ray_dot),
            ("ground_height", self.ground_height),
            ("ground_max_ray_length", self.ground_max_ray_length),
            ("surface_max_ray_length", self.surface_max_ray_length),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(SettingsError::NotFinite { field, value });
            }
        }
        for (field, value) in [
            ("break_distance", self.break_distance),
            ("ground_max_ray_length", self.ground_max_ray_length),
            ("surface_max_ray_length", self.surface_max_ray_length),
        ] {
            if value <= 0.0 {
                return Err(SettingsError::NotPositive { field, value });
            }
        }
        if self.snap_distance_scale <= 0.0 || self.snap_distance_scale > 1.0 {
            return Err(SettingsError::SnapDistanceScale(self.snap_distance_scale));
        }
        if self.blocked_break_scale < 1.0 {
            return Err(SettingsError::BlockedBreakScale(self.blocked_break_scale));
        }
        if !(-1.0..0.0).contains(&self.max_ray_dot) {
            return Err(SettingsError::MaxRayDot(self.max_ray_dot));
        }
        Ok(())
    }
}

/// Preference flags passed in by the host tool.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapSettings {
    pub enabled: bool,
    pub ground_snapping: bool,
    pub surface_snapping: bool,
    /// Align orientation with the snapped surface.
    pub rotation_snapping: bool,
    /// Rest the pivot on the surface instead of the bounds face.
    pub pivot_snapping: bool,
    /// Probe from the bounds faces instead of along the pointer ray.
    pub limit_radius: bool,
    pub tuning: SnapTuning,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ground_snapping: true,
            surface_snapping: true,
            rotation_snapping: true,
            pivot_snapping: false,
            limit_radius: true,
            tuning: SnapTuning::default(),
        }
    }
}

impl SnapSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.tuning.validate()
    }

    /// True when at least one probe can fire.
    pub fn any_probe_enabled(&self) -> bool {
        self.enabled && (self.ground_snapping || self.surface_snapping)
    }
}
