//! The six cardinal probe directions.
//!
//! Each entry names a face of the object's bounds. A surface found along
//! `probe_direction` is rested against that face: the snapped rotation is
//! `look_rotation(normal, rotation * up_vector) * rotation_offset`, which turns
//! the face to point into the surface while keeping the object's heading.

use glam::{Quat, Vec3};
use std::f32::consts::FRAC_1_SQRT_2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionDescriptor {
    pub probe_direction: Vec3,
    pub up_vector: Vec3,
    /// Maps `probe_direction` onto local -Z, the axis a look rotation aims
    /// away from the surface normal.
    pub rotation_offset: Quat,
}

pub const DOWN: usize = 0;
pub const LEFT: usize = 1;
pub const BACK: usize = 2;
pub const RIGHT: usize = 3;
pub const FORWARD: usize = 4;
pub const UP: usize = 5;

/// Search order: down, left, back, right, forward, up.
pub const DIRECTIONS: [DirectionDescriptor; 6] = [
    DirectionDescriptor {
        probe_direction: Vec3::NEG_Y,
        up_vector: Vec3::NEG_Z,
        rotation_offset: Quat::from_xyzw(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2),
    },
    DirectionDescriptor {
        probe_direction: Vec3::NEG_X,
        up_vector: Vec3::Y,
        rotation_offset: Quat::from_xyzw(0.0, -FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
    },
    DirectionDescriptor {
        probe_direction: Vec3::NEG_Z,
        up_vector: Vec3::Y,
        rotation_offset: Quat::IDENTITY,
    },
    DirectionDescriptor {
        probe_direction: Vec3::X,
        up_vector: Vec3::Y,
        rotation_offset: Quat::from_xyzw(0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
    },
    DirectionDescriptor {
        probe_direction: Vec3::Z,
        up_vector: Vec3::Y,
        rotation_offset: Quat::from_xyzw(0.0, 1.0, 0.0, 0.0),
    },
    DirectionDescriptor {
        probe_direction: Vec3::Y,
        up_vector: Vec3::Z,
        rotation_offset: Quat::from_xyzw(-FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2),
    },
];
