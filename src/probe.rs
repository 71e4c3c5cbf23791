//! The two geometric tests that find a snap candidate, and the break test
//! that lets go of one.

use crate::constants::DIRECTION_EPSILON;
use crate::geometry::{look_rotation, ray_horizontal_plane, Ray};
use crate::scene::{NodeId, SnapScene};
use crate::session::{SnapMode, SnapSession};
use glam::{Mat3, Quat, Vec3};

/// Inputs for a raycast against scene geometry.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceProbe {
    pub ray: Ray,
    /// Object-space offset from the pivot to the point that should touch the
    /// surface.
    pub bounds_offset: Vec3,
    pub target_rotation: Quat,
    pub rotation_offset: Quat,
    pub up_vector: Vec3,
    /// Maintenance threshold; acquisition uses `snap_distance_scale` of it.
    pub raycast_distance: f32,
    pub max_ray_dot: f32,
    pub snap_distance_scale: f32,
    /// Leave orientation at `target_rotation`.
    pub constrained: bool,
}

/// Inputs for an intersection with the implicit ground plane.
#[derive(Clone, Copy, Debug)]
pub struct GroundProbe {
    pub ray: Ray,
    pub target_rotation: Quat,
    pub raycast_distance: f32,
    pub bounds_offset: Vec3,
    pub ground_height: f32,
    pub constrained: bool,
}

pub fn snap_to_surface<S: SnapScene + ?Sized>(
    scene: &S,
    ignore: &[NodeId],
    session: &mut SnapSession,
    probe: &SurfaceProbe,
    position: &mut Vec3,
    rotation: &mut Quat,
) -> bool {
    if probe.ray.is_degenerate() {
        return false;
    }
    let Some(hit) = scene.raycast(&probe.ray, probe.raycast_distance, ignore) else {
        return false;
    };
    let normal = hit.normal.normalize_or_zero();
    let dot = probe.ray.direction.dot(normal);
    if dot >= probe.max_ray_dot {
        log::trace!("[snap] surface rejected: ray dot {:.3}", dot);
        return false;
    }
    let limit = if session.surface_snapping() {
        probe.raycast_distance
    } else {
        probe.raycast_distance * probe.snap_distance_scale
    };
    if hit.distance > limit {
        log::trace!(
            "[snap] surface rejected: distance {:.3} > {:.3}",
            hit.distance,
            limit
        );
        return false;
    }

    let snapped_rotation = if probe.constrained {
        probe.target_rotation
    } else {
        look_rotation(normal, probe.up_vector) * probe.rotation_offset
    };
    let snapped_position = hit.point - snapped_rotation * probe.bounds_offset;
    session.accept(
        SnapMode::Surface,
        snapped_position,
        snapped_rotation,
        normal,
        hit.point,
    );
    *position = snapped_position;
    *rotation = snapped_rotation;
    true
}

pub fn snap_to_ground(
    session: &mut SnapSession,
    probe: &GroundProbe,
    position: &mut Vec3,
    rotation: &mut Quat,
) -> bool {
    let Some(distance) = ray_horizontal_plane(&probe.ray, probe.ground_height) else {
        log::trace!("[snap] ground rejected: ray parallel to or leaving the plane");
        return false;
    };
    if distance > probe.raycast_distance {
        log::trace!(
            "[snap] ground rejected: distance {:.3} > {:.3}",
            distance,
            probe.raycast_distance
        );
        return false;
    }
    let normal = Vec3::new(0.0, -probe.ray.direction.y, 0.0).normalize();
    // A grounded object pushed through the plane must not flip to its far side.
    if session.ground_snapping() && normal.dot(session.snapping_normal()) < 0.0 {
        log::trace!("[snap] ground rejected: hit from the far side of the plane");
        return false;
    }
    let hit_point = probe.ray.at(distance);
    let snapped_rotation = if probe.constrained {
        probe.target_rotation
    } else {
        upright_rotation(probe.target_rotation, normal)
    };
    let snapped_position = hit_point - snapped_rotation * probe.bounds_offset;
    session.accept(
        SnapMode::Ground,
        snapped_position,
        snapped_rotation,
        normal,
        hit_point,
    );
    *position = snapped_position;
    *rotation = snapped_rotation;
    true
}

/// Rotation standing on a horizontal plane with local +Y along `up`, keeping
/// the heading of `rotation`'s backward (-Z) axis.
pub fn upright_rotation(rotation: Quat, up: Vec3) -> Quat {
    let flatten = |v: Vec3| {
        let flat = Vec3::new(v.x, 0.0, v.z);
        if flat.length_squared() < DIRECTION_EPSILON {
            Vec3::ZERO
        } else {
            flat.normalize()
        }
    };
    let mut heading = flatten(rotation * Vec3::NEG_Z);
    if heading == Vec3::ZERO {
        // Facing straight up or down: take the heading from the top instead.
        heading = flatten(rotation * Vec3::Y * up.y.signum());
    }
    if heading == Vec3::ZERO {
        heading = Vec3::NEG_Z;
    }
    let z_axis = -heading;
    let x_axis = up.cross(z_axis).normalize();
    Quat::from_mat3(&Mat3::from_cols(x_axis, up, z_axis)).normalize()
}

/// Break distance for the free path: larger when the target sits behind the
/// surface, i.e. the motion opposes the stored normal.
pub fn normal_break_distance(
    session: &SnapSession,
    position: Vec3,
    target_position: Vec3,
    break_distance: f32,
    blocked_break_scale: f32,
) -> f32 {
    if (target_position - position).dot(session.snapping_normal()) < 0.0 {
        break_distance * blocked_break_scale
    } else {
        break_distance
    }
}

/// Release the snap once the unconstrained target has drifted more than
/// `break_distance` from the snapped position. Returns true if released.
pub fn try_break_snap(
    session: &mut SnapSession,
    position: &mut Vec3,
    rotation: &mut Quat,
    target_position: Vec3,
    target_rotation: Quat,
    break_distance: f32,
) -> bool {
    if !session.is_snapping() {
        return false;
    }
    if position.distance(target_position) <= break_distance {
        return false;
    }
    session.release();
    *position = target_position;
    *rotation = target_rotation;
    true
}
