//! Rays, boxes and the handful of intersection tests the probes need.

use crate::constants::DIRECTION_EPSILON;
use glam::{Mat3, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length, or zero for a degenerate ray.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.direction.length_squared() < DIRECTION_EPSILON
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Position, rotation and scale of a scene node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * local)
    }
}

/// Axis-aligned box stored as min/max corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        let extents = extents.abs();
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size along each axis.
    #[inline]
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Distance from the center to the box surface along `direction`, measured
    /// as the support of the box in that direction.
    #[inline]
    pub fn extent_along(&self, direction: Vec3) -> f32 {
        direction.abs().dot(self.extents())
    }

    /// Offset from the box's frame origin to the middle of the face that
    /// `direction` points out of.
    #[inline]
    pub fn face_offset(&self, direction: Vec3) -> Vec3 {
        self.center() + direction * self.extent_along(direction)
    }
}

/// Distance along `ray` to the horizontal plane at `height`.
///
/// Rays running parallel to the plane are rejected rather than divided by a
/// near-zero vertical component.
pub fn ray_horizontal_plane(ray: &Ray, height: f32) -> Option<f32> {
    if ray.is_degenerate() || ray.direction.dot(Vec3::Y).abs() < DIRECTION_EPSILON {
        return None;
    }
    let t = (height - ray.origin.y) / ray.direction.y;
    (t >= 0.0).then_some(t)
}

/// Slab test against an axis-aligned box. Returns the entry distance and the
/// outward normal of the entry face. Rays starting inside the box miss.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<(f32, Vec3)> {
    if ray.is_degenerate() {
        return None;
    }
    let mut t_min = 0.0_f32;
    let mut t_max = f32::INFINITY;
    let mut normal = Vec3::ZERO;
    for axis in 0..3 {
        let o = ray.origin[axis];
        let d = ray.direction[axis];
        if d.abs() < DIRECTION_EPSILON {
            if o < aabb.min[axis] || o > aabb.max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (aabb.min[axis] - o) * inv;
        let mut t1 = (aabb.max[axis] - o) * inv;
        let mut sign = -1.0;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            sign = 1.0;
        }
        if t0 > t_min {
            t_min = t0;
            normal = Vec3::ZERO;
            normal[axis] = sign;
        }
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    if normal == Vec3::ZERO {
        return None;
    }
    Some((t_min, normal))
}

/// Rotation whose local +Z points along `forward` and whose local +Y is as
/// close to `up` as possible. Falls back to an arbitrary perpendicular up
/// when the two are parallel.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let f = forward.normalize_or_zero();
    if f == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = up.cross(f);
    if right.length_squared() < DIRECTION_EPSILON {
        right = f.any_orthonormal_vector().cross(f);
    }
    let right = right.normalize();
    let up = f.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, f)).normalize()
}
