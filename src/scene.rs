//! Services the engine consumes from its host.
//!
//! The scene owns geometry, node transforms and raycasting; the engine only
//! asks questions through [`SnapScene`]. Camera position and viewer scale
//! arrive in a [`SnapContext`] with every call.

use crate::geometry::{Aabb, Pose, Ray};
use glam::Vec3;
use smallvec::SmallVec;

/// Opaque identity of a scene node (object, renderer or collider).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Identity of a pointer or ray source (a hand, a mouse, a controller).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u32);

/// Host-owned visualization node attached to a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WidgetId(pub u64);

/// Scratch buffer of nodes the raycast must skip.
pub type IgnoreList = SmallVec<[NodeId; 16]>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub node: NodeId,
}

pub trait SnapScene {
    /// Closest hit within `max_distance`, skipping anything in `ignore`.
    /// Must not mutate the scene.
    fn raycast(&self, ray: &Ray, max_distance: f32, ignore: &[NodeId]) -> Option<RaycastHit>;

    fn pose(&self, node: NodeId) -> Option<Pose>;

    /// Bounds in the node's own (unrotated, unscaled) space.
    fn local_bounds(&self, node: NodeId) -> Option<Aabb>;

    /// Append every renderable surface that belongs to `node`.
    fn collect_surfaces(&self, node: NodeId, out: &mut IgnoreList) {
        out.push(node);
    }
}

/// Per-call view of the host: scene services plus the camera and viewer scale.
pub struct SnapContext<'a, S: SnapScene + ?Sized> {
    pub scene: &'a S,
    pub camera_position: Vec3,
    pub viewer_scale: f32,
    /// Nodes the host always wants skipped (gizmos, the user's own avatar...).
    pub ignore: &'a [NodeId],
}

impl<'a, S: SnapScene + ?Sized> SnapContext<'a, S> {
    pub fn new(scene: &'a S, camera_position: Vec3, viewer_scale: f32) -> Self {
        Self {
            scene,
            camera_position,
            viewer_scale,
            ignore: &[],
        }
    }

    pub fn with_ignore(mut self, ignore: &'a [NodeId]) -> Self {
        self.ignore = ignore;
        self
    }
}

/// A pointer and its live forward ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub id: PointerId,
    pub ray: Ray,
}

impl Pointer {
    pub fn new(id: PointerId, origin: Vec3, forward: Vec3) -> Self {
        Self {
            id,
            ray: Ray::new(origin, forward),
        }
    }
}
