// Shared fixture: a static scene of axis-aligned boxes plus dragged objects.

#![allow(dead_code)]

use glam::{Quat, Vec3};
use surface_snap::geometry::ray_aabb;
use surface_snap::{
    Aabb, IgnoreList, NodeId, Pointer, PointerId, Pose, Ray, RaycastHit, SnapContext, SnapScene,
};

pub const CUBE: NodeId = NodeId(1);
pub const CUBE_RENDERER: NodeId = NodeId(2);
pub const HAND: PointerId = PointerId(0);
pub const OTHER_HAND: PointerId = PointerId(1);

// Chosen so the break distance sits well clear of the 0.1 drag steps.
pub const CAMERA: Vec3 = Vec3::new(0.0, 0.5, 6.25);

pub struct Object {
    pub id: NodeId,
    pub pose: Pose,
    pub bounds: Aabb,
    pub surfaces: Vec<NodeId>,
}

#[derive(Default)]
pub struct BoxScene {
    pub boxes: Vec<(NodeId, Aabb)>,
    pub objects: Vec<Object>,
}

impl BoxScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_box(mut self, id: u64, min: Vec3, max: Vec3) -> Self {
        self.boxes.push((NodeId(id), Aabb::new(min, max)));
        self
    }

    /// Unit cube (half extent 0.5) whose renderer is also a raycast target.
    pub fn with_cube(mut self, position: Vec3, rotation: Quat) -> Self {
        self.objects.push(Object {
            id: CUBE,
            pose: Pose::new(position, rotation),
            bounds: Aabb::from_center_extents(Vec3::ZERO, Vec3::splat(0.5)),
            surfaces: vec![CUBE, CUBE_RENDERER],
        });
        self.boxes.push((
            CUBE_RENDERER,
            Aabb::from_center_extents(position, Vec3::splat(0.5)),
        ));
        self
    }
}

impl SnapScene for BoxScene {
    fn raycast(&self, ray: &Ray, max_distance: f32, ignore: &[NodeId]) -> Option<RaycastHit> {
        self.boxes
            .iter()
            .filter(|(id, _)| !ignore.contains(id))
            .filter_map(|(id, aabb)| {
                let (distance, normal) = ray_aabb(ray, aabb)?;
                (distance <= max_distance).then_some(RaycastHit {
                    point: ray.at(distance),
                    normal,
                    distance,
                    node: *id,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn pose(&self, node: NodeId) -> Option<Pose> {
        self.objects.iter().find(|o| o.id == node).map(|o| o.pose)
    }

    fn local_bounds(&self, node: NodeId) -> Option<Aabb> {
        self.objects.iter().find(|o| o.id == node).map(|o| o.bounds)
    }

    fn collect_surfaces(&self, node: NodeId, out: &mut IgnoreList) {
        match self.objects.iter().find(|o| o.id == node) {
            Some(o) => out.extend_from_slice(&o.surfaces),
            None => out.push(node),
        }
    }
}

pub fn ctx(scene: &BoxScene) -> SnapContext<'_, BoxScene> {
    SnapContext::new(scene, CAMERA, 1.0)
}

/// A pointer looking straight down from above the origin.
pub fn pointer() -> Pointer {
    Pointer::new(HAND, Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y)
}

pub fn approx_vec(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, 1e-4)
}

/// Same orientation up to the quaternion double cover.
pub fn approx_quat(a: Quat, b: Quat) -> bool {
    a.dot(b).abs() > 1.0 - 1e-5
}
