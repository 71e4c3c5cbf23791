//! Per-drag snapping state and the arena that owns it.

use crate::geometry::{Aabb, Pose};
use crate::scene::{NodeId, PointerId, SnapScene, WidgetId};
use fnv::FnvHashMap;
use glam::{Quat, Vec3};
use slab::Slab;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("no snapping session for {pointer:?} on {object:?}")]
    Missing { pointer: PointerId, object: NodeId },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SnapMode {
    #[default]
    Idle,
    Surface,
    Ground,
}

/// Whether the reference position is the selection's bounds center or the
/// primary object's pivot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PivotMode {
    #[default]
    Center,
    Pivot,
}

/// Sessions are keyed by pointer and primary manipulated object.
pub type SessionKey = (PointerId, NodeId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    index: u32,
    generation: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SnapSession {
    key: SessionKey,
    pub(crate) accumulated_position: Vec3,
    pub(crate) origin: Vec3,
    pub(crate) start_rotation: Quat,
    pub(crate) identity_bounds: Aabb,
    pub(crate) mode: SnapMode,
    pub(crate) snapping_position: Vec3,
    pub(crate) snapping_rotation: Quat,
    pub(crate) snapping_normal: Vec3,
    pub(crate) hit_point: Vec3,
    pub(crate) direction_index: usize,
    pub(crate) widget: Option<WidgetId>,
}

impl SnapSession {
    pub fn new(key: SessionKey, position: Vec3, rotation: Quat, identity_bounds: Aabb) -> Self {
        Self {
            key,
            accumulated_position: position,
            origin: position,
            start_rotation: rotation,
            identity_bounds,
            mode: SnapMode::Idle,
            snapping_position: position,
            snapping_rotation: rotation,
            snapping_normal: Vec3::ZERO,
            hit_point: position,
            direction_index: 0,
            widget: None,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    /// Where the object would be with no snapping at all.
    pub fn accumulated_position(&self) -> Vec3 {
        self.accumulated_position
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn start_rotation(&self) -> Quat {
        self.start_rotation
    }

    pub fn identity_bounds(&self) -> Aabb {
        self.identity_bounds
    }

    pub fn mode(&self) -> SnapMode {
        self.mode
    }

    pub fn ground_snapping(&self) -> bool {
        self.mode == SnapMode::Ground
    }

    pub fn surface_snapping(&self) -> bool {
        self.mode == SnapMode::Surface
    }

    pub fn is_snapping(&self) -> bool {
        self.mode != SnapMode::Idle
    }

    pub fn snapping_position(&self) -> Vec3 {
        self.snapping_position
    }

    pub fn snapping_rotation(&self) -> Quat {
        self.snapping_rotation
    }

    /// Outward normal of whatever the session is resting on.
    pub fn snapping_normal(&self) -> Vec3 {
        self.snapping_normal
    }

    pub fn hit_point(&self) -> Vec3 {
        self.hit_point
    }

    pub fn direction_index(&self) -> usize {
        self.direction_index
    }

    pub fn widget(&self) -> Option<WidgetId> {
        self.widget
    }

    pub(crate) fn accept(
        &mut self,
        mode: SnapMode,
        position: Vec3,
        rotation: Quat,
        normal: Vec3,
        hit_point: Vec3,
    ) {
        // Surface and ground never hand over directly.
        if self.mode != SnapMode::Idle && self.mode != mode {
            self.release();
        }
        if self.mode != mode {
            log::debug!(
                "[snap] {:?}/{:?} {:?} -> {:?} at ({:.3},{:.3},{:.3})",
                self.key.0,
                self.key.1,
                self.mode,
                mode,
                position.x,
                position.y,
                position.z
            );
        }
        self.mode = mode;
        self.snapping_position = position;
        self.snapping_rotation = rotation;
        self.snapping_normal = normal;
        self.hit_point = hit_point;
    }

    pub(crate) fn release(&mut self) {
        log::debug!(
            "[snap] {:?}/{:?} {:?} -> Idle",
            self.key.0,
            self.key.1,
            self.mode
        );
        self.mode = SnapMode::Idle;
    }
}

/// Bounds of `objects` in the frame of (`position`, `rotation`), as if the
/// whole group had been rotated back to identity around `position`.
pub fn identity_bounds<S: SnapScene + ?Sized>(
    scene: &S,
    objects: &[NodeId],
    position: Vec3,
    rotation: Quat,
    pivot_mode: PivotMode,
) -> Aabb {
    let inverse = rotation.inverse();
    let corners = objects.iter().flat_map(|&node| {
        let pose = scene.pose(node).unwrap_or_else(|| Pose::new(position, rotation));
        let local = scene.local_bounds(node).unwrap_or_default();
        local
            .corners()
            .map(|c| inverse * (pose.transform_point(c) - position))
    });
    let bounds = Aabb::from_points(corners).unwrap_or_default();
    match pivot_mode {
        PivotMode::Center => Aabb::from_center_extents(Vec3::ZERO, bounds.extents()),
        PivotMode::Pivot => bounds,
    }
}

/// Arena of sessions with a flat key index. Each slot carries the generation
/// it was filled under, so handles to a reused slot go stale.
#[derive(Default)]
pub struct SessionStore {
    slots: Slab<(u32, SnapSession)>,
    next_generation: u32,
    index: FnvHashMap<SessionKey, SessionHandle>,
}

impl SessionStore {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn handle(&self, key: SessionKey) -> Option<SessionHandle> {
        self.index.get(&key).copied()
    }

    pub fn get(&self, handle: SessionHandle) -> Option<&SnapSession> {
        match self.slots.get(handle.index as usize)? {
            (generation, session) if *generation == handle.generation => Some(session),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: SessionHandle) -> Option<&mut SnapSession> {
        match self.slots.get_mut(handle.index as usize)? {
            (generation, session) if *generation == handle.generation => Some(session),
            _ => None,
        }
    }

    pub fn by_key(&self, key: SessionKey) -> Option<&SnapSession> {
        self.get(self.handle(key)?)
    }

    /// Existing session for `key`, or a new one built by `create`.
    pub fn get_or_insert_with(
        &mut self,
        key: SessionKey,
        create: impl FnOnce() -> SnapSession,
    ) -> SessionHandle {
        if let Some(handle) = self.handle(key) {
            return handle;
        }
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        let index = self.slots.insert((generation, create()));
        let handle = SessionHandle {
            index: index as u32,
            generation,
        };
        self.index.insert(key, handle);
        log::debug!("[session] open {:?}/{:?}", key.0, key.1);
        handle
    }

    pub fn remove(&mut self, key: SessionKey) -> Option<SnapSession> {
        let handle = self.index.remove(&key)?;
        let (_, session) = self.slots.try_remove(handle.index as usize)?;
        log::debug!("[session] close {:?}/{:?}", key.0, key.1);
        Some(session)
    }

    /// Remove every session owned by `pointer`.
    pub fn remove_pointer(&mut self, pointer: PointerId) -> Vec<SnapSession> {
        let mut keys: Vec<SessionKey> = self
            .index
            .keys()
            .filter(|(p, _)| *p == pointer)
            .copied()
            .collect();
        keys.sort();
        keys.into_iter().filter_map(|k| self.remove(k)).collect()
    }

    pub fn clear(&mut self) -> Vec<SnapSession> {
        let mut keys: Vec<SessionKey> = self.index.keys().copied().collect();
        keys.sort();
        keys.into_iter().filter_map(|k| self.remove(k)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SnapSession> {
        self.slots.iter().map(|(_, (_, session))| session)
    }
}
