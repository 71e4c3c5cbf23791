//! Entry points called once per frame per active pointer by manipulation
//! tools: [`SnapEngine::manipulator_snap`] for incremental drags and
//! [`SnapEngine::direct_snap`] for direct grabs.

use crate::directions::{DIRECTIONS, DOWN};
use crate::geometry::Ray;
use crate::probe::{
    normal_break_distance, snap_to_ground, snap_to_surface, try_break_snap, GroundProbe,
    SurfaceProbe,
};
use crate::scene::{IgnoreList, NodeId, Pointer, PointerId, SnapContext, SnapScene, WidgetId};
use crate::session::{
    identity_bounds, PivotMode, SessionError, SessionHandle, SessionStore, SnapMode, SnapSession,
};
use crate::settings::{SettingsError, SnapSettings};
use glam::{Quat, Vec3};
use std::ops::BitOr;

/// Bitmask of the axes a manipulator drag is restricted to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AxisConstraints(u8);

impl AxisConstraints {
    pub const NONE: Self = Self(0);
    pub const X: Self = Self(1);
    pub const Y: Self = Self(2);
    pub const Z: Self = Self(4);
    pub const ALL: Self = Self(7);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 7)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// No constraint, or every axis permitted.
    pub const fn is_free(self) -> bool {
        matches!(self.count(), 0 | 3)
    }

    fn local_axes(self) -> impl Iterator<Item = Vec3> {
        [(Self::X, Vec3::X), (Self::Y, Vec3::Y), (Self::Z, Vec3::Z)]
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, axis)| axis)
    }

    /// World axis to probe along: the permitted axis (rotated by `rotation`)
    /// that carries most of `delta`. Ties go to X, then Y, then Z.
    pub fn probe_axis(self, rotation: Quat, delta: Vec3) -> Option<Vec3> {
        let mut best: Option<(Vec3, f32)> = None;
        for axis in self.local_axes() {
            let world = rotation * axis;
            let share = world.dot(delta).abs();
            match best {
                Some((_, s)) if share <= s => {}
                _ => best = Some((world, share)),
            }
        }
        best.map(|(axis, _)| axis)
    }
}

impl BitOr for AxisConstraints {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Snap state of one session, for drawing a widget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapIndicator {
    pub pointer: PointerId,
    pub object: NodeId,
    pub mode: SnapMode,
    pub position: Vec3,
    pub rotation: Quat,
    pub normal: Vec3,
    pub hit_point: Vec3,
    pub widget: Option<WidgetId>,
}

#[derive(Default)]
pub struct SnapEngine {
    settings: SnapSettings,
    sessions: SessionStore,
}

impl SnapEngine {
    pub fn new(settings: SnapSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings,
            sessions: SessionStore::default(),
        })
    }

    pub fn settings(&self) -> &SnapSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: SnapSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Snap an incremental manipulator drag.
    ///
    /// `position`/`rotation` hold the object's current (possibly snapped)
    /// pose and receive the result. Returns true while a snap is active.
    #[allow(clippy::too_many_arguments)]
    pub fn manipulator_snap<S: SnapScene + ?Sized>(
        &mut self,
        ctx: &SnapContext<'_, S>,
        pointer: &Pointer,
        objects: &[NodeId],
        position: &mut Vec3,
        rotation: &mut Quat,
        delta: Vec3,
        constraints: AxisConstraints,
        pivot_mode: PivotMode,
    ) -> bool {
        let Some(&primary) = objects.first() else {
            *position += delta;
            return false;
        };
        if delta == Vec3::ZERO {
            return false;
        }
        let key = (pointer.id, primary);
        if !self.settings.any_probe_enabled() {
            return self.pass_through(key, position, rotation, delta);
        }

        let handle = self.sessions.get_or_insert_with(key, || {
            let bounds = identity_bounds(ctx.scene, objects, *position, *rotation, pivot_mode);
            SnapSession::new(key, *position, *rotation, bounds)
        });
        let Some(session) = self.sessions.get_mut(handle) else {
            *position += delta;
            return false;
        };
        session.accumulated_position += delta;

        let ignore = build_ignore_list(ctx, objects);
        let break_scale = ctx.camera_position.distance(*position);
        let break_distance = self.settings.tuning.break_distance * break_scale;
        let search = Search {
            settings: &self.settings,
            scene: ctx.scene,
            ignore: &ignore,
        };

        if constraints.is_free() {
            let target_position = session.accumulated_position;
            let target_rotation = session.start_rotation;
            let snapped = if self.settings.limit_radius {
                search.local_snap_to_surface(
                    session,
                    position,
                    rotation,
                    target_position,
                    target_rotation,
                    break_distance,
                )
            } else {
                search.pointer_snap(
                    session,
                    &pointer.ray,
                    position,
                    rotation,
                    target_rotation,
                    ctx.viewer_scale,
                )
            };
            if snapped {
                return true;
            }
            if session.is_snapping() {
                return search.hold_or_break(
                    session,
                    position,
                    rotation,
                    target_position,
                    target_rotation,
                    break_distance,
                );
            }
        } else {
            let current_rotation = *rotation;
            if search.constrained_snap(
                session,
                position,
                rotation,
                delta,
                constraints,
                break_distance,
            ) {
                return true;
            }
            if session.is_snapping() {
                // Retreating toward where the drag began holds on longer.
                let moving_back = delta.dot(session.origin - session.snapping_position) > 0.0;
                let distance = if moving_back {
                    break_distance * self.settings.tuning.blocked_break_scale
                } else {
                    break_distance
                };
                *position = session.snapping_position;
                let target_position = session.accumulated_position;
                return !try_break_snap(
                    session,
                    position,
                    rotation,
                    target_position,
                    current_rotation,
                    distance,
                );
            }
        }

        *position += delta;
        false
    }

    /// Snap a directly grabbed object toward `target_position`/`target_rotation`.
    #[allow(clippy::too_many_arguments)]
    pub fn direct_snap<S: SnapScene + ?Sized>(
        &mut self,
        ctx: &SnapContext<'_, S>,
        pointer: PointerId,
        object: NodeId,
        position: &mut Vec3,
        rotation: &mut Quat,
        target_position: Vec3,
        target_rotation: Quat,
    ) -> bool {
        let key = (pointer, object);
        if !self.settings.any_probe_enabled() {
            if let Some(session) = self
                .sessions
                .handle(key)
                .and_then(|h| self.sessions.get_mut(h))
            {
                session.accumulated_position = target_position;
                if session.is_snapping() {
                    session.release();
                }
            }
            *position = target_position;
            *rotation = target_rotation;
            return false;
        }

        let objects = [object];
        let handle = self.sessions.get_or_insert_with(key, || {
            let bounds = identity_bounds(
                ctx.scene,
                &objects,
                *position,
                *rotation,
                PivotMode::Pivot,
            );
            SnapSession::new(key, *position, *rotation, bounds)
        });
        let Some(session) = self.sessions.get_mut(handle) else {
            *position = target_position;
            *rotation = target_rotation;
            return false;
        };
        session.accumulated_position = target_position;

        let ignore = build_ignore_list(ctx, &objects);
        let break_distance = self.settings.tuning.break_distance * ctx.viewer_scale;
        let search = Search {
            settings: &self.settings,
            scene: ctx.scene,
            ignore: &ignore,
        };
        if search.local_snap_to_surface(
            session,
            position,
            rotation,
            target_position,
            target_rotation,
            break_distance,
        ) {
            return true;
        }
        if session.is_snapping()
            && search.hold_or_break(
                session,
                position,
                rotation,
                target_position,
                target_rotation,
                break_distance,
            )
        {
            return true;
        }
        *position = target_position;
        *rotation = target_rotation;
        false
    }

    /// End every session owned by `pointer`. Returns the widgets those
    /// sessions held so the host can dispose of them. Unknown pointers are a
    /// no-op.
    pub fn clear_snapping_state(&mut self, pointer: PointerId) -> Vec<WidgetId> {
        let released = self.sessions.remove_pointer(pointer);
        if !released.is_empty() {
            log::debug!("[snap] cleared {} session(s) for {:?}", released.len(), pointer);
        }
        released.into_iter().filter_map(|s| s.widget).collect()
    }

    /// End every session, e.g. when the owning tool deactivates.
    pub fn clear_all(&mut self) -> Vec<WidgetId> {
        self.sessions
            .clear()
            .into_iter()
            .filter_map(|s| s.widget)
            .collect()
    }

    pub fn session(&self, pointer: PointerId, object: NodeId) -> Option<&SnapSession> {
        self.sessions.by_key((pointer, object))
    }

    pub fn handle(&self, pointer: PointerId, object: NodeId) -> Option<SessionHandle> {
        self.sessions.handle((pointer, object))
    }

    pub fn session_by_handle(&self, handle: SessionHandle) -> Option<&SnapSession> {
        self.sessions.get(handle)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Attach a visualization node to a session, returning the one it replaces.
    pub fn attach_widget(
        &mut self,
        pointer: PointerId,
        object: NodeId,
        widget: WidgetId,
    ) -> Result<Option<WidgetId>, SessionError> {
        let session = self
            .sessions
            .handle((pointer, object))
            .and_then(|h| self.sessions.get_mut(h))
            .ok_or(SessionError::Missing { pointer, object })?;
        Ok(session.widget.replace(widget))
    }

    /// One entry per session that is currently snapped.
    pub fn indicators(&self) -> impl Iterator<Item = SnapIndicator> + '_ {
        self.sessions
            .iter()
            .filter(|s| s.is_snapping())
            .map(|s| SnapIndicator {
                pointer: s.key().0,
                object: s.key().1,
                mode: s.mode,
                position: s.snapping_position,
                rotation: s.snapping_rotation,
                normal: s.snapping_normal,
                hit_point: s.hit_point,
                widget: s.widget,
            })
    }

    fn pass_through(
        &mut self,
        key: (PointerId, NodeId),
        position: &mut Vec3,
        rotation: &mut Quat,
        delta: Vec3,
    ) -> bool {
        if let Some(session) = self.sessions.handle(key).and_then(|h| self.sessions.get_mut(h)) {
            session.accumulated_position += delta;
            if session.is_snapping() {
                session.release();
                *position = session.accumulated_position;
                *rotation = session.start_rotation;
                return false;
            }
        }
        *position += delta;
        false
    }
}

/// The object's own surfaces plus the host's global list, rebuilt per call.
fn build_ignore_list<S: SnapScene + ?Sized>(
    ctx: &SnapContext<'_, S>,
    objects: &[NodeId],
) -> IgnoreList {
    let mut ignore = IgnoreList::new();
    for &object in objects {
        ctx.scene.collect_surfaces(object, &mut ignore);
    }
    ignore.extend_from_slice(ctx.ignore);
    ignore
}

/// Borrowed view of everything one call's probes need.
struct Search<'a, S: SnapScene + ?Sized> {
    settings: &'a SnapSettings,
    scene: &'a S,
    ignore: &'a [NodeId],
}

impl<'a, S: SnapScene + ?Sized> Search<'a, S> {
    fn constrained_rotation(&self) -> bool {
        !self.settings.rotation_snapping
    }

    fn resting_offset(&self, session: &SnapSession, face: Vec3) -> Vec3 {
        if self.settings.pivot_snapping {
            Vec3::ZERO
        } else {
            session.identity_bounds.face_offset(face)
        }
    }

    /// Probe outward from the bounds faces, retrying the locked-in face first.
    fn local_snap_to_surface(
        &self,
        session: &mut SnapSession,
        position: &mut Vec3,
        rotation: &mut Quat,
        target_position: Vec3,
        target_rotation: Quat,
        raycast_distance: f32,
    ) -> bool {
        let locked = session.is_snapping().then_some(session.direction_index);
        if let Some(index) = locked {
            if self.snap_direction(
                session,
                index,
                position,
                rotation,
                target_position,
                target_rotation,
                raycast_distance,
            ) {
                return true;
            }
        }
        for index in 0..DIRECTIONS.len() {
            if locked == Some(index) {
                continue;
            }
            if self.snap_direction(
                session,
                index,
                position,
                rotation,
                target_position,
                target_rotation,
                raycast_distance,
            ) {
                session.direction_index = index;
                return true;
            }
        }
        false
    }

    #[allow(clippy::too_many_arguments)]
    fn snap_direction(
        &self,
        session: &mut SnapSession,
        index: usize,
        position: &mut Vec3,
        rotation: &mut Quat,
        target_position: Vec3,
        target_rotation: Quat,
        raycast_distance: f32,
    ) -> bool {
        let entry = &DIRECTIONS[index];
        let constrained = self.constrained_rotation();
        let tuning = &self.settings.tuning;
        let face = self.resting_offset(session, entry.probe_direction);
        let ray = Ray::new(
            target_position + target_rotation * face,
            target_rotation * entry.probe_direction,
        );

        if self.settings.surface_snapping {
            let probe = SurfaceProbe {
                ray,
                bounds_offset: face,
                target_rotation,
                rotation_offset: entry.rotation_offset,
                up_vector: target_rotation * entry.up_vector,
                raycast_distance,
                max_ray_dot: tuning.max_ray_dot,
                snap_distance_scale: tuning.snap_distance_scale,
                constrained,
            };
            if snap_to_surface(self.scene, self.ignore, session, &probe, position, rotation) {
                return true;
            }
        }

        if self.settings.ground_snapping {
            // Ground snapping stands the object upright, so its bottom rests.
            let bounds_offset = if constrained {
                face
            } else {
                self.resting_offset(session, Vec3::NEG_Y)
            };
            let probe = GroundProbe {
                ray,
                target_rotation,
                raycast_distance,
                bounds_offset,
                ground_height: tuning.ground_height,
                constrained,
            };
            if snap_to_ground(session, &probe, position, rotation) {
                return true;
            }
        }
        false
    }

    /// Free-aim search along the pointer's own ray.
    fn pointer_snap(
        &self,
        session: &mut SnapSession,
        ray: &Ray,
        position: &mut Vec3,
        rotation: &mut Quat,
        target_rotation: Quat,
        viewer_scale: f32,
    ) -> bool {
        let entry = &DIRECTIONS[DOWN];
        let constrained = self.constrained_rotation();
        let tuning = &self.settings.tuning;
        let bounds_offset = self.resting_offset(session, entry.probe_direction);

        if self.settings.surface_snapping {
            let probe = SurfaceProbe {
                ray: *ray,
                bounds_offset,
                target_rotation,
                rotation_offset: entry.rotation_offset,
                up_vector: target_rotation * entry.up_vector,
                raycast_distance: tuning.surface_max_ray_length * viewer_scale,
                max_ray_dot: tuning.max_ray_dot,
                snap_distance_scale: tuning.snap_distance_scale,
                constrained,
            };
            if snap_to_surface(self.scene, self.ignore, session, &probe, position, rotation) {
                session.direction_index = DOWN;
                return true;
            }
        }

        if self.settings.ground_snapping {
            let probe = GroundProbe {
                ray: *ray,
                target_rotation,
                raycast_distance: tuning.ground_max_ray_length * viewer_scale,
                bounds_offset,
                ground_height: tuning.ground_height,
                constrained,
            };
            if snap_to_ground(session, &probe, position, rotation) {
                session.direction_index = DOWN;
                return true;
            }
        }
        false
    }

    /// Probe along one permitted axis, positive direction first. Orientation
    /// is never changed.
    fn constrained_snap(
        &self,
        session: &mut SnapSession,
        position: &mut Vec3,
        rotation: &mut Quat,
        delta: Vec3,
        constraints: AxisConstraints,
        raycast_distance: f32,
    ) -> bool {
        let current = *rotation;
        let Some(axis) = constraints.probe_axis(current, delta) else {
            return false;
        };
        let target_position = session.accumulated_position;
        let bounds = session.identity_bounds;
        let extents = bounds.extents();
        let extent = (current * Vec3::X).dot(axis).abs() * extents.x
            + (current * Vec3::Y).dot(axis).abs() * extents.y
            + (current * Vec3::Z).dot(axis).abs() * extents.z;
        let center = current * bounds.center();
        let inverse = current.inverse();
        let tuning = &self.settings.tuning;

        for direction in [axis, -axis] {
            let face = if self.settings.pivot_snapping {
                Vec3::ZERO
            } else {
                center + direction * extent
            };
            let ray = Ray::new(target_position + face, direction);
            let bounds_offset = inverse * face;

            if self.settings.surface_snapping {
                let probe = SurfaceProbe {
                    ray,
                    bounds_offset,
                    target_rotation: current,
                    rotation_offset: Quat::IDENTITY,
                    up_vector: current * Vec3::Y,
                    raycast_distance,
                    max_ray_dot: tuning.max_ray_dot,
                    snap_distance_scale: tuning.snap_distance_scale,
                    constrained: true,
                };
                if snap_to_surface(self.scene, self.ignore, session, &probe, position, rotation) {
                    return true;
                }
            }
            if self.settings.ground_snapping {
                let probe = GroundProbe {
                    ray,
                    target_rotation: current,
                    raycast_distance,
                    bounds_offset,
                    ground_height: tuning.ground_height,
                    constrained: true,
                };
                if snap_to_ground(session, &probe, position, rotation) {
                    return true;
                }
            }
        }
        false
    }

    /// Keep the last snapped pose unless the target has drifted past the
    /// break distance. Returns true while still snapped.
    fn hold_or_break(
        &self,
        session: &mut SnapSession,
        position: &mut Vec3,
        rotation: &mut Quat,
        target_position: Vec3,
        target_rotation: Quat,
        break_distance: f32,
    ) -> bool {
        *position = session.snapping_position;
        *rotation = session.snapping_rotation;
        let distance = normal_break_distance(
            session,
            *position,
            target_position,
            break_distance,
            self.settings.tuning.blocked_break_scale,
        );
        !try_break_snap(
            session,
            position,
            rotation,
            target_position,
            target_rotation,
            distance,
        )
    }
}
