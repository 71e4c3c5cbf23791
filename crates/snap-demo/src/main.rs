use glam::{Quat, Vec3};
use surface_snap::geometry::ray_aabb;
use surface_snap::{
    Aabb, AxisConstraints, NodeId, PivotMode, Pointer, PointerId, Pose, Ray, RaycastHit,
    SnapContext, SnapEngine, SnapScene, SnapSettings,
};

const CRATE: NodeId = NodeId(1);
const WALL: NodeId = NodeId(2);
const HAND: PointerId = PointerId(0);
const CAMERA: Vec3 = Vec3::new(0.0, 0.5, 6.25);

/// One dragged crate plus static boxes.
struct DemoScene {
    crate_pose: Pose,
    crate_bounds: Aabb,
    statics: Vec<(NodeId, Aabb)>,
}

impl DemoScene {
    fn new(crate_position: Vec3) -> Self {
        Self {
            crate_pose: Pose::new(crate_position, Quat::IDENTITY),
            crate_bounds: Aabb::from_center_extents(Vec3::ZERO, Vec3::splat(0.5)),
            statics: Vec::new(),
        }
    }

    fn with_static(mut self, id: NodeId, aabb: Aabb) -> Self {
        self.statics.push((id, aabb));
        self
    }
}

impl SnapScene for DemoScene {
    fn raycast(&self, ray: &Ray, max_distance: f32, ignore: &[NodeId]) -> Option<RaycastHit> {
        self.statics
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
        (node == CRATE).then_some(self.crate_pose)
    }

    fn local_bounds(&self, node: NodeId) -> Option<Aabb> {
        (node == CRATE).then_some(self.crate_bounds)
    }
}

fn fmt(v: Vec3) -> String {
    format!("({:.3},{:.3},{:.3})", v.x, v.y, v.z)
}

fn drag(
    engine: &mut SnapEngine,
    scene: &DemoScene,
    position: &mut Vec3,
    rotation: &mut Quat,
    delta: Vec3,
) -> bool {
    let ctx = SnapContext::new(scene, CAMERA, 1.0);
    let pointer = Pointer::new(HAND, Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y);
    engine.manipulator_snap(
        &ctx,
        &pointer,
        &[CRATE],
        position,
        rotation,
        delta,
        AxisConstraints::NONE,
        PivotMode::Center,
    )
}

fn ground_scenarios() -> anyhow::Result<()> {
    let scene = DemoScene::new(Vec3::new(0.0, 2.0, 0.0));
    let mut engine = SnapEngine::new(SnapSettings::default())?;
    let mut position = Vec3::new(0.0, 2.0, 0.0);
    let mut rotation = Quat::IDENTITY;

    let down = Vec3::new(0.0, -0.1, 0.0);
    let mut first_snap = None;
    for frame in 0..20 {
        if drag(&mut engine, &scene, &mut position, &mut rotation, down) {
            first_snap.get_or_insert(frame);
        }
    }
    let Some(frame) = first_snap else {
        anyhow::bail!("descending crate never reached the ground");
    };
    log::info!("[demo] descend: snapped on frame {} at {}", frame, fmt(position));
    if (position.y - 0.5).abs() > 1e-3 {
        anyhow::bail!("crate resting at {} instead of y=0.5", fmt(position));
    }

    let accumulated = engine
        .session(HAND, CRATE)
        .map(|s| s.accumulated_position())
        .ok_or_else(|| anyhow::anyhow!("no session after descent"))?;
    log::info!("[demo] descend: raw drag target {}", fmt(accumulated));

    let mut position = Vec3::new(0.0, 2.0, 0.0);
    engine.clear_snapping_state(HAND);
    for _ in 0..13 {
        drag(&mut engine, &scene, &mut position, &mut rotation, down);
    }
    let sideways = Vec3::new(0.01, 0.0, 0.0);
    for _ in 0..5 {
        drag(&mut engine, &scene, &mut position, &mut rotation, sideways);
    }
    log::info!("[demo] slide: crate at {}", fmt(position));
    if (position.y - 0.5).abs() > 1e-3 || (position.x - 0.05).abs() > 1e-3 {
        anyhow::bail!("lateral slide lost the ground at {}", fmt(position));
    }

    let lift = Vec3::new(0.0, 0.5, 0.0);
    let released = !drag(&mut engine, &scene, &mut position, &mut rotation, lift);
    log::info!("[demo] lift: released={} crate at {}", released, fmt(position));
    if !released {
        anyhow::bail!("pulling up did not release the ground snap");
    }
    engine.clear_snapping_state(HAND);
    Ok(())
}

fn wall_scenario() -> anyhow::Result<()> {
    let scene = DemoScene::new(Vec3::new(0.0, 2.0, 0.0)).with_static(
        WALL,
        Aabb::new(Vec3::new(0.52, 0.0, -2.0), Vec3::new(1.0, 4.0, 2.0)),
    );
    let mut engine = SnapEngine::default();
    let ctx = SnapContext::new(&scene, CAMERA, 1.0);
    let mut position = Vec3::new(0.0, 2.0, 0.0);
    let mut rotation = Quat::IDENTITY;

    let snapped = engine.direct_snap(
        &ctx,
        HAND,
        CRATE,
        &mut position,
        &mut rotation,
        Vec3::new(0.0, 2.0, 0.0),
        Quat::IDENTITY,
    );
    let session = engine
        .session(HAND, CRATE)
        .ok_or_else(|| anyhow::anyhow!("direct grab opened no session"))?;
    log::info!(
        "[demo] wall: snapped={} face={} normal={} crate at {}",
        snapped,
        session.direction_index(),
        fmt(session.snapping_normal()),
        fmt(position)
    );
    if !snapped || (position.x - 0.02).abs() > 1e-3 {
        anyhow::bail!("crate did not come to rest against the wall");
    }
    for widget in engine.clear_snapping_state(HAND) {
        log::info!("[demo] dispose widget {:?}", widget);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    ground_scenarios()?;
    wall_scenario()?;
    log::info!("[demo] all scenarios passed");
    Ok(())
}
