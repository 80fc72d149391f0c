// Rigid-body world: static terrain plus every dropped silhouette.
// Advanced by a fixed step, never by the measured frame time.
use std::sync::atomic::{AtomicU64, Ordering};

use rapier2d::na::{Point2, Vector2};
use rapier2d::prelude::{
    BroadPhase, CCDSolver, ColliderBuilder, ColliderSet, ImpulseJointSet, IntegrationParameters,
    IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, RigidBodyBuilder,
    RigidBodyHandle, RigidBodySet,
};

use crate::config::{MIN_SHAPE_AREA, Material, REST_ANGULAR_SPEED, REST_LINEAR_SPEED};
use crate::types::{Point, Pose};
use crate::vision::polygon_area;

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(1);

/// Body reference scoped to the world that created it. Handles from a
/// torn-down world resolve to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyHandle {
    world: u64,
    body: RigidBodyHandle,
}

pub struct PhysicsWorld {
    id: u64,
    gravity: Vector2<f32>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    terrain: Option<RigidBodyHandle>,
}

impl PhysicsWorld {
    pub fn new(gravity: Point) -> Self {
        Self {
            id: NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed),
            gravity: Vector2::new(gravity.x, gravity.y),
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            terrain: None,
        }
    }

    /// Fixed, infinite-mass ground at `position`. Call once per world.
    pub fn add_static_terrain(&mut self, polygon: &[Point], position: Point, material: Material) -> Option<BodyHandle> {
        let collider = polygon_collider(polygon)?
            .friction(material.friction)
            .restitution(material.restitution)
            .build();
        let body = RigidBodyBuilder::fixed()
            .translation(Vector2::new(position.x, position.y))
            .build();

        let handle = self.bodies.insert(body);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        self.terrain = Some(handle);
        Some(self.wrap(handle))
    }

    /// Dynamic body from a local outline (around the body origin, y up).
    /// `None` for outlines with fewer than 3 points or no enclosed area.
    pub fn spawn(&mut self, polygon: &[Point], pose: Pose, mass: f32, material: Material) -> Option<BodyHandle> {
        // Mass given explicitly: rapier derives the moment of inertia from the shape.
        let collider = polygon_collider(polygon)?
            .mass(mass)
            .friction(material.friction)
            .restitution(material.restitution)
            .build();
        let body = RigidBodyBuilder::dynamic()
            .translation(Vector2::new(pose.x, pose.y))
            .rotation(pose.rotation.to_radians())
            .build();

        let handle = self.bodies.insert(body);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        Some(self.wrap(handle))
    }

    /// Advance by exactly `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );
    }

    /// Remove the body (and its collider) once it is below `y_threshold`.
    /// Returns true only when this call removed it.
    pub fn remove_if_below(&mut self, handle: BodyHandle, y_threshold: f32) -> bool {
        let Some(pose) = self.pose(handle) else { return false };
        if pose.y >= y_threshold {
            return false;
        }
        self.bodies
            .remove(
                handle.body,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Position and rotation (degrees) of a live body.
    pub fn pose(&self, handle: BodyHandle) -> Option<Pose> {
        if handle.world != self.id {
            return None;
        }
        let body = self.bodies.get(handle.body)?;
        let t = body.translation();
        Some(Pose::new(t.x, t.y, body.rotation().angle().to_degrees()))
    }

    /// World-space vertical extent (bottom, top) of the body's colliders.
    pub fn vertical_bounds(&self, handle: BodyHandle) -> Option<(f32, f32)> {
        if handle.world != self.id {
            return None;
        }
        let body = self.bodies.get(handle.body)?;
        body.colliders()
            .iter()
            .filter_map(|c| self.colliders.get(*c))
            .map(|c| {
                let aabb = c.compute_aabb();
                (aabb.mins.y, aabb.maxs.y)
            })
            .reduce(|(lo, hi), (b, t)| (lo.min(b), hi.max(t)))
    }

    /// True once the body is asleep or has (almost) stopped moving.
    pub fn is_resting(&self, handle: BodyHandle) -> bool {
        if handle.world != self.id {
            return false;
        }
        self.bodies.get(handle.body).is_some_and(|b| {
            b.is_sleeping()
                || (b.linvel().norm() <= REST_LINEAR_SPEED && b.angvel().abs() <= REST_ANGULAR_SPEED)
        })
    }

    pub fn mass(&self, handle: BodyHandle) -> Option<f32> {
        if handle.world != self.id {
            return None;
        }
        self.bodies.get(handle.body).map(|b| b.mass())
    }

    pub fn terrain_pose(&self) -> Option<Pose> {
        self.terrain.and_then(|h| self.pose(self.wrap(h)))
    }

    /// Every body in the world, terrain included.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        handle.world == self.id && self.bodies.contains(handle.body)
    }

    fn wrap(&self, body: RigidBodyHandle) -> BodyHandle {
        BodyHandle { world: self.id, body }
    }
}

/// Convex outlines map to a single hull; anything else (a person, a hilly
/// terrain) is split into convex parts.
fn polygon_collider(polygon: &[Point]) -> Option<ColliderBuilder> {
    if polygon.len() < 3 || polygon_area(polygon) < MIN_SHAPE_AREA {
        return None;
    }
    let vertices: Vec<Point2<f32>> = polygon.iter().map(|p| Point2::new(p.x, p.y)).collect();

    if is_convex(polygon) {
        return ColliderBuilder::convex_hull(&vertices);
    }
    let n = vertices.len() as u32;
    let indices: Vec<[u32; 2]> = (0..n).map(|i| [i, (i + 1) % n]).collect();
    Some(ColliderBuilder::convex_decomposition(&vertices, &indices))
}

fn is_convex(polygon: &[Point]) -> bool {
    let n = polygon.len();
    let mut sign = 0.0f32;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let c = polygon[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross == 0.0 { continue; }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;
    const MAT: Material = Material { friction: 0.3, restitution: 0.1 };

    fn square(half: f32) -> Vec<Point> {
        vec![
            Point::new(-half, -half),
            Point::new(half, -half),
            Point::new(half, half),
            Point::new(-half, half),
        ]
    }

    fn ground() -> Vec<Point> {
        vec![
            Point::new(-640.0, -50.0),
            Point::new(640.0, -50.0),
            Point::new(640.0, 50.0),
            Point::new(-640.0, 50.0),
        ]
    }

    #[test]
    fn free_fall_is_monotonic_until_removed() {
        let mut world = PhysicsWorld::new(Point::new(0.0, -400.0));
        let body = world.spawn(&square(20.0), Pose::new(640.0, 720.0, 0.0), 0.5, MAT).expect("spawn");

        let mut last_y = 720.0;
        for _ in 0..60 {
            world.step(DT);
            let y = world.pose(body).expect("alive").y;
            assert!(y < last_y, "y went from {last_y} to {y}");
            last_y = y;
        }
        // One second at 400 px/s^2: roughly 200 px down.
        assert!((last_y - 520.0).abs() < 10.0, "y after 1s = {last_y}");

        let mut removed = false;
        for _ in 0..600 {
            world.step(DT);
            if world.remove_if_below(body, 0.0) {
                removed = true;
                break;
            }
            let y = world.pose(body).expect("alive").y;
            assert!(y < last_y && y >= 0.0);
            last_y = y;
        }
        assert!(removed);
        assert!(world.pose(body).is_none());
        assert_eq!(world.body_count(), 0);
        assert!(!world.remove_if_below(body, 0.0));
    }

    #[test]
    fn spawn_uses_given_mass() {
        let mut world = PhysicsWorld::new(Point::new(0.0, -400.0));
        let body = world.spawn(&square(20.0), Pose::new(0.0, 0.0, 0.0), 0.5, MAT).expect("spawn");
        world.step(DT);
        let mass = world.mass(body).expect("alive");
        assert!((mass - 0.5).abs() < 1e-3, "mass = {mass}");
    }

    #[test]
    fn spawn_converts_rotation_to_radians_and_back() {
        let mut world = PhysicsWorld::new(Point::new(0.0, 0.0));
        let body = world.spawn(&square(10.0), Pose::new(5.0, 6.0, 30.0), 0.5, MAT).expect("spawn");
        let pose = world.pose(body).expect("alive");
        assert!((pose.rotation - 30.0).abs() < 1e-3);
        assert_eq!((pose.x, pose.y), (5.0, 6.0));
    }

    #[test]
    fn degenerate_polygons_are_refused() {
        let mut world = PhysicsWorld::new(Point::new(0.0, -400.0));
        let two = [Point::new(0.0, 0.0), Point::new(5.0, 0.0)];
        let line = [Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0)];
        assert!(world.spawn(&two, Pose::default(), 0.5, MAT).is_none());
        assert!(world.spawn(&line, Pose::default(), 0.5, MAT).is_none());
        assert!(world.spawn(&[], Pose::default(), 0.5, MAT).is_none());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn concave_outline_spawns() {
        let mut world = PhysicsWorld::new(Point::new(0.0, -400.0));
        let u_shape = vec![
            Point::new(-30.0, -30.0),
            Point::new(-10.0, -30.0),
            Point::new(-10.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, -30.0),
            Point::new(30.0, -30.0),
            Point::new(30.0, 30.0),
            Point::new(-30.0, 30.0),
        ];
        assert!(!is_convex(&u_shape));
        assert!(world.spawn(&u_shape, Pose::new(0.0, 100.0, 0.0), 0.5, MAT).is_some());
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn terrain_never_moves() {
        let mut world = PhysicsWorld::new(Point::new(0.0, -900.0));
        world.add_static_terrain(&ground(), Point::new(640.0, 50.0), MAT).expect("terrain");
        let start = world.terrain_pose().expect("terrain");
        for _ in 0..300 {
            world.step(DT);
        }
        assert_eq!(world.terrain_pose(), Some(start));
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn body_rests_on_terrain() {
        let mut world = PhysicsWorld::new(Point::new(0.0, -900.0));
        world.add_static_terrain(&ground(), Point::new(640.0, 50.0), MAT).expect("terrain");
        let body = world.spawn(&square(20.0), Pose::new(640.0, 300.0, 0.0), 0.5, MAT).expect("spawn");
        for _ in 0..240 {
            world.step(DT);
            assert!(!world.remove_if_below(body, 0.0));
        }
        let y = world.pose(body).expect("alive").y;
        // Ground top is at 100, box half height 20.
        assert!((y - 120.0).abs() < 3.0, "resting y = {y}");
    }

    #[test]
    fn bounds_follow_the_body_and_rest_is_detected() {
        let mut world = PhysicsWorld::new(Point::new(0.0, -900.0));
        world.add_static_terrain(&ground(), Point::new(640.0, 50.0), MAT).expect("terrain");
        let body = world.spawn(&square(20.0), Pose::new(640.0, 300.0, 0.0), 0.5, MAT).expect("spawn");

        let (bottom, top) = world.vertical_bounds(body).expect("alive");
        assert!((bottom - 280.0).abs() < 0.5 && (top - 320.0).abs() < 0.5, "{bottom}..{top}");

        world.step(DT);
        world.step(DT);
        assert!(!world.is_resting(body), "still falling");

        for _ in 0..240 {
            world.step(DT);
        }
        assert!(world.is_resting(body));
        let (_, top) = world.vertical_bounds(body).expect("alive");
        assert!((top - 140.0).abs() < 3.0, "resting top = {top}");
    }

    #[test]
    fn handles_do_not_cross_worlds() {
        let mut old = PhysicsWorld::new(Point::new(0.0, -400.0));
        let body = old.spawn(&square(10.0), Pose::default(), 0.5, MAT).expect("spawn");
        let mut fresh = PhysicsWorld::new(Point::new(0.0, -400.0));
        fresh.spawn(&square(10.0), Pose::default(), 0.5, MAT).expect("spawn");
        assert!(old.contains(body));
        assert!(!fresh.contains(body));
        assert!(fresh.pose(body).is_none());
        assert!(fresh.vertical_bounds(body).is_none());
        assert!(!fresh.is_resting(body));
    }
}
