use approx::assert_relative_eq;
use phys_core::bodies::DampingFlags;
use phys_core::constraints::{Constraint, PointOnPoint, SingleBodyPointOnPoint};
use phys_core::core::{BodyEventType, CollisionEventType};
use phys_core::error::PhysicsError;
use phys_core::math::Matrix3;
use phys_core::shapes::TransformedShape;
use phys_core::{BodyHandle, Material, RigidBody, Shape, SimulationConfig, Vector3, World};

const DT: f32 = 1.0 / 60.0;

fn cube(size: f32, position: Vector3) -> RigidBody {
    let shape = Shape::cuboid(Vector3::splat(size)).unwrap().into_shared();
    let mut body = RigidBody::new(shape, Material::default());
    body.set_position(position);
    body
}

fn ball(radius: f32, position: Vector3) -> RigidBody {
    let shape = Shape::sphere(radius).unwrap().into_shared();
    let mut body = RigidBody::new(shape, Material::default());
    body.set_position(position);
    body
}

fn ground() -> RigidBody {
    let shape = Shape::cuboid(Vector3::new(20.0, 1.0, 20.0)).unwrap().into_shared();
    let mut body = RigidBody::new(shape, Material::default());
    body.set_position(Vector3::new(0.0, -0.5, 0.0));
    body.set_static(true);
    body
}

fn body_events(world: &World, kind: BodyEventType, handle: BodyHandle) -> usize {
    world
        .events()
        .get_body_events_of_type(kind)
        .iter()
        .filter(|e| e.body == handle)
        .count()
}

#[test]
fn test_free_fall_without_damping() {
    let mut world = World::new();
    let mut body = ball(0.5, Vector3::new(0.0, 10.0, 0.0));
    body.set_damping(DampingFlags::empty());
    let handle = world.add_body(body);

    for _ in 0..60 {
        world.step(DT);
    }

    // Semi-implicit Euler: velocity first, then position
    let body = world.body(handle).unwrap();
    let n = 60.0;
    assert_relative_eq!(body.get_linear_velocity().y, -9.81 * n * DT, epsilon = 1e-3);
    assert_relative_eq!(
        body.get_position().y,
        10.0 - 9.81 * DT * DT * n * (n + 1.0) * 0.5,
        epsilon = 1e-3
    );
    assert_relative_eq!(world.time(), 1.0, epsilon = 1e-4);
}

#[test]
fn test_zero_step_does_nothing() {
    let mut world = World::new();
    let handle = world.add_body(ball(0.5, Vector3::new(0.0, 10.0, 0.0)));
    world.step(0.0);
    world.step(f32::NAN);
    assert_eq!(world.body(handle).unwrap().get_linear_velocity(), Vector3::ZERO);
    assert_eq!(world.time(), 0.0);
}

#[test]
fn test_box_comes_to_rest_on_ground() {
    let mut world = World::new();
    let floor = world.add_body(ground());
    let handle = world.add_body(cube(1.0, Vector3::new(0.0, 2.0, 0.0)));

    for _ in 0..240 {
        world.step(DT);
    }

    let body = world.body(handle).unwrap();
    let y = body.get_position().y;
    assert!(y > 0.4 && y < 0.6, "box settled at {}", y);
    assert!(body.get_linear_velocity().length() < 0.5);

    let begins = world.events().get_collision_events_of_type(CollisionEventType::Begin);
    assert!(begins
        .iter()
        .any(|e| (e.body_a, e.body_b) == (floor, handle) || (e.body_a, e.body_b) == (handle, floor)));
    assert!(world.arbiters().contains(floor, handle));

    let floor_body = world.body(floor).unwrap();
    assert_eq!(floor_body.get_position(), Vector3::new(0.0, -0.5, 0.0));
    assert_eq!(floor_body.get_linear_velocity(), Vector3::ZERO);
    assert!(floor_body.get_island().is_none());
}

#[test]
fn test_resting_body_falls_asleep() {
    let mut world = World::new();
    let mut body = ball(0.5, Vector3::ZERO);
    body.set_affected_by_gravity(false);
    let handle = world.add_body(body);

    for _ in 0..130 {
        world.step(DT);
    }

    assert!(!world.body(handle).unwrap().is_active());
    assert_eq!(body_events(&world, BodyEventType::Deactivated, handle), 1);

    world.activate_body(handle).unwrap();
    assert!(world.body(handle).unwrap().is_active());
    assert_eq!(body_events(&world, BodyEventType::Activated, handle), 1);
}

#[test]
fn test_deactivation_can_be_disabled() {
    let config = SimulationConfig {
        allow_deactivation: false,
        ..SimulationConfig::default()
    };
    let mut world = World::with_config(config).unwrap();
    let mut body = ball(0.5, Vector3::ZERO);
    body.set_affected_by_gravity(false);
    let handle = world.add_body(body);

    for _ in 0..200 {
        world.step(DT);
    }
    assert!(world.body(handle).unwrap().is_active());
}

#[test]
fn test_falling_body_wakes_sleeping_island() {
    let mut world = World::new();
    let mut sleeper = cube(1.0, Vector3::ZERO);
    sleeper.set_affected_by_gravity(false);
    let sleeper = world.add_body(sleeper);

    for _ in 0..130 {
        world.step(DT);
    }
    assert!(!world.body(sleeper).unwrap().is_active());
    world.drain_events();

    let dropped = world.add_body(cube(1.0, Vector3::new(0.0, 2.0, 0.0)));
    for _ in 0..60 {
        world.step(DT);
    }

    assert!(body_events(&world, BodyEventType::Activated, sleeper) >= 1);
    let touched = world
        .events()
        .get_collision_events_for_body(dropped)
        .iter()
        .any(|e| e.event_type == CollisionEventType::Begin);
    assert!(touched);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = SimulationConfig {
        time_step: 0.0,
        ..SimulationConfig::default()
    };
    assert!(World::with_config(config).is_err());

    let config = SimulationConfig {
        linear_damping: 1.5,
        ..SimulationConfig::default()
    };
    assert!(World::with_config(config).is_err());
}

#[test]
fn test_step_accumulated_caps_substeps() {
    let mut world = World::new();
    world.add_body(ball(0.5, Vector3::ZERO));

    assert_eq!(world.step_accumulated(0.04), 2);
    assert_eq!(world.step_accumulated(10.0), world.config().max_substeps);
    // The backlog was dropped
    assert_eq!(world.step_accumulated(0.0), 0);
    assert_relative_eq!(world.time(), 12.0 * DT, epsilon = 1e-4);
}

#[test]
fn test_constraint_joins_islands() {
    let mut world = World::new();
    let a = world.add_body(ball(0.5, Vector3::new(-1.0, 0.0, 0.0)));
    let b = world.add_body(ball(0.5, Vector3::new(1.0, 0.0, 0.0)));
    assert_eq!(world.islands().count(), 2);

    let joint = PointOnPoint::new(
        a,
        world.body(a).unwrap(),
        b,
        world.body(b).unwrap(),
        Vector3::ZERO,
    );
    let handle = world.add_constraint(Box::new(joint)).unwrap();
    assert_eq!(world.islands().count(), 1);
    assert_eq!(world.body(a).unwrap().get_island(), world.body(b).unwrap().get_island());

    let removed = world.remove_constraint(handle).unwrap();
    assert!(removed.as_any().downcast_ref::<PointOnPoint>().is_some());
    assert_eq!(world.islands().count(), 2);
    assert!(world.remove_constraint(handle).is_err());
}

#[test]
fn test_joint_holds_bodies_together() {
    let mut world = World::new();
    let mut anchor = ball(0.25, Vector3::new(0.0, 5.0, 0.0));
    anchor.set_static(true);
    let a = world.add_body(anchor);
    let b = world.add_body(ball(0.25, Vector3::new(1.0, 5.0, 0.0)));

    let joint = PointOnPoint::new(
        a,
        world.body(a).unwrap(),
        b,
        world.body(b).unwrap(),
        Vector3::new(0.0, 5.0, 0.0),
    );
    world.add_constraint(Box::new(joint)).unwrap();

    for _ in 0..180 {
        world.step(DT);
    }

    // A pendulum: the bob swings but stays about one unit from the pivot
    let distance = (world.body(b).unwrap().get_position() - Vector3::new(0.0, 5.0, 0.0)).length();
    assert!((distance - 1.0).abs() < 0.2, "bob drifted to {}", distance);
    assert_eq!(world.body(a).unwrap().get_position(), Vector3::new(0.0, 5.0, 0.0));
}

#[test]
fn test_single_body_joint_hangs_body() {
    let mut world = World::new();
    let handle = world.add_body(ball(0.25, Vector3::new(0.0, 3.0, 0.0)));
    let joint = SingleBodyPointOnPoint::new(handle, world.body(handle).unwrap(), Vector3::ZERO);
    world.add_constraint(Box::new(joint)).unwrap();

    for _ in 0..120 {
        world.step(DT);
    }
    let y = world.body(handle).unwrap().get_position().y;
    assert!((y - 3.0).abs() < 0.2, "body sagged to {}", y);
}

#[test]
fn test_constraint_needs_live_bodies() {
    let mut world = World::new();
    let a = world.add_body(ball(0.5, Vector3::ZERO));
    let body = world.body(a).unwrap().clone();
    world.remove_body(a).unwrap();

    let joint = SingleBodyPointOnPoint::new(a, &body, Vector3::ZERO);
    assert!(world.add_constraint(Box::new(joint)).is_err());
}

#[test]
fn test_set_body_static_splits_and_rejoins() {
    let mut world = World::new();
    let a = world.add_body(ball(0.5, Vector3::new(-1.0, 0.0, 0.0)));
    let b = world.add_body(ball(0.5, Vector3::new(1.0, 0.0, 0.0)));
    let joint = PointOnPoint::new(a, world.body(a).unwrap(), b, world.body(b).unwrap(), Vector3::ZERO);
    world.add_constraint(Box::new(joint)).unwrap();
    assert_eq!(world.islands().count(), 1);

    world.set_body_static(a, true).unwrap();
    assert!(world.body(a).unwrap().get_island().is_none());
    assert_eq!(world.islands().count(), 1);
    let (_, island) = world.islands().next().unwrap();
    assert!(island.contains_body(b));
    assert_eq!(island.constraint_count(), 1);

    world.set_body_static(a, false).unwrap();
    assert_eq!(world.islands().count(), 1);
    assert_eq!(world.body(a).unwrap().get_island(), world.body(b).unwrap().get_island());
}

#[test]
fn test_body_made_static_under_a_stack_stays_still() {
    let mut world = World::new();
    world.add_body(ground());
    let lower = world.add_body(cube(1.0, Vector3::new(0.0, 0.5, 0.0)));
    let upper = world.add_body(cube(1.0, Vector3::new(0.0, 1.5, 0.0)));

    for _ in 0..20 {
        world.step(DT);
    }
    assert!(world.arbiters().contains(lower, upper));

    world.set_body_static(lower, true).unwrap();
    let resting_at = world.body(lower).unwrap().get_position();
    for _ in 0..3 {
        world.step(DT);
    }

    let body = world.body(lower).unwrap();
    assert_eq!(body.get_linear_velocity(), Vector3::ZERO);
    assert_eq!(body.get_angular_velocity(), Vector3::ZERO);
    assert_eq!(body.get_position(), resting_at);
}

#[test]
fn test_static_flag_set_directly_is_picked_up() {
    let mut world = World::new();
    let handle = world.add_body(ball(0.5, Vector3::ZERO));
    world.body_mut(handle).unwrap().set_static(true);
    world.step(DT);

    let body = world.body(handle).unwrap();
    assert!(body.get_island().is_none());
    assert_eq!(body.get_position(), Vector3::ZERO);
    assert_eq!(world.islands().count(), 0);
}

#[test]
fn test_remove_body_ends_contacts() {
    let mut world = World::new();
    let floor = world.add_body(ground());
    let handle = world.add_body(cube(1.0, Vector3::new(0.0, 0.45, 0.0)));
    world.step(DT);
    assert!(world.arbiters().contains(floor, handle));
    world.drain_events();

    let body = world.remove_body(handle).unwrap();
    assert_eq!(body.arbiters().count(), 0);
    assert!(world.arbiters().is_empty());
    assert_eq!(world.islands().count(), 0);
    assert_eq!(body_events(&world, BodyEventType::Removed, handle), 1);
    assert_eq!(
        world.events().get_collision_events_of_type(CollisionEventType::End).len(),
        1
    );
    assert!(world.body(handle).is_err());
    assert!(world.remove_body(handle).is_err());
}

#[test]
fn test_raycast_finds_nearest_body() {
    let mut world = World::new();
    let near = world.add_body(ball(1.0, Vector3::new(0.0, 2.0, 0.0)));
    let far = world.add_body(ball(1.0, Vector3::new(0.0, -2.0, 0.0)));

    let origin = Vector3::new(0.0, 10.0, 0.0);
    let direction = Vector3::new(0.0, -20.0, 0.0);

    let hit = world.raycast(origin, direction, None).unwrap();
    assert_eq!(hit.body, near);
    assert_relative_eq!(hit.fraction, 7.0 / 20.0, epsilon = 1e-2);
    assert_relative_eq!(hit.normal.normalize(), Vector3::unit_y(), epsilon = 1e-2);

    let skip_near = |handle: BodyHandle, _: &RigidBody| handle != near;
    let hit = world.raycast(origin, direction, Some(&skip_near)).unwrap();
    assert_eq!(hit.body, far);

    // Too short to reach either ball
    assert!(world.raycast(origin, Vector3::new(0.0, -5.0, 0.0), None).is_none());
}

#[test]
fn test_forces_are_cleared_each_step() {
    let mut world = World::new();
    let mut body = ball(0.5, Vector3::ZERO);
    body.set_affected_by_gravity(false);
    body.set_damping(DampingFlags::empty());
    let handle = world.add_body(body);

    let mass = world.body(handle).unwrap().get_mass();
    world.body_mut(handle).unwrap().add_force(Vector3::new(mass * 60.0, 0.0, 0.0));
    world.step(DT);
    world.step(DT);

    let body = world.body(handle).unwrap();
    assert_relative_eq!(body.get_linear_velocity().x, 1.0, epsilon = 1e-4);
    assert_eq!(body.get_force(), Vector3::ZERO);
}

#[test]
fn test_clear_empties_world() {
    let mut world = World::new();
    world.add_body(ground());
    world.add_body(cube(1.0, Vector3::new(0.0, 0.45, 0.0)));
    world.step(DT);

    world.clear();
    assert_eq!(world.body_count(), 0);
    assert!(world.arbiters().is_empty());
    assert_eq!(world.islands().count(), 0);
    assert!(world.events().is_empty());
}

#[test]
fn test_each_error_kind_comes_from_misuse() {
    let kind = |e: PhysicsError| match e {
        PhysicsError::InvalidParameter(_) => "parameter",
        PhysicsError::ResourceNotFound(_) => "missing",
        PhysicsError::InvalidOperation(_) => "operation",
        PhysicsError::UnsupportedShape(_) => "shape",
    };

    assert_eq!(kind(Shape::sphere(-1.0).unwrap_err()), "parameter");

    let world = World::new();
    assert_eq!(kind(world.body(BodyHandle::from_index(7)).unwrap_err()), "missing");

    let mut floor = ground();
    assert_eq!(kind(floor.apply_impulse(Vector3::unit_y()).unwrap_err()), "operation");

    let terrain = Shape::terrain(vec![vec![0.0; 3]; 3], 1.0, 1.0).unwrap();
    let nested = TransformedShape::new(terrain, Matrix3::identity(), Vector3::ZERO);
    assert_eq!(kind(Shape::compound(vec![nested]).unwrap_err()), "shape");
}
