use approx::assert_relative_eq;
use phys_core::bodies::Material;
use phys_core::collision::{
    xeno_collide, ArbiterMap, BroadPhase, BruteForceBroadPhase, CollisionFilter, CollisionGroups, ContactSettings,
    Gjk, GroupMaskFilter, NarrowPhase, SweepAndPruneBroadPhase,
};
use phys_core::core::{BodyHandle, BodyStorage, Storage};
use phys_core::math::{Matrix3, Vector3};
use phys_core::{RigidBody, Shape};
use std::f32::consts::FRAC_PI_2;

fn body(shape: Shape, position: Vector3) -> RigidBody {
    let mut body = RigidBody::new(shape.into_shared(), Material::default());
    body.set_position(position);
    body
}

fn normalized(mut pairs: Vec<(BodyHandle, BodyHandle)>) -> Vec<(BodyHandle, BodyHandle)> {
    for pair in &mut pairs {
        if pair.0 > pair.1 {
            *pair = (pair.1, pair.0);
        }
    }
    pairs.sort();
    pairs
}

#[test]
fn test_closest_points_between_spheres() {
    let gjk = Gjk::new();
    let sphere = Shape::sphere(1.0).unwrap();
    let id = Matrix3::identity();

    let result = gjk
        .closest_points(&sphere, &sphere, &id, &id, Vector3::new(3.0, 0.0, 0.0), Vector3::ZERO)
        .unwrap();
    assert_relative_eq!(result.distance(), 1.0, epsilon = 1e-2);
    assert_relative_eq!(result.normal, Vector3::unit_x(), epsilon = 1e-2);
    assert_relative_eq!(result.point1, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-2);
    assert_relative_eq!(result.point2, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-2);
}

#[test]
fn test_closest_points_between_boxes() {
    let gjk = Gjk::new();
    let cube = Shape::cuboid(Vector3::splat(2.0)).unwrap();
    let id = Matrix3::identity();

    // Faces at x = 11 and x = 1
    let result = gjk
        .closest_points(&cube, &cube, &id, &id, Vector3::new(12.0, 0.0, 0.0), Vector3::ZERO)
        .unwrap();
    assert_relative_eq!(result.distance(), 10.0, epsilon = 1e-2);
    assert_relative_eq!(result.normal, Vector3::unit_x(), epsilon = 1e-3);
    assert_relative_eq!(result.point1.x, 11.0, epsilon = 1e-2);
    assert_relative_eq!(result.point2.x, 1.0, epsilon = 1e-2);
}

#[test]
fn test_closest_points_none_when_overlapping() {
    let gjk = Gjk::new();
    let cube = Shape::cuboid(Vector3::one()).unwrap();
    let id = Matrix3::identity();
    let result = gjk.closest_points(&cube, &cube, &id, &id, Vector3::new(0.5, 0.2, 0.0), Vector3::ZERO);
    assert!(result.is_none());
}

#[test]
fn test_raycast_box_from_above() {
    let gjk = Gjk::new();
    let cube = Shape::cuboid(Vector3::splat(2.0)).unwrap();
    let hit = gjk
        .raycast(
            &cube,
            &Matrix3::identity(),
            Vector3::new(0.0, 3.0, 0.0),
            Vector3::new(0.2, 10.0, -0.1),
            Vector3::new(0.0, -1.0, 0.0),
        )
        .unwrap();
    assert_relative_eq!(hit.fraction, 6.0, epsilon = 1e-3);
    assert_relative_eq!(hit.normal, Vector3::unit_y(), epsilon = 1e-3);
}

#[test]
fn test_point_in_rotated_bar() {
    let gjk = Gjk::new();
    let bar = Shape::cuboid(Vector3::new(2.0, 0.2, 0.2)).unwrap();
    let upright = Matrix3::from_axis_angle(Vector3::unit_z(), FRAC_PI_2);

    assert!(gjk.point_in_shape(&bar, &upright, Vector3::ZERO, Vector3::new(0.0, 0.9, 0.0)));
    assert!(!gjk.point_in_shape(&bar, &upright, Vector3::ZERO, Vector3::new(0.9, 0.0, 0.0)));
}

#[test]
fn test_sphere_sinking_into_box() {
    let sphere = Shape::sphere(1.0).unwrap();
    let cube = Shape::cuboid(Vector3::splat(2.0)).unwrap();
    let id = Matrix3::identity();

    let result = xeno_collide::detect(&sphere, &cube, &id, &id, Vector3::new(0.0, 1.5, 0.0), Vector3::ZERO).unwrap();
    // Normal runs from the box toward the sphere.
    assert_relative_eq!(result.normal, Vector3::unit_y(), epsilon = 1e-3);
    assert_relative_eq!(result.penetration, 0.5, epsilon = 1e-2);
    assert_relative_eq!(result.point.y, 0.75, epsilon = 1e-2);

    let apart = xeno_collide::detect(&sphere, &cube, &id, &id, Vector3::new(0.0, 2.5, 0.0), Vector3::ZERO);
    assert!(apart.is_none());
}

#[test]
fn test_sphere_on_terrain() {
    let narrow = NarrowPhase::new();
    let terrain = body(Shape::terrain(vec![vec![0.0; 4]; 4], 1.0, 1.0).unwrap(), Vector3::ZERO);
    let ball = body(Shape::sphere(0.5).unwrap(), Vector3::new(1.3, 0.3, 1.6));
    let ball_handle = BodyHandle::from_index(1);

    let reports = narrow.detect(ball_handle, &ball, BodyHandle::from_index(0), &terrain);
    assert!(!reports.is_empty());
    for report in &reports {
        let (_, _, normal) = report.oriented_for(ball_handle);
        assert!(normal.y > 0.5, "normal {}", normal);
        assert!(report.penetration > 0.0);
    }
    assert_eq!(terrain.get_shape().read().outstanding_clones(), 0);

    let high = body(Shape::sphere(0.5).unwrap(), Vector3::new(1.3, 3.0, 1.6));
    assert!(narrow
        .detect(BodyHandle::from_index(1), &high, BodyHandle::from_index(0), &terrain)
        .is_empty());
}

fn three_boxes() -> BodyStorage<RigidBody> {
    let mut bodies: BodyStorage<RigidBody> = Storage::new();
    bodies.add(body(Shape::cuboid(Vector3::one()).unwrap(), Vector3::ZERO));
    bodies.add(body(Shape::cuboid(Vector3::one()).unwrap(), Vector3::new(0.8, 0.0, 0.0)));
    bodies.add(body(Shape::cuboid(Vector3::one()).unwrap(), Vector3::new(1.6, 0.0, 0.0)));
    bodies
}

#[test]
fn test_broad_phases_agree() {
    let bodies = three_boxes();
    let h = BodyHandle::from_index;

    let mut sweep = SweepAndPruneBroadPhase::new();
    sweep.update(&bodies);
    let mut swept = Vec::new();
    sweep.find_pairs(&mut swept);

    let mut brute = BruteForceBroadPhase::new();
    brute.update(&bodies);
    let mut all = Vec::new();
    brute.find_pairs(&mut all);

    assert_eq!(normalized(swept.clone()), normalized(all));
    assert_eq!(normalized(swept), vec![(h(0), h(1)), (h(1), h(2))]);
}

#[test]
fn test_group_mask_filter() {
    let bodies = three_boxes();
    let h = BodyHandle::from_index;
    let mut filter = GroupMaskFilter::new();
    filter.set_group(h(1), CollisionGroups::DEBRIS);
    filter.set_mask(h(1), CollisionGroups::STATIC | CollisionGroups::DEBRIS);

    let b = |i: usize| bodies.get(h(i)).unwrap();
    assert!(!filter.should_collide(h(0), b(0), h(1), b(1)));
    assert!(!filter.should_collide(h(1), b(1), h(0), b(0)));
    assert!(filter.should_collide(h(0), b(0), h(2), b(2)));

    filter.set_group(h(2), CollisionGroups::STATIC);
    assert!(filter.should_collide(h(1), b(1), h(2), b(2)));
}

#[test]
fn test_arbiter_merges_repeated_contacts() {
    let ground = body(Shape::cuboid(Vector3::new(10.0, 1.0, 10.0)).unwrap(), Vector3::ZERO);
    let cube = body(Shape::cuboid(Vector3::one()).unwrap(), Vector3::new(0.0, 0.9, 0.0));
    let (g, c) = (BodyHandle::from_index(0), BodyHandle::from_index(1));

    let narrow = NarrowPhase::new();
    let settings = ContactSettings::default();
    let mut arbiters = ArbiterMap::new();

    for step in 0..3 {
        for report in narrow.detect(c, &cube, g, &ground) {
            let (arbiter, created) = arbiters.get_or_insert(report.body1, report.body2);
            assert_eq!(created, step == 0);
            assert_eq!(arbiter.body1(), g);

            let (p1, p2, n) = report.oriented_for(arbiter.body1());
            let added = arbiter.add_contact(&ground, &cube, p1, p2, n, report.penetration, &settings);
            assert_eq!(added.is_some(), step == 0);
        }
    }

    assert_eq!(arbiters.len(), 1);
    let arbiter = arbiters.get(c, g).unwrap();
    assert_eq!(arbiter.len(), 1);
    let contact = arbiter.contacts()[0];
    // Seen from the ground, the normal points down toward it.
    assert_relative_eq!(contact.normal(), -Vector3::unit_y(), epsilon = 1e-3);
    assert_relative_eq!(contact.penetration(), 0.1, epsilon = 1e-3);
}
