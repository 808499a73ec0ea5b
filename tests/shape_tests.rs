use approx::assert_relative_eq;
use phys_core::math::{Matrix3, Vector3};
use phys_core::shapes::{ShapeKind, SupportMapping, TransformedShape};
use phys_core::Shape;
use std::f32::consts::PI;

fn cube_corners(half: f32) -> Vec<Vector3> {
    let mut points = Vec::new();
    for &x in &[-half, half] {
        for &y in &[-half, half] {
            for &z in &[-half, half] {
                points.push(Vector3::new(x, y, z));
            }
        }
    }
    points
}

#[test]
fn test_box_mass_properties() {
    let shape = Shape::cuboid(Vector3::new(2.0, 2.0, 2.0)).unwrap();
    assert_relative_eq!(shape.get_mass(), 8.0);
    assert_relative_eq!(shape.get_inertia().diagonal(), Vector3::splat(16.0 / 3.0), epsilon = 1e-4);

    let bounds = shape.get_bounding_box();
    assert_eq!(bounds.min, Vector3::splat(-1.0));
    assert_eq!(bounds.max, Vector3::splat(1.0));
}

#[test]
fn test_sphere_and_cylinder_mass() {
    let sphere = Shape::sphere(1.0).unwrap();
    let mass = 4.0 / 3.0 * PI;
    assert_relative_eq!(sphere.get_mass(), mass, epsilon = 1e-5);
    assert_relative_eq!(sphere.get_inertia().data[1][1], 0.4 * mass, epsilon = 1e-5);

    let cylinder = Shape::cylinder(2.0, 0.5).unwrap();
    let mass = PI * 0.25 * 2.0;
    assert_relative_eq!(cylinder.get_mass(), mass, epsilon = 1e-5);
    assert_relative_eq!(cylinder.get_inertia().data[1][1], 0.5 * mass * 0.25, epsilon = 1e-5);
}

#[test]
fn test_invalid_dimensions_are_rejected() {
    assert!(Shape::cuboid(Vector3::new(1.0, 0.0, 1.0)).is_err());
    assert!(Shape::sphere(-1.0).is_err());
    assert!(Shape::cylinder(f32::NAN, 1.0).is_err());
    assert!(Shape::convex_hull(vec![Vector3::ZERO, Vector3::unit_x()]).is_err());
    assert!(Shape::compound(Vec::new()).is_err());
}

#[test]
fn test_cone_support_and_bounds() {
    let cone = Shape::cone(3.0, 1.0).unwrap();

    // The center of mass sits a third of the way up from the base.
    assert_relative_eq!(cone.support_mapping(Vector3::unit_y()), Vector3::new(0.0, 2.0, 0.0));
    let rim = cone.support_mapping(Vector3::new(1.0, -1.0, 0.0));
    assert_relative_eq!(rim, Vector3::new(1.0, -1.0, 0.0));

    let bounds = cone.get_bounding_box();
    assert_relative_eq!(bounds.max.y, 2.0);
    assert_relative_eq!(bounds.min.y, -1.0);
    assert_relative_eq!(bounds.max.x, 1.0);
}

#[test]
fn test_rotated_cylinder_bounds() {
    let cylinder = Shape::cylinder(4.0, 1.0).unwrap();
    let lying = Matrix3::from_axis_angle(Vector3::unit_z(), PI / 2.0);
    let bounds = cylinder.bounding_box(&lying);
    assert_relative_eq!(bounds.max, Vector3::new(2.0, 1.0, 1.0), epsilon = 1e-5);
    assert_relative_eq!(bounds.min, Vector3::new(-2.0, -1.0, -1.0), epsilon = 1e-5);
}

/// Cube corners under a generic rotation, so no two corners tie along the
/// axis directions the hull builder samples.
fn tilted_cube(half: f32, offset: Vector3) -> Vec<Vector3> {
    let tilt = tilt();
    cube_corners(half)
        .into_iter()
        .map(|p| tilt.multiply_vector(p) + offset)
        .collect()
}

fn tilt() -> Matrix3 {
    Matrix3::from_axis_angle(Vector3::new(1.0, 2.0, 3.0).normalize(), 0.7)
}

#[test]
fn test_convex_hull_of_cube_matches_box() {
    let hull = Shape::convex_hull(tilted_cube(1.0, Vector3::ZERO)).unwrap();
    let cube = Shape::cuboid(Vector3::splat(2.0)).unwrap();

    assert_relative_eq!(hull.get_mass(), cube.get_mass(), max_relative = 1e-2);
    // A cube's inertia is isotropic, so the rotation doesn't change it.
    assert_relative_eq!(
        hull.get_inertia().diagonal(),
        cube.get_inertia().diagonal(),
        epsilon = 5e-2
    );

    let direction = Vector3::new(0.3, 0.9, -0.2);
    let expected = tilt().multiply_vector(cube.support_mapping(tilt().transpose_multiply_vector(direction)));
    assert_relative_eq!(hull.support_mapping(direction), expected, epsilon = 1e-2);
}

#[test]
fn test_convex_hull_is_recentered() {
    let centered = Shape::convex_hull(tilted_cube(0.5, Vector3::ZERO)).unwrap();
    let shifted = Shape::convex_hull(tilted_cube(0.5, Vector3::new(5.0, 0.0, 0.0))).unwrap();

    for direction in [Vector3::unit_x(), Vector3::new(-0.4, 0.2, 0.9), -Vector3::unit_y()] {
        assert_relative_eq!(
            shifted.support_mapping(direction),
            centered.support_mapping(direction),
            epsilon = 1e-3
        );
    }
    assert_relative_eq!(shifted.get_mass(), centered.get_mass(), max_relative = 1e-3);
}

#[test]
fn test_compound_recenters_on_mass() {
    let part = |x: f32| {
        TransformedShape::new(
            Shape::cuboid(Vector3::one()).unwrap(),
            Matrix3::identity(),
            Vector3::new(x, 0.0, 0.0),
        )
    };
    let shape = Shape::compound(vec![part(0.0), part(2.0)]).unwrap();

    let ShapeKind::Compound(compound) = shape.kind() else {
        panic!("expected a compound, got {}", shape.kind().name());
    };
    assert_relative_eq!(compound.shift(), Vector3::new(1.0, 0.0, 0.0));
    assert_relative_eq!(compound.parts()[0].position(), Vector3::new(-1.0, 0.0, 0.0));
    assert_relative_eq!(compound.parts()[1].position(), Vector3::new(1.0, 0.0, 0.0));

    assert_relative_eq!(shape.get_mass(), 2.0);
    let inertia = shape.get_inertia().diagonal();
    assert_relative_eq!(inertia.x, 2.0 / 6.0, epsilon = 1e-4);
    assert_relative_eq!(inertia.y, 2.0 / 6.0 + 2.0, epsilon = 1e-4);

    let bounds = shape.get_bounding_box();
    assert_relative_eq!(bounds.min, Vector3::new(-1.5, -0.5, -0.5), epsilon = 1e-5);
    assert_relative_eq!(bounds.max, Vector3::new(1.5, 0.5, 0.5), epsilon = 1e-5);
}

#[test]
fn test_compound_rejects_nested_multishape() {
    let terrain = Shape::terrain(vec![vec![0.0; 3]; 3], 1.0, 1.0).unwrap();
    let part = TransformedShape::new(terrain, Matrix3::identity(), Vector3::ZERO);
    assert!(Shape::compound(vec![part]).is_err());
}

#[test]
fn test_minkowski_sum_of_box_and_sphere() {
    let sum = Shape::minkowski_sum(vec![
        Shape::cuboid(Vector3::splat(2.0)).unwrap(),
        Shape::sphere(0.5).unwrap(),
    ])
    .unwrap();

    let support = sum.support_mapping(Vector3::unit_x());
    assert_relative_eq!(support.x, 1.5, epsilon = 1e-4);

    let bounds = sum.get_bounding_box();
    assert_relative_eq!(bounds.max.y, 1.5, epsilon = 1e-3);
}

#[test]
fn test_multishape_kinds() {
    let terrain = Shape::terrain(vec![vec![0.0, 1.0], vec![0.5, 0.0]], 1.0, 1.0).unwrap();
    assert!(terrain.is_multishape());
    assert_eq!(terrain.kind().name(), "terrain");

    let mesh = Shape::triangle_mesh(
        vec![Vector3::ZERO, Vector3::unit_x(), Vector3::unit_z()],
        vec![[0, 1, 2]],
    )
    .unwrap();
    assert!(mesh.is_multishape());
    assert!(!Shape::sphere(1.0).unwrap().is_multishape());
}

#[test]
fn test_hull_triangles_enclose_sphere() {
    let sphere = Shape::sphere(1.0).unwrap();
    let triangles = sphere.make_hull(3);
    assert!(!triangles.is_empty());
    assert_eq!(triangles.len() % 3, 0);
    for p in triangles {
        assert_relative_eq!(p.length(), 1.0, epsilon = 1e-4);
    }
}

#[test]
fn test_shared_shape_edit_is_visible() {
    let shared = Shape::cuboid(Vector3::one()).unwrap().into_shared();
    let before = shared.read().generation();

    shared
        .write()
        .edit(|kind| {
            if let ShapeKind::Box(b) = kind {
                b.set_size(Vector3::splat(2.0));
            }
            Ok(())
        })
        .unwrap();

    let shape = shared.read();
    assert!(shape.generation() > before);
    assert_relative_eq!(shape.get_mass(), 8.0);
}
