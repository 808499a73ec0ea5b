//! Support-mapping driven geometry: hull triangulation, mass integration
//! and the six-query bounding box.

use crate::math::{Aabb, Matrix3, Vector3, COLLISION_EPSILON};
use crate::shapes::{MassProperties, SupportMapping};

/// Default subdivision depth used when none is given
pub const DEFAULT_HULL_GENERATION: i32 = 4;

/// Subdivision depth used for mass integration
pub const MASS_HULL_GENERATION: i32 = 3;

const OCTAHEDRON: [Vector3; 6] = [
    Vector3::new(-1.0, 0.0, 0.0),
    Vector3::new(1.0, 0.0, 0.0),
    Vector3::new(0.0, -1.0, 0.0),
    Vector3::new(0.0, 1.0, 0.0),
    Vector3::new(0.0, 0.0, -1.0),
    Vector3::new(0.0, 0.0, 1.0),
];

const OCTAHEDRON_FACES: [[usize; 3]; 8] = [
    [5, 1, 3],
    [4, 3, 1],
    [3, 4, 0],
    [0, 5, 3],
    [5, 2, 1],
    [4, 1, 2],
    [2, 0, 4],
    [0, 2, 5],
];

#[derive(Clone, Copy)]
struct ClipTriangle {
    n1: Vector3,
    n2: Vector3,
    n3: Vector3,
    generation: i32,
}

/// Triangulates the surface of a convex shape by recursively subdividing an
/// octahedron of search directions and sampling the support mapping at each
/// vertex. Returns a flat list, three points per triangle, wound so the
/// triangles face outward.
///
/// A negative `generation_threshold` selects [`DEFAULT_HULL_GENERATION`].
pub fn make_hull(shape: &dyn SupportMapping, generation_threshold: i32) -> Vec<Vector3> {
    let threshold = if generation_threshold < 0 {
        DEFAULT_HULL_GENERATION
    } else {
        generation_threshold
    };

    let mut active: Vec<ClipTriangle> = OCTAHEDRON_FACES
        .iter()
        .map(|[a, b, c]| ClipTriangle {
            n1: OCTAHEDRON[*a],
            n2: OCTAHEDRON[*b],
            n3: OCTAHEDRON[*c],
            generation: 0,
        })
        .collect();

    let mut triangles = Vec::new();

    while let Some(tri) = active.pop() {
        let p1 = shape.support_mapping(tri.n1);
        let p2 = shape.support_mapping(tri.n2);
        let p3 = shape.support_mapping(tri.n3);

        let longest = (p2 - p1)
            .length_squared()
            .max((p3 - p2).length_squared())
            .max((p1 - p3).length_squared());

        if longest > 0.0 && tri.generation < threshold {
            let m12 = ((tri.n1 + tri.n2) * 0.5).normalize();
            let m23 = ((tri.n2 + tri.n3) * 0.5).normalize();
            let m31 = ((tri.n3 + tri.n1) * 0.5).normalize();
            let generation = tri.generation + 1;

            active.push(ClipTriangle { n1: tri.n1, n2: m12, n3: m31, generation });
            active.push(ClipTriangle { n1: m12, n2: tri.n2, n3: m23, generation });
            active.push(ClipTriangle { n1: m31, n2: m23, n3: tri.n3, generation });
            active.push(ClipTriangle { n1: m23, n2: m31, n3: m12, generation });
        } else if (p3 - p1).cross(&(p2 - p1)).length_squared() > COLLISION_EPSILON {
            triangles.push(p1);
            triangles.push(p2);
            triangles.push(p3);
        }
    }

    triangles
}

/// Integrates mass, center of mass and inertia (about the center of mass)
/// of a closed, outward-wound triangle hull at unit density.
///
/// Each triangle forms a tetrahedron with the origin; the canonical
/// tetrahedron's inertia is mapped onto it through the triangle's vertex
/// matrix, weighted by that matrix's determinant.
pub fn integrate_hull(triangles: &[Vector3]) -> MassProperties {
    const A: f32 = 1.0 / 60.0;
    const B: f32 = 1.0 / 120.0;
    let canonical = Matrix3::new([[A, B, B], [B, A, B], [B, B, A]]);

    let mut mass = 0.0;
    let mut center = Vector3::ZERO;
    let mut covariance = Matrix3::zero();

    for tri in triangles.chunks_exact(3) {
        let a = Matrix3::from_columns(tri[0], tri[1], tri[2]);
        let det = a.determinant();

        covariance += (a * canonical * a.transpose()).scale(det);

        let tetra_mass = det / 6.0;
        center += (tri[0] + tri[1] + tri[2]) * 0.25 * tetra_mass;
        mass += tetra_mass;
    }

    let mut inertia = Matrix3::from_scale(covariance.trace()) - covariance;
    if mass.abs() > f32::EPSILON {
        center /= mass;
    }

    // Huygens-Steiner: move the inertia from the origin to the center of mass.
    let Vector3 { x, y, z } = center;
    let shift = Matrix3::new([
        [-mass * (y * y + z * z), mass * x * y, mass * x * z],
        [mass * y * x, -mass * (z * z + x * x), mass * y * z],
        [mass * z * x, mass * z * y, -mass * (x * x + y * y)],
    ]);
    inertia += shift;

    MassProperties { mass, center, inertia }
}

/// Mass properties of any convex support mapping, from a depth-3 hull.
pub fn calculate_mass_inertia(shape: &dyn SupportMapping) -> MassProperties {
    integrate_hull(&make_hull(shape, MASS_HULL_GENERATION))
}

/// Bounding box of a support mapping under `orientation`, relative to the
/// shape origin. Six support queries: the world axes expressed in local
/// space are the rows of the orientation matrix.
pub fn support_bounding_box(shape: &dyn SupportMapping, orientation: &Matrix3) -> Aabb {
    let mut min = Vector3::ZERO;
    let mut max = Vector3::ZERO;

    for axis in 0..3 {
        let row = orientation.row(axis);
        max[axis] = row.dot(&shape.support_mapping(row));
        min[axis] = row.dot(&shape.support_mapping(-row));
    }

    Aabb::new(min, max)
}

/// Box-shaped approximation used for shapes without a closed volume
pub(crate) fn box_mass_properties(size: Vector3) -> MassProperties {
    let mass = size.x * size.y * size.z;
    let (x2, y2, z2) = (size.x * size.x, size.y * size.y, size.z * size.z);
    MassProperties {
        mass,
        center: Vector3::ZERO,
        inertia: Matrix3::from_diagonal(Vector3::new(y2 + z2, x2 + z2, x2 + y2) * (mass / 12.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Cuboid(Vector3);

    impl SupportMapping for Cuboid {
        fn support_mapping(&self, d: Vector3) -> Vector3 {
            let s = |v: f32, h: f32| if v > 0.0 { h } else if v < 0.0 { -h } else { 0.0 };
            Vector3::new(s(d.x, self.0.x), s(d.y, self.0.y), s(d.z, self.0.z))
        }

        fn support_center(&self) -> Vector3 {
            Vector3::ZERO
        }
    }

    #[test]
    fn test_hull_of_box_integrates_to_box_volume() {
        let props = calculate_mass_inertia(&Cuboid(Vector3::new(1.0, 1.0, 1.0)));
        assert_relative_eq!(props.mass, 8.0, max_relative = 1.0e-3);
        assert_relative_eq!(props.center, Vector3::ZERO, epsilon = 1.0e-4);
        assert_relative_eq!(props.inertia.data[0][0], 8.0 * 8.0 / 12.0, max_relative = 1.0e-2);
    }

    #[test]
    fn test_support_box_rotated() {
        let r = Matrix3::from_axis_angle(Vector3::unit_y(), std::f32::consts::FRAC_PI_4);
        let b = support_bounding_box(&Cuboid(Vector3::new(1.0, 1.0, 1.0)), &r);
        assert_relative_eq!(b.max.x, std::f32::consts::SQRT_2, epsilon = 1.0e-5);
        assert_relative_eq!(b.max.y, 1.0, epsilon = 1.0e-5);
        assert_relative_eq!(b.min.z, -std::f32::consts::SQRT_2, epsilon = 1.0e-5);
    }

    #[test]
    fn test_hull_skips_degenerate_triangles() {
        let hull = make_hull(&Cuboid(Vector3::new(1.0, 1.0, 1.0)), 2);
        assert_eq!(hull.len() % 3, 0);
        for tri in hull.chunks_exact(3) {
            assert!((tri[2] - tri[0]).cross(&(tri[1] - tri[0])).length_squared() > 0.0);
        }
    }
}
