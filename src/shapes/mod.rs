mod shape;
mod box_shape;
mod sphere;
mod cylinder;
mod cone;
mod convex_hull;
mod compound;
mod minkowski_sum;
mod terrain;
mod mesh;
mod multishape;
pub mod hull;

pub use self::shape::{Shape, ShapeKind, SharedShape};
pub use self::box_shape::BoxShape;
pub use self::sphere::SphereShape;
pub use self::cylinder::CylinderShape;
pub use self::cone::ConeShape;
pub use self::convex_hull::ConvexHullShape;
pub use self::compound::{CompoundShape, TransformedShape};
pub use self::minkowski_sum::MinkowskiSumShape;
pub use self::terrain::TerrainShape;
pub use self::mesh::TriangleMeshShape;
pub use self::multishape::WorkingClone;
pub use self::hull::{calculate_mass_inertia, make_hull};

pub(crate) use self::multishape::{CloneArena, CloneState};

use crate::math::{Matrix3, Vector3};

/// The one primitive every convex collision query is built on.
pub trait SupportMapping {
    /// Returns the point of the shape furthest along `direction`, in the
    /// shape's local frame. `direction` need not be normalized.
    fn support_mapping(&self, direction: Vector3) -> Vector3;

    /// A point strictly inside the shape, used to seed the collision
    /// algorithms.
    fn support_center(&self) -> Vector3;
}

/// Mass, center of mass and inertia (about the center of mass) at unit density
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub mass: f32,
    pub center: Vector3,
    pub inertia: Matrix3,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            center: Vector3::ZERO,
            inertia: Matrix3::identity(),
        }
    }
}

#[inline]
pub(crate) fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Index of the point with the largest projection onto `direction`
pub(crate) fn farthest_point(points: &[Vector3], direction: Vector3) -> Option<usize> {
    let mut best = None;
    let mut best_dot = f32::NEG_INFINITY;
    for (i, p) in points.iter().enumerate() {
        let dot = p.dot(&direction);
        if dot > best_dot {
            best_dot = dot;
            best = Some(i);
        }
    }
    best
}
