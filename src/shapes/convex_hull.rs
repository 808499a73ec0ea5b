use crate::error::PhysicsError;
use crate::math::Vector3;
use crate::shapes::{farthest_point, hull, MassProperties, SupportMapping};
use crate::Result;

/// Convex hull of a point cloud.
///
/// The points are kept as given; the shape is re-centered on the hull's
/// center of mass and the offset is available through [`shift`](Self::shift).
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexHullShape {
    points: Vec<Vector3>,
    shift: Vector3,
}

impl ConvexHullShape {
    /// Creates a hull from a set of points
    pub fn new(points: Vec<Vector3>) -> Self {
        Self { points, shift: Vector3::ZERO }
    }

    /// Returns the input points
    pub fn get_points(&self) -> &[Vector3] {
        &self.points
    }

    /// Replaces the input points
    pub fn set_points(&mut self, points: Vec<Vector3>) {
        self.points = points;
    }

    /// Offset from the input points' frame to the shape's local frame;
    /// an input point `p` ends up at `p - shift()`.
    pub fn shift(&self) -> Vector3 {
        self.shift
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.points.len() < 4 {
            return Err(PhysicsError::InvalidParameter(format!(
                "a convex hull needs at least 4 points, got {}",
                self.points.len()
            )));
        }
        if self.points.iter().any(|p| !p.is_finite()) {
            return Err(PhysicsError::InvalidParameter("convex hull point is not finite".into()));
        }
        Ok(())
    }

    /// Moves the local origin onto the center of mass
    pub(crate) fn recenter(&mut self) -> Result<()> {
        self.shift = Vector3::ZERO;
        let props = hull::calculate_mass_inertia(self);
        if !(props.mass > 0.0) {
            return Err(PhysicsError::InvalidParameter(
                "convex hull points are coplanar".into(),
            ));
        }
        self.shift = props.center;
        Ok(())
    }

    pub(crate) fn mass_properties(&self) -> MassProperties {
        hull::calculate_mass_inertia(self)
    }
}

impl SupportMapping for ConvexHullShape {
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        farthest_point(&self.points, direction)
            .map(|i| self.points[i] - self.shift)
            .unwrap_or(Vector3::ZERO)
    }

    fn support_center(&self) -> Vector3 {
        Vector3::ZERO
    }
}
