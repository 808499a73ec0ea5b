use std::f32::consts::PI;

use crate::error::PhysicsError;
use crate::math::{Aabb, Matrix3, Vector3};
use crate::shapes::{sign, MassProperties, SupportMapping};
use crate::Result;

/// A cylinder aligned with the local y axis and centered on its origin
#[derive(Debug, Clone, PartialEq)]
pub struct CylinderShape {
    height: f32,
    radius: f32,
}

impl CylinderShape {
    /// Creates a new cylinder with the given height and radius
    pub fn new(height: f32, radius: f32) -> Self {
        Self { height, radius }
    }

    /// Returns the height of the cylinder
    pub fn get_height(&self) -> f32 {
        self.height
    }

    /// Sets the height of the cylinder
    pub fn set_height(&mut self, height: f32) {
        self.height = height;
    }

    /// Returns the radius of the cylinder
    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    /// Sets the radius of the cylinder
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.height > 0.0 && self.radius > 0.0) || !(self.height * self.radius).is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "cylinder height and radius must be positive, got {} and {}",
                self.height, self.radius
            )));
        }
        Ok(())
    }

    /// Exact box: the cap disc contributes `r * sqrt(rx^2 + rz^2)` along a
    /// world axis whose local direction is `(rx, ry, rz)`.
    pub(crate) fn bounding_box(&self, orientation: &Matrix3) -> Aabb {
        let mut half = Vector3::ZERO;
        for axis in 0..3 {
            let row = orientation.row(axis);
            half[axis] = row.y.abs() * self.height * 0.5
                + self.radius * (row.x * row.x + row.z * row.z).sqrt();
        }
        Aabb::new(-half, half)
    }

    pub(crate) fn mass_properties(&self) -> MassProperties {
        let (r, h) = (self.radius, self.height);
        let mass = PI * r * r * h;
        let side = 0.25 * mass * r * r + mass * h * h / 12.0;
        MassProperties {
            mass,
            center: Vector3::ZERO,
            inertia: Matrix3::from_diagonal(Vector3::new(side, 0.5 * mass * r * r, side)),
        }
    }
}

impl SupportMapping for CylinderShape {
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        let sigma = (direction.x * direction.x + direction.z * direction.z).sqrt();
        let y = sign(direction.y) * self.height * 0.5;
        if sigma > 0.0 {
            Vector3::new(direction.x / sigma * self.radius, y, direction.z / sigma * self.radius)
        } else {
            Vector3::new(0.0, y, 0.0)
        }
    }

    fn support_center(&self) -> Vector3 {
        Vector3::ZERO
    }
}
