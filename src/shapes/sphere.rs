use std::f32::consts::PI;

use crate::error::PhysicsError;
use crate::math::{Aabb, Matrix3, Vector3};
use crate::shapes::{MassProperties, SupportMapping};
use crate::Result;

/// A spherical collision shape
#[derive(Debug, Clone, PartialEq)]
pub struct SphereShape {
    /// The radius of the sphere
    radius: f32,
}

impl SphereShape {
    /// Creates a new sphere with the given radius
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    /// Returns the radius of the sphere
    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    /// Sets the radius of the sphere
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.radius > 0.0) || !self.radius.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "sphere radius must be positive, got {}",
                self.radius
            )));
        }
        Ok(())
    }

    /// Rotation doesn't change a sphere's box.
    pub(crate) fn bounding_box(&self, _orientation: &Matrix3) -> Aabb {
        let r = Vector3::splat(self.radius);
        Aabb::new(-r, r)
    }

    pub(crate) fn mass_properties(&self) -> MassProperties {
        let mass = 4.0 / 3.0 * PI * self.radius.powi(3);
        MassProperties {
            mass,
            center: Vector3::ZERO,
            inertia: Matrix3::from_scale(0.4 * mass * self.radius * self.radius),
        }
    }
}

impl SupportMapping for SphereShape {
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        direction.normalize() * self.radius
    }

    fn support_center(&self) -> Vector3 {
        Vector3::ZERO
    }
}
