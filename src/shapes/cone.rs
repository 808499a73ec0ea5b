use std::f32::consts::PI;

use crate::error::PhysicsError;
use crate::math::{Aabb, Matrix3, Vector3};
use crate::shapes::{MassProperties, SupportMapping};
use crate::Result;

/// A cone along the local y axis with its origin at the center of mass:
/// the apex sits at `2h/3`, the base disc at `-h/3`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeShape {
    height: f32,
    radius: f32,
    /// Sine of the half-angle at the apex
    sin_alpha: f32,
}

impl ConeShape {
    /// Creates a new cone with the given height and base radius
    pub fn new(height: f32, radius: f32) -> Self {
        let mut cone = Self { height, radius, sin_alpha: 0.0 };
        cone.update_angle();
        cone
    }

    /// Returns the height of the cone
    pub fn get_height(&self) -> f32 {
        self.height
    }

    /// Sets the height of the cone
    pub fn set_height(&mut self, height: f32) {
        self.height = height;
        self.update_angle();
    }

    /// Returns the base radius of the cone
    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    /// Sets the base radius of the cone
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
        self.update_angle();
    }

    fn update_angle(&mut self) {
        let slant = (self.radius * self.radius + self.height * self.height).sqrt();
        self.sin_alpha = if slant > 0.0 { self.radius / slant } else { 0.0 };
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.height > 0.0 && self.radius > 0.0) || !(self.height * self.radius).is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "cone height and radius must be positive, got {} and {}",
                self.height, self.radius
            )));
        }
        Ok(())
    }

    /// Exact box: per world axis the extreme is either the apex or a point
    /// on the base rim.
    pub(crate) fn bounding_box(&self, orientation: &Matrix3) -> Aabb {
        let apex = 2.0 / 3.0 * self.height;
        let base = -self.height / 3.0;
        let mut min = Vector3::ZERO;
        let mut max = Vector3::ZERO;
        for axis in 0..3 {
            let row = orientation.row(axis);
            let tip = row.y * apex;
            let center = row.y * base;
            let rim = self.radius * (row.x * row.x + row.z * row.z).sqrt();
            max[axis] = tip.max(center + rim);
            min[axis] = tip.min(center - rim);
        }
        Aabb::new(min, max)
    }

    pub(crate) fn mass_properties(&self) -> MassProperties {
        let (r, h) = (self.radius, self.height);
        let mass = PI * r * r * h / 3.0;
        let side = 3.0 / 80.0 * mass * (4.0 * r * r + h * h);
        MassProperties {
            mass,
            center: Vector3::ZERO,
            inertia: Matrix3::from_diagonal(Vector3::new(side, 0.3 * mass * r * r, side)),
        }
    }
}

impl SupportMapping for ConeShape {
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        let sigma = (direction.x * direction.x + direction.z * direction.z).sqrt();
        if direction.y > direction.length() * self.sin_alpha {
            Vector3::new(0.0, 2.0 / 3.0 * self.height, 0.0)
        } else if sigma > 0.0 {
            Vector3::new(
                self.radius * direction.x / sigma,
                -self.height / 3.0,
                self.radius * direction.z / sigma,
            )
        } else {
            Vector3::new(0.0, -self.height / 3.0, 0.0)
        }
    }

    fn support_center(&self) -> Vector3 {
        Vector3::ZERO
    }
}
