use crate::error::PhysicsError;
use crate::math::{Aabb, Matrix3, Vector3};
use crate::shapes::{hull, sign, MassProperties, SupportMapping};
use crate::Result;

/// A box (cuboid) collision shape centered on its origin
#[derive(Debug, Clone, PartialEq)]
pub struct BoxShape {
    /// Full edge lengths of the box
    size: Vector3,
    half_size: Vector3,
}

impl BoxShape {
    /// Creates a new box with the given full dimensions
    pub fn new(size: Vector3) -> Self {
        Self { size, half_size: size * 0.5 }
    }

    /// Creates a new box with the given full dimensions
    pub fn new_with_dimensions(width: f32, height: f32, depth: f32) -> Self {
        Self::new(Vector3::new(width, height, depth))
    }

    /// Returns the full dimensions of the box
    pub fn get_size(&self) -> Vector3 {
        self.size
    }

    /// Sets the full dimensions of the box
    pub fn set_size(&mut self, size: Vector3) {
        self.size = size;
        self.half_size = size * 0.5;
    }

    /// Returns the half-extents of the box
    pub fn get_half_extents(&self) -> Vector3 {
        self.half_size
    }

    /// Returns the 8 vertices of the box in local space
    pub fn get_vertices(&self) -> [Vector3; 8] {
        Aabb::from_center_half_extents(Vector3::ZERO, self.half_size).corners()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let s = self.size;
        if !(s.x > 0.0 && s.y > 0.0 && s.z > 0.0) || !s.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "box size must be positive, got {}",
                s
            )));
        }
        Ok(())
    }

    pub(crate) fn bounding_box(&self, orientation: &Matrix3) -> Aabb {
        let half = orientation.absolute().multiply_vector(self.half_size);
        Aabb::new(-half, half)
    }

    pub(crate) fn mass_properties(&self) -> MassProperties {
        hull::box_mass_properties(self.size)
    }
}

impl SupportMapping for BoxShape {
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        Vector3::new(
            sign(direction.x) * self.half_size.x,
            sign(direction.y) * self.half_size.y,
            sign(direction.z) * self.half_size.z,
        )
    }

    fn support_center(&self) -> Vector3 {
        Vector3::ZERO
    }
}
