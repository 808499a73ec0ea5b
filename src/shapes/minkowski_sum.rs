use crate::error::PhysicsError;
use crate::math::Vector3;
use crate::shapes::{hull, MassProperties, Shape, SupportMapping};
use crate::Result;

/// Minkowski sum of convex shapes, e.g. a box swept by a sphere gives a
/// rounded box. Re-centered on its center of mass.
#[derive(Debug, Clone)]
pub struct MinkowskiSumShape {
    shapes: Vec<Shape>,
    shift: Vector3,
}

impl MinkowskiSumShape {
    /// Creates the sum of the given shapes. Fails on multishapes.
    pub fn new(shapes: Vec<Shape>) -> Result<Self> {
        let mut sum = Self { shapes: Vec::new(), shift: Vector3::ZERO };
        for shape in shapes {
            sum.add_shape(shape)?;
        }
        Ok(sum)
    }

    /// Adds a convex shape to the sum
    pub fn add_shape(&mut self, shape: Shape) -> Result<()> {
        if shape.is_multishape() {
            return Err(PhysicsError::UnsupportedShape(
                "multishapes are not supported by a Minkowski sum".into(),
            ));
        }
        self.shapes.push(shape);
        Ok(())
    }

    /// Removes the shape at `index`; the last remaining shape can't be removed
    pub fn remove_shape(&mut self, index: usize) -> Result<Shape> {
        if self.shapes.len() <= 1 {
            return Err(PhysicsError::InvalidOperation(
                "a Minkowski sum needs at least one shape".into(),
            ));
        }
        if index >= self.shapes.len() {
            return Err(PhysicsError::ResourceNotFound(format!(
                "no shape at index {} in Minkowski sum",
                index
            )));
        }
        Ok(self.shapes.remove(index))
    }

    /// The summed shapes
    pub fn get_shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Offset subtracted from the raw sum to center it on its mass
    pub fn shift(&self) -> Vector3 {
        self.shift
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.shapes.is_empty() {
            return Err(PhysicsError::InvalidParameter(
                "a Minkowski sum needs at least one shape".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn recenter(&mut self) {
        self.shift = Vector3::ZERO;
        self.shift = hull::calculate_mass_inertia(self).center;
    }

    pub(crate) fn mass_properties(&self) -> MassProperties {
        hull::calculate_mass_inertia(self)
    }
}

impl SupportMapping for MinkowskiSumShape {
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        let sum = self
            .shapes
            .iter()
            .fold(Vector3::ZERO, |acc, s| acc + s.support_mapping(direction));
        sum - self.shift
    }

    fn support_center(&self) -> Vector3 {
        Vector3::ZERO
    }
}
