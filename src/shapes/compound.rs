use crate::error::PhysicsError;
use crate::math::{Aabb, ContainmentType, Matrix3, Vector3};
use crate::shapes::{CloneState, MassProperties, Shape, SupportMapping};
use crate::Result;

/// A convex shape placed inside a compound
#[derive(Debug, Clone)]
pub struct TransformedShape {
    shape: Shape,
    position: Vector3,
    orientation: Matrix3,
    bounding_box: Aabb,
}

impl TransformedShape {
    /// Places `shape` at `position` with `orientation` in compound space
    pub fn new(shape: Shape, orientation: Matrix3, position: Vector3) -> Self {
        let mut part = Self {
            shape,
            position,
            orientation,
            bounding_box: Aabb::SMALL,
        };
        part.update_bounding_box();
        part
    }

    /// The placed shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Position in compound space
    pub fn position(&self) -> Vector3 {
        self.position
    }

    /// Sets the position in compound space
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.update_bounding_box();
    }

    /// Orientation in compound space
    pub fn orientation(&self) -> Matrix3 {
        self.orientation
    }

    /// Sets the orientation in compound space
    pub fn set_orientation(&mut self, orientation: Matrix3) {
        self.orientation = orientation;
        self.update_bounding_box();
    }

    /// Bounds in compound space
    pub fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    fn update_bounding_box(&mut self) {
        self.bounding_box = self.shape.bounding_box(&self.orientation).translated(self.position);
    }

    fn support(&self, direction: Vector3) -> Vector3 {
        let local = self.orientation.transpose_multiply_vector(direction);
        self.orientation * self.shape.support_mapping(local) + self.position
    }

    fn mass_center(&self) -> Vector3 {
        self.orientation * self.shape.get_geometric_center() + self.position
    }
}

/// A rigid assembly of convex shapes, re-centered so its mass-weighted
/// centroid is the local origin.
#[derive(Debug, Clone)]
pub struct CompoundShape {
    parts: Vec<TransformedShape>,
    shift: Vector3,
    internal_box: Aabb,
}

impl CompoundShape {
    /// Builds a compound; multishape parts are rejected
    pub fn new(parts: Vec<TransformedShape>) -> Result<Self> {
        let compound = Self {
            parts,
            shift: Vector3::ZERO,
            internal_box: Aabb::SMALL,
        };
        compound.validate()?;
        Ok(compound)
    }

    /// The parts, positioned relative to the center of mass
    pub fn parts(&self) -> &[TransformedShape] {
        &self.parts
    }

    /// Mutable access for repositioning parts inside [`Shape::edit`]
    pub fn parts_mut(&mut self) -> &mut Vec<TransformedShape> {
        &mut self.parts
    }

    /// Total offset removed by re-centering; a part's original position is
    /// `part.position() + shift()`.
    pub fn shift(&self) -> Vector3 {
        self.shift
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.parts.is_empty() {
            return Err(PhysicsError::InvalidParameter("a compound needs at least one part".into()));
        }
        if self.parts.iter().any(|p| p.shape.is_multishape()) {
            return Err(PhysicsError::UnsupportedShape(
                "multishapes can't be nested in a compound".into(),
            ));
        }
        Ok(())
    }

    /// Moves the parts so their mass-weighted centroid is the origin
    pub(crate) fn recenter(&mut self) {
        let total: f32 = self.parts.iter().map(|p| p.shape.get_mass()).sum();
        let centroid = if total > 0.0 {
            self.parts
                .iter()
                .fold(Vector3::ZERO, |acc, p| acc + p.mass_center() * p.shape.get_mass())
                / total
        } else {
            self.parts.iter().fold(Vector3::ZERO, |acc, p| acc + p.position) / self.parts.len() as f32
        };

        self.internal_box = Aabb::SMALL;
        for part in &mut self.parts {
            part.set_position(part.position - centroid);
            self.internal_box = self.internal_box.merged(&part.bounding_box);
        }
        self.shift += centroid;
    }

    pub(crate) fn bounding_box(&self, orientation: &Matrix3) -> Aabb {
        self.internal_box.transform(orientation)
    }

    pub(crate) fn mass_properties(&self) -> MassProperties {
        let mut mass = 0.0;
        let mut inertia = Matrix3::zero();

        for part in &self.parts {
            let m = part.shape.get_mass();
            let r = part.orientation;
            let p = part.mass_center();

            // Rotate into compound space, then shift to the compound origin.
            inertia += r * part.shape.get_inertia() * r.transpose();
            inertia += (Matrix3::from_scale(p.length_squared()) - Matrix3::outer(p, p)).scale(m);
            mass += m;
        }

        MassProperties { mass, center: Vector3::ZERO, inertia }
    }

    pub(crate) fn make_hull(&self) -> Vec<Vector3> {
        self.parts
            .iter()
            .flat_map(|part| {
                part.shape
                    .make_hull(crate::shapes::hull::DEFAULT_HULL_GENERATION)
                    .into_iter()
                    .map(move |v| part.orientation * v + part.position)
            })
            .collect()
    }

    pub(crate) fn prepare(&self, state: &mut CloneState, region: &Aabb) -> usize {
        state.candidates.clear();
        state.candidates.extend(
            self.parts
                .iter()
                .enumerate()
                .filter(|(_, p)| p.bounding_box.contains(region) != ContainmentType::Disjoint)
                .map(|(i, _)| i),
        );
        state.candidates.len()
    }

    pub(crate) fn prepare_ray(&self, state: &mut CloneState, origin: Vector3, delta: Vector3) -> usize {
        let mut region = Aabb::new(origin, origin);
        region.add_point(origin + delta);
        self.prepare(state, &region)
    }

    pub(crate) fn set_current(&self, state: &mut CloneState, index: usize) {
        if let Some(&part) = state.candidates.get(index) {
            state.current = part;
            let p = &self.parts[part];
            state.center = p.orientation * p.shape.support_center() + p.position;
        }
    }

    pub(crate) fn current_support(&self, state: &CloneState, direction: Vector3) -> Vector3 {
        match self.parts.get(state.current) {
            Some(part) => part.support(direction),
            None => Vector3::ZERO,
        }
    }
}

impl SupportMapping for CompoundShape {
    /// Support of the whole assembly (its convex hull)
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        let mut best = Vector3::ZERO;
        let mut best_dot = f32::NEG_INFINITY;
        for part in &self.parts {
            let s = part.support(direction);
            let d = s.dot(&direction);
            if d > best_dot {
                best_dot = d;
                best = s;
            }
        }
        best
    }

    fn support_center(&self) -> Vector3 {
        Vector3::ZERO
    }
}
