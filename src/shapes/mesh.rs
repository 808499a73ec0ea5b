use crate::error::PhysicsError;
use crate::math::{Aabb, Matrix3, Vector3};
use crate::shapes::terrain::triangle_support;
use crate::shapes::{farthest_point, hull, CloneState, MassProperties, SupportMapping};
use crate::Result;

/// An indexed triangle soup. Queries filter triangles by their bounding
/// boxes, then impersonate one triangle at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMeshShape {
    vertices: Vec<Vector3>,
    triangles: Vec<[usize; 3]>,
    triangle_boxes: Vec<Aabb>,
    root_box: Aabb,
    spherical_expansion: f32,
    flip_normals: bool,
}

impl TriangleMeshShape {
    /// Creates a mesh from vertices and counter-clockwise index triples
    pub fn new(vertices: Vec<Vector3>, triangles: Vec<[usize; 3]>) -> Self {
        let mut mesh = Self {
            vertices,
            triangles,
            triangle_boxes: Vec::new(),
            root_box: Aabb::SMALL,
            spherical_expansion: 0.05,
            flip_normals: false,
        };
        mesh.rebuild_boxes();
        mesh
    }

    pub fn vertices(&self) -> &[Vector3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Margin added around every triangle for robust contacts
    pub fn spherical_expansion(&self) -> f32 {
        self.spherical_expansion
    }

    pub fn set_spherical_expansion(&mut self, expansion: f32) {
        self.spherical_expansion = expansion;
    }

    /// Whether reported triangle normals are negated
    pub fn flip_normals(&self) -> bool {
        self.flip_normals
    }

    pub fn set_flip_normals(&mut self, flip: bool) {
        self.flip_normals = flip;
    }

    fn rebuild_boxes(&mut self) {
        let vertices = &self.vertices;
        self.triangle_boxes = self
            .triangles
            .iter()
            .map(|t| {
                let corners: Vec<Vector3> = t.iter().filter_map(|&i| vertices.get(i).copied()).collect();
                Aabb::from_points(&corners).unwrap_or(Aabb::SMALL)
            })
            .collect();
        self.root_box = self
            .triangle_boxes
            .iter()
            .fold(Aabb::SMALL, |acc, b| acc.merged(b));
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.triangles.is_empty() {
            return Err(PhysicsError::InvalidParameter("a triangle mesh needs at least one triangle".into()));
        }
        let n = self.vertices.len();
        if let Some(bad) = self.triangles.iter().flatten().find(|&&i| i >= n) {
            return Err(PhysicsError::InvalidParameter(format!(
                "triangle index {} out of range for {} vertices",
                bad, n
            )));
        }
        if self.vertices.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::InvalidParameter("mesh vertex is not finite".into()));
        }
        Ok(())
    }

    /// Called from `Shape::update_shape` so edits through `Shape::edit`
    /// refresh the per-triangle boxes.
    pub(crate) fn refresh(&mut self) {
        self.rebuild_boxes();
    }

    fn triangle(&self, index: usize) -> [Vector3; 3] {
        let [a, b, c] = self.triangles[index];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    pub(crate) fn bounding_box(&self, orientation: &Matrix3) -> Aabb {
        self.root_box.expand(self.spherical_expansion).transform(orientation)
    }

    /// Meshes are approximated by the solid box around them
    pub(crate) fn mass_properties(&self) -> MassProperties {
        hull::box_mass_properties(self.root_box.extents())
    }

    pub(crate) fn make_hull(&self) -> Vec<Vector3> {
        (0..self.triangles.len()).flat_map(|i| self.triangle(i)).collect()
    }

    pub(crate) fn prepare(&self, state: &mut CloneState, region: &Aabb) -> usize {
        let region = region.expand(self.spherical_expansion);
        state.candidates.clear();
        state.candidates.extend(
            self.triangle_boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.intersects(&region))
                .map(|(i, _)| i),
        );
        state.candidates.len()
    }

    pub(crate) fn prepare_ray(&self, state: &mut CloneState, origin: Vector3, delta: Vector3) -> usize {
        let expanded = delta + delta.normalize() * self.spherical_expansion;
        state.candidates.clear();
        state.candidates.extend(
            self.triangle_boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.expand(self.spherical_expansion).segment_intersect(origin, expanded))
                .map(|(i, _)| i),
        );
        state.candidates.len()
    }

    pub(crate) fn set_current(&self, state: &mut CloneState, index: usize) {
        let Some(&tri) = state.candidates.get(index) else {
            return;
        };
        let points = self.triangle(tri);
        state.current = tri;
        state.triangle = points;
        state.center = (points[0] + points[1] + points[2]) * (1.0 / 3.0);

        let normal = (points[1] - points[0]).cross(&(points[2] - points[0])).normalize();
        state.normal = if self.flip_normals { -normal } else { normal };
    }

    pub(crate) fn current_support(&self, state: &CloneState, direction: Vector3) -> Vector3 {
        triangle_support(&state.triangle, direction, self.spherical_expansion)
    }
}

impl SupportMapping for TriangleMeshShape {
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        let best = farthest_point(&self.vertices, direction)
            .map(|i| self.vertices[i])
            .unwrap_or(Vector3::ZERO);
        best + direction.normalize() * self.spherical_expansion
    }

    fn support_center(&self) -> Vector3 {
        self.root_box.center()
    }
}
