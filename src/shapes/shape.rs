use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::PhysicsError;
use crate::math::{Aabb, Matrix3, Vector3};
use crate::shapes::{
    hull, BoxShape, CloneArena, CompoundShape, ConeShape, ConvexHullShape, CylinderShape, MassProperties,
    MinkowskiSumShape, SphereShape, SupportMapping, TerrainShape, TransformedShape, TriangleMeshShape, WorkingClone,
};
use crate::Result;

/// A shape shared between bodies. Geometry edits take the write lock; the
/// narrow phase only ever reads.
pub type SharedShape = Arc<RwLock<Shape>>;

/// The closed set of collision geometries
#[derive(Debug, Clone)]
pub enum ShapeKind {
    Box(BoxShape),
    Sphere(SphereShape),
    Cylinder(CylinderShape),
    Cone(ConeShape),
    ConvexHull(ConvexHullShape),
    Compound(CompoundShape),
    MinkowskiSum(MinkowskiSumShape),
    Terrain(TerrainShape),
    TriangleMesh(TriangleMeshShape),
}

impl ShapeKind {
    /// Human readable variant name
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Box(_) => "box",
            ShapeKind::Sphere(_) => "sphere",
            ShapeKind::Cylinder(_) => "cylinder",
            ShapeKind::Cone(_) => "cone",
            ShapeKind::ConvexHull(_) => "convex hull",
            ShapeKind::Compound(_) => "compound",
            ShapeKind::MinkowskiSum(_) => "minkowski sum",
            ShapeKind::Terrain(_) => "terrain",
            ShapeKind::TriangleMesh(_) => "triangle mesh",
        }
    }

    /// Whether the geometry is made of many sub-parts
    pub fn is_multishape(&self) -> bool {
        matches!(self, ShapeKind::Compound(_) | ShapeKind::Terrain(_) | ShapeKind::TriangleMesh(_))
    }

    fn validate(&self) -> Result<()> {
        match self {
            ShapeKind::Box(s) => s.validate(),
            ShapeKind::Sphere(s) => s.validate(),
            ShapeKind::Cylinder(s) => s.validate(),
            ShapeKind::Cone(s) => s.validate(),
            ShapeKind::ConvexHull(s) => s.validate(),
            ShapeKind::Compound(s) => s.validate(),
            ShapeKind::MinkowskiSum(s) => s.validate(),
            ShapeKind::Terrain(s) => s.validate(),
            ShapeKind::TriangleMesh(s) => s.validate(),
        }
    }

    /// Re-centers and refreshes derived geometry after an edit
    fn prepare_geometry(&mut self) -> Result<()> {
        self.validate()?;
        match self {
            ShapeKind::ConvexHull(s) => s.recenter()?,
            ShapeKind::Compound(s) => s.recenter(),
            ShapeKind::MinkowskiSum(s) => s.recenter(),
            ShapeKind::TriangleMesh(s) => s.refresh(),
            _ => {}
        }
        Ok(())
    }
}

macro_rules! impl_from_kind {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(impl From<$ty> for ShapeKind {
            fn from(shape: $ty) -> Self {
                ShapeKind::$variant(shape)
            }
        })*
    };
}

impl_from_kind! {
    Box => BoxShape,
    Sphere => SphereShape,
    Cylinder => CylinderShape,
    Cone => ConeShape,
    ConvexHull => ConvexHullShape,
    Compound => CompoundShape,
    MinkowskiSum => MinkowskiSumShape,
    Terrain => TerrainShape,
    TriangleMesh => TriangleMeshShape,
}

/// Collision geometry plus its cached mass properties.
///
/// Mass is computed at unit density. `generation` increases on every
/// geometry change so bodies sharing the shape can refresh lazily.
#[derive(Debug)]
pub struct Shape {
    kind: ShapeKind,
    mass: f32,
    inertia: Matrix3,
    geometric_center: Vector3,
    bounding_box: Aabb,
    generation: u64,
    /// Opaque tag for the application
    pub user_data: u64,
    clones: CloneArena,
}

impl Clone for Shape {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            mass: self.mass,
            inertia: self.inertia,
            geometric_center: self.geometric_center,
            bounding_box: self.bounding_box,
            generation: self.generation,
            user_data: self.user_data,
            clones: CloneArena::default(),
        }
    }
}

impl Shape {
    /// Validates the geometry and computes its mass properties
    pub fn new(kind: impl Into<ShapeKind>) -> Result<Self> {
        let mut kind = kind.into();
        kind.prepare_geometry()?;
        let mut shape = Self {
            kind,
            mass: 0.0,
            inertia: Matrix3::identity(),
            geometric_center: Vector3::ZERO,
            bounding_box: Aabb::SMALL,
            generation: 0,
            user_data: 0,
            clones: CloneArena::default(),
        };
        shape.refresh_cache();
        Ok(shape)
    }

    /// Box with full edge lengths `size`
    pub fn cuboid(size: Vector3) -> Result<Self> {
        Self::new(BoxShape::new(size))
    }

    pub fn sphere(radius: f32) -> Result<Self> {
        Self::new(SphereShape::new(radius))
    }

    /// Cylinder along the local y axis
    pub fn cylinder(height: f32, radius: f32) -> Result<Self> {
        Self::new(CylinderShape::new(height, radius))
    }

    /// Cone along the local y axis, apex up
    pub fn cone(height: f32, radius: f32) -> Result<Self> {
        Self::new(ConeShape::new(height, radius))
    }

    pub fn convex_hull(points: Vec<Vector3>) -> Result<Self> {
        Self::new(ConvexHullShape::new(points))
    }

    pub fn compound(parts: Vec<TransformedShape>) -> Result<Self> {
        Self::new(CompoundShape::new(parts)?)
    }

    pub fn minkowski_sum(shapes: Vec<Shape>) -> Result<Self> {
        Self::new(MinkowskiSumShape::new(shapes)?)
    }

    pub fn terrain(heights: Vec<Vec<f32>>, scale_x: f32, scale_z: f32) -> Result<Self> {
        Self::new(TerrainShape::new(heights, scale_x, scale_z))
    }

    pub fn triangle_mesh(vertices: Vec<Vector3>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        Self::new(TriangleMeshShape::new(vertices, triangles))
    }

    /// Wraps the shape for sharing between bodies
    pub fn into_shared(self) -> SharedShape {
        Arc::new(RwLock::new(self))
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Mutates the geometry. The edit is applied to a copy first, so a
    /// failed validation leaves the shape untouched.
    pub fn edit<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ShapeKind) -> Result<()>,
    {
        let mut kind = self.kind.clone();
        f(&mut kind)?;
        kind.prepare_geometry()?;
        self.kind = kind;
        self.update_shape();
        Ok(())
    }

    /// Recomputes every derived quantity from the current geometry
    pub fn update_shape(&mut self) {
        self.refresh_cache();
        self.generation = self.generation.wrapping_add(1);
        self.clones.clear();
    }

    fn refresh_cache(&mut self) {
        let props = self.mass_properties();
        self.mass = props.mass;
        self.inertia = props.inertia;
        self.geometric_center = props.center;
        self.bounding_box = self.bounding_box(&Matrix3::identity());
    }

    pub fn get_mass(&self) -> f32 {
        self.mass
    }

    /// Inertia about the geometric center at unit density
    pub fn get_inertia(&self) -> Matrix3 {
        self.inertia
    }

    pub fn get_geometric_center(&self) -> Vector3 {
        self.geometric_center
    }

    /// Local bounding box (identity orientation)
    pub fn get_bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    /// Incremented whenever the geometry changes
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_multishape(&self) -> bool {
        self.kind.is_multishape()
    }

    /// Bounding box of the shape rotated by `orientation`, relative to the
    /// shape's origin
    pub fn bounding_box(&self, orientation: &Matrix3) -> Aabb {
        match &self.kind {
            ShapeKind::Box(s) => s.bounding_box(orientation),
            ShapeKind::Sphere(s) => s.bounding_box(orientation),
            ShapeKind::Cylinder(s) => s.bounding_box(orientation),
            ShapeKind::Cone(s) => s.bounding_box(orientation),
            ShapeKind::Compound(s) => s.bounding_box(orientation),
            ShapeKind::Terrain(s) => s.bounding_box(orientation),
            ShapeKind::TriangleMesh(s) => s.bounding_box(orientation),
            ShapeKind::ConvexHull(_) | ShapeKind::MinkowskiSum(_) => {
                hull::support_bounding_box(self, orientation)
            }
        }
    }

    /// Mass, center of mass and inertia at unit density
    pub fn mass_properties(&self) -> MassProperties {
        match &self.kind {
            ShapeKind::Box(s) => s.mass_properties(),
            ShapeKind::Sphere(s) => s.mass_properties(),
            ShapeKind::Cylinder(s) => s.mass_properties(),
            ShapeKind::Cone(s) => s.mass_properties(),
            ShapeKind::ConvexHull(s) => s.mass_properties(),
            ShapeKind::Compound(s) => s.mass_properties(),
            ShapeKind::MinkowskiSum(s) => s.mass_properties(),
            ShapeKind::Terrain(s) => s.mass_properties(),
            ShapeKind::TriangleMesh(s) => s.mass_properties(),
        }
    }

    /// Triangle list approximating the surface, three points per triangle.
    /// A negative depth selects the default.
    pub fn make_hull(&self, generation_threshold: i32) -> Vec<Vector3> {
        match &self.kind {
            ShapeKind::Compound(s) => s.make_hull(),
            ShapeKind::Terrain(s) => s.make_hull(),
            ShapeKind::TriangleMesh(s) => s.make_hull(),
            _ => hull::make_hull(self, generation_threshold),
        }
    }

    /// Checks out a working clone for a multishape query
    pub fn request_working_clone(&self) -> Result<WorkingClone<'_>> {
        if !self.is_multishape() {
            return Err(PhysicsError::UnsupportedShape(format!(
                "a {} has no sub-parts to clone",
                self.kind.name()
            )));
        }
        let (slot, state) = self.clones.acquire();
        Ok(WorkingClone::new(self, slot, state))
    }

    /// Number of working clones currently checked out
    pub fn outstanding_clones(&self) -> usize {
        self.clones.outstanding()
    }

    pub(crate) fn clone_arena(&self) -> &CloneArena {
        &self.clones
    }
}

impl SupportMapping for Shape {
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        match &self.kind {
            ShapeKind::Box(s) => s.support_mapping(direction),
            ShapeKind::Sphere(s) => s.support_mapping(direction),
            ShapeKind::Cylinder(s) => s.support_mapping(direction),
            ShapeKind::Cone(s) => s.support_mapping(direction),
            ShapeKind::ConvexHull(s) => s.support_mapping(direction),
            ShapeKind::Compound(s) => s.support_mapping(direction),
            ShapeKind::MinkowskiSum(s) => s.support_mapping(direction),
            ShapeKind::Terrain(s) => s.support_mapping(direction),
            ShapeKind::TriangleMesh(s) => s.support_mapping(direction),
        }
    }

    fn support_center(&self) -> Vector3 {
        self.geometric_center
    }
}
