use std::collections::BTreeSet;

use log::warn;

use crate::bodies::{DampingFlags, Material};
use crate::collision::ArbiterKey;
use crate::core::{BodyHandle, ConstraintHandle, DebugDrawer, IslandId};
use crate::error::PhysicsError;
use crate::math::{Aabb, Matrix3, Vector3};
use crate::shapes::SharedShape;
use crate::Result;

/// Depth of the hull built for debug drawing
const DEBUG_HULL_GENERATION: i32 = 3;

/// A rigid body for physics simulation.
///
/// The body does not know its own handle; identity is the slot it
/// occupies in the world's body table. Everything the solver and the
/// narrow phase read is kept in plain fields so the hot loops avoid
/// accessor overhead.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub(crate) shape: SharedShape,
    /// Shape generation the cached mass properties and hull were built from
    pub(crate) shape_generation: u64,

    pub(crate) position: Vector3,
    pub(crate) orientation: Matrix3,
    pub(crate) linear_velocity: Vector3,
    pub(crate) angular_velocity: Vector3,

    pub(crate) inverse_mass: f32,
    pub(crate) inertia: Matrix3,
    pub(crate) inv_inertia: Matrix3,
    pub(crate) inv_inertia_world: Matrix3,

    /// Accumulated for the next step, cleared after force integration
    pub(crate) force: Vector3,
    pub(crate) torque: Vector3,

    pub(crate) is_static: bool,
    pub(crate) is_active: bool,
    pub(crate) is_particle: bool,
    pub(crate) affected_by_gravity: bool,
    pub(crate) allow_deactivation: bool,
    pub(crate) enable_speculative_contacts: bool,
    pub(crate) damping: DampingFlags,

    pub(crate) material: Material,

    pub(crate) island: Option<IslandId>,
    pub(crate) arbiters: BTreeSet<ArbiterKey>,
    pub(crate) constraints: BTreeSet<ConstraintHandle>,
    /// One entry per arbiter or constraint linking this body to a
    /// non-static body, so a partner can appear more than once
    pub(crate) connections: Vec<BodyHandle>,

    pub(crate) bounding_box: Aabb,
    pub(crate) inactive_time: f32,
    pub(crate) swept_direction: Vector3,

    use_shape_mass_properties: bool,
    debug_draw: bool,
    hull_points: Vec<Vector3>,

    /// Opaque tag for the application
    pub user_data: u64,
}

impl RigidBody {
    /// Creates a dynamic body whose mass properties come from the shape
    pub fn new(shape: SharedShape, material: Material) -> Self {
        let mut body = Self {
            shape,
            shape_generation: 0,
            position: Vector3::ZERO,
            orientation: Matrix3::identity(),
            linear_velocity: Vector3::ZERO,
            angular_velocity: Vector3::ZERO,
            inverse_mass: 1.0,
            inertia: Matrix3::identity(),
            inv_inertia: Matrix3::identity(),
            inv_inertia_world: Matrix3::identity(),
            force: Vector3::ZERO,
            torque: Vector3::ZERO,
            is_static: false,
            is_active: true,
            is_particle: false,
            affected_by_gravity: true,
            allow_deactivation: true,
            enable_speculative_contacts: false,
            damping: DampingFlags::default(),
            material,
            island: None,
            arbiters: BTreeSet::new(),
            constraints: BTreeSet::new(),
            connections: Vec::new(),
            bounding_box: Aabb::SMALL,
            inactive_time: 0.0,
            swept_direction: Vector3::ZERO,
            use_shape_mass_properties: true,
            debug_draw: false,
            hull_points: Vec::new(),
            user_data: 0,
        };

        body.shape_generation = body.shape.read().generation();
        body.apply_shape_mass_properties();
        body.update();
        body
    }

    /// Creates a body without rotational degrees of freedom
    pub fn new_particle(shape: SharedShape, material: Material) -> Self {
        let mut body = Self::new(shape, material);
        body.set_particle(true);
        body
    }

    fn apply_shape_mass_properties(&mut self) {
        let (mass, inertia) = {
            let shape = self.shape.read();
            (shape.get_mass(), shape.get_inertia())
        };
        self.inertia = inertia;
        self.inv_inertia = invert_or_zero(&inertia);
        self.inverse_mass = 1.0 / mass;
        self.use_shape_mass_properties = true;
    }

    /// Refreshes the world bounding box and world inverse inertia. Picks up
    /// geometry edits on the shared shape since the last call.
    pub fn update(&mut self) {
        let generation = self.shape.read().generation();
        if generation != self.shape_generation {
            self.shape_generation = generation;
            if self.use_shape_mass_properties && !self.is_particle {
                self.apply_shape_mass_properties();
            }
            if self.debug_draw {
                self.rebuild_hull();
            }
        }

        if self.is_particle {
            self.inertia = Matrix3::zero();
            self.inv_inertia = Matrix3::zero();
            self.inv_inertia_world = Matrix3::zero();
            self.orientation = Matrix3::identity();
            self.bounding_box = self.shape.read().get_bounding_box().translated(self.position);
            self.angular_velocity = Vector3::ZERO;
        } else {
            self.bounding_box = self
                .shape
                .read()
                .bounding_box(&self.orientation)
                .translated(self.position);

            if !self.is_static {
                self.inv_inertia_world = self
                    .orientation
                    .multiply_matrix(&self.inv_inertia)
                    .multiply_matrix(&self.orientation.transpose());
            }
        }
    }

    /// Grows the bounding box along the distance the body travels in `dt`
    pub fn swept_expand_bounding_box(&mut self, dt: f32) {
        self.swept_direction = self.linear_velocity * dt;

        for axis in 0..3 {
            let swept = self.swept_direction[axis];
            if swept < 0.0 {
                self.bounding_box.min[axis] += swept;
            } else {
                self.bounding_box.max[axis] += swept;
            }
        }
    }

    /// Applies an impulse at the center of mass
    pub fn apply_impulse(&mut self, impulse: Vector3) -> Result<()> {
        self.ensure_dynamic("apply an impulse to")?;
        self.linear_velocity += impulse * self.inverse_mass;
        Ok(())
    }

    /// Applies an impulse at `relative_position` from the center of mass
    pub fn apply_impulse_at(&mut self, impulse: Vector3, relative_position: Vector3) -> Result<()> {
        self.ensure_dynamic("apply an impulse to")?;
        self.linear_velocity += impulse * self.inverse_mass;
        self.angular_velocity += self
            .inv_inertia_world
            .multiply_vector(relative_position.cross(&impulse));
        Ok(())
    }

    /// Adds a force at the center of mass for the next step
    pub fn add_force(&mut self, force: Vector3) {
        self.force += force;
    }

    /// Adds a force acting at the world-space point `position`
    pub fn add_force_at(&mut self, force: Vector3, position: Vector3) {
        self.force += force;
        self.torque += (position - self.position).cross(&force);
    }

    pub fn add_torque(&mut self, torque: Vector3) {
        self.torque += torque;
    }

    pub fn get_force(&self) -> Vector3 {
        self.force
    }

    pub fn get_torque(&self) -> Vector3 {
        self.torque
    }

    fn ensure_dynamic(&self, action: &str) -> Result<()> {
        if self.is_static {
            return Err(PhysicsError::InvalidOperation(format!(
                "cannot {action} a static body"
            )));
        }
        Ok(())
    }

    /// Returns the body's position (center of mass)
    pub fn get_position(&self) -> Vector3 {
        self.position
    }

    /// Moves the body and refreshes its bounding box
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.update();
    }

    /// Returns the rotation matrix from body to world space
    pub fn get_orientation(&self) -> Matrix3 {
        self.orientation
    }

    /// Rotates the body and refreshes its bounding box and world inertia
    pub fn set_orientation(&mut self, orientation: Matrix3) {
        self.orientation = orientation;
        self.update();
    }

    pub fn get_linear_velocity(&self) -> Vector3 {
        self.linear_velocity
    }

    /// Fails on a static body
    pub fn set_linear_velocity(&mut self, velocity: Vector3) -> Result<()> {
        self.ensure_dynamic("set the velocity of")?;
        self.linear_velocity = velocity;
        Ok(())
    }

    pub fn get_angular_velocity(&self) -> Vector3 {
        self.angular_velocity
    }

    /// Fails on a static body
    pub fn set_angular_velocity(&mut self, velocity: Vector3) -> Result<()> {
        self.ensure_dynamic("set the angular velocity of")?;
        self.angular_velocity = velocity;
        Ok(())
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Makes the body immovable and zeroes its velocities. Bodies already
    /// in a world should go through `World::set_body_static` so islands
    /// are rebuilt immediately; otherwise the world catches up on the
    /// next step.
    pub fn set_static(&mut self, is_static: bool) {
        if is_static && !self.is_static {
            self.linear_velocity = Vector3::ZERO;
            self.angular_velocity = Vector3::ZERO;
        }
        self.is_static = is_static;
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Puts the body to sleep or wakes it. A sleeping body keeps no
    /// velocity.
    pub fn set_active(&mut self, active: bool) {
        if !self.is_active && active {
            self.inactive_time = 0.0;
        } else if self.is_active && !active {
            self.inactive_time = f32::INFINITY;
            self.linear_velocity = Vector3::ZERO;
            self.angular_velocity = Vector3::ZERO;
        }
        self.is_active = active;
    }

    /// Inverse mass as the constraint solver sees it; zero for static bodies
    pub(crate) fn solver_inverse_mass(&self) -> f32 {
        if self.is_static {
            0.0
        } else {
            self.inverse_mass
        }
    }

    pub(crate) fn solver_inv_inertia_world(&self) -> Matrix3 {
        if self.is_static {
            Matrix3::zero()
        } else {
            self.inv_inertia_world
        }
    }

    /// Whether the solver treats the body as having infinite mass
    pub fn is_static_or_inactive(&self) -> bool {
        self.is_static || !self.is_active
    }

    pub fn is_particle(&self) -> bool {
        self.is_particle
    }

    /// A particle never rotates: zero inverse inertia and an identity
    /// orientation. Turning it off restores the shape's mass properties.
    pub fn set_particle(&mut self, particle: bool) {
        if particle && !self.is_particle {
            self.is_particle = true;
            self.inverse_mass = 1.0;
            self.update();
        } else if !particle && self.is_particle {
            self.is_particle = false;
            self.apply_shape_mass_properties();
            self.update();
        }
    }

    pub fn get_inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    pub fn get_mass(&self) -> f32 {
        1.0 / self.inverse_mass
    }

    /// Scales the shape's inertia to a new total mass
    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        if mass.is_nan() || mass <= 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "mass must be positive, got {mass}"
            )));
        }

        let (shape_mass, shape_inertia) = {
            let shape = self.shape.read();
            (shape.get_mass(), shape.get_inertia())
        };
        self.inertia = shape_inertia * (mass / shape_mass);
        self.inv_inertia = invert_or_zero(&self.inertia);
        self.inverse_mass = 1.0 / mass;
        self.use_shape_mass_properties = false;
        self.update();
        Ok(())
    }

    /// Overrides mass and inertia. With `as_inverse` both arguments are
    /// taken as the inverse quantities.
    pub fn set_mass_properties(&mut self, inertia: Matrix3, mass: f32, as_inverse: bool) -> Result<()> {
        if mass.is_nan() || mass <= 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "mass must be positive, got {mass}"
            )));
        }

        if as_inverse {
            self.inv_inertia = inertia;
            self.inertia = invert_or_zero(&inertia);
            self.inverse_mass = mass;
        } else {
            self.inertia = inertia;
            self.inv_inertia = invert_or_zero(&inertia);
            self.inverse_mass = 1.0 / mass;
        }
        self.use_shape_mass_properties = false;
        self.update();
        Ok(())
    }

    /// Goes back to the mass properties of the shape
    pub fn use_shape_mass_properties(&mut self) {
        self.apply_shape_mass_properties();
        self.update();
    }

    pub fn get_inertia(&self) -> Matrix3 {
        self.inertia
    }

    pub fn get_inverse_inertia(&self) -> Matrix3 {
        self.inv_inertia
    }

    pub fn get_inverse_inertia_world(&self) -> Matrix3 {
        self.inv_inertia_world
    }

    pub fn get_shape(&self) -> &SharedShape {
        &self.shape
    }

    /// Swaps the collision shape. Shape mass properties are reapplied
    /// unless they were overridden.
    pub fn set_shape(&mut self, shape: SharedShape) {
        self.shape = shape;
        self.shape_generation = self.shape.read().generation();
        if self.use_shape_mass_properties && !self.is_particle {
            self.apply_shape_mass_properties();
        }
        if self.debug_draw {
            self.rebuild_hull();
        }
        self.update();
    }

    pub fn get_material(&self) -> &Material {
        &self.material
    }

    pub fn get_material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn get_bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    pub fn is_affected_by_gravity(&self) -> bool {
        self.affected_by_gravity
    }

    pub fn set_affected_by_gravity(&mut self, affected: bool) {
        self.affected_by_gravity = affected;
    }

    pub fn allows_deactivation(&self) -> bool {
        self.allow_deactivation
    }

    pub fn set_allow_deactivation(&mut self, allow: bool) {
        self.allow_deactivation = allow;
    }

    pub fn speculative_contacts_enabled(&self) -> bool {
        self.enable_speculative_contacts
    }

    /// Requests speculative contacts for this body even when the world
    /// has them turned off
    pub fn set_speculative_contacts(&mut self, enabled: bool) {
        self.enable_speculative_contacts = enabled;
    }

    pub fn get_damping(&self) -> DampingFlags {
        self.damping
    }

    pub fn set_damping(&mut self, damping: DampingFlags) {
        self.damping = damping;
    }

    /// The island the body belongs to; `None` for static bodies
    pub fn get_island(&self) -> Option<IslandId> {
        self.island
    }

    /// Arbiters touching this body
    pub fn arbiters(&self) -> impl Iterator<Item = &ArbiterKey> {
        self.arbiters.iter()
    }

    /// Constraints attached to this body
    pub fn constraints(&self) -> impl Iterator<Item = &ConstraintHandle> {
        self.constraints.iter()
    }

    /// Non-static bodies linked to this one by an arbiter or constraint
    pub fn connections(&self) -> &[BodyHandle] {
        &self.connections
    }

    /// Seconds spent below the sleep thresholds
    pub fn get_inactive_time(&self) -> f32 {
        self.inactive_time
    }

    /// Displacement used for the last swept bounding box
    pub fn get_swept_direction(&self) -> Vector3 {
        self.swept_direction
    }

    pub fn is_debug_draw_enabled(&self) -> bool {
        self.debug_draw
    }

    /// Builds (or drops) the triangle hull drawn by [`debug_draw`](Self::debug_draw)
    pub fn enable_debug_draw(&mut self, enabled: bool) {
        self.debug_draw = enabled;
        if enabled {
            if self.hull_points.is_empty() {
                self.rebuild_hull();
            }
        } else {
            self.hull_points.clear();
        }
    }

    fn rebuild_hull(&mut self) {
        self.hull_points = self.shape.read().make_hull(DEBUG_HULL_GENERATION);
    }

    /// Draws the cached hull in world space
    pub fn debug_draw(&self, drawer: &mut dyn DebugDrawer) {
        for tri in self.hull_points.chunks_exact(3) {
            let world = |p: Vector3| self.orientation.multiply_vector(p) + self.position;
            drawer.draw_triangle(world(tri[0]), world(tri[1]), world(tri[2]));
        }
    }
}

fn invert_or_zero(inertia: &Matrix3) -> Matrix3 {
    match inertia.inverse() {
        Some(inverse) => inverse,
        None => {
            warn!("singular inertia tensor, body will not rotate");
            Matrix3::zero()
        }
    }
}
