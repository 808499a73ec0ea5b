use crate::bodies::RigidBody;
use crate::constraints::constraint::{JacobianRow, SoftScalar};
use crate::constraints::Constraint;
use crate::core::{BodyHandle, BodyStorage, DebugDrawer, Storage};
use crate::math::Vector3;
use std::any::Any;

/// Pins a point of one body to a fixed world-space anchor
#[derive(Debug, Clone)]
pub struct SingleBodyPointOnPoint {
    body: BodyHandle,
    local_anchor: Vector3,
    anchor: Vector3,
    r1: Vector3,
    bias_factor: f32,
    softness: f32,
    jacobian: JacobianRow,
    solver: SoftScalar,
}

impl SingleBodyPointOnPoint {
    /// `local_anchor` is in the body's frame; the world anchor starts where
    /// that point currently is.
    pub fn new(handle: BodyHandle, body: &RigidBody, local_anchor: Vector3) -> Self {
        Self {
            body: handle,
            local_anchor,
            anchor: body.position + body.orientation.multiply_vector(local_anchor),
            r1: Vector3::ZERO,
            bias_factor: 0.1,
            softness: 0.01,
            jacobian: JacobianRow::default(),
            solver: SoftScalar::new(),
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// The world-space point the body is held to
    pub fn anchor(&self) -> Vector3 {
        self.anchor
    }

    /// Moves the world anchor; the body follows on the next steps
    pub fn set_anchor(&mut self, anchor: Vector3) {
        self.anchor = anchor;
    }

    pub fn applied_impulse(&self) -> f32 {
        self.solver.accumulated_impulse
    }

    pub fn softness(&self) -> f32 {
        self.softness
    }

    pub fn set_softness(&mut self, softness: f32) {
        self.softness = softness;
    }

    pub fn bias_factor(&self) -> f32 {
        self.bias_factor
    }

    pub fn set_bias_factor(&mut self, bias_factor: f32) {
        self.bias_factor = bias_factor;
    }
}

impl Constraint for SingleBodyPointOnPoint {
    fn constraint_type(&self) -> &'static str {
        "SingleBodyPointOnPoint"
    }

    fn bodies(&self) -> (BodyHandle, Option<BodyHandle>) {
        (self.body, None)
    }

    fn prepare_for_iteration(&mut self, bodies: &mut BodyStorage<RigidBody>, dt: f32) {
        let Some(body) = bodies.get_mut(self.body) else {
            return;
        };

        self.r1 = body.orientation.multiply_vector(self.local_anchor);
        let p1 = body.position + self.r1;
        let delta_length = (p1 - self.anchor).length();

        let mut n = self.anchor - p1;
        if n.length_squared() != 0.0 {
            n = n.normalize();
        }

        self.jacobian = JacobianRow { linear: -n, angular: -self.r1.cross(&n) };

        let k = self.jacobian.inverse_mass(body);
        self.solver.prepare(k, delta_length, self.bias_factor, self.softness, dt);

        self.jacobian.apply(body, self.solver.accumulated_impulse);
    }

    fn iterate(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        let Some(body) = bodies.get_mut(self.body) else {
            return;
        };

        let jv = self.jacobian.velocity(body);
        let lambda = self.solver.solve(jv);
        self.jacobian.apply(body, lambda);
    }

    fn debug_draw(&self, bodies: &BodyStorage<RigidBody>, drawer: &mut dyn DebugDrawer) {
        drawer.draw_point(self.anchor);
        if let Some(body) = bodies.get(self.body) {
            drawer.draw_line(body.position + self.r1, self.anchor);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
