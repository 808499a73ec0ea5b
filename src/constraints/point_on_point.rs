use crate::bodies::RigidBody;
use crate::constraints::constraint::{JacobianRow, SoftScalar};
use crate::constraints::Constraint;
use crate::core::{BodyHandle, BodyStorage, DebugDrawer};
use crate::math::Vector3;
use std::any::Any;

/// Keeps a point fixed on two bodies together (a ball-socket joint).
///
/// The anchor is given in world space at construction and stored in each
/// body's local frame, so the joint holds the bodies at their initial
/// relative placement.
#[derive(Debug, Clone)]
pub struct PointOnPoint {
    body1: BodyHandle,
    body2: BodyHandle,
    local_anchor1: Vector3,
    local_anchor2: Vector3,
    r1: Vector3,
    r2: Vector3,
    bias_factor: f32,
    softness: f32,
    jacobian: [JacobianRow; 2],
    solver: SoftScalar,
}

impl PointOnPoint {
    pub fn new(
        handle1: BodyHandle,
        body1: &RigidBody,
        handle2: BodyHandle,
        body2: &RigidBody,
        anchor: Vector3,
    ) -> Self {
        Self {
            body1: handle1,
            body2: handle2,
            local_anchor1: body1.orientation.transpose_multiply_vector(anchor - body1.position),
            local_anchor2: body2.orientation.transpose_multiply_vector(anchor - body2.position),
            r1: Vector3::ZERO,
            r2: Vector3::ZERO,
            bias_factor: 0.05,
            softness: 0.01,
            jacobian: [JacobianRow::default(); 2],
            solver: SoftScalar::new(),
        }
    }

    pub fn body1(&self) -> BodyHandle {
        self.body1
    }

    pub fn body2(&self) -> BodyHandle {
        self.body2
    }

    /// Total impulse applied along the joint axis so far
    pub fn applied_impulse(&self) -> f32 {
        self.solver.accumulated_impulse
    }

    pub fn softness(&self) -> f32 {
        self.softness
    }

    /// Trades stiffness for stability; larger values let the joint stretch
    pub fn set_softness(&mut self, softness: f32) {
        self.softness = softness;
    }

    pub fn bias_factor(&self) -> f32 {
        self.bias_factor
    }

    /// Fraction of the positional error corrected per step
    pub fn set_bias_factor(&mut self, bias_factor: f32) {
        self.bias_factor = bias_factor;
    }

    fn solve_bodies<'a>(
        &self,
        bodies: &'a mut BodyStorage<RigidBody>,
    ) -> Option<(&'a mut RigidBody, &'a mut RigidBody)> {
        bodies.get_pair_mut(self.body1, self.body2).ok()
    }
}

impl Constraint for PointOnPoint {
    fn constraint_type(&self) -> &'static str {
        "PointOnPoint"
    }

    fn bodies(&self) -> (BodyHandle, Option<BodyHandle>) {
        (self.body1, Some(self.body2))
    }

    fn prepare_for_iteration(&mut self, bodies: &mut BodyStorage<RigidBody>, dt: f32) {
        let Some((body1, body2)) = self.solve_bodies(bodies) else {
            return;
        };

        self.r1 = body1.orientation.multiply_vector(self.local_anchor1);
        self.r2 = body2.orientation.multiply_vector(self.local_anchor2);

        let p1 = body1.position + self.r1;
        let p2 = body2.position + self.r2;
        let dp = p2 - p1;
        let delta_length = dp.length();
        let n = if dp.length_squared() != 0.0 { dp.normalize() } else { dp };

        self.jacobian = [
            JacobianRow { linear: -n, angular: -self.r1.cross(&n) },
            JacobianRow { linear: n, angular: self.r2.cross(&n) },
        ];

        let k = self.jacobian[0].inverse_mass(body1) + self.jacobian[1].inverse_mass(body2);
        self.solver.prepare(k, delta_length, self.bias_factor, self.softness, dt);

        let warm = self.solver.accumulated_impulse;
        self.jacobian[0].apply(body1, warm);
        self.jacobian[1].apply(body2, warm);
    }

    fn iterate(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        let jacobian = self.jacobian;
        let Some((body1, body2)) = self.solve_bodies(bodies) else {
            return;
        };

        let jv = jacobian[0].velocity(body1) + jacobian[1].velocity(body2);
        let lambda = self.solver.solve(jv);

        jacobian[0].apply(body1, lambda);
        jacobian[1].apply(body2, lambda);
    }

    fn debug_draw(&self, bodies: &BodyStorage<RigidBody>, drawer: &mut dyn DebugDrawer) {
        let (Ok(body1), Ok(body2)) = (bodies.try_get(self.body1), bodies.try_get(self.body2)) else {
            return;
        };
        drawer.draw_line(body1.position, body1.position + self.r1);
        drawer.draw_line(body2.position, body2.position + self.r2);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
