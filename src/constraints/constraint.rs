use crate::bodies::RigidBody;
use crate::core::{BodyHandle, BodyStorage, DebugDrawer};
use crate::math::Vector3;
use std::any::Any;

/// A joint solved by sequential impulses alongside the contacts.
///
/// Each step the world calls [`prepare_for_iteration`](Self::prepare_for_iteration)
/// once, which computes the Jacobian and effective mass and applies the
/// accumulated impulse as a warm start, then [`iterate`](Self::iterate) a
/// fixed number of times.
pub trait Constraint: Send + Sync + 'static {
    /// Returns the type name of the constraint
    fn constraint_type(&self) -> &'static str;

    /// The constrained body and, for two-body joints, its partner
    fn bodies(&self) -> (BodyHandle, Option<BodyHandle>);

    /// Checks if the constraint involves a specific body
    fn involves_body(&self, body: BodyHandle) -> bool {
        let (body1, body2) = self.bodies();
        body1 == body || body2 == Some(body)
    }

    fn prepare_for_iteration(&mut self, bodies: &mut BodyStorage<RigidBody>, dt: f32);

    fn iterate(&mut self, bodies: &mut BodyStorage<RigidBody>);

    /// Describes the joint through `drawer`
    fn debug_draw(&self, _bodies: &BodyStorage<RigidBody>, _drawer: &mut dyn DebugDrawer) {}

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Returns a dynamic mutable reference to any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Linear and angular Jacobian rows for one body
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct JacobianRow {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl JacobianRow {
    /// Velocity of `body` projected on the row
    #[inline]
    pub fn velocity(&self, body: &RigidBody) -> f32 {
        body.linear_velocity.dot(&self.linear) + body.angular_velocity.dot(&self.angular)
    }

    /// Contribution of the row to the inverse effective mass
    #[inline]
    pub fn inverse_mass(&self, body: &RigidBody) -> f32 {
        body.solver_inverse_mass()
            + body
                .solver_inv_inertia_world()
                .multiply_vector(self.angular)
                .dot(&self.angular)
    }

    /// Applies `lambda` along the row; static bodies are left alone
    #[inline]
    pub fn apply(&self, body: &mut RigidBody, lambda: f32) {
        if body.is_static {
            return;
        }
        body.linear_velocity += self.linear * (body.inverse_mass * lambda);
        body.angular_velocity += body.inv_inertia_world.multiply_vector(self.angular * lambda);
    }
}

/// Shared softness and bias handling of the point constraints:
/// `lambda = -m_eff * (Jv + bias + accumulated * softness / dt)`
#[derive(Debug, Clone, Copy)]
pub(crate) struct SoftScalar {
    pub effective_mass: f32,
    pub accumulated_impulse: f32,
    pub bias: f32,
    pub softness_over_dt: f32,
}

impl SoftScalar {
    pub fn new() -> Self {
        Self {
            effective_mass: 0.0,
            accumulated_impulse: 0.0,
            bias: 0.0,
            softness_over_dt: 0.0,
        }
    }

    /// Sets up the step from the inverse effective mass (without softness)
    /// and the positional error
    pub fn prepare(&mut self, inverse_effective_mass: f32, error: f32, bias_factor: f32, softness: f32, dt: f32) {
        self.softness_over_dt = softness / dt;
        let k = inverse_effective_mass + self.softness_over_dt;
        self.effective_mass = if k != 0.0 { 1.0 / k } else { 0.0 };
        self.bias = error * bias_factor * (1.0 / dt);
    }

    /// Next incremental impulse for the velocity error `jv`; accumulates it
    pub fn solve(&mut self, jv: f32) -> f32 {
        let softness_scalar = self.accumulated_impulse * self.softness_over_dt;
        let lambda = -self.effective_mass * (jv + self.bias + softness_scalar);
        self.accumulated_impulse += lambda;
        lambda
    }
}
