use crate::bodies::RigidBody;
use crate::collision::ContactSettings;
use crate::core::{ContactPoint, DebugDrawer};
use crate::math::{clamp, Vector3};

/// One point of a contact manifold, solved with sequential impulses.
///
/// The normal points from body2 toward body1. Penetration is positive when
/// the bodies overlap and negative for speculative contacts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub(crate) p1: Vector3,
    pub(crate) p2: Vector3,
    pub(crate) normal: Vector3,
    pub(crate) tangent: Vector3,

    /// Contact points relative to the body centers, world orientation
    pub(crate) relative_pos1: Vector3,
    pub(crate) relative_pos2: Vector3,

    /// Contact points in the body frames
    pub(crate) real_rel_pos1: Vector3,
    pub(crate) real_rel_pos2: Vector3,

    pub(crate) penetration: f32,
    pub(crate) initial_penetration: f32,

    pub(crate) accumulated_normal_impulse: f32,
    pub(crate) accumulated_tangent_impulse: f32,

    pub(crate) static_friction: f32,
    pub(crate) dynamic_friction: f32,
    pub(crate) restitution: f32,
    pub(crate) friction: f32,

    pub(crate) mass_normal: f32,
    pub(crate) mass_tangent: f32,
    pub(crate) restitution_bias: f32,
    pub(crate) speculative_velocity: f32,
    pub(crate) lost_speculative_bounce: f32,

    pub(crate) new_contact: bool,
    pub(crate) treat_body1_as_static: bool,
    pub(crate) treat_body2_as_static: bool,
    pub(crate) body1_is_mass_point: bool,
    pub(crate) body2_is_mass_point: bool,

    pub(crate) last_time_step: f32,
    pub(crate) settings: ContactSettings,
}

impl Default for Contact {
    fn default() -> Self {
        Self {
            p1: Vector3::ZERO,
            p2: Vector3::ZERO,
            normal: Vector3::ZERO,
            tangent: Vector3::ZERO,
            relative_pos1: Vector3::ZERO,
            relative_pos2: Vector3::ZERO,
            real_rel_pos1: Vector3::ZERO,
            real_rel_pos2: Vector3::ZERO,
            penetration: 0.0,
            initial_penetration: 0.0,
            accumulated_normal_impulse: 0.0,
            accumulated_tangent_impulse: 0.0,
            static_friction: 0.0,
            dynamic_friction: 0.0,
            restitution: 0.0,
            friction: 0.0,
            mass_normal: 0.0,
            mass_tangent: 0.0,
            restitution_bias: 0.0,
            speculative_velocity: 0.0,
            lost_speculative_bounce: 0.0,
            new_contact: false,
            treat_body1_as_static: false,
            treat_body2_as_static: false,
            body1_is_mass_point: false,
            body2_is_mass_point: false,
            // The first warm start scales by dt / inf = 0.
            last_time_step: f32::INFINITY,
            settings: ContactSettings::default(),
        }
    }
}

impl Contact {
    /// Contact point on body1, world space
    pub fn position1(&self) -> Vector3 {
        self.p1
    }

    /// Contact point on body2, world space
    pub fn position2(&self) -> Vector3 {
        self.p2
    }

    pub fn normal(&self) -> Vector3 {
        self.normal
    }

    /// Friction direction chosen in the last `prepare_for_iteration`
    pub fn tangent(&self) -> Vector3 {
        self.tangent
    }

    pub fn penetration(&self) -> f32 {
        self.penetration
    }

    /// Penetration at the time the contact was (re)initialized
    pub fn initial_penetration(&self) -> f32 {
        self.initial_penetration
    }

    pub fn accumulated_normal_impulse(&self) -> f32 {
        self.accumulated_normal_impulse
    }

    pub fn accumulated_tangent_impulse(&self) -> f32 {
        self.accumulated_tangent_impulse
    }

    /// Contact point relative to body1's center
    pub fn relative_position1(&self) -> Vector3 {
        self.relative_pos1
    }

    /// Contact point relative to body2's center
    pub fn relative_position2(&self) -> Vector3 {
        self.relative_pos2
    }

    /// Friction coefficient selected for the current step
    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Event view of this contact
    pub fn contact_point(&self) -> ContactPoint {
        ContactPoint {
            position: self.p1,
            normal: self.normal,
            penetration: self.penetration,
        }
    }

    /// Sets up the contact from narrow-phase output. A new contact starts
    /// with zero impulses and takes its coefficients from the materials; a
    /// refreshed one keeps both, so warm starting survives.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &mut self,
        body1: &RigidBody,
        body2: &RigidBody,
        point1: Vector3,
        point2: Vector3,
        normal: Vector3,
        penetration: f32,
        new_contact: bool,
        settings: &ContactSettings,
    ) {
        self.normal = normal.normalize();
        self.p1 = point1;
        self.p2 = point2;
        self.new_contact = new_contact;

        self.relative_pos1 = point1 - body1.position;
        self.relative_pos2 = point2 - body2.position;
        self.real_rel_pos1 = body1.orientation.transpose_multiply_vector(self.relative_pos1);
        self.real_rel_pos2 = body2.orientation.transpose_multiply_vector(self.relative_pos2);

        self.initial_penetration = penetration;
        self.penetration = penetration;

        self.body1_is_mass_point = body1.is_particle;
        self.body2_is_mass_point = body2.is_particle;
        self.refresh_static_flags(body1, body2);

        if new_contact {
            self.accumulated_normal_impulse = 0.0;
            self.accumulated_tangent_impulse = 0.0;
            self.lost_speculative_bounce = 0.0;

            let mixing = settings.mixing;
            self.restitution = mixing.mix(body1.material.restitution, body2.material.restitution);
            self.static_friction =
                mixing.mix(body1.material.static_friction, body2.material.static_friction);
            self.dynamic_friction =
                mixing.mix(body1.material.kinetic_friction, body2.material.kinetic_friction);
        }

        self.settings = *settings;
    }

    /// Bodies can turn static while a contact is cached, so this runs on
    /// every refresh and before every solve.
    fn refresh_static_flags(&mut self, body1: &RigidBody, body2: &RigidBody) {
        self.treat_body1_as_static = body1.is_static_or_inactive();
        self.treat_body2_as_static = body2.is_static_or_inactive();
    }

    /// Moves the cached points with the bodies and recomputes penetration
    pub fn update_position(&mut self, body1: &RigidBody, body2: &RigidBody) {
        self.p1 = if self.body1_is_mass_point {
            self.real_rel_pos1 + body1.position
        } else {
            body1.orientation.multiply_vector(self.real_rel_pos1) + body1.position
        };

        self.p2 = if self.body2_is_mass_point {
            self.real_rel_pos2 + body2.position
        } else {
            body2.orientation.multiply_vector(self.real_rel_pos2) + body2.position
        };

        self.penetration = (self.p2 - self.p1).dot(&self.normal);
    }

    /// Velocity of the point on body1 relative to the point on body2
    pub fn relative_velocity(&self, body1: &RigidBody, body2: &RigidBody) -> Vector3 {
        let mut dv = body1.linear_velocity - body2.linear_velocity;
        if !self.body1_is_mass_point {
            dv += body1.angular_velocity.cross(&self.relative_pos1);
        }
        if !self.body2_is_mass_point {
            dv -= body2.angular_velocity.cross(&self.relative_pos2);
        }
        dv
    }

    /// Applies `impulse` to body1 and its opposite to body2, skipping
    /// bodies treated as static.
    pub fn apply_impulse(&self, body1: &mut RigidBody, body2: &mut RigidBody, impulse: Vector3) {
        if !self.treat_body1_as_static {
            body1.linear_velocity += impulse * body1.inverse_mass;
            if !self.body1_is_mass_point {
                body1.angular_velocity += body1
                    .inv_inertia_world
                    .multiply_vector(self.relative_pos1.cross(&impulse));
            }
        }

        if !self.treat_body2_as_static {
            body2.linear_velocity -= impulse * body2.inverse_mass;
            if !self.body2_is_mass_point {
                body2.angular_velocity -= body2
                    .inv_inertia_world
                    .multiply_vector(self.relative_pos2.cross(&impulse));
            }
        }
    }

    /// Effective mass along `direction`
    fn effective_mass(&self, body1: &RigidBody, body2: &RigidBody, direction: Vector3) -> f32 {
        let mut k = 0.0;

        if !self.treat_body1_as_static {
            k += body1.inverse_mass;
            if !self.body1_is_mass_point {
                let rn = body1
                    .inv_inertia_world
                    .multiply_vector(self.relative_pos1.cross(&direction))
                    .cross(&self.relative_pos1);
                k += rn.dot(&direction);
            }
        }

        if !self.treat_body2_as_static {
            k += body2.inverse_mass;
            if !self.body2_is_mass_point {
                let rn = body2
                    .inv_inertia_world
                    .multiply_vector(self.relative_pos2.cross(&direction))
                    .cross(&self.relative_pos2);
                k += rn.dot(&direction);
            }
        }

        if k > 0.0 {
            1.0 / k
        } else {
            0.0
        }
    }

    /// Computes effective masses, the friction direction and the velocity
    /// bias for this step, then warm starts with the accumulated impulses.
    pub fn prepare_for_iteration(&mut self, body1: &mut RigidBody, body2: &mut RigidBody, timestep: f32) {
        self.refresh_static_flags(body1, body2);
        let dv = self.relative_velocity(body1, body2);

        self.mass_normal = self.effective_mass(body1, body2, self.normal);

        let normal_velocity = dv.dot(&self.normal);
        self.tangent = dv - self.normal * normal_velocity;
        let tangent_len_sq = self.tangent.length_squared();
        if tangent_len_sq != 0.0 {
            self.tangent = self.tangent / tangent_len_sq.sqrt();
        }

        self.mass_tangent = self.effective_mass(body1, body2, self.tangent);

        self.restitution_bias = self.lost_speculative_bounce;
        self.speculative_velocity = 0.0;

        let settings = self.settings;
        if self.penetration > settings.allowed_penetration {
            self.restitution_bias = settings.bias_factor
                * (1.0 / timestep)
                * (self.penetration - settings.allowed_penetration).max(0.0);
            self.restitution_bias = clamp(self.restitution_bias, 0.0, settings.maximum_bias);
        }

        let time_step_ratio = timestep / self.last_time_step;
        self.accumulated_normal_impulse *= time_step_ratio;
        self.accumulated_tangent_impulse *= time_step_ratio;

        // Sticking while the tangent impulse stays inside the static cone
        let tangent_impulse = self.mass_tangent * -self.tangent.dot(&dv);
        let max_tangent_impulse = -self.static_friction * self.accumulated_normal_impulse;
        self.friction = if tangent_impulse < max_tangent_impulse {
            self.dynamic_friction
        } else {
            self.static_friction
        };

        // Restitution only for fresh impacts
        if normal_velocity < -1.0 && self.new_contact {
            self.restitution_bias = self.restitution_bias.max(-self.restitution * normal_velocity);
        }

        // A speculative contact closes the gap this step; its bounce is
        // kept for the step after.
        if self.penetration < -settings.allowed_penetration {
            self.speculative_velocity = self.penetration / timestep;
            self.lost_speculative_bounce = self.restitution_bias;
            self.restitution_bias = 0.0;
        } else {
            self.lost_speculative_bounce = 0.0;
        }

        let impulse = self.normal * self.accumulated_normal_impulse
            + self.tangent * self.accumulated_tangent_impulse;
        self.apply_impulse(body1, body2, impulse);

        self.last_time_step = timestep;
        self.new_contact = false;
    }

    /// One sequential-impulse pass over the normal and friction rows
    pub fn iterate(&mut self, body1: &mut RigidBody, body2: &mut RigidBody) {
        if self.treat_body1_as_static && self.treat_body2_as_static {
            return;
        }

        let dv = self.relative_velocity(body1, body2);
        let min_velocity = self.settings.minimum_velocity;
        if dv.length_squared() < min_velocity * min_velocity {
            return;
        }

        let vn = dv.dot(&self.normal);
        let mut normal_impulse =
            self.mass_normal * (-vn + self.restitution_bias + self.speculative_velocity);

        let old_normal_impulse = self.accumulated_normal_impulse;
        self.accumulated_normal_impulse = (old_normal_impulse + normal_impulse).max(0.0);
        normal_impulse = self.accumulated_normal_impulse - old_normal_impulse;

        let vt = dv.dot(&self.tangent);
        let max_tangent_impulse = self.friction * self.accumulated_normal_impulse;
        let mut tangent_impulse = self.mass_tangent * -vt;

        let old_tangent_impulse = self.accumulated_tangent_impulse;
        self.accumulated_tangent_impulse = clamp(
            old_tangent_impulse + tangent_impulse,
            -max_tangent_impulse,
            max_tangent_impulse,
        );
        tangent_impulse = self.accumulated_tangent_impulse - old_tangent_impulse;

        let impulse = self.normal * normal_impulse + self.tangent * tangent_impulse;
        self.apply_impulse(body1, body2, impulse);
    }

    pub fn debug_draw(&self, drawer: &mut dyn DebugDrawer) {
        drawer.draw_point(self.p1);
        drawer.draw_point(self.p2);
        drawer.draw_line(self.p1, self.p1 + self.normal * 0.25);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::Material;
    use crate::shapes::Shape;
    use approx::assert_relative_eq;

    fn unit_box(position: Vector3) -> RigidBody {
        let shape = Shape::cuboid(Vector3::one()).unwrap().into_shared();
        let mut body = RigidBody::new(shape, Material::default());
        body.set_position(position);
        body
    }

    #[test]
    fn test_initialize_mixes_materials() {
        let mut b1 = unit_box(Vector3::new(0.0, 0.9, 0.0));
        let mut b2 = unit_box(Vector3::ZERO);
        b1.material = Material::new(1.0, 1.0, 0.5);
        b2.material = Material::new(0.0, 0.5, 0.1);

        let mut c = Contact::default();
        c.initialize(
            &b1,
            &b2,
            Vector3::new(0.0, 0.4, 0.0),
            Vector3::new(0.0, 0.5, 0.0),
            Vector3::unit_y(),
            0.1,
            true,
            &ContactSettings::default(),
        );

        assert_relative_eq!(c.restitution(), 0.5);
        assert_relative_eq!(c.static_friction, 0.75);
        assert_relative_eq!(c.dynamic_friction, 0.3);
        assert_relative_eq!(c.relative_position1(), Vector3::new(0.0, -0.5, 0.0));
    }

    #[test]
    fn test_update_position_tracks_bodies() {
        let b1 = unit_box(Vector3::new(0.0, 0.9, 0.0));
        let b2 = unit_box(Vector3::ZERO);

        let mut c = Contact::default();
        c.initialize(
            &b1,
            &b2,
            Vector3::new(0.0, 0.4, 0.0),
            Vector3::new(0.0, 0.5, 0.0),
            Vector3::unit_y(),
            0.1,
            true,
            &ContactSettings::default(),
        );

        let mut moved = b1.clone();
        moved.set_position(Vector3::new(0.0, 1.2, 0.0));
        c.update_position(&moved, &b2);
        assert_relative_eq!(c.penetration(), -0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_iterate_stops_approach() {
        let mut b1 = unit_box(Vector3::new(0.0, 0.99, 0.0));
        let mut b2 = unit_box(Vector3::ZERO);
        b2.set_static(true);
        b1.set_linear_velocity(Vector3::new(0.0, -2.0, 0.0)).unwrap();

        let mut c = Contact::default();
        c.initialize(
            &b1,
            &b2,
            Vector3::new(0.0, 0.49, 0.0),
            Vector3::new(0.0, 0.5, 0.0),
            Vector3::unit_y(),
            0.01,
            true,
            &ContactSettings::default(),
        );

        c.prepare_for_iteration(&mut b1, &mut b2, 1.0 / 60.0);
        for _ in 0..10 {
            c.iterate(&mut b1, &mut b2);
        }

        // Restitution is zero, so the body ends at rest along the normal.
        assert!(b1.linear_velocity.y.abs() < 1e-3);
        assert!(c.accumulated_normal_impulse() > 0.0);
        assert_eq!(b2.linear_velocity, Vector3::ZERO);
    }

    #[test]
    fn test_body_turned_static_is_not_pushed() {
        let mut b1 = unit_box(Vector3::new(0.0, 0.99, 0.0));
        let mut b2 = unit_box(Vector3::ZERO);
        b1.set_linear_velocity(Vector3::new(0.0, -2.0, 0.0)).unwrap();

        let mut c = Contact::default();
        c.initialize(
            &b1,
            &b2,
            Vector3::new(0.0, 0.49, 0.0),
            Vector3::new(0.0, 0.5, 0.0),
            Vector3::unit_y(),
            0.01,
            true,
            &ContactSettings::default(),
        );
        let dt = 1.0 / 60.0;
        c.prepare_for_iteration(&mut b1, &mut b2, dt);
        c.iterate(&mut b1, &mut b2);
        assert!(b2.linear_velocity.y < 0.0);
        assert!(c.accumulated_normal_impulse() > 0.0);

        // The cached contact, warm start included, must now leave b2 alone.
        b2.set_static(true);
        b1.set_linear_velocity(Vector3::new(0.0, -2.0, 0.0)).unwrap();
        c.prepare_for_iteration(&mut b1, &mut b2, dt);
        for _ in 0..10 {
            c.iterate(&mut b1, &mut b2);
        }
        assert_eq!(b2.linear_velocity, Vector3::ZERO);
        assert_eq!(b2.angular_velocity, Vector3::ZERO);
        assert!(b1.linear_velocity.y.abs() < 1e-3);
    }

    #[test]
    fn test_speculative_contact_allows_closing_the_gap() {
        let mut b1 = unit_box(Vector3::new(0.0, 1.5, 0.0));
        let mut b2 = unit_box(Vector3::ZERO);
        b2.set_static(true);
        b1.set_linear_velocity(Vector3::new(0.0, -60.0, 0.0)).unwrap();

        let mut c = Contact::default();
        c.initialize(
            &b1,
            &b2,
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.5, 0.0),
            Vector3::unit_y(),
            -0.5,
            true,
            &ContactSettings::default(),
        );

        let dt = 1.0 / 60.0;
        c.prepare_for_iteration(&mut b1, &mut b2, dt);
        for _ in 0..10 {
            c.iterate(&mut b1, &mut b2);
        }

        // The body may still travel the 0.5 gap within this step.
        assert_relative_eq!(b1.linear_velocity.y, -0.5 / dt, epsilon = 1e-2);
    }
}
