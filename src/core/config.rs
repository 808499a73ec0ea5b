use crate::collision::ContactSettings;
use crate::math::Vector3;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration parameters for the physics simulation
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Gravity applied to bodies that are affected by it
    pub gravity: Vector3,

    /// The fixed time step used by `World::step_accumulated`
    pub time_step: f32,

    /// The maximum number of fixed steps per `step_accumulated` call
    pub max_substeps: u32,

    /// Solver iterations per island
    pub iterations: u32,

    /// Solver iterations for islands with at most three bodies plus constraints
    pub small_iterations: u32,

    /// Fraction of linear velocity kept after one second
    pub linear_damping: f32,

    /// Fraction of angular velocity kept after one second
    pub angular_damping: f32,

    /// Whether islands may go to sleep
    pub allow_deactivation: bool,

    /// Seconds an island must stay below the thresholds before sleeping
    pub deactivation_time: f32,

    /// Squared linear speed under which a body counts as resting
    pub inactive_linear_threshold_sq: f32,

    /// Squared angular speed under which a body counts as resting
    pub inactive_angular_threshold_sq: f32,

    /// Create speculative contacts for separated pairs of fast bodies
    pub speculative_contacts: bool,

    /// Report the terrain triangle normal instead of the penetration normal
    pub use_terrain_normal: bool,

    /// Report the mesh triangle normal instead of the penetration normal
    pub use_triangle_mesh_normal: bool,

    /// Run the narrow phase on the rayon pool (needs the `parallel` feature)
    pub multithreaded: bool,

    /// Tuning shared by every contact
    pub contact: ContactSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, -9.81, 0.0),
            time_step: 1.0 / 60.0,
            max_substeps: 10,
            iterations: 6,
            small_iterations: 4,
            linear_damping: 0.85,
            angular_damping: 0.85,
            allow_deactivation: true,
            deactivation_time: 2.0,
            inactive_linear_threshold_sq: 0.1,
            inactive_angular_threshold_sq: 0.1,
            speculative_contacts: false,
            use_terrain_normal: true,
            use_triangle_mesh_normal: true,
            multithreaded: false,
            contact: ContactSettings::default(),
        }
    }
}

impl SimulationConfig {
    /// Checks that the numeric fields are usable
    pub fn validate(&self) -> crate::Result<()> {
        use crate::error::PhysicsError;

        if !(self.time_step > 0.0) || !self.time_step.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "time step must be positive, got {}",
                self.time_step
            )));
        }
        if self.iterations == 0 || self.small_iterations == 0 {
            return Err(PhysicsError::InvalidParameter(
                "solver iteration counts must be at least 1".into(),
            ));
        }
        for (name, value) in [("linear_damping", self.linear_damping), ("angular_damping", self.angular_damping)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PhysicsError::InvalidParameter(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.deactivation_time < 0.0 {
            return Err(PhysicsError::InvalidParameter(
                "deactivation time must not be negative".into(),
            ));
        }
        Ok(())
    }
}
