mod rigid_body;
mod material;

pub use self::rigid_body::RigidBody;
pub use self::material::Material;

use bitflags::bitflags;

bitflags! {
    /// Which velocities the world's damping factors apply to
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
    pub struct DampingFlags: u8 {
        /// Damp the linear velocity
        const LINEAR = 0x01;

        /// Damp the angular velocity
        const ANGULAR = 0x02;
    }
}

impl Default for DampingFlags {
    fn default() -> Self {
        DampingFlags::LINEAR | DampingFlags::ANGULAR
    }
}
