#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Surface properties used when a contact between two bodies is created.
/// The coefficients of both bodies are combined with the world's
/// [`MaterialCoefficientMixing`](crate::collision::MaterialCoefficientMixing).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coefficient of restitution (bounciness), 0-1
    pub restitution: f32,

    /// Friction while the contact is sticking
    pub static_friction: f32,

    /// Friction once the contact slides
    pub kinetic_friction: f32,
}

impl Material {
    /// Creates a new material with the specified properties
    pub fn new(restitution: f32, static_friction: f32, kinetic_friction: f32) -> Self {
        Self {
            restitution,
            static_friction,
            kinetic_friction,
        }
    }

    /// Creates a material for ice (low friction)
    pub fn ice() -> Self {
        Self::new(0.1, 0.1, 0.03)
    }

    /// Creates a material for rubber (high friction, bouncy)
    pub fn rubber() -> Self {
        Self::new(0.7, 1.0, 0.8)
    }

    /// Creates a material for wood
    pub fn wood() -> Self {
        Self::new(0.2, 0.5, 0.3)
    }

    /// Creates a material for metal
    pub fn metal() -> Self {
        Self::new(0.3, 0.6, 0.4)
    }

    /// Creates a material for concrete (high friction, low restitution)
    pub fn concrete() -> Self {
        Self::new(0.05, 0.9, 0.7)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            static_friction: 0.6,
            kinetic_friction: 0.3,
        }
    }
}
