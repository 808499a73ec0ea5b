pub mod math;
pub mod core;
pub mod bodies;
pub mod shapes;
pub mod collision;
pub mod constraints;

/// Re-export common types for easier usage
pub use crate::core::{BodyHandle, ConstraintHandle, DebugDrawer, SimulationConfig, World};
pub use crate::bodies::{Material, RigidBody};
pub use crate::collision::ContactSettings;
pub use crate::shapes::{Shape, ShapeKind, SharedShape};
pub use crate::math::{Matrix3, Vector3};

/// Error types for the physics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Resource not found: {0}")]
        ResourceNotFound(String),

        #[error("Invalid operation: {0}")]
        InvalidOperation(String),

        #[error("Unsupported shape: {0}")]
        UnsupportedShape(String),
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
