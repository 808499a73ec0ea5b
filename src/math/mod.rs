mod vector;
mod matrix;
mod rotation;
mod aabb;

pub use vector::Vector3;
pub use matrix::Matrix3;
pub use rotation::Quaternion;
pub use aabb::{Aabb, ContainmentType};

/// Constant for a very small number, used for comparisons
pub const EPSILON: f32 = 1.0e-6;

/// Machine-level epsilon used by the convex collision algorithms
pub const COLLISION_EPSILON: f32 = 1.192_092_9e-12;

/// Squared [`COLLISION_EPSILON`], the cut-off for "nearly zero" vectors
pub const ZERO_EPSILON_SQ: f32 = COLLISION_EPSILON * COLLISION_EPSILON;

/// Returns true if the two floating point values are approximately equal
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Returns true if the value is approximately zero
#[inline]
pub fn approx_zero(a: f32) -> bool {
    a.abs() < EPSILON
}

/// Clamps a value between a minimum and maximum value
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}
