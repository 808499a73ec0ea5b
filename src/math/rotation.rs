use crate::math::{Matrix3, Vector3};
use std::fmt;
use std::ops::{Mul, MulAssign};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Quaternion for representing rotations in 3D space
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Quaternion {
    /// Real component
    pub w: f32,

    /// First imaginary component
    pub x: f32,

    /// Second imaginary component
    pub y: f32,

    /// Third imaginary component
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Creates a new quaternion
    #[inline]
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Creates an identity quaternion (no rotation)
    #[inline]
    pub fn identity() -> Self {
        Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Creates a quaternion from an axis-angle representation
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        let axis = axis.normalize();

        Self {
            w: c,
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
        }
    }

    /// Creates a quaternion from a rotation matrix
    pub fn from_rotation_matrix(m: &Matrix3) -> Self {
        let trace = m.trace();

        if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Self {
                w: 0.25 / s,
                x: (m.data[2][1] - m.data[1][2]) * s,
                y: (m.data[0][2] - m.data[2][0]) * s,
                z: (m.data[1][0] - m.data[0][1]) * s,
            }
        } else if m.data[0][0] > m.data[1][1] && m.data[0][0] > m.data[2][2] {
            let s = 2.0 * (1.0 + m.data[0][0] - m.data[1][1] - m.data[2][2]).sqrt();
            Self {
                w: (m.data[2][1] - m.data[1][2]) / s,
                x: 0.25 * s,
                y: (m.data[0][1] + m.data[1][0]) / s,
                z: (m.data[0][2] + m.data[2][0]) / s,
            }
        } else if m.data[1][1] > m.data[2][2] {
            let s = 2.0 * (1.0 + m.data[1][1] - m.data[0][0] - m.data[2][2]).sqrt();
            Self {
                w: (m.data[0][2] - m.data[2][0]) / s,
                x: (m.data[0][1] + m.data[1][0]) / s,
                y: 0.25 * s,
                z: (m.data[1][2] + m.data[2][1]) / s,
            }
        } else {
            let s = 2.0 * (1.0 + m.data[2][2] - m.data[0][0] - m.data[1][1]).sqrt();
            Self {
                w: (m.data[1][0] - m.data[0][1]) / s,
                x: (m.data[0][2] + m.data[2][0]) / s,
                y: (m.data[1][2] + m.data[2][1]) / s,
                z: 0.25 * s,
            }
        }
    }

    /// Converts the quaternion to a rotation matrix (column-vector convention)
    pub fn to_rotation_matrix(&self) -> Matrix3 {
        let Self { w, x, y, z } = *self;

        let xx = x * x;
        let xy = x * y;
        let xz = x * z;
        let xw = x * w;
        let yy = y * y;
        let yz = y * z;
        let yw = y * w;
        let zz = z * z;
        let zw = z * w;

        Matrix3 {
            data: [
                [1.0 - 2.0 * (yy + zz), 2.0 * (xy - zw), 2.0 * (xz + yw)],
                [2.0 * (xy + zw), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - xw)],
                [2.0 * (xz - yw), 2.0 * (yz + xw), 1.0 - 2.0 * (xx + yy)],
            ],
        }
    }

    /// Returns the conjugate of this quaternion
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self { w: self.w, x: -self.x, y: -self.y, z: -self.z }
    }

    /// Returns the squared length of this quaternion
    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Returns the length of this quaternion
    #[inline]
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Normalizes this quaternion, falling back to identity when degenerate
    #[inline]
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > crate::math::EPSILON {
            Self {
                w: self.w / len,
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        } else {
            Quaternion::identity()
        }
    }

    /// Rotates a vector by this (unit) quaternion
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        let q = Vector3::new(self.x, self.y, self.z);
        let t = q.cross(&v) * 2.0;
        v + t * self.w + q.cross(&t)
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.w, self.x, self.y, self.z)
    }
}

impl Mul for Quaternion {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }
}

impl MulAssign for Quaternion {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matrix_round_trip() {
        let q = Quaternion::from_axis_angle(Vector3::new(0.2, 1.0, -0.4), 1.1);
        let back = Quaternion::from_rotation_matrix(&q.to_rotation_matrix());
        // q and -q encode the same rotation
        let sign = if back.w * q.w < 0.0 { -1.0 } else { 1.0 };
        assert_relative_eq!(q.w, back.w * sign, epsilon = 1.0e-5);
        assert_relative_eq!(q.x, back.x * sign, epsilon = 1.0e-5);
        assert_relative_eq!(q.y, back.y * sign, epsilon = 1.0e-5);
        assert_relative_eq!(q.z, back.z * sign, epsilon = 1.0e-5);
    }

    #[test]
    fn test_rotate_vector_matches_matrix() {
        let q = Quaternion::from_axis_angle(Vector3::new(1.0, 1.0, 0.0), 0.8);
        let v = Vector3::new(0.5, -2.0, 3.0);
        assert_relative_eq!(q.rotate_vector(v), q.to_rotation_matrix() * v, epsilon = 1.0e-5);
    }
}
