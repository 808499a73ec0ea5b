use nalgebra as na;
use crate::math::Vector3;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A 3x3 row-major matrix.
///
/// Orientation matrices follow the column-vector convention: a point in body
/// space maps to world space as `orientation * local + position`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Matrix3 {
    pub data: [[f32; 3]; 3],
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix3 {
    /// Creates a new 3x3 matrix from a 2D array
    #[inline]
    pub fn new(data: [[f32; 3]; 3]) -> Self {
        Self { data }
    }

    /// Creates a new 3x3 identity matrix
    #[inline]
    pub fn identity() -> Self {
        Self {
            data: [
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a new 3x3 zero matrix
    #[inline]
    pub fn zero() -> Self {
        Self { data: [[0.0; 3]; 3] }
    }

    /// Creates a diagonal matrix
    #[inline]
    pub fn from_diagonal(diagonal: Vector3) -> Self {
        Self {
            data: [
                [diagonal.x, 0.0, 0.0],
                [0.0, diagonal.y, 0.0],
                [0.0, 0.0, diagonal.z],
            ],
        }
    }

    /// Uniformly scaled identity
    #[inline]
    pub fn from_scale(scale: f32) -> Self {
        Self::from_diagonal(Vector3::splat(scale))
    }

    /// Builds a matrix whose columns are the given vectors
    #[inline]
    pub fn from_columns(c0: Vector3, c1: Vector3, c2: Vector3) -> Self {
        Self {
            data: [
                [c0.x, c1.x, c2.x],
                [c0.y, c1.y, c2.y],
                [c0.z, c1.z, c2.z],
            ],
        }
    }

    /// Builds a matrix whose rows are the given vectors
    #[inline]
    pub fn from_rows(r0: Vector3, r1: Vector3, r2: Vector3) -> Self {
        Self {
            data: [
                [r0.x, r0.y, r0.z],
                [r1.x, r1.y, r1.z],
                [r2.x, r2.y, r2.z],
            ],
        }
    }

    /// Rotation about an arbitrary axis (right-handed)
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let Vector3 { x, y, z } = axis;

        Self {
            data: [
                [t * x * x + c, t * x * y - s * z, t * x * z + s * y],
                [t * x * y + s * z, t * y * y + c, t * y * z - s * x],
                [t * x * z - s * y, t * y * z + s * x, t * z * z + c],
            ],
        }
    }

    /// Row `i` as a vector
    #[inline]
    pub fn row(&self, i: usize) -> Vector3 {
        Vector3::new(self.data[i][0], self.data[i][1], self.data[i][2])
    }

    /// Column `j` as a vector
    #[inline]
    pub fn column(&self, j: usize) -> Vector3 {
        Vector3::new(self.data[0][j], self.data[1][j], self.data[2][j])
    }

    /// Diagonal entries
    #[inline]
    pub fn diagonal(&self) -> Vector3 {
        Vector3::new(self.data[0][0], self.data[1][1], self.data[2][2])
    }

    /// Returns the determinant of the matrix
    pub fn determinant(&self) -> f32 {
        let [[a, b, c], [d, e, f], [g, h, i]] = self.data;

        a * (e * i - f * h) -
        b * (d * i - f * g) +
        c * (d * h - e * g)
    }

    /// Returns the inverse of the matrix, or None if it is singular.
    ///
    /// Inertia tensors of small bodies have tiny determinants, so this only
    /// rejects exactly singular matrices instead of thresholding.
    pub fn inverse(&self) -> Option<Self> {
        self.to_nalgebra()
            .try_inverse()
            .map(|m| Self::from_nalgebra(&m))
            .filter(|m| m.data.iter().flatten().all(|v| v.is_finite()))
    }

    /// Returns the transpose of the matrix
    #[inline]
    pub fn transpose(&self) -> Self {
        let [[a, b, c], [d, e, f], [g, h, i]] = self.data;

        Self {
            data: [
                [a, d, g],
                [b, e, h],
                [c, f, i],
            ],
        }
    }

    /// Component-wise absolute value
    #[inline]
    pub fn absolute(&self) -> Self {
        let mut result = *self;
        for value in result.data.iter_mut().flatten() {
            *value = value.abs();
        }
        result
    }

    /// Sum of the diagonal entries
    #[inline]
    pub fn trace(&self) -> f32 {
        self.data[0][0] + self.data[1][1] + self.data[2][2]
    }

    /// Outer product `a * b^T`
    #[inline]
    pub fn outer(a: Vector3, b: Vector3) -> Self {
        Self::from_rows(b * a.x, b * a.y, b * a.z)
    }

    /// Multiplies the matrix by a vector
    #[inline]
    pub fn multiply_vector(&self, v: Vector3) -> Vector3 {
        let [[a, b, c], [d, e, f], [g, h, i]] = self.data;

        Vector3::new(
            a * v.x + b * v.y + c * v.z,
            d * v.x + e * v.y + f * v.z,
            g * v.x + h * v.y + i * v.z,
        )
    }

    /// Multiplies the transpose of the matrix by a vector without building it
    #[inline]
    pub fn transpose_multiply_vector(&self, v: Vector3) -> Vector3 {
        let [[a, b, c], [d, e, f], [g, h, i]] = self.data;

        Vector3::new(
            a * v.x + d * v.y + g * v.z,
            b * v.x + e * v.y + h * v.z,
            c * v.x + f * v.y + i * v.z,
        )
    }

    /// Multiplies the matrix by another matrix
    pub fn multiply_matrix(&self, other: &Self) -> Self {
        let mut result = Self::zero();

        for i in 0..3 {
            for j in 0..3 {
                let mut sum = 0.0;
                for k in 0..3 {
                    sum += self.data[i][k] * other.data[k][j];
                }
                result.data[i][j] = sum;
            }
        }

        result
    }

    /// Multiplies every entry by a scalar
    #[inline]
    pub fn scale(&self, s: f32) -> Self {
        let mut result = *self;
        for value in result.data.iter_mut().flatten() {
            *value *= s;
        }
        result
    }

    /// Orthonormalizes the rows with Gram-Schmidt, keeping the first row's direction
    pub fn orthonormalize(&self) -> Self {
        let x = self.column(0).normalize();
        let y = (self.column(1) - x * x.dot(&self.column(1))).normalize();
        let z = x.cross(&y);
        Self::from_columns(x, y, z)
    }

    /// Convert to nalgebra Matrix3
    #[inline]
    pub fn to_nalgebra(&self) -> na::Matrix3<f32> {
        let [[a, b, c], [d, e, f], [g, h, i]] = self.data;

        na::Matrix3::new(
            a, b, c,
            d, e, f,
            g, h, i,
        )
    }

    /// Convert from nalgebra Matrix3
    #[inline]
    pub fn from_nalgebra(m: &na::Matrix3<f32>) -> Self {
        Self {
            data: [
                [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
                [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
            ],
        }
    }
}

impl fmt::Display for Matrix3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "[ {}, {}, {} ]", self.data[0][0], self.data[0][1], self.data[0][2])?;
        writeln!(f, "[ {}, {}, {} ]", self.data[1][0], self.data[1][1], self.data[1][2])?;
        write!(f, "[ {}, {}, {} ]", self.data[2][0], self.data[2][1], self.data[2][2])
    }
}

impl Add for Matrix3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let mut result = self;
        for i in 0..3 {
            for j in 0..3 {
                result.data[i][j] += rhs.data[i][j];
            }
        }
        result
    }
}

impl AddAssign for Matrix3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Matrix3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl SubAssign for Matrix3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Matrix3 {
    type Output = Self;

    fn neg(self) -> Self {
        self.scale(-1.0)
    }
}

impl Mul for Matrix3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.multiply_matrix(&rhs)
    }
}

impl Mul<Vector3> for Matrix3 {
    type Output = Vector3;

    #[inline]
    fn mul(self, rhs: Vector3) -> Vector3 {
        self.multiply_vector(rhs)
    }
}

impl Mul<f32> for Matrix3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        self.scale(rhs)
    }
}

impl approx::AbsDiffEq for Matrix3 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.data
            .iter()
            .flatten()
            .zip(other.data.iter().flatten())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl approx::RelativeEq for Matrix3 {
    fn default_max_relative() -> f32 {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        self.data
            .iter()
            .flatten()
            .zip(other.data.iter().flatten())
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_of_small_inertia() {
        let m = Matrix3::from_diagonal(Vector3::new(1.0e-6, 2.0e-6, 4.0e-6));
        let inv = m.inverse().expect("diagonal matrix is invertible");
        assert_relative_eq!(inv * m, Matrix3::identity(), epsilon = 1.0e-4);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Matrix3::zero().inverse().is_none());
    }

    #[test]
    fn test_transpose_multiply_matches_explicit() {
        let r = Matrix3::from_axis_angle(Vector3::new(1.0, 2.0, 3.0), 0.7);
        let v = Vector3::new(0.3, -1.0, 2.0);
        assert_relative_eq!(r.transpose_multiply_vector(v), r.transpose() * v, epsilon = 1.0e-6);
    }

    #[test]
    fn test_axis_angle_rotates_x_to_y() {
        let r = Matrix3::from_axis_angle(Vector3::unit_z(), std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(r * Vector3::unit_x(), Vector3::unit_y(), epsilon = 1.0e-6);
    }
}
