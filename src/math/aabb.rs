use crate::math::{Matrix3, Vector3, EPSILON};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Result of testing one box against another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainmentType {
    /// No overlap at all
    Disjoint,
    /// Partial overlap
    Intersects,
    /// The tested box lies entirely inside
    Contains,
}

/// Axis-Aligned Bounding Box (AABB)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner of the AABB
    pub min: Vector3,

    /// Maximum corner of the AABB
    pub max: Vector3,
}

impl Aabb {
    /// A box covering (almost) all of space
    pub const LARGE: Self = Self {
        min: Vector3::new(-1.0e30, -1.0e30, -1.0e30),
        max: Vector3::new(1.0e30, 1.0e30, 1.0e30),
    };

    /// An inverted box; merging anything into it yields that thing
    pub const SMALL: Self = Self {
        min: Vector3::new(1.0e30, 1.0e30, 1.0e30),
        max: Vector3::new(-1.0e30, -1.0e30, -1.0e30),
    };

    /// Creates a new AABB from minimum and maximum points
    #[inline]
    pub fn new(min: Vector3, max: Vector3) -> Self {
        Self { min, max }
    }

    /// Creates an AABB centered at a position with the given half extents
    #[inline]
    pub fn from_center_half_extents(center: Vector3, half_extents: Vector3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Creates an AABB from a set of points
    pub fn from_points(points: &[Vector3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut result = Self::new(*first, *first);
        for point in rest {
            result.add_point(*point);
        }
        Some(result)
    }

    /// Returns the center of the AABB
    #[inline]
    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the extents of the AABB in each dimension
    #[inline]
    pub fn extents(&self) -> Vector3 {
        self.max - self.min
    }

    /// Returns half the extents of the AABB in each dimension
    #[inline]
    pub fn half_extents(&self) -> Vector3 {
        self.extents() * 0.5
    }

    /// Sum of the edge lengths times four, used as a cheap size heuristic
    #[inline]
    pub fn perimeter(&self) -> f32 {
        let e = self.extents();
        4.0 * (e.x + e.y + e.z)
    }

    /// The eight corner points
    pub fn corners(&self) -> [Vector3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vector3::new(a.x, a.y, a.z),
            Vector3::new(b.x, a.y, a.z),
            Vector3::new(b.x, b.y, a.z),
            Vector3::new(a.x, b.y, a.z),
            Vector3::new(a.x, a.y, b.z),
            Vector3::new(b.x, a.y, b.z),
            Vector3::new(b.x, b.y, b.z),
            Vector3::new(a.x, b.y, b.z),
        ]
    }

    /// Checks if this AABB contains a point
    #[inline]
    pub fn contains_point(&self, point: Vector3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Classifies how `other` relates to this box
    pub fn contains(&self, other: &Self) -> ContainmentType {
        if self.max.x < other.min.x || self.min.x > other.max.x ||
           self.max.y < other.min.y || self.min.y > other.max.y ||
           self.max.z < other.min.z || self.min.z > other.max.z {
            return ContainmentType::Disjoint;
        }

        if self.min.x <= other.min.x && other.max.x <= self.max.x &&
           self.min.y <= other.min.y && other.max.y <= self.max.y &&
           self.min.z <= other.min.z && other.max.z <= self.max.z {
            ContainmentType::Contains
        } else {
            ContainmentType::Intersects
        }
    }

    /// Checks if this AABB intersects with another AABB
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.contains(other) != ContainmentType::Disjoint
    }

    /// Returns the union of this AABB with another
    #[inline]
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Grows this AABB to include a point
    #[inline]
    pub fn add_point(&mut self, point: Vector3) {
        self.min = self.min.min(&point);
        self.max = self.max.max(&point);
    }

    /// Expands this AABB by a margin in all directions
    #[inline]
    pub fn expand(&self, margin: f32) -> Self {
        let margin = Vector3::splat(margin);
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Returns the box translated by `offset`
    #[inline]
    pub fn translated(&self, offset: Vector3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Rotates the box about the origin and returns the enclosing box
    pub fn transform(&self, orientation: &Matrix3) -> Self {
        let center = orientation.multiply_vector(self.center());
        let half = orientation.absolute().multiply_vector(self.half_extents());
        Self::from_center_half_extents(center, half)
    }

    /// Maps a world-space box into the local space of a body at
    /// `position`/`orientation`, returning the enclosing local box.
    pub fn inverse_transform(&self, position: Vector3, orientation: &Matrix3) -> Self {
        let center = orientation.transpose_multiply_vector(self.center() - position);
        let half = orientation.absolute().transpose_multiply_vector(self.half_extents());
        Self::from_center_half_extents(center, half)
    }

    /// Tests the segment `origin .. origin + direction` against the box
    pub fn segment_intersect(&self, origin: Vector3, direction: Vector3) -> bool {
        self.clip(origin, direction, 0.0, 1.0).is_some()
    }

    /// Tests the ray `origin + t * direction`, `t >= 0`, against the box
    pub fn ray_intersect(&self, origin: Vector3, direction: Vector3) -> bool {
        self.clip(origin, direction, 0.0, f32::INFINITY).is_some()
    }

    /// Returns the parameter interval where the line is inside the box
    pub fn clip(&self, origin: Vector3, direction: Vector3, enter: f32, exit: f32) -> Option<(f32, f32)> {
        let mut enter = enter;
        let mut exit = exit;
        for axis in 0..3 {
            if !intersect_1d(origin[axis], direction[axis], self.min[axis], self.max[axis], &mut enter, &mut exit) {
                return None;
            }
        }
        Some((enter, exit))
    }
}

fn intersect_1d(start: f32, dir: f32, min: f32, max: f32, enter: &mut f32, exit: &mut f32) -> bool {
    if dir * dir < EPSILON * EPSILON {
        return start >= min && start <= max;
    }

    let mut t0 = (min - start) / dir;
    let mut t1 = (max - start) / dir;
    if t0 > t1 {
        std::mem::swap(&mut t0, &mut t1);
    }

    if t0 > *exit || t1 < *enter {
        return false;
    }

    if t0 > *enter {
        *enter = t0;
    }
    if t1 < *exit {
        *exit = t1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_containment() {
        let outer = Aabb::new(Vector3::splat(-2.0), Vector3::splat(2.0));
        let inner = Aabb::new(Vector3::splat(-1.0), Vector3::splat(1.0));
        let far = inner.translated(Vector3::new(10.0, 0.0, 0.0));
        let straddling = inner.translated(Vector3::new(2.0, 0.0, 0.0));

        assert_eq!(outer.contains(&inner), ContainmentType::Contains);
        assert_eq!(outer.contains(&far), ContainmentType::Disjoint);
        assert_eq!(outer.contains(&straddling), ContainmentType::Intersects);
    }

    #[test]
    fn test_segment_needs_all_axes_to_overlap() {
        let b = Aabb::new(Vector3::splat(-1.0), Vector3::splat(1.0));
        assert!(b.segment_intersect(Vector3::new(-5.0, 0.0, 0.0), Vector3::new(10.0, 0.0, 0.0)));
        assert!(!b.segment_intersect(Vector3::new(-5.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0)));
        // x interval overlaps, y interval doesn't
        assert!(!b.segment_intersect(Vector3::new(-5.0, 3.0, 0.0), Vector3::new(10.0, 0.5, 0.0)));
        assert!(b.ray_intersect(Vector3::new(-5.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_transform_rotated_box() {
        let b = Aabb::new(Vector3::new(-1.0, -0.5, -0.5), Vector3::new(1.0, 0.5, 0.5));
        let r = Matrix3::from_axis_angle(Vector3::unit_z(), std::f32::consts::FRAC_PI_2);
        let t = b.transform(&r);
        assert_relative_eq!(t.max, Vector3::new(0.5, 1.0, 0.5), epsilon = 1.0e-5);

        let back = t.inverse_transform(Vector3::ZERO, &r);
        assert_relative_eq!(back.max, b.max, epsilon = 1.0e-5);
    }
}
