use crate::error::PhysicsError;
use crate::math::{Aabb, Matrix3, Vector3};
use crate::shapes::{CloneState, MassProperties, SupportMapping};
use crate::Result;

/// Height field over the local xz plane. `heights[x][z]` is the height of
/// grid point `(x * scale_x, z * scale_z)`; every grid quad is split into
/// two triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainShape {
    heights: Vec<Vec<f32>>,
    scale_x: f32,
    scale_z: f32,
    spherical_expansion: f32,
    boundings: Aabb,
}

impl TerrainShape {
    /// Creates a terrain from a rectangular grid of heights
    pub fn new(heights: Vec<Vec<f32>>, scale_x: f32, scale_z: f32) -> Self {
        let mut terrain = Self {
            heights,
            scale_x,
            scale_z,
            spherical_expansion: 0.05,
            boundings: Aabb::SMALL,
        };
        terrain.update_boundings();
        terrain
    }

    /// Grid points along x
    pub fn len_x(&self) -> usize {
        self.heights.len()
    }

    /// Grid points along z
    pub fn len_z(&self) -> usize {
        self.heights.first().map_or(0, Vec::len)
    }

    /// Height at a grid point
    pub fn height(&self, x: usize, z: usize) -> Option<f32> {
        self.heights.get(x).and_then(|row| row.get(z)).copied()
    }

    /// Changes a single height
    pub fn set_height(&mut self, x: usize, z: usize, height: f32) -> Result<()> {
        let cell = self
            .heights
            .get_mut(x)
            .and_then(|row| row.get_mut(z))
            .ok_or_else(|| PhysicsError::InvalidParameter(format!("grid point ({}, {}) out of range", x, z)))?;
        *cell = height;
        self.update_boundings();
        Ok(())
    }

    /// Margin added around every triangle for robust contacts
    pub fn spherical_expansion(&self) -> f32 {
        self.spherical_expansion
    }

    /// Sets the margin added around every triangle
    pub fn set_spherical_expansion(&mut self, expansion: f32) {
        self.spherical_expansion = expansion;
    }

    fn update_boundings(&mut self) {
        let (lo, hi) = self
            .heights
            .iter()
            .flatten()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), h| (lo.min(*h), hi.max(*h)));
        let span_x = self.len_x().saturating_sub(1) as f32 * self.scale_x;
        let span_z = self.len_z().saturating_sub(1) as f32 * self.scale_z;
        self.boundings = Aabb::new(Vector3::new(0.0, lo, 0.0), Vector3::new(span_x, hi, span_z));
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let (nx, nz) = (self.len_x(), self.len_z());
        if nx < 2 || nz < 2 {
            return Err(PhysicsError::InvalidParameter(format!(
                "terrain needs at least 2x2 heights, got {}x{}",
                nx, nz
            )));
        }
        if self.heights.iter().any(|row| row.len() != nz) {
            return Err(PhysicsError::InvalidParameter("terrain heights must be rectangular".into()));
        }
        if !(self.scale_x > 0.0 && self.scale_z > 0.0) {
            return Err(PhysicsError::InvalidParameter("terrain scale must be positive".into()));
        }
        if self.heights.iter().flatten().any(|h| !h.is_finite()) {
            return Err(PhysicsError::InvalidParameter("terrain height is not finite".into()));
        }
        Ok(())
    }

    fn point(&self, x: usize, z: usize) -> Vector3 {
        Vector3::new(x as f32 * self.scale_x, self.heights[x][z], z as f32 * self.scale_z)
    }

    /// The two triangles of quad `(x, z)`; `left` selects the one at the
    /// quad's origin corner.
    fn triangle(&self, x: usize, z: usize, left: bool) -> [Vector3; 3] {
        if left {
            [self.point(x, z), self.point(x + 1, z), self.point(x, z + 1)]
        } else {
            [self.point(x + 1, z), self.point(x + 1, z + 1), self.point(x, z + 1)]
        }
    }

    pub(crate) fn bounding_box(&self, orientation: &Matrix3) -> Aabb {
        self.boundings.expand(self.spherical_expansion).transform(orientation)
    }

    /// A terrain is static scenery; it gets unit mass and inertia.
    pub(crate) fn mass_properties(&self) -> MassProperties {
        MassProperties::default()
    }

    pub(crate) fn make_hull(&self) -> Vec<Vector3> {
        let mut triangles = Vec::new();
        for x in 0..self.len_x() - 1 {
            for z in 0..self.len_z() - 1 {
                triangles.extend_from_slice(&self.triangle(x, z, true));
                triangles.extend_from_slice(&self.triangle(x, z, false));
            }
        }
        triangles
    }

    /// Grid window covered by `region`, in whole grid cells
    fn grid_range(&self, region: &Aabb) -> [usize; 4] {
        let exp = self.spherical_expansion;
        let last_x = self.len_x() as i64 - 1;
        let last_z = self.len_z() as i64 - 1;

        let min_x = if region.min.x < self.boundings.min.x {
            0
        } else {
            (((region.min.x - exp) / self.scale_x).floor() as i64).max(0)
        };
        let max_x = if region.max.x > self.boundings.max.x {
            last_x
        } else {
            (((region.max.x + exp) / self.scale_x).ceil() as i64).min(last_x)
        };
        let min_z = if region.min.z < self.boundings.min.z {
            0
        } else {
            (((region.min.z - exp) / self.scale_z).floor() as i64).max(0)
        };
        let max_z = if region.max.z > self.boundings.max.z {
            last_z
        } else {
            (((region.max.z + exp) / self.scale_z).ceil() as i64).min(last_z)
        };

        [
            min_x as usize,
            min_z as usize,
            (max_x - min_x).max(0) as usize,
            (max_z - min_z).max(0) as usize,
        ]
    }

    pub(crate) fn prepare(&self, state: &mut CloneState, region: &Aabb) -> usize {
        state.grid = self.grid_range(region);
        state.grid[2] * state.grid[3] * 2
    }

    pub(crate) fn prepare_ray(&self, state: &mut CloneState, origin: Vector3, delta: Vector3) -> usize {
        let end = origin + delta + delta.normalize() * self.spherical_expansion;
        let mut region = Aabb::new(origin, origin);
        region.add_point(end);
        self.prepare(state, &region)
    }

    /// Indices `0..n` are the right-hand triangles of the window, `n..2n`
    /// the left-hand ones.
    pub(crate) fn set_current(&self, state: &mut CloneState, index: usize) {
        let [min_x, min_z, num_x, num_z] = state.grid;
        let quads = num_x * num_z;
        if quads == 0 {
            return;
        }

        let (left, index) = if index >= quads { (true, index - quads) } else { (false, index) };
        let x = min_x + index % num_x;
        let z = min_z + index / num_x;

        let tri = self.triangle(x, z, left);
        state.triangle = tri;
        state.center = (tri[0] + tri[1] + tri[2]) * (1.0 / 3.0);
        state.normal = (tri[1] - tri[0]).cross(&(tri[2] - tri[0])).normalize();
    }

    pub(crate) fn current_support(&self, state: &CloneState, direction: Vector3) -> Vector3 {
        triangle_support(&state.triangle, direction, self.spherical_expansion)
    }
}

/// Support of a triangle inflated by a sphere of radius `expansion`
pub(crate) fn triangle_support(triangle: &[Vector3; 3], direction: Vector3, expansion: f32) -> Vector3 {
    let mut best = 0;
    let mut best_dot = triangle[0].dot(&direction);
    for (i, p) in triangle.iter().enumerate().skip(1) {
        let d = p.dot(&direction);
        if d > best_dot {
            best_dot = d;
            best = i;
        }
    }
    triangle[best] + direction.normalize() * expansion
}

impl SupportMapping for TerrainShape {
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        let mut best = Vector3::ZERO;
        let mut best_dot = f32::NEG_INFINITY;
        for x in 0..self.len_x() {
            for z in 0..self.len_z() {
                let p = self.point(x, z);
                let d = p.dot(&direction);
                if d > best_dot {
                    best_dot = d;
                    best = p;
                }
            }
        }
        best + direction.normalize() * self.spherical_expansion
    }

    fn support_center(&self) -> Vector3 {
        self.boundings.center()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_window_is_clamped() {
        let terrain = TerrainShape::new(vec![vec![0.0; 5]; 5], 1.0, 1.0);
        let all = terrain.grid_range(&Aabb::LARGE);
        assert_eq!(all, [0, 0, 4, 4]);

        let small = terrain.grid_range(&Aabb::new(Vector3::new(1.2, -1.0, 1.2), Vector3::new(1.8, 1.0, 1.8)));
        assert_eq!(small, [1, 1, 1, 1]);
    }

    #[test]
    fn test_flat_triangle_normal_points_down() {
        let terrain = TerrainShape::new(vec![vec![0.0; 3]; 3], 1.0, 1.0);
        let mut state = CloneState::default();
        let count = terrain.prepare(&mut state, &Aabb::LARGE);
        assert_eq!(count, 8);
        terrain.set_current(&mut state, 0);
        assert!(state.normal.y < -0.99);
    }
}
