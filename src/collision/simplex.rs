//! Closest point of a 1-4 point simplex to the origin, tracking witness
//! points on both shapes. Voronoi-region based alternative to Johnson's
//! distance algorithm.

use bitflags::bitflags;

use crate::math::Vector3;

const MAX_VERTICES: usize = 5;

/// Below this the tetrahedron is treated as flat
const DEGENERATE_TETRAHEDRON_EPSILON: f32 = 1e-4;

bitflags! {
    /// Simplex vertices that survive a reduction
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct UsedVertices: u8 {
        const A = 0b0001;
        const B = 0b0010;
        const C = 0b0100;
        const D = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SubSimplexResult {
    closest_point: Vector3,
    used: UsedVertices,
    barycentric: [f32; 4],
    degenerate: bool,
}

impl SubSimplexResult {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn set_barycentric(&mut self, a: f32, b: f32, c: f32, d: f32) {
        self.barycentric = [a, b, c, d];
    }

    fn is_valid(&self) -> bool {
        self.barycentric.iter().all(|&c| c >= 0.0)
    }
}

/// Incremental GJK simplex with cached closest point and witness points.
#[derive(Debug, Clone)]
pub struct VoronoiSimplexSolver {
    num_vertices: usize,
    simplex_w: [Vector3; MAX_VERTICES],
    simplex_p: [Vector3; MAX_VERTICES],
    simplex_q: [Vector3; MAX_VERTICES],

    cached_pa: Vector3,
    cached_pb: Vector3,
    cached_v: Vector3,
    last_w: Vector3,
    cached_valid_closest: bool,
    cached_bc: SubSimplexResult,
    needs_update: bool,
}

impl Default for VoronoiSimplexSolver {
    fn default() -> Self {
        let mut solver = Self {
            num_vertices: 0,
            simplex_w: [Vector3::ZERO; MAX_VERTICES],
            simplex_p: [Vector3::ZERO; MAX_VERTICES],
            simplex_q: [Vector3::ZERO; MAX_VERTICES],
            cached_pa: Vector3::ZERO,
            cached_pb: Vector3::ZERO,
            cached_v: Vector3::ZERO,
            last_w: Vector3::ZERO,
            cached_valid_closest: false,
            cached_bc: SubSimplexResult::default(),
            needs_update: true,
        };
        solver.reset();
        solver
    }
}

impl VoronoiSimplexSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the simplex
    pub fn reset(&mut self) {
        self.cached_valid_closest = false;
        self.num_vertices = 0;
        self.needs_update = true;
        self.last_w = Vector3::splat(1e30);
        self.cached_bc.reset();
    }

    /// Adds the Minkowski point `w = p - q` with its witnesses
    pub fn add_vertex(&mut self, w: Vector3, p: Vector3, q: Vector3) {
        self.last_w = w;
        self.needs_update = true;

        let n = self.num_vertices;
        self.simplex_w[n] = w;
        self.simplex_p[n] = p;
        self.simplex_q[n] = q;
        self.num_vertices += 1;
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn full_simplex(&self) -> bool {
        self.num_vertices == 4
    }

    pub fn is_empty(&self) -> bool {
        self.num_vertices == 0
    }

    /// Largest squared length among the simplex points
    pub fn max_vertex(&self) -> f32 {
        self.simplex_w[..self.num_vertices]
            .iter()
            .map(Vector3::length_squared)
            .fold(0.0, f32::max)
    }

    /// Whether `w` is already part of the simplex (or was the last point
    /// added, even if since reduced away)
    pub fn in_simplex(&self, w: Vector3) -> bool {
        w == self.last_w || self.simplex_w[..self.num_vertices].contains(&w)
    }

    /// Closest point of the simplex to the origin, reducing the simplex to
    /// the vertices that support it. `None` when the simplex is empty or
    /// degenerate.
    pub fn closest(&mut self) -> Option<Vector3> {
        if self.update_closest_vector_and_points() {
            Some(self.cached_v)
        } else {
            None
        }
    }

    /// Last computed closest vector, whether or not it was valid
    pub fn backup_closest(&self) -> Vector3 {
        self.cached_v
    }

    /// Witness points on the first and second shape
    pub fn compute_points(&mut self) -> (Vector3, Vector3) {
        self.update_closest_vector_and_points();
        (self.cached_pa, self.cached_pb)
    }

    fn remove_vertex(&mut self, index: usize) {
        self.num_vertices -= 1;
        let last = self.num_vertices;
        self.simplex_w[index] = self.simplex_w[last];
        self.simplex_p[index] = self.simplex_p[last];
        self.simplex_q[index] = self.simplex_q[last];
    }

    fn reduce_vertices(&mut self, used: UsedVertices) {
        if self.num_vertices >= 4 && !used.contains(UsedVertices::D) {
            self.remove_vertex(3);
        }
        if self.num_vertices >= 3 && !used.contains(UsedVertices::C) {
            self.remove_vertex(2);
        }
        if self.num_vertices >= 2 && !used.contains(UsedVertices::B) {
            self.remove_vertex(1);
        }
        if self.num_vertices >= 1 && !used.contains(UsedVertices::A) {
            self.remove_vertex(0);
        }
    }

    fn weighted(points: &[Vector3; MAX_VERTICES], bc: &[f32; 4]) -> Vector3 {
        points[0] * bc[0] + points[1] * bc[1] + points[2] * bc[2] + points[3] * bc[3]
    }

    fn update_closest_vector_and_points(&mut self) -> bool {
        if !self.needs_update {
            return self.cached_valid_closest;
        }
        self.cached_bc.reset();
        self.needs_update = false;

        match self.num_vertices {
            1 => {
                self.cached_pa = self.simplex_p[0];
                self.cached_pb = self.simplex_q[0];
                self.cached_v = self.cached_pa - self.cached_pb;
                self.cached_bc.set_barycentric(1.0, 0.0, 0.0, 0.0);
                self.cached_valid_closest = self.cached_bc.is_valid();
            }
            2 => {
                let from = self.simplex_w[0];
                let to = self.simplex_w[1];
                let v = to - from;
                let mut t = v.dot(&-from);

                if t > 0.0 {
                    let dot_vv = v.length_squared();
                    if t < dot_vv {
                        t /= dot_vv;
                        self.cached_bc.used = UsedVertices::A | UsedVertices::B;
                    } else {
                        t = 1.0;
                        self.cached_bc.used = UsedVertices::B;
                    }
                } else {
                    t = 0.0;
                    self.cached_bc.used = UsedVertices::A;
                }

                self.cached_bc.set_barycentric(1.0 - t, t, 0.0, 0.0);
                self.cached_pa = self.simplex_p[0] + (self.simplex_p[1] - self.simplex_p[0]) * t;
                self.cached_pb = self.simplex_q[0] + (self.simplex_q[1] - self.simplex_q[0]) * t;
                self.cached_v = self.cached_pa - self.cached_pb;

                self.reduce_vertices(self.cached_bc.used);
                self.cached_valid_closest = self.cached_bc.is_valid();
            }
            3 => {
                let [a, b, c] = [self.simplex_w[0], self.simplex_w[1], self.simplex_w[2]];
                closest_point_triangle(Vector3::ZERO, a, b, c, &mut self.cached_bc);

                self.cached_pa = Self::weighted(&self.simplex_p, &self.cached_bc.barycentric);
                self.cached_pb = Self::weighted(&self.simplex_q, &self.cached_bc.barycentric);
                self.cached_v = self.cached_pa - self.cached_pb;

                self.reduce_vertices(self.cached_bc.used);
                self.cached_valid_closest = self.cached_bc.is_valid();
            }
            4 => {
                let [a, b, c, d] = [self.simplex_w[0], self.simplex_w[1], self.simplex_w[2], self.simplex_w[3]];
                let separated = closest_point_tetrahedron(Vector3::ZERO, a, b, c, d, &mut self.cached_bc);

                if separated {
                    self.cached_pa = Self::weighted(&self.simplex_p, &self.cached_bc.barycentric);
                    self.cached_pb = Self::weighted(&self.simplex_q, &self.cached_bc.barycentric);
                    self.cached_v = self.cached_pa - self.cached_pb;
                    self.reduce_vertices(self.cached_bc.used);
                    self.cached_valid_closest = self.cached_bc.is_valid();
                } else if self.cached_bc.degenerate {
                    self.cached_valid_closest = false;
                } else {
                    // Origin inside the tetrahedron: penetration, zero distance.
                    self.cached_valid_closest = true;
                    self.cached_v = Vector3::ZERO;
                }
            }
            _ => self.cached_valid_closest = false,
        }

        self.cached_valid_closest
    }
}

/// Closest point on triangle `abc` to `p` (Ericson, Real-Time Collision
/// Detection 5.1.5)
fn closest_point_triangle(p: Vector3, a: Vector3, b: Vector3, c: Vector3, result: &mut SubSimplexResult) {
    result.used = UsedVertices::empty();

    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        result.closest_point = a;
        result.used = UsedVertices::A;
        result.set_barycentric(1.0, 0.0, 0.0, 0.0);
        return;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        result.closest_point = b;
        result.used = UsedVertices::B;
        result.set_barycentric(0.0, 1.0, 0.0, 0.0);
        return;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        result.closest_point = a + ab * v;
        result.used = UsedVertices::A | UsedVertices::B;
        result.set_barycentric(1.0 - v, v, 0.0, 0.0);
        return;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        result.closest_point = c;
        result.used = UsedVertices::C;
        result.set_barycentric(0.0, 0.0, 1.0, 0.0);
        return;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        result.closest_point = a + ac * w;
        result.used = UsedVertices::A | UsedVertices::C;
        result.set_barycentric(1.0 - w, 0.0, w, 0.0);
        return;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        result.closest_point = b + (c - b) * w;
        result.used = UsedVertices::B | UsedVertices::C;
        result.set_barycentric(0.0, 1.0 - w, w, 0.0);
        return;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    result.closest_point = a + ab * v + ac * w;
    result.used = UsedVertices::A | UsedVertices::B | UsedVertices::C;
    result.set_barycentric(1.0 - v - w, v, w, 0.0);
}

/// Side of `p` relative to plane `abc`, compared with `d`:
/// `Some(true)` when they lie on opposite sides, `None` when the
/// tetrahedron is flat.
fn point_outside_of_plane(p: Vector3, a: Vector3, b: Vector3, c: Vector3, d: Vector3) -> Option<bool> {
    let normal = (b - a).cross(&(c - a));
    let sign_p = (p - a).dot(&normal);
    let sign_d = (d - a).dot(&normal);

    if sign_d * sign_d < DEGENERATE_TETRAHEDRON_EPSILON * DEGENERATE_TETRAHEDRON_EPSILON {
        return None;
    }
    Some(sign_p * sign_d < 0.0)
}

/// Returns `false` when `p` is inside the tetrahedron or the tetrahedron is
/// degenerate (flagged on `result`).
fn closest_point_tetrahedron(
    p: Vector3,
    a: Vector3,
    b: Vector3,
    c: Vector3,
    d: Vector3,
    result: &mut SubSimplexResult,
) -> bool {
    result.closest_point = p;
    result.used = UsedVertices::all();

    let outside = [
        point_outside_of_plane(p, a, b, c, d),
        point_outside_of_plane(p, a, c, d, b),
        point_outside_of_plane(p, a, d, b, c),
        point_outside_of_plane(p, b, d, c, a),
    ];

    if outside.iter().any(Option::is_none) {
        result.degenerate = true;
        return false;
    }
    let outside = outside.map(|o| o == Some(true));
    if !outside.iter().any(|&o| o) {
        return false;
    }

    // Each face: its vertices, and where each triangle slot maps back to
    // the tetrahedron (a=0, b=1, c=2, d=3).
    let faces: [([Vector3; 3], [usize; 3], [UsedVertices; 3]); 4] = [
        ([a, b, c], [0, 1, 2], [UsedVertices::A, UsedVertices::B, UsedVertices::C]),
        ([a, c, d], [0, 2, 3], [UsedVertices::A, UsedVertices::C, UsedVertices::D]),
        ([a, d, b], [0, 3, 1], [UsedVertices::A, UsedVertices::D, UsedVertices::B]),
        ([b, d, c], [1, 3, 2], [UsedVertices::B, UsedVertices::D, UsedVertices::C]),
    ];
    let slot_flags = [UsedVertices::A, UsedVertices::B, UsedVertices::C];

    let mut best_sq_dist = f32::MAX;
    let mut temp = SubSimplexResult::default();

    for (face, is_outside) in faces.iter().zip(outside) {
        if !is_outside {
            continue;
        }
        let ([fa, fb, fc], map, flags) = face;
        closest_point_triangle(p, *fa, *fb, *fc, &mut temp);

        let sq_dist = (temp.closest_point - p).length_squared();
        if sq_dist < best_sq_dist {
            best_sq_dist = sq_dist;
            result.closest_point = temp.closest_point;
            result.used = UsedVertices::empty();
            let mut bc = [0.0; 4];
            for slot in 0..3 {
                if temp.used.contains(slot_flags[slot]) {
                    result.used |= flags[slot];
                }
                bc[map[slot]] = temp.barycentric[slot];
            }
            result.barycentric = bc;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_segment_reduces_to_closest_vertex() {
        let mut s = VoronoiSimplexSolver::new();
        s.add_vertex(Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), Vector3::ZERO);
        s.add_vertex(Vector3::new(3.0, 0.0, 0.0), Vector3::new(3.0, 0.0, 0.0), Vector3::ZERO);
        let v = s.closest().unwrap();
        assert_relative_eq!(v, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(s.num_vertices(), 1);
    }

    #[test]
    fn test_triangle_face_projection() {
        let mut s = VoronoiSimplexSolver::new();
        for w in [
            Vector3::new(-1.0, -1.0, 2.0),
            Vector3::new(1.0, -1.0, 2.0),
            Vector3::new(0.0, 1.0, 2.0),
        ] {
            s.add_vertex(w, w, Vector3::ZERO);
        }
        let v = s.closest().unwrap();
        assert_relative_eq!(v, Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-6);
        assert_eq!(s.num_vertices(), 3);
        let (pa, pb) = s.compute_points();
        assert_relative_eq!(pa - pb, v, epsilon = 1e-6);
    }

    #[test]
    fn test_tetrahedron_containing_origin() {
        let mut s = VoronoiSimplexSolver::new();
        for w in [
            Vector3::new(1.0, 0.0, -1.0),
            Vector3::new(-1.0, 0.0, -1.0),
            Vector3::new(0.0, 1.0, 1.0),
            Vector3::new(0.0, -1.0, 1.0),
        ] {
            s.add_vertex(w, w, Vector3::ZERO);
        }
        assert!(s.full_simplex());
        let v = s.closest().unwrap();
        assert!(v.is_zero());
    }

    #[test]
    fn test_in_simplex_remembers_last() {
        let mut s = VoronoiSimplexSolver::new();
        let w = Vector3::new(2.0, 0.0, 0.0);
        s.add_vertex(w, w, Vector3::ZERO);
        assert!(s.in_simplex(w));
        s.reset();
        assert!(!s.in_simplex(w));
    }
}
