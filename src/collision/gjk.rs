//! GJK queries on a single shape or a pair of shapes: point containment,
//! closest points and ray casts.

use parking_lot::Mutex;

use crate::collision::simplex::VoronoiSimplexSolver;
use crate::collision::support_transformed;
use crate::core::Pool;
use crate::math::{Matrix3, Vector3, EPSILON};
use crate::shapes::SupportMapping;

const MAX_ITERATIONS: usize = 15;

const POINTCAST_EPSILON: f32 = 1e-4;
const CLOSEST_POINTS_EPSILON: f32 = 1e-5;
const RAYCAST_EPSILON: f32 = 1e-6;

/// Relative improvement below which the closest-point search stops
const PROGRESS_EPSILON: f32 = 1e-6;

/// Witness points of the closest features of two separated shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoints {
    /// Closest point on the first shape, world space
    pub point1: Vector3,
    /// Closest point on the second shape, world space
    pub point2: Vector3,
    /// Unit separation direction, pointing from the second shape toward
    /// the first
    pub normal: Vector3,
}

impl ClosestPoints {
    /// Gap between the shapes
    pub fn distance(&self) -> f32 {
        (self.point1 - self.point2).length()
    }
}

/// Result of a ray cast against a shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Hit point is `origin + fraction * direction`
    pub fraction: f32,
    /// Surface normal at the hit point, pointing toward the ray origin
    pub normal: Vector3,
}

/// GJK solver. Simplex state lives in pooled solvers checked out per call,
/// so one `Gjk` can serve concurrent queries.
#[derive(Debug)]
pub struct Gjk {
    solvers: Mutex<Pool<VoronoiSimplexSolver>>,
}

impl Default for Gjk {
    fn default() -> Self {
        Self::new()
    }
}

impl Gjk {
    pub fn new() -> Self {
        Self {
            solvers: Mutex::new(Pool::new(VoronoiSimplexSolver::new)),
        }
    }

    fn checkout(&self) -> VoronoiSimplexSolver {
        let mut solver = self.solvers.lock().acquire();
        solver.reset();
        solver
    }

    fn give_back(&self, solver: VoronoiSimplexSolver) {
        self.solvers.lock().release(solver);
    }

    /// Solvers built so far; stays small when every call returns its solver
    pub fn solvers_created(&self) -> usize {
        self.solvers.lock().created()
    }

    /// Whether `point` lies inside the shape placed at `position` with
    /// `orientation`
    pub fn point_in_shape(
        &self,
        shape: &dyn SupportMapping,
        orientation: &Matrix3,
        position: Vector3,
        point: Vector3,
    ) -> bool {
        let center = orientation.multiply_vector(shape.support_center()) + position;
        let r = point - center;
        let x = point;

        // Any starting direction works; this one is a point on the surface.
        let mut v = support_transformed(shape, orientation, position, point);
        let mut dist = v.length_squared();

        let mut solver = self.checkout();
        let mut iterations = MAX_ITERATIONS;

        while dist > POINTCAST_EPSILON && iterations > 0 {
            iterations -= 1;

            let p = support_transformed(shape, orientation, position, v);
            let w = x - p;

            if v.dot(&w) > 0.0 {
                if v.dot(&r) >= -(EPSILON * EPSILON) {
                    self.give_back(solver);
                    return false;
                }
                solver.reset();
            }
            if !solver.in_simplex(w) {
                solver.add_vertex(w, x, p);
            }

            dist = match solver.closest() {
                Some(closest) => {
                    v = closest;
                    v.length_squared()
                }
                None => 0.0,
            };
        }

        self.give_back(solver);
        true
    }

    /// Closest points between two convex shapes. `None` when they overlap,
    /// since there is no separation to report.
    #[allow(clippy::too_many_arguments)]
    pub fn closest_points(
        &self,
        shape1: &dyn SupportMapping,
        shape2: &dyn SupportMapping,
        orientation1: &Matrix3,
        orientation2: &Matrix3,
        position1: Vector3,
        position2: Vector3,
    ) -> Option<ClosestPoints> {
        let mut solver = self.checkout();

        let r = position1 - position2;
        let sup_a = support_transformed(shape1, orientation1, position1, -r);
        let sup_b = support_transformed(shape2, orientation2, position2, r);

        let mut v = sup_a - sup_b;
        let mut normal = Vector3::ZERO;
        let mut dist_sq = v.length_squared();
        let mut iterations = MAX_ITERATIONS;

        while dist_sq > CLOSEST_POINTS_EPSILON && iterations > 0 {
            iterations -= 1;

            let sup_a = support_transformed(shape1, orientation1, position1, -v);
            let sup_b = support_transformed(shape2, orientation2, position2, v);
            let w = sup_a - sup_b;

            if !solver.is_empty() && dist_sq - v.dot(&w) <= dist_sq * PROGRESS_EPSILON {
                break;
            }
            if !solver.in_simplex(w) {
                solver.add_vertex(w, sup_a, sup_b);
            }
            dist_sq = match solver.closest() {
                Some(closest) => {
                    v = closest;
                    normal = closest;
                    v.length_squared()
                }
                None => 0.0,
            };
        }

        let (point1, point2) = solver.compute_points();
        self.give_back(solver);

        if normal.length_squared() <= EPSILON * EPSILON || dist_sq <= 0.0 {
            return None;
        }

        Some(ClosestPoints {
            point1,
            point2,
            normal: normal.normalize(),
        })
    }

    /// Casts the ray `origin + t * direction`, `t >= 0`, against a shape
    pub fn raycast(
        &self,
        shape: &dyn SupportMapping,
        orientation: &Matrix3,
        position: Vector3,
        origin: Vector3,
        direction: Vector3,
    ) -> Option<RayHit> {
        let mut solver = self.checkout();

        let r = direction;
        let mut x = origin;
        let mut lambda = 0.0;
        let mut normal = Vector3::ZERO;

        let arbitrary = support_transformed(shape, orientation, position, r);
        let mut v = x - arbitrary;
        let mut dist_sq = v.length_squared();
        let mut iterations = MAX_ITERATIONS;

        while dist_sq > RAYCAST_EPSILON && iterations > 0 {
            iterations -= 1;

            let p = support_transformed(shape, orientation, position, v);
            let mut w = x - p;

            let v_dot_w = v.dot(&w);
            if v_dot_w > 0.0 {
                let v_dot_r = v.dot(&r);
                if v_dot_r >= -EPSILON {
                    // Moving along the ray never closes the gap.
                    self.give_back(solver);
                    return None;
                }
                lambda -= v_dot_w / v_dot_r;
                x = origin + r * lambda;
                w = x - p;
                normal = v;
            }

            if !solver.in_simplex(w) {
                solver.add_vertex(w, x, p);
            }
            dist_sq = match solver.closest() {
                Some(closest) => {
                    v = closest;
                    v.length_squared()
                }
                None => 0.0,
            };
        }

        // Measuring the witness point is more accurate than `lambda` for
        // large shapes.
        let (_, on_shape) = solver.compute_points();
        self.give_back(solver);

        let fraction = (on_shape - origin).length() / direction.length();
        if normal.length_squared() > EPSILON * EPSILON {
            normal = normal.normalize();
        }

        Some(RayHit { fraction, normal })
    }
}
