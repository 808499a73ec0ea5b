//! Minkowski portal refinement (XenoCollide, G. Snethen): boolean overlap
//! test between two convex shapes that also estimates the contact point,
//! normal and penetration depth.

use crate::collision::support_transformed;
use crate::math::{Matrix3, Vector3};
use crate::shapes::SupportMapping;

const COLLIDE_EPSILON: f32 = 1e-4;
const MAX_ITERATIONS: usize = 34;

/// Overlap reported by [`detect`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    /// Contact point in world space, halfway between the two surfaces
    pub point: Vector3,
    /// Unit normal pointing from the second shape toward the first
    pub normal: Vector3,
    /// Estimated overlap depth; positive when overlapping
    pub penetration: f32,
}

/// A point of the Minkowski difference `shape2 - shape1` with the support
/// points on each shape that produced it.
#[derive(Debug, Clone, Copy, Default)]
struct Vertex {
    v: Vector3,
    on1: Vector3,
    on2: Vector3,
}

struct Pair<'a> {
    shape1: &'a dyn SupportMapping,
    shape2: &'a dyn SupportMapping,
    orientation1: &'a Matrix3,
    orientation2: &'a Matrix3,
    position1: Vector3,
    position2: Vector3,
}

impl Pair<'_> {
    fn support(&self, direction: Vector3) -> Vertex {
        let on1 = support_transformed(self.shape1, self.orientation1, self.position1, -direction);
        let on2 = support_transformed(self.shape2, self.orientation2, self.position2, direction);
        Vertex { v: on2 - on1, on1, on2 }
    }
}

/// Tests two shapes for overlap. Iteration caps end the search without an
/// error: whatever the last completed refinement concluded is returned.
#[allow(clippy::too_many_arguments)]
pub fn detect(
    shape1: &dyn SupportMapping,
    shape2: &dyn SupportMapping,
    orientation1: &Matrix3,
    orientation2: &Matrix3,
    position1: Vector3,
    position2: Vector3,
) -> Option<Penetration> {
    let pair = Pair {
        shape1,
        shape2,
        orientation1,
        orientation2,
        position1,
        position2,
    };

    let c1 = orientation1.multiply_vector(shape1.support_center()) + position1;
    let c2 = orientation2.multiply_vector(shape2.support_center()) + position2;

    // Interior point of the Minkowski difference
    let mut v0 = c2 - c1;
    if v0.is_nearly_zero() {
        // Centers coincide; any direction will do.
        v0 = Vector3::new(0.00001, 0.0, 0.0);
    }
    let w0 = Vertex { v: v0, on1: c1, on2: c2 };

    // Support toward the origin
    let mut normal = -v0;
    let mut w1 = pair.support(normal);
    if w1.v.dot(&normal) <= 0.0 {
        return None;
    }

    normal = w1.v.cross(&v0);
    if normal.is_nearly_zero() {
        // Origin lies on the segment v0..v1.
        let normal = (w1.v - v0).normalize();
        return Some(Penetration {
            point: (w1.on1 + w1.on2) * 0.5,
            normal,
            penetration: w1.v.dot(&normal),
        });
    }

    let mut w2 = pair.support(normal);
    if w2.v.dot(&normal) <= 0.0 {
        return None;
    }

    // Orient the portal plane (v0, v1, v2) so the origin is on its positive side
    normal = (w1.v - v0).cross(&(w2.v - v0));
    if normal.dot(&v0) > 0.0 {
        std::mem::swap(&mut w1, &mut w2);
        normal = -normal;
    }

    let mut phase1 = 0;
    let mut phase2 = 0;
    let mut hit = false;

    // Phase one: find a portal the origin ray passes through
    loop {
        if phase1 > MAX_ITERATIONS {
            return None;
        }
        phase1 += 1;

        let w3 = pair.support(normal);
        if w3.v.dot(&normal) <= 0.0 {
            return None;
        }

        // Origin outside (v1, v0, v3): drop v2
        if w1.v.cross(&w3.v).dot(&v0) < 0.0 {
            w2 = w3;
            normal = (w1.v - v0).cross(&(w3.v - v0));
            continue;
        }

        // Origin outside (v3, v0, v2): drop v1
        if w3.v.cross(&w2.v).dot(&v0) < 0.0 {
            w1 = w3;
            normal = (w3.v - v0).cross(&(w2.v - v0));
            continue;
        }

        let mut w3 = w3;

        // Phase two: refine the portal toward the boundary
        loop {
            phase2 += 1;

            let previous = normal;
            normal = (w2.v - w1.v).cross(&(w3.v - w1.v));

            if normal.is_nearly_zero() {
                return Some(collapsed_portal(&w1, previous));
            }
            normal = normal.normalize();

            // Origin behind the portal face means overlap
            if normal.dot(&w1.v) >= 0.0 {
                hit = true;
            }

            let w4 = pair.support(normal);
            let delta = (w4.v - w3.v).dot(&normal);
            let penetration = w4.v.dot(&normal);

            if delta <= COLLIDE_EPSILON || penetration <= 0.0 || phase2 > MAX_ITERATIONS {
                if !hit {
                    return None;
                }
                return Some(Penetration {
                    point: contact_point(&w0, &w1, &w2, &w3, normal),
                    normal,
                    penetration,
                });
            }

            // Split the tetrahedron with the plane through v4, v0 and keep
            // the sub-portal the origin ray passes through.
            let cross = w4.v.cross(&v0);
            if cross.dot(&w1.v) >= 0.0 {
                if cross.dot(&w2.v) >= 0.0 {
                    w1 = w4;
                } else {
                    w3 = w4;
                }
            } else if cross.dot(&w3.v) >= 0.0 {
                w2 = w4;
            } else {
                w1 = w4;
            }
        }
    }
}

/// Touching contact reported when the refined portal loses its area. This
/// only happens through rounding, since every refinement step moves the
/// portal off its previous plane.
fn collapsed_portal(w1: &Vertex, previous: Vector3) -> Penetration {
    Penetration {
        point: (w1.on1 + w1.on2) * 0.5,
        normal: previous.normalize(),
        penetration: 0.0,
    }
}

/// Barycentric coordinates of the origin in the tetrahedron (v0, v1, v2,
/// v3), applied to the average of the witness points. Falls back to the
/// portal face alone when the volume weights degenerate.
fn contact_point(w0: &Vertex, w1: &Vertex, w2: &Vertex, w3: &Vertex, normal: Vector3) -> Vector3 {
    let (v0, v1, v2, v3) = (w0.v, w1.v, w2.v, w3.v);

    let mut b0 = v1.cross(&v2).dot(&v3);
    let mut b1 = v3.cross(&v2).dot(&v0);
    let mut b2 = v0.cross(&v1).dot(&v3);
    let mut b3 = v2.cross(&v1).dot(&v0);
    let mut sum = b0 + b1 + b2 + b3;

    if sum <= 0.0 {
        b0 = 0.0;
        b1 = v2.cross(&v3).dot(&normal);
        b2 = v3.cross(&v1).dot(&normal);
        b3 = v1.cross(&v2).dot(&normal);
        sum = b1 + b2 + b3;
    }

    let inv = 1.0 / sum;
    ((w0.on1 + w0.on2) * b0 + (w1.on1 + w1.on2) * b1 + (w2.on1 + w2.on2) * b2 + (w3.on1 + w3.on2) * b3)
        * (inv * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;
    use approx::assert_relative_eq;

    #[test]
    fn test_overlapping_spheres() {
        let s = Shape::sphere(1.0).unwrap();
        let id = Matrix3::identity();
        let result = detect(&s, &s, &id, &id, Vector3::ZERO, Vector3::new(1.5, 0.0, 0.0)).unwrap();
        assert_relative_eq!(result.penetration, 0.5, epsilon = 1e-3);
        assert_relative_eq!(result.normal, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-3);
        assert_relative_eq!(result.point.x, 0.75, epsilon = 1e-2);
    }

    #[test]
    fn test_separated_spheres() {
        let s = Shape::sphere(1.0).unwrap();
        let id = Matrix3::identity();
        assert!(detect(&s, &s, &id, &id, Vector3::ZERO, Vector3::new(3.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_collapsed_portal_is_a_touching_contact() {
        let w1 = Vertex {
            v: Vector3::new(0.0, -1.0, 0.0),
            on1: Vector3::new(0.0, 1.0, 0.0),
            on2: Vector3::new(0.0, 0.0, 0.0),
        };
        let result = collapsed_portal(&w1, Vector3::new(0.0, 0.0, -3.0));

        assert_eq!(result.penetration, 0.0);
        assert_relative_eq!(result.normal, Vector3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(result.normal.length(), 1.0);
        assert_relative_eq!(result.point, Vector3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn test_concentric_spheres_give_unit_normal() {
        // The first support lands on the center line, so the portal never
        // opens.
        let s = Shape::sphere(1.0).unwrap();
        let id = Matrix3::identity();
        let result = detect(&s, &s, &id, &id, Vector3::ZERO, Vector3::ZERO).unwrap();

        assert!(result.normal.x.is_finite() && result.normal.y.is_finite() && result.normal.z.is_finite());
        assert_relative_eq!(result.normal.length(), 1.0, epsilon = 1e-4);
        assert_relative_eq!(result.penetration, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_resting_box_on_box() {
        let a = Shape::cuboid(Vector3::new(10.0, 1.0, 10.0)).unwrap();
        let b = Shape::cuboid(Vector3::new(1.0, 1.0, 1.0)).unwrap();
        let id = Matrix3::identity();
        let result = detect(&b, &a, &id, &id, Vector3::new(0.0, 0.9, 0.0), Vector3::ZERO).unwrap();
        assert_relative_eq!(result.normal, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-3);
        assert_relative_eq!(result.penetration, 0.1, epsilon = 1e-3);
    }
}
