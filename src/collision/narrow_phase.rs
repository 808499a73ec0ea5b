use crate::bodies::RigidBody;
use crate::collision::{support_transformed, xeno_collide, Gjk, RayHit};
use crate::core::{BodyHandle, SimulationConfig};
use crate::math::Vector3;
use crate::shapes::{Shape, ShapeKind, SupportMapping};

/// One contact found by the narrow phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionReport {
    pub body1: BodyHandle,
    pub body2: BodyHandle,
    /// Deepest point of body1 toward body2, world space
    pub point1: Vector3,
    /// Deepest point of body2 toward body1, world space
    pub point2: Vector3,
    /// Unit normal pointing from body2 toward body1
    pub normal: Vector3,
    /// Positive when overlapping, negative for speculative contacts
    pub penetration: f32,
}

impl CollisionReport {
    /// Points and normal as seen with `body1` as the first body
    pub fn oriented_for(&self, body1: BodyHandle) -> (Vector3, Vector3, Vector3) {
        if body1 == self.body1 {
            (self.point1, self.point2, self.normal)
        } else {
            (self.point2, self.point1, -self.normal)
        }
    }
}

/// A ray hit on a specific body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyRayHit {
    pub body: BodyHandle,
    pub fraction: f32,
    pub normal: Vector3,
}

/// Exact collision tests between the bodies of a candidate pair
#[derive(Debug, Default)]
pub struct NarrowPhase {
    gjk: Gjk,
    /// Create speculative contacts for every separated pair, not only for
    /// bodies that ask for them
    pub speculative_contacts: bool,
    /// Report the terrain face normal instead of the penetration normal
    pub use_terrain_normal: bool,
    /// Report the mesh face normal instead of the penetration normal
    pub use_triangle_mesh_normal: bool,
}

impl NarrowPhase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            gjk: Gjk::new(),
            speculative_contacts: config.speculative_contacts,
            use_terrain_normal: config.use_terrain_normal,
            use_triangle_mesh_normal: config.use_triangle_mesh_normal,
        }
    }

    pub fn gjk(&self) -> &Gjk {
        &self.gjk
    }

    /// Collides two bodies and returns every contact found
    pub fn detect(
        &self,
        handle1: BodyHandle,
        body1: &RigidBody,
        handle2: BodyHandle,
        body2: &RigidBody,
    ) -> Vec<CollisionReport> {
        let mut reports = Vec::new();
        self.detect_into(handle1, body1, handle2, body2, &mut reports);
        reports
    }

    /// Like [`detect`](Self::detect) but appends to `out`
    pub fn detect_into(
        &self,
        handle1: BodyHandle,
        body1: &RigidBody,
        handle2: BodyHandle,
        body2: &RigidBody,
        out: &mut Vec<CollisionReport>,
    ) {
        let speculative = self.speculative_contacts
            || body1.enable_speculative_contacts
            || body2.enable_speculative_contacts;

        let shape1 = body1.shape.read_recursive();
        let shape2 = body2.shape.read_recursive();

        let a = Side { handle: handle1, body: body1 };
        let b = Side { handle: handle2, body: body2 };

        match (shape1.is_multishape(), shape2.is_multishape()) {
            (false, false) => {
                self.collide(&a, &*shape1, &b, &*shape2, speculative, None, out);
            }
            (true, true) => {
                self.collide_multi_multi(&a, &shape1, &b, &shape2, speculative, out);
            }
            (true, false) => {
                self.collide_multi_convex(&a, &shape1, &b, &shape2, speculative, out);
            }
            (false, true) => {
                self.collide_multi_convex(&b, &shape2, &a, &shape1, speculative, out);
            }
        }
    }

    fn face_normal_enabled(&self, shape: &Shape) -> bool {
        match shape.kind() {
            ShapeKind::Terrain(_) => self.use_terrain_normal,
            ShapeKind::TriangleMesh(_) => self.use_triangle_mesh_normal,
            _ => false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn collide_multi_convex(
        &self,
        multi: &Side<'_>,
        multi_shape: &Shape,
        convex: &Side<'_>,
        convex_shape: &Shape,
        speculative: bool,
        out: &mut Vec<CollisionReport>,
    ) {
        let Ok(mut clone) = multi_shape.request_working_clone() else {
            return;
        };

        let region = convex
            .body
            .bounding_box
            .inverse_transform(multi.body.position, &multi.body.orientation);
        let count = clone.prepare(&region);
        let face_normal = self.face_normal_enabled(multi_shape);

        for i in 0..count {
            clone.set_current_shape(i);
            let normal = face_normal
                .then(|| multi.body.orientation.multiply_vector(clone.collision_normal()));
            self.collide(multi, &clone, convex, convex_shape, speculative, normal, out);
        }
    }

    fn collide_multi_multi(
        &self,
        a: &Side<'_>,
        shape_a: &Shape,
        b: &Side<'_>,
        shape_b: &Shape,
        speculative: bool,
        out: &mut Vec<CollisionReport>,
    ) {
        let (Ok(mut clone_a), Ok(mut clone_b)) =
            (shape_a.request_working_clone(), shape_b.request_working_clone())
        else {
            return;
        };

        let region_a = b.body.bounding_box.inverse_transform(a.body.position, &a.body.orientation);
        let count_a = clone_a.prepare(&region_a);
        let region_b = a.body.bounding_box.inverse_transform(b.body.position, &b.body.orientation);
        let count_b = clone_b.prepare(&region_b);

        for i in 0..count_a {
            clone_a.set_current_shape(i);
            for j in 0..count_b {
                clone_b.set_current_shape(j);
                self.collide(a, &clone_a, b, &clone_b, speculative, None, out);
            }
        }
    }

    /// Convex against convex. `face_normal` replaces the reported normal
    /// on a hit.
    #[allow(clippy::too_many_arguments)]
    fn collide(
        &self,
        a: &Side<'_>,
        shape_a: &dyn SupportMapping,
        b: &Side<'_>,
        shape_b: &dyn SupportMapping,
        speculative: bool,
        face_normal: Option<Vector3>,
        out: &mut Vec<CollisionReport>,
    ) {
        let (body1, body2) = (a.body, b.body);

        if let Some(hit) = xeno_collide::detect(
            shape_a,
            shape_b,
            &body1.orientation,
            &body2.orientation,
            body1.position,
            body2.position,
        ) {
            let (point1, point2) =
                find_support_points(body1, body2, shape_a, shape_b, hit.point, hit.normal);
            out.push(CollisionReport {
                body1: a.handle,
                body2: b.handle,
                point1,
                point2,
                normal: face_normal.unwrap_or(hit.normal),
                penetration: hit.penetration,
            });
            return;
        }

        if !speculative {
            return;
        }

        if let Some(closest) = self.gjk.closest_points(
            shape_a,
            shape_b,
            &body1.orientation,
            &body2.orientation,
            body1.position,
            body2.position,
        ) {
            let delta = closest.point2 - closest.point1;
            let swept = body1.swept_direction - body2.swept_direction;
            if delta.length_squared() < swept.length_squared() {
                let penetration = delta.dot(&closest.normal);
                if penetration < 0.0 {
                    out.push(CollisionReport {
                        body1: a.handle,
                        body2: b.handle,
                        point1: closest.point1,
                        point2: closest.point2,
                        normal: closest.normal,
                        penetration,
                    });
                }
            }
        }
    }

    /// Casts a ray against one body. For multishapes the sub-parts are
    /// selected with the segment `origin .. origin + direction`.
    pub fn raycast_body(&self, body: &RigidBody, origin: Vector3, direction: Vector3) -> Option<RayHit> {
        let shape = body.shape.read_recursive();

        if !shape.is_multishape() {
            return self
                .gjk
                .raycast(&*shape, &body.orientation, body.position, origin, direction);
        }

        let mut clone = shape.request_working_clone().ok()?;
        let local_origin = body.orientation.transpose_multiply_vector(origin - body.position);
        let local_direction = body.orientation.transpose_multiply_vector(direction);
        let count = clone.prepare_ray(local_origin, local_direction);
        let face_normal = self.face_normal_enabled(&shape);

        let mut best: Option<RayHit> = None;
        for i in 0..count {
            clone.set_current_shape(i);
            let Some(mut hit) =
                self.gjk
                    .raycast(&clone, &body.orientation, body.position, origin, direction)
            else {
                continue;
            };
            if best.map_or(true, |b| hit.fraction < b.fraction) {
                if face_normal {
                    hit.normal = -body.orientation.multiply_vector(clone.collision_normal());
                }
                best = Some(hit);
            }
        }
        best
    }
}

struct Side<'a> {
    handle: BodyHandle,
    body: &'a RigidBody,
}

/// Moves the contact point onto each surface: the deepest point of body1
/// along -normal and of body2 along +normal, projected on the normal line
/// through `point`.
pub fn find_support_points(
    body1: &RigidBody,
    body2: &RigidBody,
    shape1: &dyn SupportMapping,
    shape2: &dyn SupportMapping,
    point: Vector3,
    normal: Vector3,
) -> (Vector3, Vector3) {
    let sa = support_transformed(shape1, &body1.orientation, body1.position, -normal);
    let sb = support_transformed(shape2, &body2.orientation, body2.position, normal);

    let point1 = point + normal * (sa - point).dot(&normal);
    let point2 = point + normal * (sb - point).dot(&normal);
    (point1, point2)
}
