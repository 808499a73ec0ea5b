pub mod simplex;
pub mod gjk;
pub mod xeno_collide;
mod narrow_phase;
mod broad_phase;
mod collision_filter;
mod contact;
mod contact_list;
mod contact_settings;
mod arbiter;
mod arbiter_map;

pub use self::simplex::VoronoiSimplexSolver;
pub use self::gjk::{ClosestPoints, Gjk, RayHit};
pub use self::xeno_collide::Penetration;
pub use self::narrow_phase::{BodyRayHit, CollisionReport, NarrowPhase};
pub use self::broad_phase::{BroadPhase, BruteForceBroadPhase, SweepAndPruneBroadPhase};
pub use self::collision_filter::{CollisionFilter, CollisionGroups, GroupMaskFilter};
pub use self::contact::Contact;
pub use self::contact_list::{ContactList, MAX_CONTACTS};
pub use self::contact_settings::{ContactSettings, MaterialCoefficientMixing};
pub use self::arbiter::Arbiter;
pub use self::arbiter_map::{ArbiterKey, ArbiterMap};

use crate::math::{Matrix3, Vector3};
use crate::shapes::SupportMapping;

/// Support point of a shape placed in the world: the query direction is
/// rotated into the shape frame and the answer rotated back out.
#[inline]
pub(crate) fn support_transformed(
    shape: &dyn SupportMapping,
    orientation: &Matrix3,
    position: Vector3,
    direction: Vector3,
) -> Vector3 {
    let local = shape.support_mapping(orientation.transpose_multiply_vector(direction));
    orientation.multiply_vector(local) + position
}
