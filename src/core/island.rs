use crate::bodies::RigidBody;
use crate::collision::ArbiterKey;
use crate::core::{BodyHandle, BodyStorage, ConstraintHandle, Storage};
use std::collections::BTreeSet;

/// Bodies linked through contacts or constraints, together with those
/// links. The island is the unit of sleeping: all of its bodies share one
/// activation state.
///
/// Members are kept in ordered sets so the solver visits them in handle
/// order on every run.
#[derive(Debug, Default, Clone)]
pub struct CollisionIsland {
    pub(crate) bodies: BTreeSet<BodyHandle>,
    pub(crate) arbiters: BTreeSet<ArbiterKey>,
    pub(crate) constraints: BTreeSet<ConstraintHandle>,
}

impl CollisionIsland {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bodies(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.bodies.iter().copied()
    }

    pub fn arbiters(&self) -> impl Iterator<Item = ArbiterKey> + '_ {
        self.arbiters.iter().copied()
    }

    pub fn constraints(&self) -> impl Iterator<Item = ConstraintHandle> + '_ {
        self.constraints.iter().copied()
    }

    pub fn contains_body(&self, body: BodyHandle) -> bool {
        self.bodies.contains(&body)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn arbiter_count(&self) -> usize {
        self.arbiters.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Whether the island is awake. An empty island counts as asleep.
    pub fn is_active(&self, bodies: &BodyStorage<RigidBody>) -> bool {
        self.bodies
            .first()
            .and_then(|&handle| bodies.get(handle))
            .is_some_and(|body| body.is_active)
    }

    /// Wakes or puts to sleep every body of the island
    pub fn set_status(&self, bodies: &mut BodyStorage<RigidBody>, active: bool) {
        for &handle in &self.bodies {
            if let Some(body) = bodies.get_mut(handle) {
                body.set_active(active);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.bodies.clear();
        self.arbiters.clear();
        self.constraints.clear();
    }
}
