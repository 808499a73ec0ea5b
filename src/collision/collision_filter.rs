use bitflags::bitflags;

use crate::bodies::RigidBody;
use crate::core::BodyHandle;

bitflags! {
    /// Collision group membership and masks
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
    pub struct CollisionGroups: u32 {
        /// Default group (collides with everything)
        const DEFAULT   = 0x0000_0001;

        /// Static world objects
        const STATIC    = 0x0000_0002;

        /// Dynamic objects
        const DYNAMIC   = 0x0000_0004;

        /// Particles
        const PARTICLE  = 0x0000_0008;

        /// Debris objects
        const DEBRIS    = 0x0000_0010;

        const USER1     = 0x0001_0000;
        const USER2     = 0x0002_0000;
        const USER3     = 0x0004_0000;
        const USER4     = 0x0008_0000;

        /// All groups
        const ALL       = 0xFFFF_FFFF;
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        CollisionGroups::DEFAULT
    }
}

/// Decides which candidate pairs reach the narrow phase
pub trait CollisionFilter: Send + Sync {
    /// Returns whether the two bodies should be tested for collision
    fn should_collide(
        &self,
        handle_a: BodyHandle,
        body_a: &RigidBody,
        handle_b: BodyHandle,
        body_b: &RigidBody,
    ) -> bool;
}

/// A filter based on collision groups and masks. Bodies without an entry
/// are in [`CollisionGroups::DEFAULT`] and collide with everything.
#[derive(Debug, Clone, Default)]
pub struct GroupMaskFilter {
    groups: Vec<CollisionGroups>,
    masks: Vec<CollisionGroups>,
}

impl GroupMaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collision group for a body
    pub fn set_group(&mut self, handle: BodyHandle, group: CollisionGroups) {
        let index = handle.index();
        if index >= self.groups.len() {
            self.groups.resize(index + 1, CollisionGroups::DEFAULT);
        }
        self.groups[index] = group;
    }

    /// Sets the groups a body collides with
    pub fn set_mask(&mut self, handle: BodyHandle, mask: CollisionGroups) {
        let index = handle.index();
        if index >= self.masks.len() {
            self.masks.resize(index + 1, CollisionGroups::ALL);
        }
        self.masks[index] = mask;
    }

    pub fn group(&self, handle: BodyHandle) -> CollisionGroups {
        self.groups.get(handle.index()).copied().unwrap_or_default()
    }

    pub fn mask(&self, handle: BodyHandle) -> CollisionGroups {
        self.masks
            .get(handle.index())
            .copied()
            .unwrap_or(CollisionGroups::ALL)
    }
}

impl CollisionFilter for GroupMaskFilter {
    fn should_collide(
        &self,
        handle_a: BodyHandle,
        _body_a: &RigidBody,
        handle_b: BodyHandle,
        _body_b: &RigidBody,
    ) -> bool {
        // A collides with B if A's mask includes B's group and B's mask includes A's group
        self.mask(handle_a).intersects(self.group(handle_b))
            && self.mask(handle_b).intersects(self.group(handle_a))
    }
}
