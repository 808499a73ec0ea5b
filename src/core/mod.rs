pub mod world;
pub mod config;
pub mod storage;
pub mod events;
pub mod pool;
pub mod debug_draw;
mod island;
mod island_manager;

pub use self::world::World;
pub use self::config::SimulationConfig;
pub use self::storage::{Arena, ArenaHandle, BodyStorage, ConstraintStorage, Storage};
pub use self::events::{BodyEvent, BodyEventType, CollisionEvent, CollisionEventType, EventQueue};
pub use self::pool::Pool;
pub use self::debug_draw::DebugDrawer;
pub use self::island::CollisionIsland;
pub use self::island_manager::IslandManager;

use crate::math::Vector3;

/// Identifies a body by its slot in the world's body table.
///
/// Handles are never reused, so ordering by handle is stable for the
/// lifetime of a world and gives a deterministic pair order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u32);

impl BodyHandle {
    /// Creates a handle for the given table index
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// The table index of this handle
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A unique identifier for a constraint in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub(crate) u32);

impl ConstraintHandle {
    /// Creates a handle for the given table index
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// The table index of this handle
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies a collision island inside an [`IslandManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IslandId(pub(crate) u32);

/// A contact point between two bodies, as reported in events
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    /// The position of the contact point on the first body, in world space
    pub position: Vector3,

    /// The contact normal, pointing from the second body toward the first
    pub normal: Vector3,

    /// The penetration depth of the contact
    pub penetration: f32,
}
