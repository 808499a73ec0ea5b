use crate::bodies::RigidBody;
use crate::core::{BodyHandle, BodyStorage, Storage};
use crate::math::Aabb;

/// Produces candidate pairs for the narrow phase. Each overlapping pair is
/// reported once per call; pairs where both bodies are static or asleep are
/// never reported.
pub trait BroadPhase: Send {
    /// Updates the broad-phase with the current body states
    fn update(&mut self, bodies: &BodyStorage<RigidBody>);

    /// Appends all potential collision pairs to `pairs`
    fn find_pairs(&self, pairs: &mut Vec<(BodyHandle, BodyHandle)>);
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    handle: BodyHandle,
    aabb: Aabb,
    static_or_inactive: bool,
}

impl Entry {
    fn from_body(handle: BodyHandle, body: &RigidBody) -> Self {
        Self {
            handle,
            aabb: body.bounding_box,
            static_or_inactive: body.is_static_or_inactive(),
        }
    }
}

#[inline]
fn wants_pair(a: &Entry, b: &Entry) -> bool {
    !(a.static_or_inactive && b.static_or_inactive) && a.aabb.intersects(&b.aabb)
}

/// Tests every pair of bodies
#[derive(Debug, Default)]
pub struct BruteForceBroadPhase {
    entries: Vec<Entry>,
}

impl BruteForceBroadPhase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for BruteForceBroadPhase {
    fn update(&mut self, bodies: &BodyStorage<RigidBody>) {
        self.entries.clear();
        self.entries
            .extend(bodies.iter().map(|(handle, body)| Entry::from_body(handle, body)));
    }

    fn find_pairs(&self, pairs: &mut Vec<(BodyHandle, BodyHandle)>) {
        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                if wants_pair(a, b) {
                    pairs.push((a.handle, b.handle));
                }
            }
        }
    }
}

/// Sorts the boxes on their minimum x and sweeps, so only boxes whose x
/// intervals overlap are tested on the other axes.
#[derive(Debug, Default)]
pub struct SweepAndPruneBroadPhase {
    entries: Vec<Entry>,
}

impl SweepAndPruneBroadPhase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for SweepAndPruneBroadPhase {
    fn update(&mut self, bodies: &BodyStorage<RigidBody>) {
        self.entries.clear();
        self.entries
            .extend(bodies.iter().map(|(handle, body)| Entry::from_body(handle, body)));
        // Frame-to-frame order changes little, which suits the stable sort.
        self.entries
            .sort_by(|a, b| a.aabb.min.x.total_cmp(&b.aabb.min.x));
    }

    fn find_pairs(&self, pairs: &mut Vec<(BodyHandle, BodyHandle)>) {
        let mut active: Vec<&Entry> = Vec::new();

        for entry in &self.entries {
            active.retain(|other| other.aabb.max.x >= entry.aabb.min.x);
            for other in &active {
                if wants_pair(other, entry) {
                    pairs.push((other.handle, entry.handle));
                }
            }
            active.push(entry);
        }
    }
}
