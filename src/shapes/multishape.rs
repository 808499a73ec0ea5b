use parking_lot::Mutex;

use crate::math::{Aabb, Vector3};
use crate::shapes::{Shape, ShapeKind, SupportMapping};

/// Outstanding clones beyond this count almost certainly mean a caller
/// forgot to release one.
const MAX_OUTSTANDING_CLONES: usize = 10;

/// Clones one shape may have out at once before a leak is suspected. A
/// parallel narrow phase holds up to two per worker thread.
pub(crate) fn clone_limit() -> usize {
    #[cfg(feature = "parallel")]
    {
        MAX_OUTSTANDING_CLONES.max(2 * rayon::current_num_threads())
    }
    #[cfg(not(feature = "parallel"))]
    {
        MAX_OUTSTANDING_CLONES
    }
}

/// Per-query state of a multishape: which sub-parts survived the last
/// `prepare` and which one is current.
#[derive(Debug, Clone, Default)]
pub(crate) struct CloneState {
    /// Sub-part indices selected by `prepare` (compound, mesh)
    pub candidates: Vec<usize>,
    /// Terrain grid window as `[min_x, min_z, num_x, num_z]`
    pub grid: [usize; 4],
    /// Index of the current sub-shape (compound)
    pub current: usize,
    /// Current triangle (terrain, mesh)
    pub triangle: [Vector3; 3],
    /// Face normal of the current triangle
    pub normal: Vector3,
    /// Center of the current sub-part
    pub center: Vector3,
}

impl CloneState {
    fn reset(&mut self) {
        self.candidates.clear();
        self.grid = [0; 4];
        self.current = 0;
        self.normal = Vector3::unit_y();
        self.center = Vector3::ZERO;
    }
}

#[derive(Debug, Default)]
struct ArenaSlots {
    slots: Vec<Option<CloneState>>,
    free: Vec<usize>,
    outstanding: usize,
}

/// Slot arena of working-clone states owned by one multishape. The arena
/// holds the only lock; clone states themselves are plain data.
#[derive(Debug, Default)]
pub(crate) struct CloneArena {
    inner: Mutex<ArenaSlots>,
}

impl CloneArena {
    /// Checks out a slot and its state
    pub fn acquire(&self) -> (usize, CloneState) {
        let mut inner = self.inner.lock();

        let limit = clone_limit();
        if inner.outstanding >= limit {
            log::warn!(
                "{} working clones outstanding on one shape; a clone was probably not released",
                inner.outstanding
            );
            debug_assert!(
                inner.outstanding < limit,
                "unusual number of working clones; forgot to release one?"
            );
        }
        inner.outstanding += 1;

        match inner.free.pop() {
            Some(slot) => {
                let mut state = inner.slots[slot].take().unwrap_or_default();
                state.reset();
                (slot, state)
            }
            None => {
                let mut state = CloneState::default();
                state.reset();
                inner.slots.push(None);
                (inner.slots.len() - 1, state)
            }
        }
    }

    /// Returns a slot's state to the arena
    pub fn release(&self, slot: usize, state: CloneState) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.slots.get_mut(slot) {
            *entry = Some(state);
            inner.free.push(slot);
        }
        inner.outstanding = inner.outstanding.saturating_sub(1);
    }

    /// Number of clones currently checked out
    pub fn outstanding(&self) -> usize {
        self.inner.lock().outstanding
    }

    /// Drops all cached states; called when the geometry changes
    pub fn clear(&mut self) {
        *self.inner.get_mut() = ArenaSlots::default();
    }
}

/// A checked-out view of a multishape that can impersonate one sub-part at
/// a time. Obtained from [`Shape::request_working_clone`]; the slot goes
/// back to the shape's arena on drop.
///
/// Working clones borrow the base shape, so they cannot be cloned again and
/// the geometry cannot change while one is alive.
#[derive(Debug)]
pub struct WorkingClone<'a> {
    shape: &'a Shape,
    slot: usize,
    state: CloneState,
    released: bool,
}

impl<'a> WorkingClone<'a> {
    pub(crate) fn new(shape: &'a Shape, slot: usize, state: CloneState) -> Self {
        Self { shape, slot, state, released: false }
    }

    /// The multishape this clone was taken from
    pub fn base(&self) -> &'a Shape {
        self.shape
    }

    /// Arena slot held by this clone
    pub fn slot(&self) -> usize {
        self.slot
    }

    fn state(&self) -> &CloneState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CloneState {
        &mut self.state
    }

    /// Selects the sub-parts whose bounds touch `region` (in the shape's
    /// local frame) and returns how many there are.
    pub fn prepare(&mut self, region: &Aabb) -> usize {
        let shape = self.shape;
        let state = self.state_mut();
        match shape.kind() {
            ShapeKind::Compound(c) => c.prepare(state, region),
            ShapeKind::Terrain(t) => t.prepare(state, region),
            ShapeKind::TriangleMesh(m) => m.prepare(state, region),
            _ => 0,
        }
    }

    /// Selects the sub-parts near the segment `origin .. origin + delta`
    pub fn prepare_ray(&mut self, origin: Vector3, delta: Vector3) -> usize {
        let shape = self.shape;
        let state = self.state_mut();
        match shape.kind() {
            ShapeKind::Compound(c) => c.prepare_ray(state, origin, delta),
            ShapeKind::Terrain(t) => t.prepare_ray(state, origin, delta),
            ShapeKind::TriangleMesh(m) => m.prepare_ray(state, origin, delta),
            _ => 0,
        }
    }

    /// Makes the `index`-th prepared sub-part current
    pub fn set_current_shape(&mut self, index: usize) {
        let shape = self.shape;
        let state = self.state_mut();
        match shape.kind() {
            ShapeKind::Compound(c) => c.set_current(state, index),
            ShapeKind::Terrain(t) => t.set_current(state, index),
            ShapeKind::TriangleMesh(m) => m.set_current(state, index),
            _ => {}
        }
    }

    /// Face normal of the current triangle, in the shape's local frame.
    /// Unit y for shapes without triangles.
    pub fn collision_normal(&self) -> Vector3 {
        self.state().normal
    }

    /// Bounding box of the current sub-part
    pub fn current_bounding_box(&self, orientation: &crate::math::Matrix3) -> Aabb {
        crate::shapes::hull::support_bounding_box(self, orientation)
    }

    /// Hands the slot back explicitly; dropping the clone does the same
    pub fn release(mut self) {
        self.give_back();
    }

    fn give_back(&mut self) {
        if !self.released {
            self.released = true;
            let state = std::mem::take(&mut self.state);
            self.shape.clone_arena().release(self.slot, state);
        }
    }
}

impl SupportMapping for WorkingClone<'_> {
    fn support_mapping(&self, direction: Vector3) -> Vector3 {
        let state = self.state();
        match self.shape.kind() {
            ShapeKind::Compound(c) => c.current_support(state, direction),
            ShapeKind::Terrain(t) => t.current_support(state, direction),
            ShapeKind::TriangleMesh(m) => m.current_support(state, direction),
            _ => self.shape.support_mapping(direction),
        }
    }

    fn support_center(&self) -> Vector3 {
        self.state().center
    }
}

impl Drop for WorkingClone<'_> {
    fn drop(&mut self) {
        self.give_back();
    }
}
