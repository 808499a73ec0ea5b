use std::collections::{HashSet, VecDeque};

use log::debug;

use crate::bodies::RigidBody;
use crate::collision::ArbiterKey;
use crate::core::{BodyHandle, BodyStorage, CollisionIsland, ConstraintHandle, IslandId, Pool, Storage};

/// Keeps the islands in step with arbiter and constraint churn.
///
/// A link between two non-static bodies merges their islands (the
/// smaller one into the larger one); removing a link runs a breadth-first
/// search from both ends and splits off the smaller component when they
/// no longer reach each other. Static bodies belong to no island, so
/// they never glue islands together.
#[derive(Debug)]
pub struct IslandManager {
    islands: Vec<Option<CollisionIsland>>,
    free_ids: Vec<u32>,
    pool: Pool<CollisionIsland>,
}

impl Default for IslandManager {
    fn default() -> Self {
        Self::new()
    }
}

impl IslandManager {
    pub fn new() -> Self {
        Self {
            islands: Vec::new(),
            free_ids: Vec::new(),
            pool: Pool::new(CollisionIsland::new),
        }
    }

    /// Live islands in id order
    pub fn islands(&self) -> impl Iterator<Item = (IslandId, &CollisionIsland)> {
        self.islands
            .iter()
            .enumerate()
            .filter_map(|(i, island)| island.as_ref().map(|island| (IslandId(i as u32), island)))
    }

    pub fn island(&self, id: IslandId) -> Option<&CollisionIsland> {
        self.islands.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Ids of the live islands, for callers that need to mutate bodies
    /// while walking them
    pub fn island_ids(&self) -> Vec<IslandId> {
        self.islands().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.islands.iter().filter(|island| island.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every island and detaches all bodies from them
    pub fn clear(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        for (_, body) in bodies.iter_mut() {
            body.island = None;
            body.connections.clear();
            body.arbiters.clear();
            body.constraints.clear();
        }
        for id in self.island_ids() {
            self.recycle(id);
        }
    }

    fn island_mut(&mut self, id: IslandId) -> Option<&mut CollisionIsland> {
        self.islands.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    fn insert_island(&mut self, island: CollisionIsland) -> IslandId {
        match self.free_ids.pop() {
            Some(id) => {
                self.islands[id as usize] = Some(island);
                IslandId(id)
            }
            None => {
                self.islands.push(Some(island));
                IslandId((self.islands.len() - 1) as u32)
            }
        }
    }

    fn recycle(&mut self, id: IslandId) {
        if let Some(mut island) = self.islands.get_mut(id.0 as usize).and_then(Option::take) {
            island.clear();
            self.pool.release(island);
            self.free_ids.push(id.0);
        }
    }

    fn island_of(bodies: &BodyStorage<RigidBody>, handle: BodyHandle) -> Option<IslandId> {
        bodies.get(handle).and_then(|body| body.island)
    }

    fn is_static(bodies: &BodyStorage<RigidBody>, handle: BodyHandle) -> bool {
        bodies.get(handle).map_or(true, |body| body.is_static)
    }

    /// Gives a newly added non-static body an island of its own
    pub fn add_body(&mut self, bodies: &mut BodyStorage<RigidBody>, handle: BodyHandle) {
        if !Self::is_static(bodies, handle) {
            self.ensure_island(bodies, handle);
        }
    }

    fn ensure_island(&mut self, bodies: &mut BodyStorage<RigidBody>, handle: BodyHandle) {
        if Self::island_of(bodies, handle).is_some() {
            return;
        }
        let mut island = self.pool.acquire();
        island.bodies.insert(handle);
        let id = self.insert_island(island);
        if let Some(body) = bodies.get_mut(handle) {
            body.island = Some(id);
        }
    }

    /// Detaches a body that is about to leave the world. Constraints on
    /// the body must already have been passed to
    /// [`constraint_removed`](Self::constraint_removed); leftover arbiters
    /// are unlinked here.
    pub fn remove_body(&mut self, bodies: &mut BodyStorage<RigidBody>, handle: BodyHandle) {
        let arbiters: Vec<ArbiterKey> = match bodies.get(handle) {
            Some(body) => body.arbiters.iter().copied().collect(),
            None => return,
        };
        for key in arbiters {
            self.arbiter_removed(bodies, key);
        }
        self.detach(bodies, handle);
    }

    /// Removes every link of a body that is turning static and takes it
    /// out of its island. Call before the body's static flag is set;
    /// arbiters and constraints are relinked by the caller afterwards.
    pub fn make_body_static(&mut self, bodies: &mut BodyStorage<RigidBody>, handle: BodyHandle) {
        while let Some(other) = bodies.get(handle).and_then(|body| body.connections.last().copied()) {
            self.unlink_dynamic(bodies, handle, other);
        }
        self.detach(bodies, handle);
    }

    fn detach(&mut self, bodies: &mut BodyStorage<RigidBody>, handle: BodyHandle) {
        let Some(body) = bodies.get_mut(handle) else {
            return;
        };
        body.connections.clear();
        let Some(id) = body.island.take() else {
            return;
        };

        let empty = match self.island_mut(id) {
            Some(island) => {
                island.bodies.remove(&handle);
                island.bodies.is_empty()
            }
            None => false,
        };
        if empty {
            self.recycle(id);
        }
    }

    /// Links the two bodies of a fresh arbiter
    pub fn arbiter_created(&mut self, bodies: &mut BodyStorage<RigidBody>, key: ArbiterKey) {
        let (body1, body2) = (key.first(), key.second());
        self.add_connection(bodies, body1, Some(body2));

        for handle in [body1, body2] {
            if let Some(body) = bodies.get_mut(handle) {
                body.arbiters.insert(key);
            }
        }

        let home = Self::island_of(bodies, body1).or_else(|| Self::island_of(bodies, body2));
        if let Some(island) = home.and_then(|id| self.island_mut(id)) {
            island.arbiters.insert(key);
        }
    }

    /// Unlinks the two bodies of an arbiter that lost its last contact
    pub fn arbiter_removed(&mut self, bodies: &mut BodyStorage<RigidBody>, key: ArbiterKey) {
        let (body1, body2) = (key.first(), key.second());

        for handle in [body1, body2] {
            if let Some(body) = bodies.get_mut(handle) {
                body.arbiters.remove(&key);
            }
        }

        let home = Self::island_of(bodies, body1).or_else(|| Self::island_of(bodies, body2));
        if let Some(island) = home.and_then(|id| self.island_mut(id)) {
            island.arbiters.remove(&key);
        }

        self.remove_connection(bodies, body1, Some(body2));
    }

    pub fn constraint_created(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        constraint: ConstraintHandle,
        body1: BodyHandle,
        body2: Option<BodyHandle>,
    ) {
        self.add_connection(bodies, body1, body2);

        for handle in std::iter::once(body1).chain(body2) {
            if let Some(body) = bodies.get_mut(handle) {
                body.constraints.insert(constraint);
            }
        }

        let home = Self::island_of(bodies, body1)
            .or_else(|| body2.and_then(|h| Self::island_of(bodies, h)));
        if let Some(island) = home.and_then(|id| self.island_mut(id)) {
            island.constraints.insert(constraint);
        }
    }

    pub fn constraint_removed(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        constraint: ConstraintHandle,
        body1: BodyHandle,
        body2: Option<BodyHandle>,
    ) {
        for handle in std::iter::once(body1).chain(body2) {
            if let Some(body) = bodies.get_mut(handle) {
                body.constraints.remove(&constraint);
            }
        }

        let home = Self::island_of(bodies, body1)
            .or_else(|| body2.and_then(|h| Self::island_of(bodies, h)));
        if let Some(island) = home.and_then(|id| self.island_mut(id)) {
            island.constraints.remove(&constraint);
        }

        self.remove_connection(bodies, body1, body2);
    }

    fn add_connection(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        body1: BodyHandle,
        body2: Option<BodyHandle>,
    ) {
        let static1 = Self::is_static(bodies, body1);
        let static2 = body2.map_or(true, |h| Self::is_static(bodies, h));

        if static1 {
            if let Some(body2) = body2.filter(|_| !static2) {
                self.ensure_island(bodies, body2);
            }
        } else if static2 {
            self.ensure_island(bodies, body1);
        } else if let Some(body2) = body2 {
            self.merge_islands(bodies, body1, body2);
            if let Some(body) = bodies.get_mut(body1) {
                body.connections.push(body2);
            }
            if let Some(body) = bodies.get_mut(body2) {
                body.connections.push(body1);
            }
        }
    }

    fn remove_connection(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        body1: BodyHandle,
        body2: Option<BodyHandle>,
    ) {
        let Some(body2) = body2 else {
            return;
        };

        if Self::is_static(bodies, body1) {
            remove_one(bodies, body2, body1);
        } else if Self::is_static(bodies, body2) {
            remove_one(bodies, body1, body2);
        } else {
            self.unlink_dynamic(bodies, body1, body2);
        }
    }

    fn unlink_dynamic(&mut self, bodies: &mut BodyStorage<RigidBody>, body1: BodyHandle, body2: BodyHandle) {
        remove_one(bodies, body1, body2);
        remove_one(bodies, body2, body1);
        self.split_islands(bodies, body1, body2);
    }

    fn merge_islands(&mut self, bodies: &mut BodyStorage<RigidBody>, body1: BodyHandle, body2: BodyHandle) {
        let island1 = Self::island_of(bodies, body1);
        let island2 = Self::island_of(bodies, body2);

        match (island1, island2) {
            (Some(a), Some(b)) if a == b => {}
            (None, None) => {
                self.ensure_island(bodies, body1);
                self.merge_islands(bodies, body1, body2);
            }
            (None, Some(id)) => self.join(bodies, body1, id),
            (Some(id), None) => self.join(bodies, body2, id),
            (Some(a), Some(b)) => {
                let size = |id| self.island(id).map_or(0, CollisionIsland::body_count);
                let (large, small) = if size(a) > size(b) { (a, b) } else { (b, a) };

                let Some(mut absorbed) = self.islands.get_mut(small.0 as usize).and_then(Option::take) else {
                    return;
                };
                for &handle in &absorbed.bodies {
                    if let Some(body) = bodies.get_mut(handle) {
                        body.island = Some(large);
                    }
                }
                if let Some(target) = self.island_mut(large) {
                    target.bodies.append(&mut absorbed.bodies);
                    target.arbiters.append(&mut absorbed.arbiters);
                    target.constraints.append(&mut absorbed.constraints);
                }
                debug!("merged island {} into {}", small.0, large.0);

                absorbed.clear();
                self.pool.release(absorbed);
                self.free_ids.push(small.0);
            }
        }
    }

    fn join(&mut self, bodies: &mut BodyStorage<RigidBody>, handle: BodyHandle, id: IslandId) {
        if let Some(island) = self.island_mut(id) {
            island.bodies.insert(handle);
        }
        if let Some(body) = bodies.get_mut(handle) {
            body.island = Some(id);
        }
    }

    /// Searches outward from both bodies at once. If one search runs out
    /// of bodies before meeting the other, its component becomes a new
    /// island.
    fn split_islands(&mut self, bodies: &mut BodyStorage<RigidBody>, body1: BodyHandle, body2: BodyHandle) {
        let Some(old) = Self::island_of(bodies, body1) else {
            return;
        };
        if Self::island_of(bodies, body2) != Some(old) {
            return;
        }

        let mut left_queue = VecDeque::from([body1]);
        let mut right_queue = VecDeque::from([body2]);
        let mut left: HashSet<BodyHandle> = HashSet::from([body1]);
        let mut right: HashSet<BodyHandle> = HashSet::from([body2]);

        while !left_queue.is_empty() && !right_queue.is_empty() {
            if expand(bodies, &mut left_queue, &mut left, &right) {
                return;
            }
            if expand(bodies, &mut right_queue, &mut right, &left) {
                return;
            }
        }

        let separated = if left_queue.is_empty() { left } else { right };
        let mut separated: Vec<BodyHandle> = separated.into_iter().collect();
        separated.sort_unstable();

        let mut island = self.pool.acquire();
        if let Some(source) = self.island_mut(old) {
            for &handle in &separated {
                source.bodies.remove(&handle);
                island.bodies.insert(handle);
                if let Some(body) = bodies.get(handle) {
                    for key in &body.arbiters {
                        source.arbiters.remove(key);
                        island.arbiters.insert(*key);
                    }
                    for constraint in &body.constraints {
                        source.constraints.remove(constraint);
                        island.constraints.insert(*constraint);
                    }
                }
            }
        }

        let id = self.insert_island(island);
        for handle in separated {
            if let Some(body) = bodies.get_mut(handle) {
                body.island = Some(id);
            }
        }
        debug!("split island {} off island {}", id.0, old.0);
    }
}

/// One breadth-first step. Returns true when the search reaches a body
/// already claimed by the other side.
fn expand(
    bodies: &BodyStorage<RigidBody>,
    queue: &mut VecDeque<BodyHandle>,
    visited: &mut HashSet<BodyHandle>,
    other: &HashSet<BodyHandle>,
) -> bool {
    let Some(current) = queue.pop_front() else {
        return false;
    };
    let Some(body) = bodies.get(current) else {
        return false;
    };
    if body.is_static {
        return false;
    }

    for &connected in &body.connections {
        if other.contains(&connected) {
            return true;
        }
        if visited.insert(connected) {
            queue.push_back(connected);
        }
    }
    false
}

fn remove_one(bodies: &mut BodyStorage<RigidBody>, from: BodyHandle, target: BodyHandle) {
    if let Some(body) = bodies.get_mut(from) {
        if let Some(pos) = body.connections.iter().position(|&h| h == target) {
            body.connections.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::Material;
    use crate::math::Vector3;
    use crate::shapes::Shape;

    fn world(count: usize) -> (BodyStorage<RigidBody>, IslandManager, Vec<BodyHandle>) {
        let shape = Shape::cuboid(Vector3::one()).unwrap().into_shared();
        let mut bodies: BodyStorage<RigidBody> = Storage::new();
        let mut manager = IslandManager::new();
        let handles: Vec<BodyHandle> = (0..count)
            .map(|_| bodies.add(RigidBody::new(shape.clone(), Material::default())))
            .collect();
        for &h in &handles {
            manager.add_body(&mut bodies, h);
        }
        (bodies, manager, handles)
    }

    fn island(bodies: &BodyStorage<RigidBody>, h: BodyHandle) -> Option<IslandId> {
        bodies.get(h).unwrap().get_island()
    }

    #[test]
    fn test_each_body_starts_alone() {
        let (bodies, manager, h) = world(3);
        assert_eq!(manager.len(), 3);
        assert_ne!(island(&bodies, h[0]), island(&bodies, h[1]));
    }

    #[test]
    fn test_arbiter_merges_and_split_separates() {
        let (mut bodies, mut manager, h) = world(3);
        let ab = ArbiterKey::new(h[0], h[1]);
        let bc = ArbiterKey::new(h[1], h[2]);

        manager.arbiter_created(&mut bodies, ab);
        manager.arbiter_created(&mut bodies, bc);
        assert_eq!(manager.len(), 1);
        let id = island(&bodies, h[0]).unwrap();
        assert_eq!(island(&bodies, h[2]), Some(id));
        assert_eq!(manager.island(id).unwrap().arbiter_count(), 2);

        manager.arbiter_removed(&mut bodies, bc);
        assert_eq!(manager.len(), 2);
        assert_eq!(island(&bodies, h[0]), island(&bodies, h[1]));
        assert_ne!(island(&bodies, h[1]), island(&bodies, h[2]));
        assert!(bodies.get(h[2]).unwrap().connections().is_empty());
    }

    #[test]
    fn test_cycle_survives_single_removal() {
        let (mut bodies, mut manager, h) = world(3);
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            manager.arbiter_created(&mut bodies, ArbiterKey::new(h[a], h[b]));
        }
        manager.arbiter_removed(&mut bodies, ArbiterKey::new(h[0], h[1]));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_static_body_does_not_join_islands() {
        let (mut bodies, mut manager, h) = world(2);
        let ground = {
            let shape = Shape::cuboid(Vector3::new(10.0, 1.0, 10.0)).unwrap().into_shared();
            let mut body = RigidBody::new(shape, Material::default());
            body.set_static(true);
            bodies.add(body)
        };
        manager.add_body(&mut bodies, ground);
        assert_eq!(island(&bodies, ground), None);

        manager.arbiter_created(&mut bodies, ArbiterKey::new(h[0], ground));
        manager.arbiter_created(&mut bodies, ArbiterKey::new(h[1], ground));
        assert_eq!(manager.len(), 2);

        // The arbiter lives in the dynamic body's island.
        let id = island(&bodies, h[0]).unwrap();
        assert!(manager.island(id).unwrap().arbiters().any(|k| k.contains(ground)));
    }

    #[test]
    fn test_constraint_links_and_unlinks() {
        let (mut bodies, mut manager, h) = world(2);
        let c = ConstraintHandle(0);
        manager.constraint_created(&mut bodies, c, h[0], Some(h[1]));
        assert_eq!(manager.len(), 1);
        assert!(bodies.get(h[1]).unwrap().constraints().any(|&x| x == c));

        manager.constraint_removed(&mut bodies, c, h[0], Some(h[1]));
        assert_eq!(manager.len(), 2);

        let single = ConstraintHandle(1);
        manager.constraint_created(&mut bodies, single, h[0], None);
        let id = island(&bodies, h[0]).unwrap();
        assert_eq!(manager.island(id).unwrap().constraint_count(), 1);
    }

    #[test]
    fn test_make_static_and_remove_recycle_islands() {
        let (mut bodies, mut manager, h) = world(3);
        manager.arbiter_created(&mut bodies, ArbiterKey::new(h[0], h[1]));
        manager.arbiter_created(&mut bodies, ArbiterKey::new(h[1], h[2]));

        manager.make_body_static(&mut bodies, h[1]);
        bodies.get_mut(h[1]).unwrap().set_static(true);
        assert_eq!(island(&bodies, h[1]), None);
        assert_ne!(island(&bodies, h[0]), island(&bodies, h[2]));
        assert_eq!(manager.len(), 2);

        manager.remove_body(&mut bodies, h[0]);
        assert_eq!(island(&bodies, h[0]), None);
        assert_eq!(manager.len(), 1);
        assert!(bodies.get(h[1]).unwrap().arbiters().all(|k| !k.contains(h[0])));
    }
}
