use parking_lot::{Mutex, MutexGuard};

use crate::bodies::RigidBody;
use crate::collision::{ArbiterKey, Contact, ContactList, ContactSettings, MAX_CONTACTS};
use crate::core::BodyHandle;
use crate::math::Vector3;

/// Persistent contact manifold of one body pair.
///
/// Narrow-phase results for the pair are merged into at most
/// [`MAX_CONTACTS`] points. A candidate either refreshes a cached point
/// close to it, fills a free slot, or (when the manifold is full) replaces
/// the point whose removal keeps the largest contact area. The deepest
/// point is never replaced. Refreshed points keep their accumulated
/// impulses so warm starting carries across frames.
#[derive(Debug)]
pub struct Arbiter {
    body1: BodyHandle,
    body2: BodyHandle,
    contacts: Mutex<ContactList>,
}

impl Arbiter {
    pub fn new(body1: BodyHandle, body2: BodyHandle) -> Self {
        Self {
            body1,
            body2,
            contacts: Mutex::new(ContactList::new()),
        }
    }

    pub fn body1(&self) -> BodyHandle {
        self.body1
    }

    pub fn body2(&self) -> BodyHandle {
        self.body2
    }

    pub fn key(&self) -> ArbiterKey {
        ArbiterKey::new(self.body1, self.body2)
    }

    /// Locks the manifold for reading or editing
    pub fn contacts(&self) -> MutexGuard<'_, ContactList> {
        self.contacts.lock()
    }

    /// Direct access when the arbiter is not shared
    pub fn contacts_mut(&mut self) -> &mut ContactList {
        self.contacts.get_mut()
    }

    pub fn len(&self) -> usize {
        self.contacts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached point
    pub fn invalidate(&self) {
        self.contacts.lock().clear();
    }

    /// Merges one narrow-phase result into the manifold. `normal` points
    /// from body2 toward body1. Returns the contact when a new point was
    /// created and `None` when an existing slot was refreshed.
    #[allow(clippy::too_many_arguments)]
    pub fn add_contact(
        &self,
        body1: &RigidBody,
        body2: &RigidBody,
        point1: Vector3,
        point2: Vector3,
        normal: Vector3,
        penetration: f32,
        settings: &ContactSettings,
    ) -> Option<Contact> {
        let rel_pos1 = point1 - body1.position;
        let mut contacts = self.contacts.lock();

        let index = if contacts.is_full() {
            Some(sort_cached_points(&contacts, rel_pos1, penetration))
        } else {
            cache_entry(&contacts, rel_pos1, settings.break_threshold)
        };

        match index {
            Some(index) => {
                if let Some(contact) = contacts.get_mut(index) {
                    contact.initialize(
                        body1, body2, point1, point2, normal, penetration, false, settings,
                    );
                }
                None
            }
            None => {
                let mut contact = Contact::default();
                contact.initialize(body1, body2, point1, point2, normal, penetration, true, settings);
                contacts.add(contact);
                Some(contact)
            }
        }
    }
}

/// Closest cached point within the break threshold
fn cache_entry(contacts: &ContactList, rel_pos1: Vector3, break_threshold: f32) -> Option<usize> {
    let mut shortest = break_threshold * break_threshold;
    let mut nearest = None;

    for (i, contact) in contacts.iter().enumerate() {
        let dist = (contact.relative_pos1 - rel_pos1).length_squared();
        if dist < shortest {
            shortest = dist;
            nearest = Some(i);
        }
    }

    nearest
}

/// Picks the slot of a full manifold to overwrite with the candidate. Each
/// option is scored by the squared area of the quad left after the swap;
/// the deepest point is kept unless the candidate is deeper still.
fn sort_cached_points(contacts: &ContactList, rel_pos1: Vector3, penetration: f32) -> usize {
    debug_assert_eq!(contacts.len(), MAX_CONTACTS);

    let mut deepest = None;
    let mut max_penetration = penetration;
    for (i, contact) in contacts.iter().enumerate() {
        if contact.penetration > max_penetration {
            deepest = Some(i);
            max_penetration = contact.penetration;
        }
    }

    let p = |i: usize| contacts[i].relative_pos1;
    let area = |a: Vector3, b: Vector3| a.cross(&b).length_squared();

    let areas = [
        area(rel_pos1 - p(1), p(3) - p(2)),
        area(rel_pos1 - p(0), p(3) - p(2)),
        area(rel_pos1 - p(0), p(3) - p(1)),
        area(rel_pos1 - p(0), p(2) - p(1)),
    ];

    let mut best = None;
    let mut best_area = f32::NEG_INFINITY;
    for (i, &a) in areas.iter().enumerate() {
        if Some(i) == deepest {
            continue;
        }
        if a > best_area {
            best_area = a;
            best = Some(i);
        }
    }

    best.unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::Material;
    use crate::shapes::Shape;

    fn bodies() -> (RigidBody, RigidBody) {
        let shape = Shape::cuboid(Vector3::new(4.0, 1.0, 4.0)).unwrap().into_shared();
        let mut b1 = RigidBody::new(shape.clone(), Material::default());
        let b2 = RigidBody::new(shape, Material::default());
        b1.set_position(Vector3::new(0.0, 1.0, 0.0));
        (b1, b2)
    }

    fn corner(x: f32, z: f32) -> (Vector3, Vector3) {
        (Vector3::new(x, 0.5, z), Vector3::new(x, 0.5, z))
    }

    #[test]
    fn test_new_points_fill_the_manifold() {
        let (b1, b2) = bodies();
        let arbiter = Arbiter::new(BodyHandle(0), BodyHandle(1));
        let settings = ContactSettings::default();

        for (x, z) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let (p1, p2) = corner(x, z);
            let created = arbiter.add_contact(&b1, &b2, p1, p2, Vector3::unit_y(), 0.01, &settings);
            assert!(created.is_some());
        }
        assert_eq!(arbiter.len(), MAX_CONTACTS);
    }

    #[test]
    fn test_nearby_point_refreshes_in_place() {
        let (b1, b2) = bodies();
        let arbiter = Arbiter::new(BodyHandle(0), BodyHandle(1));
        let settings = ContactSettings::default();

        let (p1, p2) = corner(1.0, 1.0);
        arbiter.add_contact(&b1, &b2, p1, p2, Vector3::unit_y(), 0.01, &settings);
        arbiter.contacts()[0].accumulated_normal_impulse = 3.0;

        let nudged = p1 + Vector3::new(0.001, 0.0, 0.0);
        let created = arbiter.add_contact(&b1, &b2, nudged, nudged, Vector3::unit_y(), 0.02, &settings);

        assert!(created.is_none());
        assert_eq!(arbiter.len(), 1);
        let contacts = arbiter.contacts();
        assert_eq!(contacts[0].accumulated_normal_impulse(), 3.0);
        assert_eq!(contacts[0].penetration(), 0.02);
    }

    #[test]
    fn test_full_manifold_keeps_deepest_point() {
        let (b1, b2) = bodies();
        let arbiter = Arbiter::new(BodyHandle(0), BodyHandle(1));
        let settings = ContactSettings::default();

        let points = [(-1.0, -1.0, 0.5), (1.0, -1.0, 0.01), (1.0, 1.0, 0.01), (-1.0, 1.0, 0.01)];
        for (x, z, pen) in points {
            let (p1, p2) = corner(x, z);
            arbiter.add_contact(&b1, &b2, p1, p2, Vector3::unit_y(), pen, &settings);
        }

        for i in 0..20 {
            let t = i as f32 * 0.3;
            let (p1, p2) = corner(1.5 * t.cos(), 1.5 * t.sin());
            let created = arbiter.add_contact(&b1, &b2, p1, p2, Vector3::unit_y(), 0.02, &settings);
            assert!(created.is_none());
            assert_eq!(arbiter.len(), MAX_CONTACTS);
            assert!(arbiter.contacts().iter().any(|c| c.penetration() == 0.5));
        }
    }

    #[test]
    fn test_deepest_kept_when_areas_vanish() {
        let (b1, b2) = bodies();
        let arbiter = Arbiter::new(BodyHandle(0), BodyHandle(1));
        let settings = ContactSettings::default();

        // Collinear points give zero area for every option.
        for (x, pen) in [(-1.5, 0.5), (-0.5, 0.01), (0.5, 0.01), (1.5, 0.01)] {
            let (p1, p2) = corner(x, 0.0);
            arbiter.add_contact(&b1, &b2, p1, p2, Vector3::unit_y(), pen, &settings);
        }
        let (p1, p2) = corner(1.0, 0.0);
        arbiter.add_contact(&b1, &b2, p1, p2, Vector3::unit_y(), 0.02, &settings);

        assert_eq!(arbiter.contacts()[0].penetration(), 0.5);
    }

    #[test]
    fn test_invalidate_clears() {
        let (b1, b2) = bodies();
        let arbiter = Arbiter::new(BodyHandle(0), BodyHandle(1));
        let (p1, p2) = corner(0.0, 0.0);
        arbiter.add_contact(&b1, &b2, p1, p2, Vector3::unit_y(), 0.01, &ContactSettings::default());
        arbiter.invalidate();
        assert!(arbiter.is_empty());
    }
}
