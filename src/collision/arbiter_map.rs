use std::collections::HashMap;

use crate::collision::Arbiter;
use crate::core::BodyHandle;

/// Unordered body pair. The handles are stored sorted, so `(a, b)` and
/// `(b, a)` build the same key and hash once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArbiterKey {
    first: BodyHandle,
    second: BodyHandle,
}

impl ArbiterKey {
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// The lower handle
    pub fn first(&self) -> BodyHandle {
        self.first
    }

    /// The higher handle
    pub fn second(&self) -> BodyHandle {
        self.second
    }

    pub fn contains(&self, body: BodyHandle) -> bool {
        self.first == body || self.second == body
    }

    /// The partner of `body` in this pair
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if body == self.first {
            Some(self.second)
        } else if body == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

/// All live arbiters, at most one per unordered body pair
#[derive(Debug, Default)]
pub struct ArbiterMap {
    arbiters: HashMap<ArbiterKey, Arbiter>,
}

impl ArbiterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, a: BodyHandle, b: BodyHandle) -> Option<&Arbiter> {
        self.arbiters.get(&ArbiterKey::new(a, b))
    }

    pub fn get_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Option<&mut Arbiter> {
        self.arbiters.get_mut(&ArbiterKey::new(a, b))
    }

    pub fn get_by_key(&self, key: &ArbiterKey) -> Option<&Arbiter> {
        self.arbiters.get(key)
    }

    /// Looks up the pair's arbiter, creating it when missing. The flag is
    /// true for a fresh arbiter; its body1 is the lower handle.
    pub fn get_or_insert(&mut self, a: BodyHandle, b: BodyHandle) -> (&mut Arbiter, bool) {
        let key = ArbiterKey::new(a, b);
        let mut created = false;
        let arbiter = self.arbiters.entry(key).or_insert_with(|| {
            created = true;
            Arbiter::new(key.first, key.second)
        });
        (arbiter, created)
    }

    pub fn remove(&mut self, a: BodyHandle, b: BodyHandle) -> Option<Arbiter> {
        self.arbiters.remove(&ArbiterKey::new(a, b))
    }

    pub fn contains(&self, a: BodyHandle, b: BodyHandle) -> bool {
        self.arbiters.contains_key(&ArbiterKey::new(a, b))
    }

    pub fn len(&self) -> usize {
        self.arbiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arbiters.is_empty()
    }

    pub fn clear(&mut self) {
        self.arbiters.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArbiterKey, &Arbiter)> {
        self.arbiters.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ArbiterKey, &mut Arbiter)> {
        self.arbiters.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArbiterKey> {
        self.arbiters.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_symmetric() {
        let (a, b) = (BodyHandle(3), BodyHandle(7));
        assert_eq!(ArbiterKey::new(a, b), ArbiterKey::new(b, a));
        assert_eq!(ArbiterKey::new(b, a).first(), a);
        assert_eq!(ArbiterKey::new(a, b).other(b), Some(a));
        assert_eq!(ArbiterKey::new(a, b).other(BodyHandle(1)), None);
    }

    #[test]
    fn test_one_arbiter_per_pair() {
        let mut map = ArbiterMap::new();
        let (a, b) = (BodyHandle(5), BodyHandle(2));

        let (arbiter, created) = map.get_or_insert(a, b);
        assert!(created);
        assert_eq!(arbiter.body1(), b);

        let (_, created) = map.get_or_insert(b, a);
        assert!(!created);
        assert_eq!(map.len(), 1);
        assert!(map.contains(a, b));

        assert!(map.remove(b, a).is_some());
        assert!(map.is_empty());
    }
}
