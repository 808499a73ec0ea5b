use crate::collision::Contact;

/// Capacity of a contact manifold
pub const MAX_CONTACTS: usize = 4;

/// Fixed-capacity ordered list backing an arbiter's manifold.
///
/// Adding to a full list is ignored. Inserting into a full list shifts the
/// tail right and drops the last item. The arbiter applies its own
/// replacement policy before it ever calls `add`.
#[derive(Debug, Clone)]
pub struct ContactList<T = Contact> {
    items: [Option<T>; MAX_CONTACTS],
    count: usize,
}

impl<T> Default for ContactList<T> {
    fn default() -> Self {
        Self {
            items: std::array::from_fn(|_| None),
            count: 0,
        }
    }
}

impl<T> ContactList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == MAX_CONTACTS
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.count {
            self.items[index].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.count {
            self.items[index].as_mut()
        } else {
            None
        }
    }

    /// Overwrites an occupied slot; out-of-range indices are ignored
    pub fn set(&mut self, index: usize, item: T) {
        if index < self.count {
            self.items[index] = Some(item);
        }
    }

    /// Appends unless the list is full
    pub fn add(&mut self, item: T) {
        if self.count < MAX_CONTACTS {
            self.items[self.count] = Some(item);
            self.count += 1;
        }
    }

    /// Inserts at `index`, shifting later items right. When the list is
    /// already full the last item falls off.
    pub fn insert(&mut self, index: usize, item: T) {
        if index >= MAX_CONTACTS {
            return;
        }
        if self.count < MAX_CONTACTS {
            self.count += 1;
        }

        if index < self.count - 1 {
            for i in (index..self.count - 1).rev() {
                self.items[i + 1] = self.items[i].take();
            }
            self.items[index] = Some(item);
        } else {
            self.items[self.count - 1] = Some(item);
        }
    }

    /// Removes the item at `index`, shifting later items left
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.count {
            return None;
        }
        let removed = self.items[index].take();
        for i in index..self.count - 1 {
            self.items[i] = self.items[i + 1].take();
        }
        self.count -= 1;
        removed
    }

    pub fn clear(&mut self) {
        for item in &mut self.items {
            *item = None;
        }
        self.count = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items[..self.count].iter().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items[..self.count].iter_mut().filter_map(Option::as_mut)
    }

    /// Keeps only the items for which `keep` returns true, preserving order
    pub fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        let mut i = self.count;
        while i > 0 {
            i -= 1;
            let drop = match self.items[i].as_mut() {
                Some(item) => !keep(item),
                None => false,
            };
            if drop {
                self.remove_at(i);
            }
        }
    }
}

impl<T: PartialEq> ContactList<T> {
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.iter().position(|x| x == item)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.index_of(item).is_some()
    }

    /// Removes the first occurrence of `item`
    pub fn remove(&mut self, item: &T) -> bool {
        match self.index_of(item) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }
}

impl<T> std::ops::Index<usize> for ContactList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(item) => item,
            None => panic!("contact index {} out of range for {} contacts", index, self.count),
        }
    }
}

impl<T> std::ops::IndexMut<usize> for ContactList<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let count = self.count;
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("contact index {} out of range for {} contacts", index, count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    /// Contacts told apart by their first point
    fn contact(tag: usize) -> Contact {
        Contact {
            p1: Vector3::new(tag as f32, 0.0, 0.0),
            ..Contact::default()
        }
    }

    #[test]
    fn test_new_list_is_empty() {
        let contacts: ContactList = ContactList::new();
        assert!(contacts.is_empty());
        assert_eq!(contacts.iter().count(), 0);
    }

    #[test]
    fn test_add_caps_at_max() {
        let mut contacts = ContactList::new();
        let all: Vec<_> = (0..MAX_CONTACTS + 1).map(contact).collect();
        for c in &all {
            contacts.add(*c);
        }

        assert_eq!(contacts.len(), MAX_CONTACTS);
        for c in &all[..MAX_CONTACTS] {
            assert!(contacts.contains(c));
        }
        assert!(!contacts.contains(&all[MAX_CONTACTS]));
    }

    #[test]
    fn test_insert_at_front_behaves_like_a_stack() {
        let mut contacts = ContactList::new();
        let all: Vec<_> = (0..MAX_CONTACTS * 2).map(contact).collect();
        for c in &all {
            contacts.insert(0, *c);
        }

        for c in &all[..MAX_CONTACTS] {
            assert!(!contacts.contains(c));
        }
        for c in &all[MAX_CONTACTS..] {
            assert!(contacts.contains(c));
        }
        assert_eq!(contacts[0], all[all.len() - 1]);

        // Inserting into the full list keeps the new item
        for i in 0..MAX_CONTACTS {
            let c = contact(100 + i);
            contacts.insert(i % (MAX_CONTACTS - 1), c);
            assert!(contacts.contains(&c));
            assert_eq!(contacts.len(), MAX_CONTACTS);
        }
    }

    #[test]
    fn test_insert_past_count_appends() {
        let mut contacts = ContactList::new();
        contacts.add(contact(0));
        contacts.insert(3, contact(1));
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts.index_of(&contact(1)), Some(1));

        contacts.insert(MAX_CONTACTS, contact(2));
        assert_eq!(contacts.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut contacts = ContactList::new();
        for i in 0..MAX_CONTACTS {
            contacts.add(contact(i));
        }
        assert_eq!(contacts.len(), MAX_CONTACTS);
        contacts.clear();
        assert!(contacts.is_empty());
        assert!(contacts.get(0).is_none());
    }

    #[test]
    fn test_index_of_follows_insertion_order() {
        let mut contacts = ContactList::new();
        for i in 0..MAX_CONTACTS {
            let c = contact(i);
            contacts.add(c);
            assert_eq!(contacts.index_of(&c), Some(i));
        }
        assert_eq!(contacts.index_of(&contact(99)), None);
    }

    #[test]
    fn test_remove_by_value() {
        let mut contacts = ContactList::new();
        let all: Vec<_> = (0..MAX_CONTACTS).map(contact).collect();
        for c in &all {
            contacts.add(*c);
        }

        let mut count = MAX_CONTACTS;
        for c in &all {
            assert!(contacts.contains(c));
            assert_eq!(contacts.len(), count);
            assert!(contacts.remove(c));
            count -= 1;
            assert_eq!(contacts.len(), count);
            assert!(!contacts.contains(c));
        }
        assert!(!contacts.remove(&all[0]));
    }

    #[test]
    fn test_remove_at_front_yields_insertion_order() {
        let mut contacts = ContactList::new();
        let all: Vec<_> = (0..MAX_CONTACTS).map(contact).collect();
        for c in &all {
            contacts.add(*c);
        }

        for c in &all {
            assert_eq!(contacts.remove_at(0), Some(*c));
        }
        assert!(contacts.is_empty());
        assert_eq!(contacts.remove_at(0), None);
    }

    #[test]
    fn test_retain_keeps_order() {
        let mut contacts: ContactList<u32> = ContactList::new();
        for i in 0..4 {
            contacts.add(i);
        }
        contacts.retain(|x| *x % 2 == 1);
        assert_eq!(contacts.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    }
}
