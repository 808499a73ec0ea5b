use std::marker::PhantomData;

use crate::core::{BodyHandle, ConstraintHandle};
use crate::error::PhysicsError;
use crate::Result;

/// Handle types that address a slot in an [`Arena`]
pub trait ArenaHandle: Copy + std::fmt::Debug {
    /// Builds the handle for a slot index
    fn from_index(index: usize) -> Self;

    /// Returns the slot index
    fn index(self) -> usize;
}

impl ArenaHandle for BodyHandle {
    fn from_index(index: usize) -> Self {
        BodyHandle::from_index(index)
    }

    fn index(self) -> usize {
        BodyHandle::index(self)
    }
}

impl ArenaHandle for ConstraintHandle {
    fn from_index(index: usize) -> Self {
        ConstraintHandle::from_index(index)
    }

    fn index(self) -> usize {
        ConstraintHandle::index(self)
    }
}

/// Generic storage trait for physics objects
pub trait Storage<T, H> {
    /// Creates a new empty storage
    fn new() -> Self;

    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Removes an item from the storage
    fn remove(&mut self, handle: H) -> Option<T>;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool;

    /// Clears all items from the storage
    fn clear(&mut self);

    /// Returns all live handles, in slot order
    fn handles(&self) -> Vec<H>;

    /// Returns an iterator over all items
    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a;

    /// Returns a mutable iterator over all items
    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a where T: 'a;
}

/// Append-only slot table. A handle is the slot index; removed slots are
/// left empty so handles stay unique for the lifetime of the table.
#[derive(Debug)]
pub struct Arena<H, T> {
    slots: Vec<Option<T>>,
    len: usize,
    _handle: PhantomData<H>,
}

/// Storage for rigid bodies
pub type BodyStorage<T> = Arena<BodyHandle, T>;

/// Storage for constraints
pub type ConstraintStorage<T> = Arena<ConstraintHandle, T>;

impl<H, T> Default for Arena<H, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            _handle: PhantomData,
        }
    }
}

impl<H: ArenaHandle, T> Storage<T, H> for Arena<H, T> {
    fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, item: T) -> H {
        let handle = H::from_index(self.slots.len());
        self.slots.push(Some(item));
        self.len += 1;
        handle
    }

    fn get(&self, handle: H) -> Option<&T> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.slots.get_mut(handle.index()).and_then(Option::as_mut)
    }

    fn remove(&mut self, handle: H) -> Option<T> {
        let removed = self.slots.get_mut(handle.index()).and_then(Option::take);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn clear(&mut self) {
        // Keep the slot count so handles handed out earlier are never recycled.
        for slot in &mut self.slots {
            *slot = None;
        }
        self.len = 0;
    }

    fn handles(&self) -> Vec<H> {
        self.iter().map(|(h, _)| h).collect()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|item| (H::from_index(i), item)))
    }

    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a where T: 'a {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|item| (H::from_index(i), item)))
    }
}

impl<H: ArenaHandle, T> Arena<H, T> {
    fn not_found(handle: H) -> PhysicsError {
        PhysicsError::ResourceNotFound(format!("{:?} not found", handle))
    }

    /// Gets an item by its handle, returning an error if not found
    pub fn try_get(&self, handle: H) -> Result<&T> {
        self.get(handle).ok_or_else(|| Self::not_found(handle))
    }

    /// Gets a mutable reference to an item, returning an error if not found
    pub fn try_get_mut(&mut self, handle: H) -> Result<&mut T> {
        self.get_mut(handle).ok_or_else(|| Self::not_found(handle))
    }

    /// Borrows two distinct items mutably at once
    pub fn get_pair_mut(&mut self, a: H, b: H) -> Result<(&mut T, &mut T)> {
        let (ia, ib) = (a.index(), b.index());
        if ia == ib {
            return Err(PhysicsError::InvalidParameter(format!(
                "cannot borrow {:?} twice",
                a
            )));
        }
        if ia.max(ib) >= self.slots.len() {
            return Err(Self::not_found(if ia > ib { a } else { b }));
        }

        let (lo, hi) = (ia.min(ib), ia.max(ib));
        let (left, right) = self.slots.split_at_mut(hi);
        let first = left[lo].as_mut().ok_or_else(|| Self::not_found(if ia < ib { a } else { b }))?;
        let second = right[0].as_mut().ok_or_else(|| Self::not_found(if ia < ib { b } else { a }))?;

        if ia < ib {
            Ok((first, second))
        } else {
            Ok((second, first))
        }
    }
}

impl<T> Arena<BodyHandle, T> {
    /// Gets a body by its handle, returning an error if not found
    pub fn get_body(&self, handle: BodyHandle) -> Result<&T> {
        self.try_get(handle)
    }

    /// Gets a mutable reference to a body by its handle, returning an error if not found
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut T> {
        self.try_get_mut(handle)
    }
}

impl<T> Arena<ConstraintHandle, T> {
    /// Gets a constraint by its handle, returning an error if not found
    pub fn get_constraint(&self, handle: ConstraintHandle) -> Result<&T> {
        self.try_get(handle)
    }

    /// Gets a mutable reference to a constraint by its handle, returning an error if not found
    pub fn get_constraint_mut(&mut self, handle: ConstraintHandle) -> Result<&mut T> {
        self.try_get_mut(handle)
    }
}
