/// A free-list of reusable objects.
///
/// `acquire` hands out a recycled item or builds a fresh one with the
/// factory; `release` returns it. The pool itself is not synchronized;
/// owners that share one across threads wrap it in a lock.
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    factory: fn() -> T,
    max_free: Option<usize>,
    created: usize,
}

impl<T> Pool<T> {
    /// Creates an unbounded pool
    pub fn new(factory: fn() -> T) -> Self {
        Self {
            free: Vec::new(),
            factory,
            max_free: None,
            created: 0,
        }
    }

    /// Creates a pool that keeps at most `max_free` idle items; extra
    /// released items are dropped.
    pub fn bounded(factory: fn() -> T, max_free: usize) -> Self {
        Self {
            max_free: Some(max_free),
            ..Self::new(factory)
        }
    }

    /// Takes an item out of the pool
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(item) => item,
            None => {
                self.created += 1;
                (self.factory)()
            }
        }
    }

    /// Puts an item back
    pub fn release(&mut self, item: T) {
        if self.max_free.map_or(true, |max| self.free.len() < max) {
            self.free.push(item);
        }
    }

    /// Number of idle items ready to be handed out
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Number of items the factory has built so far
    pub fn created(&self) -> usize {
        self.created
    }
}
