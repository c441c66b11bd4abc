//! Monotonic integer id allocator with reuse: a monotonic counter plus a
//! free-list of returned ids, `take` preferring the free-list.

/// Allocates small non-negative integer ids, preferring to recycle ids
/// that were previously returned over minting new ones.
///
/// Used by the deactivator to name inactive `BodySet`/`ConstraintSet`
/// slots. Id `0` is never handed out by this pool — the active set id is
/// reserved by convention at the call site, not here.
#[derive(Clone, Debug, Default)]
pub struct IdPool {
    next_id: u32,
    free_list: Vec<u32>,
}

impl IdPool {
    /// Creates a pool that will mint ids starting at `1` (`0` stays reserved for the active set).
    pub fn new() -> Self {
        Self {
            next_id: 1,
            free_list: Vec::new(),
        }
    }

    /// Takes an id, preferring a recycled one from the free-list.
    pub fn take(&mut self) -> u32 {
        if let Some(id) = self.free_list.pop() {
            id
        } else {
            let id = self.next_id;
            self.next_id += 1;
            id
        }
    }

    /// Returns an id to the pool so a future `take` can recycle it.
    pub fn free(&mut self, id: u32) {
        debug_assert_ne!(id, 0, "id 0 is reserved for the active set");
        self.free_list.push(id);
    }

    /// The smallest id that has never been handed out by this pool.
    ///
    /// Callers use this to grow `Sets` arrays before writing to a freshly
    /// taken id.
    pub fn highest_possibly_claimed_id(&self) -> u32 {
        self.next_id.saturating_sub(1)
    }
}
