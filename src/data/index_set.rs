//! A dense bit-set over `[0, N)`, used to avoid revisiting bodies/constraints
//! during a traversal.
//!
//! Deliberately backed by a dense bit array rather than a general hash set:
//! indices are small and densely packed, so a bit array stays both smaller
//! and faster than a hash set on the traversal hot path.

use bit_vec::BitVec;

/// Dense `O(1)`-membership bit-set over a known index range.
///
/// Grows to accommodate the largest index ever inserted; does not shrink.
#[derive(Clone, Debug, Default)]
pub struct IndexSet {
    bits: BitVec,
}

impl IndexSet {
    /// Creates an empty index set with no pre-reserved capacity.
    pub fn new() -> Self {
        Self { bits: BitVec::new() }
    }

    /// Creates an empty index set with room for `capacity` indices without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: BitVec::from_elem(capacity, false),
        }
    }

    /// Returns whether `index` is present in the set.
    pub fn contains(&self, index: usize) -> bool {
        self.bits.get(index).unwrap_or(false)
    }

    /// Inserts `index`, growing the backing storage if necessary.
    ///
    /// Returns `true` if the index was newly inserted (i.e. it was absent before).
    pub fn insert(&mut self, index: usize) -> bool {
        if index >= self.bits.len() {
            self.bits.grow(index + 1 - self.bits.len(), false);
        }
        let was_present = self.bits[index];
        self.bits.set(index, true);
        !was_present
    }

    /// Inserts `index` without checking whether it was already present.
    ///
    /// The caller must guarantee `index` is not already in the set; this
    /// exists purely to document that guarantee at call sites — the
    /// bit-set itself is not any faster for it.
    pub fn insert_unsafely(&mut self, index: usize) {
        if index >= self.bits.len() {
            self.bits.grow(index + 1 - self.bits.len(), false);
        }
        debug_assert!(!self.bits[index], "index was already present");
        self.bits.set(index, true);
    }

    /// Removes every element, keeping the allocated storage.
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// The number of indices the set can currently hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.bits.len()
    }
}
