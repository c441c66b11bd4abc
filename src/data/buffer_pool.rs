//! A tiny slab-style buffer pool.
//!
//! Rust's ownership system already tracks buffer lifetime statically, so
//! this keeps only the part of explicit-return discipline that matters for
//! this crate: per-worker buffers are never shared, and returning a buffer
//! makes it available for the next `take` of the same element type instead
//! of allocating fresh.
//!
//! Each worker owning its own pool, and never reaching into another
//! worker's, is a correctness requirement of the surrounding dispatch code,
//! not something this type enforces itself: `BufferPool` holds only plain
//! `Send + Sync` data, so a dispatcher can keep one per worker behind a
//! `RefCell` and hand out `&ThreadDispatcher` to every worker closure.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Per-thread scratch-buffer pool.
#[derive(Default)]
pub struct BufferPool {
    // Keyed by element type, so `Vec<u32>` and `Vec<u64>` free lists don't mix.
    free_lists: HashMap<TypeId, Vec<Box<dyn Any + Send + Sync>>>,
}

impl BufferPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a `Vec<T>` with at least `capacity` headroom, reusing a
    /// previously-returned buffer of the same element type when possible.
    pub fn take_vec<T: 'static + Send + Sync>(&mut self, capacity: usize) -> Vec<T> {
        let key = TypeId::of::<Vec<T>>();
        if let Some(list) = self.free_lists.get_mut(&key) {
            if let Some(boxed) = list.pop() {
                let mut vec = *boxed.downcast::<Vec<T>>().expect("type-tagged free list");
                vec.clear();
                vec.reserve(capacity);
                return vec;
            }
        }
        Vec::with_capacity(capacity)
    }

    /// Returns a buffer to the pool for later reuse. Its contents are dropped.
    pub fn return_vec<T: 'static + Send + Sync>(&mut self, mut vec: Vec<T>) {
        vec.clear();
        let key = TypeId::of::<Vec<T>>();
        self.free_lists.entry(key).or_default().push(Box::new(vec));
    }

    /// Takes a value of type `T`, reusing a previously-returned instance of
    /// the same type when one is available, else building one via
    /// `T::default()`. Unlike [`BufferPool::take_vec`], the caller decides
    /// whether the reused value still needs clearing — this just hands back
    /// whatever was last returned.
    pub fn take<T: Default + 'static + Send + Sync>(&mut self) -> T {
        let key = TypeId::of::<T>();
        if let Some(list) = self.free_lists.get_mut(&key) {
            if let Some(boxed) = list.pop() {
                return *boxed.downcast::<T>().expect("type-tagged free list");
            }
        }
        T::default()
    }

    /// Returns a value to the pool for later reuse via [`BufferPool::take`].
    pub fn return_val<T: 'static + Send + Sync>(&mut self, value: T) {
        let key = TypeId::of::<T>();
        self.free_lists.entry(key).or_default().push(Box::new(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returned_buffer_is_reused() {
        let mut pool = BufferPool::new();
        let mut v: Vec<u32> = pool.take_vec(16);
        v.push(1);
        v.push(2);
        let ptr_before = v.as_ptr();
        pool.return_vec(v);

        let v2: Vec<u32> = pool.take_vec(4);
        assert_eq!(v2.as_ptr(), ptr_before);
        assert!(v2.is_empty());
    }

    #[test]
    fn take_reuses_a_returned_non_vec_value() {
        let mut pool = BufferPool::new();
        let mut set = super::super::IndexSet::with_capacity(128);
        set.insert(5);
        pool.return_val(set);

        let reused: super::super::IndexSet = pool.take();
        assert!(reused.capacity() >= 128, "take() must hand back the returned instance, not a fresh default");
    }

    #[test]
    fn distinct_element_types_do_not_collide() {
        let mut pool = BufferPool::new();
        let v32: Vec<u32> = pool.take_vec(4);
        pool.return_vec(v32);
        let v64: Vec<u64> = pool.take_vec(4);
        assert!(v64.is_empty());
    }
}
