//! Fan-out of a worker closure to `W` logical workers, each with a stable
//! index and a dedicated thread-local [`BufferPool`].

use std::cell::RefCell;

use super::BufferPool;

/// Runs a worker function across a fixed number of logical workers.
///
/// With the `parallel` feature enabled, workers run on a `rayon` scope (one
/// spawned task per worker, real OS-thread parallelism via the global
/// pool). Without it, `thread_count` workers still run, sequentially on the
/// calling thread — still a valid `W`-worker schedule, just not a
/// concurrent one.
pub struct ThreadDispatcher {
    thread_count: usize,
    pools: Vec<RefCell<BufferPool>>,
}

impl ThreadDispatcher {
    /// Creates a dispatcher with `thread_count` logical workers, each owning
    /// its own [`BufferPool`].
    pub fn new(thread_count: usize) -> Self {
        let thread_count = thread_count.max(1);
        Self {
            thread_count,
            pools: (0..thread_count).map(|_| RefCell::new(BufferPool::new())).collect(),
        }
    }

    /// The number of logical workers this dispatcher fans out to.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Borrows the buffer pool dedicated to worker `i`.
    ///
    /// Panics if `i >= thread_count()`: asking for a pool that doesn't
    /// exist is a programming error, not a recoverable condition.
    pub fn thread_buffer_pool(&self, i: usize) -> &RefCell<BufferPool> {
        &self.pools[i]
    }

    /// Blocks until `f(i)` has run for every worker index `i` in `0..thread_count()`.
    #[cfg(feature = "parallel")]
    pub fn dispatch_workers<F>(&self, f: F)
    where
        F: Fn(usize) + Sync,
    {
        rayon::scope(|scope| {
            for i in 0..self.thread_count {
                let f = &f;
                scope.spawn(move |_| f(i));
            }
        });
    }

    /// Sequential fallback used when the `parallel` feature is disabled.
    #[cfg(not(feature = "parallel"))]
    pub fn dispatch_workers<F>(&self, f: F)
    where
        F: Fn(usize),
    {
        for i in 0..self.thread_count {
            f(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dispatches_every_worker_index_exactly_once() {
        let dispatcher = ThreadDispatcher::new(4);
        let seen = (0..4).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>();
        dispatcher.dispatch_workers(|i| {
            seen[i].fetch_add(1, Ordering::SeqCst);
        });
        for counter in &seen {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn each_worker_has_a_distinct_pool() {
        let dispatcher = ThreadDispatcher::new(2);
        let mut v: Vec<u32> = dispatcher.thread_buffer_pool(0).borrow_mut().take_vec(4);
        v.push(1);
        dispatcher.thread_buffer_pool(0).borrow_mut().return_vec(v);

        // Worker 1's pool never saw a `u32` buffer, so it must allocate fresh.
        let fresh: Vec<u32> = dispatcher.thread_buffer_pool(1).borrow_mut().take_vec(4);
        assert!(fresh.is_empty());
    }
}
