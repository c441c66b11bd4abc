//! Small data structures shared by the deactivator and the hull builder:
//! a dense bit-set, a reusable id pool, and the thread/buffer-pool glue
//! that stands in for the engine's real allocator and dispatcher.

mod buffer_pool;
mod id_pool;
mod index_set;
mod thread_dispatcher;

pub use buffer_pool::BufferPool;
pub use id_pool::IdPool;
pub use index_set::IndexSet;
pub use thread_dispatcher::ThreadDispatcher;
