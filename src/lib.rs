//! Fork-join parallel iteration and reduction over integer index ranges.
//!
//! This crate provides the two low-level primitives a numeric runtime needs
//! to spread element-wise work across a shared worker pool:
//!
//! - [`parallel_for`]: run a side-effecting body over disjoint chunks of
//!   `[begin, end)`, concurrently.
//! - [`parallel_reduce`]: fold each chunk from an identity seed and combine
//!   the partial results into one value.
//!
//! ## Core Features
//!
//! - **Grain-size load balancing**: ranges are split by deterministic
//!   recursive bisection into chunks of at least `grain_size` indices, so
//!   the parallelism/overhead trade-off is in the caller's hands.
//! - **Panic safety**: a panic in any chunk is captured at the chunk
//!   boundary, never tears down sibling chunks or the worker pool, and is
//!   re-raised exactly once on the calling thread after the join.
//! - **Sequential fallback**: small ranges, single-threaded pools, and
//!   nested calls run inline on the calling thread with zero pool overhead.
//! - **Injectable worker pool**: both primitives run against any
//!   [`ExecutionArena`]; a process-wide Rayon-backed default is built
//!   lazily on first use, and [`SequentialArena`] makes the chunked path
//!   deterministic in tests.
//!
//! ## Module Organization
//!
//! - `parallel`: the `parallel_for` / `parallel_reduce` entry points
//! - `arena`: the worker-pool abstraction and the process-wide default pool
//! - `partition`: deterministic recursive-bisection range splitting
//! - `error`: error types
//!
//! ## Example
//!
//! ```
//! use rangefork::{parallel_for, parallel_reduce};
//! use std::sync::atomic::{AtomicI64, Ordering};
//!
//! let hits = AtomicI64::new(0);
//! parallel_for(0, 1000, 64, |lo, hi| {
//!     hits.fetch_add(hi - lo, Ordering::Relaxed);
//! })?;
//! assert_eq!(hits.load(Ordering::Relaxed), 1000);
//!
//! let total = parallel_reduce(
//!     0,
//!     1000,
//!     7,
//!     0i64,
//!     |lo, hi, seed| (lo..hi).fold(seed, |acc, i| acc + i),
//!     |a, b| a + b,
//! )?;
//! assert_eq!(total, 499_500);
//! # Ok::<(), rangefork::ParallelError>(())
//! ```

pub mod arena;
pub mod error;
pub mod parallel;
pub mod partition;
mod unwind;


pub use arena::{
    configure_global, current_num_threads, global_arena, ArenaConfig, ArenaTask, ExecutionArena,
    SequentialArena, ThreadPoolArena, NUM_THREADS_ENV,
};
pub use error::{ParallelError, ParallelResult};
pub use parallel::{
    in_parallel_region, parallel_for, parallel_for_in, parallel_reduce, parallel_reduce_in,
};
pub use partition::{divup, split_range, SubRange};
