//! Fork-join iteration and reduction over integer index ranges.
//!
//! [`parallel_for`] and [`parallel_reduce`] split `[begin, end)` into chunks
//! of at least `grain_size` indices, run the chunks concurrently on an
//! [`ExecutionArena`], and re-raise at most one worker panic on the calling
//! thread once every chunk has finished. Small ranges, a single-threaded
//! arena, and calls nested inside an already-running chunk all take a
//! direct sequential path with no pool interaction.
//!
//! ## Example
//!
//! ```
//! let total = rangefork::parallel_reduce(
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

use std::cell::Cell;
use std::sync::Mutex;

use crate::arena::{global_arena, ArenaTask, ExecutionArena};
use crate::error::ParallelError;
use crate::partition::{effective_grain, split_range, SubRange};
use crate::unwind::PanicSlot;

thread_local! {
    static IN_PARALLEL_REGION: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is executing a chunk dispatched by
/// [`parallel_for`] or [`parallel_reduce`].
///
/// Calls made from inside a chunk see this as `true` and run sequentially
/// instead of re-entering the arena.
pub fn in_parallel_region() -> bool {
    IN_PARALLEL_REGION.with(Cell::get)
}

struct RegionGuard {
    prev: bool,
}

impl RegionGuard {
    fn enter() -> Self {
        Self {
            prev: IN_PARALLEL_REGION.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for RegionGuard {
    fn drop(&mut self) {
        let prev = self.prev;
        IN_PARALLEL_REGION.with(|flag| flag.set(prev));
    }
}

fn should_run_sequentially<A>(arena: &A, begin: i64, end: i64, grain_size: i64) -> bool
where
    A: ExecutionArena + ?Sized,
{
    (end - begin) < grain_size || arena.current_concurrency() == 1 || in_parallel_region()
}

/// Run `body` over disjoint chunks of `[begin, end)` on the process-wide
/// arena.
///
/// `body(lo, hi)` is invoked once per chunk, concurrently from multiple
/// worker threads; the chunks exactly cover `[begin, end)`. A panic raised
/// by any chunk is re-raised on the calling thread after all chunks have
/// finished; when several chunks panic concurrently, exactly one of the
/// payloads survives. Callers are responsible for keeping concurrent `body`
/// invocations free of data races outside their own subrange.
///
/// Ranges shorter than `grain_size`, an arena with one worker, and nested
/// calls all run `body(begin, end)` inline, with panics propagating
/// natively. An empty range returns without calling `body`; a negative
/// `grain_size` is rejected before any work starts.
pub fn parallel_for<F>(begin: i64, end: i64, grain_size: i64, body: F) -> Result<(), ParallelError>
where
    F: Fn(i64, i64) + Send + Sync,
{
    parallel_for_in(global_arena(), begin, end, grain_size, body)
}

/// [`parallel_for`] against an explicit arena.
pub fn parallel_for_in<A, F>(
    arena: &A,
    begin: i64,
    end: i64,
    grain_size: i64,
    body: F,
) -> Result<(), ParallelError>
where
    A: ExecutionArena + ?Sized,
    F: Fn(i64, i64) + Send + Sync,
{
    if grain_size < 0 {
        return Err(ParallelError::InvalidGrainSize(grain_size));
    }
    if begin >= end {
        return Ok(());
    }
    if should_run_sequentially(arena, begin, end, grain_size) {
        body(begin, end);
        return Ok(());
    }

    let chunks = split_range(begin, end, grain_size);
    log::trace!(
        "parallel_for: dispatching {} chunks over [{begin}, {end})",
        chunks.len()
    );

    let slot = PanicSlot::new();
    {
        let slot = &slot;
        let body = &body;
        let group: Vec<ArenaTask<'_>> = chunks
            .iter()
            .map(|chunk| {
                let SubRange { lo, hi } = *chunk;
                Box::new(move || {
                    let _region = RegionGuard::enter();
                    slot.run_captured(|| body(lo, hi));
                }) as ArenaTask<'_>
            })
            .collect();
        arena.submit_and_join(group);
    }

    slot.resume();
    Ok(())
}

/// Fold `[begin, end)` in parallel and combine the per-chunk partials into
/// one result, on the process-wide arena.
///
/// Each chunk computes `reduce_fn(lo, hi, identity.clone())`; the partials
/// are then merged with `combine_fn` bottom-up along the partition tree.
/// `combine_fn` must be associative for the result to be well defined; the
/// combination order is deterministic for a fixed `(begin, end, grain_size)`
/// but is not left-to-right sequential. A chunk that panics contributes
/// `identity` as its partial, and the panic is re-raised on the calling
/// thread after the join, discarding the combined value.
///
/// Empty ranges return `identity`; the sequential fallback returns
/// `reduce_fn(begin, end, identity)` directly.
pub fn parallel_reduce<T, F, C>(
    begin: i64,
    end: i64,
    grain_size: i64,
    identity: T,
    reduce_fn: F,
    combine_fn: C,
) -> Result<T, ParallelError>
where
    T: Clone + Send,
    F: Fn(i64, i64, T) -> T + Send + Sync,
    C: Fn(T, T) -> T,
{
    parallel_reduce_in(
        global_arena(),
        begin,
        end,
        grain_size,
        identity,
        reduce_fn,
        combine_fn,
    )
}

/// [`parallel_reduce`] against an explicit arena.
pub fn parallel_reduce_in<A, T, F, C>(
    arena: &A,
    begin: i64,
    end: i64,
    grain_size: i64,
    identity: T,
    reduce_fn: F,
    combine_fn: C,
) -> Result<T, ParallelError>
where
    A: ExecutionArena + ?Sized,
    T: Clone + Send,
    F: Fn(i64, i64, T) -> T + Send + Sync,
    C: Fn(T, T) -> T,
{
    if grain_size < 0 {
        return Err(ParallelError::InvalidGrainSize(grain_size));
    }
    if begin >= end {
        return Ok(identity);
    }
    if should_run_sequentially(arena, begin, end, grain_size) {
        return Ok(reduce_fn(begin, end, identity));
    }

    let chunks = split_range(begin, end, grain_size);
    log::trace!(
        "parallel_reduce: dispatching {} chunks over [{begin}, {end})",
        chunks.len()
    );

    let slot = PanicSlot::new();
    let partials: Mutex<Vec<Option<T>>> = Mutex::new(vec![None; chunks.len()]);
    {
        let slot = &slot;
        let partials = &partials;
        let reduce_fn = &reduce_fn;
        let group: Vec<ArenaTask<'_>> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| {
                let SubRange { lo, hi } = *chunk;
                let seed = identity.clone();
                Box::new(move || {
                    let _region = RegionGuard::enter();
                    let mut partial = None;
                    slot.run_captured(|| {
                        partial = Some(reduce_fn(lo, hi, seed.clone()));
                    });
                    // A panicked chunk contributes its seed so the fold
                    // stays well-typed; the value is discarded on resume.
                    partials.lock().unwrap()[index] = Some(partial.unwrap_or(seed));
                }) as ArenaTask<'_>
            })
            .collect();
        arena.submit_and_join(group);
    }

    slot.resume();

    let mut partials = partials.into_inner().unwrap();
    let mut next = 0;
    let result = combine_span(
        begin,
        end,
        effective_grain(grain_size),
        &mut next,
        &mut partials,
        &identity,
        &combine_fn,
    );
    Ok(result)
}

/// Merge leaf partials bottom-up by re-walking the bisection tree that
/// produced them. `next` indexes the in-order leaves.
fn combine_span<T, C>(
    lo: i64,
    hi: i64,
    grain: i64,
    next: &mut usize,
    partials: &mut [Option<T>],
    identity: &T,
    combine: &C,
) -> T
where
    T: Clone,
    C: Fn(T, T) -> T,
{
    if hi - lo <= grain {
        let index = *next;
        *next += 1;
        partials[index].take().unwrap_or_else(|| identity.clone())
    } else {
        let mid = lo + (hi - lo) / 2;
        let left = combine_span(lo, mid, grain, next, partials, identity, combine);
        let right = combine_span(mid, hi, grain, next, partials, identity, combine);
        combine(left, right)
    }
}
