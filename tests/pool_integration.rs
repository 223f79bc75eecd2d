//! Integration tests against real thread-pool arenas.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::thread;

use approx::assert_relative_eq;
use rangefork::{
    parallel_for, parallel_for_in, parallel_reduce, parallel_reduce_in, ArenaConfig,
    ThreadPoolArena,
};

fn small_pool() -> ThreadPoolArena {
    ThreadPoolArena::new(
        &ArenaConfig::new()
            .with_num_threads(4)
            .with_thread_name_prefix("pool-test"),
    )
    .unwrap()
}

#[test]
fn test_parallel_for_covers_range_on_pool() {
    let arena = small_pool();
    let sum = AtomicI64::new(0);
    let calls = AtomicUsize::new(0);

    parallel_for_in(&arena, 0, 10_000, 64, |lo, hi| {
        calls.fetch_add(1, Ordering::Relaxed);
        sum.fetch_add((lo..hi).sum::<i64>(), Ordering::Relaxed);
    })
    .unwrap();

    assert_eq!(sum.load(Ordering::Relaxed), (0..10_000i64).sum::<i64>());
    assert!(calls.load(Ordering::Relaxed) > 1);
}

#[test]
fn test_parallel_for_runs_off_calling_thread() {
    let arena = small_pool();
    let caller = thread::current().id();
    let off_thread = AtomicUsize::new(0);

    parallel_for_in(&arena, 0, 4_096, 32, |_, _| {
        if thread::current().id() != caller {
            off_thread.fetch_add(1, Ordering::Relaxed);
        }
    })
    .unwrap();

    assert!(off_thread.load(Ordering::Relaxed) > 0);
}

#[test]
fn test_parallel_reduce_sum_on_pool() {
    let arena = small_pool();
    let total = parallel_reduce_in(
        &arena,
        0,
        1000,
        7,
        0i64,
        |lo, hi, seed| (lo..hi).fold(seed, |acc, i| acc + i),
        |a, b| a + b,
    )
    .unwrap();
    assert_eq!(total, 499_500);
}

#[test]
fn test_parallel_reduce_float_mean_on_pool() {
    let arena = small_pool();
    let n = 100_000;
    let total = parallel_reduce_in(
        &arena,
        0,
        n,
        1024,
        0.0f64,
        |lo, hi, seed| (lo..hi).fold(seed, |acc, i| acc + i as f64),
        |a, b| a + b,
    )
    .unwrap();

    let mean = total / n as f64;
    assert_relative_eq!(mean, (n - 1) as f64 / 2.0, max_relative = 1e-12);
}

#[test]
fn test_worker_panic_reraised_on_calling_thread() {
    let arena = small_pool();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        parallel_for_in(&arena, 0, 1_000, 10, |lo, _| {
            if lo >= 500 {
                panic!("worker chunk failed at {lo}");
            }
        })
    }));

    let payload = outcome.unwrap_err();
    let message = payload.downcast_ref::<String>().unwrap();
    assert!(message.starts_with("worker chunk failed at"));

    // The pool survives a captured panic and stays usable.
    let sum = AtomicI64::new(0);
    parallel_for_in(&arena, 0, 100, 10, |lo, hi| {
        sum.fetch_add(hi - lo, Ordering::Relaxed);
    })
    .unwrap();
    assert_eq!(sum.load(Ordering::Relaxed), 100);
}

#[test]
fn test_global_arena_entry_points() {
    let sum = AtomicI64::new(0);
    parallel_for(0, 1_000, 16, |lo, hi| {
        sum.fetch_add((lo..hi).sum::<i64>(), Ordering::Relaxed);
    })
    .unwrap();
    assert_eq!(sum.load(Ordering::Relaxed), 499_500);

    let total = parallel_reduce(
        0,
        1_000,
        7,
        0i64,
        |lo, hi, seed| (lo..hi).fold(seed, |acc, i| acc + i),
        |a, b| a + b,
    )
    .unwrap();
    assert_eq!(total, 499_500);
}

#[test]
fn test_nested_parallel_for_on_pool() {
    let arena = small_pool();
    let sum = AtomicI64::new(0);

    parallel_for_in(&arena, 0, 1_024, 128, |lo, hi| {
        // Nested calls run inline on the worker; the totals still add up.
        parallel_for_in(&arena, lo, hi, 16, |ilo, ihi| {
            sum.fetch_add((ilo..ihi).sum::<i64>(), Ordering::Relaxed);
        })
        .unwrap();
    })
    .unwrap();

    assert_eq!(sum.load(Ordering::Relaxed), (0..1_024i64).sum::<i64>());
}
