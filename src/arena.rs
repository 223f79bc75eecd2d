//! Worker pool integration.
//!
//! The fork-join primitives never talk to threads directly; they hand groups
//! of closures to an [`ExecutionArena`] and block until the group has
//! finished. Two implementations are provided:
//!
//! - [`ThreadPoolArena`]: backed by a dedicated Rayon thread pool; this is
//!   what the process-wide default arena uses.
//! - [`SequentialArena`]: runs every task inline on the calling thread, in
//!   submission order, which makes the chunked execution path deterministic
//!   in tests.
//!
//! The default arena is built lazily on first use and reused for the
//! lifetime of the process. Call [`configure_global`] before any parallel
//! work to pick its thread count explicitly; afterwards the configuration is
//! fixed.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::ParallelError;

/// Environment variable consulted by [`ArenaConfig::from_env`] for the
/// worker thread count of the default arena.
pub const NUM_THREADS_ENV: &str = "RANGEFORK_NUM_THREADS";

/// A unit of work submitted to an arena.
pub type ArenaTask<'env> = Box<dyn FnOnce() + Send + 'env>;

/// A shared pool of worker threads that runs submitted task groups.
///
/// Implementations must run every task in a submitted group to completion
/// before returning from [`submit_and_join`](ExecutionArena::submit_and_join),
/// regardless of what the tasks do internally. Tasks are opaque; the arena
/// owns scheduling and sizing policy.
pub trait ExecutionArena: Send + Sync {
    /// Number of worker threads currently available.
    fn current_concurrency(&self) -> usize;

    /// Run every task in `group`, returning only once all have finished.
    fn submit_and_join<'env>(&self, group: Vec<ArenaTask<'env>>);
}

/// Configuration for a [`ThreadPoolArena`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Number of worker threads (`None` = one per available core).
    pub num_threads: Option<usize>,
    /// Prefix for worker thread names; threads are named `<prefix>-<index>`.
    pub thread_name_prefix: String,
    /// Stack size per worker thread in bytes (`None` = pool default).
    pub stack_size: Option<usize>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "rangefork-worker".to_string(),
            stack_size: None,
        }
    }
}

impl ArenaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with the thread count taken from
    /// `RANGEFORK_NUM_THREADS` when set to a positive integer.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(NUM_THREADS_ENV) {
            match value.parse::<usize>() {
                Ok(n) if n > 0 => config.num_threads = Some(n),
                _ => log::warn!("ignoring invalid {NUM_THREADS_ENV}={value:?}"),
            }
        }
        config
    }

    /// Set the number of worker threads.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set the worker thread name prefix.
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the per-worker stack size in bytes.
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    fn resolved_num_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// [`ExecutionArena`] backed by a dedicated Rayon thread pool.
#[derive(Debug)]
pub struct ThreadPoolArena {
    pool: rayon::ThreadPool,
}

impl ThreadPoolArena {
    /// Build an arena from `config`.
    pub fn new(config: &ArenaConfig) -> Result<Self, ParallelError> {
        let prefix = config.thread_name_prefix.clone();
        let mut builder = rayon::ThreadPoolBuilder::new()
            .num_threads(config.resolved_num_threads())
            .thread_name(move |index| format!("{prefix}-{index}"));
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }
        let pool = builder
            .build()
            .map_err(|e| ParallelError::PoolBuild(e.to_string()))?;
        Ok(Self { pool })
    }
}

impl ExecutionArena for ThreadPoolArena {
    fn current_concurrency(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn submit_and_join<'env>(&self, group: Vec<ArenaTask<'env>>) {
        self.pool.scope(|scope| {
            for task in group {
                scope.spawn(move |_| task());
            }
        });
    }
}

/// Deterministic [`ExecutionArena`] that runs every task inline on the
/// calling thread, in submission order.
///
/// The reported concurrency is configurable: a value above 1 lets tests
/// drive the chunked dispatch path without real threads, while the default
/// of 1 exercises the single-threaded fallback in the primitives.
#[derive(Debug, Clone, Copy)]
pub struct SequentialArena {
    concurrency: usize,
}

impl SequentialArena {
    pub fn new() -> Self {
        Self { concurrency: 1 }
    }

    /// Arena that claims `concurrency` workers but still runs everything
    /// inline.
    pub fn with_reported_concurrency(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }
}

impl Default for SequentialArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionArena for SequentialArena {
    fn current_concurrency(&self) -> usize {
        self.concurrency
    }

    fn submit_and_join<'env>(&self, group: Vec<ArenaTask<'env>>) {
        for task in group {
            task();
        }
    }
}

static GLOBAL_ARENA: OnceLock<ThreadPoolArena> = OnceLock::new();

/// The process-wide shared arena, built lazily on first use and reused by
/// every subsequent call.
pub fn global_arena() -> &'static ThreadPoolArena {
    GLOBAL_ARENA.get_or_init(|| {
        let config = ArenaConfig::from_env();
        log::debug!(
            "initializing global execution arena with {} worker threads",
            config.resolved_num_threads()
        );
        ThreadPoolArena::new(&config).expect("failed to build global execution arena")
    })
}

/// Install `config` as the global arena. Must be called before the first
/// parallel call (or any other first use of the global arena); afterwards
/// the global arena is fixed and this returns
/// [`ParallelError::ArenaAlreadyInitialized`].
pub fn configure_global(config: &ArenaConfig) -> Result<(), ParallelError> {
    let arena = ThreadPoolArena::new(config)?;
    GLOBAL_ARENA
        .set(arena)
        .map_err(|_| ParallelError::ArenaAlreadyInitialized)
}

/// Concurrency of the global arena.
pub fn current_num_threads() -> usize {
    global_arena().current_concurrency()
}
