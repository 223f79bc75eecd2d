//! Error types for the fork-join entry points.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParallelError {
    /// Grain size was negative. Reported synchronously on the calling
    /// thread, before any chunk is dispatched.
    #[error("invalid grain size: {0} (must be non-negative)")]
    InvalidGrainSize(i64),

    /// The global execution arena was already built, either by an earlier
    /// [`configure_global`](crate::arena::configure_global) call or by the
    /// first parallel call lazily constructing it.
    #[error("global execution arena is already initialized")]
    ArenaAlreadyInitialized,

    /// The backing worker pool could not be constructed.
    #[error("failed to build worker pool: {0}")]
    PoolBuild(String),
}

/// Convenience alias for fallible parallel operations.
pub type ParallelResult<T> = Result<T, ParallelError>;
