//! # Session configuration.
//!
//! Provides [`Config`] centralized settings for a [`Session`](crate::Session).
//!
//! ## Sentinel values
//! - `worker_threads = 0` → tokio default (one per core)
//! - `bus_capacity = 0` → clamped to 1

use std::borrow::Cow;

use crate::output::ErrorCategory;

/// Configuration for a session and its background runtime.
///
/// ## Field semantics
/// - `worker_threads`: background runtime worker count (`0` = tokio default);
///   ignored when the session runs on a caller-supplied runtime
/// - `thread_name`: name of background runtime threads
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `error_id`: stable identifier attached to failure reports
/// - `error_category`: category attached to failure reports
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of worker threads of the owned background runtime.
    pub worker_threads: usize,

    /// Name given to background runtime threads.
    pub thread_name: String,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events skip
    /// older items.
    pub bus_capacity: usize,

    /// Identifier carried by every failure report sent to the sink.
    pub error_id: Cow<'static, str>,

    /// Category carried by every failure report sent to the sink.
    pub error_category: ErrorCategory,
}

impl Config {
    /// Returns the worker thread count as an `Option` (`None` = tokio default).
    #[inline]
    pub fn worker_threads_limit(&self) -> Option<usize> {
        if self.worker_threads == 0 {
            None
        } else {
            Some(self.worker_threads)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `worker_threads = 0` (tokio default)
    /// - `thread_name = "affinity-worker"`
    /// - `bus_capacity = 1024`
    /// - `error_id = "background-work-failed"`
    /// - `error_category = ErrorCategory::OperationStopped`
    fn default() -> Self {
        Self {
            worker_threads: 0,
            thread_name: "affinity-worker".to_string(),
            bus_capacity: 1024,
            error_id: Cow::Borrowed("background-work-failed"),
            error_category: ErrorCategory::OperationStopped,
        }
    }
}
