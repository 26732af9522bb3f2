//! Error types used by the dispatch bridge and by work bodies.
//!
//! This module defines the error enums of the crate:
//!
//! - [`DispatchError`] - misuse of the [`Dispatcher`](crate::Dispatcher) (wrong thread, closed queue).
//! - [`SignalError`] - misuse of a [`CancelSignal`](crate::CancelSignal) after disposal.
//! - [`WorkError`] - the terminal error of a work body (failure or cooperative cancellation).
//! - [`CycleError`] - errors returned by [`Session::run_cycle`](crate::Session::run_cycle) itself.
//! - [`PanicError`] - a panic that escaped a work body, unwrapped from the join handle.
//!
//! All types provide `as_label` (stable snake_case label for logs/metrics).

use std::any::Any;
use std::thread::ThreadId;

use thiserror::Error;

/// Boxed error type carried as the cause of a failed work body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by the dispatcher.
///
/// These are contract violations by the caller and are never swallowed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// An affinity-only operation was called from another thread.
    #[error("called from thread {actual:?}, but the affinity thread is {expected:?}")]
    WrongThread {
        /// The affinity thread captured at construction.
        expected: ThreadId,
        /// The calling thread.
        actual: ThreadId,
    },

    /// The queue has been closed; the action was not accepted.
    #[error("dispatch queue is closed")]
    Closed,

    /// `drain` was re-entered from an action that is itself being drained.
    #[error("dispatch queue is already being drained")]
    AlreadyDraining,
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use affinity_dispatch::DispatchError;
    ///
    /// assert_eq!(DispatchError::Closed.as_label(), "dispatch_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::WrongThread { .. } => "dispatch_wrong_thread",
            DispatchError::Closed => "dispatch_closed",
            DispatchError::AlreadyDraining => "dispatch_already_draining",
        }
    }
}

/// # Errors produced by a cancellation signal.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    /// The signal was already released at the end of its cycle.
    #[error("cancellation signal is disposed")]
    Disposed,
}

impl SignalError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SignalError::Disposed => "signal_disposed",
        }
    }
}

/// # Terminal error of a work body.
///
/// A work body returns `Err(WorkError::Canceled)` when it observes its cycle token
/// and stops early. Any other failure is wrapped in [`WorkError::Failed`] and is
/// reported once to the sink with the original error as its cause.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkError {
    /// Work stopped cooperatively after cancellation was requested.
    #[error("work cancelled")]
    Canceled,

    /// Work failed; the boxed value is the original error.
    #[error(transparent)]
    Failed(BoxError),
}

impl WorkError {
    /// Wraps any error as a failure.
    ///
    /// # Example
    /// ```
    /// use affinity_dispatch::WorkError;
    ///
    /// let err = WorkError::failed("fail");
    /// assert_eq!(err.to_string(), "fail");
    /// assert!(!err.is_canceled());
    /// ```
    pub fn failed(err: impl Into<BoxError>) -> Self {
        WorkError::Failed(err.into())
    }

    /// True for [`WorkError::Canceled`].
    pub fn is_canceled(&self) -> bool {
        matches!(self, WorkError::Canceled)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Canceled => "work_canceled",
            WorkError::Failed(_) => "work_failed",
        }
    }
}

/// A panic that escaped a work body.
///
/// Carries the panic message extracted from the payload (`&str` or `String`
/// payloads; anything else becomes `"unknown panic"`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PanicError {
    /// The panic message.
    pub message: String,
}

impl PanicError {
    /// Builds a panic error from a raw panic payload.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self { message }
    }
}

/// # Errors returned by the cycle entry point.
///
/// A failing work body is **not** one of these: it is reported to the sink and
/// the cycle returns [`CycleOutcome::Failed`](crate::CycleOutcome::Failed).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CycleError {
    /// The entry point was called from a thread other than the affinity thread.
    #[error("run_cycle called off the affinity thread: {0}")]
    WrongThread(DispatchError),

    /// The session was torn down with [`Session::end`](crate::Session::end).
    #[error("session has ended")]
    Ended,

    /// The dispatcher rejected an operation of this cycle.
    #[error("dispatch failed: {0}")]
    Dispatch(DispatchError),

    /// The background launch terminated without reporting an outcome.
    #[error("background launch failed: {reason}")]
    Launch {
        /// Human-readable reason.
        reason: String,
    },

    /// The background runtime could not be built.
    #[error("failed to build background runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl CycleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use affinity_dispatch::CycleError;
    ///
    /// assert_eq!(CycleError::Ended.as_label(), "cycle_session_ended");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CycleError::WrongThread(_) => "cycle_wrong_thread",
            CycleError::Ended => "cycle_session_ended",
            CycleError::Dispatch(_) => "cycle_dispatch",
            CycleError::Launch { .. } => "cycle_launch_failed",
            CycleError::Runtime(_) => "cycle_runtime",
        }
    }
}

impl From<DispatchError> for CycleError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::WrongThread { .. } => CycleError::WrongThread(err),
            other => CycleError::Dispatch(other),
        }
    }
}
