//! # Runtime events emitted by a session.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Cycle events**: one processing cycle from launch to return
//! - **Stop events**: external stop requests and session teardown
//! - **Subscriber events**: delivery problems inside the [`SubscriberSet`](crate::SubscriberSet)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, cycle number and reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use affinity_dispatch::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::WorkFailed)
//!     .with_cycle(3)
//!     .with_reason("fail");
//!
//! assert_eq!(ev.kind, EventKind::WorkFailed);
//! assert_eq!(ev.cycle, Some(3));
//! assert_eq!(ev.reason.as_deref(), Some("fail"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Stop events ===
    /// External stop requested (first request only).
    ///
    /// Sets:
    /// - `reason`: origin of the request, if known (e.g. OS signal name)
    StopRequested,

    /// A cancellation callback panicked while the stop was delivered.
    ///
    /// Sets:
    /// - `reason`: panic message
    CallbackPanicked,

    /// Session torn down; no further cycles.
    SessionEnded,

    // === Cycle events ===
    /// Work body is being launched on the background runtime.
    ///
    /// Sets:
    /// - `cycle`: cycle number (1-based, per session)
    CycleStarting,

    /// Work body returned `Ok(())`.
    ///
    /// Sets:
    /// - `cycle`: cycle number
    WorkCompleted,

    /// Work body failed or panicked; an error report was dispatched.
    ///
    /// Sets:
    /// - `cycle`: cycle number
    /// - `reason`: failure message
    WorkFailed,

    /// Work body stopped cooperatively.
    ///
    /// Sets:
    /// - `cycle`: cycle number
    WorkCanceled,

    /// Cycle returned because of a stop request.
    ///
    /// Sets:
    /// - `cycle`: cycle number
    /// - `reason`: optional detail (e.g., stopped before launch)
    CycleStopped,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Cycle number, if applicable.
    pub cycle: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Name of the emitting component (subscriber name for subscriber events).
    pub source: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            cycle: None,
            reason: None,
            source: None,
        }
    }

    /// Attaches a cycle number.
    #[inline]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the emitting component name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
