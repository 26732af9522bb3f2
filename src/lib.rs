//! # affinity-dispatch
//!
//! **affinity-dispatch** runs async work on a background runtime while every
//! output it produces is delivered on one owner thread (the *affinity thread*),
//! with cooperative cancellation driven by an external stop hook.
//!
//! It is meant for hosts whose output objects may only be touched from the thread
//! that created them (command pipelines, UI loops, single-threaded plugin hosts),
//! but whose actual work is asynchronous or long-running.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   affinity thread                          background runtime (tokio)
//! ┌───────────────────────────┐            ┌───────────────────────────────┐
//! │ Session::run_cycle(work)  │  spawn     │ work.run(CycleContext)        │
//! │   ├─ begin_cycle()        ├───────────►│   ctx.emit(item) ───────┐     │
//! │   │                       │            │   ctx.dispatch(action) ─┤     │
//! │   └─ Dispatcher::drain ◄──┼────────────┼──────── [ FIFO queue ] ◄┘     │
//! │        │ action(&sink)    │            │                               │
//! │        ▼                  │            │ watch_completion(body)        │
//! │      Sink::write_item     │            │   failure ─► write_error      │
//! │      Sink::write_error    │            │   then ─► close queue         │
//! └───────────▲───────────────┘            └───────────────────────────────┘
//!             │ cancel: callbacks, then token
//!     StopHandle::stop()  (any thread)
//! ```
//!
//! ### Cycle
//! ```text
//! run_cycle ──► affinity check ──► fresh CancelSignal + Dispatcher
//!    ├─► spawn body, spawn completion watcher
//!    ├─► drain until queue closed or stop requested
//!    │     ├─ closed    ─► Completed | Failed (one error report delivered)
//!    │     └─ cancelled ─► close queue, flush queued actions ─► Stopped
//!    └─► dispose the cycle's signal
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------------|---------------------------------------------|
//! | **Session**       | Owner-thread bridge: runs cycles, stop and teardown hooks.         | [`Session`], [`SessionBuilder`], [`StopHandle`] |
//! | **Dispatch**      | Affinity token and closable action queue.                          | [`Affinity`], [`Dispatcher`]                |
//! | **Cancellation**  | Single-shot signal with callbacks over a tokio-util token.         | [`CancelSignal`]                            |
//! | **Work**          | Async work bodies and their per-cycle context.                     | [`Work`], [`WorkFn`], [`CycleContext`]      |
//! | **Output**        | Affinity-owned sink and structured error reports.                  | [`Sink`], [`ErrorRecord`], [`Collector`]    |
//! | **Events**        | Session lifecycle events and subscribers.                          | [`Event`], [`Subscribe`]                    |
//! | **Errors**        | Typed errors for misuse and work failures.                         | [`CycleError`], [`DispatchError`], [`WorkError`] |
//! | **Configuration** | Runtime sizing, bus capacity, error report identity.               | [`Config`]                                  |
//!
//! ## Limitations
//! - [`Sink`] must be `Send + Sync` even though it is only called on the affinity
//!   thread: dispatched actions capture it on background threads. `!Sync` host
//!   objects need a `Mutex` or a forwarding front.
//! - The affinity thread must not be a worker of an async runtime: `run_cycle`
//!   blocks it while draining.
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use affinity_dispatch::{Collector, Config, CycleContext, CycleOutcome, SessionBuilder, WorkError, WorkFn};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = Arc::new(Collector::<String>::new());
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn affinity_dispatch::Subscribe>> =
//!         vec![Arc::new(affinity_dispatch::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn affinity_dispatch::Subscribe>> = Vec::new();
//!
//!     let session = SessionBuilder::new(Config::default())
//!         .with_subscribers(subs)
//!         .build(Arc::clone(&sink))?;
//!
//!     let work = WorkFn::arc("count", |ctx: CycleContext<Collector<String>>| async move {
//!         for i in 1..=3 {
//!             ctx.sleep(Duration::from_millis(5)).await?;
//!             ctx.emit(i.to_string()).map_err(WorkError::failed)?;
//!         }
//!         Ok(())
//!     });
//!
//!     assert_eq!(session.run_cycle(work)?, CycleOutcome::Completed);
//!     assert_eq!(sink.items(), vec!["1", "2", "3"]);
//!     Ok(())
//! }
//! ```
mod core;
mod dispatch;
mod error;
mod events;
mod output;
mod signal;
mod subscribers;
mod work;

// ---- Public re-exports ----

pub use crate::core::{Config, CycleOutcome, Session, SessionBuilder};
pub use dispatch::{Action, Affinity, Dispatcher, DrainExit};
pub use error::{BoxError, CycleError, DispatchError, PanicError, SignalError, WorkError};
pub use events::{Bus, Event, EventKind};
pub use output::{Collector, ErrorCategory, ErrorRecord, Sink};
pub use signal::{CancelSignal, StopHandle};
pub use subscribers::{Subscribe, SubscriberSet};
pub use work::{CycleContext, Work, WorkFn, WorkRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
