//! Session core: cycle orchestration and lifecycle.
//!
//! The public API of this module is [`Session`] (with [`SessionBuilder`]),
//! [`Config`] and [`CycleOutcome`].
//!
//! Internal modules:
//! - [`session`]: owns the affinity token, runtime and stop hook; runs cycles;
//! - [`runner`]: completion watcher that reports the body's outcome and closes the queue;
//! - [`builder`]: runtime, bus and subscriber wiring;
//! - [`shutdown`]: OS termination signals for `stop_on_interrupt`.

mod builder;
mod config;
mod runner;
mod session;
mod shutdown;

pub use builder::SessionBuilder;
pub use config::Config;
pub use runner::CycleOutcome;
pub use session::Session;
