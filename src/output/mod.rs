//! # Affinity-owned output channel.
//!
//! - [`Sink`] what the host exposes to receive produced items and error reports
//! - [`ErrorRecord`], [`ErrorCategory`] structured error report
//! - [`Collector`] in-memory sink (tests, demos, buffering hosts)
//!
//! A sink is only ever called from actions executed on the affinity thread.

mod collector;
mod record;
mod sink;

pub use collector::Collector;
pub use record::{ErrorCategory, ErrorRecord};
pub use sink::Sink;
