//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! that delivers session events broadcast through the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   run_cycle / watcher / StopHandle ── publish(Event) ──► Bus
//!                                                           │
//!                                            subscriber_listener (Session)
//!                                                           │
//!                                                 SubscriberSet::emit(&Event)
//!                                             ┌─────────────┼─────────────┐
//!                                             ▼             ▼             ▼
//!                                         LogWriter      Metrics        Custom
//! ```
//!
//! Enable the `logging` feature to get the built-in [`LogWriter`].

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
