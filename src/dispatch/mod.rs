//! # Affinity dispatch: run actions on the owner thread.
//!
//! - [`Affinity`] identity token of the owner thread, captured at construction
//! - [`Dispatcher`] closable FIFO of actions, drained only on the owner thread
//! - [`DrainExit`] why a drain loop returned
//!
//! ```text
//!  background producers            affinity thread
//!   worker A ─┐
//!   worker B ─┼─ dispatch(action) ──► [ FIFO ] ──► drain(token) ──► action()
//!   watcher  ─┘                           ▲
//!                                         └── close() once work has terminated
//! ```

mod affinity;
mod dispatcher;

pub use affinity::Affinity;
pub use dispatcher::{Action, Dispatcher, DrainExit};
