//! Cancellation signal and the session-wide stop hook.
//!
//! - [`CancelSignal`] per-cycle single-shot signal (token + callbacks)
//! - [`StopHandle`] external stop hook shared with other threads

mod cancel;
mod stop;

pub use cancel::CancelSignal;
pub use stop::StopHandle;
