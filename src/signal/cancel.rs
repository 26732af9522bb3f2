//! # Single-shot cancellation signal with callbacks.
//!
//! [`CancelSignal`] pairs a [`CancellationToken`] (what work bodies poll or await)
//! with a list of callbacks that fire when the signal trips.
//!
//! ## Rules
//! - `cancel` is idempotent: callbacks fire at most once, the token stays cancelled.
//! - A panicking callback is caught; the others still run and the token still trips.
//! - Callbacks run on the thread calling `cancel`, **before** the token trips, so
//!   anything they dispatch is queued before a drain loop observes the token.
//! - Registering on a tripped signal runs the callback immediately.
//! - Registering on a disposed signal is [`SignalError::Disposed`].
//! - `dispose` drops pending callbacks; it does not trip the token.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::error::{PanicError, SignalError};

type Callback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct State {
    callbacks: Vec<Callback>,
    fired: bool,
    disposed: bool,
}

/// Broadcastable, single-shot stop notification.
///
/// Cheap to clone; clones share state.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use affinity_dispatch::CancelSignal;
///
/// let signal = CancelSignal::new();
/// let hits = Arc::new(AtomicUsize::new(0));
/// let h = Arc::clone(&hits);
/// signal.register(move || { h.fetch_add(1, Ordering::SeqCst); }).unwrap();
///
/// signal.cancel();
/// signal.cancel();
/// assert!(signal.token().is_cancelled());
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct CancelSignal {
    token: CancellationToken,
    state: Arc<Mutex<State>>,
}

impl CancelSignal {
    /// Creates an untripped signal.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// The token observed by work bodies.
    #[inline]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// True once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Trips the signal. Returns `true` for the call that tripped it.
    ///
    /// A panicking callback does not stop the remaining callbacks, and the token
    /// trips regardless.
    pub fn cancel(&self) -> bool {
        self.trip().is_some()
    }

    /// Trips the signal and returns the panics caught in callbacks, or `None` if it
    /// was already tripped.
    pub(crate) fn trip(&self) -> Option<Vec<PanicError>> {
        let callbacks = {
            let mut state = self.lock();
            if state.fired {
                return None;
            }
            state.fired = true;
            std::mem::take(&mut state.callbacks)
        };
        let panics = callbacks
            .into_iter()
            .filter_map(|cb| panic::catch_unwind(AssertUnwindSafe(cb)).err())
            .map(PanicError::from_payload)
            .collect();
        self.token.cancel();
        Some(panics)
    }

    /// Registers `callback` to run when the signal trips.
    pub fn register<F>(&self, callback: F) -> Result<(), SignalError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.lock();
        if state.disposed {
            return Err(SignalError::Disposed);
        }
        if state.fired {
            drop(state);
            callback();
            return Ok(());
        }
        state.callbacks.push(Box::new(callback));
        Ok(())
    }

    /// Releases the signal at the end of its cycle.
    pub fn dispose(&self) {
        let dropped = {
            let mut state = self.lock();
            state.disposed = true;
            std::mem::take(&mut state.callbacks)
        };
        drop(dropped);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("CancelSignal")
            .field("cancelled", &self.token.is_cancelled())
            .field("disposed", &state.disposed)
            .field("callbacks", &state.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_cancel_is_idempotent() {
        let s = CancelSignal::new();
        assert!(s.cancel());
        assert!(!s.cancel());
        assert!(s.is_cancelled());
    }

    #[test]
    fn test_all_callbacks_fire_once() {
        let s = CancelSignal::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let h = Arc::clone(&hits);
            s.register(move || {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        s.cancel();
        s.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_callbacks_run_before_token_trips() {
        let s = CancelSignal::new();
        let token = s.token();
        let seen = Arc::new(Mutex::new(None));
        let out = Arc::clone(&seen);
        s.register(move || *out.lock().unwrap() = Some(token.is_cancelled()))
            .unwrap();

        s.cancel();
        assert_eq!(*seen.lock().unwrap(), Some(false));
    }

    #[test]
    fn test_register_after_cancel_runs_immediately() {
        let s = CancelSignal::new();
        s.cancel();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        s.register(move || {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_after_dispose_fails() {
        let s = CancelSignal::new();
        s.dispose();
        assert!(s.is_disposed());
        assert_eq!(s.register(|| {}), Err(SignalError::Disposed));
    }

    #[test]
    fn test_dispose_drops_pending_callbacks() {
        let s = CancelSignal::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        s.register(move || {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        s.dispose();
        s.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(s.is_cancelled());
    }

    #[test]
    fn test_panicking_callback_still_trips_token() {
        let s = CancelSignal::new();
        let hits = Arc::new(AtomicUsize::new(0));
        s.register(|| panic!("callback boom")).unwrap();
        let h = Arc::clone(&hits);
        s.register(move || {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let panics = s.trip().unwrap();
        assert_eq!(panics.len(), 1);
        assert_eq!(panics[0].message, "callback boom");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(s.token().is_cancelled());
        assert!(!s.cancel());
    }

    #[test]
    fn test_cancel_from_other_thread() {
        let s = CancelSignal::new();
        let remote = s.clone();
        thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(s.token().is_cancelled());
    }
}
