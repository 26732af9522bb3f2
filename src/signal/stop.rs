//! # External stop hook.
//!
//! [`StopHandle`] is what a host framework calls when a stop request arrives
//! (interactive interrupt, pipeline stop). It is session-wide and sticky:
//!
//! ```text
//! stop() ──► requested = true ──► active cycle signal?.cancel()
//!                                  └─► callbacks, then token
//! begin_cycle() ──► fresh CancelSignal (already tripped if requested)
//! end_cycle()   ──► dispose the cycle signal
//! end()         ──► no further cycles, dispose active signal
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::CancelSignal;
use crate::error::CycleError;
use crate::events::{Bus, Event, EventKind};

#[derive(Default)]
struct StopState {
    requested: bool,
    ended: bool,
    active: Option<CancelSignal>,
}

/// Cloneable, thread-safe stop hook for one session.
#[derive(Clone)]
pub struct StopHandle {
    state: Arc<Mutex<StopState>>,
    bus: Bus,
}

impl StopHandle {
    pub(crate) fn new(bus: Bus) -> Self {
        Self {
            state: Arc::new(Mutex::new(StopState::default())),
            bus,
        }
    }

    /// Requests a stop. Returns `true` for the first request.
    ///
    /// Trips the active cycle's signal, if any. Later requests have no further effect.
    pub fn stop(&self) -> bool {
        self.request(None)
    }

    /// [`stop`](Self::stop) with the origin of the request (e.g. the OS signal name).
    pub(crate) fn request(&self, origin: Option<&'static str>) -> bool {
        let active = {
            let mut state = self.lock();
            if state.requested {
                return false;
            }
            state.requested = true;
            state.active.clone()
        };

        let mut ev = Event::new(EventKind::StopRequested);
        if let Some(origin) = origin {
            ev = ev.with_reason(origin);
        }
        self.bus.publish(ev);

        let panics = active.and_then(|signal| signal.trip()).unwrap_or_default();
        for panic in panics {
            self.bus.publish(
                Event::new(EventKind::CallbackPanicked).with_reason(panic.message),
            );
        }
        true
    }

    /// True once [`stop`](Self::stop) has been called.
    pub fn is_stop_requested(&self) -> bool {
        self.lock().requested
    }

    /// Creates the signal for a new cycle and makes it the active one.
    pub(crate) fn begin_cycle(&self) -> Result<CancelSignal, CycleError> {
        let mut state = self.lock();
        if state.ended {
            return Err(CycleError::Ended);
        }
        let signal = CancelSignal::new();
        if state.requested {
            signal.cancel();
        }
        state.active = Some(signal.clone());
        Ok(signal)
    }

    /// Disposes the active cycle signal.
    pub(crate) fn end_cycle(&self) {
        let active = self.lock().active.take();
        if let Some(signal) = active {
            signal.dispose();
        }
    }

    /// Marks the session ended. Returns `true` the first time.
    pub(crate) fn end(&self) -> bool {
        let active = {
            let mut state = self.lock();
            if state.ended {
                return false;
            }
            state.ended = true;
            state.active.take()
        };
        if let Some(signal) = active {
            signal.dispose();
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, StopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("StopHandle")
            .field("requested", &state.requested)
            .field("ended", &state.ended)
            .field("active", &state.active.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> StopHandle {
        StopHandle::new(Bus::new(16))
    }

    #[test]
    fn test_stop_trips_active_signal() {
        let h = handle();
        let signal = h.begin_cycle().unwrap();
        assert!(!signal.is_cancelled());

        assert!(h.stop());
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_stop_twice_same_as_once() {
        let h = handle();
        let signal = h.begin_cycle().unwrap();
        let hits = Arc::new(Mutex::new(0));
        let c = Arc::clone(&hits);
        signal.register(move || *c.lock().unwrap() += 1).unwrap();

        assert!(h.stop());
        assert!(!h.stop());
        assert_eq!(*hits.lock().unwrap(), 1);
        assert!(h.is_stop_requested());
    }

    #[test]
    fn test_stop_is_sticky_for_later_cycles() {
        let h = handle();
        h.stop();
        let signal = h.begin_cycle().unwrap();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn test_end_cycle_disposes_signal() {
        let h = handle();
        let signal = h.begin_cycle().unwrap();
        h.end_cycle();
        assert!(signal.is_disposed());
        assert!(signal.register(|| {}).is_err());
    }

    #[test]
    fn test_no_cycles_after_end() {
        let h = handle();
        let signal = h.begin_cycle().unwrap();
        assert!(h.end());
        assert!(!h.end());
        assert!(signal.is_disposed());
        assert!(matches!(h.begin_cycle(), Err(CycleError::Ended)));
    }

    #[tokio::test]
    async fn test_panicking_callback_is_reported_and_token_trips() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let h = StopHandle::new(bus);
        let signal = h.begin_cycle().unwrap();
        signal.register(|| panic!("callback boom")).unwrap();

        assert!(h.request(Some("SIGINT")));
        assert!(signal.token().is_cancelled());

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::StopRequested);
        assert_eq!(ev.reason.as_deref(), Some("SIGINT"));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::CallbackPanicked);
        assert_eq!(ev.reason.as_deref(), Some("callback boom"));
    }

    #[tokio::test]
    async fn test_stop_publishes_event() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let h = StopHandle::new(bus);

        h.stop();
        h.stop();
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::StopRequested);
        assert!(rx.try_recv().is_err());
    }
}
