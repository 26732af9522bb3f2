//! # Per-cycle context handed to a work body.
//!
//! [`CycleContext`] bundles everything a body may touch:
//! - the cycle's cancellation token (poll, await, or race against sleeps)
//! - [`dispatch`](CycleContext::dispatch) / [`emit`](CycleContext::emit) to reach the sink on the affinity thread
//! - [`on_cancel`](CycleContext::on_cancel) to dispatch a final notification when a stop arrives
//!
//! ```text
//! background:  ctx.emit(v) ──► Dispatcher ──► [queue] ──► affinity: sink.write_item(v)
//! stop hook:   signal.cancel() ──► on_cancel callbacks ──► dispatch ──► token trips
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::dispatch::Dispatcher;
use crate::error::{DispatchError, SignalError, WorkError};
use crate::output::Sink;
use crate::signal::CancelSignal;

/// Context of one processing cycle.
///
/// Cheap to clone; clones refer to the same cycle.
pub struct CycleContext<S: Sink> {
    cycle: u64,
    signal: CancelSignal,
    dispatcher: Dispatcher,
    sink: Arc<S>,
}

impl<S: Sink> CycleContext<S> {
    pub(crate) fn new(cycle: u64, signal: CancelSignal, dispatcher: Dispatcher, sink: Arc<S>) -> Self {
        Self {
            cycle,
            signal,
            dispatcher,
            sink,
        }
    }

    /// Cycle number (1-based, per session).
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The cycle's cancellation token.
    #[inline]
    pub fn token(&self) -> CancellationToken {
        self.signal.token()
    }

    /// True once a stop was requested for this cycle.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.signal.is_cancelled()
    }

    /// Completes when a stop is requested for this cycle.
    pub async fn cancelled(&self) {
        let token = self.signal.token();
        token.cancelled().await;
    }

    /// Sleeps for `duration`, or returns [`WorkError::Canceled`] as soon as the cycle is stopped.
    pub async fn sleep(&self, duration: Duration) -> Result<(), WorkError> {
        let token = self.signal.token();
        tokio::select! {
            _ = token.cancelled() => Err(WorkError::Canceled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Runs `action` with the sink on the affinity thread.
    pub fn dispatch<F>(&self, action: F) -> Result<(), DispatchError>
    where
        F: FnOnce(&S) + Send + 'static,
    {
        let sink = Arc::clone(&self.sink);
        self.dispatcher.dispatch(move || action(&sink))
    }

    /// Dispatches `write_item(item)`.
    pub fn emit(&self, item: S::Item) -> Result<(), DispatchError> {
        self.dispatch(move |sink| sink.write_item(item))
    }

    /// Dispatches `action` when the cycle is stopped.
    ///
    /// The action is queued before the token trips, so it is delivered before the
    /// cycle returns. Registering after the cycle ended is [`SignalError::Disposed`].
    pub fn on_cancel<F>(&self, action: F) -> Result<(), SignalError>
    where
        F: FnOnce(&S) + Send + 'static,
    {
        let ctx = self.clone();
        self.signal.register(move || {
            // The queue may already be closed if the body finished first.
            let _ = ctx.dispatch(action);
        })
    }

    /// The cycle's dispatcher, for zero-argument actions.
    #[inline]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The cycle's signal, for raw cancellation callbacks.
    #[inline]
    pub fn signal(&self) -> &CancelSignal {
        &self.signal
    }
}

impl<S: Sink> Clone for CycleContext<S> {
    fn clone(&self) -> Self {
        Self {
            cycle: self.cycle,
            signal: self.signal.clone(),
            dispatcher: self.dispatcher.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S: Sink> fmt::Debug for CycleContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CycleContext")
            .field("cycle", &self.cycle)
            .field("signal", &self.signal)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Affinity;
    use crate::output::Collector;
    use std::thread;

    fn ctx() -> CycleContext<Collector<&'static str>> {
        CycleContext::new(
            1,
            CancelSignal::new(),
            Dispatcher::new(Affinity::current()),
            Arc::new(Collector::new()),
        )
    }

    #[test]
    fn test_emit_on_affinity_thread_is_immediate() {
        let ctx = ctx();
        ctx.emit("now").unwrap();
        assert_eq!(ctx.sink.items(), vec!["now"]);
    }

    #[test]
    fn test_emit_off_thread_is_queued() {
        let ctx = ctx();
        let remote = ctx.clone();
        thread::spawn(move || remote.emit("later").unwrap())
            .join()
            .unwrap();
        assert!(ctx.sink.items().is_empty());

        ctx.dispatcher().close();
        ctx.dispatcher().drain(&ctx.token()).unwrap();
        assert_eq!(ctx.sink.items(), vec!["later"]);
    }

    #[test]
    fn test_on_cancel_dispatches_notification() {
        let ctx = ctx();
        ctx.on_cancel(|sink| sink.write_item("stopped")).unwrap();
        assert!(ctx.sink.items().is_empty());

        ctx.signal().cancel();
        assert_eq!(ctx.sink.items(), vec!["stopped"]);
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_on_cancel_after_dispose_fails() {
        let ctx = ctx();
        ctx.signal().dispose();
        assert_eq!(ctx.on_cancel(|_| {}), Err(SignalError::Disposed));
    }

    #[tokio::test]
    async fn test_sleep_returns_canceled_on_stop() {
        let ctx = ctx();
        let signal = ctx.signal().clone();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            signal.cancel();
        });

        let res = ctx.sleep(Duration::from_secs(10)).await;
        stopper.await.unwrap();
        assert!(matches!(res, Err(WorkError::Canceled)));
    }

    #[tokio::test]
    async fn test_sleep_completes_without_stop() {
        let ctx = ctx();
        assert!(ctx.sleep(Duration::from_millis(1)).await.is_ok());
    }
}
