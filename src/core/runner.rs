//! # Completion watcher of one cycle.
//!
//! The work body is spawned on the background runtime; a second task awaits its
//! join handle, translates the termination into a [`CycleOutcome`], dispatches at
//! most one error report to the sink and then closes the cycle's queue.
//!
//! ## Flow
//! ```text
//! Completed:
//!   body → Ok(())              → publish WorkCompleted → close
//!
//! Cancellation:
//!   body → Err(Canceled)       → publish WorkCanceled  → close
//!   join → aborted             → publish WorkCanceled  → close
//!
//! Failure:
//!   body → Err(Failed(cause))  → dispatch write_error(cause) → publish WorkFailed → close
//!   join → panic(payload)      → dispatch write_error(PanicError) → publish WorkFailed → close
//! ```
//!
//! ## Rules
//! - The error report is the **last** action queued for the cycle.
//! - The queue is closed exactly once, even if the watcher never runs
//!   (its future is dropped by a runtime shutdown).
//! - The cause in the report is the original error, not the join wrapper.

use std::borrow::Cow;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};

use crate::dispatch::Dispatcher;
use crate::error::{BoxError, PanicError, WorkError};
use crate::events::{Bus, Event, EventKind};
use crate::output::{ErrorCategory, ErrorRecord, Sink};

/// How a cycle ended, as seen by the caller of
/// [`Session::run_cycle`](crate::Session::run_cycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Work completed; every dispatched action has run.
    Completed,
    /// Work failed; exactly one error report was dispatched to the sink.
    Failed,
    /// A stop was requested, or the work stopped cooperatively.
    Stopped,
}

impl CycleOutcome {
    /// True for [`CycleOutcome::Stopped`].
    pub fn is_stopped(&self) -> bool {
        matches!(self, CycleOutcome::Stopped)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CycleOutcome::Completed => "cycle_completed",
            CycleOutcome::Failed => "cycle_failed",
            CycleOutcome::Stopped => "cycle_stopped",
        }
    }
}

/// Terminal state of a work body.
pub(crate) enum WorkOutcome {
    Completed,
    Failed(BoxError),
    Canceled,
}

impl WorkOutcome {
    pub(crate) fn from_join(res: Result<Result<(), WorkError>, JoinError>) -> Self {
        match res {
            Ok(Ok(())) => WorkOutcome::Completed,
            Ok(Err(WorkError::Canceled)) => WorkOutcome::Canceled,
            Ok(Err(WorkError::Failed(cause))) => WorkOutcome::Failed(cause),
            Err(join) if join.is_panic() => {
                WorkOutcome::Failed(Box::new(PanicError::from_payload(join.into_panic())))
            }
            Err(_cancelled) => WorkOutcome::Canceled,
        }
    }
}

/// Closes the queue when dropped.
pub(crate) struct CloseOnDrop(pub(crate) Dispatcher);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Everything the watcher needs besides the join handle.
pub(crate) struct Watch<S: Sink> {
    pub(crate) cycle: u64,
    pub(crate) work: Arc<str>,
    pub(crate) sink: Arc<S>,
    pub(crate) error_id: Cow<'static, str>,
    pub(crate) error_category: ErrorCategory,
    pub(crate) bus: Bus,
    pub(crate) done: oneshot::Sender<CycleOutcome>,
}

/// Awaits the body, reports its outcome and closes the queue.
pub(crate) async fn watch_completion<S: Sink>(
    body: JoinHandle<Result<(), WorkError>>,
    watch: Watch<S>,
    queue: CloseOnDrop,
) {
    let outcome = match WorkOutcome::from_join(body.await) {
        WorkOutcome::Completed => {
            publish(&watch, EventKind::WorkCompleted, None);
            CycleOutcome::Completed
        }
        WorkOutcome::Canceled => {
            publish(&watch, EventKind::WorkCanceled, None);
            CycleOutcome::Stopped
        }
        WorkOutcome::Failed(cause) => {
            let message = cause.to_string();
            let record = ErrorRecord::new(cause, watch.error_id.clone(), watch.error_category);
            let sink = Arc::clone(&watch.sink);
            let reason = match queue.0.dispatch(move || sink.write_error(record)) {
                Ok(()) => message,
                Err(e) => format!("{message} (report not queued: {e})"),
            };
            publish(&watch, EventKind::WorkFailed, Some(reason));
            CycleOutcome::Failed
        }
    };

    let _ = watch.done.send(outcome);
    drop(queue);
}

fn publish<S: Sink>(watch: &Watch<S>, kind: EventKind, reason: Option<String>) {
    let mut ev = Event::new(kind)
        .with_cycle(watch.cycle)
        .with_source(Arc::clone(&watch.work));
    if let Some(reason) = reason {
        ev = ev.with_reason(reason);
    }
    watch.bus.publish(ev);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Affinity, DrainExit};
    use crate::output::Collector;
    use tokio_util::sync::CancellationToken;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn make_watch(
        sink: &Arc<Collector<u32>>,
    ) -> (Watch<Collector<u32>>, oneshot::Receiver<CycleOutcome>) {
        let (done, rx) = oneshot::channel();
        let watch = Watch {
            cycle: 1,
            work: Arc::from("test"),
            sink: Arc::clone(sink),
            error_id: Cow::Borrowed("work-failed"),
            error_category: ErrorCategory::OperationStopped,
            bus: Bus::new(16),
            done,
        };
        (watch, rx)
    }

    #[test]
    fn test_classify_join_results() {
        assert!(matches!(
            WorkOutcome::from_join(Ok(Ok(()))),
            WorkOutcome::Completed
        ));
        assert!(matches!(
            WorkOutcome::from_join(Ok(Err(WorkError::Canceled))),
            WorkOutcome::Canceled
        ));
        assert!(matches!(
            WorkOutcome::from_join(Ok(Err(WorkError::failed("x")))),
            WorkOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_failure_is_reported_once_then_closed() {
        let rt = runtime();
        let sink = Arc::new(Collector::new());
        let dispatcher = Dispatcher::new(Affinity::current());
        let (watch, rx) = make_watch(&sink);

        let body = rt.spawn(async {
            Err::<(), _>(WorkError::failed(std::io::Error::other("fail")))
        });
        rt.spawn(watch_completion(body, watch, CloseOnDrop(dispatcher.clone())));

        let exit = dispatcher.drain(&CancellationToken::new()).unwrap();
        assert_eq!(exit, DrainExit::Closed);
        assert_eq!(futures::executor::block_on(rx).unwrap(), CycleOutcome::Failed);

        let errors = sink.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "fail");
        assert_eq!(errors[0].error_id(), "work-failed");
        assert!(errors[0].cause().downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn test_panic_is_reported_as_failure() {
        let rt = runtime();
        let sink = Arc::new(Collector::new());
        let dispatcher = Dispatcher::new(Affinity::current());
        let (watch, rx) = make_watch(&sink);

        let body = rt.spawn(async {
            if true {
                panic!("body exploded");
            }
            Ok::<(), WorkError>(())
        });
        rt.spawn(watch_completion(body, watch, CloseOnDrop(dispatcher.clone())));

        dispatcher.drain(&CancellationToken::new()).unwrap();
        assert_eq!(futures::executor::block_on(rx).unwrap(), CycleOutcome::Failed);

        let errors = sink.take_errors();
        assert_eq!(errors.len(), 1);
        let panic = errors[0].cause().downcast_ref::<PanicError>().unwrap();
        assert_eq!(panic.message, "body exploded");
    }

    #[test]
    fn test_report_queued_before_stop_is_still_delivered() {
        let rt = runtime();
        let sink = Arc::new(Collector::new());
        let dispatcher = Dispatcher::new(Affinity::current());
        let (watch, rx) = make_watch(&sink);

        let body = rt.spawn(async { Err::<(), _>(WorkError::failed("fail")) });
        rt.spawn(watch_completion(body, watch, CloseOnDrop(dispatcher.clone())));
        // The outcome is sent after the report was queued.
        assert_eq!(futures::executor::block_on(rx).unwrap(), CycleOutcome::Failed);

        let token = CancellationToken::new();
        token.cancel();
        dispatcher.drain(&token).unwrap();
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn test_failure_after_stop_is_not_reported() {
        let rt = runtime();
        let sink = Arc::new(Collector::new());
        let dispatcher = Dispatcher::new(Affinity::current());
        let (watch, rx) = make_watch(&sink);
        let mut events = watch.bus.subscribe();

        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(dispatcher.drain(&token).unwrap(), DrainExit::Cancelled);

        let body = rt.spawn(async { Err::<(), _>(WorkError::failed("late")) });
        rt.spawn(watch_completion(body, watch, CloseOnDrop(dispatcher.clone())));
        assert_eq!(futures::executor::block_on(rx).unwrap(), CycleOutcome::Failed);

        assert_eq!(sink.error_count(), 0);
        let ev = events.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::WorkFailed);
        assert!(ev.reason.as_deref().unwrap().contains("report not queued"));
    }

    #[test]
    fn test_canceled_body_reports_nothing() {
        let rt = runtime();
        let sink = Arc::new(Collector::new());
        let dispatcher = Dispatcher::new(Affinity::current());
        let (watch, rx) = make_watch(&sink);

        let body = rt.spawn(async { Err::<(), _>(WorkError::Canceled) });
        rt.spawn(watch_completion(body, watch, CloseOnDrop(dispatcher.clone())));

        dispatcher.drain(&CancellationToken::new()).unwrap();
        assert_eq!(futures::executor::block_on(rx).unwrap(), CycleOutcome::Stopped);
        assert_eq!(sink.error_count(), 0);
    }

    #[test]
    fn test_dropped_watcher_still_closes_queue() {
        let dispatcher = Dispatcher::new(Affinity::current());
        {
            let rt = runtime();
            let sink = Arc::new(Collector::new());
            let (watch, _rx) = make_watch(&sink);
            let body = rt.spawn(std::future::pending::<Result<(), WorkError>>());
            let fut = watch_completion(body, watch, CloseOnDrop(dispatcher.clone()));
            drop(fut);
            rt.shutdown_background();
        }
        assert!(dispatcher.is_closed());
        assert_eq!(
            dispatcher.drain(&CancellationToken::new()).unwrap(),
            DrainExit::Closed
        );
    }
}
