//! # Session: the per-owner bridge between the affinity thread and background work.
//!
//! A [`Session`] is created on the affinity thread and owns everything one host
//! object needs: the captured [`Affinity`], the [`Sink`], the background runtime,
//! the stop hook and the event bus.
//!
//! ## Cycle
//! ```text
//! run_cycle(work)                                         (affinity thread)
//!   ├─► affinity check, begin_cycle() → fresh CancelSignal
//!   ├─► already stopped? ─► CycleStopped, return Stopped
//!   ├─► spawn work.run(ctx)                               (background)
//!   ├─► spawn watch_completion(body)                      (background)
//!   │       └─► on failure: dispatch write_error ─► close queue
//!   ├─► drain(token)   ◄── the only blocking on the affinity thread
//!   │       ├─ Closed    ─► read watcher outcome ─► Completed / Failed / Stopped
//!   │       └─ Cancelled ─► CycleStopped, return Stopped (body not awaited)
//!   └─► end_cycle(): dispose the signal
//! ```
//!
//! ## Hooks
//! - [`Session::stop`] / [`StopHandle::stop`]: external stop request, any thread.
//! - [`Session::end`]: teardown; releases the active signal, refuses new cycles.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use affinity_dispatch::{Collector, CycleContext, CycleOutcome, Session, WorkError, WorkFn};
//!
//! let sink = Arc::new(Collector::<&'static str>::new());
//! let session = Session::new(Arc::clone(&sink)).unwrap();
//!
//! let outcome = session
//!     .run_cycle(WorkFn::arc("write", |ctx: CycleContext<Collector<&'static str>>| async move {
//!         ctx.sleep(Duration::from_millis(10)).await?;
//!         ctx.emit("1").map_err(WorkError::failed)?;
//!         ctx.sleep(Duration::from_millis(10)).await?;
//!         ctx.emit("2").map_err(WorkError::failed)?;
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! assert_eq!(outcome, CycleOutcome::Completed);
//! assert_eq!(sink.items(), vec!["1", "2"]);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::executor::block_on;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::builder::SessionBuilder;
use super::config::Config;
use super::runner::{CloseOnDrop, CycleOutcome, Watch, watch_completion};
use crate::dispatch::{Affinity, Dispatcher, DrainExit};
use crate::error::CycleError;
use crate::events::{Bus, Event, EventKind};
use crate::output::Sink;
use crate::signal::StopHandle;
use crate::subscribers::SubscriberSet;
use crate::work::{CycleContext, WorkRef};

/// Bridge between one affinity thread and its background work.
pub struct Session<S: Sink> {
    cfg: Config,
    affinity: Affinity,
    sink: Arc<S>,
    bus: Bus,
    stop: StopHandle,
    cycles: AtomicU64,
    handle: Handle,
    runtime: Option<Runtime>,
    interrupt: Mutex<Option<JoinHandle<()>>>,
    closing: CancellationToken,
}

impl<S: Sink> Session<S> {
    /// Creates a session with [`Config::default`] and an owned runtime.
    ///
    /// The calling thread becomes the affinity thread. Use [`SessionBuilder`] for
    /// custom configuration, subscribers or an existing runtime.
    pub fn new(sink: Arc<S>) -> Result<Self, CycleError> {
        SessionBuilder::new(Config::default()).build(sink)
    }

    pub(crate) fn from_parts(
        cfg: Config,
        sink: Arc<S>,
        bus: Bus,
        handle: Handle,
        runtime: Option<Runtime>,
    ) -> Self {
        Self {
            cfg,
            affinity: Affinity::current(),
            stop: StopHandle::new(bus.clone()),
            sink,
            bus,
            cycles: AtomicU64::new(0),
            handle,
            runtime,
            interrupt: Mutex::new(None),
            closing: CancellationToken::new(),
        }
    }

    /// Subscribes the bus and forwards events to the subscriber set until the session ends.
    pub(crate) fn subscriber_listener(&self, set: SubscriberSet) {
        let mut rx = self.bus.subscribe();
        let closing = self.closing.clone();
        self.handle.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = closing.cancelled() => break,
                }
            }
            set.shutdown().await;
        });
    }

    /// Trips the stop hook on the first OS termination signal.
    pub(crate) fn stop_on_interrupt(&self) {
        let stop = self.stop.clone();
        let task = self.handle.spawn(async move {
            if let Ok(origin) = super::shutdown::interrupted().await {
                stop.request(Some(origin));
            }
        });
        *self.interrupt.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    /// Runs one processing cycle of `work`.
    ///
    /// Returns only after the cycle completed, failed (the failure was reported to
    /// the sink) or was stopped. Must be called on the affinity thread, outside of
    /// any async context.
    ///
    /// ### Errors
    /// - [`CycleError::WrongThread`] off the affinity thread
    /// - [`CycleError::Ended`] after [`end`](Self::end)
    /// - [`CycleError::Launch`] if the background runtime dropped the cycle
    pub fn run_cycle(&self, work: WorkRef<S>) -> Result<CycleOutcome, CycleError> {
        self.affinity.check()?;
        let signal = self.stop.begin_cycle()?;
        let _active = ActiveCycle(&self.stop);
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let name: Arc<str> = Arc::from(work.name());

        if signal.is_cancelled() {
            self.bus.publish(
                Event::new(EventKind::CycleStopped)
                    .with_cycle(cycle)
                    .with_source(name)
                    .with_reason("stop requested before launch"),
            );
            return Ok(CycleOutcome::Stopped);
        }

        let dispatcher = Dispatcher::new(self.affinity);
        let ctx = CycleContext::new(cycle, signal.clone(), dispatcher.clone(), Arc::clone(&self.sink));
        let (done, outcome) = oneshot::channel();
        let watch = Watch {
            cycle,
            work: Arc::clone(&name),
            sink: Arc::clone(&self.sink),
            error_id: self.cfg.error_id.clone(),
            error_category: self.cfg.error_category,
            bus: self.bus.clone(),
            done,
        };

        self.bus.publish(
            Event::new(EventKind::CycleStarting)
                .with_cycle(cycle)
                .with_source(Arc::clone(&name)),
        );
        let body = self.handle.spawn(async move { work.run(ctx).await });
        self.handle
            .spawn(watch_completion(body, watch, CloseOnDrop(dispatcher.clone())));

        match dispatcher.drain(&signal.token())? {
            DrainExit::Cancelled => {
                self.bus.publish(
                    Event::new(EventKind::CycleStopped)
                        .with_cycle(cycle)
                        .with_source(name),
                );
                Ok(CycleOutcome::Stopped)
            }
            DrainExit::Closed => block_on(outcome).map_err(|_| CycleError::Launch {
                reason: format!("cycle {cycle} ended without reporting an outcome"),
            }),
        }
    }

    /// External stop hook. Safe to call from any thread; idempotent.
    pub fn stop(&self) -> bool {
        self.stop.stop()
    }

    /// Cloneable stop hook for other threads.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Teardown hook: releases the active cycle signal and refuses further cycles.
    ///
    /// Idempotent. Returns `true` the first time.
    pub fn end(&self) -> bool {
        if !self.stop.end() {
            return false;
        }
        self.bus.publish(Event::new(EventKind::SessionEnded));
        self.closing.cancel();
        let interrupt = self
            .interrupt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = interrupt {
            task.abort();
        }
        true
    }

    /// The affinity thread of this session.
    pub fn affinity(&self) -> Affinity {
        self.affinity
    }

    /// The sink shared with dispatched actions.
    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Session configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Number of cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Creates a receiver for subsequent session events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}

impl<S: Sink> Drop for Session<S> {
    fn drop(&mut self) {
        self.end();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl<S: Sink> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("affinity", &self.affinity)
            .field("cycles", &self.cycles())
            .field("stop", &self.stop)
            .field("owns_runtime", &self.runtime.is_some())
            .finish()
    }
}

/// Disposes the cycle signal on every exit path of `run_cycle`.
struct ActiveCycle<'a>(&'a StopHandle);

impl Drop for ActiveCycle<'_> {
    fn drop(&mut self) {
        self.0.end_cycle();
    }
}
