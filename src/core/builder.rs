use std::sync::Arc;

use tokio::runtime::{self, Handle};

use super::{config::Config, session::Session};
use crate::{
    error::CycleError,
    events::Bus,
    output::Sink,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Session`] with optional features.
pub struct SessionBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    runtime: Option<Handle>,
    interrupt: bool,
}

impl SessionBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            runtime: None,
            interrupt: false,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive session events (cycle lifecycle, failures, stop requests)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Runs background work on an existing runtime instead of an owned one.
    ///
    /// The affinity thread must still not be one of that runtime's workers.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Trips the stop hook on the first OS termination signal (Ctrl-C, SIGTERM).
    pub fn stop_on_interrupt(mut self) -> Self {
        self.interrupt = true;
        self
    }

    /// Builds the session. The calling thread becomes its affinity thread.
    ///
    /// Initializes:
    /// - background runtime (owned unless [`with_runtime`](Self::with_runtime) was used)
    /// - event bus and subscriber workers
    /// - optional interrupt listener
    ///
    /// ### Errors
    /// [`CycleError::Runtime`] if the owned runtime cannot be started.
    pub fn build<S: Sink>(self, sink: Arc<S>) -> Result<Session<S>, CycleError> {
        let (handle, owned) = match self.runtime {
            Some(handle) => (handle, None),
            None => {
                let mut builder = runtime::Builder::new_multi_thread();
                builder.enable_all().thread_name(self.cfg.thread_name.clone());
                if let Some(n) = self.cfg.worker_threads_limit() {
                    builder.worker_threads(n);
                }
                let rt = builder.build()?;
                (rt.handle().clone(), Some(rt))
            }
        };

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let session = Session::from_parts(self.cfg, sink, bus.clone(), handle.clone(), owned);

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus, &handle);
            session.subscriber_listener(set);
        }
        if self.interrupt {
            session.stop_on_interrupt();
        }
        Ok(session)
    }
}
