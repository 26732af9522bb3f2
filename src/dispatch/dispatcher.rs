//! # Dispatcher: closable FIFO drained on the affinity thread.
//!
//! [`Dispatcher`] accepts actions from any thread and executes them only on the
//! [`Affinity`] thread, one at a time, in arrival order.
//!
//! ## Rules
//! - `dispatch` on the affinity thread runs the action **immediately** (fast path);
//!   it is not ordered against actions still waiting in the queue.
//! - `dispatch` from any other thread enqueues and returns without waiting.
//! - `drain` is affinity-only and is the only place the affinity thread blocks.
//! - `close` happens once; after it, off-thread `dispatch` fails with
//!   [`DispatchError::Closed`] and `drain` returns once the queue is empty.
//! - When the drain token fires, the queue is closed on both ends: actions already
//!   queued are executed, later off-thread `dispatch` calls fail with
//!   [`DispatchError::Closed`], then `drain` returns [`DrainExit::Cancelled`].
//!
//! The queue is a `tokio::sync::mpsc` unbounded channel. The single sender lives
//! behind a mutex so that `close` can drop it from the completion watcher while the
//! affinity thread owns the receiver.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use futures::executor::block_on;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::Affinity;
use crate::error::DispatchError;

/// A zero-argument action executed on the affinity thread.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Why [`Dispatcher::drain`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainExit {
    /// The queue was closed and every queued action has run.
    Closed,
    /// The drain token fired.
    Cancelled,
}

enum Next {
    Run(Action),
    Closed,
    Cancelled,
}

struct Inner {
    affinity: Affinity,
    tx: Mutex<Option<mpsc::UnboundedSender<Action>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Action>>,
}

/// Multi-producer, affinity-consumer action queue.
///
/// Cheap to clone; clones share one queue.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Creates an open queue bound to `affinity`.
    pub fn new(affinity: Affinity) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                affinity,
                tx: Mutex::new(Some(tx)),
                rx: Mutex::new(rx),
            }),
        }
    }

    /// The affinity thread this queue drains on.
    #[inline]
    pub fn affinity(&self) -> Affinity {
        self.inner.affinity
    }

    /// Runs `action` on the affinity thread.
    ///
    /// Executes synchronously when called on the affinity thread, otherwise enqueues.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    /// use affinity_dispatch::{Affinity, Dispatcher};
    ///
    /// let dispatcher = Dispatcher::new(Affinity::current());
    /// let ran = Arc::new(AtomicBool::new(false));
    /// let flag = Arc::clone(&ran);
    ///
    /// dispatcher.dispatch(move || flag.store(true, Ordering::SeqCst)).unwrap();
    /// assert!(ran.load(Ordering::SeqCst));
    /// ```
    pub fn dispatch<F>(&self, action: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.affinity.is_current() {
            action();
            return Ok(());
        }
        self.enqueue(Box::new(action))
    }

    /// Same as [`dispatch`](Self::dispatch) for an already boxed, possibly absent action.
    ///
    /// `None` is a no-op.
    pub fn dispatch_boxed(&self, action: Option<Action>) -> Result<(), DispatchError> {
        match action {
            Some(action) if self.inner.affinity.is_current() => {
                action();
                Ok(())
            }
            Some(action) => self.enqueue(action),
            None => Ok(()),
        }
    }

    fn enqueue(&self, action: Action) -> Result<(), DispatchError> {
        let tx = self.inner.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match tx.as_ref() {
            Some(tx) => tx.send(action).map_err(|_| DispatchError::Closed),
            None => Err(DispatchError::Closed),
        }
    }

    /// Marks the queue closed.
    ///
    /// Returns `true` for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.inner
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    /// True once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Executes queued actions on the affinity thread until the queue is closed and
    /// empty, or until `token` fires.
    ///
    /// Cancellation is a clean exit, not an error. It closes the queue: nothing
    /// dispatched afterwards is accepted.
    ///
    /// ### Errors
    /// - [`DispatchError::WrongThread`] off the affinity thread
    /// - [`DispatchError::AlreadyDraining`] when called from an action being drained
    pub fn drain(&self, token: &CancellationToken) -> Result<DrainExit, DispatchError> {
        self.inner.affinity.check()?;

        let mut rx = match self.inner.rx.try_lock() {
            Ok(rx) => rx,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(DispatchError::AlreadyDraining),
        };

        loop {
            let next = block_on(async {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Next::Cancelled,
                    action = rx.recv() => match action {
                        Some(action) => Next::Run(action),
                        None => Next::Closed,
                    },
                }
            });

            match next {
                Next::Run(action) => action(),
                Next::Closed => return Ok(DrainExit::Closed),
                Next::Cancelled => {
                    rx.close();
                    self.close();
                    while let Ok(action) = rx.try_recv() {
                        action();
                    }
                    return Ok(DrainExit::Cancelled);
                }
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("affinity", &self.inner.affinity)
            .field("closed", &self.is_closed())
            .finish()
    }
}
