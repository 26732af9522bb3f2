//! # In-memory sink.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{ErrorRecord, Sink};

struct Collected<T> {
    items: Vec<T>,
    errors: Vec<ErrorRecord>,
}

/// [`Sink`] that stores everything it receives.
///
/// # Example
/// ```
/// use affinity_dispatch::{Collector, Sink};
///
/// let out = Collector::<&str>::new();
/// out.write_item("1");
/// out.write_item("2");
/// assert_eq!(out.items(), vec!["1", "2"]);
/// assert!(out.take_errors().is_empty());
/// ```
pub struct Collector<T> {
    inner: Mutex<Collected<T>>,
}

impl<T> Collector<T> {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Collected {
                items: Vec::new(),
                errors: Vec::new(),
            }),
        }
    }

    /// Removes and returns the collected items.
    pub fn take_items(&self) -> Vec<T> {
        std::mem::take(&mut self.lock().items)
    }

    /// Removes and returns the collected error reports.
    pub fn take_errors(&self) -> Vec<ErrorRecord> {
        std::mem::take(&mut self.lock().errors)
    }

    /// Number of error reports received so far.
    pub fn error_count(&self) -> usize {
        self.lock().errors.len()
    }

    fn lock(&self) -> MutexGuard<'_, Collected<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Collector<T> {
    /// Snapshot of the collected items.
    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }
}

impl<T> Default for Collector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Sink for Collector<T> {
    type Item = T;

    fn write_item(&self, item: T) {
        self.lock().items.push(item);
    }

    fn write_error(&self, record: ErrorRecord) {
        self.lock().errors.push(record);
    }
}

impl<T> fmt::Debug for Collector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Collector")
            .field("items", &inner.items.len())
            .field("errors", &inner.errors.len())
            .finish()
    }
}
