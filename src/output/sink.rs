//! # Output channel contract.

use super::ErrorRecord;

/// Output channel owned by the affinity thread.
///
/// The bridge calls these methods only from dispatched actions, which run on the
/// affinity thread. Work bodies reach the sink through
/// [`CycleContext::dispatch`](crate::CycleContext::dispatch) and never directly.
///
/// The `Send + Sync` bounds exist because actions capturing the sink are created
/// on background threads; the calls themselves stay on one thread.
///
/// # Limitation
/// A host object that is itself `!Sync` (`Rc`, `RefCell`, raw UI handles) cannot
/// implement `Sink` directly. Wrap its state in a `Mutex`, or implement `Sink` on
/// a thread-safe front that forwards to the owner-thread object (e.g. a
/// `std::sync::mpsc::Sender` read by the host after `run_cycle` returns).
///
/// ```compile_fail
/// use std::cell::RefCell;
/// use affinity_dispatch::{ErrorRecord, Sink};
///
/// struct Local(RefCell<Vec<u32>>);
///
/// impl Sink for Local {
///     type Item = u32;
///     fn write_item(&self, item: u32) { self.0.borrow_mut().push(item); }
///     fn write_error(&self, _record: ErrorRecord) {}
/// }
/// ```
pub trait Sink: Send + Sync + 'static {
    /// Produced value type.
    type Item: Send + 'static;

    /// Accepts one produced value.
    fn write_item(&self, item: Self::Item);

    /// Accepts one structured error report.
    fn write_error(&self, record: ErrorRecord);
}
