//! # Work abstraction.
//!
//! A [`Work`] body runs on the background runtime once per cycle. It receives a
//! [`CycleContext`] and performs every user-visible side effect through
//! [`CycleContext::dispatch`], never by touching affinity-owned state directly.
//!
//! A body should watch its token and return `Err(WorkError::Canceled)` promptly
//! once it fires. Nothing preempts it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WorkError;
use crate::output::Sink;
use crate::work::CycleContext;

/// # Asynchronous, cancelable work body.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use affinity_dispatch::{Collector, CycleContext, Work, WorkError};
///
/// struct Count(u32);
///
/// #[async_trait]
/// impl Work<Collector<u32>> for Count {
///     fn name(&self) -> &str { "count" }
///
///     async fn run(&self, ctx: CycleContext<Collector<u32>>) -> Result<(), WorkError> {
///         for i in 0..self.0 {
///             if ctx.is_cancelled() {
///                 return Err(WorkError::Canceled);
///             }
///             ctx.emit(i).map_err(WorkError::failed)?;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Work<S: Sink>: Send + Sync + 'static {
    /// Returns a stable, human-readable name.
    fn name(&self) -> &str;

    /// Executes the body until completion, failure or cancellation.
    async fn run(&self, ctx: CycleContext<S>) -> Result<(), WorkError>;
}

/// Shared handle to a work body.
pub type WorkRef<S> = Arc<dyn Work<S>>;
