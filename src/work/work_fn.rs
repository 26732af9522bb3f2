//! # Function-backed work (`WorkFn`)
//!
//! [`WorkFn`] wraps a closure `F: Fn(CycleContext<S>) -> Fut`, producing a fresh
//! future per cycle. No state is shared between cycles unless the closure captures
//! an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use affinity_dispatch::{Collector, CycleContext, WorkError, WorkFn, WorkRef};
//!
//! let w: WorkRef<Collector<&'static str>> =
//!     WorkFn::arc("hello", |ctx: CycleContext<Collector<&'static str>>| async move {
//!         ctx.emit("hello").map_err(WorkError::failed)?;
//!         Ok(())
//!     });
//!
//! assert_eq!(w.name(), "hello");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WorkError;
use crate::output::Sink;
use crate::work::{CycleContext, Work};

/// Function-backed work body.
#[derive(Debug)]
pub struct WorkFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> WorkFn<F> {
    /// Creates a new function-backed work body.
    ///
    /// Prefer [`WorkFn::arc`] when you immediately need a [`WorkRef`](crate::WorkRef).
    pub fn new<S, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        S: Sink,
        F: Fn(CycleContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), WorkError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the body and returns it as a shared handle.
    pub fn arc<S, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        S: Sink,
        F: Fn(CycleContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), WorkError>> + Send + 'static,
    {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<S, F, Fut> Work<S> for WorkFn<F>
where
    S: Sink,
    F: Fn(CycleContext<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CycleContext<S>) -> Result<(), WorkError> {
        (self.f)(ctx).await
    }
}
