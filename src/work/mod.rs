//! # Work bodies and their per-cycle context.
//!
//! This module provides:
//! - [`Work`] - trait for async, cancelable work bodies
//! - [`WorkFn`] - closure-backed work body
//! - [`WorkRef`] - shared reference to a work body (`Arc<dyn Work<S>>`)
//! - [`CycleContext`] - what a work body receives: token, dispatch, cancel callbacks

mod context;
mod work;
mod work_fn;

pub use context::CycleContext;
pub use work::{Work, WorkRef};
pub use work_fn::WorkFn;
