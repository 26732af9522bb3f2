//! # LogWriter - simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [cycle-starting] cycle=1
//! [work-failed] cycle=1 err="fail"
//! [stop-requested]
//! [work-canceled] cycle=2
//! [cycle-stopped] cycle=2 reason=None
//! [session-ended]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let cycle = e.cycle.unwrap_or_default();
        match e.kind {
            EventKind::CycleStarting => println!("[cycle-starting] cycle={cycle}"),
            EventKind::WorkCompleted => println!("[work-completed] cycle={cycle}"),
            EventKind::WorkFailed => {
                println!(
                    "[work-failed] cycle={cycle} err={:?}",
                    e.reason.as_deref().unwrap_or("unknown")
                );
            }
            EventKind::WorkCanceled => println!("[work-canceled] cycle={cycle}"),
            EventKind::CycleStopped => {
                println!("[cycle-stopped] cycle={cycle} reason={:?}", e.reason);
            }
            EventKind::StopRequested => match e.reason.as_deref() {
                Some(origin) => println!("[stop-requested] origin={origin}"),
                None => println!("[stop-requested]"),
            },
            EventKind::CallbackPanicked => {
                println!(
                    "[callback-panicked] info={}",
                    e.reason.as_deref().unwrap_or("unknown")
                );
            }
            EventKind::SessionEnded => println!("[session-ended]"),
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={:?} reason={:?}",
                    e.source, e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={} info={}",
                    e.source.as_deref().unwrap_or("unknown"),
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
