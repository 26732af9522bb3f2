//! # Example: interrupt
//!
//! Runs a long counting cycle whose output is written on the main thread, and
//! stops it on Ctrl-C (or after a few seconds if no signal arrives).
//!
//! Shows how to:
//! - Build a session with the [`LogWriter`] subscriber and `stop_on_interrupt`
//! - Emit items from the background and receive them on the owner thread
//! - Deliver a final "stopped" notification through [`CycleContext::on_cancel`]
//!
//! ## Flow
//! ```text
//! main()  (affinity thread)
//!   ├─► SessionBuilder::new(cfg).stop_on_interrupt().build(sink)
//!   ├─► run_cycle(counter)
//!   │     ├─► counter: emit tick every 300ms (background)
//!   │     ├─► sink prints each tick (main thread)
//!   │     └─► Ctrl-C / timer ─► stop() ─► on_cancel "stopped" ─► Stopped
//!   └─► end()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example interrupt --features logging
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use affinity_dispatch::{
    Config, CycleContext, ErrorRecord, LogWriter, SessionBuilder, Sink, Subscribe, WorkError, WorkFn,
};

/// Prints everything it receives, tagged with the current thread name.
struct Console;

impl Sink for Console {
    type Item = String;

    fn write_item(&self, item: String) {
        let t = thread::current();
        println!("[{}] {item}", t.name().unwrap_or("?"));
    }

    fn write_error(&self, record: ErrorRecord) {
        let t = thread::current();
        eprintln!("[{}] error: {record}", t.name().unwrap_or("?"));
    }
}

fn main() -> anyhow::Result<()> {
    println!("=== interrupt example (press Ctrl-C to stop) ===\n");

    let mut cfg = Config::default();
    cfg.worker_threads = 2;
    cfg.bus_capacity = 256;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let session = SessionBuilder::new(cfg)
        .with_subscribers(subs)
        .stop_on_interrupt()
        .build(Arc::new(Console))?;

    // Fallback stop so the example ends on its own.
    let stop = session.stop_handle();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(5));
        stop.stop();
    });

    let counter = WorkFn::arc("counter", |ctx: CycleContext<Console>| async move {
        ctx.on_cancel(|sink| sink.write_item("stopped".to_string()))
            .map_err(WorkError::failed)?;

        let mut tick = 0u32;
        loop {
            ctx.sleep(Duration::from_millis(300)).await?;
            tick += 1;
            ctx.emit(format!("tick #{tick}"))
                .map_err(WorkError::failed)?;
        }
    });

    let outcome = session.run_cycle(counter)?;
    println!("\ncycle finished: {}", outcome.as_label());

    session.end();
    // Give the subscriber worker a moment to print the last events.
    thread::sleep(Duration::from_millis(100));
    Ok(())
}
