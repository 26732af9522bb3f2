//! # Interrupt source for the stop hook.
//!
//! [`interrupted`] resolves with the name of the first termination signal the
//! process receives. [`SessionBuilder::stop_on_interrupt`](crate::SessionBuilder::stop_on_interrupt)
//! runs it on the background runtime and forwards the name as the origin of the
//! stop request (`StopRequested.reason`).
//!
//! | Platform | Signals                          |
//! |----------|----------------------------------|
//! | unix     | `SIGINT`, `SIGTERM`, `SIGQUIT`   |
//! | other    | `ctrl-c`                         |

use std::io;

/// Waits for the first termination signal and returns its name.
///
/// Fails only if a listener cannot be registered.
#[cfg(unix)]
pub(crate) async fn interrupted() -> io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut int = signal(SignalKind::interrupt())?;
    let mut term = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = int.recv() => "SIGINT",
        _ = term.recv() => "SIGTERM",
        _ = quit.recv() => "SIGQUIT",
    };
    Ok(name)
}

#[cfg(not(unix))]
pub(crate) async fn interrupted() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
