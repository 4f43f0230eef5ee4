//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT and SIGTERM
//! - Translate them into `TerminationSignal` events
//! - Forward every event to the coordinator over a channel
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Exactly one dedicated listening task per process
//! - Every signal is forwarded, so the coordinator can act on a second one

use std::fmt;

use tokio::sync::mpsc;

/// A recognized termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Interrupt => f.write_str("interrupt"),
            TerminationSignal::Terminate => f.write_str("terminated"),
        }
    }
}

/// Spawn the signal listening task and return its event stream.
///
/// If handlers cannot be installed the error is logged and the stream
/// closes, leaving the coordinator to run until its listener stops.
pub fn listen() -> mpsc::Receiver<TerminationSignal> {
    let (tx, rx) = mpsc::channel(4);
    tokio::spawn(forward_signals(tx));
    rx
}

#[cfg(unix)]
async fn forward_signals(tx: mpsc::Sender<TerminationSignal>) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut interrupt, mut terminate) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(interrupt), Ok(terminate)) => (interrupt, terminate),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                return;
            }
        };

    loop {
        let received = tokio::select! {
            Some(()) = interrupt.recv() => TerminationSignal::Interrupt,
            Some(()) = terminate.recv() => TerminationSignal::Terminate,
            else => return,
        };
        tracing::debug!(signal = %received, "Signal received");
        if tx.send(received).await.is_err() {
            return;
        }
    }
}

#[cfg(not(unix))]
async fn forward_signals(tx: mpsc::Sender<TerminationSignal>) {
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }
        if tx.send(TerminationSignal::Interrupt).await.is_err() {
            return;
        }
    }
}
