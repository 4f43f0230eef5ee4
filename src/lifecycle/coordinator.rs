//! Accept loop and drain-then-stop shutdown protocol.
//!
//! # Data Flow
//! ```text
//! run(listener, router)
//!     → spawn axum::serve (every request counted by the worker counter)
//!     → Starting → Running
//!     → first termination signal
//!     → Running → Draining: stop admission, stop accepting connections
//!     → wait for: counter reaches zero | drain deadline | second signal
//!     → container.close() (storage released once)
//!     → Draining → Stopped, ShutdownReport returned
//! ```
//!
//! # Design Decisions
//! - In-flight handlers are never cancelled; after the deadline control
//!   returns to the caller, who owns process exit
//! - A listener that stops without a shutdown request is a fault
//! - Release failures are returned, not logged and swallowed
//! - A second signal while draining abandons the drain (`Forced`)

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};

use crate::container::DependencyContainer;
use crate::http::response;
use crate::lifecycle::signals::{self, TerminationSignal};
use crate::lifecycle::state::LifecycleState;
use crate::lifecycle::workers::WorkerCounter;
use crate::observability::metrics;
use crate::storage::StorageError;

/// Time allowed for in-flight work to finish after a termination signal.
pub const DEFAULT_DRAIN_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("listener failed: {0}")]
    Listener(#[source] io::Error),

    #[error("listener stopped without a shutdown request")]
    UnexpectedStop,

    #[error("server task failed: {0}")]
    ServerTask(#[from] JoinError),

    #[error("graceful shutdown failed: {0}")]
    Shutdown(#[source] io::Error),

    #[error("failed to release resources: {0}")]
    Release(#[from] StorageError),
}

/// How the drain phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every unit of work finished before the deadline.
    Drained,
    /// The deadline elapsed with work still in flight.
    DeadlineElapsed { in_flight: usize },
    /// A second termination signal cut the drain short.
    Forced { in_flight: usize },
}

#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// The signal that started the shutdown.
    pub signal: TerminationSignal,
    pub outcome: DrainOutcome,
    /// Time from signal receipt to resources released.
    pub elapsed: Duration,
}

/// Runs one service's accept loop and its single shutdown cycle.
pub struct LifecycleCoordinator {
    container: Arc<DependencyContainer>,
    drain_deadline: Duration,
    state: watch::Sender<LifecycleState>,
}

impl LifecycleCoordinator {
    pub fn new(container: Arc<DependencyContainer>) -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        metrics::record_lifecycle_state(LifecycleState::Starting);
        Self {
            container,
            drain_deadline: DEFAULT_DRAIN_DEADLINE,
            state,
        }
    }

    pub fn with_drain_deadline(mut self, deadline: Duration) -> Self {
        self.drain_deadline = deadline;
        self
    }

    pub fn drain_deadline(&self) -> Duration {
        self.drain_deadline
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Serve `router` on `listener` until SIGINT or SIGTERM, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        router: Router,
    ) -> Result<ShutdownReport, LifecycleError> {
        let signals = signals::listen();
        self.run_with_signals(listener, router, signals).await
    }

    /// Serve `router` on `listener`, taking termination requests from `signals`.
    pub async fn run_with_signals(
        self,
        listener: TcpListener,
        router: Router,
        mut signals: mpsc::Receiver<TerminationSignal>,
    ) -> Result<ShutdownReport, LifecycleError> {
        let logger = self.container.logger().clone();
        let workers = self.container.workers().clone();
        let address = listener.local_addr().map_err(LifecycleError::Listener)?;

        let app = router.layer(middleware::from_fn_with_state(workers.clone(), track_work));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut server: JoinHandle<io::Result<()>> = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .await
        });

        self.transition(LifecycleState::Running);
        tracing::info!(
            parent: logger.span(),
            address = %address,
            env = %self.container.config().network.env,
            "Starting server"
        );

        let signal = tokio::select! {
            joined = &mut server => {
                let err = match joined {
                    Ok(Ok(())) => LifecycleError::UnexpectedStop,
                    Ok(Err(e)) => LifecycleError::Listener(e),
                    Err(e) => LifecycleError::ServerTask(e),
                };
                tracing::error!(parent: logger.span(), error = %err, "Server stopped unexpectedly");
                workers.stop_admitting();
                if let Err(release) = self.container.close().await {
                    tracing::warn!(parent: logger.span(), error = %release, "Release failed after unexpected stop");
                }
                self.transition(LifecycleState::Stopped);
                return Err(err);
            }
            signal = next_signal(&mut signals) => signal,
        };

        let started = Instant::now();
        workers.stop_admitting();
        let _ = stop_tx.send(());
        self.transition(LifecycleState::Draining);
        tracing::info!(
            parent: logger.span(),
            signal = %signal,
            in_flight = workers.in_flight(),
            deadline_secs = self.drain_deadline.as_secs_f64(),
            "Shutting down server"
        );

        let drained = tokio::select! {
            result = drain(&workers, &mut server) => result.map(|()| DrainOutcome::Drained),
            () = tokio::time::sleep(self.drain_deadline) => {
                let in_flight = workers.in_flight();
                tracing::warn!(parent: logger.span(), in_flight, "Drain deadline elapsed");
                Ok(DrainOutcome::DeadlineElapsed { in_flight })
            }
            Some(second) = signals.recv() => {
                let in_flight = workers.in_flight();
                tracing::warn!(parent: logger.span(), signal = %second, in_flight, "Second signal, forcing stop");
                Ok(DrainOutcome::Forced { in_flight })
            }
        };

        let released = self.container.close().await;
        self.transition(LifecycleState::Stopped);

        let outcome = drained?;
        released?;

        let report = ShutdownReport {
            signal,
            outcome,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            parent: logger.span(),
            address = %address,
            outcome = ?report.outcome,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Stopped server"
        );
        Ok(report)
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        debug_assert!(
            previous.can_transition_to(next),
            "illegal lifecycle transition {previous} -> {next}"
        );
        metrics::record_lifecycle_state(next);
        tracing::debug!(
            parent: self.container.logger().span(),
            from = %previous,
            to = %next,
            "Lifecycle transition"
        );
    }
}

/// Next termination signal. A closed stream never yields, so the server keeps
/// running until its listener stops.
async fn next_signal(signals: &mut mpsc::Receiver<TerminationSignal>) -> TerminationSignal {
    match signals.recv().await {
        Some(signal) => signal,
        None => std::future::pending().await,
    }
}

async fn drain(
    workers: &WorkerCounter,
    server: &mut JoinHandle<io::Result<()>>,
) -> Result<(), LifecycleError> {
    workers.wait_idle().await;
    match server.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(LifecycleError::Shutdown(e)),
        Err(e) => Err(LifecycleError::ServerTask(e)),
    }
}

/// Count every request as a unit of work; refuse it once draining.
async fn track_work(State(workers): State<WorkerCounter>, request: Request, next: Next) -> Response {
    let Some(_guard) = workers.try_begin() else {
        tracing::debug!(path = %request.uri().path(), "Request refused while draining");
        return response::service_unavailable();
    };

    let method = request.method().to_string();
    let start = Instant::now();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
