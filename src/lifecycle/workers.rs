//! Worker-completion counter.
//!
//! # Responsibilities
//! - Count units of work in flight (requests and background jobs)
//! - Refuse new work once draining starts
//! - Let the coordinator wait until the count reaches zero
//!
//! # Design Decisions
//! - Count and admission flag live in one watch channel, so admission and
//!   increment are a single atomic step
//! - Waiting is notification-driven; nothing polls
//! - The guard decrements on drop, including while unwinding from a panic

use std::sync::Arc;

use tokio::sync::watch;

use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WorkerState {
    in_flight: usize,
    admitting: bool,
}

/// Shared count of in-flight units of work.
#[derive(Debug, Clone)]
pub struct WorkerCounter {
    state: Arc<watch::Sender<WorkerState>>,
}

impl WorkerCounter {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(WorkerState {
            in_flight: 0,
            admitting: true,
        });
        Self { state: Arc::new(tx) }
    }

    /// Begin a unit of work. Returns `None` once admission has stopped.
    pub fn try_begin(&self) -> Option<WorkerGuard> {
        let mut admitted = false;
        self.state.send_if_modified(|state| {
            if !state.admitting {
                return false;
            }
            state.in_flight += 1;
            admitted = true;
            true
        });

        if !admitted {
            return None;
        }
        metrics::set_in_flight(self.in_flight());
        Some(WorkerGuard {
            state: Arc::clone(&self.state),
        })
    }

    /// Current number of units of work in flight.
    pub fn in_flight(&self) -> usize {
        self.state.borrow().in_flight
    }

    pub fn is_admitting(&self) -> bool {
        self.state.borrow().admitting
    }

    /// Stop admitting new work. Work already begun is unaffected.
    pub fn stop_admitting(&self) {
        self.state.send_modify(|state| state.admitting = false);
    }

    /// Wait until no work is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot observe a close.
        let _ = rx.wait_for(|state| state.in_flight == 0).await;
    }
}

impl Default for WorkerCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks one unit of work in flight. Decrements the count when dropped.
#[derive(Debug)]
pub struct WorkerGuard {
    state: Arc<watch::Sender<WorkerState>>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let mut remaining = 0;
        self.state.send_modify(|state| {
            state.in_flight -= 1;
            remaining = state.in_flight;
        });
        metrics::set_in_flight(remaining);
        tracing::trace!(remaining, "Unit of work finished");
    }
}
