//! Fault recovery boundaries.
//!
//! # Data Flow
//! ```text
//! HTTP request → http::layer() → handler
//!     panic → logged, counted → 500 JSON, Connection: close
//!
//! spawn_background(container, name, work)
//!     → worker counter guard → guard(work)
//!     panic → logged, counted → task ends, process continues
//! ```
//!
//! # Design Decisions
//! - A boundary is not a retry; the failed unit of work is reported and dropped
//! - Background work holds a worker guard so shutdown waits for it

pub mod http;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::container::DependencyContainer;
use crate::observability::metrics;

/// A panic caught at a recovery boundary.
#[derive(Debug, Clone, Error)]
#[error("unit of work panicked: {message}")]
pub struct RecoveredFault {
    pub message: String,
}

/// Run `work`, converting a panic into a [`RecoveredFault`].
pub async fn guard<F, T>(work: F) -> Result<T, RecoveredFault>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(work)
        .catch_unwind()
        .await
        .map_err(|payload| RecoveredFault {
            message: panic_message(payload.as_ref()),
        })
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Spawn tracked background work under the recovery boundary.
///
/// Returns `None` when the service is draining and no longer admits work.
pub fn spawn_background<F>(
    container: &DependencyContainer,
    name: &'static str,
    work: F,
) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let logger = container.logger().clone();
    let Some(worker) = container.workers().try_begin() else {
        tracing::warn!(parent: logger.span(), task = name, "Background work refused while draining");
        return None;
    };

    Some(tokio::spawn(async move {
        let _worker = worker;
        if let Err(fault) = guard(work).await {
            metrics::record_recovered_fault("background");
            tracing::error!(
                parent: logger.span(),
                task = name,
                error = %fault.message,
                "Background task panicked"
            );
        }
    }))
}
