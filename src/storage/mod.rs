//! Persistent storage handle.
//!
//! # Data Flow
//! ```text
//! StorageConfig
//!     → StorageConnector::connect (open pool, ping once)
//!     → Arc<dyn Storage> attached to the container by the builder
//!     → shared by every worker
//!     → Storage::close (once, by the lifecycle coordinator)
//! ```
//!
//! # Design Decisions
//! - The connector is a trait so wiring can be exercised without a database
//! - Opening is fallible and reported; the builder turns failure into a
//!   construction fault
//! - Releasing is fallible and the error reaches the shutdown caller

pub mod postgres;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::StorageConfig;

pub use postgres::{PostgresConnector, PostgresStorage};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open storage: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("storage did not answer within {0:?}")]
    Timeout(Duration),

    #[error("storage ping failed: {0}")]
    Ping(#[source] sqlx::Error),

    #[error("failed to release {backend} storage: {reason}")]
    Release { backend: &'static str, reason: String },
}

/// An open storage resource.
#[async_trait]
pub trait Storage: Send + Sync + fmt::Debug {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StorageError>;

    /// Release the resource. Called at most once, during shutdown.
    async fn close(&self) -> Result<(), StorageError>;
}

/// Opens a [`Storage`] from configuration.
#[async_trait]
pub trait StorageConnector: Send + Sync {
    async fn connect(&self, config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError>;
}
