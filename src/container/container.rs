//! Shared dependency container.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::ServiceConfig;
use crate::container::registry::ServiceRegistry;
use crate::lifecycle::WorkerCounter;
use crate::messaging::MessagingModule;
use crate::observability::Logger;
use crate::storage::{Storage, StorageError};

#[derive(Default)]
struct Resources {
    storage: Option<Arc<dyn Storage>>,
    messaging: Option<Arc<MessagingModule>>,
    services: ServiceRegistry,
}

/// Process-wide shared resources.
///
/// The configuration snapshot, logger and worker counter are fixed at
/// construction. Storage, messaging and named services sit behind a
/// read/write lock: lookups share it, attachment and registration take it
/// exclusively, so a reader never sees a half-attached resource.
pub struct DependencyContainer {
    config: Arc<ServiceConfig>,
    logger: Logger,
    workers: WorkerCounter,
    resources: RwLock<Resources>,
    closed: AtomicBool,
}

impl DependencyContainer {
    pub fn new(config: ServiceConfig, logger: Logger) -> Self {
        Self {
            config: Arc::new(config),
            logger,
            workers: WorkerCounter::new(),
            resources: RwLock::new(Resources::default()),
            closed: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Resources> {
        self.resources.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Resources> {
        self.resources.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Shared handle to the snapshot, for components that outlive a borrow.
    pub fn shared_config(&self) -> Arc<ServiceConfig> {
        Arc::clone(&self.config)
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The worker-completion counter used to drain on shutdown.
    pub fn workers(&self) -> &WorkerCounter {
        &self.workers
    }

    pub fn attach_storage(&self, storage: Arc<dyn Storage>) {
        self.write().storage = Some(storage);
    }

    pub fn attach_messaging(&self, messaging: Arc<MessagingModule>) {
        self.write().messaging = Some(messaging);
    }

    pub fn storage(&self) -> Option<Arc<dyn Storage>> {
        self.read().storage.clone()
    }

    pub fn messaging(&self) -> Option<Arc<MessagingModule>> {
        self.read().messaging.clone()
    }

    /// Register `instance` under `name`. The last registration wins.
    pub fn register_service<T>(&self, name: impl Into<String>, instance: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        let name = name.into();
        let replaced = self.write().services.insert(name.clone(), instance);
        tracing::debug!(
            parent: self.logger.span(),
            service = %name,
            replaced = replaced.is_some(),
            "Service registered"
        );
    }

    /// Look up a service by name. Absent names and type mismatches are `None`.
    pub fn service<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.read().services.get_as(name)
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.read().services.contains(name)
    }

    pub fn service_count(&self) -> usize {
        self.read().services.len()
    }

    /// Release the storage resource, if attached.
    ///
    /// Only the first call does anything; later calls return `Ok(())`.
    /// Accessors keep returning the closed resource afterwards.
    pub async fn close(&self) -> Result<(), StorageError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(parent: self.logger.span(), "Container already closed");
            return Ok(());
        }

        let storage = self.write().storage.clone();
        let Some(storage) = storage else {
            return Ok(());
        };

        match storage.close().await {
            Ok(()) => {
                tracing::info!(parent: self.logger.span(), backend = storage.backend(), "Storage released");
                Ok(())
            }
            Err(e) => {
                tracing::error!(parent: self.logger.span(), error = %e, "Failed to release storage");
                Err(e)
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for DependencyContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resources = self.read();
        f.debug_struct("DependencyContainer")
            .field("service", &self.logger.service())
            .field("storage", &resources.storage.as_ref().map(|s| s.backend()))
            .field("messaging", &resources.messaging.is_some())
            .field("services", &resources.services)
            .field("closed", &self.is_closed())
            .finish()
    }
}
