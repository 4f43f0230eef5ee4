//! Staged construction of the dependency container.
//!
//! # Responsibilities
//! - Wire config → logger → storage → messaging in that order
//! - Open storage and report the outcome
//! - Hand a fully attached container to the caller
//!
//! # Design Decisions
//! - Misordered or missing stages are programming errors, raised as panics
//! - A storage open failure is logged (when a logger is attached) and then
//!   raised the same way; startup never continues half-wired
//! - Storage and messaging are optional; build only attaches what was staged

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::container::DependencyContainer;
use crate::messaging::MessagingModule;
use crate::observability::Logger;
use crate::storage::{PostgresConnector, Storage, StorageConnector};

/// Fluent builder for [`DependencyContainer`].
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    config: Option<ServiceConfig>,
    logger: Option<Logger>,
    storage: Option<Arc<dyn Storage>>,
    messaging: Option<Arc<MessagingModule>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Open PostgreSQL storage from the configured storage section.
    ///
    /// # Panics
    /// If no config is set, or the database cannot be opened.
    pub async fn with_storage(self) -> Self {
        self.with_storage_from(&PostgresConnector).await
    }

    /// Open storage through `connector`.
    ///
    /// # Panics
    /// If no config is set, or the connector fails.
    pub async fn with_storage_from<C>(mut self, connector: &C) -> Self
    where
        C: StorageConnector + ?Sized,
    {
        let Some(config) = self.config.as_ref() else {
            construction_fault(self.logger.as_ref(), "config must be set before storage");
        };

        match connector.connect(&config.storage).await {
            Ok(storage) => {
                if let Some(logger) = &self.logger {
                    tracing::info!(parent: logger.span(), backend = storage.backend(), "Storage opened");
                }
                self.storage = Some(storage);
                self
            }
            Err(e) => construction_fault(
                self.logger.as_ref(),
                &format!("failed to open storage: {e}"),
            ),
        }
    }

    /// Create the messaging module from the configured messaging section.
    ///
    /// # Panics
    /// If no config is set.
    pub fn with_messaging(mut self) -> Self {
        let Some(config) = self.config.as_ref() else {
            construction_fault(self.logger.as_ref(), "config must be set before messaging");
        };
        self.messaging = Some(Arc::new(MessagingModule::new(&config.messaging)));
        self
    }

    /// Assemble the container from the stages that were invoked.
    ///
    /// # Panics
    /// If no logger is set.
    pub fn build(self) -> DependencyContainer {
        let Some(logger) = self.logger else {
            construction_fault(None, "logger must be set");
        };

        let container = DependencyContainer::new(self.config.unwrap_or_default(), logger);
        if let Some(storage) = self.storage {
            container.attach_storage(storage);
        }
        if let Some(messaging) = self.messaging {
            container.attach_messaging(messaging);
        }
        container
    }

    pub fn config(&self) -> Option<&ServiceConfig> {
        self.config.as_ref()
    }

    pub fn logger(&self) -> Option<&Logger> {
        self.logger.as_ref()
    }

    pub fn storage(&self) -> Option<&Arc<dyn Storage>> {
        self.storage.as_ref()
    }

    pub fn messaging(&self) -> Option<&Arc<MessagingModule>> {
        self.messaging.as_ref()
    }
}

fn construction_fault(logger: Option<&Logger>, message: &str) -> ! {
    if let Some(logger) = logger {
        tracing::error!(parent: logger.span(), fault = message, "Construction fault");
    }
    panic!("construction fault: {message}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::Topic;
    use crate::observability::LoggerConfig;
    use crate::storage::testing::{FakeConnector, FakeStorage};

    fn logger() -> Logger {
        Logger::new(&LoggerConfig::test("orders"))
    }

    #[tokio::test]
    async fn wires_every_stage_in_order() {
        let storage = Arc::new(FakeStorage::default());
        let connector = FakeConnector {
            storage: Some(storage.clone()),
        };

        let container = ContainerBuilder::new()
            .with_config(ServiceConfig::defaults_for("order-service"))
            .with_logger(logger())
            .with_storage_from(&connector)
            .await
            .with_messaging()
            .build();

        assert_eq!(container.storage().unwrap().backend(), "fake");
        let messaging = container.messaging().unwrap();
        assert_eq!(messaging.client_id(), "order-service");
        assert_eq!(messaging.topic(Topic::PaymentRequest), "payment-request");
        assert_eq!(container.config().network.port, 4000);
    }

    #[test]
    fn storage_and_messaging_are_optional() {
        let container = ContainerBuilder::new()
            .with_config(ServiceConfig::default())
            .with_logger(logger())
            .build();

        assert!(container.storage().is_none());
        assert!(container.messaging().is_none());
    }

    #[test]
    fn builder_exposes_staged_parts() {
        let builder = ContainerBuilder::new().with_config(ServiceConfig::default());
        assert!(builder.config().is_some());
        assert!(builder.logger().is_none());
        assert!(builder.storage().is_none());
        assert!(builder.messaging().is_none());
    }

    #[tokio::test]
    #[should_panic(expected = "config must be set before storage")]
    async fn storage_before_config_is_fatal() {
        let connector = FakeConnector {
            storage: Some(Arc::new(FakeStorage::default())),
        };
        let _ = ContainerBuilder::new()
            .with_logger(logger())
            .with_storage_from(&connector)
            .await;
    }

    #[tokio::test]
    async fn storage_open_failure_is_logged_before_the_panic() {
        use futures_util::FutureExt;
        use std::panic::AssertUnwindSafe;

        use crate::observability::testing::CapturedLogs;

        let logs = CapturedLogs::default();
        let _default = tracing::subscriber::set_default(logs.subscriber());

        let connector = FakeConnector { storage: None };
        let building = ContainerBuilder::new()
            .with_config(ServiceConfig::default())
            .with_logger(logger())
            .with_storage_from(&connector);
        let fault = AssertUnwindSafe(building).catch_unwind().await.unwrap_err();

        let message = crate::recovery::panic_message(&*fault);
        assert!(message.starts_with("construction fault: failed to open storage"));
        let output = logs.contents();
        assert!(output.contains("Construction fault"));
        assert!(output.contains("storage did not answer"));
    }

    #[tokio::test]
    #[should_panic(expected = "construction fault: failed to open storage")]
    async fn storage_open_failure_is_fatal() {
        let connector = FakeConnector { storage: None };
        let _ = ContainerBuilder::new()
            .with_config(ServiceConfig::default())
            .with_logger(logger())
            .with_storage_from(&connector)
            .await;
    }

    #[test]
    #[should_panic(expected = "config must be set before messaging")]
    fn messaging_before_config_is_fatal() {
        let _ = ContainerBuilder::new().with_messaging();
    }

    #[test]
    #[should_panic(expected = "logger must be set")]
    fn build_without_logger_is_fatal() {
        let _ = ContainerBuilder::new()
            .with_config(ServiceConfig::default())
            .build();
    }
}
