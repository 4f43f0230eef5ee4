//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve configuration (defaults, config file, flags, environment)
//! - Install the global logger for the resolved environment
//! - Report skipped overrides and configuration problems, start the metrics exporter
//! - Wire the dependency container in builder order
//!
//! # Design Decisions
//! - Fail fast: config and logger errors are returned before any wiring
//! - Validation problems are warnings, consistent with lenient overrides
//! - Storage and messaging are toggled per service; storage failures are
//!   construction faults raised by the builder

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, ConfigResolver, ServiceConfig};
use crate::container::{ContainerBuilder, DependencyContainer};
use crate::observability::{metrics, Logger, LoggerConfig, LoggingError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] LoggingError),
}

/// What a service needs wired at startup.
#[derive(Debug, Clone)]
pub struct StartupOptions {
    pub service_name: String,
    pub storage: bool,
    pub messaging: bool,
}

impl StartupOptions {
    /// Storage and messaging both enabled.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            storage: true,
            messaging: true,
        }
    }

    pub fn without_storage(mut self) -> Self {
        self.storage = false;
        self
    }

    pub fn without_messaging(mut self) -> Self {
        self.messaging = false;
        self
    }
}

/// Resolve config from the process, install logging, and build the container.
pub async fn bootstrap(options: StartupOptions) -> Result<Arc<DependencyContainer>, StartupError> {
    let resolution = ConfigResolver::new(&options.service_name).load()?;
    let logger = install_logger(&options, &resolution.config)?;
    resolution.report_ignored(&logger);
    Ok(assemble(&options, resolution.config, logger).await)
}

/// Install logging for an already resolved `config` and build the container.
pub async fn bootstrap_with_config(
    options: &StartupOptions,
    config: ServiceConfig,
) -> Result<Arc<DependencyContainer>, StartupError> {
    let logger = install_logger(options, &config)?;
    Ok(assemble(options, config, logger).await)
}

fn install_logger(options: &StartupOptions, config: &ServiceConfig) -> Result<Logger, LoggingError> {
    let mut logger_config = LoggerConfig::for_environment(&options.service_name, &config.network.env);
    if let Some(level) = &config.observability.log_level {
        logger_config = logger_config.with_level(level.as_str());
    }
    Logger::install(&logger_config)
}

/// Wire the container with an existing logger.
pub async fn assemble(
    options: &StartupOptions,
    config: ServiceConfig,
    logger: Logger,
) -> Arc<DependencyContainer> {
    if let Err(problems) = validate_config(&config) {
        for (field, message) in problems.iter() {
            tracing::warn!(parent: logger.span(), field, problem = message, "Configuration problem");
        }
    }

    if let Some(address) = &config.observability.metrics_address {
        match address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(parent: logger.span(), error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => {
                tracing::error!(
                    parent: logger.span(),
                    metrics_address = %address,
                    error = %e,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    tracing::info!(
        parent: logger.span(),
        port = config.network.port,
        request_timeout_ms = config.network.request_timeout.as_millis() as u64,
        env = %config.network.env,
        storage = options.storage,
        messaging = options.messaging,
        "Configuration loaded"
    );

    let mut builder = ContainerBuilder::new().with_config(config).with_logger(logger);
    if options.storage {
        builder = builder.with_storage().await;
    }
    if options.messaging {
        builder = builder.with_messaging();
    }
    Arc::new(builder.build())
}
