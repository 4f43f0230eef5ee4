//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Provide the `Logger` handle carried by the dependency container
//! - Pick level and encoding from the environment tag
//!
//! # Design Decisions
//! - JSON format for production, console format for development and tests
//! - `RUST_LOG` wins over the configured level when set
//! - An unknown level falls back to `info` instead of failing startup

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::Span;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEncoding {
    Console,
    Json,
}

/// Logger settings.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: String,
    pub environment: String,
    pub service_name: String,
    /// Append to this file instead of stdout.
    pub output_path: Option<PathBuf>,
    pub encoding: LogEncoding,
}

impl LoggerConfig {
    pub fn development(service_name: &str) -> Self {
        Self {
            level: "debug".to_string(),
            environment: "development".to_string(),
            service_name: service_name.to_string(),
            output_path: None,
            encoding: LogEncoding::Console,
        }
    }

    pub fn production(service_name: &str) -> Self {
        Self {
            level: "info".to_string(),
            environment: "production".to_string(),
            service_name: service_name.to_string(),
            output_path: None,
            encoding: LogEncoding::Json,
        }
    }

    pub fn test(service_name: &str) -> Self {
        Self {
            level: "debug".to_string(),
            environment: "test".to_string(),
            service_name: service_name.to_string(),
            output_path: None,
            encoding: LogEncoding::Console,
        }
    }

    /// Preset for an environment tag. Staging logs like production.
    pub fn for_environment(service_name: &str, environment: &str) -> Self {
        let mut config = match environment {
            "production" | "staging" => Self::production(service_name),
            "test" => Self::test(service_name),
            _ => Self::development(service_name),
        };
        config.environment = environment.to_string();
        config
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install global subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Parse a level name, falling back to `info`.
pub fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or(LevelFilter::INFO)
}

/// Logger handle shared through the dependency container.
///
/// Events emitted with `parent: logger.span()` carry the service and
/// environment fields.
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span,
    service: Arc<str>,
    environment: Arc<str>,
}

impl Logger {
    /// Build a handle against whatever subscriber is current.
    pub fn new(config: &LoggerConfig) -> Self {
        let span = tracing::info_span!(
            "service",
            service = %config.service_name,
            environment = %config.environment,
        );
        Self {
            span,
            service: Arc::from(config.service_name.as_str()),
            environment: Arc::from(config.environment.as_str()),
        }
    }

    /// Install the global subscriber described by `config` and return a handle.
    pub fn install(config: &LoggerConfig) -> Result<Self, LoggingError> {
        let filter = EnvFilter::builder()
            .with_default_directive(parse_level(&config.level).into())
            .from_env_lossy();

        let writer = match &config.output_path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| LoggingError::Output {
                        path: path.clone(),
                        source,
                    })?;
                BoxMakeWriter::new(Mutex::new(file))
            }
            None => BoxMakeWriter::new(std::io::stdout),
        };

        let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.encoding {
            LogEncoding::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .boxed(),
            LogEncoding::Console => tracing_subscriber::fmt::layer().with_writer(writer).boxed(),
        };

        tracing_subscriber::registry()
            .with(fmt_layer)
            .with(filter)
            .try_init()?;

        Ok(Self::new(config))
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Child handle whose events also carry a `component` field.
    pub fn component(&self, component: &'static str) -> Self {
        let span = tracing::info_span!(parent: &self.span, "component", component);
        Self {
            span,
            service: Arc::clone(&self.service),
            environment: Arc::clone(&self.environment),
        }
    }
}
