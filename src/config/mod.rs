//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceConfig::defaults_for(service)
//!     → loader.rs (optional -config TOML file replaces defaults)
//!     → resolver.rs (flags, then environment variables)
//!     → validation.rs (semantic checks, reported as warnings)
//!     → ServiceConfig (immutable snapshot)
//!     → shared via Arc through the dependency container
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; there is no reload path
//! - All fields have defaults so every layer may be partial
//! - A malformed override is dropped, never fatal; a malformed flag or
//!   config file is a usage error reported before anything is wired

pub mod duration;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use resolver::{ConfigResolver, EnvSource, FlagOverrides, IgnoredOverride, ProcessEnv, Resolution};
pub use schema::{
    CorsConfig, MessagingConfig, NetworkConfig, ObservabilityConfig, RateLimitConfig, ServiceConfig,
    StorageConfig, TopicConfig,
};
