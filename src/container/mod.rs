//! Dependency container subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceConfig + Logger
//!     → builder.rs (config → logger → storage → messaging, fail fast)
//!     → container.rs (shared read-mostly, passed explicitly as Arc)
//!     → registry.rs (named services registered after construction)
//!     → close() once by the lifecycle coordinator
//! ```

pub mod builder;
#[allow(clippy::module_inception)]
pub mod container;
pub mod registry;

pub use builder::ContainerBuilder;
pub use container::DependencyContainer;
pub use registry::{ServiceInstance, ServiceRegistry};
