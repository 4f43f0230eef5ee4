//! Shared bootstrap kernel for the order-processing services.
//!
//! # Architecture Overview
//!
//! ```text
//!   defaults ─┐
//!   -config ──┤   ┌──────────────┐    ┌──────────────────┐    ┌─────────────────────┐
//!   flags ────┼──▶│   config     │───▶│ ContainerBuilder │───▶│ DependencyContainer │
//!   env ──────┘   │  resolver    │    │ config → logger  │    │  config, logger,    │
//!                 └──────────────┘    │ → storage → msg  │    │  storage, messaging,│
//!                                     └──────────────────┘    │  services, workers  │
//!                                                              └──────────┬──────────┘
//!                                                                         │
//!   SIGINT/SIGTERM ──▶ signals ──▶ ┌───────────────────────┐              │
//!                                  │ LifecycleCoordinator  │◀─────────────┘
//!   TCP listener ─────────────────▶│ Running → Draining    │
//!                                  │ → Stopped (30s drain) │
//!                                  └───────────┬───────────┘
//!                                              ▼
//!                        worker counter → request id → trace → recovery
//!                              → CORS → rate limit → service routes
//! ```

// Core subsystems
pub mod config;
pub mod container;
pub mod lifecycle;
pub mod recovery;

// Shared resources
pub mod messaging;
pub mod storage;

// Request handling
pub mod http;
pub mod validation;

// Cross-cutting concerns
pub mod domain;
pub mod observability;

pub use config::{ConfigResolver, ServiceConfig};
pub use container::{ContainerBuilder, DependencyContainer};
pub use lifecycle::{
    DrainOutcome, LifecycleCoordinator, LifecycleError, LifecycleState, ShutdownReport,
    TerminationSignal,
};
pub use recovery::RecoveredFault;
