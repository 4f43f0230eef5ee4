//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Install logger → Validate → Build container
//!
//! Serving (coordinator.rs):
//!     Bind listener → Running → every request counted (workers.rs)
//!
//! Shutdown (coordinator.rs):
//!     Signal received → Stop admitting → Drain (deadline 30s) → Release → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → forwarded to the coordinator
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then logger, then resources
//! - Ordered shutdown: stop admission, drain, release storage
//! - Shutdown has a soft deadline: control returns, work is not cancelled

pub mod coordinator;
pub mod signals;
pub mod startup;
pub mod state;
pub mod workers;

pub use coordinator::{
    DrainOutcome, LifecycleCoordinator, LifecycleError, ShutdownReport, DEFAULT_DRAIN_DEADLINE,
};
pub use signals::TerminationSignal;
pub use startup::{bootstrap, StartupError, StartupOptions};
pub use state::LifecycleState;
pub use workers::{WorkerCounter, WorkerGuard};
