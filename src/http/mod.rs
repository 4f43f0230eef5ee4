//! HTTP plumbing shared by every service.
//!
//! # Data Flow
//! ```text
//! TCP connection (owned by the lifecycle coordinator)
//!     → worker counter (503 while draining)
//!     → server.rs (request ID, trace, recovery, CORS, rate limit)
//!     → service routes / health check
//!     → response.rs (JSON error envelopes)
//!     → Send to client
//! ```

pub mod rate_limit;
pub mod response;
pub mod server;

pub use rate_limit::RateLimiter;
pub use server::{service_router, HEALTHCHECK_PATH};
