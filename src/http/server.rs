//! Shared HTTP middleware stack.
//!
//! # Responsibilities
//! - Mount the health check next to the service's own routes
//! - Wire up middleware (request ID, tracing, recovery, CORS, timeout, rate limit)
//!
//! The stack, outermost first:
//! ```text
//! SetRequestId → PropagateRequestId → Trace → recovery boundary
//!     → CORS → request timeout (unless zero) → rate limiter (when enabled) → routes
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::CorsConfig;
use crate::container::DependencyContainer;
use crate::http::rate_limit::{rate_limit, RateLimiter};
use crate::recovery;

pub const HEALTHCHECK_PATH: &str = "/v1/healthcheck";

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub system_info: SystemInfo,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub environment: String,
    pub version: &'static str,
}

/// Wrap `routes` in the shared middleware stack configured from the container.
pub fn service_router(container: &Arc<DependencyContainer>, routes: Router) -> Router {
    let config = container.config();

    let router = Router::new()
        .route(HEALTHCHECK_PATH, get(healthcheck))
        .with_state(Arc::clone(container))
        .merge(routes);

    let router = if config.rate_limit.enabled {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        router.layer(middleware::from_fn_with_state(limiter, rate_limit))
    } else {
        router
    };

    let router = if config.network.request_timeout.is_zero() {
        router
    } else {
        router.layer(timeout_layer(config.network.request_timeout))
    };

    router
        .layer(cors_layer(&config.cors))
        .layer(recovery::http::layer())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Requests still running after `timeout` are dropped with `408`.
#[allow(deprecated)]
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::new(timeout)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = config
        .trusted_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring malformed trusted origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::OPTIONS, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn healthcheck(State(container): State<Arc<DependencyContainer>>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "available",
        system_info: SystemInfo {
            environment: container.config().network.env.clone(),
            version: env!("CARGO_PKG_VERSION"),
        },
    })
}
