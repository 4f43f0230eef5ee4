//! Per-request recovery boundary.

use std::any::Any;

use axum::response::Response;
use tower_http::catch_panic::CatchPanicLayer;

use crate::http::response;
use crate::observability::metrics;
use crate::recovery::panic_message;

pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Layer converting a handler panic into a 500 response that closes the
/// connection. Other requests are unaffected.
pub fn layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    metrics::record_recovered_fault("request");
    tracing::error!(error = %message, "Request handler panicked");
    response::server_error()
}
