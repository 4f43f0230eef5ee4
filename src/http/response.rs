//! JSON error responses shared by the middleware stack.
//!
//! Every error body is an envelope of the form `{"error": ...}` where the
//! payload is either a message or a field → message map.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::validation::ValidationErrors;

pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

/// Build a `{"error": message}` response.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Mark the response's connection as not reusable.
pub fn close_connection(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

pub fn server_error() -> Response {
    close_connection(error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        SERVER_ERROR_MESSAGE,
    ))
}

/// Work refused because the service is draining.
pub fn service_unavailable() -> Response {
    close_connection(error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "the server is shutting down and cannot accept new requests",
    ))
}

pub fn rate_limit_exceeded() -> Response {
    error_response(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded")
}

pub fn not_found() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "the requested resource could not be found",
    )
}

pub fn failed_validation(errors: &ValidationErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": errors.0 })),
    )
        .into_response()
}
