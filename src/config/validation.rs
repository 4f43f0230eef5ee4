//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of a resolved snapshot (serde and the resolver
//!   handle syntax)
//! - Validate value ranges (connection counts, limiter rates)
//! - Detect duplicate origins and topics
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: &ServiceConfig → Result<(), ValidationErrors>
//! - Startup reports failures as warnings; it does not abort

use crate::config::schema::ServiceConfig;
use crate::validation::{permitted_value, unique, ValidationErrors, Validator};

/// Environment tags a service may run under.
pub const ENVIRONMENTS: [&str; 4] = ["development", "staging", "production", "test"];

/// Validate a resolved snapshot.
pub fn validate_config(config: &ServiceConfig) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();

    {
        let mut network = v.envelope("network");
        network.check(config.network.port != 0, "port", "must be a non-zero port");
        network.check(
            permitted_value(&config.network.env.as_str(), &ENVIRONMENTS),
            "env",
            "must be development, staging, production or test",
        );
    }

    {
        let storage = &config.storage;
        let mut env = v.envelope("storage");
        env.check(!storage.dsn.is_empty(), "dsn", "must be provided");
        env.check(storage.max_open_conns > 0, "max_open_conns", "must be greater than zero");
        env.check(
            storage.max_idle_conns <= storage.max_open_conns,
            "max_idle_conns",
            "must not exceed max_open_conns",
        );
    }

    if config.rate_limit.enabled {
        let mut env = v.envelope("rate_limit");
        env.check(
            config.rate_limit.rps.is_finite() && config.rate_limit.rps > 0.0,
            "rps",
            "must be a positive number",
        );
        env.check(config.rate_limit.burst > 0, "burst", "must be greater than zero");
    }

    let origins = &config.cors.trusted_origins;
    v.check(unique(origins), "cors.trusted_origins", "must not contain duplicates");
    for (index, origin) in origins.iter().enumerate() {
        v.array_envelope("cors.trusted_origins", index).check(
            origin.starts_with("http://") || origin.starts_with("https://"),
            "origin",
            "must be an http(s) origin",
        );
    }

    {
        let messaging = &config.messaging;
        let topics = &messaging.topics;
        let names = [
            topics.payment_request.as_str(),
            topics.payment_response.as_str(),
            topics.restaurant_approval_request.as_str(),
            topics.restaurant_approval_response.as_str(),
        ];

        let mut env = v.envelope("messaging");
        env.check(
            !messaging.bootstrap_servers.trim().is_empty(),
            "bootstrap_servers",
            "must be provided",
        );
        env.check(!messaging.client_id.is_empty(), "client_id", "must be provided");
        env.check(!messaging.group_id.is_empty(), "group_id", "must be provided");
        env.check(names.iter().all(|name| !name.is_empty()), "topics", "must all be named");
        env.check(unique(&names), "topics", "must be distinct");
    }

    v.finish()
}
