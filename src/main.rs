//! Order service entry point.
//!
//! Resolves configuration, wires storage and messaging, and serves the shared
//! HTTP stack until SIGINT or SIGTERM.

use std::process::ExitCode;

use axum::Router;
use tokio::net::TcpListener;

use service_kernel::http::service_router;
use service_kernel::lifecycle::{bootstrap, LifecycleCoordinator, StartupOptions};

const SERVICE_NAME: &str = "order-service";

#[tokio::main]
async fn main() -> ExitCode {
    let container = match bootstrap(StartupOptions::new(SERVICE_NAME)).await {
        Ok(container) => container,
        Err(e) => {
            eprintln!("{SERVICE_NAME}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let address = container.config().listen_address();
    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(parent: container.logger().span(), address = %address, error = %e, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    let router = service_router(&container, Router::new());
    match LifecycleCoordinator::new(container.clone()).run(listener, router).await {
        Ok(report) => {
            tracing::info!(
                parent: container.logger().span(),
                signal = %report.signal,
                outcome = ?report.outcome,
                "Shutdown complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(parent: container.logger().span(), error = %e, "Service stopped with an error");
            ExitCode::FAILURE
        }
    }
}
