//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use service_kernel::config::ServiceConfig;
use service_kernel::container::DependencyContainer;
use service_kernel::http::service_router;
use service_kernel::lifecycle::{
    LifecycleCoordinator, LifecycleError, LifecycleState, ShutdownReport, TerminationSignal,
};
use service_kernel::observability::{Logger, LoggerConfig};
use service_kernel::storage::{Storage, StorageError};

/// Storage double counting close calls.
#[derive(Debug, Default)]
pub struct CountingStorage {
    closes: AtomicUsize,
    fail_close: bool,
}

impl CountingStorage {
    pub fn failing() -> Self {
        Self {
            closes: AtomicUsize::new(0),
            fail_close: true,
        }
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for CountingStorage {
    fn backend(&self) -> &'static str {
        "counting"
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(StorageError::Release {
                backend: "counting",
                reason: "broken pipe".into(),
            });
        }
        Ok(())
    }
}

/// Container with default config and the given storage attached.
pub fn container(storage: Arc<CountingStorage>) -> Arc<DependencyContainer> {
    container_with(storage, |_| {})
}

/// Like [`container`], with `configure` applied to the config first.
pub fn container_with(
    storage: Arc<CountingStorage>,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Arc<DependencyContainer> {
    let mut config = ServiceConfig::defaults_for("order-service");
    config.network.env = "test".into();
    config.rate_limit.enabled = false;
    configure(&mut config);

    let container = Arc::new(DependencyContainer::new(
        config,
        Logger::new(&LoggerConfig::test("order-service")),
    ));
    container.attach_storage(storage);
    container
}

/// A service running under a coordinator on an ephemeral port.
pub struct RunningService {
    pub addr: SocketAddr,
    pub signals: mpsc::Sender<TerminationSignal>,
    pub states: watch::Receiver<LifecycleState>,
    pub handle: JoinHandle<Result<ShutdownReport, LifecycleError>>,
}

impl RunningService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn signal(&self, signal: TerminationSignal) {
        self.signals.send(signal).await.unwrap();
    }

    pub async fn wait_for_state(&mut self, state: LifecycleState) {
        tokio::time::timeout(Duration::from_secs(5), self.states.wait_for(|s| *s == state))
            .await
            .expect("state not reached in time")
            .unwrap();
    }
}

/// Serve `routes` behind the shared middleware stack.
pub async fn start_service(
    container: Arc<DependencyContainer>,
    routes: Router,
    drain_deadline: Duration,
) -> RunningService {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (signals, rx) = mpsc::channel(4);

    let coordinator = LifecycleCoordinator::new(container.clone()).with_drain_deadline(drain_deadline);
    let mut states = coordinator.subscribe();
    let router = service_router(&container, routes);
    let handle = tokio::spawn(coordinator.run_with_signals(listener, router, rx));

    tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(|s| *s == LifecycleState::Running),
    )
    .await
    .expect("service did not start")
    .unwrap();

    RunningService {
        addr,
        signals,
        states,
        handle,
    }
}

/// Client without connection reuse, so every request opens a connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll until `check` holds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// A gate that parked handlers wait on until opened.
pub fn gate() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

pub async fn wait_open(mut gate: watch::Receiver<bool>) {
    let _ = gate.wait_for(|open| *open).await;
}
