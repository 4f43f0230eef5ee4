//! Drain-then-stop behaviour against a real listener.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::sync::watch;

use service_kernel::lifecycle::{DrainOutcome, LifecycleError, LifecycleState, TerminationSignal};

mod common;

use common::CountingStorage;

fn gated_routes(gate: watch::Receiver<bool>) -> Router {
    Router::new().route(
        "/v1/orders/slow",
        get(move || {
            let gate = gate.clone();
            async move {
                common::wait_open(gate).await;
                "done"
            }
        }),
    )
}

#[tokio::test]
async fn drain_waits_for_in_flight_work() {
    let storage = Arc::new(CountingStorage::default());
    let container = common::container(storage.clone());
    let (open, gate) = common::gate();
    let mut service =
        common::start_service(container.clone(), gated_routes(gate), Duration::from_secs(30)).await;

    let client = common::client();
    let requests: Vec<_> = (0..3)
        .map(|_| {
            let request = client.get(service.url("/v1/orders/slow")).send();
            tokio::spawn(request)
        })
        .collect();
    common::eventually(|| container.workers().in_flight() == 3).await;

    service.signal(TerminationSignal::Terminate).await;
    service.wait_for_state(LifecycleState::Draining).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!service.handle.is_finished(), "must wait for in-flight work");
    assert_eq!(storage.close_count(), 0, "storage released before drain");

    // The listener is closed, so a fresh connection is refused outright.
    let refused = client.get(service.url("/v1/healthcheck")).send().await;
    assert!(refused.is_err(), "no new connections while draining");

    open.send(true).unwrap();
    for request in requests {
        let response = request.await.unwrap().expect("in-flight request completes");
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "done");
    }

    let report = service.handle.await.unwrap().unwrap();
    assert_eq!(report.signal, TerminationSignal::Terminate);
    assert_eq!(report.outcome, DrainOutcome::Drained);
    assert_eq!(storage.close_count(), 1);
    assert_eq!(container.workers().in_flight(), 0);
}

#[tokio::test]
async fn deadline_returns_control_with_work_outstanding() {
    let storage = Arc::new(CountingStorage::default());
    let container = common::container(storage.clone());
    let (_open, gate) = common::gate();
    let service = common::start_service(
        container.clone(),
        gated_routes(gate),
        Duration::from_millis(200),
    )
    .await;

    let client = common::client();
    let _stuck = tokio::spawn(client.get(service.url("/v1/orders/slow")).send());
    common::eventually(|| container.workers().in_flight() == 1).await;

    service.signal(TerminationSignal::Interrupt).await;
    let report = tokio::time::timeout(Duration::from_secs(5), service.handle)
        .await
        .expect("deadline must return control")
        .unwrap()
        .unwrap();

    assert_eq!(report.outcome, DrainOutcome::DeadlineElapsed { in_flight: 1 });
    assert!(report.elapsed >= Duration::from_millis(200));
    assert_eq!(storage.close_count(), 1);
    // The handler is still running; it was not cancelled.
    assert_eq!(container.workers().in_flight(), 1);
}

#[tokio::test]
async fn second_signal_forces_stop() {
    let storage = Arc::new(CountingStorage::default());
    let container = common::container(storage.clone());
    let (_open, gate) = common::gate();
    let mut service =
        common::start_service(container.clone(), gated_routes(gate), Duration::from_secs(30)).await;

    let client = common::client();
    let _stuck = tokio::spawn(client.get(service.url("/v1/orders/slow")).send());
    common::eventually(|| container.workers().in_flight() == 1).await;

    service.signal(TerminationSignal::Interrupt).await;
    service.wait_for_state(LifecycleState::Draining).await;
    service.signal(TerminationSignal::Terminate).await;

    let report = tokio::time::timeout(Duration::from_secs(5), service.handle)
        .await
        .expect("second signal must stop promptly")
        .unwrap()
        .unwrap();

    assert_eq!(report.signal, TerminationSignal::Interrupt);
    assert_eq!(report.outcome, DrainOutcome::Forced { in_flight: 1 });
    assert_eq!(storage.close_count(), 1);
}

#[tokio::test]
async fn release_failure_reaches_the_caller() {
    let storage = Arc::new(CountingStorage::failing());
    let container = common::container(storage.clone());
    let mut service =
        common::start_service(container, Router::new(), Duration::from_secs(30)).await;

    let response = common::client()
        .get(service.url("/v1/healthcheck"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    service.signal(TerminationSignal::Terminate).await;
    service.wait_for_state(LifecycleState::Stopped).await;

    let err = service.handle.await.unwrap().unwrap_err();
    assert!(matches!(err, LifecycleError::Release(_)));
    assert_eq!(storage.close_count(), 1);
}

#[tokio::test]
async fn completed_requests_leave_nothing_in_flight() {
    let storage = Arc::new(CountingStorage::default());
    let container = common::container(storage);
    let service =
        common::start_service(container.clone(), Router::new(), Duration::from_secs(30)).await;

    let client = common::client();
    for _ in 0..5 {
        let response = client.get(service.url("/v1/healthcheck")).send().await.unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "available");
        assert_eq!(body["system_info"]["environment"], "test");
    }
    common::eventually(|| container.workers().in_flight() == 0).await;

    service.signal(TerminationSignal::Terminate).await;
    let report = service.handle.await.unwrap().unwrap();
    assert_eq!(report.outcome, DrainOutcome::Drained);
}

#[tokio::test]
async fn timed_out_request_does_not_hold_the_drain() {
    let storage = Arc::new(CountingStorage::default());
    let container = common::container_with(storage.clone(), |config| {
        config.network.request_timeout = Duration::from_millis(200);
    });
    let (_open, gate) = common::gate();
    let service =
        common::start_service(container.clone(), gated_routes(gate), Duration::from_secs(30)).await;

    let response = common::client()
        .get(service.url("/v1/orders/slow"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 408);
    common::eventually(|| container.workers().in_flight() == 0).await;

    service.signal(TerminationSignal::Terminate).await;
    let report = tokio::time::timeout(Duration::from_secs(5), service.handle)
        .await
        .expect("nothing left to drain")
        .unwrap()
        .unwrap();
    assert_eq!(report.outcome, DrainOutcome::Drained);
    assert_eq!(storage.close_count(), 1);
}
