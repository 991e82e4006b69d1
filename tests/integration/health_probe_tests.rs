//! Integration tests for the backend liveness probe.

use std::time::Duration;

use screening_client::orchestrator::{HealthProbe, HealthState, SessionState};
use screening_client::BackendClient;
use tokio_util::sync::CancellationToken;

use super::test_helpers::{
    full_stream_body, sample_results_json, spawn_stub, start_session, test_config,
    unreachable_addr, StreamScript, StubBackend, WAIT,
};

const PERIOD: Duration = Duration::from_millis(50);

async fn wait_for_health(
    mut rx: tokio::sync::watch::Receiver<HealthState>,
    expected: HealthState,
) {
    tokio::time::timeout(WAIT, rx.wait_for(|state| *state == expected))
        .await
        .expect("timed out waiting for health state")
        .expect("health channel closed");
}

#[test]
fn status_strings_map_to_states() {
    assert_eq!(HealthState::from_status("running"), HealthState::Running);
    assert_eq!(HealthState::from_status("RUNNING"), HealthState::Running);
    assert_eq!(HealthState::from_status("error"), HealthState::Error);
    assert_eq!(HealthState::from_status("degraded"), HealthState::Unknown);
}

#[tokio::test]
async fn running_backend_reports_running() {
    let stub = StubBackend::new();
    stub.set_health(Some("running"));
    let addr = spawn_stub(stub.clone()).await;
    let client = BackendClient::new(test_config(addr)).expect("client");

    let probe = HealthProbe::new(client, PERIOD, CancellationToken::new()).spawn();

    wait_for_health(probe.subscribe(), HealthState::Running).await;
    assert_eq!(probe.current(), HealthState::Running);
    probe.await_completion().await;
}

#[tokio::test]
async fn probe_tracks_backend_going_down_and_recovering() {
    let stub = StubBackend::new();
    stub.set_health(Some("running"));
    let addr = spawn_stub(stub.clone()).await;
    let client = BackendClient::new(test_config(addr)).expect("client");
    let probe = HealthProbe::new(client, PERIOD, CancellationToken::new()).spawn();
    wait_for_health(probe.subscribe(), HealthState::Running).await;

    stub.set_health(None);
    wait_for_health(probe.subscribe(), HealthState::Error).await;

    stub.set_health(Some("running"));
    wait_for_health(probe.subscribe(), HealthState::Running).await;
    probe.await_completion().await;
}

#[tokio::test]
async fn slow_probe_is_not_followed_by_a_burst() {
    let stub = StubBackend::new();
    stub.set_health(Some("running"));
    stub.push_health_delay(Duration::from_millis(450));
    let addr = spawn_stub(stub.clone()).await;
    let client = BackendClient::new(test_config(addr)).expect("client");
    let probe = HealthProbe::new(client, Duration::from_millis(100), CancellationToken::new()).spawn();

    tokio::time::timeout(WAIT, async {
        while stub.health_hits().len() < 4 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("probe stopped polling");
    probe.await_completion().await;

    let hits = stub.health_hits();
    assert!(hits[1] - hits[0] >= Duration::from_millis(400));
    for pair in hits[1..4].windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            gap >= Duration::from_millis(50),
            "probes {gap:?} apart after a slow response"
        );
    }
}

#[tokio::test]
async fn unreachable_backend_reports_error() {
    let addr = unreachable_addr().await;
    let client = BackendClient::new(test_config(addr)).expect("client");

    let probe = HealthProbe::new(client, PERIOD, CancellationToken::new()).spawn();

    wait_for_health(probe.subscribe(), HealthState::Error).await;
    probe.await_completion().await;
}

#[tokio::test]
async fn unrecognised_status_reports_unknown() {
    let stub = StubBackend::new();
    stub.set_health(Some("degraded"));
    let addr = spawn_stub(stub.clone()).await;
    let client = BackendClient::new(test_config(addr)).expect("client");
    let probe = HealthProbe::new(client, Duration::from_secs(3600), CancellationToken::new()).spawn();

    assert_eq!(probe.check_now().await, HealthState::Unknown);
    assert_eq!(probe.current(), HealthState::Unknown);
    probe.await_completion().await;
}

#[tokio::test]
async fn cancelled_probe_stops() {
    let stub = StubBackend::new();
    stub.set_health(Some("running"));
    let addr = spawn_stub(stub.clone()).await;
    let client = BackendClient::new(test_config(addr)).expect("client");
    let cancel = CancellationToken::new();
    let probe = HealthProbe::new(client, PERIOD, cancel.clone()).spawn();

    cancel.cancel();

    tokio::time::timeout(WAIT, probe.await_completion())
        .await
        .expect("probe did not stop");
}

#[tokio::test]
async fn failing_probe_does_not_touch_session_state() {
    let stub = StubBackend::new();
    stub.push_stream(StreamScript::body(full_stream_body(&sample_results_json())));
    let orchestrator = start_session(&stub).await;

    assert_eq!(orchestrator.check_health().await, HealthState::Error);
    tokio::time::timeout(WAIT, orchestrator.start().finished())
        .await
        .expect("run did not finish");

    let snap = orchestrator.snapshot();
    assert_eq!(snap.machine.state(), SessionState::Completed);
    assert!(snap.machine.error().is_none());
    assert_eq!(orchestrator.health(), HealthState::Error);

    tokio::time::timeout(WAIT, orchestrator.shutdown())
        .await
        .expect("shutdown did not finish");
}

#[tokio::test]
async fn stop_joins_the_task_and_can_repeat() {
    let stub = StubBackend::new();
    stub.set_health(Some("running"));
    let addr = spawn_stub(stub.clone()).await;
    let client = BackendClient::new(test_config(addr)).expect("client");
    let mut probe = HealthProbe::new(client, PERIOD, CancellationToken::new()).spawn();
    wait_for_health(probe.subscribe(), HealthState::Running).await;

    tokio::time::timeout(WAIT, probe.stop())
        .await
        .expect("first stop did not return");
    let hits = stub.health_hits().len();
    tokio::time::timeout(WAIT, probe.stop())
        .await
        .expect("second stop did not return");

    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(stub.health_hits().len(), hits, "probe kept running after stop");
}
