//! Integration tests for recovering stored results at startup.

use axum::http::StatusCode;
use screening_client::models::MAX_STAGE;
use screening_client::orchestrator::{SessionOrchestrator, SessionState};
use serde_json::json;

use super::test_helpers::{
    full_stream_body, other_results_json, sample_results_json, spawn_stub, start_session,
    test_config, StreamScript, StubBackend, WAIT,
};

#[tokio::test]
async fn stored_results_restore_a_completed_session() {
    let stub = StubBackend::new();
    stub.set_results(StatusCode::OK, sample_results_json());

    let orchestrator = start_session(&stub).await;

    let snap = orchestrator.snapshot();
    assert!(snap.ready);
    assert_eq!(snap.generation, 0);
    assert_eq!(snap.machine.state(), SessionState::Completed);
    assert_eq!(snap.machine.stage_index(), MAX_STAGE);
    assert_eq!(snap.store.selected_id(), Some("C002"));
    assert_eq!(stub.stream_opens(), 0);
}

#[tokio::test]
async fn failed_fetch_leaves_session_idle_but_ready() {
    let stub = StubBackend::new();
    stub.set_results(StatusCode::INTERNAL_SERVER_ERROR, json!({ "detail": "boom" }));

    let orchestrator = start_session(&stub).await;

    let snap = orchestrator.snapshot();
    assert!(snap.ready);
    assert_eq!(snap.machine.state(), SessionState::Idle);
    assert!(snap.machine.error().is_none());
    assert!(snap.store.results().is_none());
}

#[tokio::test]
async fn empty_stored_results_leave_session_idle() {
    let stub = StubBackend::new();

    let orchestrator = start_session(&stub).await;

    let snap = orchestrator.snapshot();
    assert!(snap.ready);
    assert_eq!(snap.machine.state(), SessionState::Idle);
    assert!(snap.store.results().is_none());
}

#[tokio::test]
async fn results_missing_an_evaluation_are_not_restored() {
    let stub = StubBackend::new();
    let mut results = sample_results_json();
    results["evaluations"]
        .as_object_mut()
        .expect("evaluations object")
        .remove("C001");
    stub.set_results(StatusCode::OK, results);

    let orchestrator = start_session(&stub).await;

    assert_eq!(orchestrator.snapshot().machine.state(), SessionState::Idle);
}

#[tokio::test]
async fn run_started_before_recovery_wins() {
    let stub = StubBackend::new();
    stub.set_results(StatusCode::OK, sample_results_json());
    stub.push_stream(StreamScript::body(full_stream_body(&other_results_json())));
    let addr = spawn_stub(stub.clone()).await;

    let orchestrator = SessionOrchestrator::connect(test_config(addr)).expect("connect");
    let run = orchestrator.start();
    tokio::time::timeout(WAIT, run.finished())
        .await
        .expect("run did not finish");
    let snap = tokio::time::timeout(WAIT, orchestrator.wait_ready())
        .await
        .expect("warm start timed out");

    assert_eq!(snap.generation, 1);
    assert_eq!(snap.machine.state(), SessionState::Completed);
    assert_eq!(snap.store.selected_id(), Some("C007"));
    assert!(snap.store.evaluation("C002").is_none());
}
