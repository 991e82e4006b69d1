//! Unit tests for the result store.

use screening_client::models::{Decision, DecisionStatus, HrDecision};
use screening_client::orchestrator::ResultStore;
use screening_client::AppError;

use super::fixtures::sample_results;

fn approval(notes: &str) -> HrDecision {
    HrDecision {
        status: DecisionStatus::Completed,
        decision: Some(Decision::Approve),
        notes: Some(notes.into()),
        timestamp: None,
    }
}

fn loaded() -> ResultStore {
    let mut store = ResultStore::new();
    store.set_results(sample_results());
    store
}

#[test]
fn set_results_selects_top_candidate() {
    let store = loaded();

    assert_eq!(store.selected_id(), Some("C002"));
    assert!(store.selected().is_some());
}

#[test]
fn selection_survives_replacement_when_still_present() {
    let mut store = loaded();
    store.select_candidate("C001").unwrap();

    store.set_results(sample_results());

    assert_eq!(store.selected_id(), Some("C001"));
}

#[test]
fn selection_resets_when_candidate_disappears() {
    let mut store = loaded();
    store.select_candidate("C001").unwrap();
    let mut results = sample_results();
    results.ranking.retain(|entry| entry.candidate_id != "C001");
    results.evaluations.remove("C001");

    store.set_results(results);

    assert_eq!(store.selected_id(), Some("C002"));
}

#[test]
fn selecting_unknown_candidate_fails_and_keeps_selection() {
    let mut store = loaded();

    let err = store.select_candidate("C404").unwrap_err();

    assert_eq!(err, AppError::NotFound("candidate C404".into()));
    assert_eq!(store.selected_id(), Some("C002"));
}

#[test]
fn selecting_without_results_fails() {
    let mut store = ResultStore::new();

    assert!(matches!(
        store.select_candidate("C001"),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn merge_replaces_only_hr_decision() {
    let mut store = loaded();
    let before = store.evaluation("C001").unwrap().content.clone();

    assert!(store.merge_decision("C001", approval("strong systems depth")));

    let bundle = store.evaluation("C001").unwrap();
    assert_eq!(bundle.content, before);
    assert_eq!(bundle.hr_decision, Some(approval("strong systems depth")));
    assert_eq!(
        store.evaluation("C002").unwrap().hr_decision.as_ref().map(|hr| hr.status),
        Some(DecisionStatus::Pending)
    );
}

#[test]
fn merge_for_unknown_candidate_is_a_no_op() {
    let mut store = loaded();
    let before = store.clone();

    assert!(!store.merge_decision("C404", approval("n/a")));

    assert_eq!(store, before);
}

#[test]
fn merge_into_empty_store_is_a_no_op() {
    let mut store = ResultStore::new();

    assert!(!store.merge_decision("C001", approval("ok")));
    assert!(store.results().is_none());
}

#[test]
fn approved_lists_completed_approvals_in_ranking_order() {
    let mut store = loaded();
    assert!(store.approved().is_empty());

    store.merge_decision("C001", approval("first"));
    store.merge_decision("C002", approval("second"));

    let ids: Vec<_> = store
        .approved()
        .iter()
        .map(|entry| entry.candidate_id.as_str())
        .collect();
    assert_eq!(ids, vec!["C002", "C001"]);
}

#[test]
fn clear_drops_results_and_selection() {
    let mut store = loaded();

    store.clear();

    assert!(store.results().is_none());
    assert!(store.selected_id().is_none());
    assert!(store.approved().is_empty());
}
