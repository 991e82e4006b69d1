//! Last committed result set and the selected candidate.

use tracing::debug;

use crate::models::{EvaluationBundle, HrDecision, RankingEntry, ResultSet};
use crate::{AppError, Result};

/// Holds the committed [`ResultSet`] and the UI's selected candidate.
///
/// While results are present and non-empty the selection always names a
/// candidate with an evaluation bundle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultStore {
    results: Option<ResultSet>,
    selected: Option<String>,
}

impl ResultStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the result set.
    ///
    /// The current selection survives when the new set still contains it;
    /// otherwise the top-ranked candidate is selected.
    pub fn set_results(&mut self, results: ResultSet) {
        let keep = self
            .selected
            .as_deref()
            .is_some_and(|id| results.evaluations.contains_key(id));
        if !keep {
            self.selected = results.top_candidate().map(str::to_owned);
        }
        self.results = Some(results);
    }

    /// Drop the result set and the selection.
    pub fn clear(&mut self) {
        self.results = None;
        self.selected = None;
    }

    /// Select a candidate for display.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when `candidate_id` has no evaluation in
    /// the current result set; the selection is left unchanged.
    pub fn select_candidate(&mut self, candidate_id: &str) -> Result<()> {
        let present = self
            .results
            .as_ref()
            .is_some_and(|results| results.evaluations.contains_key(candidate_id));
        if !present {
            return Err(AppError::NotFound(format!("candidate {candidate_id}")));
        }
        self.selected = Some(candidate_id.to_owned());
        Ok(())
    }

    /// Overwrite the `hr_decision` of one candidate.
    ///
    /// Returns `false` without touching anything when the candidate is not in
    /// the current result set.
    pub fn merge_decision(&mut self, candidate_id: &str, decision: HrDecision) -> bool {
        let Some(bundle) = self
            .results
            .as_mut()
            .and_then(|results| results.evaluations.get_mut(candidate_id))
        else {
            debug!(candidate_id, "no evaluation for decision, skipping merge");
            return false;
        };
        bundle.hr_decision = Some(decision);
        true
    }

    /// Committed result set, if any.
    #[must_use]
    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    /// Selected candidate id, if any.
    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Evaluation bundle of the selected candidate.
    #[must_use]
    pub fn selected(&self) -> Option<&EvaluationBundle> {
        let id = self.selected.as_deref()?;
        self.evaluation(id)
    }

    /// Evaluation bundle of one candidate.
    #[must_use]
    pub fn evaluation(&self, candidate_id: &str) -> Option<&EvaluationBundle> {
        self.results.as_ref()?.evaluations.get(candidate_id)
    }

    /// Ranked candidates with a completed approval, in ranking order.
    #[must_use]
    pub fn approved(&self) -> Vec<&RankingEntry> {
        let Some(results) = self.results.as_ref() else {
            return Vec::new();
        };
        results
            .ranking
            .iter()
            .filter(|entry| {
                results
                    .evaluations
                    .get(&entry.candidate_id)
                    .is_some_and(EvaluationBundle::is_approved)
            })
            .collect()
    }
}
