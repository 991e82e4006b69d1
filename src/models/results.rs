//! Ranking and evaluation payloads produced by the screening pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::decision::HrDecision;
use crate::{AppError, Result};

/// One row of the candidate ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingEntry {
    /// Backend candidate identifier; key into [`ResultSet::evaluations`].
    pub candidate_id: String,
    /// Display name.
    pub name: String,
    /// Overall score assigned by the pipeline.
    pub score: f64,
    /// One-based rank.
    pub rank: u32,
    /// Public code-hosting profile, when known.
    #[serde(default)]
    pub github_url: Option<String>,
}

/// Per-candidate evaluation bundle.
///
/// Everything except `hr_decision` is opaque and kept verbatim in
/// [`content`](Self::content).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationBundle {
    /// Human decision sub-record; the only field the client mutates.
    #[serde(default)]
    pub hr_decision: Option<HrDecision>,
    /// Remaining evaluation fields (scores, justifications, risk reports).
    #[serde(flatten)]
    pub content: serde_json::Map<String, serde_json::Value>,
}

impl EvaluationBundle {
    /// Whether a human approved this candidate.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.hr_decision.as_ref().is_some_and(HrDecision::is_approved)
    }
}

/// A complete screening result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultSet {
    /// Candidates in authoritative display order.
    #[serde(default)]
    pub ranking: Vec<RankingEntry>,
    /// Evaluation bundle per candidate id.
    #[serde(default)]
    pub evaluations: BTreeMap<String, EvaluationBundle>,
}

impl ResultSet {
    /// Whether the ranking carries no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }

    /// Top-ranked candidate id.
    #[must_use]
    pub fn top_candidate(&self) -> Option<&str> {
        self.ranking.first().map(|entry| entry.candidate_id.as_str())
    }

    /// Check that every ranked candidate has an evaluation bundle.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StreamDecode` naming the first ranked candidate
    /// without an evaluation.
    pub fn validate(&self) -> Result<()> {
        if let Some(missing) = self
            .ranking
            .iter()
            .find(|entry| !self.evaluations.contains_key(&entry.candidate_id))
        {
            return Err(AppError::StreamDecode(format!(
                "ranked candidate {} has no evaluation",
                missing.candidate_id
            )));
        }
        Ok(())
    }
}
