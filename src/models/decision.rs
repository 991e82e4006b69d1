//! Human (HR) decision types attached to each evaluation bundle.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Outcome chosen by a human reviewer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Candidate advances.
    Approve,
    /// Candidate is parked for later review.
    Hold,
    /// Candidate is declined.
    Reject,
}

impl Decision {
    /// Wire representation (`APPROVE`, `HOLD`, `REJECT`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Hold => "HOLD",
            Self::Reject => "REJECT",
        }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "APPROVE" => Ok(Self::Approve),
            "HOLD" => Ok(Self::Hold),
            "REJECT" => Ok(Self::Reject),
            other => Err(AppError::Config(format!("unknown decision: {other}"))),
        }
    }
}

/// Review state of a candidate's human decision.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStatus {
    /// No human decision recorded yet.
    #[default]
    Pending,
    /// A decision has been recorded by the backend.
    Completed,
}

/// The mutable `hr_decision` sub-record of an evaluation bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HrDecision {
    /// Review state; absent on the wire means pending.
    #[serde(default)]
    pub status: DecisionStatus,
    /// Chosen outcome, if any.
    #[serde(default)]
    pub decision: Option<Decision>,
    /// Free-form reviewer notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Backend timestamp of the decision, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HrDecision {
    /// Whether this record is a completed approval.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == DecisionStatus::Completed && self.decision == Some(Decision::Approve)
    }
}

/// Body of `POST /hr-decision`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DecisionRequest {
    /// Target candidate.
    pub candidate_id: String,
    /// Chosen outcome.
    pub decision: Decision,
    /// Optional reviewer notes.
    pub notes: Option<String>,
}

/// Backend acknowledgement of a submitted decision.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DecisionAck {
    /// The committed decision record to merge into the result store.
    pub hr_decision: HrDecision,
    /// Human-readable confirmation.
    #[serde(default)]
    pub message: Option<String>,
    /// Candidate the backend applied the decision to.
    #[serde(default)]
    pub candidate_id: Option<String>,
}
