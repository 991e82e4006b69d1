//! Write-through submission of human decisions.

use tracing::{debug, info, warn};

use super::snapshot::SharedSession;
use crate::client::BackendClient;
use crate::models::{Decision, DecisionAck, DecisionRequest};
use crate::{AppError, Result};

/// Sends decisions to the backend and merges acknowledgements into the
/// session's result store.
///
/// Nothing is written locally until the backend acknowledges.
#[derive(Debug, Clone)]
pub struct DecisionSync {
    client: BackendClient,
    session: SharedSession,
}

impl DecisionSync {
    /// Bind a decision sync to a client and the session it writes into.
    #[must_use]
    pub fn new(client: BackendClient, session: SharedSession) -> Self {
        Self { client, session }
    }

    /// Submit `decision` for `candidate_id` and merge the acknowledged record.
    ///
    /// The merge is skipped when the candidate is not in the current result
    /// set (for example after a new run reset the store); the acknowledgement
    /// is still returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DecisionSubmission` when the request fails or the
    /// backend rejects it. The result store is left unchanged.
    pub async fn submit(
        &self,
        candidate_id: &str,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<DecisionAck> {
        let request = DecisionRequest {
            candidate_id: candidate_id.to_owned(),
            decision,
            notes,
        };

        let ack = self.client.submit_decision(&request).await.map_err(|err| {
            warn!(candidate_id, %err, "hr decision submission failed");
            AppError::DecisionSubmission(err.message().to_owned())
        })?;

        let merged = self.session.update(|snap| {
            snap.store
                .merge_decision(candidate_id, ack.hr_decision.clone())
        });
        if merged {
            info!(candidate_id, %decision, "hr decision recorded");
        } else {
            debug!(
                candidate_id,
                "hr decision acknowledged for a candidate outside the current results"
            );
        }
        Ok(ack)
    }
}
