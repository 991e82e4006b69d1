//! Screening run lifecycle and stage tracking.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::result_store::ResultStore;
use crate::models::{PipelineStage, MAX_STAGE};
use crate::stream::{StreamEvent, StreamRecord};
use crate::AppError;

/// Message recorded when a stream closes without delivering results.
pub const INCOMPLETE_STREAM_MESSAGE: &str = "stream closed before results were delivered";

/// Lifecycle status of the screening session.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No run has started.
    #[default]
    Idle,
    /// A run is consuming the stream.
    Running,
    /// The last run delivered results and closed cleanly.
    Completed,
    /// The last run failed.
    Errored,
}

impl SessionState {
    /// Whether the state is `Completed` or `Errored`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }
}

/// Whether the caller should keep feeding records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep consuming the stream.
    Continue,
    /// Stop consuming; the rest of the stream is ignored.
    Halt,
}

/// State machine driven by decoded stream records.
///
/// Stage indices are clamped into `0..=MAX_STAGE` and never move backward
/// within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStateMachine {
    state: SessionState,
    stage: u8,
    error: Option<AppError>,
    delivered_results: bool,
}

impl SessionStateMachine {
    /// Create an idle machine at stage 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `Running` from any state, clearing stage, error and results flag.
    pub fn begin(&mut self) {
        self.state = SessionState::Running;
        self.stage = 0;
        self.error = None;
        self.delivered_results = false;
    }

    /// Apply one decoded record, committing results into `store`.
    ///
    /// Records arriving while the machine is not `Running` are ignored.
    pub fn apply(&mut self, record: StreamRecord, store: &mut ResultStore) -> Flow {
        if self.state != SessionState::Running {
            debug!(state = ?self.state, "ignoring record outside a running session");
            return Flow::Halt;
        }

        for event in record.into_events() {
            match event {
                StreamEvent::Failed(message) => {
                    warn!(error = %message, "pipeline reported an error");
                    self.fail(AppError::Pipeline(message));
                    return Flow::Halt;
                }
                StreamEvent::Stage { index, status } => self.advance(index, status.as_deref()),
                StreamEvent::Results(results) => {
                    info!(candidates = results.ranking.len(), "results committed");
                    store.set_results(results);
                    self.delivered_results = true;
                }
            }
        }
        Flow::Continue
    }

    /// Move to stage `index`, clamped; regressions are ignored.
    pub fn advance(&mut self, index: i64, status: Option<&str>) {
        let stage = PipelineStage::clamped(index);
        if i64::from(stage.index) != index {
            debug!(index, clamped = stage.index, "stage index out of range, clamping");
        }
        if stage.index < self.stage {
            debug!(
                index = stage.index,
                current = self.stage,
                "ignoring stage regression"
            );
            return;
        }
        if stage.index != self.stage {
            info!(stage = stage.index, label = stage.label, status, "stage advanced");
        }
        self.stage = stage.index;
    }

    /// Enter `Errored` carrying `error`.
    pub fn fail(&mut self, error: AppError) {
        self.state = SessionState::Errored;
        self.error = Some(error);
    }

    /// Handle a clean end of stream.
    ///
    /// `Completed` when results were delivered, otherwise `Errored` with
    /// [`INCOMPLETE_STREAM_MESSAGE`]. No-op unless `Running`.
    pub fn finish(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        if self.delivered_results {
            info!("screening run completed");
            self.state = SessionState::Completed;
        } else {
            warn!("screening stream ended without results");
            self.fail(AppError::Pipeline(INCOMPLETE_STREAM_MESSAGE.into()));
        }
    }

    /// Mark a result set recovered from the backend as a completed run.
    pub fn restore_completed(&mut self) {
        self.state = SessionState::Completed;
        self.stage = MAX_STAGE;
        self.error = None;
        self.delivered_results = true;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current stage index.
    #[must_use]
    pub fn stage_index(&self) -> u8 {
        self.stage
    }

    /// Current stage descriptor.
    #[must_use]
    pub fn stage(&self) -> &'static PipelineStage {
        PipelineStage::clamped(i64::from(self.stage))
    }

    /// Error that ended the last run, if any.
    #[must_use]
    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    /// Message of the error that ended the last run, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(AppError::message)
    }
}
