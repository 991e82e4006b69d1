//! Domain models for pipeline stages, results, and human decisions.

pub mod decision;
pub mod results;
pub mod stage;

pub use decision::{Decision, DecisionAck, DecisionRequest, DecisionStatus, HrDecision};
pub use results::{EvaluationBundle, RankingEntry, ResultSet};
pub use stage::{PipelineStage, StageProgress, MAX_STAGE, STAGES};
