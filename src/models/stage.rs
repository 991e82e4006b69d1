//! Pipeline stage catalogue and progress classification.

use serde::Serialize;

/// One ordered phase of the remote screening pipeline.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PipelineStage {
    /// Zero-based position in [`STAGES`].
    pub index: u8,
    /// Short human-readable name.
    pub label: &'static str,
    /// One-line description shown while the stage is active.
    pub description: &'static str,
}

/// Index of the final stage.
pub const MAX_STAGE: u8 = 8;

/// All pipeline stages in execution order.
pub const STAGES: [PipelineStage; 9] = [
    PipelineStage {
        index: 0,
        label: "System Initialization",
        description: "Setting up recruitment runtime and agent memory...",
    },
    PipelineStage {
        index: 1,
        label: "Data Ingestion",
        description: "Loading candidate resumes and job specifications...",
    },
    PipelineStage {
        index: 2,
        label: "Semantic Indexing",
        description: "Generating vector embeddings for candidate profiles...",
    },
    PipelineStage {
        index: 3,
        label: "Neural Retrieval",
        description: "Performing similarity search across candidate pool...",
    },
    PipelineStage {
        index: 4,
        label: "GitHub Validation",
        description: "Verifying technical evidence and code quality metrics...",
    },
    PipelineStage {
        index: 5,
        label: "Holistic Evaluation",
        description: "Running cross-agent technical assessment node...",
    },
    PipelineStage {
        index: 6,
        label: "Readiness Audit",
        description: "Evaluating production readiness and interview fit...",
    },
    PipelineStage {
        index: 7,
        label: "Skeptic Review",
        description: "Performing adversarial risk audit and risk detection...",
    },
    PipelineStage {
        index: 8,
        label: "Decision Synthesis",
        description: "Aggregating agent insights for final hiring consensus...",
    },
];

/// Where a stage sits relative to the current one.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageProgress {
    /// Stage lies before the current stage.
    Completed,
    /// Stage is the current stage.
    Active,
    /// Stage has not been reached yet.
    Pending,
}

impl PipelineStage {
    /// Look up a stage by index, clamping anything past [`MAX_STAGE`].
    #[must_use]
    pub fn clamped(index: i64) -> &'static Self {
        let idx = usize::try_from(index.clamp(0, i64::from(MAX_STAGE))).unwrap_or(0);
        &STAGES[idx]
    }

    /// Look up a stage by exact index.
    #[must_use]
    pub fn get(index: u8) -> Option<&'static Self> {
        STAGES.get(usize::from(index))
    }

    /// Classify this stage against the `current` stage index.
    #[must_use]
    pub fn progress(&self, current: u8) -> StageProgress {
        match self.index.cmp(&current) {
            std::cmp::Ordering::Less => StageProgress::Completed,
            std::cmp::Ordering::Equal => StageProgress::Active,
            std::cmp::Ordering::Greater => StageProgress::Pending,
        }
    }
}
