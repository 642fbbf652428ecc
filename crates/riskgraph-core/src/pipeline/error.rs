//! Error types for the stage graph.

use serde::Serialize;

use crate::domain::ValidationError;
use crate::pipeline::stage::StageId;

/// Errors that stop a pipeline run before it produces a state.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid stage graph: {reason}")]
    InvalidStageGraph { reason: String },
}

/// A stage that reached `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("stage {stage} failed: {reason}")]
pub struct StageFailure {
    pub stage: StageId,
    pub reason: String,
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
