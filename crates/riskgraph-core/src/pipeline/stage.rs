//! Stage identifiers and lifecycle status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named stages of the risk profiling pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Entry stage: validates the entity name.
    Start,
    RiskAnalysis,
    EsgAnalysis,
    /// Depends on `RiskAnalysis` only.
    DependencyGraph,
}

impl StageId {
    pub const ALL: [StageId; 4] = [
        StageId::Start,
        StageId::RiskAnalysis,
        StageId::EsgAnalysis,
        StageId::DependencyGraph,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageId::Start => "start",
            StageId::RiskAnalysis => "risk_analysis",
            StageId::EsgAnalysis => "esg_analysis",
            StageId::DependencyGraph => "dependency_graph",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `Pending → Running → {Succeeded, Failed}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed { reason: String },
}

impl StageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageStatus::Succeeded | StageStatus::Failed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageStatus::Failed { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            StageStatus::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Pending => f.write_str("pending"),
            StageStatus::Running => f.write_str("running"),
            StageStatus::Succeeded => f.write_str("succeeded"),
            StageStatus::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}
