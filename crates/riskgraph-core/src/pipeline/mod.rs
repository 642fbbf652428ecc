//! Stage graph pipeline.
//!
//! - [`stage`]: `StageId`, `StageStatus`
//! - [`graph`]: `StageGraph` ordering and failure propagation
//! - [`runner`]: `RiskPipeline`, `PipelineRun`
//! - [`error`]: `PipelineError`, `StageFailure`

pub mod error;
pub mod graph;
pub mod runner;
pub mod stage;

pub use error::{PipelineError, PipelineResult, StageFailure};
pub use graph::StageGraph;
pub use runner::{PipelineRun, RiskPipeline, RunStatus, StageReport};
pub use stage::{StageId, StageStatus};
