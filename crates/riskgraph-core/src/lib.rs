//! Riskgraph Core Library
//!
//! Orchestration for entity risk profiling: a stage graph that fans risk and
//! ESG category analyses out to a generative capability, tolerates rate
//! limiting, and synthesizes a dependency graph from the aggregated risks.

pub mod analysis;
pub mod capability;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod oplog;
pub mod pipeline;
pub mod retry;
pub mod synthesis;
pub mod telemetry;

pub use analysis::{current_financial_year, financial_year, EsgAnalyst, RiskAnalyst};

pub use capability::{
    decode, AnalysisCapability, AnalysisRequest, CapabilityError, CapabilityResult, Conform,
    GroundedText, GroundingSearch, OutputShape, RateLimitSignal,
};

pub use config::PipelineConfig;

pub use dispatch::{
    CategoryCompletion, CategoryDispatcher, CategoryFailure, CategoryTask, DispatchConfig,
    DispatchError, DispatchReport, DispatchResult,
};

pub use domain::{
    Citation, DependencyGraph, EntityName, EsgFinding, EsgPillar, PipelineState, RiskCategory,
    RiskFinding, RiskLink, RiskNode, Severity, ValidationError,
};

pub use obs::{ObservabilityPort, StageEvent, StageTransition, TracingObserver};
pub use oplog::{needs_rotation, OperationalLog};

pub use pipeline::{
    PipelineError, PipelineResult, PipelineRun, RiskPipeline, RunStatus, StageFailure, StageGraph,
    StageId, StageReport, StageStatus,
};

pub use retry::{
    parse_retry_delay, retry_async, retry_blocking, Backoff, Pause, RetryAttempt, RetryClassify,
    RetryPolicy, ThreadPause,
};

pub use synthesis::DependencyGraphSynthesizer;

pub use metrics::METRICS;
pub use telemetry::init_tracing;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
