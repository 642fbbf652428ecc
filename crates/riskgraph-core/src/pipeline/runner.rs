//! Runs the stage graph for one entity.
//!
//! `start` validates the entity. `risk_analysis` and `esg_analysis` then run
//! concurrently, each fanning out through its own [`CategoryDispatcher`].
//! `dependency_graph` waits for `risk_analysis` inside the risk branch and is
//! skipped when that stage failed. Every transition is relayed to the
//! injected [`ObservabilityPort`]s without blocking the stage.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::analysis::{current_financial_year, EsgAnalyst, RiskAnalyst};
use crate::capability::AnalysisCapability;
use crate::config::PipelineConfig;
use crate::dispatch::{
    CategoryDispatcher, CategoryFailure, CategoryTask, DispatchConfig, DispatchReport,
};
use crate::domain::{
    DependencyGraph, EntityName, EsgFinding, EsgPillar, PipelineState, RiskCategory, RiskFinding,
    ValidationError,
};
use crate::metrics::METRICS;
use crate::obs::{
    emit_run_finished, emit_run_started, EventRelay, ObservabilityPort, StageEvent,
    StageTransition, TracingObserver,
};
use crate::pipeline::error::{PipelineResult, StageFailure};
use crate::pipeline::graph::StageGraph;
use crate::pipeline::stage::{StageId, StageStatus};
use crate::retry::{Pause, ThreadPause};
use crate::synthesis::DependencyGraphSynthesizer;

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every stage succeeded.
    Succeeded,
    /// Only stages without dependents failed.
    PartiallySucceeded,
    /// A stage with dependents failed.
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::PartiallySucceeded => "partially_succeeded",
            RunStatus::Failed => "failed",
        }
    }
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status and timing of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: StageId,
    pub status: StageStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

impl StageReport {
    pub fn failure(&self) -> Option<StageFailure> {
        self.status.reason().map(|reason| StageFailure {
            stage: self.stage,
            reason: reason.to_string(),
        })
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub state: PipelineState,
    /// In topological order.
    pub stages: Vec<StageReport>,
    pub status: RunStatus,
    /// Categories of both dispatchers that produced no finding.
    pub category_failures: Vec<CategoryFailure>,
}

impl PipelineRun {
    pub fn stage(&self, stage: StageId) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn stage_failures(&self) -> Vec<StageFailure> {
        self.stages.iter().filter_map(StageReport::failure).collect()
    }
}

struct StageRecord {
    status: StageStatus,
    started_at: Option<DateTime<Utc>>,
    started: Option<Instant>,
    elapsed: Option<Duration>,
}

/// Per-run stage status, shared by the concurrently running branches.
struct StageTracker<'a> {
    run_id: &'a str,
    graph: &'a StageGraph,
    relay: &'a EventRelay,
    order: Vec<StageId>,
    records: Mutex<BTreeMap<StageId, StageRecord>>,
}

impl<'a> StageTracker<'a> {
    fn new(
        run_id: &'a str,
        graph: &'a StageGraph,
        relay: &'a EventRelay,
        order: Vec<StageId>,
    ) -> Self {
        let records = order
            .iter()
            .map(|stage| {
                (
                    *stage,
                    StageRecord {
                        status: StageStatus::Pending,
                        started_at: None,
                        started: None,
                        elapsed: None,
                    },
                )
            })
            .collect();
        Self {
            run_id,
            graph,
            relay,
            order,
            records: Mutex::new(records),
        }
    }

    /// `true` when `stage` has not run yet and all its predecessors succeeded.
    async fn ready(&self, stage: StageId) -> bool {
        let records = self.records.lock().await;
        let pending = matches!(
            records.get(&stage).map(|r| &r.status),
            Some(StageStatus::Pending)
        );
        pending
            && self.graph.predecessors(stage).iter().all(|p| {
                matches!(
                    records.get(p).map(|r| &r.status),
                    Some(StageStatus::Succeeded)
                )
            })
    }

    async fn start(&self, stage: StageId) {
        let mut records = self.records.lock().await;
        if let Some(record) = records.get_mut(&stage) {
            record.status = StageStatus::Running;
            record.started_at = Some(Utc::now());
            record.started = Some(Instant::now());
        }
        info!(stage = %stage, "stage started");
        self.relay
            .emit(StageEvent::new(self.run_id, stage, StageTransition::Started));
    }

    async fn succeed(&self, stage: StageId) {
        let mut records = self.records.lock().await;
        if let Some(record) = records.get_mut(&stage) {
            record.status = StageStatus::Succeeded;
            record.elapsed = record.started.map(|t| t.elapsed());
        }
        info!(stage = %stage, "stage succeeded");
        self.relay
            .emit(StageEvent::new(self.run_id, stage, StageTransition::Succeeded));
    }

    /// Mark `stage` failed and fail every pending stage downstream of it.
    async fn fail(&self, stage: StageId, reason: String) {
        warn!(stage = %stage, reason = %reason, "stage failed");
        METRICS.inc_stage_failures();

        let mut records = self.records.lock().await;
        if let Some(record) = records.get_mut(&stage) {
            record.status = StageStatus::Failed {
                reason: reason.clone(),
            };
            record.elapsed = record.started.map(|t| t.elapsed());
        }
        self.relay.emit(
            StageEvent::new(self.run_id, stage, StageTransition::Failed).with_detail(reason),
        );

        for downstream in self.graph.downstream_of(stage) {
            let Some(record) = records.get_mut(&downstream) else {
                continue;
            };
            if record.status == StageStatus::Pending {
                let reason = format!("upstream {stage} failed");
                info!(stage = %downstream, reason = %reason, "stage will not run");
                record.status = StageStatus::Failed {
                    reason: reason.clone(),
                };
                self.relay.emit(
                    StageEvent::new(self.run_id, downstream, StageTransition::Failed)
                        .with_detail(reason),
                );
            }
        }
    }

    fn into_reports(self) -> Vec<StageReport> {
        let mut records = self.records.into_inner();
        self.order
            .iter()
            .filter_map(|stage| {
                records.remove(stage).map(|record| StageReport {
                    stage: *stage,
                    status: settle(*stage, record.status),
                    started_at: record.started_at,
                    duration_ms: record.elapsed.map(|d| d.as_millis() as u64),
                })
            })
            .collect()
    }
}

/// A stage still pending or running once the run is over never resolved.
fn settle(stage: StageId, status: StageStatus) -> StageStatus {
    if status.is_terminal() {
        return status;
    }
    warn!(stage = %stage, status = %status, "stage did not resolve");
    StageStatus::Failed {
        reason: format!("stage left {status}"),
    }
}

/// A failed stage with dependents fails the run; any other failure leaves it
/// partially successful.
fn run_status(graph: &StageGraph, reports: &[StageReport]) -> RunStatus {
    let failed: Vec<&StageReport> = reports.iter().filter(|r| r.status.is_failed()).collect();
    if failed.is_empty() {
        RunStatus::Succeeded
    } else if failed.iter().any(|r| !graph.dependents(r.stage).is_empty()) {
        RunStatus::Failed
    } else {
        RunStatus::PartiallySucceeded
    }
}

/// The risk profiling pipeline.
///
/// # Example
///
/// ```ignore
/// let pipeline = RiskPipeline::new(capability, PipelineConfig::from_env())
///     .with_observer(log.clone());
/// let state = pipeline.run("Acme Corp").await?;
/// ```
pub struct RiskPipeline {
    capability: Arc<dyn AnalysisCapability>,
    config: PipelineConfig,
    graph: StageGraph,
    observers: Vec<Arc<dyn ObservabilityPort>>,
    pause: Arc<dyn Pause>,
}

impl RiskPipeline {
    pub fn new(capability: Arc<dyn AnalysisCapability>, config: PipelineConfig) -> Self {
        Self {
            capability,
            config,
            graph: StageGraph::standard(),
            observers: vec![Arc::new(TracingObserver)],
            pause: Arc::new(ThreadPause),
        }
    }

    /// Add an observer for stage transitions.
    pub fn with_observer(mut self, observer: Arc<dyn ObservabilityPort>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Replace the blocking wait used by category subtasks for pacing and
    /// back-off.
    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    /// Run the pipeline and return its final state.
    ///
    /// Fails only on entry validation; stages that produced nothing leave
    /// their field empty.
    pub async fn run(&self, entity_name: &str) -> PipelineResult<PipelineState> {
        Ok(self.run_with_report(entity_name).await?.state)
    }

    /// [`run`](Self::run) for an untyped entity name.
    pub async fn run_value(&self, entity_name: &Value) -> PipelineResult<PipelineState> {
        Ok(self.execute(EntityName::from_value(entity_name)).await?.state)
    }

    /// Run the pipeline and return the state with per-stage reports.
    pub async fn run_with_report(&self, entity_name: &str) -> PipelineResult<PipelineRun> {
        self.execute(EntityName::parse(entity_name)).await
    }

    #[instrument(skip_all, fields(run_id = tracing::field::Empty))]
    async fn execute(
        &self,
        entity: Result<EntityName, ValidationError>,
    ) -> PipelineResult<PipelineRun> {
        let order = self.graph.validate()?;
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());
        let started = Instant::now();

        let relay = EventRelay::start(self.observers.clone());
        let tracker = StageTracker::new(&run_id, &self.graph, &relay, order);

        tracker.start(StageId::Start).await;
        let entity = match entity {
            Ok(entity) => entity,
            Err(err) => {
                tracker.fail(StageId::Start, err.to_string()).await;
                drop(tracker);
                relay.close().await;
                return Err(err.into());
            }
        };
        tracker.succeed(StageId::Start).await;
        emit_run_started(&run_id, entity.as_str());

        let financial_year = self
            .config
            .financial_year
            .clone()
            .unwrap_or_else(current_financial_year);

        let (risk, esg) = tokio::join!(
            self.risk_branch(&entity, &financial_year, &tracker),
            self.esg_branch(&entity, &financial_year, &tracker),
        );
        let (risk_findings, dependency_graph, mut category_failures) = risk;
        let (esg_findings, esg_failures) = esg;
        category_failures.extend(esg_failures);

        let mut state = PipelineState::new(&entity);
        state.risk_findings = risk_findings;
        state.esg_findings = esg_findings;
        state.dependency_graph = dependency_graph;

        let stages = tracker.into_reports();
        let status = run_status(&self.graph, &stages);
        let duration_ms = started.elapsed().as_millis() as u64;

        emit_run_finished(&run_id, duration_ms, status.as_str());
        METRICS.flush();
        relay.close().await;

        Ok(PipelineRun {
            run_id,
            state,
            stages,
            status,
            category_failures,
        })
    }

    /// Risk fan-out followed by synthesis over its findings.
    async fn risk_branch(
        &self,
        entity: &EntityName,
        financial_year: &str,
        tracker: &StageTracker<'_>,
    ) -> (Vec<RiskFinding>, DependencyGraph, Vec<CategoryFailure>) {
        let analyst = Arc::new(RiskAnalyst::new(
            Arc::clone(&self.capability),
            Handle::current(),
            financial_year.to_string(),
        ));
        let (findings, failures) = self
            .analysis_stage(
                StageId::RiskAnalysis,
                tracker,
                &RiskCategory::DISPATCH_ORDER,
                self.config.risk_dispatch.clone(),
                entity,
                analyst,
            )
            .await;

        let graph = self.synthesis_stage(&findings, tracker).await;
        (findings, graph, failures)
    }

    async fn esg_branch(
        &self,
        entity: &EntityName,
        financial_year: &str,
        tracker: &StageTracker<'_>,
    ) -> (Vec<EsgFinding>, Vec<CategoryFailure>) {
        let analyst = Arc::new(EsgAnalyst::new(
            Arc::clone(&self.capability),
            Handle::current(),
            financial_year.to_string(),
        ));
        self.analysis_stage(
            StageId::EsgAnalysis,
            tracker,
            &EsgPillar::DISPATCH_ORDER,
            self.config.esg_dispatch.clone(),
            entity,
            analyst,
        )
        .await
    }

    /// One dispatcher run. A dispatch with no successful category fails the
    /// stage; the field it owns stays empty.
    async fn analysis_stage<C, K>(
        &self,
        stage: StageId,
        tracker: &StageTracker<'_>,
        categories: &[C],
        dispatch: DispatchConfig,
        entity: &EntityName,
        task: Arc<K>,
    ) -> (Vec<K::Output>, Vec<CategoryFailure>)
    where
        C: Clone + Display + Send + Sync + 'static,
        K: CategoryTask<C>,
    {
        if !tracker.ready(stage).await {
            return (Vec::new(), Vec::new());
        }
        tracker.start(stage).await;

        let dispatcher = CategoryDispatcher::new(dispatch, self.config.category_retry.clone())
            .with_pause(Arc::clone(&self.pause));

        match dispatcher.dispatch(categories, entity.as_str(), task).await {
            Ok(DispatchReport {
                completed,
                failures,
            }) => {
                if completed.is_empty() {
                    tracker
                        .fail(stage, format!("all {} categories failed", categories.len()))
                        .await;
                } else {
                    tracker.succeed(stage).await;
                }
                let payloads = completed.into_iter().map(|c| c.payload).collect();
                (payloads, failures)
            }
            Err(err) => {
                tracker.fail(stage, err.to_string()).await;
                (Vec::new(), Vec::new())
            }
        }
    }

    /// Synthesis runs only once `risk_analysis` has succeeded.
    async fn synthesis_stage(
        &self,
        findings: &[RiskFinding],
        tracker: &StageTracker<'_>,
    ) -> DependencyGraph {
        let stage = StageId::DependencyGraph;
        if !tracker.ready(stage).await {
            return DependencyGraph::default();
        }
        tracker.start(stage).await;

        let synthesizer = DependencyGraphSynthesizer::new(
            Arc::clone(&self.capability),
            self.config.stage_retry.clone(),
        );
        match synthesizer.synthesize(findings).await {
            Ok(graph) => {
                tracker.succeed(stage).await;
                graph
            }
            Err(err) => {
                tracker.fail(stage, err.to_string()).await;
                DependencyGraph::default()
            }
        }
    }
}
