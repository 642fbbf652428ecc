//! Structured observability hooks for pipeline stage transitions.
//!
//! This module provides:
//! - The [`ObservabilityPort`] trait, injected into the pipeline at construction
//! - [`TracingObserver`], which logs every transition as an `info!` event
//! - Emission functions for run start and finish
//!
//! Stage events are relayed to observers through an unbounded channel drained
//! by a background task, so emitting an event never blocks a stage.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::pipeline::StageId;

/// What happened to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTransition {
    Started,
    Succeeded,
    Failed,
}

impl fmt::Display for StageTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageTransition::Started => "started",
            StageTransition::Succeeded => "succeeded",
            StageTransition::Failed => "failed",
        })
    }
}

/// One stage transition within one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageEvent {
    pub run_id: String,
    pub stage: StageId,
    pub transition: StageTransition,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StageEvent {
    pub fn new(run_id: impl Into<String>, stage: StageId, transition: StageTransition) -> Self {
        Self {
            run_id: run_id.into(),
            stage,
            transition,
            timestamp: Utc::now(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Receives stage events. Implementations must not block for long; they run
/// on the relay task, not on the stage.
pub trait ObservabilityPort: Send + Sync {
    fn record(&self, event: &StageEvent);
}

/// Logs stage events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ObservabilityPort for TracingObserver {
    fn record(&self, event: &StageEvent) {
        info!(
            event = "stage.transition",
            run_id = %event.run_id,
            stage = %event.stage,
            transition = %event.transition,
            detail = event.detail.as_deref().unwrap_or(""),
        );
    }
}

/// Fire-and-forget delivery of stage events to a set of observers.
pub(crate) struct EventRelay {
    tx: mpsc::UnboundedSender<StageEvent>,
    drain: JoinHandle<()>,
}

impl EventRelay {
    pub(crate) fn start(observers: Vec<Arc<dyn ObservabilityPort>>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<StageEvent>();
        let drain = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for observer in &observers {
                    observer.record(&event);
                }
            }
        });
        Self { tx, drain }
    }

    pub(crate) fn emit(&self, event: StageEvent) {
        if self.tx.send(event).is_err() {
            debug!("event relay closed, stage event dropped");
        }
    }

    /// Stop accepting events and wait until every queued event is delivered.
    pub(crate) async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.drain.await {
            debug!(error = %e, "event relay task ended abnormally");
        }
    }
}

/// Emit event: run started for an entity.
pub fn emit_run_started(run_id: &str, entity: &str) {
    info!(event = "run.started", run_id = %run_id, entity = %entity);
}

/// Emit event: run finished with duration and final status.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, status: &str) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        status = %status,
    );
}
