//! Deterministic capability stubs shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use riskgraph_core::{
    AnalysisCapability, AnalysisRequest, CapabilityError, CapabilityResult, OutputShape, Pause,
};
use serde_json::{json, Value};

/// Answers every request with a well-formed payload for its shape, unless
/// the request label was scripted to fail or to be throttled first.
#[derive(Default)]
pub struct ScriptedCapability {
    requests: Mutex<Vec<AnalysisRequest>>,
    rejected: HashSet<String>,
    throttled: Mutex<HashMap<String, u32>>,
    throttle_message: String,
    extra_links: Vec<Value>,
}

impl ScriptedCapability {
    pub fn new() -> Self {
        Self {
            throttle_message: "429 RESOURCE_EXHAUSTED".to_string(),
            ..Self::default()
        }
    }

    /// Requests labelled `label` fail with a non-retryable rejection.
    pub fn reject(mut self, label: &str) -> Self {
        self.rejected.insert(label.to_string());
        self
    }

    /// The first `times` requests labelled `label` are rate limited.
    pub fn throttle(self, label: &str, times: u32) -> Self {
        self.throttled
            .lock()
            .unwrap()
            .insert(label.to_string(), times);
        self
    }

    pub fn throttle_message(mut self, message: &str) -> Self {
        self.throttle_message = message.to_string();
        self
    }

    /// Additional raw links appended to every synthesized graph.
    pub fn with_links(mut self, links: Vec<Value>) -> Self {
        self.extra_links = links;
        self
    }

    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn calls_for(&self, label: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.label == label)
            .count()
    }

    pub fn calls_for_shape(&self, shape: OutputShape) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.shape == shape)
            .count()
    }

    fn payload(&self, request: &AnalysisRequest) -> Value {
        match request.shape {
            OutputShape::RiskFinding => json!({
                "risk_title": format!("{} finding", request.label),
                "description": format!("{} exposure", request.label),
                "risk_category": [request.label],
                "severity": "Medium",
                "mitigation": "Hedge",
                "impact": "Margin pressure",
                "citations": [{"title": "Annual report", "url": "https://example.com/ar.pdf"}]
            }),
            OutputShape::EsgFinding => json!({
                "esg_category": request.label,
                "description": format!("- {} disclosure", request.label),
                "citations": []
            }),
            OutputShape::DependencyGraph => {
                let count = request.prompt.matches("\"id\":").count() as u32;
                let nodes: Vec<Value> = (1..=count)
                    .map(|id| json!({"id": id, "name": format!("Risk {id}"), "description": "linked"}))
                    .collect();
                let mut links: Vec<Value> = (2..=count)
                    .map(|id| json!({"source": id, "target": 1}))
                    .collect();
                links.extend(self.extra_links.iter().cloned());
                json!({"nodes": nodes, "links": links})
            }
        }
    }
}

#[async_trait]
impl AnalysisCapability for ScriptedCapability {
    async fn generate(&self, request: &AnalysisRequest) -> CapabilityResult<Value> {
        self.requests.lock().unwrap().push(request.clone());

        if self.rejected.contains(&request.label) {
            return Err(CapabilityError::Rejected {
                status: 400,
                message: format!("{} refused", request.label),
            });
        }

        {
            let mut throttled = self.throttled.lock().unwrap();
            if let Some(remaining) = throttled.get_mut(&request.label) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(CapabilityError::rate_limited(self.throttle_message.clone()));
                }
            }
        }

        Ok(self.payload(request))
    }
}

/// Records every requested wait instead of sleeping.
#[derive(Default)]
pub struct RecordingPause {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }

    /// Waits longer than pacing, i.e. back-off waits.
    pub fn waits_over(&self, floor: Duration) -> Vec<Duration> {
        self.waits().into_iter().filter(|w| *w > floor).collect()
    }
}

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}
