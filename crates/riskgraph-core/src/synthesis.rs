//! Dependency-graph synthesis from aggregated risk findings.
//!
//! The synthesizer assigns every finding a dense id (1-based, input order),
//! strips citations, asks the capability for relationships in exactly one
//! call wrapped in the suspendable retry mode, and reconciles the answer
//! against the assigned ids. Links that reference unknown ids are dropped.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::analysis::prompts;
use crate::capability::{
    decode, AnalysisCapability, AnalysisRequest, CapabilityError, CapabilityResult, Conform,
    OutputShape,
};
use crate::domain::{DependencyGraph, RiskCategory, RiskFinding, RiskLink, RiskNode, Severity};
use crate::retry::{retry_async, RetryPolicy};

/// Label attached to synthesis requests.
pub const SYNTHESIS_LABEL: &str = "dependency_graph";

/// A finding as sent for synthesis. Has no citation field by construction.
#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    id: u32,
    risk_title: &'a str,
    description: &'a str,
    risk_category: &'a BTreeSet<RiskCategory>,
    severity: Severity,
    mitigation: &'a str,
    impact: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphPayload {
    nodes: Vec<RiskNode>,
    /// Kept raw so one malformed link is dropped instead of failing the payload.
    #[serde(default)]
    links: Vec<Value>,
}

impl Conform for GraphPayload {
    fn conform(&self) -> Result<(), String> {
        let mut ids = BTreeSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id) {
                return Err(format!("node id {} appears more than once", node.id));
            }
        }
        Ok(())
    }
}

pub struct DependencyGraphSynthesizer {
    capability: Arc<dyn AnalysisCapability>,
    retry: RetryPolicy,
}

impl DependencyGraphSynthesizer {
    pub fn new(capability: Arc<dyn AnalysisCapability>, retry: RetryPolicy) -> Self {
        Self { capability, retry }
    }

    /// Frame the synthesis request for `findings`.
    pub fn frame(findings: &[RiskFinding]) -> CapabilityResult<AnalysisRequest> {
        let inputs: Vec<SynthesisInput<'_>> = findings
            .iter()
            .zip(1u32..)
            .map(|(f, id)| SynthesisInput {
                id,
                risk_title: &f.title,
                description: &f.description,
                risk_category: &f.categories,
                severity: f.severity,
                mitigation: &f.mitigation,
                impact: &f.impact,
            })
            .collect();

        let json = serde_json::to_string_pretty(&inputs)
            .map_err(|e| CapabilityError::Encoding(e.to_string()))?;

        Ok(AnalysisRequest::new(
            SYNTHESIS_LABEL,
            prompts::synthesis_request(&json),
            OutputShape::DependencyGraph,
        ))
    }

    /// Produce the dependency graph for `findings`.
    ///
    /// An empty input yields an empty graph without calling the capability.
    /// Exhausted retries surface the last rate-limit signal.
    #[instrument(skip(self, findings), fields(findings = findings.len()))]
    pub async fn synthesize(&self, findings: &[RiskFinding]) -> CapabilityResult<DependencyGraph> {
        if findings.is_empty() {
            return Ok(DependencyGraph::default());
        }

        let request = Self::frame(findings)?;
        let capability = &self.capability;
        let request_ref = &request;

        let value = retry_async(&self.retry, SYNTHESIS_LABEL, move |_| async move {
            capability.generate(request_ref).await
        })
        .await?;

        let payload: GraphPayload = decode(OutputShape::DependencyGraph, value)?;
        let graph = reconcile(findings, payload);
        info!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "dependency graph synthesized"
        );
        Ok(graph)
    }
}

/// Rebuild the graph around the ids assigned to `findings`.
///
/// Node text comes from the payload when it names an assigned id, otherwise
/// from the finding itself. Payload nodes with unassigned ids are ignored.
fn reconcile(findings: &[RiskFinding], payload: GraphPayload) -> DependencyGraph {
    let mut by_id: HashMap<u32, RiskNode> = payload.nodes.into_iter().map(|n| (n.id, n)).collect();

    let nodes: Vec<RiskNode> = findings
        .iter()
        .zip(1u32..)
        .map(|(finding, id)| match by_id.remove(&id) {
            Some(node) if !node.name.trim().is_empty() => RiskNode {
                id,
                name: node.name,
                description: node.description,
            },
            _ => RiskNode {
                id,
                name: finding.title.clone(),
                description: finding.description.clone(),
            },
        })
        .collect();

    if !by_id.is_empty() {
        debug!(ignored = by_id.len(), "payload named nodes outside the assigned ids");
    }

    let offered = payload.links.len();
    let links: Vec<RiskLink> = payload
        .links
        .into_iter()
        .filter_map(|raw| RiskLink::deserialize(raw).ok())
        .collect();
    let graph = DependencyGraph::from_parts(nodes, links);
    if graph.links.len() < offered {
        debug!(
            dropped = offered - graph.links.len(),
            "dropped links that do not resolve"
        );
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Citation;

    fn finding(title: &str) -> RiskFinding {
        RiskFinding {
            title: title.to_string(),
            description: format!("{title} description"),
            categories: [RiskCategory::Operational].into_iter().collect(),
            severity: Severity::High,
            mitigation: "m".to_string(),
            impact: "i".to_string(),
            citations: vec![Citation::new("secret source", "https://cited.example/doc")],
        }
    }

    #[test]
    fn test_frame_assigns_dense_ids_and_strips_citations() {
        let request =
            DependencyGraphSynthesizer::frame(&[finding("a"), finding("b"), finding("c")]).unwrap();
        assert_eq!(request.shape, OutputShape::DependencyGraph);
        assert!(!request.grounded);
        assert!(request.prompt.contains("\"id\": 1"));
        assert!(request.prompt.contains("\"id\": 3"));
        assert!(!request.prompt.contains("\"id\": 4"));
        assert!(!request.prompt.contains("citations\":"));
        assert!(!request.prompt.contains("cited.example"));
    }

    #[test]
    fn test_reconcile_falls_back_to_finding_text() {
        let payload = GraphPayload {
            nodes: vec![
                RiskNode {
                    id: 2,
                    name: "Short B".to_string(),
                    description: "B links to A".to_string(),
                },
                RiskNode {
                    id: 7,
                    name: "phantom".to_string(),
                    description: String::new(),
                },
            ],
            links: vec![
                serde_json::json!({"source": 2, "target": 1}),
                serde_json::json!({"source": 7, "target": 1}),
                serde_json::json!({"source": 2, "target": 1}),
                serde_json::json!({"source": -1, "target": 1}),
                serde_json::json!({"source": "2", "target": 1}),
                serde_json::json!({"source": 1}),
            ],
        };

        let graph = reconcile(&[finding("a"), finding("b")], payload);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].name, "a");
        assert_eq!(graph.nodes[1].name, "Short B");
        assert_eq!(graph.links, vec![RiskLink::new(2, 1)]);
        assert!(graph.is_referentially_sound());
    }

    #[test]
    fn test_payload_with_duplicate_node_ids_is_rejected() {
        let payload = GraphPayload {
            nodes: vec![
                RiskNode {
                    id: 1,
                    name: "x".to_string(),
                    description: String::new(),
                },
                RiskNode {
                    id: 1,
                    name: "y".to_string(),
                    description: String::new(),
                },
            ],
            links: vec![],
        };
        assert!(payload.conform().is_err());
    }
}
