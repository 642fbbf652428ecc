//! Ports to the external generative service.
//!
//! The core never talks to the service directly. It frames an
//! [`AnalysisRequest`], hands it to an [`AnalysisCapability`], and strictly
//! decodes the returned JSON through [`schema::decode`]. Implementations live
//! outside the core (see the `riskgraph-gemini` crate); tests inject stubs.

pub mod error;
pub mod schema;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::Citation;

pub use error::{CapabilityError, CapabilityResult, RateLimitSignal};
pub use schema::{decode, Conform};

/// Structured-output shape requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputShape {
    RiskFinding,
    EsgFinding,
    DependencyGraph,
}

impl OutputShape {
    pub fn name(&self) -> &'static str {
        match self {
            OutputShape::RiskFinding => "risk_finding",
            OutputShape::EsgFinding => "esg_finding",
            OutputShape::DependencyGraph => "dependency_graph",
        }
    }

    /// JSON response schema (OpenAPI subset) an adapter can pass through to
    /// the service's structured-output mode.
    pub fn response_schema(&self) -> Value {
        let citations = json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "url": {"type": "string"}
                },
                "required": ["title", "url"]
            }
        });

        match self {
            OutputShape::RiskFinding => json!({
                "type": "object",
                "properties": {
                    "risk_title": {"type": "string"},
                    "description": {"type": "string"},
                    "risk_category": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "enum": ["ALL", "Operational Risk", "Credit Risk", "Compliance Risk", "Strategic Risk"]
                        }
                    },
                    "severity": {"type": "string", "enum": ["High", "Medium", "Low"]},
                    "mitigation": {"type": "string"},
                    "impact": {"type": "string"},
                    "citations": citations
                },
                "required": ["risk_title", "description", "risk_category", "severity", "mitigation", "impact", "citations"]
            }),
            OutputShape::EsgFinding => json!({
                "type": "object",
                "properties": {
                    "esg_category": {"type": "string", "enum": ["Environment", "Social", "Governance"]},
                    "description": {"type": "string"},
                    "citations": citations
                },
                "required": ["esg_category", "description", "citations"]
            }),
            OutputShape::DependencyGraph => json!({
                "type": "object",
                "properties": {
                    "nodes": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": {"type": "integer"},
                                "name": {"type": "string"},
                                "description": {"type": "string"}
                            },
                            "required": ["id", "name", "description"]
                        }
                    },
                    "links": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "source": {"type": "integer"},
                                "target": {"type": "integer"}
                            },
                            "required": ["source", "target"]
                        }
                    }
                },
                "required": ["nodes", "links"]
            }),
        }
    }
}

impl std::fmt::Display for OutputShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully-formed request for the analysis capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Subtask label, e.g. a category name. Used for logging and by stubs.
    pub label: String,
    /// Natural-language request text.
    pub prompt: String,
    pub shape: OutputShape,
    /// Whether the capability should ground the answer in web search.
    pub grounded: bool,
}

impl AnalysisRequest {
    pub fn new(label: impl Into<String>, prompt: impl Into<String>, shape: OutputShape) -> Self {
        Self {
            label: label.into(),
            prompt: prompt.into(),
            shape,
            grounded: false,
        }
    }

    pub fn grounded(mut self) -> Self {
        self.grounded = true;
        self
    }
}

/// External generative capability producing structured payloads.
///
/// Implementations return [`CapabilityError::RateLimited`] for throttling and
/// any other variant for permanent failures.
#[async_trait]
pub trait AnalysisCapability: Send + Sync {
    async fn generate(&self, request: &AnalysisRequest) -> CapabilityResult<Value>;
}

/// Synthesized text plus validated citation candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundedText {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// External grounding/search capability.
#[async_trait]
pub trait GroundingSearch: Send + Sync {
    async fn search(&self, prompt: &str) -> CapabilityResult<GroundedText>;
}
