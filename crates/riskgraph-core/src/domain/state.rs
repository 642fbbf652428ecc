//! Pipeline state and the validated entity name that seeds it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::ValidationError;
use crate::domain::finding::{EsgFinding, RiskFinding};
use crate::domain::graph::DependencyGraph;

/// A validated, non-empty entity name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityName(String);

impl EntityName {
    /// Validate a raw string. Whitespace-only names count as empty.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyEntityName);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Validate an untyped input value, e.g. a decoded request body field.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::String(s) => Self::parse(s),
            other => Err(ValidationError::NotAString {
                kind: json_kind(other).to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Aggregated output of one pipeline run.
///
/// Each stage owns exactly one field. A stage that produced nothing leaves its
/// field empty rather than absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub entity_name: String,
    pub risk_findings: Vec<RiskFinding>,
    pub esg_findings: Vec<EsgFinding>,
    pub dependency_graph: DependencyGraph,
}

impl PipelineState {
    pub fn new(entity: &EntityName) -> Self {
        Self {
            entity_name: entity.as_str().to_string(),
            risk_findings: Vec::new(),
            esg_findings: Vec::new(),
            dependency_graph: DependencyGraph::default(),
        }
    }
}
