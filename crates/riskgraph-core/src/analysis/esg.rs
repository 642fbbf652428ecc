//! ESG-domain category subtask.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::analysis::{invoke_blocking, prompts};
use crate::capability::{AnalysisCapability, AnalysisRequest, CapabilityResult, OutputShape};
use crate::dispatch::CategoryTask;
use crate::domain::{EsgFinding, EsgPillar};

/// Produces one [`EsgFinding`] per ESG pillar.
pub struct EsgAnalyst {
    capability: Arc<dyn AnalysisCapability>,
    runtime: Handle,
    financial_year: String,
}

impl EsgAnalyst {
    pub fn new(capability: Arc<dyn AnalysisCapability>, runtime: Handle, financial_year: String) -> Self {
        Self {
            capability,
            runtime,
            financial_year,
        }
    }

    pub fn request(&self, pillar: EsgPillar, entity: &str) -> AnalysisRequest {
        AnalysisRequest::new(
            pillar.label(),
            prompts::esg_request(pillar, entity, &self.financial_year),
            OutputShape::EsgFinding,
        )
        .grounded()
    }
}

impl CategoryTask<EsgPillar> for EsgAnalyst {
    type Output = EsgFinding;

    fn execute(&self, pillar: &EsgPillar, entity: &str) -> CapabilityResult<EsgFinding> {
        let finding: EsgFinding =
            invoke_blocking(&self.runtime, &self.capability, self.request(*pillar, entity))?;
        if finding.category != *pillar {
            tracing::debug!(
                requested = %pillar,
                returned = ?finding.category,
                "ESG payload labelled with a different pillar"
            );
        }
        Ok(finding)
    }
}
