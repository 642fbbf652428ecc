//! Risk-domain category subtask.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::analysis::{invoke_blocking, prompts};
use crate::capability::{AnalysisCapability, AnalysisRequest, CapabilityResult, OutputShape};
use crate::dispatch::CategoryTask;
use crate::domain::{RiskCategory, RiskFinding};

/// Produces one [`RiskFinding`] per risk category.
pub struct RiskAnalyst {
    capability: Arc<dyn AnalysisCapability>,
    runtime: Handle,
    financial_year: String,
}

impl RiskAnalyst {
    pub fn new(capability: Arc<dyn AnalysisCapability>, runtime: Handle, financial_year: String) -> Self {
        Self {
            capability,
            runtime,
            financial_year,
        }
    }

    pub fn request(&self, category: RiskCategory, entity: &str) -> AnalysisRequest {
        AnalysisRequest::new(
            category.label(),
            prompts::risk_request(category, entity, &self.financial_year),
            OutputShape::RiskFinding,
        )
        .grounded()
    }
}

impl CategoryTask<RiskCategory> for RiskAnalyst {
    type Output = RiskFinding;

    fn execute(&self, category: &RiskCategory, entity: &str) -> CapabilityResult<RiskFinding> {
        invoke_blocking(&self.runtime, &self.capability, self.request(*category, entity))
    }
}
