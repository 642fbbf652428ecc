//! Category analysis subtasks.
//!
//! [`RiskAnalyst`] and [`EsgAnalyst`] are the [`CategoryTask`]s the pipeline
//! hands to its dispatchers. They frame a grounded request, call the async
//! capability from the blocking worker thread, and decode the payload.
//!
//! [`CategoryTask`]: crate::dispatch::CategoryTask

pub mod esg;
pub mod fiscal;
pub mod prompts;
pub mod risk;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::runtime::Handle;

use crate::capability::{decode, AnalysisCapability, AnalysisRequest, CapabilityResult, Conform};

pub use esg::EsgAnalyst;
pub use fiscal::{current_financial_year, financial_year};
pub use risk::RiskAnalyst;

/// Drive one async capability call to completion from a blocking thread and
/// decode the result.
///
/// Must not be called from inside an async context.
fn invoke_blocking<T>(
    runtime: &Handle,
    capability: &Arc<dyn AnalysisCapability>,
    request: AnalysisRequest,
) -> CapabilityResult<T>
where
    T: DeserializeOwned + Conform,
{
    let value = runtime.block_on(capability.generate(&request))?;
    decode(request.shape, value)
}
