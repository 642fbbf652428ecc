//! Pipeline configuration.
//!
//! Defaults mirror production behaviour: one worker per dispatcher, 7 s
//! pacing for risk categories, none for ESG pillars, six attempts per retry
//! loop. Environment variables override the defaults:
//!
//! | Variable                 | Effect                                  |
//! |--------------------------|-----------------------------------------|
//! | `RISKGRAPH_WORKERS`      | worker pool size of both dispatchers    |
//! | `RISKGRAPH_PACING_SECS`  | pacing before each risk category call   |
//! | `RISKGRAPH_MAX_ATTEMPTS` | attempt budget of both retry policies   |

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::dispatch::DispatchConfig;
use crate::retry::RetryPolicy;

pub const ENV_WORKERS: &str = "RISKGRAPH_WORKERS";
pub const ENV_PACING_SECS: &str = "RISKGRAPH_PACING_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "RISKGRAPH_MAX_ATTEMPTS";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub risk_dispatch: DispatchConfig,
    pub esg_dispatch: DispatchConfig,
    /// Policy used inside each category subtask.
    pub category_retry: RetryPolicy,
    /// Policy wrapping the synthesis call.
    pub stage_retry: RetryPolicy,
    /// Fixed financial year label; the current one is computed when `None`.
    pub financial_year: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            risk_dispatch: DispatchConfig::risk(),
            esg_dispatch: DispatchConfig::esg(),
            category_retry: RetryPolicy::category(),
            stage_retry: RetryPolicy::stage(),
            financial_year: None,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`. Unparseable values are logged and
    /// ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(workers) = parse_var::<usize>(&lookup, ENV_WORKERS) {
            config = config.with_workers(workers);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_PACING_SECS) {
            config = config.with_risk_pacing(Duration::from_secs(secs));
        }
        if let Some(attempts) = parse_var::<u32>(&lookup, ENV_MAX_ATTEMPTS) {
            config = config.with_max_attempts(attempts);
        }
        config
    }

    /// Worker pool size for both dispatchers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.risk_dispatch = self.risk_dispatch.with_workers(workers);
        self.esg_dispatch = self.esg_dispatch.with_workers(workers);
        self
    }

    pub fn with_risk_pacing(mut self, pacing: Duration) -> Self {
        self.risk_dispatch = self.risk_dispatch.with_pacing(pacing);
        self
    }

    pub fn with_esg_pacing(mut self, pacing: Duration) -> Self {
        self.esg_dispatch = self.esg_dispatch.with_pacing(pacing);
        self
    }

    /// Attempt budget for both the category and the stage retry policy.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.category_retry = self.category_retry.with_max_attempts(max_attempts);
        self.stage_retry = self.stage_retry.with_max_attempts(max_attempts);
        self
    }

    pub fn with_category_retry(mut self, policy: RetryPolicy) -> Self {
        self.category_retry = policy;
        self
    }

    pub fn with_stage_retry(mut self, policy: RetryPolicy) -> Self {
        self.stage_retry = policy;
        self
    }

    pub fn with_financial_year(mut self, financial_year: impl Into<String>) -> Self {
        self.financial_year = Some(financial_year.into());
        self
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key = %key, value = %raw, "ignoring unparseable configuration value");
            None
        }
    }
}
