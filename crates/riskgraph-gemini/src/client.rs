//! [`AnalysisCapability`] backed by Gemini structured output.

use std::sync::Arc;

use async_trait::async_trait;
use riskgraph_core::{
    AnalysisCapability, AnalysisRequest, CapabilityError, CapabilityResult, GroundedText,
    GroundingSearch,
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::api::generate_content;
use crate::config::GeminiConfig;
use crate::error::GeminiResult;
use crate::search::GoogleSearchGrounding;
use crate::wire::GenerateContentRequest;

/// Gemini client for structured analysis requests.
///
/// Grounded requests first run a search through the configured
/// [`GroundingSearch`] and fold its text and verified sources into the
/// prompt; the structured call itself carries no tools.
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
    grounding: Arc<dyn GroundingSearch>,
}

impl GeminiClient {
    /// Create a client that grounds through Google Search.
    pub fn new(config: GeminiConfig) -> GeminiResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("riskgraph-gemini/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let grounding = Arc::new(GoogleSearchGrounding::new(http.clone(), config.clone()));
        Ok(Self {
            http,
            config,
            grounding,
        })
    }

    /// Create client from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Replace the grounding capability.
    pub fn with_grounding(mut self, grounding: Arc<dyn GroundingSearch>) -> Self {
        self.grounding = grounding;
        self
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl AnalysisCapability for GeminiClient {
    #[instrument(skip_all, fields(label = %request.label, shape = %request.shape))]
    async fn generate(&self, request: &AnalysisRequest) -> CapabilityResult<Value> {
        let prompt = if request.grounded {
            let grounded = self.grounding.search(&request.prompt).await?;
            debug!(citations = grounded.citations.len(), "grounding context attached");
            with_grounding(&request.prompt, &grounded)
        } else {
            request.prompt.clone()
        };

        let body = GenerateContentRequest::structured(&prompt, request.shape.response_schema());
        let response = generate_content(&self.http, &self.config, &body).await?;

        let text = response
            .text()
            .ok_or_else(|| CapabilityError::SchemaViolation {
                shape: request.shape.name().to_string(),
                detail: "response has no text candidate".to_string(),
            })?;

        serde_json::from_str(&text).map_err(|e| CapabilityError::SchemaViolation {
            shape: request.shape.name().to_string(),
            detail: format!("response is not JSON: {e}"),
        })
    }
}

/// Append search findings and verified sources to `prompt`.
fn with_grounding(prompt: &str, grounded: &GroundedText) -> String {
    let mut out = String::from(prompt);
    out.push_str("\n\nSEARCH FINDINGS:\n");
    out.push_str(grounded.text.trim());
    out.push_str("\n\nVERIFIED SOURCES (cite only these):\n");
    if grounded.citations.is_empty() {
        out.push_str("- none\n");
    }
    for citation in &grounded.citations {
        out.push_str(&format!("- {} <{}>\n", citation.title, citation.url));
    }
    out
}
