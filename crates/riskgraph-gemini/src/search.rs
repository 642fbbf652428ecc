//! Google Search grounding.
//!
//! A free-text `generateContent` call with the `google_search` tool. Every
//! web grounding chunk becomes a citation candidate that is kept only if a
//! HEAD request (redirects followed) answers with a status below 400 within
//! the citation timeout. Candidates are checked concurrently.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use riskgraph_core::{CapabilityResult, Citation, GroundedText, GroundingSearch};
use tracing::{debug, info, instrument};

use crate::api::generate_content;
use crate::config::GeminiConfig;
use crate::wire::{GenerateContentRequest, WebChunk};

pub struct GoogleSearchGrounding {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GoogleSearchGrounding {
    pub fn new(http: reqwest::Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl GroundingSearch for GoogleSearchGrounding {
    #[instrument(skip_all)]
    async fn search(&self, prompt: &str) -> CapabilityResult<GroundedText> {
        let body = GenerateContentRequest::grounded_search(prompt);
        let response = generate_content(&self.http, &self.config, &body).await?;

        let chunks = response.web_chunks();
        let offered = chunks.len();
        let citations = resolve_citations(&self.http, chunks, self.config.citation_timeout).await;
        info!(
            offered = offered,
            verified = citations.len(),
            "grounding citations resolved"
        );

        Ok(GroundedText {
            text: response.text().unwrap_or_default(),
            citations,
        })
    }
}

/// Check every chunk concurrently and keep the reachable ones, in input order.
pub async fn resolve_citations(
    http: &reqwest::Client,
    chunks: Vec<WebChunk>,
    timeout: Duration,
) -> Vec<Citation> {
    let checks = chunks
        .into_iter()
        .map(|chunk| resolve_citation(http, chunk, timeout));
    join_all(checks).await.into_iter().flatten().collect()
}

/// HEAD `chunk.uri`; the citation carries the final URL after redirects.
async fn resolve_citation(
    http: &reqwest::Client,
    chunk: WebChunk,
    timeout: Duration,
) -> Option<Citation> {
    match http.head(&chunk.uri).timeout(timeout).send().await {
        Ok(response) if response.status().as_u16() < 400 => {
            Some(Citation::new(chunk.title, response.url().as_str()))
        }
        Ok(response) => {
            debug!(status = response.status().as_u16(), "citation rejected");
            None
        }
        Err(e) => {
            debug!(error = %e.without_url(), "citation unreachable");
            None
        }
    }
}
