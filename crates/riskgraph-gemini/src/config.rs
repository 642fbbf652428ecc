//! Gemini adapter configuration.

use std::fmt;
use std::time::Duration;

use crate::error::{GeminiError, GeminiResult};

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "GOOGLE_API_KEY";
pub const ENV_MODEL: &str = "RISKGRAPH_MODEL";

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Timeout of one `generateContent` call.
    pub request_timeout: Duration,
    /// Timeout of one citation HEAD check.
    pub citation_timeout: Duration,
}

impl GeminiConfig {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash";
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
    pub const DEFAULT_CITATION_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            citation_timeout: Self::DEFAULT_CITATION_TIMEOUT,
        }
    }

    /// Create a config from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GeminiResult<Self> {
        let api_key = [ENV_API_KEY, ENV_API_KEY_FALLBACK]
            .into_iter()
            .filter_map(&lookup)
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or(GeminiError::MissingApiKey)?;

        let mut config = Self::new(api_key);
        if let Some(model) = lookup(ENV_MODEL).filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_citation_timeout(mut self, timeout: Duration) -> Self {
        self.citation_timeout = timeout;
        self
    }

    /// `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("citation_timeout", &self.citation_timeout)
            .finish()
    }
}
