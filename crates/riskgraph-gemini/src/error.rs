//! Error types for the Gemini adapter setup.
//!
//! Failures of individual calls are reported as
//! [`CapabilityError`](riskgraph_core::CapabilityError); these errors only
//! cover building a client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeminiError {
    /// Neither `GEMINI_API_KEY` nor `GOOGLE_API_KEY` is set.
    #[error("no API key configured (set GEMINI_API_KEY or GOOGLE_API_KEY)")]
    MissingApiKey,

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        GeminiError::Http(err.to_string())
    }
}

/// Result type for adapter setup.
pub type GeminiResult<T> = std::result::Result<T, GeminiError>;
