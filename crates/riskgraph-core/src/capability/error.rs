//! Errors raised at the external-capability boundary.

use crate::retry::hint::parse_retry_delay;

/// The service is throttling this caller.
///
/// The message is kept verbatim; a server-suggested cool-down, when present,
/// is embedded in it as `retry_delay { seconds: N }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitSignal {
    pub message: String,
}

impl RateLimitSignal {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Server-suggested delay in whole seconds, if the message carries one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        parse_retry_delay(&self.message)
    }
}

impl std::fmt::Display for RateLimitSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors produced by an analysis or grounding capability.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CapabilityError {
    /// Transient throttling. The only retryable variant.
    #[error("rate limited: {0}")]
    RateLimited(RateLimitSignal),

    /// The payload did not match the requested output shape.
    #[error("schema violation for {shape}: {detail}")]
    SchemaViolation { shape: String, detail: String },

    /// The request could not be encoded.
    #[error("request encoding failed: {0}")]
    Encoding(String),

    /// The service answered with a non-retryable error.
    #[error("service rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl CapabilityError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        CapabilityError::RateLimited(RateLimitSignal::new(message))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CapabilityError::RateLimited(_))
    }
}

/// Result type for capability calls.
pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;
