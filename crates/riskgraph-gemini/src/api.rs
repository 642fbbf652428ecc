//! One `generateContent` round trip and its error mapping.

use reqwest::StatusCode;
use riskgraph_core::CapabilityError;
use tracing::debug;

use crate::config::GeminiConfig;
use crate::wire::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

/// Header carrying the API key. Keeps the key out of URLs and error text.
const API_KEY_HEADER: &str = "x-goog-api-key";

pub(crate) async fn generate_content(
    http: &reqwest::Client,
    config: &GeminiConfig,
    body: &GenerateContentRequest,
) -> Result<GenerateContentResponse, CapabilityError> {
    let response = http
        .post(config.endpoint())
        .header(API_KEY_HEADER, &config.api_key)
        .timeout(config.request_timeout)
        .json(body)
        .send()
        .await
        .map_err(|e| CapabilityError::Transport(e.without_url().to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "generateContent failed");
        return Err(map_error(status, &text));
    }

    response
        .json::<GenerateContentResponse>()
        .await
        .map_err(|e| CapabilityError::Transport(e.without_url().to_string()))
}

/// Map a non-success response to a [`CapabilityError`].
///
/// Throttling becomes a rate-limit signal whose message carries
/// `retry_delay { seconds: N }` when the server sent a `RetryInfo` detail.
pub(crate) fn map_error(status: StatusCode, body: &str) -> CapabilityError {
    let api = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error)
        .unwrap_or_default();
    let message = if api.message.is_empty() {
        body.trim().to_string()
    } else {
        api.message.clone()
    };

    if status == StatusCode::TOO_MANY_REQUESTS || api.status == "RESOURCE_EXHAUSTED" {
        let mut signal = format!("{} RESOURCE_EXHAUSTED: {message}", status.as_u16());
        if let Some(secs) = api.retry_delay_secs() {
            signal.push_str(&format!(" retry_delay {{ seconds: {secs} }}"));
        }
        return CapabilityError::rate_limited(signal);
    }

    CapabilityError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskgraph_core::parse_retry_delay;
    use serde_json::json;

    #[test]
    fn test_throttling_carries_parseable_hint() {
        let body = json!({
            "error": {
                "code": 429,
                "message": "You exceeded your current quota",
                "status": "RESOURCE_EXHAUSTED",
                "details": [
                    {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "41s"}
                ]
            }
        })
        .to_string();

        match map_error(StatusCode::TOO_MANY_REQUESTS, &body) {
            CapabilityError::RateLimited(signal) => {
                assert_eq!(signal.retry_after_secs(), Some(41));
                assert_eq!(parse_retry_delay(&signal.message), Some(41));
                assert!(signal.message.contains("exceeded your current quota"));
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn test_throttling_without_retry_info_has_no_hint() {
        match map_error(StatusCode::TOO_MANY_REQUESTS, "slow down") {
            CapabilityError::RateLimited(signal) => {
                assert_eq!(signal.retry_after_secs(), None);
                assert!(signal.message.contains("slow down"));
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn test_other_statuses_are_rejections() {
        let body = json!({"error": {"code": 400, "message": "bad schema", "status": "INVALID_ARGUMENT"}})
            .to_string();
        match map_error(StatusCode::BAD_REQUEST, &body) {
            CapabilityError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad schema");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(!map_error(StatusCode::INTERNAL_SERVER_ERROR, "").is_rate_limited());
    }
}
