//! `generateContent` request and response bodies.
//!
//! Only the fields the adapter reads or writes are modelled.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// JSON-mode request constrained to `schema`.
    pub fn structured(prompt: &str, schema: Value) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            tools: Vec::new(),
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            }),
        }
    }

    /// Free-text request with Google Search grounding enabled.
    pub fn grounded_search(prompt: &str) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            tools: vec![json!({ "google_search": {} })],
            generation_config: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: &str) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Web grounding chunks of the first candidate.
    pub fn web_chunks(&self) -> Vec<WebChunk> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| m.grounding_chunks.iter().filter_map(|c| c.web.clone()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebChunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebChunk {
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// Body of a non-success response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub details: Vec<Value>,
}

impl ApiError {
    /// Whole seconds from a `google.rpc.RetryInfo` detail, rounded up.
    pub fn retry_delay_secs(&self) -> Option<u64> {
        self.details
            .iter()
            .filter(|d| {
                d.get("@type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| t.ends_with("google.rpc.RetryInfo"))
            })
            .find_map(|d| d.get("retryDelay").and_then(Value::as_str))
            .and_then(parse_duration_secs)
    }
}

/// Parse a protobuf JSON duration such as `"27s"` or `"1.5s"`.
fn parse_duration_secs(raw: &str) -> Option<u64> {
    let secs: f64 = raw.trim().strip_suffix('s')?.parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(secs.ceil() as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_request_shape() {
        let body = serde_json::to_value(GenerateContentRequest::structured(
            "hello",
            json!({"type": "object"}),
        ))
        .unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_grounded_search_request_enables_google_search() {
        let body = serde_json::to_value(GenerateContentRequest::grounded_search("q")).unwrap();
        assert!(body["tools"][0].get("google_search").is_some());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_text_and_chunks() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]},
                "finishReason": "STOP",
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://a.example", "title": "A"}},
                        {"retrievedContext": {}},
                        {"web": {"uri": "https://b.example"}}
                    ]
                }
            }]
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("{\"a\":1}"));
        let chunks = response.web_chunks();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].title, "A");
        assert_eq!(chunks[1].title, "");
    }

    #[test]
    fn test_empty_candidates_have_no_text() {
        let response = GenerateContentResponse::default();
        assert!(response.text().is_none());
        assert!(response.web_chunks().is_empty());
    }

    #[test]
    fn test_retry_info_delay() {
        let err: ErrorEnvelope = serde_json::from_value(json!({
            "error": {
                "code": 429,
                "message": "Quota exceeded",
                "status": "RESOURCE_EXHAUSTED",
                "details": [
                    {"@type": "type.googleapis.com/google.rpc.QuotaFailure"},
                    {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "26.4s"}
                ]
            }
        }))
        .unwrap();
        assert_eq!(err.error.retry_delay_secs(), Some(27));
        assert_eq!(parse_duration_secs("7s"), Some(7));
        assert_eq!(parse_duration_secs("soon"), None);
    }
}
