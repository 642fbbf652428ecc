//! Riskgraph Gemini Adapter
//!
//! Implements the core's [`AnalysisCapability`](riskgraph_core::AnalysisCapability)
//! and [`GroundingSearch`](riskgraph_core::GroundingSearch) ports against the
//! Gemini `generateContent` REST endpoint.
//!
//! Throttled responses (HTTP 429 / `RESOURCE_EXHAUSTED`) surface as rate-limit
//! signals carrying the server's `RetryInfo` delay, so the core's retry
//! executor honours it.

mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod search;
pub mod wire;

pub use client::GeminiClient;
pub use config::GeminiConfig;
pub use error::{GeminiError, GeminiResult};
pub use search::{resolve_citations, GoogleSearchGrounding};
