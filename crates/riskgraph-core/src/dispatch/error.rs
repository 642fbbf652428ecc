//! Error types for category dispatch.

use serde::Serialize;

/// Rejections of the dispatch input itself. Nothing is submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("category list must not be empty")]
    NoCategories,

    #[error("category {category} appears more than once")]
    DuplicateCategory { category: String },
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// A single category subtask that exhausted its retries or hit a
/// non-retryable error. Isolated to that category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("category {category} failed: {error}")]
pub struct CategoryFailure {
    pub category: String,
    pub error: String,
}
