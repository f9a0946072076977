//! Shared primitives for all Rust crates in artikey.

#![forbid(unsafe_code)]

/// Aggregation of independent validation failures.
pub mod validation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use validation::ValidationErrors;

/// Result type used across artikey crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The external artifact repository rejected or failed an operation.
    #[error("external service error: {0}")]
    External(String),

    /// The durable key-value store is unavailable or failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_serializes_transparently_as_inner_value() {
        let value = NonEmptyString::new("deploy").unwrap_or_else(|_| unreachable!());
        let encoded = serde_json::to_string(&value).unwrap_or_default();
        assert_eq!(encoded, "\"deploy\"");
    }

    #[test]
    fn external_errors_render_category_prefix() {
        let error = AppError::External("group create failed".to_owned());
        assert_eq!(
            error.to_string(),
            "external service error: group create failed"
        );
    }
}
