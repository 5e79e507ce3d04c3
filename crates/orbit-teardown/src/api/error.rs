//! CloudControl API error classification
//!
//! Provides typed errors for API operations using the `responseCode` the
//! provider returns, instead of string matching on messages.

use thiserror::Error;

/// API error categories for teardown decisions
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Resource is busy, locked, or still has dependents
    #[error("Resource busy ({code}): {message}")]
    Busy { code: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Request was understood and refused
    #[error("Request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The request never produced a provider response
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
    /// Wrap a transport-level failure
    pub fn transport(error: impl Into<anyhow::Error>) -> Self {
        ApiError::Transport(error.into().into())
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Check if the same request could succeed later
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Busy { .. } | ApiError::Throttled)
    }

    /// The provider response code, if one was returned
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::NotFound { .. } => Some("RESOURCE_NOT_FOUND"),
            ApiError::Busy { code, .. } | ApiError::Rejected { code, .. } => Some(code),
            ApiError::Throttled | ApiError::Transport(_) => None,
        }
    }
}

/// Known response codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["RESOURCE_NOT_FOUND"];

/// Known response codes for resources that cannot be acted on right now
const BUSY_CODES: &[&str] = &["RESOURCE_BUSY", "RESOURCE_LOCKED", "HAS_DEPENDENCY"];

/// Known response codes for throttling
const THROTTLING_CODES: &[&str] = &["TOO_MANY_REQUESTS", "RATE_LIMIT_EXCEEDED"];

/// Classify a CloudControl response into an error.
pub fn classify_api_error(code: Option<&str>, message: Option<&str>) -> ApiError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => ApiError::NotFound { message },
        Some(c) if BUSY_CODES.contains(&c) => ApiError::Busy {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => ApiError::Throttled,
        Some(c) => ApiError::Rejected {
            code: c.to_string(),
            message,
        },
        None => ApiError::Rejected {
            code: "UNEXPECTED_ERROR".to_string(),
            message,
        },
    }
}
