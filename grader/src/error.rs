//! Grader Error Types
//!
//! This module defines the [`GraderError`] enum covering every failure the grading
//! pipeline can surface, and the [`ErrorCategory`] taxonomy used when reporting
//! per-item failures to operators. Parse failures are deliberately absent: the
//! extraction chain always yields a structural result via its sentiment fallback,
//! and cache persistence failures are logged and swallowed rather than raised.

use serde::Serialize;

/// Errors surfaced by the grading pipeline.
#[derive(Debug, thiserror::Error)]
pub enum GraderError {
    /// The circuit breaker is open; carries the remaining cooldown.
    #[error("Circuit breaker is open. Service unavailable for {remaining_secs} more seconds.")]
    CircuitOpen { remaining_secs: u64 },

    /// Transport-level failure talking to the inference service.
    #[error("Inference request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The inference service answered with a non-success status.
    #[error("Inference service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The service reply could not be decoded into the expected shape.
    #[error("error decoding response body: {0}")]
    InvalidResponse(String),

    /// The service replied with no usable text.
    #[error("Empty response from inference service")]
    EmptyResponse,

    /// Durable cache store failure. Never propagated out of the cache layer.
    #[error("Cache store error: {0}")]
    CacheStore(String),
}

impl GraderError {
    /// Maps this error onto the operator-facing [`ErrorCategory`] taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            GraderError::CircuitOpen { .. } => ErrorCategory::CircuitBreaker,
            GraderError::Http(e) => {
                if e.is_connect() || e.is_timeout() || e.is_request() {
                    ErrorCategory::Network
                } else {
                    ErrorCategory::Unknown
                }
            }
            GraderError::Service { status, message } => {
                let message = message.to_lowercase();
                if *status == 429 || message.contains("quota") || message.contains("rate limit") {
                    ErrorCategory::Quota
                } else if *status == 401
                    || *status == 403
                    || message.contains("authentication")
                    || message.contains("api key")
                {
                    ErrorCategory::Auth
                } else if *status >= 500 {
                    ErrorCategory::Server
                } else {
                    ErrorCategory::Unknown
                }
            }
            GraderError::InvalidResponse(_) | GraderError::EmptyResponse => {
                ErrorCategory::ContentProcessing
            }
            GraderError::CacheStore(_) => ErrorCategory::Unknown,
        }
    }

    /// Short operator-facing description matching the category.
    pub fn operator_detail(&self) -> String {
        match self.category() {
            ErrorCategory::CircuitBreaker => {
                "Service temporarily unavailable due to repeated failures".to_string()
            }
            ErrorCategory::Network => "Network connection failed".to_string(),
            ErrorCategory::Server => "Inference service server error".to_string(),
            ErrorCategory::Quota => "API quota or rate limit exceeded".to_string(),
            ErrorCategory::Auth => "Authentication failed - check API key".to_string(),
            ErrorCategory::ContentProcessing => "Response content processing failed".to_string(),
            ErrorCategory::Unknown => self.to_string(),
        }
    }
}

/// Coarse failure buckets surfaced in batch failure records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    CircuitBreaker,
    Network,
    Server,
    Quota,
    Auth,
    ContentProcessing,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::CircuitBreaker => "circuit_breaker",
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Quota => "quota",
            ErrorCategory::Auth => "auth",
            ErrorCategory::ContentProcessing => "content_processing",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
