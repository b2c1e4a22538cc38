//! Model error classification

use thiserror::Error;

/// Classified failure of a single model call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Bad or missing credential (HTTP 401/403)
    #[error("authentication failure: {0}")]
    AuthenticationFailure(String),

    /// Quota exceeded (HTTP 429); the caller decides on backoff
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The model returned no usable content
    #[error("empty response from model")]
    EmptyResponse,

    /// Network error, server-side outage or timeout
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Request violated a precondition and was never sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Anything else, with the originating type preserved for diagnostics
    #[error("unknown failure ({kind}): {message}")]
    UnknownFailure { kind: String, message: String },
}

impl ModelError {
    /// Wrap an arbitrary error, keeping its type name
    pub fn unknown<E: std::error::Error>(error: &E) -> Self {
        ModelError::UnknownFailure {
            kind: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
        }
    }

    pub fn timeout(secs: u64) -> Self {
        ModelError::TransportFailure(format!("timed out after {} seconds", secs))
    }

    /// Classify an unsuccessful HTTP status
    pub fn from_http_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => ModelError::AuthenticationFailure(body),
            429 => ModelError::RateLimited(body),
            408 | 500..=599 => ModelError::TransportFailure(format!("HTTP {}: {}", status, body)),
            _ => ModelError::UnknownFailure {
                kind: format!("HTTP {}", status.as_u16()),
                message: body,
            },
        }
    }

    /// Classify a reqwest error raised before a status was available
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ModelError::TransportFailure(format!("request timeout: {}", error))
        } else if error.is_connect() || error.is_request() {
            ModelError::TransportFailure(format!("connection failed: {}", error))
        } else if let Some(status) = error.status() {
            Self::from_http_status(status, error.to_string())
        } else {
            Self::unknown(&error)
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ModelError::RateLimited(_))
    }
}
