//! Error types for RelayBot
//!
//! This module defines all error types used throughout the RelayBot core.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Provider Error Classification
// ============================================================================

/// Structured provider error classification.
///
/// Lets callers of an [`LLMProvider`](crate::providers::LLMProvider) tell
/// transient failures from permanent ones without string matching.
#[derive(Debug)]
pub enum ProviderError {
    /// 401 — Invalid API key or authentication failure
    Auth(String),
    /// 429 — Rate limit or quota exceeded
    RateLimit(String),
    /// 500/502/503/504 — Server-side errors
    ServerError(String),
    /// 400 — Bad request, malformed parameters
    InvalidRequest(String),
    /// Connection, read, or call timeout
    Timeout(String),
    /// Catch-all for unrecognized errors
    Unknown(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            ProviderError::RateLimit(msg) => write!(f, "Rate limit error: {}", msg),
            ProviderError::ServerError(msg) => write!(f, "Server error: {}", msg),
            ProviderError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ProviderError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ProviderError::Unknown(msg) => write!(f, "Unknown provider error: {}", msg),
        }
    }
}

impl ProviderError {
    /// Returns `true` if this error is transient and the request could be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimit(_) | ProviderError::ServerError(_) | ProviderError::Timeout(_)
        )
    }
}

impl From<ProviderError> for RelayError {
    fn from(err: ProviderError) -> Self {
        RelayError::ProviderTyped(err)
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for RelayBot operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration-related errors (invalid values, unreadable files, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structured provider error with classification.
    #[error("Provider error: {0}")]
    ProviderTyped(ProviderError),

    /// A message violates the role/content invariants of the data model
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// A context compressor failed to produce a result
    #[error("Compression error: {0}")]
    Compression(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for RelayBot operations.
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Whether a provider call failing with this error may succeed if repeated.
    /// Only classified provider errors can be transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::ProviderTyped(e) => e.is_retryable(),
            _ => false,
        }
    }
}
