//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! Two layers exist:
//!
//! - [`DetectError`]: a single remote detector failing. Carries the source
//!   and an [`ErrorCategory`]. The arbitration engine absorbs these and never
//!   surfaces them to its caller.
//! - [`ArbiterError`]: configuration, I/O and CLI failures. These are the only
//!   errors that reach the user.

use std::time::Duration;
use thiserror::Error;

use super::detection::DetectionSourceKind;

// =============================================================================
// Error Categories
// =============================================================================

/// Failure categories for remote detector calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited by the service
    RateLimit,
    /// Authentication failed (missing or rejected credentials)
    Auth,
    /// Network/connectivity issues
    Network,
    /// Call exceeded its time budget
    Timeout,
    /// Service unavailable or not installed
    Unavailable,
    /// Request rejected as malformed
    BadRequest,
    /// Response could not be parsed
    ParseError,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Whether this failure should count against the source's circuit breaker.
    ///
    /// Parse errors and bad requests depend on the input text, not on the
    /// health of the service.
    pub fn counts_as_outage(&self) -> bool {
        !matches!(self, Self::BadRequest | Self::ParseError)
    }
}

// =============================================================================
// Detect Error
// =============================================================================

/// A remote detector failure, tagged with its originating source
#[derive(Debug, Clone, Error)]
#[error("[{source_kind}:{category}] {message}")]
pub struct DetectError {
    /// Detector that failed
    pub source_kind: DetectionSourceKind,
    /// Failure category
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
}

impl DetectError {
    pub fn new(
        source_kind: DetectionSourceKind,
        category: ErrorCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source_kind,
            category,
            message: message.into(),
        }
    }

    /// Time budget exceeded
    pub fn timeout(source_kind: DetectionSourceKind, duration: Duration) -> Self {
        Self::new(
            source_kind,
            ErrorCategory::Timeout,
            format!("no answer within {:?}", duration),
        )
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps transport-level failures onto [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a free-form error message
    pub fn classify(message: &str, source_kind: DetectionSourceKind) -> DetectError {
        let lower = message.to_lowercase();

        let category = if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota")
        {
            ErrorCategory::RateLimit
        } else if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("api key")
            || lower.contains("signature")
        {
            ErrorCategory::Auth
        } else if lower.contains("timed out") || lower.contains("timeout") {
            ErrorCategory::Timeout
        } else if lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("network")
            || lower.contains("unreachable")
        {
            ErrorCategory::Network
        } else if lower.contains("not found")
            || lower.contains("not installed")
            || lower.contains("unavailable")
            || lower.contains("503")
            || lower.contains("502")
        {
            ErrorCategory::Unavailable
        } else if lower.contains("parse") || lower.contains("json") || lower.contains("decode")
        {
            ErrorCategory::ParseError
        } else {
            ErrorCategory::Unknown
        };

        DetectError::new(source_kind, category, message)
    }

    /// Classify an HTTP status code directly
    pub fn classify_http_status(
        status: u16,
        message: &str,
        source_kind: DetectionSourceKind,
    ) -> DetectError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 413 | 422 => ErrorCategory::BadRequest,
            404 | 500 | 502 | 503 => ErrorCategory::Unavailable,
            408 | 504 => ErrorCategory::Timeout,
            _ => ErrorCategory::Unknown,
        };
        DetectError::new(source_kind, category, message)
    }

    /// Classify a reqwest transport error
    pub fn classify_reqwest(err: &reqwest::Error, source_kind: DetectionSourceKind) -> DetectError {
        if err.is_timeout() {
            return DetectError::new(source_kind, ErrorCategory::Timeout, err.to_string());
        }
        if err.is_connect() || err.is_request() {
            return DetectError::new(source_kind, ErrorCategory::Network, err.to_string());
        }
        if err.is_decode() {
            return DetectError::new(source_kind, ErrorCategory::ParseError, err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::classify_http_status(status.as_u16(), &err.to_string(), source_kind);
        }
        Self::classify(&err.to_string(), source_kind)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ArbiterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}

pub type Result<T> = std::result::Result<T, ArbiterError>;

impl ArbiterError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// =============================================================================
// Tests
// =============================================================================
