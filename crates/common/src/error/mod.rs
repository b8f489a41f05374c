//! Common error types shared by the primitives in this crate
//!
//! Module-specific errors compose with [`CommonError`] instead of repeating
//! its variants, and every error type implements [`ErrorClassification`] so
//! callers can make retry decisions without matching on concrete types.
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum SealError {
//!     #[error("key rejected: {0}")]
//!     Key(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Severity used for log levels and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// Uniform classification interface for error types.
pub trait ErrorClassification {
    /// Whether repeating the operation may succeed.
    fn is_retryable(&self) -> bool;

    fn severity(&self) -> ErrorSeverity;

    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Server- or policy-suggested delay before the next attempt.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Common error variants that appear across multiple modules
#[derive(Debug, Clone, Error)]
pub enum CommonError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error ({format}): {message}")]
    Serialization { format: String, message: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: Option<Duration> },

    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout { operation: String, duration: Duration },

    #[error("Backend error from '{service}': {message}")]
    Backend { service: String, message: String, is_retryable: bool },

    #[error("Validation error for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimitExceeded { .. } | Self::Timeout { .. } => true,
            Self::Backend { is_retryable, .. } => *is_retryable,
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::RateLimitExceeded { .. } | Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::Internal { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl CommonError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn serialization<F: Into<String>, S: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { format: format.into(), message: message.into() }
    }

    pub fn timeout<S: Into<String>>(operation: S, duration: Duration) -> Self {
        Self::Timeout { operation: operation.into(), duration }
    }

    pub fn backend<S: Into<String>, M: Into<String>>(
        service: S,
        message: M,
        is_retryable: bool,
    ) -> Self {
        Self::Backend { service: service.into(), message: message.into(), is_retryable }
    }

    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage { message: message.into() }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("JSON", err.to_string())
    }
}
