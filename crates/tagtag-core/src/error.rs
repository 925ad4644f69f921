//! Unified error types for the session core.
//!
//! Every component surfaces failures as [`AppError`] so they propagate with
//! the `?` operator. The [`ErrorKind`] decides how the session reacts:
//! user-facing kinds are retried with new input, `RefreshExpired` is
//! terminal, `Network` is retryable and never clears session state.

use std::fmt;
use thiserror::Error;

/// Error kind categorization used across the session core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The server rejected the username/password pair.
    InvalidCredentials,
    /// The server requires a (new) captcha token before accepting a login.
    CaptchaRequired,
    /// The refresh token was rejected. Terminal: the session must end.
    RefreshExpired,
    /// The server rejected the access token; a refresh may recover.
    TokenExpired,
    /// Transport failure or unexpected server response. Retryable.
    Network,
    /// No session exists; the caller should go to login.
    Unauthenticated,
    /// The operation was abandoned because the session was torn down.
    Aborted,
    /// Input validation failed.
    Validation,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// The durable token slot could not be read or written.
    Storage,
    /// An internal invariant was violated.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::CaptchaRequired => write!(f, "CAPTCHA_REQUIRED"),
            Self::RefreshExpired => write!(f, "REFRESH_EXPIRED"),
            Self::TokenExpired => write!(f, "TOKEN_EXPIRED"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unauthenticated => write!(f, "UNAUTHENTICATED"),
            Self::Aborted => write!(f, "ABORTED"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified error used throughout the session core.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-credentials error.
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidCredentials, message)
    }

    /// Create a captcha-required error.
    pub fn captcha_required(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CaptchaRequired, message)
    }

    /// Create a refresh-expired error.
    pub fn refresh_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RefreshExpired, message)
    }

    /// Create a token-expired error.
    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenExpired, message)
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Create an unauthenticated error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    /// Create an aborted error.
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Aborted, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Network)
    }

    /// Whether the error ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, ErrorKind::RefreshExpired)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
