//! Error types for Newsdesk.
//!
//! Library crates use [`NewsdeskError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Every error carries a classification ([`ErrorClass`]) so callers can tell
//! an unreachable collaborator from one that answered with something unusable.
//! The classification never changes what a stage does with a failure: per-item
//! failures are skipped either way, stage-level write failures are fatal either
//! way. It exists for reporting and for tests.

use std::path::PathBuf;

/// Top-level error type for all Newsdesk operations.
#[derive(Debug, thiserror::Error)]
pub enum NewsdeskError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure (connect, TLS, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// A collaborator answered with a non-success HTTP status.
    #[error("{context}: HTTP {status}")]
    HttpStatus { context: String, status: u16 },

    /// Feed XML/JSON or an API response body could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The completion service answered but produced no usable text.
    #[error("completion error: {0}")]
    Completion(String),

    /// The requested file does not exist in the content store.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Compare-and-swap write rejected because the version token is stale.
    #[error("write conflict on {path}: {message}")]
    Conflict { path: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad repository slug, invalid URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NewsdeskError>;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The collaborator was unavailable; the same call may succeed later.
    Transient,
    /// The collaborator rejected the call or returned unusable data.
    Permanent,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Permanent => f.write_str("permanent"),
        }
    }
}

impl NewsdeskError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a network error from any displayable message.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an HTTP status error for the given request context.
    pub fn http_status(context: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            context: context.into(),
            status,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error as transient or permanent.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Network(_) => ErrorClass::Transient,
            Self::HttpStatus { status, .. } if is_transient_status(*status) => {
                ErrorClass::Transient
            }
            _ => ErrorClass::Permanent,
        }
    }

    /// Whether this error is an authentication/authorization rejection.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 401 | 403, .. })
    }
}

/// HTTP statuses worth trying again later: timeouts, rate limits, server errors.
fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429) || (500..600).contains(&status)
}
