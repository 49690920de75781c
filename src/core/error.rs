//! Custom error types for driftwatch
//!
//! Only faults that are fatal to a run live here. Per-tool-call faults are
//! data (`ToolRecord` errors) and never pass through this type.

use std::time::Duration;

use thiserror::Error;

/// Main error type for driftwatch operations
#[derive(Error, Debug)]
pub enum DriftwatchError {
    /// The generation backend could not be reached
    #[error("generation backend unreachable at {0}")]
    BackendUnreachable(String),

    /// The generation backend answered, but with something unusable
    #[error("generation backend error: {0}")]
    Backend(String),

    /// The tool registry snapshot could not be taken at loop start
    #[error("tool registry error: {0}")]
    Registry(String),

    /// The run was cancelled by the caller
    #[error("run cancelled")]
    Cancelled,

    /// The overall run deadline elapsed
    #[error("run deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for driftwatch operations
pub type Result<T> = std::result::Result<T, DriftwatchError>;

/// Stable, machine-readable classification of a fatal fault.
///
/// Callers branch on this instead of parsing error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BackendUnreachable,
    Backend,
    Registry,
    Cancelled,
    DeadlineExceeded,
    Config,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BackendUnreachable => write!(f, "backend_unreachable"),
            Self::Backend => write!(f, "backend"),
            Self::Registry => write!(f, "registry"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::DeadlineExceeded => write!(f, "deadline_exceeded"),
            Self::Config => write!(f, "config"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl DriftwatchError {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a registry error
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The stable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BackendUnreachable(_) => ErrorKind::BackendUnreachable,
            Self::Backend(_) => ErrorKind::Backend,
            Self::Registry(_) => ErrorKind::Registry,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
            Self::Config(_) => ErrorKind::Config,
            Self::Json(_) | Self::Http(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }
}
