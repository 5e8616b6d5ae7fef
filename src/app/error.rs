use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Failure classes a lookup can end in.
///
/// The HTTP layer maps these coarsely (client error vs server error), but the
/// distinction is kept here for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed request; rejected before any acquisition work.
    InvalidInput,
    /// The API search or the web search produced no candidate.
    NotFound,
    /// A bounded wait elapsed while the page was still loading.
    ExtractionTimeout,
    /// Page reached, but an expected element was absent, empty or unparseable.
    ExtractionFailure,
    /// Non-2xx response or transport failure from upstream.
    UpstreamError,
    /// Upstream rejected the credential.
    AuthError,
    /// The requested strategy is not configured or has no capacity left.
    Unavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ExtractionTimeout => "extraction_timeout",
            ErrorKind::ExtractionFailure => "extraction_failure",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::AuthError => "auth_error",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized lookup failure handed to the boundary layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AcquisitionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AcquisitionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExtractionTimeout, message)
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExtractionFailure, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }
}

impl From<reqwest::Error> for AcquisitionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::upstream(format!("Upstream request timed out: {}", e))
        } else {
            Self::upstream(format!("Upstream request failed: {}", e))
        }
    }
}

/// Start-up and infrastructure errors (config, browser launch, server).
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Lookup failed ({}): {}", .0.kind, .0.message)]
    Acquisition(#[from] AcquisitionError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ScoutError>;
