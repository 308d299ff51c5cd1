//! Typed errors for the municipal-facts library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell a
//! transient collaborator failure from a malformed reply or a bad input.

use thiserror::Error;

/// Errors surfaced by the library API.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Region code is not in the registry
    #[error("unknown region code: {code}")]
    UnknownRegion { code: String },

    /// Place input cannot be used (empty name, etc.)
    #[error("invalid place: {reason}")]
    InvalidPlace { reason: String },

    /// An external collaborator failed after all recovery
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Reading or writing output files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors returned by external collaborators (geocoding, search, fetch,
/// generation, facility lookup, population).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Service answered with a non-success status
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    /// Request timed out
    #[error("timeout calling {service}")]
    Timeout { service: &'static str },

    /// Reply did not have the expected shape
    #[error("malformed response from {service}: {reason}")]
    Malformed {
        service: &'static str,
        reason: String,
    },

    /// Nothing is configured to answer this request
    #[error("{service} unavailable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },
}

impl CollaboratorError {
    /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// Rate limiting and server-side statuses are transient; client errors
    /// and missing configuration are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed { .. } => true,
            Self::Unavailable { .. } => false,
        }
    }

    /// Build a `Malformed` error from anything displayable.
    pub fn malformed(service: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Malformed {
            service,
            reason: reason.to_string(),
        }
    }

    /// Classify a reqwest failure for the named service.
    pub fn from_reqwest(service: &'static str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout { service }
        } else if let Some(status) = error.status() {
            Self::Status {
                service,
                status: status.as_u16(),
            }
        } else {
            Self::Http(Box::new(error))
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for collaborator calls.
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;
