//! Driver error types

use thiserror::Error;

/// Errors a backend driver may surface to the orchestrator.
///
/// Anything that is not a clean `NotFound`/`AlreadyExists` is an opaque
/// backend failure; the orchestrator never retries it.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("operation not supported by this backend: {0}")]
    Unsupported(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl DriverError {
    /// Whether this error means the backend definitively does not have the
    /// resource (as opposed to a transient or opaque failure).
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
