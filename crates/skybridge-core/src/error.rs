//! Core error taxonomy
//!
//! Validation and registry errors are resolved entirely inside the core;
//! backend errors are surfaced with enough context to identify which
//! resource and operation failed, and are never retried.

use skybridge_driver::{DriverError, ResourceKind};
use skybridge_registry::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed or reserved user-supplied name; rejected before any
    /// backend call.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("invalid VM control action '{0}' (expected one of: suspend, resume, reboot)")]
    InvalidAction(String),

    #[error(transparent)]
    DuplicateName(RegistryError),

    #[error("{kind} '{name}' not found on connection '{connection}'")]
    NotFound {
        connection: String,
        kind: ResourceKind,
        name: String,
    },

    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("failed to resolve driver for connection '{connection}': {source}")]
    Resolver {
        connection: String,
        #[source]
        source: DriverError,
    },

    #[error("backend failure during {operation} of {kind} '{name}' on '{connection}': {source}")]
    Backend {
        connection: String,
        kind: ResourceKind,
        name: String,
        operation: &'static str,
        #[source]
        source: DriverError,
    },

    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for CoreError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateName { .. } => CoreError::DuplicateName(err),
            RegistryError::NotFound {
                connection,
                kind,
                name,
            } => CoreError::NotFound {
                connection,
                kind,
                name,
            },
            other => CoreError::Registry(other),
        }
    }
}

impl CoreError {
    /// Wraps a driver error with the operation context it occurred in.
    pub(crate) fn backend(
        connection: &str,
        kind: ResourceKind,
        name: &str,
        operation: &'static str,
        source: DriverError,
    ) -> Self {
        if source.is_not_found() {
            return CoreError::NotFound {
                connection: connection.to_string(),
                kind,
                name: name.to_string(),
            };
        }
        CoreError::Backend {
            connection: connection.to_string(),
            kind,
            name: name.to_string(),
            operation,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
