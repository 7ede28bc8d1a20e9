//! Registry error types

use skybridge_driver::ResourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("duplicate name: {kind} '{name}' already registered on connection '{connection}'")]
    DuplicateName {
        connection: String,
        kind: ResourceKind,
        name: String,
    },

    #[error("not registered: {kind} '{name}' on connection '{connection}'")]
    NotFound {
        connection: String,
        kind: ResourceKind,
        name: String,
    },

    #[error("registry file version {found} is newer than supported version {supported}")]
    StoreVersion { found: u32, supported: u32 },

    #[error("registry io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
