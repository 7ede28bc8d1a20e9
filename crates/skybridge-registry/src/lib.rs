//! Skybridge identity registry
//!
//! Persistent mapping of `(connection, resource kind, user-chosen name)` to
//! the backend-assigned system id. The registry is the single source of
//! truth for what Skybridge manages: a record exists exactly for resources
//! whose backend create call succeeded and whose delete has not yet been
//! confirmed (or force-dropped by an operator).
//!
//! The registry is the only shared mutable state in the core. Mutations are
//! serialized through one async mutex whose critical section covers the
//! duplicate check, the table mutation, and the durable write — and nothing
//! else. Backend driver calls are never made by this crate.

pub mod error;
pub mod record;
pub mod registry;

// Re-exports
pub use error::{RegistryError, Result};
pub use record::ResourceRecord;
pub use registry::IdentityRegistry;
