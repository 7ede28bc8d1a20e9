//! Skybridge resource orchestration core
//!
//! One uniform resource model over many independently-evolving cloud
//! backends. The orchestrator combines three collaborators:
//!
//! - the driver capability interface (`skybridge-driver`) — what every
//!   backend must be able to do
//! - the identity registry (`skybridge-registry`) — the durable
//!   name↔system-id mapping that defines "managed"
//! - the name transform ([`names`]) — compound naming for kinds whose
//!   real-world scoping is hierarchical but whose backend namespace is flat
//!
//! plus the VM lifecycle canonicalization in [`vm_state`].
//!
//! Every operation is independently atomic at best; there are no
//! cross-resource transactions and no automatic retries. Drift between
//! registry and backend is surfaced through the reconciliation view
//! ([`Orchestrator::list_all_resource`]) rather than repaired silently.

pub mod error;
pub mod names;
pub mod orchestrator;
pub mod vm_state;

// Re-exports
pub use error::{CoreError, Result};
pub use orchestrator::{
    AllResourceList, DeleteOutcome, Orchestrator, SecurityGroupCreateRequest, SubnetDef,
    VmStartRequest, VmStatusInfo, VpcCreateRequest,
};
pub use vm_state::VmState;
