//! Skybridge driver capability interface
//!
//! This crate defines the contract every cloud backend driver must satisfy
//! to participate in Skybridge: the uniform resource model (images, VPCs,
//! subnets, security groups, key pairs, VMs) and the [`CloudDriver`] trait
//! the orchestrator dispatches through.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              skybridge-core                      │
//! │           (resource orchestrator)                │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │             skybridge-driver                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │         Capability Interface              │   │
//! │  │  trait CloudDriver { ... }                │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Resource     │  │ Connection   │            │
//! │  │ Model (Iid)  │  │ Resolution   │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  mock driver  │ │  CSP drivers  │
//! └───────────────┘ └───────────────┘
//! ```

pub mod driver;
pub mod error;
pub mod resolver;
pub mod resource;

// Re-exports
pub use driver::CloudDriver;
pub use error::{DriverError, Result};
pub use resolver::{DriverResolver, StaticResolver};
pub use resource::{
    Iid, ImageInfo, ImageReq, KeyPairInfo, KeyPairReq, ResourceKind, SecurityGroupInfo,
    SecurityGroupReq, SecurityRule, SubnetInfo, SubnetReq, VmAction, VmInfo, VmReq,
    VmStatusEntry, VpcInfo, VpcReq,
};
