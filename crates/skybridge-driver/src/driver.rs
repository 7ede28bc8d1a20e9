//! Cloud backend driver trait definition

use crate::error::Result;
use crate::resource::{
    Iid, ImageInfo, ImageReq, KeyPairInfo, KeyPairReq, SecurityGroupInfo, SecurityGroupReq,
    VmAction, VmInfo, VmReq, VmStatusEntry, VpcInfo, VpcReq,
};
use async_trait::async_trait;

/// Capability contract every cloud backend driver implements.
///
/// The orchestrator treats a driver as an opaque, unbounded-latency
/// collaborator: calls may block for as long as the backend takes, any call
/// may fail with a backend-specific error, and nothing here is retried.
///
/// Contract, per resource kind:
/// - `create_*` returns an info whose `iid.system_id` is populated
/// - `get_*`/`delete_*` accept an [`Iid`] addressed by name or system id
/// - `delete_*` returns `true` only on confirmed backend removal
///
/// VMs additionally expose start/control/status; `terminate_vm` and
/// `control_vm` return the backend's raw status string, which the
/// orchestrator canonicalizes.
#[async_trait]
pub trait CloudDriver: Send + Sync {
    /// Backend identifier (e.g. "mock", "aws", "openstack").
    fn name(&self) -> &str;

    // Image
    async fn create_image(&self, req: ImageReq) -> Result<ImageInfo>;
    async fn list_images(&self) -> Result<Vec<ImageInfo>>;
    async fn get_image(&self, iid: &Iid) -> Result<ImageInfo>;
    async fn delete_image(&self, iid: &Iid) -> Result<bool>;

    // VPC (subnets are created through their owning VPC)
    async fn create_vpc(&self, req: VpcReq) -> Result<VpcInfo>;
    async fn list_vpcs(&self) -> Result<Vec<VpcInfo>>;
    async fn get_vpc(&self, iid: &Iid) -> Result<VpcInfo>;
    async fn delete_vpc(&self, iid: &Iid) -> Result<bool>;

    // Security group
    async fn create_security_group(&self, req: SecurityGroupReq) -> Result<SecurityGroupInfo>;
    async fn list_security_groups(&self) -> Result<Vec<SecurityGroupInfo>>;
    async fn get_security_group(&self, iid: &Iid) -> Result<SecurityGroupInfo>;
    async fn delete_security_group(&self, iid: &Iid) -> Result<bool>;

    // Key pair
    async fn create_key_pair(&self, req: KeyPairReq) -> Result<KeyPairInfo>;
    async fn list_key_pairs(&self) -> Result<Vec<KeyPairInfo>>;
    async fn get_key_pair(&self, iid: &Iid) -> Result<KeyPairInfo>;
    async fn delete_key_pair(&self, iid: &Iid) -> Result<bool>;

    // VM
    async fn start_vm(&self, req: VmReq) -> Result<VmInfo>;
    async fn list_vms(&self) -> Result<Vec<VmInfo>>;
    async fn get_vm(&self, iid: &Iid) -> Result<VmInfo>;

    /// Terminates the VM and returns the raw status it was terminated from.
    async fn terminate_vm(&self, iid: &Iid) -> Result<String>;

    /// Dispatches a validated control action; returns the raw status after
    /// the backend accepts the action (the transition may still be in
    /// flight — callers poll `vm_status`).
    async fn control_vm(&self, iid: &Iid, action: VmAction) -> Result<String>;

    async fn vm_status(&self, iid: &Iid) -> Result<String>;
    async fn list_vm_status(&self) -> Result<Vec<VmStatusEntry>>;
}
