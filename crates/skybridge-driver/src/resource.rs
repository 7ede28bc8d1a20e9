//! Uniform resource model shared by every backend driver
//!
//! All resources are addressed end-to-end by an [`Iid`]: the caller-chosen
//! `name_id` paired with the backend-assigned `system_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of resource kinds Skybridge manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Image,
    Vpc,
    SecurityGroup,
    KeyPair,
    Vm,
}

impl ResourceKind {
    /// Stable short string used in registry keys and error context.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Vpc => "vpc",
            ResourceKind::SecurityGroup => "sg",
            ResourceKind::KeyPair => "keypair",
            ResourceKind::Vm => "vm",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integrated identifier: user name plus backend system id.
///
/// `name_id` is chosen by the caller and immutable once registered.
/// `system_id` is empty until the backend create call returns, and
/// immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iid {
    pub name_id: String,
    pub system_id: String,
}

impl Iid {
    pub fn new(name_id: impl Into<String>, system_id: impl Into<String>) -> Self {
        Self {
            name_id: name_id.into(),
            system_id: system_id.into(),
        }
    }

    /// An IID known only by its user name (pre-create, or registry key).
    pub fn from_name(name_id: impl Into<String>) -> Self {
        Self {
            name_id: name_id.into(),
            system_id: String::new(),
        }
    }

    /// An IID known only by its backend id (unmanaged remote resources).
    pub fn from_system_id(system_id: impl Into<String>) -> Self {
        Self {
            name_id: String::new(),
            system_id: system_id.into(),
        }
    }

    /// True once the backend has assigned a system id.
    pub fn is_registered(&self) -> bool {
        !self.system_id.is_empty()
    }
}

impl std::fmt::Display for Iid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name_id, self.system_id)
    }
}

/// Image create request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageReq {
    pub iid: Iid,
}

/// Image description returned by a backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageInfo {
    pub iid: Iid,
    pub guest_os: String,
    pub status: String,
    pub description: String,
}

/// Subnet definition embedded in a VPC create request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetReq {
    pub iid: Iid,
    pub ipv4_cidr: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubnetInfo {
    pub iid: Iid,
    pub ipv4_cidr: String,
}

/// VPC create request, carrying its initial subnets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcReq {
    pub iid: Iid,
    pub ipv4_cidr: String,
    pub subnets: Vec<SubnetReq>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VpcInfo {
    pub iid: Iid,
    pub ipv4_cidr: String,
    pub subnets: Vec<SubnetInfo>,
}

/// One security group rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub from_port: String,
    pub to_port: String,
    pub protocol: String,
    pub direction: String,
    pub cidr: String,
}

/// Security group create request.
///
/// `iid.name_id` is the flat compound name (owner VPC + delimiter + local
/// name); the orchestrator synthesizes it before the driver ever sees the
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupReq {
    pub iid: Iid,
    pub vpc_iid: Iid,
    pub direction: String,
    pub rules: Vec<SecurityRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityGroupInfo {
    pub iid: Iid,
    pub vpc_iid: Iid,
    pub direction: String,
    pub rules: Vec<SecurityRule>,
}

/// Key pair create request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPairReq {
    pub iid: Iid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyPairInfo {
    pub iid: Iid,
    pub fingerprint: String,
    pub public_key: String,
    /// Only populated on create; backends do not return it afterwards.
    pub private_key: String,
}

/// VM start request.
///
/// All referenced resources are addressed by IID; security group IIDs carry
/// flat compound names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmReq {
    pub iid: Iid,
    pub image_iid: Iid,
    pub vpc_iid: Iid,
    pub subnet_iid: Iid,
    pub security_group_iids: Vec<Iid>,
    pub spec_name: String,
    pub key_pair_iid: Iid,
    pub vm_user_id: String,
    pub vm_user_passwd: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VmInfo {
    pub iid: Iid,
    pub started_at: Option<DateTime<Utc>>,
    pub image_iid: Iid,
    pub vpc_iid: Iid,
    pub subnet_iid: Iid,
    pub security_group_iids: Vec<Iid>,
    pub spec_name: String,
    pub key_pair_iid: Iid,
    pub public_ip: String,
    pub private_ip: String,
    pub ssh_access_point: String,
}

/// Backend-native VM status, before canonicalization.
///
/// Drivers report their provider's raw status string; mapping into the
/// fixed lifecycle happens in the orchestrator, never in the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmStatusEntry {
    pub iid: Iid,
    pub raw_status: String,
}

/// Control actions a running VM accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmAction {
    Suspend,
    Resume,
    Reboot,
}

impl std::fmt::Display for VmAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmAction::Suspend => write!(f, "suspend"),
            VmAction::Resume => write!(f, "resume"),
            VmAction::Reboot => write!(f, "reboot"),
        }
    }
}
