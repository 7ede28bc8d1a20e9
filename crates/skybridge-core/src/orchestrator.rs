//! Resource orchestrator
//!
//! The central coordinator: every operation resolves a driver for the
//! connection, applies the name transform where the kind requires compound
//! naming, consults or updates the identity registry, invokes the backend,
//! and returns a normalized result.
//!
//! Failure policy, uniformly:
//! - user-supplied names are validated before any backend call
//! - the registry is written only after the backend confirms (create after
//!   a populated system id, remove after a confirmed delete), except under
//!   forced deletion
//! - backend calls are never made while holding the registry lock, and are
//!   never retried

use crate::error::{CoreError, Result};
use crate::names;
use crate::vm_state::{parse_action, VmState};
use serde::{Deserialize, Serialize};
use skybridge_driver::{
    CloudDriver, DriverError, DriverResolver, Iid, ImageInfo, ImageReq, KeyPairInfo, KeyPairReq,
    ResourceKind, SecurityGroupInfo, SecurityGroupReq, SecurityRule, SubnetReq, VmInfo, VmReq,
    VpcInfo, VpcReq,
};
use skybridge_registry::IdentityRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// VPC create request as the transport hands it over: plain names plus the
/// embedded subnet definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcCreateRequest {
    pub name: String,
    pub ipv4_cidr: String,
    pub subnets: Vec<SubnetDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetDef {
    pub name: String,
    pub ipv4_cidr: String,
}

/// Security group create request. `name` is the local name; the flat
/// registry name is synthesized from the owning VPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupCreateRequest {
    pub name: String,
    pub vpc_name: String,
    pub direction: String,
    pub rules: Vec<SecurityRule>,
}

/// VM start request. Security groups are local names scoped by `vpc_name`;
/// each is expanded to its flat compound name before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmStartRequest {
    pub name: String,
    pub image_name: String,
    pub vpc_name: String,
    pub subnet_name: String,
    pub security_group_names: Vec<String>,
    pub spec_name: String,
    pub key_pair_name: String,
    #[serde(default)]
    pub vm_user_id: String,
    #[serde(default)]
    pub vm_user_passwd: String,
}

/// Outcome of a delete, rich enough to tell which side completed.
///
/// `deleted` reflects the backend's reported result. For VMs, `vm_status`
/// carries the raw backend status the VM was terminated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub deleted: bool,
    pub vm_status: Option<String>,
}

/// Reconciliation view: registry versus backend, classified three ways.
///
/// Pure classification; computing it mutates nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllResourceList {
    /// Registry entries whose system id the backend still reports.
    pub managed: Vec<Iid>,
    /// Registry entries the backend no longer reports: local orphans.
    pub orphaned_local: Vec<Iid>,
    /// Backend resources no registry entry references.
    pub unmanaged_remote: Vec<Iid>,
}

/// Canonicalized VM status row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmStatusInfo {
    pub iid: Iid,
    pub state: VmState,
}

/// The resource orchestrator.
///
/// Holds no per-request state; the only shared mutable resource it touches
/// is the identity registry. Driver handles are resolved once per
/// connection and cached for the orchestrator's lifetime.
pub struct Orchestrator {
    resolver: Arc<dyn DriverResolver>,
    registry: Arc<IdentityRegistry>,
    drivers: RwLock<HashMap<String, Arc<dyn CloudDriver>>>,
}

impl Orchestrator {
    pub fn new(resolver: Arc<dyn DriverResolver>, registry: Arc<IdentityRegistry>) -> Self {
        Self {
            resolver,
            registry,
            drivers: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Resolves the driver for a connection, caching the handle.
    async fn driver(&self, connection: &str) -> Result<Arc<dyn CloudDriver>> {
        if let Some(driver) = self.drivers.read().await.get(connection) {
            return Ok(driver.clone());
        }

        let resolved = self.resolver.resolve(connection).await.map_err(|e| match e {
            DriverError::NotFound(_) => CoreError::ConnectionNotFound(connection.to_string()),
            source => CoreError::Resolver {
                connection: connection.to_string(),
                source,
            },
        })?;

        let mut drivers = self.drivers.write().await;
        Ok(drivers
            .entry(connection.to_string())
            .or_insert(resolved)
            .clone())
    }

    /// Registers a freshly created resource, logging the orphan risk if the
    /// registry write fails after the backend already provisioned.
    async fn register_created(
        &self,
        connection: &str,
        kind: ResourceKind,
        iid: &Iid,
    ) -> Result<()> {
        if let Err(e) = self.registry.register(connection, kind, iid).await {
            tracing::warn!(
                connection,
                kind = %kind,
                iid = %iid,
                error = %e,
                "backend created resource but registration failed; repair via list_all_resource"
            );
            return Err(e.into());
        }
        Ok(())
    }

    // ---- Image ----

    pub async fn create_image(&self, connection: &str, name: &str) -> Result<ImageInfo> {
        let driver = self.driver(connection).await?;
        let req = ImageReq {
            iid: Iid::from_name(name),
        };

        let info = driver.create_image(req).await.map_err(|e| {
            CoreError::backend(connection, ResourceKind::Image, name, "create", e)
        })?;

        self.register_created(connection, ResourceKind::Image, &info.iid)
            .await?;
        Ok(info)
    }

    pub async fn list_images(&self, connection: &str) -> Result<Vec<ImageInfo>> {
        let driver = self.driver(connection).await?;
        let records = self
            .registry
            .list_records(connection, ResourceKind::Image)
            .await;

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            match driver.get_image(&record.iid()).await {
                Ok(info) => out.push(info),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(connection, name = %record.name_id, "image drifted: registered but missing on backend");
                    out.push(ImageInfo {
                        iid: record.iid(),
                        ..Default::default()
                    });
                }
                Err(e) => {
                    return Err(CoreError::backend(
                        connection,
                        ResourceKind::Image,
                        &record.name_id,
                        "list",
                        e,
                    ))
                }
            }
        }
        Ok(out)
    }

    pub async fn get_image(&self, connection: &str, name: &str) -> Result<ImageInfo> {
        let record = self
            .registry
            .lookup(connection, ResourceKind::Image, name)
            .await?;
        let driver = self.driver(connection).await?;
        driver
            .get_image(&record.iid())
            .await
            .map_err(|e| CoreError::backend(connection, ResourceKind::Image, name, "get", e))
    }

    // ---- VPC ----

    pub async fn create_vpc(&self, connection: &str, req: VpcCreateRequest) -> Result<VpcInfo> {
        names::validate_vpc_name(&req.name)?;

        let driver = self.driver(connection).await?;
        let driver_req = VpcReq {
            iid: Iid::from_name(&req.name),
            ipv4_cidr: req.ipv4_cidr,
            subnets: req
                .subnets
                .into_iter()
                .map(|s| SubnetReq {
                    iid: Iid::from_name(s.name),
                    ipv4_cidr: s.ipv4_cidr,
                })
                .collect(),
        };

        let info = driver.create_vpc(driver_req).await.map_err(|e| {
            CoreError::backend(connection, ResourceKind::Vpc, &req.name, "create", e)
        })?;

        self.register_created(connection, ResourceKind::Vpc, &info.iid)
            .await?;
        Ok(info)
    }

    pub async fn list_vpcs(&self, connection: &str) -> Result<Vec<VpcInfo>> {
        let driver = self.driver(connection).await?;
        let records = self
            .registry
            .list_records(connection, ResourceKind::Vpc)
            .await;

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            match driver.get_vpc(&record.iid()).await {
                Ok(info) => out.push(info),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(connection, name = %record.name_id, "vpc drifted: registered but missing on backend");
                    out.push(VpcInfo {
                        iid: record.iid(),
                        ..Default::default()
                    });
                }
                Err(e) => {
                    return Err(CoreError::backend(
                        connection,
                        ResourceKind::Vpc,
                        &record.name_id,
                        "list",
                        e,
                    ))
                }
            }
        }
        Ok(out)
    }

    pub async fn get_vpc(&self, connection: &str, name: &str) -> Result<VpcInfo> {
        let record = self
            .registry
            .lookup(connection, ResourceKind::Vpc, name)
            .await?;
        let driver = self.driver(connection).await?;
        driver
            .get_vpc(&record.iid())
            .await
            .map_err(|e| CoreError::backend(connection, ResourceKind::Vpc, name, "get", e))
    }

    // ---- Security group ----

    pub async fn create_security_group(
        &self,
        connection: &str,
        req: SecurityGroupCreateRequest,
    ) -> Result<SecurityGroupInfo> {
        names::validate_sg_name(&req.name)?;

        // Flat registry name: {vpc}-delimiter-{local}
        let flat_name = names::encode(&req.vpc_name, &req.name);

        let driver = self.driver(connection).await?;
        let driver_req = SecurityGroupReq {
            iid: Iid::from_name(&flat_name),
            vpc_iid: Iid::from_name(&req.vpc_name),
            direction: req.direction,
            rules: req.rules,
        };

        let info = driver.create_security_group(driver_req).await.map_err(|e| {
            CoreError::backend(connection, ResourceKind::SecurityGroup, &flat_name, "create", e)
        })?;

        self.register_created(connection, ResourceKind::SecurityGroup, &info.iid)
            .await?;
        Ok(info)
    }

    pub async fn list_security_groups(&self, connection: &str) -> Result<Vec<SecurityGroupInfo>> {
        let driver = self.driver(connection).await?;
        let records = self
            .registry
            .list_records(connection, ResourceKind::SecurityGroup)
            .await;

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            match driver.get_security_group(&record.iid()).await {
                Ok(info) => out.push(info),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(connection, name = %record.name_id, "security group drifted: registered but missing on backend");
                    out.push(SecurityGroupInfo {
                        iid: record.iid(),
                        ..Default::default()
                    });
                }
                Err(e) => {
                    return Err(CoreError::backend(
                        connection,
                        ResourceKind::SecurityGroup,
                        &record.name_id,
                        "list",
                        e,
                    ))
                }
            }
        }
        Ok(out)
    }

    /// Gets a security group by its flat compound name.
    pub async fn get_security_group(
        &self,
        connection: &str,
        flat_name: &str,
    ) -> Result<SecurityGroupInfo> {
        let record = self
            .registry
            .lookup(connection, ResourceKind::SecurityGroup, flat_name)
            .await?;
        let driver = self.driver(connection).await?;
        driver.get_security_group(&record.iid()).await.map_err(|e| {
            CoreError::backend(connection, ResourceKind::SecurityGroup, flat_name, "get", e)
        })
    }

    // ---- Key pair ----

    pub async fn create_key_pair(&self, connection: &str, name: &str) -> Result<KeyPairInfo> {
        let driver = self.driver(connection).await?;
        let req = KeyPairReq {
            iid: Iid::from_name(name),
        };

        let info = driver.create_key_pair(req).await.map_err(|e| {
            CoreError::backend(connection, ResourceKind::KeyPair, name, "create", e)
        })?;

        self.register_created(connection, ResourceKind::KeyPair, &info.iid)
            .await?;
        Ok(info)
    }

    pub async fn list_key_pairs(&self, connection: &str) -> Result<Vec<KeyPairInfo>> {
        let driver = self.driver(connection).await?;
        let records = self
            .registry
            .list_records(connection, ResourceKind::KeyPair)
            .await;

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            match driver.get_key_pair(&record.iid()).await {
                Ok(info) => out.push(info),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(connection, name = %record.name_id, "key pair drifted: registered but missing on backend");
                    out.push(KeyPairInfo {
                        iid: record.iid(),
                        ..Default::default()
                    });
                }
                Err(e) => {
                    return Err(CoreError::backend(
                        connection,
                        ResourceKind::KeyPair,
                        &record.name_id,
                        "list",
                        e,
                    ))
                }
            }
        }
        Ok(out)
    }

    pub async fn get_key_pair(&self, connection: &str, name: &str) -> Result<KeyPairInfo> {
        let record = self
            .registry
            .lookup(connection, ResourceKind::KeyPair, name)
            .await?;
        let driver = self.driver(connection).await?;
        driver
            .get_key_pair(&record.iid())
            .await
            .map_err(|e| CoreError::backend(connection, ResourceKind::KeyPair, name, "get", e))
    }

    // ---- VM ----

    pub async fn start_vm(&self, connection: &str, req: VmStartRequest) -> Result<VmInfo> {
        let driver = self.driver(connection).await?;

        // Expand each security group local name to its flat compound name.
        let security_group_iids = req
            .security_group_names
            .iter()
            .map(|sg| Iid::from_name(names::encode(&req.vpc_name, sg)))
            .collect();

        let driver_req = VmReq {
            iid: Iid::from_name(&req.name),
            image_iid: Iid::from_name(&req.image_name),
            vpc_iid: Iid::from_name(&req.vpc_name),
            subnet_iid: Iid::from_name(&req.subnet_name),
            security_group_iids,
            spec_name: req.spec_name,
            key_pair_iid: Iid::from_name(&req.key_pair_name),
            vm_user_id: req.vm_user_id,
            vm_user_passwd: req.vm_user_passwd,
        };

        let info = driver
            .start_vm(driver_req)
            .await
            .map_err(|e| CoreError::backend(connection, ResourceKind::Vm, &req.name, "start", e))?;

        self.register_created(connection, ResourceKind::Vm, &info.iid)
            .await?;
        tracing::info!(connection, name = %req.name, system_id = %info.iid.system_id, "vm started");
        Ok(info)
    }

    pub async fn list_vms(&self, connection: &str) -> Result<Vec<VmInfo>> {
        let driver = self.driver(connection).await?;
        let records = self.registry.list_records(connection, ResourceKind::Vm).await;

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            match driver.get_vm(&record.iid()).await {
                Ok(info) => out.push(info),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(connection, name = %record.name_id, "vm drifted: registered but missing on backend");
                    out.push(VmInfo {
                        iid: record.iid(),
                        ..Default::default()
                    });
                }
                Err(e) => {
                    return Err(CoreError::backend(
                        connection,
                        ResourceKind::Vm,
                        &record.name_id,
                        "list",
                        e,
                    ))
                }
            }
        }
        Ok(out)
    }

    pub async fn get_vm(&self, connection: &str, name: &str) -> Result<VmInfo> {
        let record = self
            .registry
            .lookup(connection, ResourceKind::Vm, name)
            .await?;
        let driver = self.driver(connection).await?;
        driver
            .get_vm(&record.iid())
            .await
            .map_err(|e| CoreError::backend(connection, ResourceKind::Vm, name, "get", e))
    }

    /// Validates the action against the fixed set, then dispatches. Returns
    /// the canonical state after the backend accepts the action; callers
    /// poll [`Orchestrator::get_vm_status`] for transition completion.
    pub async fn control_vm(&self, connection: &str, name: &str, action: &str) -> Result<VmState> {
        let action = parse_action(action)?;

        let record = self
            .registry
            .lookup(connection, ResourceKind::Vm, name)
            .await?;
        let driver = self.driver(connection).await?;

        let raw = driver
            .control_vm(&record.iid(), action)
            .await
            .map_err(|e| CoreError::backend(connection, ResourceKind::Vm, name, "control", e))?;

        tracing::info!(connection, name, %action, status = %raw, "vm control accepted");
        Ok(VmState::from_backend(&raw))
    }

    pub async fn get_vm_status(&self, connection: &str, name: &str) -> Result<VmState> {
        let record = self
            .registry
            .lookup(connection, ResourceKind::Vm, name)
            .await?;
        let driver = self.driver(connection).await?;

        let raw = driver
            .vm_status(&record.iid())
            .await
            .map_err(|e| CoreError::backend(connection, ResourceKind::Vm, name, "status", e))?;
        Ok(VmState::from_backend(&raw))
    }

    /// Backend-wide status listing, canonicalized. Unregistered VMs appear
    /// too; this is a raw view of the backend, not of the registry.
    pub async fn list_vm_status(&self, connection: &str) -> Result<Vec<VmStatusInfo>> {
        let driver = self.driver(connection).await?;

        let entries = driver
            .list_vm_status()
            .await
            .map_err(|e| CoreError::backend(connection, ResourceKind::Vm, "*", "status", e))?;

        Ok(entries
            .into_iter()
            .map(|entry| VmStatusInfo {
                state: VmState::from_backend(&entry.raw_status),
                iid: entry.iid,
            })
            .collect())
    }

    // ---- Delete / reconciliation (kind-generic) ----

    /// Deletes a managed resource by name.
    ///
    /// Without `force`: backend delete must confirm before the registry
    /// entry is dropped; backend failure surfaces and the registry stays
    /// intact. With `force`: the registry entry is dropped regardless of the
    /// backend outcome — a best-effort forget that can leave a live orphan
    /// on the backend, reported in the returned outcome.
    pub async fn delete_resource(
        &self,
        connection: &str,
        kind: ResourceKind,
        name: &str,
        force: bool,
    ) -> Result<DeleteOutcome> {
        let record = self.registry.lookup(connection, kind, name).await?;
        let driver = self.driver(connection).await?;
        let iid = record.iid();

        let backend_result: std::result::Result<DeleteOutcome, DriverError> = match kind {
            ResourceKind::Image => driver.delete_image(&iid).await.map(|deleted| DeleteOutcome {
                deleted,
                vm_status: None,
            }),
            ResourceKind::Vpc => driver.delete_vpc(&iid).await.map(|deleted| DeleteOutcome {
                deleted,
                vm_status: None,
            }),
            ResourceKind::SecurityGroup => {
                driver
                    .delete_security_group(&iid)
                    .await
                    .map(|deleted| DeleteOutcome {
                        deleted,
                        vm_status: None,
                    })
            }
            ResourceKind::KeyPair => {
                driver
                    .delete_key_pair(&iid)
                    .await
                    .map(|deleted| DeleteOutcome {
                        deleted,
                        vm_status: None,
                    })
            }
            // Terminate reports the raw status the VM was terminated from.
            ResourceKind::Vm => driver.terminate_vm(&iid).await.map(|status| DeleteOutcome {
                deleted: true,
                vm_status: Some(status),
            }),
        };

        match backend_result {
            Ok(outcome) => {
                if outcome.deleted {
                    self.registry.remove(connection, kind, name).await?;
                    tracing::info!(connection, kind = %kind, name, "resource deleted");
                } else if force {
                    self.registry.remove(connection, kind, name).await?;
                    tracing::warn!(
                        connection,
                        kind = %kind,
                        name,
                        "backend did not confirm delete; registry entry force-dropped"
                    );
                }
                Ok(outcome)
            }
            Err(e) if force => {
                // Operator escape hatch: forget locally, report the backend
                // failure in the outcome instead of swallowing it.
                self.registry.remove(connection, kind, name).await?;
                tracing::warn!(
                    connection,
                    kind = %kind,
                    name,
                    error = %e,
                    "force delete: backend failed, registry entry dropped; backend resource may be orphaned"
                );
                Ok(DeleteOutcome {
                    deleted: false,
                    vm_status: None,
                })
            }
            Err(e) => Err(CoreError::backend(connection, kind, name, "delete", e)),
        }
    }

    /// Deletes a backend resource by its system id, bypassing the registry.
    ///
    /// For cleaning up unmanaged remote resources discovered through
    /// [`Orchestrator::list_all_resource`]; there is no registry entry to
    /// remove.
    pub async fn delete_backend_resource(
        &self,
        connection: &str,
        kind: ResourceKind,
        system_id: &str,
    ) -> Result<DeleteOutcome> {
        let driver = self.driver(connection).await?;
        let iid = Iid::from_system_id(system_id);

        let outcome = match kind {
            ResourceKind::Image => DeleteOutcome {
                deleted: driver.delete_image(&iid).await.map_err(|e| {
                    CoreError::backend(connection, kind, system_id, "delete", e)
                })?,
                vm_status: None,
            },
            ResourceKind::Vpc => DeleteOutcome {
                deleted: driver.delete_vpc(&iid).await.map_err(|e| {
                    CoreError::backend(connection, kind, system_id, "delete", e)
                })?,
                vm_status: None,
            },
            ResourceKind::SecurityGroup => DeleteOutcome {
                deleted: driver.delete_security_group(&iid).await.map_err(|e| {
                    CoreError::backend(connection, kind, system_id, "delete", e)
                })?,
                vm_status: None,
            },
            ResourceKind::KeyPair => DeleteOutcome {
                deleted: driver.delete_key_pair(&iid).await.map_err(|e| {
                    CoreError::backend(connection, kind, system_id, "delete", e)
                })?,
                vm_status: None,
            },
            ResourceKind::Vm => {
                let status = driver.terminate_vm(&iid).await.map_err(|e| {
                    CoreError::backend(connection, kind, system_id, "delete", e)
                })?;
                DeleteOutcome {
                    deleted: true,
                    vm_status: Some(status),
                }
            }
        };

        tracing::info!(connection, kind = %kind, system_id, "backend resource deleted (unmanaged)");
        Ok(outcome)
    }

    /// Reconciliation view for one `(connection, kind)`: classifies the
    /// registry snapshot against the backend's full listing. Mutates
    /// nothing; this is the input for operator drift-repair tooling.
    pub async fn list_all_resource(
        &self,
        connection: &str,
        kind: ResourceKind,
    ) -> Result<AllResourceList> {
        let driver = self.driver(connection).await?;
        let records = self.registry.list_records(connection, kind).await;

        let backend_iids: Vec<Iid> = match kind {
            ResourceKind::Image => driver
                .list_images()
                .await
                .map_err(|e| CoreError::backend(connection, kind, "*", "list", e))?
                .into_iter()
                .map(|i| i.iid)
                .collect(),
            ResourceKind::Vpc => driver
                .list_vpcs()
                .await
                .map_err(|e| CoreError::backend(connection, kind, "*", "list", e))?
                .into_iter()
                .map(|i| i.iid)
                .collect(),
            ResourceKind::SecurityGroup => driver
                .list_security_groups()
                .await
                .map_err(|e| CoreError::backend(connection, kind, "*", "list", e))?
                .into_iter()
                .map(|i| i.iid)
                .collect(),
            ResourceKind::KeyPair => driver
                .list_key_pairs()
                .await
                .map_err(|e| CoreError::backend(connection, kind, "*", "list", e))?
                .into_iter()
                .map(|i| i.iid)
                .collect(),
            ResourceKind::Vm => driver
                .list_vms()
                .await
                .map_err(|e| CoreError::backend(connection, kind, "*", "list", e))?
                .into_iter()
                .map(|i| i.iid)
                .collect(),
        };

        let backend_ids: HashSet<&str> =
            backend_iids.iter().map(|iid| iid.system_id.as_str()).collect();
        let registered_ids: HashSet<&str> =
            records.iter().map(|r| r.system_id.as_str()).collect();

        let mut all = AllResourceList::default();
        for record in &records {
            if backend_ids.contains(record.system_id.as_str()) {
                all.managed.push(record.iid());
            } else {
                all.orphaned_local.push(record.iid());
            }
        }
        for iid in backend_iids {
            if !registered_ids.contains(iid.system_id.as_str()) {
                all.unmanaged_remote.push(iid);
            }
        }

        tracing::debug!(
            connection,
            kind = %kind,
            managed = all.managed.len(),
            orphaned_local = all.orphaned_local.len(),
            unmanaged_remote = all.unmanaged_remote.len(),
            "reconciliation snapshot"
        );
        Ok(all)
    }
}
