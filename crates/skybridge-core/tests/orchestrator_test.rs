//! End-to-end orchestrator tests against the mock backend driver.

use anyhow::Result;
use skybridge_core::{
    CoreError, Orchestrator, SecurityGroupCreateRequest, SubnetDef, VmStartRequest, VmState,
    VpcCreateRequest,
};
use skybridge_driver::{CloudDriver, Iid, KeyPairReq, ResourceKind, StaticResolver};
use skybridge_driver_mock::MockDriver;
use skybridge_registry::IdentityRegistry;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    orchestrator: Orchestrator,
    driver: Arc<MockDriver>,
    _store: TempDir,
}

const CONN: &str = "mock-conn";

async fn harness() -> Result<Harness> {
    let store = tempfile::tempdir()?;
    let driver = Arc::new(MockDriver::new("mock-01"));
    let resolver = StaticResolver::new().with_driver(CONN, driver.clone());
    let registry = Arc::new(IdentityRegistry::open(store.path()).await?);

    Ok(Harness {
        orchestrator: Orchestrator::new(Arc::new(resolver), registry),
        driver,
        _store: store,
    })
}

fn vm_request(name: &str) -> VmStartRequest {
    VmStartRequest {
        name: name.to_string(),
        image_name: "ubuntu-24".to_string(),
        vpc_name: "prod".to_string(),
        subnet_name: "prod-a".to_string(),
        security_group_names: vec!["web".to_string(), "ssh".to_string()],
        spec_name: "small".to_string(),
        key_pair_name: "kp".to_string(),
        vm_user_id: String::new(),
        vm_user_passwd: String::new(),
    }
}

#[tokio::test]
async fn create_then_get_roundtrip() -> Result<()> {
    let h = harness().await?;

    let created = h.orchestrator.create_key_pair(CONN, "kp-01").await?;
    assert_eq!(created.iid.name_id, "kp-01");
    assert!(created.iid.is_registered());

    let fetched = h.orchestrator.get_key_pair(CONN, "kp-01").await?;
    assert_eq!(fetched.iid, created.iid);
    Ok(())
}

#[tokio::test]
async fn delete_then_get_is_not_found() -> Result<()> {
    let h = harness().await?;
    h.orchestrator.create_key_pair(CONN, "kp-01").await?;

    let outcome = h
        .orchestrator
        .delete_resource(CONN, ResourceKind::KeyPair, "kp-01", false)
        .await?;
    assert!(outcome.deleted);
    assert!(outcome.vm_status.is_none());

    let err = h.orchestrator.get_key_pair(CONN, "kp-01").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn backend_delete_failure_without_force_keeps_registry() -> Result<()> {
    let h = harness().await?;
    h.orchestrator.create_key_pair(CONN, "kp-01").await?;
    h.driver.fail_delete("kp-01").await;

    let err = h
        .orchestrator
        .delete_resource(CONN, ResourceKind::KeyPair, "kp-01", false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Backend { .. }));

    // Still managed: registry intact.
    h.orchestrator
        .registry()
        .lookup(CONN, ResourceKind::KeyPair, "kp-01")
        .await?;
    Ok(())
}

#[tokio::test]
async fn force_delete_drops_registry_and_reports_backend_outcome() -> Result<()> {
    let h = harness().await?;
    h.orchestrator.create_key_pair(CONN, "kp-01").await?;
    h.driver.fail_delete("kp-01").await;

    let outcome = h
        .orchestrator
        .delete_resource(CONN, ResourceKind::KeyPair, "kp-01", true)
        .await?;
    // The backend did not delete; the outcome says so, but the local
    // bookkeeping is gone.
    assert!(!outcome.deleted);
    assert!(h
        .orchestrator
        .registry()
        .lookup(CONN, ResourceKind::KeyPair, "kp-01")
        .await
        .is_err());
    Ok(())
}

#[tokio::test]
async fn list_all_classifies_three_ways() -> Result<()> {
    let h = harness().await?;

    // Managed: created through the orchestrator.
    let a = h.orchestrator.create_key_pair(CONN, "kp-a").await?;

    // Local orphan: registered, but the backend never had it.
    h.orchestrator
        .registry()
        .register(CONN, ResourceKind::KeyPair, &Iid::new("kp-b", "sys-b"))
        .await?;

    // Unmanaged remote: exists on the backend only.
    let c = h
        .driver
        .create_key_pair(KeyPairReq {
            iid: Iid::from_name("kp-c"),
        })
        .await?;

    let all = h
        .orchestrator
        .list_all_resource(CONN, ResourceKind::KeyPair)
        .await?;

    assert_eq!(all.managed.len(), 1);
    assert_eq!(all.managed[0].system_id, a.iid.system_id);
    assert_eq!(all.orphaned_local.len(), 1);
    assert_eq!(all.orphaned_local[0].name_id, "kp-b");
    assert_eq!(all.unmanaged_remote.len(), 1);
    assert_eq!(all.unmanaged_remote[0].system_id, c.iid.system_id);
    Ok(())
}

#[tokio::test]
async fn delete_backend_resource_bypasses_registry() -> Result<()> {
    let h = harness().await?;

    let orphan = h
        .driver
        .create_key_pair(KeyPairReq {
            iid: Iid::from_name("stray"),
        })
        .await?;

    let outcome = h
        .orchestrator
        .delete_backend_resource(CONN, ResourceKind::KeyPair, &orphan.iid.system_id)
        .await?;
    assert!(outcome.deleted);

    let all = h
        .orchestrator
        .list_all_resource(CONN, ResourceKind::KeyPair)
        .await?;
    assert!(all.unmanaged_remote.is_empty());
    Ok(())
}

#[tokio::test]
async fn reserved_vpc_name_rejected_before_any_backend_call() -> Result<()> {
    let h = harness().await?;

    let err = h
        .orchestrator
        .create_vpc(
            CONN,
            VpcCreateRequest {
                name: "subnet:prod".to_string(),
                ipv4_cidr: "10.0.0.0/16".to_string(),
                subnets: vec![],
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(h.driver.call_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn vpc_create_carries_embedded_subnets() -> Result<()> {
    let h = harness().await?;

    let vpc = h
        .orchestrator
        .create_vpc(
            CONN,
            VpcCreateRequest {
                name: "prod".to_string(),
                ipv4_cidr: "10.0.0.0/16".to_string(),
                subnets: vec![
                    SubnetDef {
                        name: "prod-a".to_string(),
                        ipv4_cidr: "10.0.1.0/24".to_string(),
                    },
                    SubnetDef {
                        name: "prod-b".to_string(),
                        ipv4_cidr: "10.0.2.0/24".to_string(),
                    },
                ],
            },
        )
        .await?;

    assert_eq!(vpc.subnets.len(), 2);
    assert!(vpc.subnets.iter().all(|s| s.iid.is_registered()));
    Ok(())
}

#[tokio::test]
async fn security_group_gets_flat_compound_name() -> Result<()> {
    let h = harness().await?;

    let sg = h
        .orchestrator
        .create_security_group(
            CONN,
            SecurityGroupCreateRequest {
                name: "web".to_string(),
                vpc_name: "prod".to_string(),
                direction: "inbound".to_string(),
                rules: vec![],
            },
        )
        .await?;

    assert_eq!(sg.iid.name_id, "prod-delimiter-web");

    // Addressable by the flat name.
    let fetched = h
        .orchestrator
        .get_security_group(CONN, "prod-delimiter-web")
        .await?;
    assert_eq!(fetched.iid, sg.iid);
    Ok(())
}

#[tokio::test]
async fn sg_name_with_delimiter_prefix_is_rejected() -> Result<()> {
    let h = harness().await?;

    let err = h
        .orchestrator
        .create_security_group(
            CONN,
            SecurityGroupCreateRequest {
                name: "-delimiter-web".to_string(),
                vpc_name: "prod".to_string(),
                direction: "inbound".to_string(),
                rules: vec![],
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(h.driver.call_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn vm_start_expands_security_group_names() -> Result<()> {
    let h = harness().await?;

    let vm = h.orchestrator.start_vm(CONN, vm_request("vm-01")).await?;
    let sg_names: Vec<&str> = vm
        .security_group_iids
        .iter()
        .map(|iid| iid.name_id.as_str())
        .collect();
    assert_eq!(sg_names, vec!["prod-delimiter-web", "prod-delimiter-ssh"]);
    Ok(())
}

#[tokio::test]
async fn vm_control_and_status_are_canonicalized() -> Result<()> {
    let h = harness().await?;
    h.orchestrator.start_vm(CONN, vm_request("vm-01")).await?;

    let accepted = h.orchestrator.control_vm(CONN, "vm-01", "suspend").await?;
    assert_eq!(accepted, VmState::Suspending);

    let settled = h.orchestrator.get_vm_status(CONN, "vm-01").await?;
    assert_eq!(settled, VmState::Suspended);

    let statuses = h.orchestrator.list_vm_status(CONN).await?;
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].state, VmState::Suspended);
    Ok(())
}

#[tokio::test]
async fn unknown_backend_status_fails_closed() -> Result<()> {
    let h = harness().await?;
    h.orchestrator.start_vm(CONN, vm_request("vm-01")).await?;
    h.driver.set_vm_status("vm-01", "weird-provider-state").await;

    let state = h.orchestrator.get_vm_status(CONN, "vm-01").await?;
    assert_eq!(state, VmState::Failed);
    Ok(())
}

#[tokio::test]
async fn invalid_vm_action_rejected_before_any_backend_call() -> Result<()> {
    let h = harness().await?;
    h.orchestrator.start_vm(CONN, vm_request("vm-01")).await?;
    let calls_before = h.driver.call_count().await;

    let err = h
        .orchestrator
        .control_vm(CONN, "vm-01", "hibernate")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidAction(_)));
    assert_eq!(h.driver.call_count().await, calls_before);
    Ok(())
}

#[tokio::test]
async fn vm_terminate_reports_pre_termination_status() -> Result<()> {
    let h = harness().await?;
    h.orchestrator.start_vm(CONN, vm_request("vm-01")).await?;
    h.orchestrator.control_vm(CONN, "vm-01", "suspend").await?;

    let outcome = h
        .orchestrator
        .delete_resource(CONN, ResourceKind::Vm, "vm-01", false)
        .await?;
    assert!(outcome.deleted);
    assert_eq!(outcome.vm_status.as_deref(), Some("Suspended"));

    assert!(h
        .orchestrator
        .registry()
        .lookup(CONN, ResourceKind::Vm, "vm-01")
        .await
        .is_err());
    Ok(())
}

#[tokio::test]
async fn drifted_list_entries_are_surfaced_not_dropped() -> Result<()> {
    let h = harness().await?;
    h.orchestrator.create_key_pair(CONN, "kp-live").await?;
    let gone = h.orchestrator.create_key_pair(CONN, "kp-gone").await?;

    // Backend loses one out of band.
    h.driver.delete_key_pair(&gone.iid).await?;

    let listed = h.orchestrator.list_key_pairs(CONN).await?;
    assert_eq!(listed.len(), 2);

    let drifted = listed
        .iter()
        .find(|k| k.iid.name_id == "kp-gone")
        .expect("drifted entry present");
    // Identity kept, payload empty.
    assert_eq!(drifted.iid.system_id, gone.iid.system_id);
    assert!(drifted.public_key.is_empty());
    Ok(())
}

#[tokio::test]
async fn second_create_with_same_name_fails_and_keeps_original() -> Result<()> {
    let h = harness().await?;
    let first = h.orchestrator.create_key_pair(CONN, "kp").await?;

    assert!(h.orchestrator.create_key_pair(CONN, "kp").await.is_err());

    let record = h
        .orchestrator
        .registry()
        .lookup(CONN, ResourceKind::KeyPair, "kp")
        .await?;
    assert_eq!(record.system_id, first.iid.system_id);
    Ok(())
}

#[tokio::test]
async fn unknown_connection_is_rejected() -> Result<()> {
    let h = harness().await?;
    let err = h
        .orchestrator
        .create_key_pair("no-such-conn", "kp")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ConnectionNotFound(_)));
    Ok(())
}
