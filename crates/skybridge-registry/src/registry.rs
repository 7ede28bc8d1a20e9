//! Durable identity registry
//!
//! Manages the `registry.json` file which records every resource Skybridge
//! manages, keyed by `(connection, kind, name)`.

use crate::error::{RegistryError, Result};
use crate::record::{RecordKey, ResourceRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skybridge_driver::{Iid, ResourceKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const STORE_VERSION: u32 = 1;
const STORE_FILE: &str = "registry.json";
const STORE_BACKUP: &str = "registry.json.backup";

/// On-disk registry format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    updated_at: DateTime<Utc>,
    records: Vec<ResourceRecord>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            updated_at: Utc::now(),
            records: Vec::new(),
        }
    }
}

/// The name↔system-id mapping store.
///
/// Exclusive owner of the mapping: no other component mutates it. The inner
/// table is guarded by one async mutex; `register` performs its duplicate
/// check, insert, and durable write as a single critical section so that two
/// concurrent creates of the same name cannot both succeed.
#[derive(Debug)]
pub struct IdentityRegistry {
    store_dir: PathBuf,
    table: Mutex<HashMap<RecordKey, ResourceRecord>>,
}

impl IdentityRegistry {
    /// Opens (or initializes) the registry under `store_dir`.
    ///
    /// A missing file loads as an empty registry; a file written by a newer
    /// version is refused.
    pub async fn open(store_dir: impl AsRef<Path>) -> Result<Self> {
        let store_dir = store_dir.as_ref().to_path_buf();
        let file = Self::load_file(&store_dir.join(STORE_FILE)).await?;

        let table: HashMap<RecordKey, ResourceRecord> =
            file.records.into_iter().map(|r| (r.key(), r)).collect();

        tracing::debug!(
            records = table.len(),
            dir = %store_dir.display(),
            "opened identity registry"
        );

        Ok(Self {
            store_dir,
            table: Mutex::new(table),
        })
    }

    async fn load_file(path: &Path) -> Result<StoreFile> {
        if !path.exists() {
            tracing::debug!("registry file not found, starting empty");
            return Ok(StoreFile::default());
        }

        let content = fs::read_to_string(path).await?;
        let file: StoreFile = serde_json::from_str(&content)?;

        if file.version > STORE_VERSION {
            return Err(RegistryError::StoreVersion {
                found: file.version,
                supported: STORE_VERSION,
            });
        }

        Ok(file)
    }

    /// Writes the table out, rotating the previous file to a backup.
    /// Called with the table lock held.
    async fn persist(&self, table: &HashMap<RecordKey, ResourceRecord>) -> Result<()> {
        if !self.store_dir.exists() {
            fs::create_dir_all(&self.store_dir).await?;
        }

        let path = self.store_dir.join(STORE_FILE);
        let backup = self.store_dir.join(STORE_BACKUP);

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        let mut records: Vec<ResourceRecord> = table.values().cloned().collect();
        records.sort_by(|a, b| a.key_tuple().cmp(&b.key_tuple()));

        let file = StoreFile {
            version: STORE_VERSION,
            updated_at: Utc::now(),
            records,
        };

        let content = serde_json::to_string_pretty(&file)?;
        fs::write(&path, content).await?;

        tracing::debug!(records = table.len(), "persisted identity registry");
        Ok(())
    }

    /// Registers an IID for `(connection, kind)`.
    ///
    /// Fails with `DuplicateName` if the name is already taken. Must only be
    /// called after the backend create has returned a populated system id.
    pub async fn register(
        &self,
        connection: &str,
        kind: ResourceKind,
        iid: &Iid,
    ) -> Result<ResourceRecord> {
        let key = RecordKey::new(connection, kind, &iid.name_id);

        let mut table = self.table.lock().await;
        if table.contains_key(&key) {
            return Err(RegistryError::DuplicateName {
                connection: connection.to_string(),
                kind,
                name: iid.name_id.clone(),
            });
        }

        let record = ResourceRecord::new(connection, kind, iid);
        table.insert(key, record.clone());
        self.persist(&table).await?;

        tracing::info!(
            connection,
            kind = %kind,
            name = %iid.name_id,
            system_id = %iid.system_id,
            "registered resource"
        );
        Ok(record)
    }

    /// Looks up the record for a managed resource.
    pub async fn lookup(
        &self,
        connection: &str,
        kind: ResourceKind,
        name_id: &str,
    ) -> Result<ResourceRecord> {
        let key = RecordKey::new(connection, kind, name_id);
        let table = self.table.lock().await;
        table.get(&key).cloned().ok_or_else(|| RegistryError::NotFound {
            connection: connection.to_string(),
            kind,
            name: name_id.to_string(),
        })
    }

    /// Removes a record. Idempotent: returns `Ok(false)` when the record was
    /// already absent, which lets force-delete retries run clean.
    pub async fn remove(
        &self,
        connection: &str,
        kind: ResourceKind,
        name_id: &str,
    ) -> Result<bool> {
        let key = RecordKey::new(connection, kind, name_id);

        let mut table = self.table.lock().await;
        let removed = table.remove(&key).is_some();
        if removed {
            self.persist(&table).await?;
            tracing::info!(connection, kind = %kind, name = name_id, "removed resource record");
        }
        Ok(removed)
    }

    /// Sorted snapshot of managed names for `(connection, kind)`.
    pub async fn list_names(&self, connection: &str, kind: ResourceKind) -> Vec<String> {
        let table = self.table.lock().await;
        let mut names: Vec<String> = table
            .values()
            .filter(|r| r.connection == connection && r.kind == kind)
            .map(|r| r.name_id.clone())
            .collect();
        names.sort();
        names
    }

    /// Snapshot of full records for `(connection, kind)`, sorted by name.
    pub async fn list_records(&self, connection: &str, kind: ResourceKind) -> Vec<ResourceRecord> {
        let table = self.table.lock().await;
        let mut records: Vec<ResourceRecord> = table
            .values()
            .filter(|r| r.connection == connection && r.kind == kind)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.name_id.cmp(&b.name_id));
        records
    }
}

impl ResourceRecord {
    fn key_tuple(&self) -> (String, &'static str, String) {
        (self.connection.clone(), self.kind.as_str(), self.name_id.clone())
    }
}
