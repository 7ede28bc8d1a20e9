//! Registry records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skybridge_driver::{Iid, ResourceKind};

/// One managed resource: the registry's unit of truth.
///
/// Created only after the backend create call returned a system id; removed
/// only after a confirmed backend delete, or forcibly on operator override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub connection: String,
    pub kind: ResourceKind,
    pub name_id: String,
    pub system_id: String,
    pub created_at: DateTime<Utc>,
}

impl ResourceRecord {
    pub fn new(connection: impl Into<String>, kind: ResourceKind, iid: &Iid) -> Self {
        Self {
            connection: connection.into(),
            kind,
            name_id: iid.name_id.clone(),
            system_id: iid.system_id.clone(),
            created_at: Utc::now(),
        }
    }

    /// The registry key this record occupies.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            connection: self.connection.clone(),
            kind: self.kind,
            name_id: self.name_id.clone(),
        }
    }

    pub fn iid(&self) -> Iid {
        Iid::new(self.name_id.clone(), self.system_id.clone())
    }
}

/// Uniqueness key: `(connection, kind, name_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub connection: String,
    pub kind: ResourceKind,
    pub name_id: String,
}

impl RecordKey {
    pub fn new(connection: &str, kind: ResourceKind, name_id: &str) -> Self {
        Self {
            connection: connection.to_string(),
            kind,
            name_id: name_id.to_string(),
        }
    }
}
