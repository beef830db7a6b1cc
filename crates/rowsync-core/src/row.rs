use rowsync_api::{Fields, LifecycleState, RowId, RowRecord, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Collection-local row identity.
///
/// Assigned when a row enters a collection and never reused by that
/// collection, so it stays stable while positions and serials shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey(pub(crate) u64);

impl RowKey {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row#{}", self.0)
    }
}

/// Row as handed to the collection by a load: persisted rows carry an id,
/// seed rows for a new report do not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub id: Option<RowId>,
    pub fields: Fields,
}

impl SnapshotRow {
    pub fn persisted(id: impl Into<RowId>, fields: Fields) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }

    pub fn seed(fields: Fields) -> Self {
        Self { id: None, fields }
    }
}

/// One tracked row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub(crate) key: RowKey,
    pub(crate) id: Option<RowId>,
    pub(crate) serial: usize,
    pub(crate) state: LifecycleState,
    pub(crate) fields: Fields,
}

impl Row {
    pub fn key(&self) -> RowKey {
        self.key
    }

    pub fn id(&self) -> Option<&RowId> {
        self.id.as_ref()
    }

    /// 1-based serial number shown next to the row.
    pub fn serial(&self) -> usize {
        self.serial
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn is_deleted(&self) -> bool {
        self.state == LifecycleState::Deleted
    }

    pub fn to_record(&self) -> RowRecord {
        RowRecord {
            id: self.id.clone(),
            serial: self.serial,
            state: self.state,
            fields: self.fields.clone(),
        }
    }
}
