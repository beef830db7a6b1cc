//! Change-sets produced by [`ReconciledCollection::diff`](crate::ReconciledCollection::diff).

use rowsync_api::{Fields, RowId};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::row::RowKey;

/// Persisted ids for created rows, keyed by the position the row had in the
/// diff that was saved.
pub type CommitIds = BTreeMap<usize, RowId>;

/// A row that must be created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingCreate {
    pub key: RowKey,
    pub position: usize,
    pub fields: Fields,
}

/// A row whose current fields must be written back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingUpdate {
    pub key: RowKey,
    pub position: usize,
    pub id: RowId,
    pub fields: Fields,
}

/// The three disjoint change-sets a save needs, each in collection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub to_create: Vec<PendingCreate>,
    pub to_update: Vec<PendingUpdate>,
    pub to_delete: Vec<RowId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of persistence calls this change-set needs.
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }
}
