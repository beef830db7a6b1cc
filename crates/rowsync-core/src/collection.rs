//! The reconciled row collection behind every editable report table.
//!
//! Rows carry a lifecycle tag (`Clean`, `New`, `Modified`, `Deleted`) so
//! that a save can be reduced to the minimal set of create, update and
//! delete calls. The collection never talks to a backend itself: callers
//! take a [`ChangeSet`] from [`ReconciledCollection::diff`], persist it, and
//! hand the returned ids back through [`ReconciledCollection::commit`].

use rowsync_api::{Fields, LifecycleState, OptionItem, RowRecord, Value};
use tracing::debug;

use crate::autofill::{autofill, AutofillRule, ReferenceOptions};
use crate::diff::{ChangeSet, CommitIds, PendingCreate, PendingUpdate};
use crate::error::{ReconcileError, Result};
use crate::lifecycle::{self, DeleteOutcome};
use crate::row::{Row, RowKey, SnapshotRow};

/// One-time hydration gate.
///
/// A collection accepts exactly one hydration from its owner. Once hydrated,
/// either explicitly or by the first local edit, later hydrations are
/// ignored so a late-arriving snapshot cannot clobber local edits. Use
/// [`ReconciledCollection::reload`] to replace the rows deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hydration {
    #[default]
    Uninitialized,
    Hydrated,
}

#[derive(Debug, Clone, Default)]
pub struct ReconciledCollection {
    rows: Vec<Row>,
    next_key: u64,
    hydration: Hydration,
    autofill_rules: Vec<AutofillRule>,
    reference_options: ReferenceOptions,
}

impl ReconciledCollection {
    /// Create an empty, uninitialized collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection hydrated from `snapshot`.
    pub fn from_snapshot(snapshot: impl IntoIterator<Item = SnapshotRow>) -> Self {
        let mut collection = Self::new();
        collection.hydrate(snapshot);
        collection
    }

    pub fn with_autofill(mut self, rules: Vec<AutofillRule>) -> Self {
        self.autofill_rules = rules;
        self
    }

    pub fn hydration(&self) -> Hydration {
        self.hydration
    }

    /// Load rows through the hydration gate.
    ///
    /// Returns `false` (and changes nothing) when the collection was already
    /// hydrated or locally edited.
    pub fn hydrate(&mut self, snapshot: impl IntoIterator<Item = SnapshotRow>) -> bool {
        if self.hydration == Hydration::Hydrated {
            debug!("Ignoring hydration of an already hydrated collection");
            return false;
        }
        self.replace_rows(snapshot);
        true
    }

    /// Replace all rows with a fresh snapshot, bypassing the hydration gate.
    /// Used after a successful save-and-reload.
    pub fn reload(&mut self, snapshot: impl IntoIterator<Item = SnapshotRow>) {
        self.replace_rows(snapshot);
    }

    fn replace_rows(&mut self, snapshot: impl IntoIterator<Item = SnapshotRow>) {
        self.rows.clear();
        for SnapshotRow { id, fields } in snapshot {
            let row = self.make_row(id, fields);
            self.rows.push(row);
        }
        self.renumber();
        self.hydration = Hydration::Hydrated;
        debug!("Hydrated collection with {} rows", self.rows.len());
    }

    fn make_row(&mut self, id: Option<rowsync_api::RowId>, fields: Fields) -> Row {
        let key = RowKey(self.next_key);
        self.next_key += 1;
        Row {
            key,
            state: lifecycle::on_load(id.is_some()),
            id,
            serial: 0,
            fields,
        }
    }

    fn renumber(&mut self) {
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.serial = index + 1;
        }
    }

    fn row_at(&self, position: usize) -> Result<&Row> {
        self.rows.get(position).ok_or(ReconcileError::OutOfRange {
            position,
            len: self.rows.len(),
        })
    }

    /// Append a new, never-persisted row and return its position.
    pub fn add_row(&mut self, initial_fields: Fields) -> usize {
        let mut row = self.make_row(None, initial_fields);
        row.serial = self.rows.len() + 1;
        self.rows.push(row);
        self.hydration = Hydration::Hydrated;
        let position = self.rows.len() - 1;
        debug!("Added new row at position {}", position);
        position
    }

    /// Set one field of the row at `position`.
    ///
    /// Returns `Ok(false)` when the value equals the current one; nothing
    /// changes in that case. A changed value moves a `Clean` row to
    /// `Modified` and applies any auto-fill rule triggered by `field`.
    /// Editing back to the original value does not return the row to
    /// `Clean`.
    pub fn edit_field(
        &mut self,
        position: usize,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<bool> {
        let row = self.row_at(position)?;
        let next_state = lifecycle::on_edit(row.state).ok_or(ReconcileError::InvalidState {
            position,
            state: row.state,
            operation: "edit",
        })?;

        let value = value.into();
        let unchanged = match row.fields.get(field) {
            Some(current) => *current == value,
            None => value.is_null(),
        };
        if unchanged {
            return Ok(false);
        }

        let derived = autofill(&self.autofill_rules, field, &value, &self.reference_options);
        let row = &mut self.rows[position];
        let previous_state = row.state;
        row.fields.insert(field, value);
        for (target, derived_value) in derived {
            if derived_value.is_null() && !row.fields.contains(&target) {
                continue;
            }
            row.fields.insert(target, derived_value);
        }
        row.state = next_state;
        self.hydration = Hydration::Hydrated;

        debug!(
            "Edited field '{}' of row {} ({} -> {})",
            field, position, previous_state, next_state
        );
        Ok(true)
    }

    /// Delete the row at `position`.
    ///
    /// Never-persisted rows are removed outright and the remaining rows are
    /// renumbered. Persisted rows become `Deleted` tombstones and keep their
    /// place.
    pub fn delete_row(&mut self, position: usize) -> Result<DeleteOutcome> {
        let row = self.row_at(position)?;
        let outcome = lifecycle::on_delete(row.state, row.id.is_some()).ok_or(
            ReconcileError::InvalidState {
                position,
                state: row.state,
                operation: "delete",
            },
        )?;

        match outcome {
            DeleteOutcome::Removed => {
                self.rows.remove(position);
                self.renumber();
            }
            DeleteOutcome::Tombstoned => {
                self.rows[position].state = LifecycleState::Deleted;
            }
        }
        self.hydration = Hydration::Hydrated;

        debug!("Deleted row {} ({:?})", position, outcome);
        Ok(outcome)
    }

    /// Undo a delete. The row comes back as `Modified`.
    pub fn restore_row(&mut self, position: usize) -> Result<()> {
        let row = self.row_at(position)?;
        let next_state = lifecycle::on_restore(row.state).ok_or(ReconcileError::InvalidState {
            position,
            state: row.state,
            operation: "restore",
        })?;

        self.rows[position].state = next_state;
        self.hydration = Hydration::Hydrated;
        debug!("Restored row {}", position);
        Ok(())
    }

    /// Compute the pending creates, updates and deletes. Pure.
    pub fn diff(&self) -> ChangeSet {
        let mut changes = ChangeSet::default();
        for (position, row) in self.rows.iter().enumerate() {
            match (row.state, &row.id) {
                (LifecycleState::New, _) => changes.to_create.push(PendingCreate {
                    key: row.key,
                    position,
                    fields: row.fields.clone(),
                }),
                (LifecycleState::Modified, Some(id)) => changes.to_update.push(PendingUpdate {
                    key: row.key,
                    position,
                    id: id.clone(),
                    fields: row.fields.clone(),
                }),
                (LifecycleState::Deleted, Some(id)) => changes.to_delete.push(id.clone()),
                _ => {}
            }
        }
        changes
    }

    /// Mark the last diff as persisted.
    ///
    /// Tombstones are dropped, new rows receive the ids in `ids` (keyed by
    /// their position in the diff), and every surviving row becomes `Clean`.
    /// The id map is validated first; on error nothing changes.
    pub fn commit(&mut self, ids: &CommitIds) -> Result<()> {
        for (position, row) in self.rows.iter().enumerate() {
            if row.state == LifecycleState::New && !ids.contains_key(&position) {
                return Err(ReconcileError::MissingCommitId { position });
            }
        }
        for &position in ids.keys() {
            match self.rows.get(position) {
                Some(row) if row.state == LifecycleState::New => {}
                _ => return Err(ReconcileError::UnexpectedCommitId { position }),
            }
        }

        let rows = std::mem::take(&mut self.rows);
        self.rows = rows
            .into_iter()
            .enumerate()
            .filter_map(|(position, mut row)| match row.state {
                LifecycleState::Deleted => None,
                LifecycleState::New => {
                    row.id = ids.get(&position).cloned();
                    row.state = LifecycleState::Clean;
                    Some(row)
                }
                _ => {
                    row.state = LifecycleState::Clean;
                    Some(row)
                }
            })
            .collect();
        self.renumber();
        self.hydration = Hydration::Hydrated;

        debug!("Committed collection, {} rows remain", self.rows.len());
        Ok(())
    }

    /// Install the options of one reference lookup.
    ///
    /// New rows whose auto-fill target is still blank are filled from the
    /// freshly loaded options; persisted rows are left alone.
    pub fn set_reference_options(&mut self, key: impl Into<String>, options: Vec<OptionItem>) {
        let key = key.into();
        self.reference_options.insert(key.clone(), options);

        for row in self
            .rows
            .iter_mut()
            .filter(|r| r.state == LifecycleState::New)
        {
            for rule in self.autofill_rules.iter().filter(|r| r.reference_key == key) {
                if row.fields.is_populated(&rule.target_field) {
                    continue;
                }
                let Some(trigger) = row.fields.get(&rule.trigger_field) else {
                    continue;
                };
                let derived = autofill(
                    std::slice::from_ref(rule),
                    &rule.trigger_field,
                    trigger,
                    &self.reference_options,
                );
                for (target, derived_value) in derived {
                    if !derived_value.is_null() {
                        row.fields.insert(target, derived_value);
                    }
                }
            }
        }
    }

    pub fn reference_options(&self, key: &str) -> &[OptionItem] {
        self.reference_options
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn autofill_rules(&self) -> &[AutofillRule] {
        &self.autofill_rules
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, position: usize) -> Option<&Row> {
        self.rows.get(position)
    }

    pub fn position_of(&self, key: RowKey) -> Option<usize> {
        self.rows.iter().position(|r| r.key == key)
    }

    /// Rows that are not tombstoned.
    pub fn active_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| !r.is_deleted())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a save would have anything to do.
    pub fn is_dirty(&self) -> bool {
        self.rows.iter().any(|r| r.state.is_pending())
    }

    pub fn records(&self) -> Vec<RowRecord> {
        self.rows.iter().map(Row::to_record).collect()
    }
}
