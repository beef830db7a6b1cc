//! In-memory persistence and reference data.
//!
//! Used by tests and for offline editing. Ids are deterministic (`mem-1`,
//! `mem-2`, ...) and every call is logged so tests can assert exactly what a
//! save issued. Failures can be injected per operation.

use async_trait::async_trait;
use indexmap::IndexMap;
use rowsync_api::{Fields, OptionItem, RowId};
use rowsync_core::{PersistenceService, ReferenceDataSource, Result, SnapshotRow};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Kind of persistence call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Create,
    Update,
    Delete,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Create => "create",
            CallKind::Update => "update",
            CallKind::Delete => "delete",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call received by [`MemoryPersistence`].
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceCall {
    Create(Fields),
    Update(RowId, Fields),
    Delete(RowId),
}

impl PersistenceCall {
    pub fn kind(&self) -> CallKind {
        match self {
            PersistenceCall::Create(_) => CallKind::Create,
            PersistenceCall::Update(..) => CallKind::Update,
            PersistenceCall::Delete(_) => CallKind::Delete,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: IndexMap<RowId, Fields>,
    next_id_counter: u64,
    calls: Vec<PersistenceCall>,
    failing: HashSet<CallKind>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Row store for one section.
///
/// Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate persisted rows without logging calls.
    pub fn with_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, Fields)>,
        S: Into<RowId>,
    {
        let store = Self::new();
        {
            let mut state = lock(&store.state);
            for (id, fields) in rows {
                state.rows.insert(id.into(), fields);
            }
        }
        store
    }

    /// Make every call of `kind` fail until [`heal`](Self::heal) is called.
    pub fn fail(&self, kind: CallKind) {
        lock(&self.state).failing.insert(kind);
    }

    pub fn heal(&self) {
        lock(&self.state).failing.clear();
    }

    pub fn calls(&self) -> Vec<PersistenceCall> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    pub fn call_count(&self, kind: CallKind) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    pub fn get(&self, id: &RowId) -> Option<Fields> {
        lock(&self.state).rows.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).rows.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).rows.is_empty()
    }

    /// Stored rows in insertion order, ready to hydrate or reload a section.
    pub fn snapshot(&self) -> Vec<SnapshotRow> {
        lock(&self.state)
            .rows
            .iter()
            .map(|(id, fields)| SnapshotRow::persisted(id.clone(), fields.clone()))
            .collect()
    }

    fn record(&self, call: PersistenceCall) -> Result<MutexGuard<'_, MemoryState>> {
        let mut state = lock(&self.state);
        let kind = call.kind();
        state.calls.push(call);
        if state.failing.contains(&kind) {
            return Err(format!("Injected {} failure", kind).into());
        }
        Ok(state)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PersistenceService for MemoryPersistence {
    async fn create(&self, fields: Fields) -> Result<RowId> {
        let mut state = self.record(PersistenceCall::Create(fields.clone()))?;
        state.next_id_counter += 1;
        let id = RowId::new(format!("mem-{}", state.next_id_counter));
        state.rows.insert(id.clone(), fields);
        debug!("Created row {}", id);
        Ok(id)
    }

    async fn update(&self, id: &RowId, fields: Fields) -> Result<()> {
        let mut state = self.record(PersistenceCall::Update(id.clone(), fields.clone()))?;
        match state.rows.get_mut(id) {
            Some(row) => {
                *row = fields;
                Ok(())
            }
            None => Err(format!("Row {} not found", id).into()),
        }
    }

    async fn delete(&self, id: &RowId) -> Result<()> {
        let mut state = self.record(PersistenceCall::Delete(id.clone()))?;
        match state.rows.shift_remove(id) {
            Some(_) => Ok(()),
            None => Err(format!("Row {} not found", id).into()),
        }
    }
}

#[derive(Debug, Default)]
struct ReferenceState {
    options: HashMap<(String, Option<String>), Vec<OptionItem>>,
    failing: HashSet<String>,
    fetches: Vec<(String, Option<String>)>,
}

/// Reference lists keyed by lookup name and optional scope.
///
/// Unknown lookups yield an empty list.
#[derive(Debug, Clone, Default)]
pub struct MemoryReferenceData {
    state: Arc<Mutex<ReferenceState>>,
}

impl MemoryReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, scope: Option<&str>, options: Vec<OptionItem>) {
        lock(&self.state)
            .options
            .insert((key.to_string(), scope.map(str::to_string)), options);
    }

    pub fn with(self, key: &str, scope: Option<&str>, options: Vec<OptionItem>) -> Self {
        self.insert(key, scope, options);
        self
    }

    /// Make lookups of `key` fail.
    pub fn fail(&self, key: &str) {
        lock(&self.state).failing.insert(key.to_string());
    }

    /// Every fetch received, in order.
    pub fn fetches(&self) -> Vec<(String, Option<String>)> {
        lock(&self.state).fetches.clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl ReferenceDataSource for MemoryReferenceData {
    async fn fetch(&self, key: &str, scope: Option<&str>) -> Result<Vec<OptionItem>> {
        let mut state = lock(&self.state);
        state
            .fetches
            .push((key.to_string(), scope.map(str::to_string)));
        if state.failing.contains(key) {
            return Err(format!("Lookup {} unavailable", key).into());
        }
        Ok(state
            .options
            .get(&(key.to_string(), scope.map(str::to_string)))
            .cloned()
            .unwrap_or_default())
    }
}
