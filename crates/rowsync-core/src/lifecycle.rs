//! Per-row state transitions.
//!
//! The transition rules live here as pure functions over
//! [`LifecycleState`] so the collection only decides *when* an event fires.

use rowsync_api::LifecycleState;

/// What a delete does to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Row had no persisted id and was dropped from the sequence
    Removed,
    /// Row is kept as a `Deleted` tombstone until the next commit
    Tombstoned,
}

/// Initial state of a row entering the collection.
pub fn on_load(has_id: bool) -> LifecycleState {
    if has_id {
        LifecycleState::Clean
    } else {
        LifecycleState::New
    }
}

/// State after a field edit that actually changed a value.
///
/// Returns `None` for tombstones, which must be restored first.
pub fn on_edit(state: LifecycleState) -> Option<LifecycleState> {
    match state {
        LifecycleState::Clean => Some(LifecycleState::Modified),
        LifecycleState::New | LifecycleState::Modified => Some(state),
        LifecycleState::Deleted => None,
    }
}

/// Delete transition. `None` when the row is already a tombstone.
pub fn on_delete(state: LifecycleState, has_id: bool) -> Option<DeleteOutcome> {
    match state {
        LifecycleState::Deleted => None,
        _ if !has_id => Some(DeleteOutcome::Removed),
        _ => Some(DeleteOutcome::Tombstoned),
    }
}

/// Restore transition. A restored row is saved as an update, never
/// silently returned to `Clean`.
pub fn on_restore(state: LifecycleState) -> Option<LifecycleState> {
    match state {
        LifecycleState::Deleted => Some(LifecycleState::Modified),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_depends_on_identity() {
        assert_eq!(on_load(true), LifecycleState::Clean);
        assert_eq!(on_load(false), LifecycleState::New);
    }

    #[test]
    fn test_edit_transitions() {
        assert_eq!(on_edit(LifecycleState::Clean), Some(LifecycleState::Modified));
        assert_eq!(on_edit(LifecycleState::New), Some(LifecycleState::New));
        assert_eq!(on_edit(LifecycleState::Modified), Some(LifecycleState::Modified));
        assert_eq!(on_edit(LifecycleState::Deleted), None);
    }

    #[test]
    fn test_delete_transitions() {
        assert_eq!(on_delete(LifecycleState::New, false), Some(DeleteOutcome::Removed));
        assert_eq!(on_delete(LifecycleState::Clean, true), Some(DeleteOutcome::Tombstoned));
        assert_eq!(on_delete(LifecycleState::Modified, true), Some(DeleteOutcome::Tombstoned));
        assert_eq!(on_delete(LifecycleState::Deleted, true), None);
    }

    #[test]
    fn test_restore_only_from_deleted() {
        assert_eq!(on_restore(LifecycleState::Deleted), Some(LifecycleState::Modified));
        assert_eq!(on_restore(LifecycleState::Clean), None);
        assert_eq!(on_restore(LifecycleState::New), None);
    }
}
