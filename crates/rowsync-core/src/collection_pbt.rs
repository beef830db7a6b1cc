//! Stateful property-based tests for ReconciledCollection
//!
//! A plain Vec-based model of the row lifecycle runs alongside the real
//! collection. After every transition the two are compared row by row and
//! the change-set is checked for disjointness and coverage.

use proptest::prelude::*;
use proptest_state_machine::{ReferenceStateMachine, StateMachineTest};
use rowsync_api::{Fields, LifecycleState, RowId, Value};
use std::collections::HashSet;

use crate::collection::ReconciledCollection;
use crate::diff::CommitIds;
use crate::row::SnapshotRow;

const VALUES: &[&str] = &["ok", "fail", "n/a"];

#[derive(Debug, Clone)]
struct ModelRow {
    id: Option<String>,
    state: LifecycleState,
    value: String,
}

#[derive(Debug, Clone, Default)]
struct ReferenceState {
    rows: Vec<ModelRow>,
    next_id: u64,
    /// Ids handed out by the most recent commit, in collection order
    last_commit_ids: Vec<String>,
}

#[derive(Debug, Clone)]
enum RowTransition {
    Add { value: String },
    /// Add a row and immediately delete it again
    AddThenDelete { value: String },
    Edit { position: usize, value: String },
    Delete { position: usize },
    Restore { position: usize },
    Commit,
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(VALUES.to_vec()).prop_map(str::to_string)
}

fn fields_for(value: &str) -> Fields {
    Fields::from([("result", value)])
}

impl ReferenceStateMachine for ReferenceState {
    type State = Self;
    type Transition = RowTransition;

    fn init_state() -> BoxedStrategy<Self::State> {
        prop::collection::vec(value_strategy(), 0..4)
            .prop_map(|values| ReferenceState {
                rows: values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| ModelRow {
                        id: Some(format!("p{}", i)),
                        state: LifecycleState::Clean,
                        value,
                    })
                    .collect(),
                next_id: 0,
                last_commit_ids: Vec::new(),
            })
            .boxed()
    }

    fn transitions(state: &Self::State) -> BoxedStrategy<Self::Transition> {
        let add = value_strategy().prop_map(|value| RowTransition::Add { value });
        let add_then_delete =
            value_strategy().prop_map(|value| RowTransition::AddThenDelete { value });

        if state.rows.is_empty() {
            return prop_oneof![add, add_then_delete, Just(RowTransition::Commit)].boxed();
        }

        let len = state.rows.len();
        let edit = (0..len, value_strategy())
            .prop_map(|(position, value)| RowTransition::Edit { position, value });
        let delete = (0..len).prop_map(|position| RowTransition::Delete { position });
        let restore = (0..len).prop_map(|position| RowTransition::Restore { position });

        prop_oneof![
            3 => add,
            1 => add_then_delete,
            4 => edit,
            3 => delete,
            2 => restore,
            1 => Just(RowTransition::Commit),
        ]
        .boxed()
    }

    fn preconditions(state: &Self::State, transition: &Self::Transition) -> bool {
        let state_at = |position: usize| state.rows.get(position).map(|r| r.state);
        match transition {
            RowTransition::Add { .. }
            | RowTransition::AddThenDelete { .. }
            | RowTransition::Commit => true,
            RowTransition::Edit { position, .. } | RowTransition::Delete { position } => {
                matches!(state_at(*position), Some(s) if s != LifecycleState::Deleted)
            }
            RowTransition::Restore { position } => {
                state_at(*position) == Some(LifecycleState::Deleted)
            }
        }
    }

    fn apply(mut state: Self::State, transition: &Self::Transition) -> Self::State {
        match transition {
            RowTransition::Add { value } => state.rows.push(ModelRow {
                id: None,
                state: LifecycleState::New,
                value: value.clone(),
            }),
            RowTransition::AddThenDelete { .. } => {}
            RowTransition::Edit { position, value } => {
                let row = &mut state.rows[*position];
                if row.value != *value {
                    row.value = value.clone();
                    if row.state == LifecycleState::Clean {
                        row.state = LifecycleState::Modified;
                    }
                }
            }
            RowTransition::Delete { position } => {
                if state.rows[*position].id.is_none() {
                    state.rows.remove(*position);
                } else {
                    state.rows[*position].state = LifecycleState::Deleted;
                }
            }
            RowTransition::Restore { position } => {
                state.rows[*position].state = LifecycleState::Modified;
            }
            RowTransition::Commit => {
                state.rows.retain(|r| r.state != LifecycleState::Deleted);
                state.last_commit_ids.clear();
                for row in state.rows.iter_mut() {
                    if row.state == LifecycleState::New {
                        let id = format!("c{}", state.next_id);
                        state.next_id += 1;
                        state.last_commit_ids.push(id.clone());
                        row.id = Some(id);
                    }
                    row.state = LifecycleState::Clean;
                }
            }
        }
        state
    }
}

struct CollectionTest;

impl StateMachineTest for CollectionTest {
    type SystemUnderTest = ReconciledCollection;
    type Reference = ReferenceState;

    fn init_test(
        ref_state: &<Self::Reference as ReferenceStateMachine>::State,
    ) -> Self::SystemUnderTest {
        ReconciledCollection::from_snapshot(ref_state.rows.iter().map(|row| SnapshotRow {
            id: row.id.as_deref().map(RowId::from),
            fields: fields_for(&row.value),
        }))
    }

    fn apply(
        mut state: Self::SystemUnderTest,
        ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        transition: <Self::Reference as ReferenceStateMachine>::Transition,
    ) -> Self::SystemUnderTest {
        match transition {
            RowTransition::Add { value } => {
                state.add_row(fields_for(&value));
            }
            RowTransition::AddThenDelete { value } => {
                let before_diff = state.diff();
                let before_len = state.len();
                let position = state.add_row(fields_for(&value));
                state
                    .delete_row(position)
                    .expect("fresh row must be deletable");
                assert_eq!(state.len(), before_len, "add+delete changed the row count");
                assert_eq!(state.diff(), before_diff, "add+delete left a trace in the diff");
            }
            RowTransition::Edit { position, value } => {
                state
                    .edit_field(position, "result", value.as_str())
                    .expect("precondition guarantees an editable row");
            }
            RowTransition::Delete { position } => {
                state
                    .delete_row(position)
                    .expect("precondition guarantees a deletable row");
            }
            RowTransition::Restore { position } => {
                state
                    .restore_row(position)
                    .expect("precondition guarantees a tombstone");
            }
            RowTransition::Commit => {
                let changes = state.diff();
                assert_eq!(changes.to_create.len(), ref_state.last_commit_ids.len());
                let ids: CommitIds = changes
                    .to_create
                    .iter()
                    .zip(ref_state.last_commit_ids.iter())
                    .map(|(create, id)| (create.position, RowId::from(id.as_str())))
                    .collect();
                state.commit(&ids).expect("diff positions must commit");
                assert!(state.diff().is_empty(), "diff after commit must be empty");
            }
        }
        state
    }

    fn check_invariants(
        state: &Self::SystemUnderTest,
        ref_state: &<Self::Reference as ReferenceStateMachine>::State,
    ) {
        assert_eq!(state.len(), ref_state.rows.len(), "row count mismatch");
        for (index, (row, model)) in state.rows().iter().zip(ref_state.rows.iter()).enumerate() {
            assert_eq!(row.state(), model.state, "state mismatch at row {}", index);
            assert_eq!(
                row.id().map(RowId::as_str),
                model.id.as_deref(),
                "id mismatch at row {}",
                index
            );
            assert_eq!(
                row.get("result"),
                Some(&Value::from(model.value.as_str())),
                "value mismatch at row {}",
                index
            );
            assert_eq!(row.serial(), index + 1, "serial mismatch at row {}", index);
            if row.id().is_none() {
                assert_eq!(row.state(), LifecycleState::New, "id-less row must be new");
            }
        }

        let changes = state.diff();
        assert_eq!(changes, state.diff(), "diff must be pure");

        let created: HashSet<_> = changes.to_create.iter().map(|c| c.key).collect();
        let updated: HashSet<_> = changes.to_update.iter().map(|u| u.key).collect();
        let deleted: HashSet<_> = state
            .rows()
            .iter()
            .filter(|r| r.id().is_some_and(|id| changes.to_delete.contains(id)))
            .map(|r| r.key())
            .collect();
        assert!(created.is_disjoint(&updated));
        assert!(created.is_disjoint(&deleted));
        assert!(updated.is_disjoint(&deleted));

        let pending: HashSet<_> = state
            .rows()
            .iter()
            .filter(|r| r.state().is_pending())
            .map(|r| r.key())
            .collect();
        let covered: HashSet<_> = created.union(&updated).chain(deleted.iter()).copied().collect();
        assert_eq!(covered, pending, "diff must cover exactly the non-clean rows");
        assert_eq!(changes.len(), pending.len());
    }
}

proptest_state_machine::prop_state_machine! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn test_collection_matches_lifecycle_model(sequential 1..40 => CollectionTest);
}
