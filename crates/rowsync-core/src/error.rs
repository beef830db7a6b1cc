use rowsync_api::LifecycleState;
use thiserror::Error;

/// Contract violations reported by [`ReconciledCollection`](crate::ReconciledCollection).
///
/// Every operation either applies fully or returns one of these and leaves
/// the collection untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("Row position {position} is out of range (collection has {len} rows)")]
    OutOfRange { position: usize, len: usize },

    #[error("Cannot {operation} row {position} in state {state}")]
    InvalidState {
        position: usize,
        state: LifecycleState,
        operation: &'static str,
    },

    #[error("No persisted id supplied for new row {position}")]
    MissingCommitId { position: usize },

    #[error("Persisted id supplied for row {position}, which is not a new row")]
    UnexpectedCommitId { position: usize },
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
