use rowsync_core::ReconcileError;
use thiserror::Error;

/// Failures of the form-level operations: saving, and looking up or adding
/// sections.
///
/// Reference-data failures never show up here; they degrade to empty option
/// lists instead.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Failed to {operation} rows of section {section}: {message}")]
    PersistenceFailure {
        section: String,
        operation: String,
        message: String,
    },

    #[error("No persistence service registered for section {section}")]
    NoPersistenceService { section: String },

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Section {0} is already part of this form")]
    DuplicateSection(String),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

pub type Result<T> = std::result::Result<T, SaveError>;
