//! Row reconciliation for editable report tables
//!
//! This crate provides the in-memory side of editing a table of persisted rows:
//! - `ReconciledCollection`: ordered rows tagged `Clean`/`New`/`Modified`/`Deleted`
//! - `ChangeSet`: the creates, updates and deletes a save must issue
//! - `AutofillRule`: derived field values looked up from reference data
//! - `CompletionRule`: the "section complete" heuristic
//! - `PersistenceService` / `ReferenceDataSource` / `SectionObserver`: collaborator traits

pub mod autofill;
pub mod collection;
pub mod completion;
pub mod diff;
pub mod error;
pub mod lifecycle;
pub mod row;
pub mod traits;

#[cfg(test)]
mod collection_pbt;

pub use autofill::{autofill, AutofillRule, ReferenceOptions};
pub use collection::{Hydration, ReconciledCollection};
pub use completion::CompletionRule;
pub use diff::{ChangeSet, CommitIds, PendingCreate, PendingUpdate};
pub use error::ReconcileError;
pub use lifecycle::DeleteOutcome;
pub use row::{Row, RowKey, SnapshotRow};
pub use traits::{MaybeSendSync, PersistenceService, ReferenceDataSource, Result, SectionObserver};
