//! Editing and saving of maintenance report forms.
//!
//! A [`ReportForm`] holds one [`Section`] per editable table. Sections track
//! per-row create/update/delete intent through
//! [`ReconciledCollection`](rowsync_core::ReconciledCollection); the
//! [`SaveCoordinator`] turns the pending changes into persistence calls and
//! commits each section once its calls succeed.

pub mod catalog;
pub mod config;
pub mod error;
pub mod form;
pub mod memory;
pub mod normalize;
pub mod observer;
pub mod reference;
pub mod registry;
pub mod rest;
pub mod save;
pub mod schema;
pub mod section;
pub mod telemetry;

pub use config::RowsyncConfig;
pub use error::{Result, SaveError};
pub use form::{FormSnapshot, Progress, ReportForm, SectionSnapshot};
pub use memory::{CallKind, MemoryPersistence, MemoryReferenceData, PersistenceCall};
pub use observer::ChannelObserver;
pub use reference::ReferenceDataLoader;
pub use registry::PersistenceRegistry;
pub use rest::{RestClient, RestResource};
pub use save::{SaveCoordinator, SaveReport, SectionOutcome};
pub use schema::{ReferenceLookup, SectionSchema};
pub use section::Section;
pub use telemetry::init_tracing;

pub use rowsync_api::{Fields, OptionItem, RowId, SectionEvent, Value};
pub use rowsync_core::{
    ChangeSet, CommitIds, PersistenceService, ReconcileError, ReconciledCollection,
    ReferenceDataSource, SectionObserver, SnapshotRow,
};
