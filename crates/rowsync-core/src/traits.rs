//! Collaborator traits
//!
//! The collection itself is synchronous and never talks to a backend. The
//! traits here describe the services a save and a section mount depend on:
//! persistence of rows, reference-data lookups, and upward notification of
//! section events.

use async_trait::async_trait;
use rowsync_api::{Fields, OptionItem, RowId, SectionEvent};

// Boxed error so adapters can surface transport and validation failures alike
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

// Define MaybeSendSync trait alias for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSendSync {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSendSync for T {}

/// Row persistence for one section (e.g. "CM material used items").
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PersistenceService: MaybeSendSync {
    /// Create a row, returning its persisted id
    async fn create(&self, fields: Fields) -> Result<RowId>;

    /// Overwrite the fields of a persisted row
    async fn update(&self, id: &RowId, fields: Fields) -> Result<()>;

    async fn delete(&self, id: &RowId) -> Result<()>;
}

/// Reference-data lookups (status enumerations, warehouse-scoped name lists).
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ReferenceDataSource: MaybeSendSync {
    /// Fetch the ordered options of lookup `key`, optionally narrowed by a
    /// scope key such as a station id
    async fn fetch(&self, key: &str, scope: Option<&str>) -> Result<Vec<OptionItem>>;
}

/// Receives section events (completion changes and data changes).
///
/// Called synchronously from inside the mutation that caused the event, so
/// implementations must not block.
pub trait SectionObserver: MaybeSendSync {
    fn on_event(&self, event: &SectionEvent);
}
