//! Upward notifications from an editable section to the form that owns it.

use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::RowRecord;

/// Event reported by a section to its parent aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionEvent {
    /// Completion flipped; drives the overall progress indicator
    StatusChanged { section: String, complete: bool },
    /// Row data or remarks changed; carries the full current state so the
    /// parent can hold the authoritative aggregate
    DataChanged {
        section: String,
        rows: Vec<RowRecord>,
        remarks: String,
    },
}

impl SectionEvent {
    pub fn section(&self) -> &str {
        match self {
            SectionEvent::StatusChanged { section, .. } => section,
            SectionEvent::DataChanged { section, .. } => section,
        }
    }
}

/// Stream of section events.
pub type SectionEventStream = Pin<Box<dyn Stream<Item = SectionEvent> + Send>>;

/// Adapt a broadcast receiver into a [`SectionEventStream`].
///
/// A lagging receiver skips the events it missed; the next `DataChanged`
/// carries the full state again.
pub fn section_event_stream(rx: broadcast::Receiver<SectionEvent>) -> SectionEventStream {
    Box::pin(BroadcastStream::new(rx).filter_map(|item| item.ok()))
}
