use rowsync_api::streaming::section_event_stream;
use rowsync_api::{SectionEvent, SectionEventStream};
use rowsync_core::SectionObserver;
use tokio::sync::broadcast;

/// Forwards section events into a broadcast channel so async consumers can
/// follow a form as a stream.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: broadcast::Sender<SectionEvent>,
}

impl ChannelObserver {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> SectionEventStream {
        section_event_stream(self.tx.subscribe())
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChannelObserver {
    fn default() -> Self {
        Self::new(256)
    }
}

impl SectionObserver for ChannelObserver {
    fn on_event(&self, event: &SectionEvent) {
        // No subscribers is not an error
        let _ = self.tx.send(event.clone());
    }
}
