use crate::applications::ApplicationStatus;
use serde::Serialize;
use tokio::sync::broadcast;

/// Change notifications published by the catalog store. Views re-render on
/// these instead of polling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CatalogEvent {
    DirectoryCreated { id: String, parent: Option<String> },
    DirectoryRenamed { id: String },
    DirectoryDeleted { ids: Vec<String> },
    DirectoryMoved { id: String, after: String },
    ServiceStatusChanged { ids: Vec<String> },
    ServicesRemoved { ids: Vec<String> },
    ApplicationSubmitted { id: String },
    ApplicationAudited { id: String, status: ApplicationStatus },
}

/// Pending events a slow subscriber may lag behind before it starts missing
/// the oldest ones.
pub const EVENT_BACKLOG: usize = 100;

/// Fan-out of [`CatalogEvent`]s to every open view.
pub struct EventBus {
    tx: broadcast::Sender<CatalogEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_backlog(EVENT_BACKLOG)
    }

    pub fn with_backlog(backlog: usize) -> Self {
        let (tx, _) = broadcast::channel(backlog.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Deliver `event` and return how many subscribers got it. Zero is fine;
    /// the store publishes whether or not a view is open.
    pub fn send(&self, event: CatalogEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
