use crate::model::Track;

/// Notifications delivered to the UI loop.
#[derive(Debug, Clone)]
pub enum Event {
    // Catalog
    CatalogFetched(Vec<Track>),
    CatalogFailed(String),

    // Session
    DeviceReady,
    TrackStarted(Track),
    QueueEnded,
    PlayerError(String),
}
