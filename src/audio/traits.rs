use std::sync::Arc;

use async_trait::async_trait;
use flume::Sender;

use crate::{
    audio::{
        engine::{EngineEvent, EngineOptions, ListenerId},
        error::PlayerError,
        registry::ReadyRegistry,
    },
    model::{Track, TrackId},
};

/// Requests the session relays to the backend service.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<Track>, PlayerError>;
    async fn fetch_token(&self) -> Result<String, PlayerError>;
    async fn play(&self, track_id: &TrackId, device_id: Option<&str>) -> Result<(), PlayerError>;
    async fn pause(&self, device_id: Option<&str>) -> Result<(), PlayerError>;
}

/// A connected output device that reports its state asynchronously.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Connects with `token`, which replaces any credential from an earlier
    /// connect.
    async fn connect(&self, token: &str) -> Result<(), PlayerError>;
    async fn disconnect(&self);
    async fn toggle_play(&self) -> Result<(), PlayerError>;
    async fn add_listener(&self, tx: Sender<EngineEvent>) -> ListenerId;
    async fn remove_listener(&self, id: ListenerId);
}

/// Brings the engine capability up and instantiates engines from it.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    /// Makes the capability available and announces it through `registry`.
    async fn load(&self, registry: &ReadyRegistry) -> Result<(), PlayerError>;
    async fn create(&self, options: EngineOptions) -> Result<Arc<dyn PlaybackEngine>, PlayerError>;
}
