use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use flume::Sender;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    audio::{
        engine::{EngineEvent, EngineOptions, EngineState, ListenerId, Listeners},
        error::PlayerError,
        registry::ReadyRegistry,
        traits::{EngineLoader, PlaybackEngine},
    },
    http::{ApiError, ApiService},
    model::TrackId,
};

/// Consecutive failed polls after which the device counts as gone.
const MAX_FAILED_POLLS: u32 = 3;

/// Loads [`RemoteEngine`]s. The capability is the backend's engine proxy, so
/// loading means confirming that proxy answers.
pub struct RemoteEngineLoader {
    api: Arc<ApiService>,
    poll_interval: Duration,
}

impl RemoteEngineLoader {
    pub fn new(api: Arc<ApiService>, poll_interval: Duration) -> Self {
        Self { api, poll_interval }
    }
}

#[async_trait]
impl EngineLoader for RemoteEngineLoader {
    async fn load(&self, registry: &ReadyRegistry) -> Result<(), PlayerError> {
        if registry.is_available() {
            return Ok(());
        }

        match self.api.fetch_player_state(None).await {
            Ok(_) => {}
            // Reachable; credentials are checked on connect.
            Err(e) if matches!(e.status(), Some(401 | 403)) => {}
            Err(e) => return Err(PlayerError::ScriptLoad(e.to_string())),
        }

        info!(url = %self.api.base_url(), "playback engine available");
        registry.mark_available().await;
        Ok(())
    }

    async fn create(&self, options: EngineOptions) -> Result<Arc<dyn PlaybackEngine>, PlayerError> {
        if options.name.trim().is_empty() {
            return Err(PlayerError::EngineInitialization(
                "device name must not be empty".to_string(),
            ));
        }
        Ok(Arc::new(RemoteEngine::new(
            self.api.clone(),
            options,
            self.poll_interval,
        )))
    }
}

/// Engine that watches the backend-controlled device by polling its state.
pub struct RemoteEngine {
    api: Arc<ApiService>,
    options: EngineOptions,
    poll_interval: Duration,
    token: Arc<Mutex<String>>,
    device_id: Mutex<String>,
    listeners: Arc<Listeners>,
    last_state: Arc<Mutex<Option<EngineState>>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteEngine {
    pub fn new(api: Arc<ApiService>, options: EngineOptions, poll_interval: Duration) -> Self {
        let device_id = format!(
            "{}-{}",
            options.name.to_lowercase().replace(char::is_whitespace, "-"),
            Uuid::new_v4().simple()
        );

        Self {
            api,
            options,
            poll_interval,
            token: Arc::new(Mutex::new(String::new())),
            device_id: Mutex::new(device_id),
            listeners: Arc::new(Listeners::default()),
            last_state: Arc::new(Mutex::new(None)),
            poll_task: Mutex::new(None),
        }
    }

    async fn stop_polling(&self) {
        if let Some(task) = self.poll_task.lock().await.take() {
            task.abort();
        }
    }

    fn spawn_poller(&self, device_id: String) -> JoinHandle<()> {
        let api = self.api.clone();
        let token = self.token.clone();
        let listeners = self.listeners.clone();
        let last_state = self.last_state.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.tick().await;
            let mut failures = 0;

            loop {
                ticker.tick().await;
                let current = token.lock().await.clone();
                match api.fetch_player_state(Some(&current)).await {
                    Ok(state) => {
                        failures = 0;
                        let mut last = last_state.lock().await;
                        if *last == state {
                            continue;
                        }
                        *last = state.clone();
                        drop(last);
                        listeners.dispatch(EngineEvent::StateChanged(state)).await;
                    }
                    Err(e) => {
                        failures += 1;
                        warn!(error = %e, failures, "engine state poll failed");
                        if failures >= MAX_FAILED_POLLS {
                            listeners
                                .dispatch(EngineEvent::NotReady { device_id })
                                .await;
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl PlaybackEngine for RemoteEngine {
    async fn connect(&self, token: &str) -> Result<(), PlayerError> {
        self.stop_polling().await;

        if token.trim().is_empty() {
            let message = "empty credential".to_string();
            self.listeners
                .dispatch(EngineEvent::AuthenticationError(message.clone()))
                .await;
            return Err(PlayerError::EngineAuthentication(message));
        }

        *self.token.lock().await = token.to_string();

        info!(name = %self.options.name, volume = self.options.volume, "connecting playback engine");
        let first = match self.api.fetch_player_state(Some(token)).await {
            Ok(state) => state,
            Err(e) => return Err(self.connect_failure(e).await),
        };

        let device_id = {
            let mut device_id = self.device_id.lock().await;
            if let Some(reported) = first.as_ref().and_then(|s| s.device_id.clone()) {
                *device_id = reported;
            }
            device_id.clone()
        };

        *self.last_state.lock().await = first.clone();
        self.listeners
            .dispatch(EngineEvent::Ready {
                device_id: device_id.clone(),
            })
            .await;
        self.listeners
            .dispatch(EngineEvent::StateChanged(first))
            .await;

        *self.poll_task.lock().await = Some(self.spawn_poller(device_id));
        Ok(())
    }

    async fn disconnect(&self) {
        self.stop_polling().await;
        *self.last_state.lock().await = None;
        debug!(name = %self.options.name, "playback engine disconnected");
    }

    async fn toggle_play(&self) -> Result<(), PlayerError> {
        let last = self.last_state.lock().await.clone();
        let device_id = self.device_id.lock().await.clone();

        let result = match last {
            Some(state) if !state.paused => self.api.pause(Some(&device_id)).await,
            Some(EngineState {
                track_id: Some(track_id),
                ..
            }) => {
                self.api
                    .play(&TrackId::from(track_id), Some(&device_id))
                    .await
            }
            _ => {
                return Err(PlayerError::Command(
                    "nothing loaded on the device".to_string(),
                ));
            }
        };

        result.map_err(|e| PlayerError::Command(e.to_string()))
    }

    async fn add_listener(&self, tx: Sender<EngineEvent>) -> ListenerId {
        self.listeners.add(tx).await
    }

    async fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id).await;
    }
}

impl RemoteEngine {
    async fn connect_failure(&self, error: ApiError) -> PlayerError {
        let message = error.to_string();
        match error.status() {
            Some(401) => {
                self.listeners
                    .dispatch(EngineEvent::AuthenticationError(message.clone()))
                    .await;
                PlayerError::EngineAuthentication(message)
            }
            Some(403) => {
                self.listeners
                    .dispatch(EngineEvent::AccountError(message.clone()))
                    .await;
                PlayerError::EngineAccount(message)
            }
            _ => PlayerError::Connection(message),
        }
    }
}

impl Drop for RemoteEngine {
    fn drop(&mut self) {
        if let Some(task) = self.poll_task.get_mut().take() {
            task.abort();
        }
    }
}
