use std::{sync::Arc, time::Duration};

use flume::Sender;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    audio::{
        engine::{EngineEvent, EngineOptions, EngineState, ListenerId},
        error::PlayerError,
        queue::Queue,
        registry::{ReadyRegistry, SessionHandle},
        state::{EngineReadiness, SessionState, Ticket, TransportIntent},
        traits::{Backend, EngineLoader, PlaybackEngine},
    },
    config::{CompletionRule, PlayerConfig},
    event::events::Event,
    model::{Track, TrackId},
};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub device_name: String,
    pub volume: f32,
    pub ready_timeout: Duration,
    pub completion: CompletionRule,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&PlayerConfig::default())
    }
}

impl From<&PlayerConfig> for SessionOptions {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            device_name: config.device_name.clone(),
            volume: config.volume,
            ready_timeout: config.ready_timeout,
            completion: config.completion,
        }
    }
}

#[derive(Default)]
struct EngineSlot {
    engine: Option<Arc<dyn PlaybackEngine>>,
    listener: Option<ListenerId>,
    forwarder: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayOrigin {
    User,
    AutoAdvance,
}

/// Playback session: the single owner of playback intent and observed engine
/// state.
///
/// Cloning yields another handle to the same session. State is never locked
/// across a backend call, so commands from several tasks may interleave;
/// transport responses are applied only while they are the newest command.
#[derive(Clone)]
pub struct PlaybackSession {
    handle: SessionHandle,
    options: SessionOptions,
    backend: Arc<dyn Backend>,
    loader: Arc<dyn EngineLoader>,
    registry: Arc<ReadyRegistry>,
    state: Arc<Mutex<SessionState>>,
    engine: Arc<Mutex<EngineSlot>>,
    event_tx: Sender<Event>,
}

impl PlaybackSession {
    pub fn new(
        options: SessionOptions,
        backend: Arc<dyn Backend>,
        loader: Arc<dyn EngineLoader>,
        registry: Arc<ReadyRegistry>,
        event_tx: Sender<Event>,
    ) -> Self {
        Self {
            handle: SessionHandle::new(),
            options,
            backend,
            loader,
            registry,
            state: Arc::new(Mutex::new(SessionState::default())),
            engine: Arc::new(Mutex::new(EngineSlot::default())),
            event_tx,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn readiness(&self) -> EngineReadiness {
        self.state.lock().await.readiness
    }

    /// Brings the engine up: credential, engine instance, listeners, connect.
    ///
    /// Readiness moves to `Loading` here and to `Ready` once the engine
    /// reports its device. Any failure moves it to `Error`.
    pub async fn init(&self) -> Result<(), PlayerError> {
        {
            let mut state = self.state.lock().await;
            if !state.transition(EngineReadiness::Loading) {
                warn!(readiness = ?state.readiness, "session already initialized");
                return match state.readiness {
                    EngineReadiness::Error => {
                        Err(state.last_error.clone().unwrap_or(PlayerError::NotReady))
                    }
                    _ => Ok(()),
                };
            }
        }

        info!(session = %self.handle, device = %self.options.device_name, "starting playback session");
        if let Err(e) = self.start_engine().await {
            self.report_failure(e.clone()).await;
            return Err(e);
        }
        Ok(())
    }

    async fn start_engine(&self) -> Result<(), PlayerError> {
        let token = self.backend.fetch_token().await?;

        let engine = {
            let mut slot = self.engine.lock().await;
            self.detach(&mut slot).await;

            let engine = match slot.engine.clone() {
                Some(engine) => {
                    debug!(session = %self.handle, "reusing engine instance");
                    engine
                }
                None => {
                    let engine = self.load_engine().await?;
                    slot.engine = Some(engine.clone());
                    engine
                }
            };

            let (tx, rx) = flume::unbounded();
            slot.listener = Some(engine.add_listener(tx).await);

            let session = self.clone();
            slot.forwarder = Some(tokio::spawn(async move {
                while let Ok(event) = rx.recv_async().await {
                    session.on_engine_event(event).await;
                }
            }));
            engine
        };

        // A reused engine must not keep the credential of an earlier init.
        engine.connect(&token).await
    }

    async fn load_engine(&self) -> Result<Arc<dyn PlaybackEngine>, PlayerError> {
        let ready = self.registry.register(self.handle).await;

        if let Err(e) = self.loader.load(&self.registry).await {
            self.registry.deregister(self.handle).await;
            return Err(e);
        }

        match tokio::time::timeout(self.options.ready_timeout, ready).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                return Err(PlayerError::ScriptLoad(
                    "ready notification was withdrawn".to_string(),
                ));
            }
            Err(_) => {
                self.registry.deregister(self.handle).await;
                return Err(PlayerError::ScriptLoad(format!(
                    "engine not available after {:?}",
                    self.options.ready_timeout
                )));
            }
        }

        self.loader
            .create(EngineOptions {
                name: self.options.device_name.clone(),
                volume: self.options.volume,
            })
            .await
    }

    async fn detach(&self, slot: &mut EngineSlot) {
        if let Some(id) = slot.listener.take()
            && let Some(engine) = &slot.engine
        {
            engine.remove_listener(id).await;
        }
        if let Some(task) = slot.forwarder.take() {
            task.abort();
        }
    }

    /// Disconnects the engine and drops this session's listener and ready
    /// registration. The engine instance is kept for the next `init`.
    pub async fn teardown(&self) {
        {
            let mut slot = self.engine.lock().await;
            self.detach(&mut slot).await;
            if let Some(engine) = &slot.engine {
                engine.disconnect().await;
            }
        }
        self.registry.deregister(self.handle).await;
        self.state.lock().await.reset_readiness();
        info!(session = %self.handle, "playback session torn down");
    }

    pub async fn on_engine_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::Ready { device_id } => {
                let mut state = self.state.lock().await;
                let was_ready = state.is_ready();
                if !state.transition(EngineReadiness::Ready) {
                    return;
                }
                info!(%device_id, "playback device ready");
                state.device_id = Some(device_id);
                drop(state);
                if !was_ready {
                    let _ = self.event_tx.send(Event::DeviceReady);
                }
            }
            EngineEvent::NotReady { device_id } => {
                self.report_failure(PlayerError::DeviceOffline(device_id))
                    .await;
            }
            EngineEvent::InitializationError(message) => {
                self.report_failure(PlayerError::EngineInitialization(message))
                    .await;
            }
            EngineEvent::AuthenticationError(message) => {
                self.report_failure(PlayerError::EngineAuthentication(message))
                    .await;
            }
            EngineEvent::AccountError(message) => {
                self.report_failure(PlayerError::EngineAccount(message))
                    .await;
            }
            EngineEvent::StateChanged(None) => {
                debug!("engine reported no playback state");
            }
            EngineEvent::StateChanged(Some(observed)) => self.reconcile(observed).await,
        }
    }

    async fn reconcile(&self, observed: EngineState) {
        let (ticket, device_id, next) = {
            let mut state = self.state.lock().await;
            state.set_playing(!observed.paused);

            let finished = !state.command_in_flight()
                && !state.paused_by_user()
                && observed.looks_finished(self.options.completion);
            state.observed = Some(observed);

            if !finished {
                return;
            }
            let Some(current) = state.current_id().cloned() else {
                return;
            };

            match state.queue.successor(&current).cloned() {
                Some(next) => {
                    info!(from = %current, to = %next.id, "track finished, advancing");
                    state.set_current_track(Some(next.clone()));
                    if !state.is_ready() {
                        warn!(track_id = %next.id, "cannot advance, engine not ready");
                        state.set_playing(false);
                        return;
                    }
                    let ticket = state.issue(TransportIntent::Play);
                    (ticket, state.device_id.clone(), next)
                }
                None => {
                    info!(last = %current, "queue exhausted");
                    state.is_playing = false;
                    drop(state);
                    let _ = self.event_tx.send(Event::QueueEnded);
                    return;
                }
            }
        };

        let _ = self
            .dispatch_play(ticket, next.id, device_id, PlayOrigin::AutoAdvance)
            .await;
    }

    /// Plays `track_id` on the session's device.
    pub async fn play(&self, track_id: &TrackId) -> Result<(), PlayerError> {
        let (ticket, device_id) = {
            let mut state = self.state.lock().await;
            if !state.is_ready() {
                warn!(%track_id, readiness = ?state.readiness, "play ignored, engine not ready");
                return Err(PlayerError::NotReady);
            }
            (state.issue(TransportIntent::Play), state.device_id.clone())
        };

        self.dispatch_play(ticket, track_id.clone(), device_id, PlayOrigin::User)
            .await
    }

    async fn dispatch_play(
        &self,
        ticket: Ticket,
        track_id: TrackId,
        device_id: Option<String>,
        origin: PlayOrigin,
    ) -> Result<(), PlayerError> {
        debug!(seq = ticket.seq, %track_id, ?origin, "issuing play");
        let result = self.backend.play(&track_id, device_id.as_deref()).await;

        let mut state = self.state.lock().await;
        if !state.settle(ticket) {
            debug!(seq = ticket.seq, %track_id, "discarding stale play response");
            return Ok(());
        }

        match result {
            Ok(()) => {
                if let Some(track) = state.queue.get(&track_id).cloned() {
                    state.set_current_track(Some(track));
                }
                state.set_playing(true);
                let started = state.current_track.clone();
                drop(state);

                if let Some(track) = started {
                    let _ = self.event_tx.send(Event::TrackStarted(track));
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, %track_id, "play command failed");
                if origin == PlayOrigin::AutoAdvance {
                    state.set_playing(false);
                }
                state.last_error = Some(e.clone());
                drop(state);
                let _ = self.event_tx.send(Event::PlayerError(e.to_string()));
                Err(e)
            }
        }
    }

    /// Pauses the device. Does nothing while the engine is not ready.
    pub async fn pause(&self) -> Result<(), PlayerError> {
        let (ticket, device_id) = {
            let mut state = self.state.lock().await;
            if !state.is_ready() {
                debug!(readiness = ?state.readiness, "pause ignored, engine not ready");
                return Ok(());
            }
            (state.issue(TransportIntent::Pause), state.device_id.clone())
        };

        debug!(seq = ticket.seq, "issuing pause");
        let result = self.backend.pause(device_id.as_deref()).await;

        let mut state = self.state.lock().await;
        if !state.settle(ticket) {
            debug!(seq = ticket.seq, "discarding stale pause response");
            return Ok(());
        }

        match result {
            Ok(()) => {
                state.set_playing(false);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "pause command failed");
                state.forget_intent();
                state.last_error = Some(e.clone());
                drop(state);
                let _ = self.event_tx.send(Event::PlayerError(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn next(&self) -> Result<(), PlayerError> {
        let target = {
            let state = self.state.lock().await;
            match state.current_id() {
                Some(current) => state.queue.successor(current),
                None => state.queue.first(),
            }
            .map(|t| t.id.clone())
        };

        match target {
            Some(id) => self.play(&id).await,
            None => Ok(()),
        }
    }

    pub async fn previous(&self) -> Result<(), PlayerError> {
        let target = {
            let state = self.state.lock().await;
            state
                .current_id()
                .and_then(|current| state.queue.predecessor(current))
                .map(|t| t.id.clone())
        };

        match target {
            Some(id) => self.play(&id).await,
            None => Ok(()),
        }
    }

    /// Pauses when playing, otherwise resumes the current track. Without a
    /// current track the engine's own toggle is used.
    pub async fn toggle_play(&self) -> Result<(), PlayerError> {
        let (playing, ready, current) = {
            let state = self.state.lock().await;
            (state.is_playing, state.is_ready(), state.current_id().cloned())
        };

        if playing {
            return self.pause().await;
        }
        if let Some(id) = current {
            return self.play(&id).await;
        }
        if !ready {
            return Err(PlayerError::NotReady);
        }

        let engine = self.engine.lock().await.engine.clone();
        match engine {
            Some(engine) => engine.toggle_play().await,
            None => Err(PlayerError::NotReady),
        }
    }

    /// Appends `track` unless its id is already queued.
    pub async fn add_to_queue(&self, track: Track) -> bool {
        let track_id = track.id.clone();
        let added = self.state.lock().await.enqueue(track);
        debug!(%track_id, added, "add to queue");
        added
    }

    pub async fn set_current_track(&self, track: Option<Track>) {
        self.state.lock().await.set_current_track(track);
    }

    pub async fn set_queue(&self, tracks: Vec<Track>) {
        self.state.lock().await.set_queue(Queue::from_tracks(tracks));
    }

    async fn report_failure(&self, error: PlayerError) {
        error!(error = %error, session = %self.handle, "playback session failed");
        self.state.lock().await.fail(error.clone());
        let _ = self.event_tx.send(Event::PlayerError(error.to_string()));
    }
}
