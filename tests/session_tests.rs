use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex as StdMutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use flume::{Receiver, Sender};
use tokio::sync::oneshot;

use playdeck::{
    audio::{
        EngineReadiness, PlaybackSession, PlayerError, SessionOptions, SessionState,
        engine::{EngineEvent, EngineOptions, EngineState, ListenerId, Listeners},
        registry::ReadyRegistry,
        traits::{Backend, EngineLoader, PlaybackEngine},
    },
    config::CompletionRule,
    event::events::Event,
    model::{Track, TrackId},
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Play(String, Option<String>),
    Pause(Option<String>),
}

#[derive(Default)]
struct FakeBackend {
    calls: StdMutex<Vec<Call>>,
    tokens_issued: AtomicUsize,
    token_error: StdMutex<Option<PlayerError>>,
    play_error: StdMutex<Option<PlayerError>>,
    pause_error: StdMutex<Option<PlayerError>>,
    held: StdMutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl FakeBackend {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn plays(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Play(id, _) => Some(id),
                Call::Pause(_) => None,
            })
            .collect()
    }

    /// The next play of `track_id` waits until the returned sender fires.
    fn hold_play(&self, track_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.held.lock().unwrap().insert(track_id.to_string(), rx);
        tx
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn fetch_catalog(&self) -> Result<Vec<Track>, PlayerError> {
        Ok(Vec::new())
    }

    async fn fetch_token(&self) -> Result<String, PlayerError> {
        match self.token_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            // Every fetch hands out a fresh credential.
            None => Ok(format!(
                "t{}",
                self.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1
            )),
        }
    }

    async fn play(&self, track_id: &TrackId, device_id: Option<&str>) -> Result<(), PlayerError> {
        self.calls.lock().unwrap().push(Call::Play(
            track_id.to_string(),
            device_id.map(str::to_string),
        ));
        let held = self.held.lock().unwrap().remove(track_id.as_str());
        if let Some(rx) = held {
            let _ = rx.await;
        }
        match self.play_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn pause(&self, device_id: Option<&str>) -> Result<(), PlayerError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Pause(device_id.map(str::to_string)));
        match self.pause_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct FakeEngine {
    listeners: Listeners,
    attached: AtomicUsize,
    tokens: StdMutex<Vec<String>>,
    toggles: AtomicUsize,
    reject_with: StdMutex<Option<EngineEvent>>,
    connect_error: StdMutex<Option<PlayerError>>,
    /// Dispatched on connect before the device reports ready.
    before_ready: StdMutex<Vec<EngineEvent>>,
}

impl FakeEngine {
    async fn emit(&self, event: EngineEvent) {
        self.listeners.dispatch(event).await;
    }

    fn connects(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }
}

#[async_trait]
impl PlaybackEngine for FakeEngine {
    async fn connect(&self, token: &str) -> Result<(), PlayerError> {
        self.tokens.lock().unwrap().push(token.to_string());
        if let Some(e) = self.connect_error.lock().unwrap().clone() {
            return Err(e);
        }
        let early: Vec<EngineEvent> = self.before_ready.lock().unwrap().drain(..).collect();
        for event in early {
            self.listeners.dispatch(event).await;
        }

        let rejection = self.reject_with.lock().unwrap().clone();
        match rejection {
            Some(event) => {
                self.listeners.dispatch(event).await;
                Err(PlayerError::EngineAuthentication("rejected".to_string()))
            }
            None => {
                self.listeners
                    .dispatch(EngineEvent::Ready {
                        device_id: "dev-1".to_string(),
                    })
                    .await;
                Ok(())
            }
        }
    }

    async fn disconnect(&self) {}

    async fn toggle_play(&self) -> Result<(), PlayerError> {
        self.toggles.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add_listener(&self, tx: Sender<EngineEvent>) -> ListenerId {
        self.attached.fetch_add(1, Ordering::SeqCst);
        self.listeners.add(tx).await
    }

    async fn remove_listener(&self, id: ListenerId) {
        self.attached.fetch_sub(1, Ordering::SeqCst);
        self.listeners.remove(id).await;
    }
}

#[derive(Default)]
struct FakeLoader {
    engine: Arc<FakeEngine>,
    loads: AtomicUsize,
    creates: AtomicUsize,
    load_error: StdMutex<Option<PlayerError>>,
}

#[async_trait]
impl EngineLoader for FakeLoader {
    async fn load(&self, registry: &ReadyRegistry) -> Result<(), PlayerError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.load_error.lock().unwrap().clone() {
            return Err(e);
        }
        registry.mark_available().await;
        Ok(())
    }

    async fn create(&self, _options: EngineOptions) -> Result<Arc<dyn PlaybackEngine>, PlayerError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(self.engine.clone())
    }
}

struct Harness {
    session: PlaybackSession,
    backend: Arc<FakeBackend>,
    loader: Arc<FakeLoader>,
    events: Receiver<Event>,
}

impl Harness {
    fn new() -> Self {
        Self::with_rule(CompletionRule::TailOrRewind)
    }

    fn with_rule(completion: CompletionRule) -> Self {
        let backend = Arc::new(FakeBackend::default());
        let loader = Arc::new(FakeLoader::default());
        let (tx, events) = flume::unbounded();
        let options = SessionOptions {
            device_name: "Test Player".to_string(),
            volume: 0.5,
            ready_timeout: Duration::from_secs(1),
            completion,
        };
        let session = PlaybackSession::new(
            options,
            backend.clone(),
            loader.clone(),
            Arc::new(ReadyRegistry::new()),
            tx,
        );

        Self {
            session,
            backend,
            loader,
            events,
        }
    }

    fn engine(&self) -> &FakeEngine {
        &self.loader.engine
    }

    async fn ready(&self) {
        self.session.init().await.unwrap();
        self.wait_until(|s| s.readiness == EngineReadiness::Ready)
            .await;
    }

    async fn wait_until(&self, check: impl Fn(&SessionState) -> bool) -> SessionState {
        let wait = async {
            loop {
                let state = self.session.snapshot().await;
                if check(&state) {
                    return state;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(2), wait)
            .await
            .expect("session never reached the expected state")
    }

    /// Lets the forwarder catch up when asserting that nothing happens.
    async fn settle(&self) -> SessionState {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.session.snapshot().await
    }

    fn drain_events(&self) -> Vec<Event> {
        self.events.drain().collect()
    }

    async fn expect_event(&self, check: impl Fn(&Event) -> bool) {
        let wait = async {
            while let Ok(event) = self.events.recv_async().await {
                if check(&event) {
                    return;
                }
            }
            panic!("event channel closed");
        };
        tokio::time::timeout(Duration::from_secs(2), wait)
            .await
            .expect("expected event never arrived");
    }
}

fn track(id: &str) -> Track {
    Track {
        id: TrackId::from(id),
        title: format!("Track {id}"),
        artists: Vec::new(),
        album: None,
        source_platform: Some("spotify".to_string()),
        spotify_id: None,
        album_art: None,
    }
}

fn observed(track_id: &str, paused: bool, position_ms: u64) -> EngineEvent {
    EngineEvent::StateChanged(Some(EngineState {
        paused,
        position_ms,
        duration_ms: Some(200_000),
        track_id: Some(track_id.to_string()),
        device_id: Some("dev-1".to_string()),
    }))
}

fn current(state: &SessionState) -> Option<&str> {
    state.current_id().map(TrackId::as_str)
}

#[tokio::test]
async fn play_before_ready_is_rejected_without_a_request() {
    let h = Harness::new();
    h.session.set_queue(vec![track("a")]).await;

    assert_eq!(h.session.play(&TrackId::from("a")).await, Err(PlayerError::NotReady));

    let state = h.session.snapshot().await;
    assert!(h.backend.calls().is_empty());
    assert!(!state.is_playing);
    assert_eq!(state.current_track, None);
}

#[tokio::test]
async fn pause_before_ready_does_nothing() {
    let h = Harness::new();
    assert_eq!(h.session.pause().await, Ok(()));
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn init_reaches_ready_with_the_reported_device() {
    let h = Harness::new();
    h.ready().await;

    let state = h.session.snapshot().await;
    assert_eq!(state.device_id.as_deref(), Some("dev-1"));
    assert_eq!(h.loader.creates.load(Ordering::SeqCst), 1);
    h.expect_event(|e| matches!(e, Event::DeviceReady)).await;
}

#[tokio::test]
async fn credential_failure_is_terminal() {
    let h = Harness::new();
    *h.backend.token_error.lock().unwrap() =
        Some(PlayerError::CredentialFetch("503".to_string()));

    let result = h.session.init().await;
    assert!(matches!(result, Err(PlayerError::CredentialFetch(_))));
    assert_eq!(h.session.readiness().await, EngineReadiness::Error);
    assert_eq!(h.loader.loads.load(Ordering::SeqCst), 0);
    assert!(h.drain_events().iter().any(|e| matches!(e, Event::PlayerError(_))));

    *h.backend.token_error.lock().unwrap() = None;
    assert!(h.session.init().await.is_err());
    assert_eq!(h.session.readiness().await, EngineReadiness::Error);
}

#[tokio::test]
async fn engine_load_failure_is_reported_as_script_load() {
    let h = Harness::new();
    *h.loader.load_error.lock().unwrap() = Some(PlayerError::ScriptLoad("offline".to_string()));

    assert!(matches!(h.session.init().await, Err(PlayerError::ScriptLoad(_))));
    let state = h.session.snapshot().await;
    assert_eq!(state.readiness, EngineReadiness::Error);
    assert!(matches!(state.last_error, Some(PlayerError::ScriptLoad(_))));
}

#[tokio::test]
async fn rejected_credential_moves_to_error() {
    let h = Harness::new();
    *h.engine().reject_with.lock().unwrap() =
        Some(EngineEvent::AuthenticationError("expired".to_string()));

    assert!(h.session.init().await.is_err());
    let state = h
        .wait_until(|s| s.readiness == EngineReadiness::Error)
        .await;
    assert!(matches!(state.last_error, Some(PlayerError::EngineAuthentication(_))));
}

#[tokio::test]
async fn device_going_offline_is_sticky() {
    let h = Harness::new();
    h.ready().await;
    h.session.set_queue(vec![track("a")]).await;
    h.session.play(&TrackId::from("a")).await.unwrap();

    h.engine()
        .emit(EngineEvent::NotReady {
            device_id: "dev-1".to_string(),
        })
        .await;
    let state = h
        .wait_until(|s| s.readiness == EngineReadiness::Error)
        .await;
    assert!(!state.is_playing);
    assert!(matches!(state.last_error, Some(PlayerError::DeviceOffline(_))));

    h.engine()
        .emit(EngineEvent::Ready {
            device_id: "dev-1".to_string(),
        })
        .await;
    assert_eq!(h.settle().await.readiness, EngineReadiness::Error);
    assert_eq!(h.session.play(&TrackId::from("a")).await, Err(PlayerError::NotReady));
}

#[tokio::test]
async fn successful_play_sets_current_track_and_playing() {
    let h = Harness::new();
    h.ready().await;
    h.session.set_queue(vec![track("a"), track("b")]).await;

    h.session.play(&TrackId::from("b")).await.unwrap();

    let state = h.session.snapshot().await;
    assert_eq!(current(&state), Some("b"));
    assert!(state.is_playing);
    assert_eq!(
        h.backend.calls(),
        vec![Call::Play("b".to_string(), Some("dev-1".to_string()))]
    );
    assert!(h.drain_events().iter().any(|e| matches!(e, Event::TrackStarted(t) if t.id.as_str() == "b")));
}

#[tokio::test]
async fn failed_user_play_keeps_playing_flag() {
    let h = Harness::new();
    h.ready().await;
    h.session.set_queue(vec![track("a"), track("b")]).await;
    h.session.play(&TrackId::from("a")).await.unwrap();

    *h.backend.play_error.lock().unwrap() = Some(PlayerError::Command("500".to_string()));
    assert!(h.session.play(&TrackId::from("b")).await.is_err());

    let state = h.session.snapshot().await;
    assert_eq!(current(&state), Some("a"));
    assert!(state.is_playing);
    assert!(matches!(state.last_error, Some(PlayerError::Command(_))));
}

#[tokio::test]
async fn finished_track_advances_to_its_successor() {
    let h = Harness::new();
    h.ready().await;
    h.session
        .set_queue(vec![track("a"), track("b"), track("c")])
        .await;
    h.session.play(&TrackId::from("b")).await.unwrap();

    h.engine().emit(observed("b", false, 199_500)).await;

    h.wait_until(|s| current(s) == Some("c") && s.is_playing)
        .await;
    assert_eq!(h.backend.plays(), vec!["b".to_string(), "c".to_string()]);
}

#[tokio::test]
async fn rewound_engine_counts_as_finished() {
    let h = Harness::new();
    h.ready().await;
    h.session.set_queue(vec![track("a"), track("b")]).await;
    h.session.play(&TrackId::from("a")).await.unwrap();

    h.engine().emit(observed("a", true, 0)).await;

    h.wait_until(|s| current(s) == Some("b") && s.is_playing)
        .await;
    assert_eq!(h.backend.plays(), vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn tail_only_rule_ignores_a_rewound_engine() {
    let h = Harness::with_rule(CompletionRule::TailOnly);
    h.ready().await;
    h.session.set_queue(vec![track("a"), track("b")]).await;
    h.session.play(&TrackId::from("a")).await.unwrap();

    h.engine().emit(observed("a", true, 0)).await;

    let state = h.settle().await;
    assert_eq!(current(&state), Some("a"));
    assert!(!state.is_playing);
    assert_eq!(h.backend.plays(), vec!["a".to_string()]);
}

#[tokio::test]
async fn last_track_finishing_stops_playback() {
    let h = Harness::new();
    h.ready().await;
    h.session.set_queue(vec![track("a"), track("b")]).await;
    h.session.play(&TrackId::from("b")).await.unwrap();

    h.engine().emit(observed("b", false, 200_000)).await;

    let state = h.wait_until(|s| !s.is_playing).await;
    assert_eq!(current(&state), Some("b"));
    assert_eq!(h.backend.plays(), vec!["b".to_string()]);
    h.expect_event(|e| matches!(e, Event::QueueEnded)).await;
}

#[tokio::test]
async fn user_pause_is_not_mistaken_for_completion() {
    let h = Harness::new();
    h.ready().await;
    h.session.set_queue(vec![track("a"), track("b")]).await;
    h.session.play(&TrackId::from("a")).await.unwrap();

    h.session.pause().await.unwrap();
    h.engine().emit(observed("a", true, 0)).await;

    let state = h.settle().await;
    assert!(!state.is_playing);
    assert_eq!(current(&state), Some("a"));
    assert_eq!(
        h.backend.calls(),
        vec![
            Call::Play("a".to_string(), Some("dev-1".to_string())),
            Call::Pause(Some("dev-1".to_string())),
        ]
    );
}

#[tokio::test]
async fn observed_state_drives_the_playing_flag() {
    let h = Harness::new();
    h.ready().await;
    h.session.set_queue(vec![track("a")]).await;
    h.session.play(&TrackId::from("a")).await.unwrap();

    h.engine().emit(observed("a", true, 42_000)).await;
    h.wait_until(|s| !s.is_playing).await;

    h.engine().emit(observed("a", false, 43_000)).await;
    let state = h.wait_until(|s| s.is_playing).await;
    assert_eq!(state.observed.map(|o| o.position_ms), Some(43_000));
}

#[tokio::test]
async fn stale_play_response_is_discarded() {
    let h = Harness::new();
    h.ready().await;
    h.session.set_queue(vec![track("a"), track("b")]).await;
    let release_a = h.backend.hold_play("a");

    let session = h.session.clone();
    let first = tokio::spawn(async move { session.play(&TrackId::from("a")).await });
    let wait = async {
        while h.backend.plays().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(2), wait).await.unwrap();

    h.session.play(&TrackId::from("b")).await.unwrap();
    release_a.send(()).unwrap();
    assert_eq!(first.await.unwrap(), Ok(()));

    let state = h.session.snapshot().await;
    assert_eq!(current(&state), Some("b"));
    assert!(state.is_playing);
}

#[tokio::test]
async fn add_to_queue_ignores_duplicates() {
    let h = Harness::new();

    assert!(h.session.add_to_queue(track("a")).await);
    assert!(h.session.add_to_queue(track("b")).await);
    assert!(!h.session.add_to_queue(track("a")).await);

    let ids: Vec<String> = h
        .session
        .snapshot()
        .await
        .queue
        .iter()
        .map(|t| t.id.to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn set_current_track_and_queue_replace_state() {
    let h = Harness::new();
    h.session.set_queue(vec![track("a"), track("b")]).await;
    h.session.set_current_track(Some(track("z"))).await;

    let state = h.session.snapshot().await;
    assert_eq!(current(&state), Some("z"));
    assert_eq!(state.queue.len(), 2);

    h.session.set_queue(Vec::new()).await;
    h.session.set_current_track(None).await;
    let state = h.session.snapshot().await;
    assert!(state.queue.is_empty());
    assert_eq!(state.current_track, None);
}

#[tokio::test]
async fn next_and_previous_walk_the_queue() {
    let h = Harness::new();
    h.ready().await;
    h.session
        .set_queue(vec![track("a"), track("b"), track("c")])
        .await;

    h.session.next().await.unwrap();
    assert_eq!(current(&h.session.snapshot().await), Some("a"));
    h.session.next().await.unwrap();
    h.session.next().await.unwrap();
    assert_eq!(current(&h.session.snapshot().await), Some("c"));

    h.session.next().await.unwrap();
    h.session.previous().await.unwrap();
    assert_eq!(current(&h.session.snapshot().await), Some("b"));
    assert_eq!(h.backend.plays(), vec!["a", "b", "c", "b"]);
}

#[tokio::test]
async fn toggle_play_pauses_or_resumes_the_current_track() {
    let h = Harness::new();
    h.ready().await;
    h.session.set_queue(vec![track("a")]).await;

    h.session.toggle_play().await.unwrap();
    assert_eq!(h.engine().toggles.load(Ordering::SeqCst), 1);

    h.session.play(&TrackId::from("a")).await.unwrap();
    h.session.toggle_play().await.unwrap();
    assert!(!h.session.snapshot().await.is_playing);

    h.session.toggle_play().await.unwrap();
    assert!(h.session.snapshot().await.is_playing);
    assert_eq!(h.backend.plays(), vec!["a", "a"]);
}

#[tokio::test]
async fn teardown_keeps_the_engine_for_the_next_init() {
    let h = Harness::new();
    h.ready().await;

    h.session.teardown().await;
    let state = h.session.snapshot().await;
    assert_eq!(state.readiness, EngineReadiness::Initial);
    assert_eq!(state.device_id, None);
    assert_eq!(h.engine().attached.load(Ordering::SeqCst), 0);

    h.ready().await;
    assert_eq!(h.loader.creates.load(Ordering::SeqCst), 1);
    assert_eq!(h.engine().connects(), 2);
    assert_eq!(h.engine().attached.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_init_is_a_no_op() {
    let h = Harness::new();
    h.ready().await;

    assert_eq!(h.session.init().await, Ok(()));
    assert_eq!(h.engine().connects(), 1);
}

#[tokio::test]
async fn rewound_seeded_track_advances_to_the_next_one() {
    let h = Harness::new();
    h.ready().await;
    h.session
        .set_queue(vec![track("a"), track("b"), track("c")])
        .await;
    h.session.set_current_track(Some(track("b"))).await;

    h.engine().emit(observed("b", true, 0)).await;

    h.wait_until(|s| current(s) == Some("c") && s.is_playing)
        .await;
    assert_eq!(
        h.backend.calls(),
        vec![Call::Play("c".to_string(), Some("dev-1".to_string()))]
    );
}

#[tokio::test]
async fn reinit_connects_with_a_fresh_credential() {
    let h = Harness::new();
    h.ready().await;
    h.session.teardown().await;

    h.ready().await;
    assert_eq!(h.loader.creates.load(Ordering::SeqCst), 1);
    assert_eq!(*h.engine().tokens.lock().unwrap(), vec!["t1", "t2"]);
}

#[tokio::test]
async fn generic_connect_failure_moves_to_error() {
    let h = Harness::new();
    *h.engine().connect_error.lock().unwrap() =
        Some(PlayerError::Connection("connection refused".to_string()));

    assert!(matches!(h.session.init().await, Err(PlayerError::Connection(_))));
    let state = h.session.snapshot().await;
    assert_eq!(state.readiness, EngineReadiness::Error);
    assert!(matches!(state.last_error, Some(PlayerError::Connection(_))));
    assert!(h.drain_events().iter().any(|e| matches!(e, Event::PlayerError(_))));
}

#[tokio::test]
async fn failed_auto_advance_stops_playback() {
    let h = Harness::new();
    h.ready().await;
    h.session
        .set_queue(vec![track("a"), track("b"), track("c")])
        .await;
    h.session.play(&TrackId::from("a")).await.unwrap();
    h.drain_events();

    *h.backend.play_error.lock().unwrap() = Some(PlayerError::Command("500".to_string()));
    h.engine().emit(observed("a", false, 199_500)).await;

    let state = h
        .wait_until(|s| current(s) == Some("b") && s.last_error.is_some())
        .await;
    assert!(!state.is_playing);
    assert!(matches!(state.last_error, Some(PlayerError::Command(_))));
    assert_eq!(h.backend.plays(), vec!["a", "b"]);
    h.expect_event(|e| matches!(e, Event::PlayerError(_))).await;
}

#[tokio::test]
async fn failed_pause_keeps_playing_and_completion_detection() {
    let h = Harness::new();
    h.ready().await;
    h.session.set_queue(vec![track("a"), track("b")]).await;
    h.session.play(&TrackId::from("a")).await.unwrap();

    *h.backend.pause_error.lock().unwrap() = Some(PlayerError::Command("502".to_string()));
    assert!(matches!(h.session.pause().await, Err(PlayerError::Command(_))));

    let state = h.session.snapshot().await;
    assert!(state.is_playing);
    assert_eq!(current(&state), Some("a"));
    assert!(matches!(state.last_error, Some(PlayerError::Command(_))));
    h.expect_event(|e| matches!(e, Event::PlayerError(_))).await;

    // The pause never reached the device, so a rewind is a real ending.
    h.engine().emit(observed("a", true, 0)).await;
    h.wait_until(|s| current(s) == Some("b") && s.is_playing)
        .await;
    assert_eq!(h.backend.plays(), vec!["a", "b"]);
}

#[tokio::test]
async fn completion_before_ready_advances_without_playing() {
    let h = Harness::new();
    h.session.set_queue(vec![track("a"), track("b")]).await;
    h.session.set_current_track(Some(track("a"))).await;
    h.engine()
        .before_ready
        .lock()
        .unwrap()
        .push(observed("a", true, 0));

    h.ready().await;

    let state = h.settle().await;
    assert_eq!(current(&state), Some("b"));
    assert!(!state.is_playing);
    assert!(h.backend.plays().is_empty());
}
