use std::sync::atomic::{AtomicU64, Ordering};

use flume::Sender;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::CompletionRule;

/// Slack allowed at the end of a track, the engine reports position late.
pub const TRACK_END_TOLERANCE_MS: u64 = 1000;

/// Engine-reported playback state, as delivered with `player_state_changed`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub paused: bool,
    #[serde(rename = "position")]
    pub position_ms: u64,
    #[serde(rename = "duration", default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

impl EngineState {
    /// The engine has no explicit "ended" signal, so completion is inferred.
    ///
    /// A rewound, paused engine at position zero is indistinguishable from a
    /// freshly loaded track that has not started yet; `TailOnly` drops that
    /// rule.
    pub fn looks_finished(&self, rule: CompletionRule) -> bool {
        let at_tail = self.duration_ms.is_some_and(|duration| {
            duration > 0 && self.position_ms >= duration.saturating_sub(TRACK_END_TOLERANCE_MS)
        });
        let rewound = self.position_ms == 0 && self.paused;

        match rule {
            CompletionRule::TailOrRewind => at_tail || rewound,
            CompletionRule::TailOnly => at_tail,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Ready { device_id: String },
    NotReady { device_id: String },
    InitializationError(String),
    AuthenticationError(String),
    AccountError(String),
    StateChanged(Option<EngineState>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What the session hands an engine when it instantiates one.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub name: String,
    pub volume: f32,
}

/// Listener bookkeeping shared by engine implementations.
#[derive(Default)]
pub struct Listeners {
    next_id: AtomicU64,
    senders: Mutex<Vec<(ListenerId, Sender<EngineEvent>)>>,
}

impl Listeners {
    pub async fn add(&self, tx: Sender<EngineEvent>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.senders.lock().await.push((id, tx));
        id
    }

    pub async fn remove(&self, id: ListenerId) {
        self.senders.lock().await.retain(|(listener, _)| *listener != id);
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.senders.lock().await.len()
    }

    /// Delivers `event` to every listener, forgetting the ones whose receiver is gone.
    pub async fn dispatch(&self, event: EngineEvent) {
        let mut senders = self.senders.lock().await;
        senders.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }
}
