use crate::{
    audio::{engine::EngineState, error::PlayerError, queue::Queue},
    model::{Track, TrackId},
};

/// Lifecycle of the engine's connection to its output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineReadiness {
    #[default]
    Initial,
    Loading,
    Ready,
    Error,
}

impl EngineReadiness {
    /// Nothing leaves `Error`.
    pub fn can_transition_to(self, next: EngineReadiness) -> bool {
        use EngineReadiness::*;
        matches!(
            (self, next),
            (Initial, Loading) | (Loading, Ready) | (Ready, Ready) | (Loading, Error) | (Ready, Error)
        )
    }
}

/// The kind of the most recently issued transport command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportIntent {
    Play,
    Pause,
}

/// A transport command awaiting its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub intent: TransportIntent,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub queue: Queue,
    pub device_id: Option<String>,
    pub readiness: EngineReadiness,
    pub observed: Option<EngineState>,
    pub last_error: Option<PlayerError>,
    transport_seq: u64,
    last_intent: Option<TransportIntent>,
    in_flight: Option<u64>,
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        self.readiness == EngineReadiness::Ready
    }

    /// Applies a readiness transition, refusing the ones the lifecycle forbids.
    pub fn transition(&mut self, next: EngineReadiness) -> bool {
        if !self.readiness.can_transition_to(next) {
            tracing::debug!(from = ?self.readiness, to = ?next, "readiness transition refused");
            return false;
        }
        tracing::debug!(from = ?self.readiness, to = ?next, "readiness transition");
        self.readiness = next;
        if next == EngineReadiness::Error {
            self.is_playing = false;
        }
        true
    }

    pub fn fail(&mut self, error: PlayerError) {
        self.transition(EngineReadiness::Error);
        self.last_error = Some(error);
    }

    /// Back to `Initial` after teardown, unless the session already failed.
    /// Transport bookkeeping is cleared either way.
    pub fn reset_readiness(&mut self) {
        self.in_flight = None;
        self.last_intent = None;
        if self.readiness != EngineReadiness::Error {
            self.readiness = EngineReadiness::Initial;
            self.is_playing = false;
            self.device_id = None;
        }
    }

    /// Playing requires a ready engine and a current track.
    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing && self.is_ready() && self.current_track.is_some();
    }

    pub fn enqueue(&mut self, track: Track) -> bool {
        self.queue.push(track)
    }

    pub fn set_current_track(&mut self, track: Option<Track>) {
        self.current_track = track;
        if self.current_track.is_none() {
            self.is_playing = false;
        }
    }

    pub fn set_queue(&mut self, queue: Queue) {
        self.queue = queue;
    }

    pub fn current_id(&self) -> Option<&TrackId> {
        self.current_track.as_ref().map(|t| &t.id)
    }

    pub fn issue(&mut self, intent: TransportIntent) -> Ticket {
        self.transport_seq += 1;
        self.last_intent = Some(intent);
        self.in_flight = Some(self.transport_seq);
        Ticket {
            seq: self.transport_seq,
            intent,
        }
    }

    /// Marks `ticket` answered. Returns whether it is still the newest
    /// transport command, i.e. whether its result may be applied.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if self.in_flight == Some(ticket.seq) {
            self.in_flight = None;
        }
        ticket.seq == self.transport_seq
    }

    /// Drops the recorded intent, used when a pause never reached the device.
    pub fn forget_intent(&mut self) {
        self.last_intent = None;
    }

    pub fn command_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn paused_by_user(&self) -> bool {
        self.last_intent == Some(TransportIntent::Pause)
    }
}
