use std::sync::Arc;

use flume::{Receiver, Sender};
use ratatui::Frame;

use crate::{
    audio::{
        PlaybackSession, SessionOptions, SessionState, registry::ReadyRegistry,
        remote::RemoteEngineLoader,
    },
    config::PlayerConfig,
    event::events::Event,
    http::ApiService,
    model::Track,
    ui::{layout::AppLayout, views::TrackList},
    util::task::TaskManager,
};

use super::{tui, util::handler::EventHandler};

pub struct App {
    pub event_rx: Receiver<Event>,
    pub event_tx: Sender<Event>,
    pub api: Arc<ApiService>,
    pub session: PlaybackSession,
    /// Last copy of the session state, refreshed every tick.
    pub snapshot: SessionState,
    pub track_list: TrackList,
    pub task_manager: TaskManager,
    /// Selected before the engine was ready; played on `DeviceReady`.
    pub pending_play: Option<Track>,
    pub status: Option<String>,
    pub has_focus: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: PlayerConfig) -> color_eyre::Result<Self> {
        let (event_tx, event_rx) = flume::unbounded();
        let api = Arc::new(ApiService::new(&config)?);
        let loader = Arc::new(RemoteEngineLoader::new(api.clone(), config.poll_interval));
        let session = PlaybackSession::new(
            SessionOptions::from(&config),
            api.clone(),
            loader,
            Arc::new(ReadyRegistry::new()),
            event_tx.clone(),
        );

        Ok(Self {
            event_rx,
            event_tx,
            api,
            session,
            snapshot: SessionState::default(),
            track_list: TrackList::default(),
            task_manager: TaskManager::new(),
            pending_play: None,
            status: None,
            has_focus: true,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut tui = tui::Tui::new()?;
        tui.enter()?;

        while !self.should_quit {
            tui.draw(|f| self.ui(f))?;
            EventHandler::handle_events(self, &mut tui).await?;
        }

        EventHandler::shutdown(self).await;
        tui.exit()?;
        Ok(())
    }

    fn ui(&mut self, frame: &mut Frame) {
        if self.has_focus {
            let area = frame.area();
            AppLayout::new(self).render(frame, area);
        }
    }
}
