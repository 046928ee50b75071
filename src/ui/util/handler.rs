use std::future::Future;

use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, warn};

use crate::{
    audio::{EngineReadiness, PlayerError, traits::Backend},
    event::events::Event,
    model::Track,
    ui::{
        app::App,
        input::InputHandler,
        traits::{Action, View},
        tui::{TerminalEvent, Tui},
        views::CatalogState,
    },
    util::task::TaskKey,
};

pub struct EventHandler;

impl EventHandler {
    pub async fn handle_events(app: &mut App, tui: &mut Tui) -> color_eyre::Result<bool> {
        let mut should_render = false;
        if let Some(evt) = tui.next().await
            && Self::handle_event(app, evt, tui).await?
        {
            should_render = true;
        }

        while let Ok(evt) = app.event_rx.try_recv() {
            Self::handle_action(app, evt).await;
            should_render = true;
        }

        if should_render {
            app.snapshot = app.session.snapshot().await;
        }
        Ok(should_render)
    }

    pub async fn handle_event(
        app: &mut App,
        evt: TerminalEvent,
        tui: &mut Tui,
    ) -> color_eyre::Result<bool> {
        match evt {
            TerminalEvent::Init => Self::start(app),
            TerminalEvent::FocusGained => {
                app.has_focus = true;
                tui.clear()?;
            }
            TerminalEvent::FocusLost => app.has_focus = false,
            TerminalEvent::Key(key) => Self::handle_key_event(app, key).await,
            TerminalEvent::Tick => return Ok(app.has_focus),
            TerminalEvent::Resize(..) => {}
        }

        Ok(true)
    }

    /// Kicks off the catalog fetch and the engine bring-up side by side.
    pub fn start(app: &mut App) {
        let api = app.api.clone();
        let tx = app.event_tx.clone();
        app.task_manager.spawn(
            TaskKey::Catalog,
            tokio::spawn(async move {
                let event = match Backend::fetch_catalog(api.as_ref()).await {
                    Ok(tracks) => Event::CatalogFetched(tracks),
                    Err(e) => Event::CatalogFailed(e.to_string()),
                };
                let _ = tx.send(event);
            }),
        );

        let session = app.session.clone();
        app.task_manager.spawn(
            TaskKey::SessionInit,
            tokio::spawn(async move {
                // Failures reach the UI as `Event::PlayerError`.
                let _ = session.init().await;
            }),
        );
    }

    pub async fn handle_action(app: &mut App, evt: Event) {
        match evt {
            Event::CatalogFetched(tracks) => {
                info!(count = tracks.len(), "catalog loaded");
                for track in &tracks {
                    app.session.add_to_queue(track.clone()).await;
                }
                app.track_list.set_catalog(CatalogState::Loaded(tracks));
            }
            Event::CatalogFailed(message) => {
                warn!(%message, "catalog unavailable");
                app.track_list.set_catalog(CatalogState::Failed(message));
            }
            Event::DeviceReady => {
                app.status = None;
                if let Some(track) = app.pending_play.take() {
                    debug!(track_id = %track.id, "playing track selected before the device was ready");
                    Self::play(app, track);
                }
            }
            Event::TrackStarted(track) => {
                info!(track_id = %track.id, title = %track.title, "now playing");
                app.status = None;
            }
            Event::QueueEnded => {
                app.status = Some("End of queue".to_string());
            }
            Event::PlayerError(message) => {
                app.status = Some(message);
            }
        }
    }

    async fn handle_key_event(app: &mut App, key: KeyEvent) {
        let snapshot = app.session.snapshot().await;

        let action = app
            .track_list
            .handle_input(key, &snapshot)
            .or_else(|| InputHandler::handle_key(key));

        if let Some(action) = action {
            Self::dispatch_action(app, action).await;
        }
    }

    async fn dispatch_action(app: &mut App, action: Action) {
        match action {
            Action::Quit => app.should_quit = true,
            Action::Play(track) => {
                match app.session.readiness().await {
                    EngineReadiness::Ready => Self::play(app, track),
                    EngineReadiness::Initial | EngineReadiness::Loading => {
                        debug!(track_id = %track.id, "engine not ready, seeding current track");
                        app.session.set_current_track(Some(track.clone())).await;
                        app.pending_play = Some(track);
                    }
                    EngineReadiness::Error => {
                        app.status = Some(PlayerError::NotReady.to_string());
                    }
                }
            }
            Action::Enqueue(track) => {
                if !app.session.add_to_queue(track.clone()).await {
                    app.status = Some(format!("\"{}\" is already queued", track.title));
                }
            }
            Action::Pause => {
                app.pending_play = None;
                let session = app.session.clone();
                Self::command(app, async move { session.pause().await });
            }
            Action::TogglePlay => {
                let session = app.session.clone();
                Self::command(app, async move { session.toggle_play().await });
            }
            Action::NextTrack => {
                let session = app.session.clone();
                Self::command(app, async move { session.next().await });
            }
            Action::PreviousTrack => {
                let session = app.session.clone();
                Self::command(app, async move { session.previous().await });
            }
        }
    }

    fn play(app: &mut App, track: Track) {
        let session = app.session.clone();
        Self::command(app, async move { session.play(&track.id).await });
    }

    /// Runs a transport command without blocking input. Command failures the
    /// session does not report itself come back as `PlayerError` events.
    fn command<F>(app: &mut App, command: F)
    where
        F: Future<Output = Result<(), PlayerError>> + Send + 'static,
    {
        let tx = app.event_tx.clone();
        app.task_manager.spawn_command(tokio::spawn(async move {
            if let Err(PlayerError::NotReady) = command.await {
                let _ = tx.send(Event::PlayerError(PlayerError::NotReady.to_string()));
            }
        }));
    }

    pub async fn shutdown(app: &mut App) {
        app.task_manager.abort_all();
        app.session.teardown().await;
    }
}
