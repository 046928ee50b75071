use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use crate::{
    audio::SessionState,
    model::Track,
    ui::{
        components::spinner::Spinner,
        traits::{Action, View},
        util::{get_active_track_icon, truncate},
    },
    util::colors,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum CatalogState {
    #[default]
    Loading,
    Failed(String),
    Loaded(Vec<Track>),
}

#[derive(Default)]
pub struct TrackList {
    catalog: CatalogState,
    list_state: ListState,
}

impl TrackList {
    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn set_catalog(&mut self, catalog: CatalogState) {
        let has_rows = matches!(&catalog, CatalogState::Loaded(tracks) if !tracks.is_empty());
        self.list_state.select(has_rows.then_some(0));
        self.catalog = catalog;
    }

    fn tracks(&self) -> &[Track] {
        match &self.catalog {
            CatalogState::Loaded(tracks) => tracks,
            _ => &[],
        }
    }

    pub fn selected(&self) -> Option<&Track> {
        self.list_state.selected().and_then(|i| self.tracks().get(i))
    }

    fn row(track: &Track, width: usize, session: &SessionState) -> ListItem<'static> {
        let is_current = session.current_id() == Some(&track.id);
        let prefix = if is_current {
            format!("{} ", get_active_track_icon(session.is_playing))
        } else {
            "  ".to_string()
        };

        let mut spans = vec![
            Span::raw(prefix),
            Span::raw(truncate(&track.title, width / 2)),
            Span::raw(" - ").fg(colors::NEUTRAL),
            Span::raw(truncate(&track.artist_line(), width / 4)).fg(colors::ACCENT),
        ];
        if !track.album_title().is_empty() {
            spans.push(Span::raw(format!("  {}", truncate(track.album_title(), width / 4))).fg(colors::NEUTRAL));
        }
        if let Some(platform) = &track.source_platform {
            spans.push(Span::raw(format!("  [{platform}]")).fg(colors::NEUTRAL));
        }

        let item = ListItem::new(Line::from(spans));
        if is_current {
            item.style(Style::default().fg(colors::PRIMARY).add_modifier(Modifier::BOLD))
        } else {
            item
        }
    }
}

impl View for TrackList {
    fn render(&mut self, f: &mut Frame, area: Rect, session: &SessionState) {
        let tracks = match &self.catalog {
            CatalogState::Loading => {
                let spinner = Spinner::default()
                    .with_style(Style::default().fg(colors::PRIMARY))
                    .with_label("Loading tracks...".to_string());
                f.render_widget(spinner, area);
                return;
            }
            CatalogState::Failed(message) => {
                let error = Paragraph::new(format!("Error: {message}"))
                    .style(Style::default().fg(colors::ERROR))
                    .wrap(Wrap { trim: true });
                f.render_widget(error, area);
                return;
            }
            CatalogState::Loaded(tracks) if tracks.is_empty() => {
                f.render_widget(Paragraph::new("No tracks available").fg(colors::NEUTRAL), area);
                return;
            }
            CatalogState::Loaded(tracks) => tracks,
        };

        let width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = tracks
            .iter()
            .map(|track| Self::row(track, width, session))
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().fg(colors::PRIMARY).add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn handle_input(&mut self, key: KeyEvent, session: &SessionState) -> Option<Action> {
        let len = self.tracks().len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if len > 0 {
                    let i = self
                        .list_state
                        .selected()
                        .map_or(0, |i| (i + 1).min(len - 1));
                    self.list_state.select(Some(i));
                }
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if len > 0 {
                    let i = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
                    self.list_state.select(Some(i));
                }
                None
            }
            KeyCode::Char('g') if len > 0 => {
                self.list_state.select(Some(0));
                None
            }
            KeyCode::Char('G') if len > 0 => {
                self.list_state.select(Some(len - 1));
                None
            }
            KeyCode::Enter => {
                let track = self.selected()?.clone();
                if session.is_playing && session.current_id() == Some(&track.id) {
                    Some(Action::Pause)
                } else {
                    Some(Action::Play(track))
                }
            }
            KeyCode::Char('a') => self.selected().cloned().map(Action::Enqueue),
            _ => None,
        }
    }
}
