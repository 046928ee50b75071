use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Gauge, Paragraph, Widget, Wrap},
};

use crate::{
    audio::{EngineReadiness, SessionState},
    ui::util::{format_duration, truncate},
    util::colors,
};

/// Now-playing pane: track details, transport state and engine status.
pub struct TransportPanel<'a> {
    session: &'a SessionState,
    status: Option<&'a str>,
}

impl<'a> TransportPanel<'a> {
    pub fn new(session: &'a SessionState, status: Option<&'a str>) -> Self {
        Self { session, status }
    }

    fn readiness_line(&self) -> Line<'static> {
        let (label, color) = match self.session.readiness {
            EngineReadiness::Initial => ("Player idle", colors::NEUTRAL),
            EngineReadiness::Loading => ("Connecting player...", colors::ACCENT),
            EngineReadiness::Ready => ("Player ready", colors::PRIMARY),
            EngineReadiness::Error => ("Player unavailable", colors::ERROR),
        };
        let mut line = Line::from(label.fg(color));
        if let Some(device) = &self.session.device_id {
            line.push_span(format!("  ({device})").fg(colors::NEUTRAL));
        }
        line
    }

    /// Position and length in ms, taken from the engine's last report when it
    /// is about the current track.
    fn progress(&self) -> Option<(u64, u64)> {
        let observed = self.session.observed.as_ref()?;
        let current = self.session.current_id()?;
        if observed
            .track_id
            .as_deref()
            .is_some_and(|id| id != current.as_str())
        {
            return None;
        }
        let duration = observed.duration_ms.filter(|d| *d > 0)?;
        Some((observed.position_ms.min(duration), duration))
    }
}

impl Widget for TransportPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
            ])
            .split(area);
        let width = area.width as usize;

        let details = match &self.session.current_track {
            Some(track) => vec![
                Line::from(truncate(&track.title, width).bold().fg(colors::PRIMARY)),
                Line::from(truncate(&track.artist_line(), width).fg(colors::ACCENT)),
                Line::from(truncate(track.album_title(), width).fg(colors::NEUTRAL)),
            ],
            None => vec![Line::from("No track selected".fg(colors::NEUTRAL))],
        };
        Paragraph::new(details).render(chunks[0], buf);

        let state = if self.session.is_playing {
            "▶ Playing".fg(colors::PRIMARY)
        } else {
            "⏸ Paused".fg(colors::ACCENT)
        };
        Paragraph::new(Line::from(state)).render(chunks[1], buf);

        let (ratio, label) = match self.progress() {
            Some((position, duration)) => (
                position as f64 / duration as f64,
                format!("{} / {}", format_duration(position), format_duration(duration)),
            ),
            None => (0.0, "--:-- / --:--".to_string()),
        };
        Gauge::default()
            .gauge_style(Style::new().fg(colors::PRIMARY).bg(colors::NEUTRAL))
            .ratio(ratio.clamp(0.0, 1.0))
            .label(label)
            .render(chunks[2], buf);

        Paragraph::new(self.readiness_line()).render(chunks[3], buf);

        let error = self
            .status
            .map(str::to_string)
            .or_else(|| self.session.last_error.as_ref().map(ToString::to_string));
        if let Some(error) = error {
            Paragraph::new(error)
                .style(Style::default().fg(colors::ERROR).add_modifier(Modifier::ITALIC))
                .wrap(Wrap { trim: true })
                .render(chunks[4], buf);
        }
    }
}
