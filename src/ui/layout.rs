use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    symbols::border,
    widgets::{Block, Borders},
};

use crate::{
    ui::{app::App, components::controls::TransportPanel, traits::View},
    util::colors,
};

/// Transport pane on the left third, catalog on the remaining two thirds.
pub struct AppLayout<'a> {
    pub app: &'a mut App,
}

impl<'a> AppLayout<'a> {
    pub fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub fn render(self, f: &mut Frame, area: Rect) {
        f.buffer_mut().set_style(area, Style::new().bg(colors::BACKGROUND));

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
            .split(area);

        let player_block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .title(" Now Playing ")
            .title_alignment(Alignment::Center);
        let catalog_block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .title(format!(" Tracks ({} queued) ", self.app.snapshot.queue.len()))
            .title_alignment(Alignment::Center);

        let player_inner = player_block.inner(chunks[0]);
        let catalog_inner = catalog_block.inner(chunks[1]);
        f.render_widget(player_block, chunks[0]);
        f.render_widget(catalog_block, chunks[1]);

        f.render_widget(
            TransportPanel::new(&self.app.snapshot, self.app.status.as_deref()),
            player_inner,
        );
        self.app
            .track_list
            .render(f, catalog_inner, &self.app.snapshot);
    }
}
