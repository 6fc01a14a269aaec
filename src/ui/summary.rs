//! Summary cards.
//!
//! One bordered card per mounted summary element: total value, 24h change
//! and last update. Unmounted elements get no card.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::board::ElementId;

const CARDS: [(ElementId, &str); 3] = [
    (ElementId::TotalValue, " Total Value (USD) "),
    (ElementId::Change24h, " 24h Change "),
    (ElementId::LastUpdated, " Last Updated "),
];

/// Render the summary cards side by side.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mounted: Vec<_> = CARDS
        .iter()
        .filter(|(id, _)| app.board.is_mounted(*id))
        .collect();
    if mounted.is_empty() {
        return;
    }

    let areas = Layout::horizontal(vec![Constraint::Ratio(1, mounted.len() as u32); mounted.len()])
        .split(area);

    for ((id, title), card) in mounted.into_iter().zip(areas.iter()) {
        let Some(element) = app.board.element(*id) else {
            continue;
        };

        let (text, style) = if element.text.is_empty() {
            ("--".to_string(), Style::default().add_modifier(Modifier::DIM))
        } else {
            let style = match id {
                ElementId::Change24h => app.theme.tone_style(element.tone),
                ElementId::TotalValue => Style::default().add_modifier(Modifier::BOLD),
                _ => Style::default(),
            };
            (element.text.clone(), style)
        };

        let block = Block::default()
            .title(Span::styled(*title, app.theme.header))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));

        let paragraph = Paragraph::new(Line::from(Span::styled(text, style)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, *card);
    }
}
